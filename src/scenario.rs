//! Named test scenarios: what each realm contains and how its flow is shaped.
//!
//! A [`Scenario`] is pure data. The [`Orchestrator`] turns a list of them into fully built realms,
//! one after another, while [`Scenario::apply_flow`] drives only the flow part so it can be
//! exercised against any [`FlowRemote`].

pub mod catalog;
pub mod enroll;
pub mod orchestrator;
pub mod settings;

pub use catalog::*;
pub use enroll::*;
pub use orchestrator::*;
pub use settings::*;

// self
use crate::{
	_prelude::*,
	flow::{BuildReport, FlowBuilder, FlowRemote, FlowTree, Node},
};

/// User to create in a scenario realm.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScenarioUser {
	/// Login name; the email is `<username>@test.local`.
	pub username: String,
	/// Realm roles to map onto the user.
	pub roles: Vec<String>,
	/// Enroll a TOTP credential before the flow is bound.
	pub second_factor: bool,
}
impl ScenarioUser {
	/// Plain user without roles or enrollment.
	pub fn new(username: impl Into<String>) -> Self {
		Self { username: username.into(), roles: Vec::new(), second_factor: false }
	}

	/// Adds a realm role.
	pub fn role(mut self, role: impl Into<String>) -> Self {
		self.roles.push(role.into());

		self
	}

	/// Requests second-factor enrollment.
	pub fn with_second_factor(mut self) -> Self {
		self.second_factor = true;

		self
	}

	/// Email address of the user.
	pub fn email(&self) -> String {
		format!("{}@{USER_DOMAIN}", self.username)
	}
}

/// Realm localization settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Localization {
	/// Supported locale tags.
	pub supported: Vec<&'static str>,
	/// Default locale tag.
	pub default: &'static str,
}

/// How the scenario's entry-point flow is produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FlowPlan {
	/// Build a new flow from a tree.
	Fresh(FlowTree),
	/// Copy an existing flow and inject nodes into its forms subflow.
	CopyAndInject {
		/// Flow to copy.
		source: String,
		/// Alias of the copy.
		alias: String,
		/// Case-insensitive substring identifying the forms subflow among the copy's children.
		forms_marker: String,
		/// Nodes appended to the forms subflow.
		nodes: Vec<Node>,
	},
}
impl FlowPlan {
	/// Alias of the flow this plan binds.
	pub fn alias(&self) -> &str {
		match self {
			FlowPlan::Fresh(tree) => &tree.alias,
			FlowPlan::CopyAndInject { alias, .. } => alias,
		}
	}
}

/// Everything one test realm contains.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Scenario {
	/// Realm name.
	pub realm: String,
	/// Realm roles to create.
	pub roles: Vec<String>,
	/// Users in creation order.
	pub users: Vec<ScenarioUser>,
	/// Optional localization.
	pub localization: Option<Localization>,
	/// Entry-point flow.
	pub flow: FlowPlan,
}
impl Scenario {
	/// Replaces any earlier flow of the same alias, builds the plan, and binds it last.
	pub async fn apply_flow<R>(&self, builder: &FlowBuilder<R>) -> Result<BuildReport>
	where
		R: ?Sized + FlowRemote,
	{
		builder.delete_flow(self.flow.alias()).await?;

		let mut report = match &self.flow {
			FlowPlan::Fresh(tree) => builder.build(tree).await?,
			FlowPlan::CopyAndInject { source, alias, forms_marker, nodes } => {
				builder.copy_flow(source, alias).await?;

				let marker = forms_marker.to_lowercase();
				let forms = builder
					.find_child(alias, &format!("subflow containing `{forms_marker}`"), |node| {
						node.is_flow && node.display_name.to_lowercase().contains(&marker)
					})
					.await?;
				let parent = forms.subflow_alias().unwrap_or(&forms.display_name).to_owned();
				let mut report = BuildReport::new(alias.as_str());

				builder.extend(&mut report, &parent, nodes).await?;

				report
			},
		};

		builder.bind(&mut report).await?;

		Ok(report)
	}
}
