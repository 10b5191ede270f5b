//! Serializes flow trees into the ordered remote calls that build them.
//!
//! Every step is awaited before the next begins: a parent exists before its children, a leaf
//! exists before its configuration, and binding comes last. Sibling creation is never
//! parallelized because resolution re-reads the parent's child list.

// self
use crate::{
	_prelude::*,
	flow::{
		AuthenticatorConfig, Creation, FlowKind, FlowRemote, FlowTree, MatchKey, Node, NodeId,
		NodeInfo, NodeState, Requirement, find_direct_child, resolve_or_fail,
	},
	obs::{self, StepKind},
};

/// A node created during a build.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuiltNode {
	/// Resolved execution id.
	pub id: NodeId,
	/// Alias of the flow the node was added to.
	pub parent: String,
	/// Provider id or subflow alias.
	pub label: String,
	/// Requirement applied.
	pub requirement: Requirement,
	/// Final construction state.
	pub state: NodeState,
}

/// Record of one flow's construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuildReport {
	/// Alias of the top-level flow.
	pub flow_alias: String,
	/// State of the flow itself.
	pub state: NodeState,
	/// Nodes in creation order.
	pub nodes: Vec<BuiltNode>,
}
impl BuildReport {
	/// Starts a report for a flow that already exists remotely.
	pub fn new(flow_alias: impl Into<String>) -> Self {
		Self { flow_alias: flow_alias.into(), state: NodeState::Created, nodes: Vec::new() }
	}

	/// Returns the first node with the given label.
	pub fn node(&self, label: &str) -> Option<&BuiltNode> {
		self.nodes.iter().find(|node| node.label == label)
	}
}

/// Builds flows in one realm through a [`FlowRemote`].
#[derive(Debug)]
pub struct FlowBuilder<R>
where
	R: ?Sized,
{
	remote: Arc<R>,
	realm: String,
}
impl<R> FlowBuilder<R>
where
	R: ?Sized + FlowRemote,
{
	/// Creates a builder for `realm`.
	pub fn new(remote: Arc<R>, realm: impl Into<String>) -> Self {
		Self { remote, realm: realm.into() }
	}

	/// Realm this builder targets.
	pub fn realm(&self) -> &str {
		&self.realm
	}

	/// Underlying remote.
	pub fn remote(&self) -> &Arc<R> {
		&self.remote
	}

	/// Creates a top-level flow; an existing alias counts as success.
	pub async fn create_flow(
		&self,
		alias: &str,
		description: &str,
		kind: FlowKind,
	) -> Result<Creation> {
		obs::observe(StepKind::CreateFlow, &self.realm, async {
			let creation = self.remote.create_flow(&self.realm, alias, description, kind).await?;

			#[cfg(feature = "tracing")]
			tracing::debug!(alias, ?creation, "flow created");

			Ok(creation)
		})
		.await
	}

	/// Deep-copies `source` into `dest`; an existing `dest` counts as success.
	pub async fn copy_flow(&self, source: &str, dest: &str) -> Result<Creation> {
		obs::observe(StepKind::CopyFlow, &self.realm, async {
			let creation = self.remote.copy_flow(&self.realm, source, dest).await?;

			#[cfg(feature = "tracing")]
			tracing::debug!(source, dest, ?creation, "flow copied");

			Ok(creation)
		})
		.await
	}

	/// Adds a leaf for `provider` under `parent` and returns its resolved id.
	pub async fn add_leaf(&self, parent: &str, provider: &str) -> Result<NodeId> {
		obs::observe(StepKind::AddLeaf, &self.realm, async {
			self.remote.add_execution(&self.realm, parent, provider).await?;

			let children = self.remote.list_executions(&self.realm, parent).await?;

			Ok(resolve_or_fail(parent, &children, MatchKey::Provider(provider))?.id)
		})
		.await
	}

	/// Adds a subflow named `alias` under `parent` and returns its resolved id.
	pub async fn add_subflow(&self, parent: &str, alias: &str, kind: FlowKind) -> Result<NodeId> {
		obs::observe(StepKind::AddSubflow, &self.realm, async {
			self.remote.add_subflow(&self.realm, parent, alias, kind).await?;

			let children = self.remote.list_executions(&self.realm, parent).await?;

			Ok(resolve_or_fail(parent, &children, MatchKey::DisplayName(alias))?.id)
		})
		.await
	}

	/// Sets the requirement of node `id` listed under `parent`.
	pub async fn set_requirement(
		&self,
		parent: &str,
		id: &NodeId,
		requirement: Requirement,
	) -> Result<()> {
		obs::observe(StepKind::SetRequirement, &self.realm, async {
			let mut node = self.node_under(parent, id).await?;

			if node.requirement == requirement {
				return Ok(());
			}

			node.requirement = requirement;

			self.remote.update_execution(&self.realm, parent, &node).await
		})
		.await
	}

	/// Binds a new configuration named `alias` to leaf `id`.
	pub async fn attach_config(
		&self,
		id: &NodeId,
		alias: &str,
		settings: BTreeMap<String, String>,
	) -> Result<()> {
		obs::observe(StepKind::AttachConfig, &self.realm, async {
			let config = AuthenticatorConfig::new(alias, settings);

			self.remote.create_config(&self.realm, id, &config).await
		})
		.await
	}

	/// Makes `alias` the realm's browser entry point.
	pub async fn bind_as_entry_point(&self, alias: &str) -> Result<()> {
		obs::observe(StepKind::BindEntryPoint, &self.realm, async {
			self.remote.bind_browser_flow(&self.realm, alias).await?;

			#[cfg(feature = "tracing")]
			tracing::info!(alias, "entry point bound");

			Ok(())
		})
		.await
	}

	/// Deletes the flow named `alias`; returns `false` without side effects when it is absent.
	pub async fn delete_flow(&self, alias: &str) -> Result<bool> {
		obs::observe(StepKind::DeleteFlow, &self.realm, async {
			let flows = self.remote.list_flows(&self.realm).await?;
			let Some(flow) = flows.into_iter().find(|flow| flow.alias == alias) else {
				#[cfg(feature = "tracing")]
				tracing::debug!(alias, "flow absent, nothing to delete");

				return Ok(false);
			};

			self.remote.delete_flow(&self.realm, &flow.id).await?;

			Ok(true)
		})
		.await
	}

	/// Returns the first direct child of `parent` accepted by `predicate`.
	pub async fn find_child<P>(
		&self,
		parent: &str,
		description: &str,
		predicate: P,
	) -> Result<NodeInfo>
	where
		P: FnMut(&NodeInfo) -> bool,
	{
		let children = self.remote.list_executions(&self.realm, parent).await?;

		find_direct_child(parent, &children, description, predicate)
	}

	/// Lists every execution below `parent`.
	pub async fn list_children(&self, parent: &str) -> Result<Vec<NodeInfo>> {
		self.remote.list_executions(&self.realm, parent).await
	}

	/// Moves node `id` one position earlier.
	pub async fn raise_priority(&self, id: &NodeId) -> Result<()> {
		self.remote.raise_priority(&self.realm, id).await
	}

	/// Moves node `id` one position later.
	pub async fn lower_priority(&self, id: &NodeId) -> Result<()> {
		self.remote.lower_priority(&self.realm, id).await
	}

	/// Reads back the configuration attached to the `provider` leaf directly under `parent`.
	pub async fn leaf_config(&self, parent: &str, provider: &str) -> Result<AuthenticatorConfig> {
		let children = self.remote.list_executions(&self.realm, parent).await?;
		let node = resolve_or_fail(parent, &children, MatchKey::Provider(provider))?;
		let config_id = node.config_id.ok_or_else(|| Error::MissingValue {
			what: format!("configuration on `{provider}` under `{parent}`"),
		})?;

		self.remote.get_config(&self.realm, &config_id).await
	}

	/// Returns the realm's current entry-point flow alias.
	pub async fn entry_point(&self) -> Result<Option<String>> {
		self.remote.browser_flow(&self.realm).await
	}

	/// Creates `tree` from scratch and populates it. Does not bind.
	pub async fn build(&self, tree: &FlowTree) -> Result<BuildReport> {
		self.create_flow(&tree.alias, &tree.description, tree.kind).await?;

		let mut report = BuildReport::new(&tree.alias);

		self.extend(&mut report, &tree.alias, &tree.children).await?;

		Ok(report)
	}

	/// Adds `nodes` (and their subtrees) under `parent`, depth-first in declaration order.
	pub async fn extend(
		&self,
		report: &mut BuildReport,
		parent: &str,
		nodes: &[Node],
	) -> Result<()> {
		let mut pending: Vec<(String, &Node)> =
			nodes.iter().rev().map(|node| (parent.to_owned(), node)).collect();

		while let Some((parent, node)) = pending.pop() {
			let built = match node {
				Node::Leaf { provider, requirement, config } => {
					let id = self.add_leaf(&parent, provider).await?;
					let mut state = NodeState::Absent.advance(provider, NodeState::Created)?;

					self.set_requirement(&parent, &id, *requirement).await?;

					if let Some(spec) = config {
						self.attach_config(&id, &spec.alias, spec.settings.clone()).await?;

						state = state.advance(provider, NodeState::Configured)?;
					}

					BuiltNode {
						id,
						parent,
						label: provider.clone(),
						requirement: *requirement,
						state,
					}
				},
				Node::Subflow { alias, kind, requirement, children } => {
					let id = self.add_subflow(&parent, alias, *kind).await?;
					let state = NodeState::Absent.advance(alias, NodeState::Created)?;

					self.set_requirement(&parent, &id, *requirement).await?;

					pending.extend(children.iter().rev().map(|child| (alias.clone(), child)));

					BuiltNode { id, parent, label: alias.clone(), requirement: *requirement, state }
				},
			};

			report.nodes.push(built);
		}

		Ok(())
	}

	/// Binds the reported flow as the entry point; must be the last step of its construction.
	pub async fn bind(&self, report: &mut BuildReport) -> Result<()> {
		let next = report.state.advance(&report.flow_alias, NodeState::Bound)?;

		self.bind_as_entry_point(&report.flow_alias).await?;

		report.state = next;

		Ok(())
	}

	async fn node_under(&self, parent: &str, id: &NodeId) -> Result<NodeInfo> {
		self.remote
			.list_executions(&self.realm, parent)
			.await?
			.into_iter()
			.find(|node| node.id == *id)
			.ok_or_else(|| Error::ResolutionFailed {
				parent: parent.to_owned(),
				key: format!("execution `{id}`"),
			})
	}
}
