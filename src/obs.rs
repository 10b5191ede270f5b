//! Optional observability helpers for provisioning steps.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `flow_provisioner.step` with the `step`
//!   (operation) and `realm` fields.
//! - Enable `metrics` to increment the `flow_provisioner_step_total` counter for every
//!   attempt/success/failure, labeled by `step` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Provisioning operations observed by the crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StepKind {
	/// Realm deletion and re-creation.
	ResetRealm,
	/// Outbound mail transport settings.
	ConfigureMail,
	/// Public test client creation.
	EnsureClient,
	/// Realm role creation.
	EnsureRole,
	/// User creation and id resolution.
	CreateUser,
	/// Realm role mapping for a user.
	AssignRole,
	/// Realm or user required-action change.
	RequiredAction,
	/// Realm localization settings.
	Localization,
	/// Second-factor credential enrollment.
	Enroll,
	/// Top-level flow creation.
	CreateFlow,
	/// Flow deep copy.
	CopyFlow,
	/// Flow deletion.
	DeleteFlow,
	/// Leaf node creation.
	AddLeaf,
	/// Subflow node creation.
	AddSubflow,
	/// Requirement update.
	SetRequirement,
	/// Authenticator configuration binding.
	AttachConfig,
	/// Entry-point binding.
	BindEntryPoint,
	/// Bounded wait for an eventually-consistent condition.
	Poll,
	/// A complete named scenario.
	Scenario,
}
impl StepKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			StepKind::ResetRealm => "reset_realm",
			StepKind::ConfigureMail => "configure_mail",
			StepKind::EnsureClient => "ensure_client",
			StepKind::EnsureRole => "ensure_role",
			StepKind::CreateUser => "create_user",
			StepKind::AssignRole => "assign_role",
			StepKind::RequiredAction => "required_action",
			StepKind::Localization => "localization",
			StepKind::Enroll => "enroll",
			StepKind::CreateFlow => "create_flow",
			StepKind::CopyFlow => "copy_flow",
			StepKind::DeleteFlow => "delete_flow",
			StepKind::AddLeaf => "add_leaf",
			StepKind::AddSubflow => "add_subflow",
			StepKind::SetRequirement => "set_requirement",
			StepKind::AttachConfig => "attach_config",
			StepKind::BindEntryPoint => "bind_entry_point",
			StepKind::Poll => "poll",
			StepKind::Scenario => "scenario",
		}
	}
}
impl Display for StepKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StepOutcome {
	/// Entry to a provisioning step.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl StepOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			StepOutcome::Attempt => "attempt",
			StepOutcome::Success => "success",
			StepOutcome::Failure => "failure",
		}
	}
}
impl Display for StepOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Runs `fut` inside a step span, recording attempt and outcome counters around it.
pub async fn observe<T, Fut>(kind: StepKind, realm: &str, fut: Fut) -> Result<T>
where
	Fut: Future<Output = Result<T>>,
{
	let span = ProvisionSpan::new(kind, realm);

	record_step_outcome(kind, StepOutcome::Attempt);

	let result = span.instrument(fut).await;

	match &result {
		Ok(_) => record_step_outcome(kind, StepOutcome::Success),
		Err(_err) => {
			#[cfg(feature = "tracing")]
			::tracing::warn!(step = kind.as_str(), realm, error = %_err, "provisioning step failed");

			record_step_outcome(kind, StepOutcome::Failure);
		},
	}

	result
}
