// self
use crate::obs::{StepKind, StepOutcome};

/// Records a step outcome via the global metrics recorder (when enabled).
pub fn record_step_outcome(kind: StepKind, outcome: StepOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"flow_provisioner_step_total",
			"step" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}
