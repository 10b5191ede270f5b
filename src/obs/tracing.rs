// self
use crate::{_prelude::*, obs::StepKind};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedStep<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedStep<F> = F;

/// A span builder used by provisioning steps.
#[derive(Clone, Debug)]
pub struct ProvisionSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl ProvisionSpan {
	/// Creates a new span tagged with the provided step kind + realm.
	pub fn new(kind: StepKind, realm: &str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("flow_provisioner.step", step = kind.as_str(), realm);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, realm);

			Self {}
		}
	}

	/// Enters the span for synchronous sections.
	pub fn entered(self) -> ProvisionSpanGuard {
		#[cfg(feature = "tracing")]
		{
			ProvisionSpanGuard { guard: self.span.entered() }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = self;

			ProvisionSpanGuard {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedStep<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// RAII guard returned by [`ProvisionSpan::entered`].
pub struct ProvisionSpanGuard {
	#[cfg(feature = "tracing")]
	#[allow(dead_code)]
	guard: tracing::span::EnteredSpan,
}
impl Debug for ProvisionSpanGuard {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("ProvisionSpanGuard(..)")
	}
}
