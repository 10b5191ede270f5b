//! Bounded wait-for-condition primitive for eventually-consistent side effects.
//!
//! [`Poller::poll`] fetches a candidate set, tests a predicate against each element, and sleeps a
//! fixed interval between attempts. The deadline is checked after every fetch, so a timeout never
//! fires early, and each sleep is clipped to the time left, so it never fires more than one
//! interval late. Time is measured with [`tokio::time`], which lets tests pause the clock.

// crates.io
use tokio::time::{self, Instant};
// self
use crate::{
	_prelude::*,
	obs::{self, StepKind},
};

/// Timeout and retry interval for one wait.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollPolicy {
	/// Total time to keep trying.
	pub timeout: StdDuration,
	/// Pause between attempts.
	pub interval: StdDuration,
}
impl PollPolicy {
	/// Creates a policy from its two durations.
	pub const fn new(timeout: StdDuration, interval: StdDuration) -> Self {
		Self { timeout, interval }
	}

	/// Returns a copy with a different timeout.
	pub fn with_timeout(mut self, timeout: StdDuration) -> Self {
		self.timeout = timeout;

		self
	}
}
impl Default for PollPolicy {
	fn default() -> Self {
		Self::new(StdDuration::from_secs(30), StdDuration::from_millis(500))
	}
}

/// Runs bounded polls under a fixed [`PollPolicy`].
#[derive(Clone, Copy, Debug, Default)]
pub struct Poller {
	policy: PollPolicy,
}
impl Poller {
	/// Creates a poller for `policy`.
	pub const fn new(policy: PollPolicy) -> Self {
		Self { policy }
	}

	/// Returns the policy in use.
	pub const fn policy(&self) -> PollPolicy {
		self.policy
	}

	/// Repeatedly calls `fetch` until an element satisfies `predicate` or the timeout elapses.
	///
	/// Errors from `fetch` propagate immediately. `criteria` describes the wait in the
	/// [`Error::Timeout`] raised on expiry.
	pub async fn poll<T, F, Fut, P>(
		&self,
		criteria: impl Into<String>,
		mut fetch: F,
		mut predicate: P,
	) -> Result<T>
	where
		F: FnMut() -> Fut,
		Fut: Future<Output = Result<Vec<T>>>,
		P: FnMut(&T) -> bool,
	{
		let criteria = criteria.into();
		let started = Instant::now();
		let mut attempts = 0_u32;

		loop {
			attempts += 1;

			if let Some(found) = fetch().await?.into_iter().find(|candidate| predicate(candidate)) {
				obs::record_step_outcome(StepKind::Poll, obs::StepOutcome::Success);

				return Ok(found);
			}

			let elapsed = started.elapsed();

			if elapsed >= self.policy.timeout {
				#[cfg(feature = "tracing")]
				tracing::debug!(criteria, attempts, ?elapsed, "poll timed out");

				obs::record_step_outcome(StepKind::Poll, obs::StepOutcome::Failure);

				return Err(Error::Timeout { criteria, elapsed });
			}

			#[cfg(feature = "tracing")]
			tracing::trace!(criteria, attempts, ?elapsed, "no match yet, retrying");

			time::sleep(self.policy.interval.min(self.policy.timeout - elapsed)).await;
		}
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::sync::atomic::{AtomicU32, Ordering};
	// self
	use super::*;

	fn poller(timeout_ms: u64, interval_ms: u64) -> Poller {
		Poller::new(PollPolicy::new(
			StdDuration::from_millis(timeout_ms),
			StdDuration::from_millis(interval_ms),
		))
	}

	#[tokio::test(start_paused = true)]
	async fn returns_within_one_interval_of_the_condition_becoming_true() {
		let started = Instant::now();
		let ready_at = StdDuration::from_millis(1_250);
		let found = poller(10_000, 500)
			.poll(
				"value ready",
				|| async move {
					Ok(if started.elapsed() >= ready_at { vec![7_u8] } else { Vec::new() })
				},
				|value| *value == 7,
			)
			.await
			.expect("Poll should find the value before the deadline.");
		let elapsed = started.elapsed();

		assert_eq!(found, 7);
		assert!(elapsed >= ready_at);
		assert!(elapsed <= ready_at + StdDuration::from_millis(500));
	}

	#[tokio::test(start_paused = true)]
	async fn never_satisfied_predicate_times_out_at_or_after_deadline() {
		let started = Instant::now();
		let err = poller(2_000, 300)
			.poll("nothing", || async { Ok(vec![1_u8, 2, 3]) }, |_| false)
			.await
			.expect_err("Unsatisfiable predicate should time out.");
		let elapsed = started.elapsed();

		assert!(elapsed >= StdDuration::from_secs(2));
		assert!(elapsed <= StdDuration::from_millis(2_300));

		match err {
			Error::Timeout { criteria, elapsed } => {
				assert_eq!(criteria, "nothing");
				assert!(elapsed >= StdDuration::from_secs(2));
			},
			other => panic!("Unexpected error: {other:?}."),
		}
	}

	#[tokio::test(start_paused = true)]
	async fn fetch_errors_propagate_without_retrying() {
		let calls = AtomicU32::new(0);
		let err = poller(5_000, 100)
			.poll(
				"failing fetch",
				|| {
					calls.fetch_add(1, Ordering::SeqCst);

					async {
						Err::<Vec<u8>, _>(Error::TokenRejected { reason: "denied".into() })
					}
				},
				|_| true,
			)
			.await
			.expect_err("Fetch errors should propagate.");

		assert!(matches!(err, Error::TokenRejected { .. }));
		assert_eq!(calls.load(Ordering::SeqCst), 1);
	}

	#[test]
	fn default_policy_matches_mail_wait_defaults() {
		let policy = PollPolicy::default();

		assert_eq!(policy.timeout, StdDuration::from_secs(30));
		assert_eq!(policy.interval, StdDuration::from_millis(500));
	}
}
