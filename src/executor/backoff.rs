//! Backoff policies applied between retry attempts.

// self
use crate::_prelude::*;

/// Wait-duration policy indexed by the zero-based attempt number.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BackoffPolicy {
	/// Explicit list of delays, one per retry. Attempts past the end of the
	/// list yield no delay and the executor falls back to the window interval.
	Ladder(Vec<Duration>),
	/// `base * factor^attempt`, clamped to `max`. Never exhausts.
	Exponential {
		/// Delay applied before the first retry.
		base: Duration,
		/// Multiplier applied per subsequent attempt.
		factor: u32,
		/// Upper bound on the computed delay.
		max: Duration,
	},
}
impl BackoffPolicy {
	/// Builds a ladder from millisecond values, the shape used in configuration.
	pub fn from_millis(delays: impl IntoIterator<Item = u64>) -> Self {
		Self::Ladder(
			delays
				.into_iter()
				.map(|ms| Duration::milliseconds(i64::try_from(ms).unwrap_or(i64::MAX)))
				.collect(),
		)
	}

	/// Returns the delay for the given attempt, or `None` when the policy has
	/// no opinion and the caller should apply its documented fallback.
	pub fn delay_for(&self, attempt: u32) -> Option<Duration> {
		match self {
			Self::Ladder(delays) => delays.get(attempt as usize).copied(),
			Self::Exponential { base, factor, max } => {
				let multiplier =
					factor.checked_pow(attempt).and_then(|value| i32::try_from(value).ok());
				let delay = multiplier.and_then(|value| base.checked_mul(value)).unwrap_or(*max);

				Some(delay.min(*max))
			},
		}
	}
}
impl Default for BackoffPolicy {
	fn default() -> Self {
		Self::from_millis([5_000, 10_000, 15_000])
	}
}
