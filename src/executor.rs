//! Retry/rate-limit mediation for every outbound data call.
//!
//! [`RequestExecutor::execute`] drives a caller-supplied fetch through an
//! explicit attempt loop: acquire a window slot, invoke, classify, then
//! deliver, fail, or wait and go again. Classification is a pure step with
//! enumerable terminal states, so the retry arithmetic is testable without
//! timers; the waits themselves honor an optional per-call deadline.

pub mod backoff;
pub mod limiter;

pub use backoff::*;
pub use limiter::*;

// std
use std::time::Duration as StdDuration;
// crates.io
use tokio::time::{Instant, sleep_until};
// self
use crate::{
	_prelude::*,
	error::{SuspendPoint, TransientError},
	http::UpstreamResponse,
	obs::{self, RetryReason},
};

/// Per-call overrides accepted by [`RequestExecutor::execute`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExecuteOptions {
	/// Overrides the executor's configured attempt budget.
	pub max_retries: Option<u32>,
	/// Aborts window and backoff waits once this much time has passed.
	pub timeout: Option<Duration>,
}
impl ExecuteOptions {
	/// Creates options that inherit every executor default.
	pub fn new() -> Self {
		Self::default()
	}

	/// Overrides the attempt budget for this call.
	pub fn with_max_retries(mut self, max_retries: u32) -> Self {
		self.max_retries = Some(max_retries);

		self
	}

	/// Attaches a per-call timeout.
	pub fn with_timeout(mut self, timeout: Duration) -> Self {
		self.timeout = Some(timeout);

		self
	}
}

/// Outcome of classifying one attempt.
#[derive(Debug)]
enum Verdict {
	/// Deliver the successful response to the caller.
	Deliver(UpstreamResponse),
	/// Surface the error as-is; retrying cannot help.
	Fail(Error),
	/// The attempt budget is spent; wrap the final error.
	Exhausted(Error),
	/// Wait, then run another attempt.
	Retry { wait: Duration, reason: RetryReason },
}

/// Mediates upstream calls through the shared rate window and retry ladder.
#[derive(Clone, Debug)]
pub struct RequestExecutor {
	limiter: Arc<RateLimiter>,
	backoff: BackoffPolicy,
	max_retries: u32,
	window_interval: Duration,
}
impl RequestExecutor {
	/// Creates an executor enforcing `limit` calls per `interval` with the
	/// provided backoff policy and attempt budget.
	pub fn new(limit: u32, interval: Duration, backoff: BackoffPolicy, max_retries: u32) -> Self {
		Self {
			limiter: Arc::new(RateLimiter::new(limit, interval)),
			backoff,
			max_retries,
			window_interval: interval,
		}
	}

	/// Returns the shared rate limiter.
	pub fn limiter(&self) -> &RateLimiter {
		&self.limiter
	}

	/// Runs `fetch` until it succeeds, fails fatally, or spends the budget.
	///
	/// Each attempt consumes a rate-window slot before `fetch` is invoked.
	/// HTTP 429 waits honor the upstream `Retry-After` hint ahead of the
	/// backoff policy; other retryable failures use the policy delay for the
	/// current attempt, falling back to the window interval once the policy
	/// is exhausted. HTTP 404 and authentication failures surface immediately
	/// without consuming further attempts.
	pub async fn execute<F, Fut>(
		&self,
		fetch: F,
		options: ExecuteOptions,
	) -> Result<UpstreamResponse>
	where
		F: Fn() -> Fut,
		Fut: Future<Output = Result<UpstreamResponse>>,
	{
		// At least one attempt is always made.
		let max_retries = options.max_retries.unwrap_or(self.max_retries).max(1);
		let deadline = options.timeout.map(|timeout| Instant::now() + to_std(timeout));
		let mut attempt = 0;

		loop {
			self.limiter.acquire(deadline).await?;

			if let Some(deadline) = deadline {
				if Instant::now() >= deadline {
					return Err(Error::Cancelled { stage: SuspendPoint::Dispatch });
				}
			}

			// Classification never yields Retry on the final attempt, so the
			// loop always terminates within max_retries iterations.
			match self.classify(fetch().await, attempt, max_retries) {
				Verdict::Deliver(response) => return Ok(response),
				Verdict::Fail(err) => return Err(err),
				Verdict::Exhausted(err) =>
					return Err(Error::RetriesExhausted {
						attempts: attempt + 1,
						source: Box::new(err),
					}),
				Verdict::Retry { wait, reason } => {
					obs::record_retry(reason);

					self.wait_before_retry(wait, deadline).await?;

					attempt += 1;
				},
			}
		}
	}

	fn classify(
		&self,
		outcome: Result<UpstreamResponse>,
		attempt: u32,
		max_retries: u32,
	) -> Verdict {
		let last_attempt = attempt + 1 >= max_retries;

		match outcome {
			Ok(response) if response.is_success() => Verdict::Deliver(response),
			Ok(response) if response.status == 404 =>
				Verdict::Fail(Error::NotFound { url: response.url.to_string() }),
			Ok(response) if response.status == 429 =>
				if last_attempt {
					Verdict::Exhausted(Error::RateLimited { retry_after: response.retry_after })
				} else {
					let wait = response
						.retry_after
						.or_else(|| self.backoff.delay_for(attempt))
						.unwrap_or(self.window_interval);

					Verdict::Retry { wait, reason: RetryReason::RateLimited }
				},
			Ok(response) => {
				let error = TransientError::UpstreamStatus {
					status: response.status,
					retry_after: response.retry_after,
				};

				if last_attempt {
					Verdict::Exhausted(error.into())
				} else {
					Verdict::Retry {
						wait: self.retry_wait(attempt),
						reason: RetryReason::UpstreamStatus,
					}
				}
			},
			Err(Error::Transient(error)) => {
				let reason = match &error {
					TransientError::UpstreamStatus { .. } => RetryReason::UpstreamStatus,
					TransientError::Network { .. } => RetryReason::Network,
				};

				if last_attempt {
					Verdict::Exhausted(error.into())
				} else {
					Verdict::Retry { wait: self.retry_wait(attempt), reason }
				}
			},
			Err(err) => Verdict::Fail(err),
		}
	}

	fn retry_wait(&self, attempt: u32) -> Duration {
		self.backoff.delay_for(attempt).unwrap_or(self.window_interval)
	}

	async fn wait_before_retry(&self, wait: Duration, deadline: Option<Instant>) -> Result<()> {
		let wake_at = Instant::now() + to_std(wait);

		match deadline {
			Some(deadline) if deadline <= wake_at => {
				sleep_until(deadline).await;

				Err(Error::Cancelled { stage: SuspendPoint::Backoff })
			},
			_ => {
				sleep_until(wake_at).await;

				Ok(())
			},
		}
	}
}

fn to_std(duration: Duration) -> StdDuration {
	StdDuration::try_from(duration).unwrap_or(StdDuration::ZERO)
}
