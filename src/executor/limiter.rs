//! Fixed-window rate limiting shared by every upstream data call.
//!
//! The provider enforces a single account-wide quota, so the window is global
//! rather than partitioned per resource type. Partitioning would either
//! under-utilize the quota or still risk violating the provider's true limit.

// std
use std::time::Duration as StdDuration;
// crates.io
use tokio::time::{Instant, sleep_until};
// self
use crate::{_prelude::*, error::SuspendPoint};

/// One span of the fixed rate window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RateWindow {
	/// Instant the window opened.
	pub started_at: Instant,
	/// Calls admitted since the window opened.
	pub count: u32,
}

/// Admits at most `limit` calls per `interval`, blocking surplus callers
/// until the next window boundary.
///
/// A slot is consumed before the call is issued and never handed back, so a
/// cancelled or failed call still counts against the window.
#[derive(Debug)]
pub struct RateLimiter {
	limit: u32,
	interval: StdDuration,
	window: AsyncMutex<Option<RateWindow>>,
}
impl RateLimiter {
	/// Creates a limiter for the given budget.
	///
	/// `interval` must be positive; [`GatewayConfig::validate`] enforces this
	/// before a limiter is built from configuration.
	///
	/// [`GatewayConfig::validate`]: crate::config::GatewayConfig::validate
	pub fn new(limit: u32, interval: Duration) -> Self {
		let interval = StdDuration::try_from(interval).unwrap_or(StdDuration::ZERO);

		Self { limit, interval, window: AsyncMutex::new(None) }
	}

	/// Consumes one slot, waiting for the next window boundary when the
	/// current window is full.
	///
	/// Waiters are woken at the boundary in best-effort FIFO order; strict
	/// ordering between queued callers is not guaranteed. When `deadline`
	/// falls before the wait can finish, the wait aborts at the deadline with
	/// [`Error::Cancelled`].
	pub async fn acquire(&self, deadline: Option<Instant>) -> Result<()> {
		loop {
			let retry_at = {
				let mut window = self.window.lock().await;
				let now = Instant::now();

				match window.as_mut() {
					Some(active) if now.duration_since(active.started_at) < self.interval => {
						if active.count < self.limit {
							active.count += 1;

							return Ok(());
						}

						active.started_at + self.interval
					},
					_ => {
						*window = Some(RateWindow { started_at: now, count: 1 });

						return Ok(());
					},
				}
			};

			match deadline {
				Some(deadline) if deadline <= retry_at => {
					sleep_until(deadline).await;

					return Err(Error::Cancelled { stage: SuspendPoint::RateWindow });
				},
				_ => sleep_until(retry_at).await,
			}
		}
	}

	/// Returns a copy of the current window, if one has opened.
	pub async fn snapshot(&self) -> Option<RateWindow> {
		*self.window.lock().await
	}

	/// Returns the configured per-window call budget.
	pub fn limit(&self) -> u32 {
		self.limit
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test(start_paused = true)]
	async fn calls_within_the_budget_are_admitted_immediately() {
		let limiter = RateLimiter::new(3, Duration::seconds(60));
		let started = Instant::now();

		for _ in 0..3 {
			limiter.acquire(None).await.expect("Slot should be granted.");
		}

		assert_eq!(started.elapsed(), StdDuration::ZERO);

		let window = limiter.snapshot().await.expect("Window should be open.");

		assert_eq!(window.count, 3);
	}

	#[tokio::test(start_paused = true)]
	async fn surplus_call_waits_for_the_window_boundary() {
		let limiter = RateLimiter::new(3, Duration::seconds(60));

		for _ in 0..3 {
			limiter.acquire(None).await.expect("Slot should be granted.");
		}

		let started = Instant::now();

		limiter.acquire(None).await.expect("Slot should be granted at the boundary.");

		assert_eq!(started.elapsed(), StdDuration::from_secs(60));

		let window = limiter.snapshot().await.expect("Window should be open.");

		assert_eq!(window.count, 1);
	}

	#[tokio::test(start_paused = true)]
	async fn idle_interval_resets_the_window() {
		let limiter = RateLimiter::new(2, Duration::seconds(60));

		limiter.acquire(None).await.expect("Slot should be granted.");
		limiter.acquire(None).await.expect("Slot should be granted.");
		tokio::time::advance(StdDuration::from_secs(60)).await;

		let started = Instant::now();

		limiter.acquire(None).await.expect("Slot should be granted after the reset.");

		assert_eq!(started.elapsed(), StdDuration::ZERO);
		assert_eq!(limiter.snapshot().await.expect("Window should be open.").count, 1);
	}

	#[tokio::test(start_paused = true)]
	async fn queued_waiters_share_the_next_window() {
		let limiter = RateLimiter::new(2, Duration::seconds(10));

		limiter.acquire(None).await.expect("Slot should be granted.");
		limiter.acquire(None).await.expect("Slot should be granted.");

		let (first, second) = tokio::join!(limiter.acquire(None), limiter.acquire(None));

		first.expect("Queued slot should be granted.");
		second.expect("Queued slot should be granted.");

		let window = limiter.snapshot().await.expect("Window should be open.");

		assert_eq!(window.count, 2);
	}

	#[tokio::test(start_paused = true)]
	async fn deadline_inside_the_wait_cancels_at_the_deadline() {
		let limiter = RateLimiter::new(1, Duration::seconds(60));

		limiter.acquire(None).await.expect("Slot should be granted.");

		let started = Instant::now();
		let deadline = Instant::now() + StdDuration::from_secs(5);
		let err = limiter.acquire(Some(deadline)).await.expect_err("Wait should cancel.");

		assert!(matches!(err, Error::Cancelled { stage: SuspendPoint::RateWindow }));
		assert_eq!(started.elapsed(), StdDuration::from_secs(5));

		// The cancelled caller consumed no slot.
		assert_eq!(limiter.snapshot().await.expect("Window should be open.").count, 1);
	}

	#[tokio::test(start_paused = true)]
	async fn deadline_beyond_the_wait_does_not_cancel() {
		let limiter = RateLimiter::new(1, Duration::seconds(10));

		limiter.acquire(None).await.expect("Slot should be granted.");

		let deadline = Instant::now() + StdDuration::from_secs(60);

		limiter
			.acquire(Some(deadline))
			.await
			.expect("Wait shorter than the deadline should finish.");
	}
}
