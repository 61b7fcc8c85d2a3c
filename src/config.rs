//! Gateway configuration: cache TTLs, rate budget, retry ladder, refresh buffer.
//!
//! Every knob the triad consults lives here instead of being hard-coded;
//! historical deployments of the upstream service ran with different TTLs and
//! request budgets, so none of the shipped defaults are authoritative.

// self
use crate::{_prelude::*, cache::TtlSettings, error::ConfigError, executor::BackoffPolicy};

/// Shared request budget: `count` calls per `interval_ms` window.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimit {
	/// Calls admitted per window.
	pub count: u32,
	/// Window length in milliseconds.
	pub interval_ms: u64,
}
impl Default for RateLimit {
	fn default() -> Self {
		Self { count: 3, interval_ms: 60_000 }
	}
}

/// Top-level configuration consumed by the gateway constructor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GatewayConfig {
	/// Per-resource cache lifetimes, in seconds.
	pub ttl_seconds: TtlSettings,
	/// Global upstream request budget.
	pub rate_limit: RateLimit,
	/// Backoff ladder applied between retries, in milliseconds per attempt.
	pub retry_delays_ms: Vec<u64>,
	/// Attempt budget per upstream call.
	pub max_retries: u32,
	/// How long before expiry a token stops being reused, in milliseconds.
	pub token_refresh_buffer_ms: u64,
}
impl GatewayConfig {
	/// Checks the invariants the triad depends on.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.rate_limit.count == 0 {
			return Err(ConfigError::ZeroRateLimit);
		}
		if self.rate_limit.interval_ms == 0 {
			return Err(ConfigError::ZeroRateInterval);
		}
		if self.max_retries == 0 {
			return Err(ConfigError::ZeroMaxRetries);
		}

		Ok(())
	}

	/// Overrides the cache TTL table.
	pub fn with_ttl_seconds(mut self, ttl_seconds: TtlSettings) -> Self {
		self.ttl_seconds = ttl_seconds;

		self
	}

	/// Overrides the rate budget.
	pub fn with_rate_limit(mut self, rate_limit: RateLimit) -> Self {
		self.rate_limit = rate_limit;

		self
	}

	/// Overrides the retry ladder.
	pub fn with_retry_delays_ms(mut self, delays: impl IntoIterator<Item = u64>) -> Self {
		self.retry_delays_ms = delays.into_iter().collect();

		self
	}

	/// Overrides the attempt budget.
	pub fn with_max_retries(mut self, max_retries: u32) -> Self {
		self.max_retries = max_retries;

		self
	}

	/// Overrides the token refresh buffer.
	pub fn with_token_refresh_buffer_ms(mut self, buffer_ms: u64) -> Self {
		self.token_refresh_buffer_ms = buffer_ms;

		self
	}

	/// Builds the backoff policy described by the retry ladder.
	pub fn backoff(&self) -> BackoffPolicy {
		BackoffPolicy::from_millis(self.retry_delays_ms.iter().copied())
	}

	/// Returns the window interval as a duration.
	pub fn interval(&self) -> Duration {
		millis(self.rate_limit.interval_ms)
	}

	/// Returns the token refresh buffer as a duration.
	pub fn refresh_buffer(&self) -> Duration {
		millis(self.token_refresh_buffer_ms)
	}
}
impl Default for GatewayConfig {
	fn default() -> Self {
		Self {
			ttl_seconds: TtlSettings::default(),
			rate_limit: RateLimit::default(),
			retry_delays_ms: vec![5_000, 10_000, 15_000],
			max_retries: 3,
			token_refresh_buffer_ms: 300_000,
		}
	}
}

fn millis(ms: u64) -> Duration {
	Duration::milliseconds(i64::try_from(ms).unwrap_or(i64::MAX))
}
