//! Optional observability helpers for gateway fetches.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `tdx_gateway.fetch` with the `resource`
//!   (data kind) and `stage` (call site) fields.
//! - Enable `metrics` to increment the `tdx_gateway_fetch_total`, `tdx_gateway_cache_total`,
//!   `tdx_gateway_retry_total`, and `tdx_gateway_token_total` counters, labeled by resource,
//!   outcome, event, or reason as appropriate.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Outcome labels recorded for each fetch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FetchOutcome {
	/// Entry to a gateway fetch helper.
	Attempt,
	/// Successful completion, whether served from cache or upstream.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl FetchOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FetchOutcome::Attempt => "attempt",
			FetchOutcome::Success => "success",
			FetchOutcome::Failure => "failure",
		}
	}
}
impl Display for FetchOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Cache interaction labels recorded per fetch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CacheEvent {
	/// A fresh entry satisfied the request.
	Hit,
	/// No fresh entry was available.
	Miss,
	/// The caller forced an upstream fetch, skipping the lookup.
	Bypass,
}
impl CacheEvent {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CacheEvent::Hit => "hit",
			CacheEvent::Miss => "miss",
			CacheEvent::Bypass => "bypass",
		}
	}
}
impl Display for CacheEvent {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Labels describing why the executor scheduled another attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RetryReason {
	/// Upstream answered HTTP 429.
	RateLimited,
	/// Upstream answered a retryable non-2xx status.
	UpstreamStatus,
	/// The transport reported a network failure.
	Network,
}
impl RetryReason {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			RetryReason::RateLimited => "rate_limited",
			RetryReason::UpstreamStatus => "upstream_status",
			RetryReason::Network => "network",
		}
	}
}
impl Display for RetryReason {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Labels describing how a token header request was satisfied.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenRefreshOutcome {
	/// A cached token outside the refresh buffer was reused.
	Reused,
	/// A fresh `client_credentials` exchange completed.
	Exchanged,
	/// The exchange failed.
	Failed,
}
impl TokenRefreshOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			TokenRefreshOutcome::Reused => "reused",
			TokenRefreshOutcome::Exchanged => "exchanged",
			TokenRefreshOutcome::Failed => "failed",
		}
	}
}
impl Display for TokenRefreshOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
