// self
use crate::{
	cache::ResourceKind,
	obs::{CacheEvent, FetchOutcome, RetryReason, TokenRefreshOutcome},
};

/// Records a fetch outcome via the global metrics recorder (when enabled).
pub fn record_fetch_outcome(kind: ResourceKind, outcome: FetchOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"tdx_gateway_fetch_total",
			"resource" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

/// Records a cache hit/miss/bypass via the global metrics recorder (when enabled).
pub fn record_cache_event(kind: ResourceKind, event: CacheEvent) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"tdx_gateway_cache_total",
			"resource" => kind.as_str(),
			"event" => event.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, event);
	}
}

/// Records a scheduled retry via the global metrics recorder (when enabled).
pub fn record_retry(reason: RetryReason) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("tdx_gateway_retry_total", "reason" => reason.as_str()).increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = reason;
	}
}

/// Records how a token header request was satisfied (when enabled).
pub fn record_token_refresh(outcome: TokenRefreshOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("tdx_gateway_token_total", "outcome" => outcome.as_str()).increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = outcome;
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn recorders_noop_without_metrics() {
		record_fetch_outcome(ResourceKind::Flights, FetchOutcome::Failure);
		record_cache_event(ResourceKind::Weather, CacheEvent::Miss);
		record_retry(RetryReason::RateLimited);
		record_token_refresh(TokenRefreshOutcome::Exchanged);
	}
}
