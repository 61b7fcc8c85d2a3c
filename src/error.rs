//! Gateway-level error types shared across the token manager, cache, executor, and fetchers.

// self
use crate::_prelude::*;

/// Gateway-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical gateway error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Token exchange failure; fatal for the current call and never retried internally.
	#[error(transparent)]
	Auth(#[from] AuthError),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Temporary upstream failure; retried with the backoff ladder.
	#[error(transparent)]
	Transient(#[from] TransientError),

	/// Upstream answered HTTP 429; retried while honoring `Retry-After`.
	#[error("Upstream rate limit hit (HTTP 429).")]
	RateLimited {
		/// Wait hint parsed from the `Retry-After` header, when supplied.
		retry_after: Option<Duration>,
	},
	/// Upstream answered HTTP 404; the resource is genuinely absent, never retried.
	#[error("Upstream resource was not found: {url}.")]
	NotFound {
		/// URL of the missing resource.
		url: String,
	},
	/// The attempt budget ran out; carries the last rate-limit/transient failure observed.
	#[error("Retries exhausted after {attempts} attempts.")]
	RetriesExhausted {
		/// Number of upstream attempts that were made.
		attempts: u32,
		/// Failure observed on the final attempt.
		#[source]
		source: Box<Error>,
	},
	/// The per-call deadline elapsed while the call was suspended.
	#[error("Call was cancelled while waiting on {stage}.")]
	Cancelled {
		/// Suspension point that was abandoned.
		stage: SuspendPoint,
	},
	/// Upstream payload could not be decoded into the expected shape.
	#[error("Failed to decode the {resource} payload.")]
	Decode {
		/// Resource kind whose payload was being decoded.
		resource: crate::cache::ResourceKind,
		/// Structured parsing failure, including the offending JSON path.
		#[source]
		source: serde_path_to_error::Error<serde_json::error::Error>,
	},
}

/// Suspension points at which a call may be parked and, with a deadline set, cancelled.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SuspendPoint {
	/// The call had not been dispatched yet when the deadline elapsed.
	Dispatch,
	/// Waiting for a free slot in the shared rate window.
	RateWindow,
	/// Sleeping out a retry backoff delay.
	Backoff,
}
impl SuspendPoint {
	/// Stable lowercase label for logs and metrics.
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Dispatch => "dispatch",
			Self::RateWindow => "rate_window",
			Self::Backoff => "backoff",
		}
	}
}
impl Display for SuspendPoint {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Token exchange failures raised by the token manager.
#[derive(Debug, ThisError)]
pub enum AuthError {
	/// Token endpoint answered with a non-success status.
	#[error("Token endpoint returned HTTP {status}.")]
	ExchangeStatus {
		/// HTTP status code of the rejection.
		status: u16,
		/// Truncated response body preview, when one was readable.
		body: Option<String>,
	},
	/// Token endpoint responded with JSON that could not be parsed.
	#[error("Token endpoint returned malformed JSON.")]
	ExchangeParse {
		/// Structured parsing failure, including the offending JSON path.
		#[source]
		source: serde_path_to_error::Error<serde_json::error::Error>,
		/// HTTP status code of the response.
		status: u16,
	},
	/// Token endpoint returned a non-positive lifetime.
	#[error("The expires_in value must be positive.")]
	NonPositiveExpiresIn {
		/// Lifetime reported by the endpoint, in seconds.
		expires_in: i64,
	},
	/// Token endpoint returned an excessively large lifetime.
	#[error("The expires_in value exceeds the supported range.")]
	ExpiresInOutOfRange {
		/// Lifetime reported by the endpoint, in seconds.
		expires_in: i64,
	},
	/// Transport failure while calling the token endpoint.
	#[error("Transport failure occurred during the token exchange.")]
	Transport {
		/// Underlying transient failure.
		#[source]
		source: TransientError,
	},
}

/// Configuration and validation failures raised by the gateway.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Provider profile contains an unparseable URL.
	#[error("Provider profile contains an invalid URL.")]
	InvalidEndpoint {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Provider endpoint is not served over HTTPS.
	#[error("The {endpoint} URL must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Endpoint label (token endpoint or API base).
		endpoint: &'static str,
		/// Offending URL.
		url: String,
	},
	/// API base URL cannot carry path segments.
	#[error("The API base URL cannot be extended with path segments: {url}.")]
	UnsupportedApiBase {
		/// Offending URL.
		url: String,
	},

	/// Rate-limit budget of zero requests per window.
	#[error("Rate limit count must be positive.")]
	ZeroRateLimit,
	/// Rate window with no duration.
	#[error("Rate window interval must be positive.")]
	ZeroRateInterval,
	/// Attempt budget of zero.
	#[error("Maximum retries must be positive.")]
	ZeroMaxRetries,
	/// Airport or airline code failed validation.
	#[error("Resource identifier is invalid.")]
	InvalidCode(#[from] crate::provider::CodeError),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Temporary failure variants (safe to retry).
#[derive(Debug, ThisError)]
pub enum TransientError {
	/// Upstream answered with an unexpected, retryable status.
	#[error("Upstream returned HTTP {status}.")]
	UpstreamStatus {
		/// HTTP status code of the response.
		status: u16,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the upstream provider.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
}
impl TransientError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransientError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}
