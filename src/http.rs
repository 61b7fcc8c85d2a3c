//! Transport primitives for upstream TDX requests.
//!
//! The module exposes [`UpstreamTransport`] as the gateway's only dependency
//! on an HTTP stack. Callers provide an implementation (typically behind
//! `Arc<T>` where `T: UpstreamTransport`) that performs authenticated GETs
//! against the data API and form POSTs against the token endpoint, returning
//! an [`UpstreamResponse`] that carries the status code, any `Retry-After`
//! hint, and the raw body. Transport-level failures map to
//! [`TransientError`]; status-based classification happens above this layer.

// std
#[cfg(feature = "reqwest")] use std::ops::Deref;
// crates.io
#[cfg(feature = "reqwest")]
use reqwest::header::{AUTHORIZATION, HeaderMap, RETRY_AFTER};
#[cfg(feature = "reqwest")] use time::format_description::well_known::Rfc2822;
// self
use crate::{_prelude::*, auth::AuthHeaders, cache::Payload, error::TransientError};

/// Boxed future returned by [`UpstreamTransport`] implementations.
pub type TransportFuture<'a, T> =
	Pin<Box<dyn Future<Output = Result<T, TransientError>> + Send + 'a>>;

/// Abstraction over HTTP transports capable of reaching the TDX platform.
///
/// Implementations must be `Send + Sync + 'static` so they can be shared
/// across gateway clones without additional wrappers, and the futures they
/// return must be `Send` so callers can box them freely. The transport never
/// interprets status codes; it only reports what upstream said.
pub trait UpstreamTransport
where
	Self: 'static + Send + Sync,
{
	/// Performs an authenticated GET against a data API URL.
	fn get(&self, url: Url, headers: AuthHeaders) -> TransportFuture<'_, UpstreamResponse>;

	/// Posts an `application/x-www-form-urlencoded` body, optionally with an
	/// explicit `Authorization` header, for token exchanges.
	fn post_form(
		&self,
		url: Url,
		form: BTreeMap<String, String>,
		authorization: Option<String>,
	) -> TransportFuture<'_, UpstreamResponse>;
}

/// Snapshot of one upstream HTTP response.
#[derive(Clone, Debug)]
pub struct UpstreamResponse {
	/// Final URL the response was served from.
	pub url: Url,
	/// HTTP status code returned by upstream.
	pub status: u16,
	/// `Retry-After` hint expressed as a relative duration, when present.
	pub retry_after: Option<Duration>,
	/// Raw response body.
	pub body: Payload,
}
impl UpstreamResponse {
	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one
/// place. Token requests should not follow redirects, matching OAuth 2.0
/// guidance that token endpoints return results directly; configure any
/// custom [`ReqwestClient`] accordingly before wrapping it.
#[cfg(feature = "reqwest")]
#[derive(Clone, Default)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Wraps an existing [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestTransport {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestTransport {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl UpstreamTransport for ReqwestTransport {
	fn get(&self, url: Url, headers: AuthHeaders) -> TransportFuture<'_, UpstreamResponse> {
		let request = self.0.get(url).header(AUTHORIZATION, headers.authorization_value());

		Box::pin(async move { read_response(request.send().await?).await })
	}

	fn post_form(
		&self,
		url: Url,
		form: BTreeMap<String, String>,
		authorization: Option<String>,
	) -> TransportFuture<'_, UpstreamResponse> {
		let mut request = self.0.post(url).form(&form);

		if let Some(value) = authorization {
			request = request.header(AUTHORIZATION, value);
		}

		Box::pin(async move { read_response(request.send().await?).await })
	}
}

#[cfg(feature = "reqwest")]
async fn read_response(response: reqwest::Response) -> Result<UpstreamResponse, TransientError> {
	let url = response.url().clone();
	let status = response.status().as_u16();
	let retry_after = parse_retry_after(response.headers());
	let body = Payload::from(response.bytes().await?.to_vec());

	Ok(UpstreamResponse { url, status, retry_after, body })
}

#[cfg(feature = "reqwest")]
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
	let value = headers.get(RETRY_AFTER)?;
	let raw = value.to_str().ok()?.trim();

	if let Ok(secs) = raw.parse::<u64>() {
		return Some(Duration::seconds(secs as i64));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		if delta.is_positive() {
			return Some(delta);
		}
	}

	None
}

#[cfg(all(test, feature = "reqwest"))]
mod tests {
	// crates.io
	use reqwest::header::HeaderValue;
	// self
	use super::*;

	fn headers_with_retry_after(raw: &str) -> HeaderMap {
		let mut headers = HeaderMap::new();

		headers.insert(
			RETRY_AFTER,
			HeaderValue::from_str(raw).expect("Header value should be valid."),
		);

		headers
	}

	#[test]
	fn numeric_retry_after_parses_as_seconds() {
		let headers = headers_with_retry_after("2");

		assert_eq!(parse_retry_after(&headers), Some(Duration::seconds(2)));
	}

	#[test]
	fn http_date_retry_after_parses_when_in_the_future() {
		let future = OffsetDateTime::now_utc() + Duration::minutes(5);
		let raw = future.format(&Rfc2822).expect("Formatting should succeed.");
		let parsed = parse_retry_after(&headers_with_retry_after(&raw))
			.expect("A future HTTP date should parse.");

		assert!(parsed > Duration::minutes(4));
		assert!(parsed <= Duration::minutes(5));
	}

	#[test]
	fn past_or_malformed_retry_after_is_ignored() {
		assert_eq!(
			parse_retry_after(&headers_with_retry_after("Mon, 01 Jan 2001 00:00:00 GMT")),
			None
		);
		assert_eq!(parse_retry_after(&headers_with_retry_after("soon")), None);
		assert_eq!(parse_retry_after(&HeaderMap::new()), None);
	}

	#[test]
	fn success_covers_the_2xx_range() {
		let url = Url::parse("https://example.test/").expect("URL should parse.");
		let response = |status| UpstreamResponse {
			url: url.clone(),
			status,
			retry_after: None,
			body: Payload::from(Vec::new()),
		};

		assert!(response(200).is_success());
		assert!(response(299).is_success());
		assert!(!response(199).is_success());
		assert!(!response(404).is_success());
	}
}
