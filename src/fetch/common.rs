//! Plumbing shared by the typed domain fetchers.

// self
use crate::{
	_prelude::*,
	cache::{Payload, ResourceKind},
	gateway::Gateway,
	http::UpstreamTransport,
	provider::ODataQuery,
};

/// Weekday names matching the upstream Monday-first service-day mask.
const WEEKDAY_NAMES: [&str; 7] =
	["Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday"];

/// Runs one resource request through the gateway and decodes the JSON payload.
///
/// The cache key is `{key}?{fingerprint}` so query variants of the same resource occupy
/// distinct entries and concurrent callers issuing the same query share one singleflight
/// guard.
pub(super) async fn fetch_records<C, T>(
	gateway: &Gateway<C>,
	kind: ResourceKind,
	key: &str,
	mut url: Url,
	query: &ODataQuery,
) -> Result<T>
where
	C: ?Sized + UpstreamTransport,
	T: DeserializeOwned,
{
	url.query_pairs_mut().extend_pairs(query.pairs());

	let key = format!("{key}?{}", query.fingerprint());
	let transport = gateway.transport().clone();
	let payload = gateway
		.get(kind, key, |headers| {
			let transport = transport.clone();
			let url = url.clone();

			async move { transport.get(url, headers).await.map_err(Error::from) }
		})
		.await?;

	decode(kind, &payload)
}

/// Decodes a payload into the expected shape, reporting the failing JSON path on error.
pub(super) fn decode<T>(kind: ResourceKind, payload: &Payload) -> Result<T>
where
	T: DeserializeOwned,
{
	payload.decode().map_err(|source| Error::Decode { resource: kind, source })
}

/// Renders a service-day mask as comma-separated weekday names.
///
/// Masks shorter than seven entries cover only the leading weekdays; a mask with no
/// operating day at all yields `None`.
pub(super) fn service_days_text(days: Option<&[bool]>) -> Option<String> {
	let names = days?
		.iter()
		.zip(WEEKDAY_NAMES)
		.filter_map(|(operates, name)| operates.then_some(name))
		.collect::<Vec<_>>();

	(!names.is_empty()).then(|| names.join(", "))
}
