//! OData-style query modeling for upstream resource endpoints.

// std
use std::sync::OnceLock;
// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD_NO_PAD};
use sha2::{Digest, Sha256};
// self
use crate::_prelude::*;

const FORMAT_KEY: &str = "$format";
const FILTER_KEY: &str = "$filter";
const ORDER_BY_KEY: &str = "$orderby";
const SELECT_KEY: &str = "$select";
const TOP_KEY: &str = "$top";

/// Normalized set of OData query options with a stable fingerprint cache.
///
/// Parameters are kept sorted by key so equality and the fingerprint are independent of
/// insertion order. Every query carries `$format=JSON`. The [`fingerprint`](Self::fingerprint)
/// helper lazily caches a base64 (no padding) SHA-256 digest of the canonical query string;
/// fetchers embed it in cache keys so query variants of one resource occupy distinct entries.
#[derive(Default)]
pub struct ODataQuery {
	params: BTreeMap<String, String>,
	fingerprint_cache: OnceLock<String>,
}
impl ODataQuery {
	/// Creates a query carrying only `$format=JSON`.
	pub fn new() -> Self {
		Self::default().param(FORMAT_KEY, "JSON")
	}

	/// Sets the `$filter` expression.
	pub fn filter(self, expression: impl Into<String>) -> Self {
		self.param(FILTER_KEY, expression)
	}

	/// Sets the `$orderby` clause.
	pub fn order_by(self, clause: impl Into<String>) -> Self {
		self.param(ORDER_BY_KEY, clause)
	}

	/// Sets the `$select` projection from a field list.
	pub fn select<I, S>(self, fields: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let projection =
			fields.into_iter().map(|f| f.as_ref().to_owned()).collect::<Vec<_>>().join(",");

		self.param(SELECT_KEY, projection)
	}

	/// Caps the number of returned records via `$top`.
	pub fn top(self, count: u32) -> Self {
		self.param(TOP_KEY, count.to_string())
	}

	/// Sets an arbitrary query parameter, replacing any previous value for the key.
	pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.params.insert(key.into(), value.into());
		self.fingerprint_cache = OnceLock::new();

		self
	}

	/// Iterator over the parameters in canonical (key-sorted) order.
	pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
		self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
	}

	/// Number of parameters.
	pub fn len(&self) -> usize {
		self.params.len()
	}

	/// Whether the query carries no parameters at all.
	pub fn is_empty(&self) -> bool {
		self.params.is_empty()
	}

	/// Canonical `key=value&key=value` rendering in key-sorted order, without URL encoding.
	pub fn canonical(&self) -> String {
		self.params.iter().map(|(k, v)| format!("{k}={v}")).collect::<Vec<_>>().join("&")
	}

	/// Stable fingerprint derived from the canonical query string.
	///
	/// The fingerprint is a base64 (no padding) encoding of the SHA-256 digest of
	/// [`canonical`](Self::canonical) and is cached after the first calculation.
	pub fn fingerprint(&self) -> String {
		self.fingerprint_cache.get_or_init(|| compute_fingerprint(&self.canonical())).clone()
	}
}
impl Clone for ODataQuery {
	fn clone(&self) -> Self {
		Self { params: self.params.clone(), fingerprint_cache: OnceLock::new() }
	}
}
impl PartialEq for ODataQuery {
	fn eq(&self, other: &Self) -> bool {
		self.params == other.params
	}
}
impl Eq for ODataQuery {}
impl Debug for ODataQuery {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("ODataQuery").field(&self.params).finish()
	}
}
impl Display for ODataQuery {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.canonical())
	}
}

fn compute_fingerprint(canonical: &str) -> String {
	let mut hasher = Sha256::new();

	hasher.update(canonical.as_bytes());

	let digest = hasher.finalize();

	STANDARD_NO_PAD.encode(digest)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn every_query_requests_json() {
		let query = ODataQuery::new();

		assert_eq!(query.pairs().collect::<Vec<_>>(), vec![("$format", "JSON")]);
	}

	#[test]
	fn canonical_order_is_independent_of_insertion_order() {
		let lhs = ODataQuery::new().filter("AirlineID eq 'BR'").order_by("ScheduleTime");
		let rhs = ODataQuery::new().order_by("ScheduleTime").filter("AirlineID eq 'BR'");

		assert_eq!(lhs, rhs);
		assert_eq!(
			lhs.canonical(),
			"$filter=AirlineID eq 'BR'&$format=JSON&$orderby=ScheduleTime",
		);
		assert_eq!(lhs.fingerprint(), rhs.fingerprint());
	}

	#[test]
	fn fingerprints_distinguish_query_variants() {
		let departures = ODataQuery::new().filter("DepartureAirportID eq 'TPE'");
		let arrivals = ODataQuery::new().filter("ArrivalAirportID eq 'TPE'");

		assert_ne!(departures.fingerprint(), arrivals.fingerprint());

		let fp1 = departures.fingerprint();
		let fp2 = departures.fingerprint();

		assert_eq!(fp1, fp2, "Fingerprint should be cached and stable.");
	}

	#[test]
	fn select_joins_fields_with_commas() {
		let query = ODataQuery::new().select(["MetarText", "Temperature"]).top(1);

		assert_eq!(
			query.canonical(),
			"$format=JSON&$select=MetarText,Temperature&$top=1",
		);
	}

	#[test]
	fn param_replaces_previous_values() {
		let query = ODataQuery::new().filter("a eq 'b'").filter("c eq 'd'");

		assert_eq!(query.canonical(), "$filter=c eq 'd'&$format=JSON");
	}
}
