//! Cache contracts and the built-in in-memory implementation for upstream payloads.

pub mod memory;

pub use memory::MemoryCache;

// self
use crate::_prelude::*;

/// Resource families served by the upstream provider.
///
/// The kind partitions the cache, selects the per-kind TTL, and labels observability output. No
/// kind-specific behavior lives anywhere in the cache itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
	/// Live flight arrival/departure boards.
	Flights,
	/// Scheduled (timetable) flights.
	Schedule,
	/// METAR-derived airport weather.
	Weather,
	/// Airline directory entries.
	Airlines,
	/// Airline route segments.
	AirlineRoutes,
}
impl ResourceKind {
	/// Every kind, in declaration order.
	pub const ALL: [Self; 5] =
		[Self::Flights, Self::Schedule, Self::Weather, Self::Airlines, Self::AirlineRoutes];

	/// Stable lowercase label for cache keys, logs, and metrics.
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Flights => "flights",
			Self::Schedule => "schedule",
			Self::Weather => "weather",
			Self::Airlines => "airlines",
			Self::AirlineRoutes => "airline_routes",
		}
	}
}
impl Display for ResourceKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Opaque cached payload; exactly the bytes the upstream returned.
///
/// Cloning is cheap (shared allocation). The cache and façade never inspect the contents;
/// decoding belongs to the caller that knows the expected shape.
#[derive(Clone, PartialEq, Eq)]
pub struct Payload(Arc<[u8]>);
impl Payload {
	/// Raw payload bytes.
	pub fn as_bytes(&self) -> &[u8] {
		&self.0
	}

	/// Payload size in bytes.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Whether the payload is empty.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Decodes the payload as JSON, reporting the offending path on failure.
	pub fn decode<T>(&self) -> Result<T, serde_path_to_error::Error<serde_json::error::Error>>
	where
		T: DeserializeOwned,
	{
		let mut deserializer = serde_json::Deserializer::from_slice(&self.0);

		serde_path_to_error::deserialize(&mut deserializer)
	}
}
impl Debug for Payload {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "Payload({} bytes)", self.0.len())
	}
}
impl From<Vec<u8>> for Payload {
	fn from(bytes: Vec<u8>) -> Self {
		Self(bytes.into())
	}
}
impl From<&[u8]> for Payload {
	fn from(bytes: &[u8]) -> Self {
		Self(bytes.into())
	}
}

/// Unique key identifying a cached payload.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
	/// Resource family component.
	pub kind: ResourceKind,
	/// Caller-chosen identifier within the family.
	pub key: String,
}
impl CacheKey {
	/// Builds a key from a kind and identifier.
	pub fn new(kind: ResourceKind, key: impl Into<String>) -> Self {
		Self { kind, key: key.into() }
	}
}

/// A stored payload plus the instant it was stored.
#[derive(Clone, Debug)]
pub struct CacheEntry {
	/// The cached payload.
	pub payload: Payload,
	/// Instant the payload was stored.
	pub stored_at: OffsetDateTime,
}
impl CacheEntry {
	/// Stamps a payload with the current time.
	pub fn new(payload: Payload) -> Self {
		Self::stored_at(payload, OffsetDateTime::now_utc())
	}

	/// Stamps a payload with an explicit instant.
	pub fn stored_at(payload: Payload, instant: OffsetDateTime) -> Self {
		Self { payload, stored_at: instant }
	}

	/// Whether the entry is still fresh at `instant` under the supplied TTL.
	///
	/// An entry is stale only once its age strictly exceeds the TTL.
	pub fn is_fresh_at(&self, instant: OffsetDateTime, ttl: Duration) -> bool {
		instant - self.stored_at <= ttl
	}
}

/// Per-kind cache lifetimes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TtlSettings {
	/// Lifetime applied to kinds without an override, in seconds.
	#[serde(rename = "default")]
	pub default_secs: u64,
	/// Per-kind lifetime overrides, in seconds.
	pub overrides: HashMap<ResourceKind, u64>,
}
impl TtlSettings {
	/// Replaces the default lifetime.
	pub fn with_default_secs(mut self, secs: u64) -> Self {
		self.default_secs = secs;

		self
	}

	/// Adds a per-kind lifetime override.
	pub fn with_override(mut self, kind: ResourceKind, secs: u64) -> Self {
		self.overrides.insert(kind, secs);

		self
	}

	/// Lifetime for the provided kind.
	pub fn ttl_for(&self, kind: ResourceKind) -> Duration {
		let secs = self.overrides.get(&kind).copied().unwrap_or(self.default_secs);

		Duration::seconds(secs.min(i64::MAX as u64) as i64)
	}
}
impl Default for TtlSettings {
	fn default() -> Self {
		Self { default_secs: 30, overrides: HashMap::new() }
	}
}

/// Cache contract implemented by payload stores.
///
/// All operations are synchronous and infallible: a cache lookup is never a suspension point.
/// A [`get`](Self::get) miss covers both "absent" and "present but expired"; expired entries
/// are treated as absent rather than evicted on a timer.
pub trait ResourceCache
where
	Self: Send + Sync,
{
	/// Fetches the payload stored under `key`, if present and fresh.
	fn get(&self, key: &CacheKey) -> Option<Payload>;

	/// Unconditionally overwrites and re-timestamps the entry under `key`.
	fn set(&self, key: CacheKey, payload: Payload);

	/// Removes one entry of a kind, or every entry of the kind when `key` is `None`.
	fn clear(&self, kind: ResourceKind, key: Option<&str>);

	/// Removes every entry of every kind.
	fn clear_all(&self);
}
