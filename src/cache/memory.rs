//! Thread-safe in-memory [`ResourceCache`] implementation.

// self
use crate::{
	_prelude::*,
	cache::{CacheEntry, CacheKey, Payload, ResourceCache, ResourceKind, TtlSettings},
};

type EntryMap = Arc<RwLock<HashMap<CacheKey, CacheEntry>>>;

/// Thread-safe cache that keeps payloads in-process.
///
/// Expired entries stay in the map until overwritten or cleared; they are simply never returned.
#[derive(Clone, Debug, Default)]
pub struct MemoryCache {
	entries: EntryMap,
	ttl: TtlSettings,
}
impl MemoryCache {
	/// Builds a cache using the provided per-kind lifetimes.
	pub fn new(ttl: TtlSettings) -> Self {
		Self { entries: EntryMap::default(), ttl }
	}

	/// Fetches the payload stored under `key` as observed at an explicit instant.
	///
	/// The trait's [`get`](ResourceCache::get) delegates here with the current time; tests pin
	/// the instant instead of sleeping.
	pub fn get_at(&self, key: &CacheKey, instant: OffsetDateTime) -> Option<Payload> {
		let entries = self.entries.read();
		let entry = entries.get(key)?;

		entry.is_fresh_at(instant, self.ttl.ttl_for(key.kind)).then(|| entry.payload.clone())
	}

	/// Number of stored entries, expired ones included.
	pub fn len(&self) -> usize {
		self.entries.read().len()
	}

	/// Whether the cache holds no entries at all.
	pub fn is_empty(&self) -> bool {
		self.entries.read().is_empty()
	}
}
impl ResourceCache for MemoryCache {
	fn get(&self, key: &CacheKey) -> Option<Payload> {
		self.get_at(key, OffsetDateTime::now_utc())
	}

	fn set(&self, key: CacheKey, payload: Payload) {
		self.entries.write().insert(key, CacheEntry::new(payload));
	}

	fn clear(&self, kind: ResourceKind, key: Option<&str>) {
		let mut entries = self.entries.write();

		match key {
			Some(key) => {
				entries.remove(&CacheKey::new(kind, key));
			},
			None => entries.retain(|k, _| k.kind != kind),
		}
	}

	fn clear_all(&self) {
		self.entries.write().clear();
	}
}
