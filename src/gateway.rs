//! The upstream-access façade tying cache, token, and executor together.
//!
//! [`Gateway::get`] is the one path every domain fetch takes: consult the
//! cache, and on a miss derive fresh auth headers, run the caller-supplied
//! fetch through the rate-limited executor, store the raw payload, and hand
//! it back. A per-key singleflight guard ensures N concurrent callers for the
//! same cold key trigger one upstream call, not N. The gateway never
//! interprets payload bytes; shaping belongs to the fetchers built on top.

// self
use crate::{
	_prelude::*,
	auth::{AuthHeaders, Credentials, TokenManager},
	cache::{CacheKey, MemoryCache, Payload, ResourceCache, ResourceKind},
	config::GatewayConfig,
	executor::{ExecuteOptions, RequestExecutor},
	http::{UpstreamResponse, UpstreamTransport},
	obs::{self, CacheEvent, FetchOutcome, FetchSpan},
	provider::ProviderProfile,
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;

/// Gateway specialized for the crate's default reqwest transport.
#[cfg(feature = "reqwest")]
pub type ReqwestGateway = Gateway<ReqwestTransport>;

/// Per-call options accepted by [`Gateway::get_with`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FetchOptions {
	/// Skips the cache lookup and always fetches upstream.
	pub force: bool,
	/// Overrides the configured attempt budget for this call.
	pub max_retries: Option<u32>,
	/// Aborts rate-window and backoff waits once this much time has passed.
	pub timeout: Option<Duration>,
}
impl FetchOptions {
	/// Creates options that inherit every gateway default.
	pub fn new() -> Self {
		Self::default()
	}

	/// Forces the gateway to bypass the cache lookup.
	pub fn force_refresh(mut self) -> Self {
		self.force = true;

		self
	}

	/// Overrides the attempt budget for this call.
	pub fn with_max_retries(mut self, max_retries: u32) -> Self {
		self.max_retries = Some(max_retries);

		self
	}

	/// Attaches a per-call timeout.
	pub fn with_timeout(mut self, timeout: Duration) -> Self {
		self.timeout = Some(timeout);

		self
	}

	fn execute_options(&self) -> ExecuteOptions {
		ExecuteOptions { max_retries: self.max_retries, timeout: self.timeout }
	}
}

/// Coordinates the cache, token manager, and request executor for one
/// provider profile.
///
/// The gateway owns the transport, cache, and token state so fetchers can
/// focus on URLs and payload shaping. Construct one gateway at process start
/// and share it; clones reuse the same cache, token, and rate window.
#[derive(Clone)]
pub struct Gateway<C>
where
	C: ?Sized + UpstreamTransport,
{
	transport: Arc<C>,
	cache: Arc<dyn ResourceCache>,
	token: TokenManager<C>,
	executor: RequestExecutor,
	profile: ProviderProfile,
	fetch_guards: Arc<Mutex<HashMap<CacheKey, Arc<AsyncMutex<()>>>>>,
}
impl<C> Gateway<C>
where
	C: ?Sized + UpstreamTransport,
{
	/// Creates a gateway that reuses the caller-provided transport.
	pub fn with_transport(
		transport: impl Into<Arc<C>>,
		profile: ProviderProfile,
		credentials: Credentials,
		config: GatewayConfig,
	) -> Result<Self> {
		config.validate()?;

		let transport = transport.into();
		let token = TokenManager::new(
			transport.clone(),
			profile.clone(),
			credentials,
			config.refresh_buffer(),
		);
		let executor = RequestExecutor::new(
			config.rate_limit.count,
			config.interval(),
			config.backoff(),
			config.max_retries,
		);
		let cache: Arc<dyn ResourceCache> = Arc::new(MemoryCache::new(config.ttl_seconds));

		Ok(Self { transport, cache, token, executor, profile, fetch_guards: Default::default() })
	}

	/// Replaces the default in-memory cache with a caller-provided store.
	pub fn with_cache(mut self, cache: Arc<dyn ResourceCache>) -> Self {
		self.cache = cache;

		self
	}

	/// Returns the shared transport handle.
	pub fn transport(&self) -> &Arc<C> {
		&self.transport
	}

	/// Returns the token manager backing this gateway.
	pub fn token(&self) -> &TokenManager<C> {
		&self.token
	}

	/// Returns the executor enforcing the shared rate window.
	pub fn executor(&self) -> &RequestExecutor {
		&self.executor
	}

	/// Returns the provider profile this gateway talks to.
	pub fn profile(&self) -> &ProviderProfile {
		&self.profile
	}

	/// Fetches a resource through the cache/token/executor pipeline.
	///
	/// `fetch` receives freshly derived auth headers for every attempt, so
	/// retries that outlive a token never replay a stale header.
	pub async fn get<F, Fut>(
		&self,
		kind: ResourceKind,
		key: impl Into<String>,
		fetch: F,
	) -> Result<Payload>
	where
		F: Fn(AuthHeaders) -> Fut,
		Fut: Future<Output = Result<UpstreamResponse>>,
	{
		self.get_with(kind, key, fetch, FetchOptions::new()).await
	}

	/// [`get`](Self::get) with explicit per-call options.
	pub async fn get_with<F, Fut>(
		&self,
		kind: ResourceKind,
		key: impl Into<String>,
		fetch: F,
		options: FetchOptions,
	) -> Result<Payload>
	where
		F: Fn(AuthHeaders) -> Fut,
		Fut: Future<Output = Result<UpstreamResponse>>,
	{
		let key = CacheKey::new(kind, key);
		let span = FetchSpan::new(kind, "get");

		obs::record_fetch_outcome(kind, FetchOutcome::Attempt);

		let result = span.instrument(self.get_uncached(key, fetch, options)).await;

		match &result {
			Ok(_) => obs::record_fetch_outcome(kind, FetchOutcome::Success),
			Err(_) => obs::record_fetch_outcome(kind, FetchOutcome::Failure),
		}

		result
	}

	/// Removes one cached entry, or every entry of a kind when `key` is `None`.
	pub fn clear(&self, kind: ResourceKind, key: Option<&str>) {
		self.cache.clear(kind, key);
	}

	/// Removes every cached entry.
	pub fn clear_all(&self) {
		self.cache.clear_all();
	}

	async fn get_uncached<F, Fut>(
		&self,
		key: CacheKey,
		fetch: F,
		options: FetchOptions,
	) -> Result<Payload>
	where
		F: Fn(AuthHeaders) -> Fut,
		Fut: Future<Output = Result<UpstreamResponse>>,
	{
		if options.force {
			obs::record_cache_event(key.kind, CacheEvent::Bypass);
		} else if let Some(payload) = self.cache.get(&key) {
			obs::record_cache_event(key.kind, CacheEvent::Hit);

			return Ok(payload);
		}

		let guard = self.fetch_guard(&key);
		let _singleflight = guard.lock().await;

		// A concurrent caller may have filled the entry while this one waited
		// on the guard.
		if !options.force {
			if let Some(payload) = self.cache.get(&key) {
				obs::record_cache_event(key.kind, CacheEvent::Hit);

				return Ok(payload);
			}

			obs::record_cache_event(key.kind, CacheEvent::Miss);
		}

		// Copied references keep the closure `Fn`; each attempt builds a future
		// that borrows the surrounding frame rather than the closure itself.
		let token = &self.token;
		let fetch = &fetch;
		let response = self
			.executor
			.execute(
				move || async move {
					let headers = token.auth_headers().await?;

					fetch(headers).await
				},
				options.execute_options(),
			)
			.await?;
		let payload = response.body;

		self.cache.set(key, payload.clone());

		Ok(payload)
	}

	/// Returns (and creates on demand) the singleflight guard for a cache key.
	fn fetch_guard(&self, key: &CacheKey) -> Arc<AsyncMutex<()>> {
		let mut guards = self.fetch_guards.lock();

		guards.entry(key.clone()).or_insert_with(|| Arc::new(AsyncMutex::new(()))).clone()
	}
}
#[cfg(feature = "reqwest")]
impl Gateway<ReqwestTransport> {
	/// Creates a gateway with a default reqwest transport.
	pub fn new(
		profile: ProviderProfile,
		credentials: Credentials,
		config: GatewayConfig,
	) -> Result<Self> {
		Self::with_transport(ReqwestTransport::default(), profile, credentials, config)
	}

	/// Creates a gateway for the production TDX endpoints.
	pub fn tdx(credentials: Credentials, config: GatewayConfig) -> Result<Self> {
		Self::new(ProviderProfile::tdx()?, credentials, config)
	}
}
impl<C> Debug for Gateway<C>
where
	C: ?Sized + UpstreamTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Gateway")
			.field("profile", &self.profile)
			.field("executor", &self.executor)
			.finish()
	}
}
