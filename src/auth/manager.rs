//! Client-credentials token manager with single-flight refresh.
//!
//! The manager owns the one bearer token the gateway attaches to every
//! upstream call. Callers ask for [`AuthHeaders`] immediately before each
//! attempt; the manager reuses the cached token while it stays outside the
//! refresh buffer and otherwise performs a single `client_credentials`
//! exchange that concurrent callers piggy-back on instead of stampeding the
//! token endpoint. Exchange failures surface as [`AuthError`] and are never
//! retried here.

// std
use std::sync::atomic::{AtomicU64, Ordering};
// self
use crate::{
	_prelude::*,
	auth::{
		secret::{Credentials, TokenSecret},
		token::{AuthHeaders, BearerToken},
	},
	error::AuthError,
	http::UpstreamTransport,
	obs::{self, TokenRefreshOutcome},
	provider::{ClientAuthMethod, ProviderProfile},
};

/// Longest `expires_in` the manager accepts from the provider, in seconds.
const MAX_EXPIRES_IN_SECS: i64 = 366 * 86_400;
/// Longest error body excerpt attached to exchange failures, in characters.
const BODY_PREVIEW_LIMIT: usize = 256;

/// Wire shape of a successful `client_credentials` grant response.
#[derive(Deserialize)]
struct TokenGrant {
	access_token: String,
	expires_in: i64,
}

/// Manages the gateway's single bearer token for one provider profile.
#[derive(Clone)]
pub struct TokenManager<C>
where
	C: ?Sized + UpstreamTransport,
{
	transport: Arc<C>,
	profile: ProviderProfile,
	credentials: Credentials,
	refresh_buffer: Duration,
	current: Arc<RwLock<Option<BearerToken>>>,
	refresh_guard: Arc<AsyncMutex<()>>,
	metrics: Arc<RefreshMetrics>,
}
impl<C> TokenManager<C>
where
	C: ?Sized + UpstreamTransport,
{
	/// Creates a manager that exchanges credentials through the provided transport.
	pub fn new(
		transport: impl Into<Arc<C>>,
		profile: ProviderProfile,
		credentials: Credentials,
		refresh_buffer: Duration,
	) -> Self {
		Self {
			transport: transport.into(),
			profile,
			credentials,
			refresh_buffer,
			current: Default::default(),
			refresh_guard: Default::default(),
			metrics: Default::default(),
		}
	}

	/// Returns headers backed by a token valid beyond the refresh buffer.
	///
	/// Reuses the cached token when possible and otherwise exchanges
	/// credentials exactly once, no matter how many callers arrive while the
	/// exchange is in flight.
	pub async fn auth_headers(&self) -> Result<AuthHeaders, AuthError> {
		if let Some(headers) = self.reusable_headers_at(OffsetDateTime::now_utc()) {
			self.metrics.record_reuse();

			obs::record_token_refresh(TokenRefreshOutcome::Reused);

			return Ok(headers);
		}

		let _singleflight = self.refresh_guard.lock().await;

		// Another caller may have finished an exchange while this one waited
		// on the guard.
		if let Some(headers) = self.reusable_headers_at(OffsetDateTime::now_utc()) {
			self.metrics.record_reuse();

			obs::record_token_refresh(TokenRefreshOutcome::Reused);

			return Ok(headers);
		}

		match self.exchange().await {
			Ok(token) => {
				let headers = token.auth_headers();

				*self.current.write() = Some(token);

				self.metrics.record_exchange();

				obs::record_token_refresh(TokenRefreshOutcome::Exchanged);

				Ok(headers)
			},
			Err(err) => {
				self.metrics.record_failure();

				obs::record_token_refresh(TokenRefreshOutcome::Failed);

				Err(err)
			},
		}
	}

	/// Discards the cached token so the next caller performs a fresh exchange.
	pub fn invalidate(&self) {
		*self.current.write() = None;
	}

	/// Returns a snapshot of the cached token, if one is held.
	pub fn current_token(&self) -> Option<BearerToken> {
		self.current.read().clone()
	}

	/// Returns the shared refresh counters.
	pub fn metrics(&self) -> &RefreshMetrics {
		&self.metrics
	}

	fn reusable_headers_at(&self, instant: OffsetDateTime) -> Option<AuthHeaders> {
		self.current
			.read()
			.as_ref()
			.filter(|token| token.is_usable_at(instant, self.refresh_buffer))
			.map(BearerToken::auth_headers)
	}

	/// Performs one `client_credentials` exchange against the token endpoint.
	///
	/// The exchange bypasses the gateway's rate window and retry machinery on
	/// purpose: throttling the credential that unblocks every other request
	/// would deadlock recovery.
	async fn exchange(&self) -> Result<BearerToken, AuthError> {
		let mut form = BTreeMap::new();

		form.insert("grant_type".into(), "client_credentials".into());

		let authorization = match self.profile.client_auth_method {
			ClientAuthMethod::ClientSecretPost => {
				form.insert("client_id".into(), self.credentials.client_id.clone());
				form.insert(
					"client_secret".into(),
					self.credentials.client_secret.expose().into(),
				);

				None
			},
			ClientAuthMethod::ClientSecretBasic =>
				Some(self.credentials.basic_authorization()),
		};
		let response = self
			.transport
			.post_form(self.profile.token_endpoint.clone(), form, authorization)
			.await
			.map_err(|source| AuthError::Transport { source })?;
		let issued_at = OffsetDateTime::now_utc();

		if !response.is_success() {
			return Err(AuthError::ExchangeStatus {
				status: response.status,
				body: body_preview(response.body.as_bytes()),
			});
		}

		let grant = response
			.body
			.decode::<TokenGrant>()
			.map_err(|source| AuthError::ExchangeParse { source, status: response.status })?;

		if grant.expires_in <= 0 {
			return Err(AuthError::NonPositiveExpiresIn { expires_in: grant.expires_in });
		}
		if grant.expires_in > MAX_EXPIRES_IN_SECS {
			return Err(AuthError::ExpiresInOutOfRange { expires_in: grant.expires_in });
		}

		Ok(BearerToken::issued_at(
			TokenSecret::new(grant.access_token),
			issued_at,
			Duration::seconds(grant.expires_in),
		))
	}
}
impl<C> Debug for TokenManager<C>
where
	C: ?Sized + UpstreamTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenManager")
			.field("profile", &self.profile)
			.field("credentials", &self.credentials)
			.field("refresh_buffer", &self.refresh_buffer)
			.field("token_cached", &self.current.read().is_some())
			.finish()
	}
}

/// Thread-safe counters describing how header requests were satisfied.
#[derive(Debug, Default)]
pub struct RefreshMetrics {
	reuses: AtomicU64,
	exchanges: AtomicU64,
	failures: AtomicU64,
}
impl RefreshMetrics {
	/// Returns how many header requests reused a cached token.
	pub fn reuses(&self) -> u64 {
		self.reuses.load(Ordering::Relaxed)
	}

	/// Returns how many exchanges completed against the token endpoint.
	pub fn exchanges(&self) -> u64 {
		self.exchanges.load(Ordering::Relaxed)
	}

	/// Returns how many exchanges failed.
	pub fn failures(&self) -> u64 {
		self.failures.load(Ordering::Relaxed)
	}

	fn record_reuse(&self) {
		self.reuses.fetch_add(1, Ordering::Relaxed);
	}

	fn record_exchange(&self) {
		self.exchanges.fetch_add(1, Ordering::Relaxed);
	}

	fn record_failure(&self) {
		self.failures.fetch_add(1, Ordering::Relaxed);
	}
}

fn body_preview(bytes: &[u8]) -> Option<String> {
	if bytes.is_empty() {
		return None;
	}

	let text = String::from_utf8_lossy(bytes);
	let preview = text.chars().take(BODY_PREVIEW_LIMIT).collect::<String>();

	Some(preview)
}
