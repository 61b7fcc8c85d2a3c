//! Issued bearer token state and the request headers derived from it.

// self
use crate::{_prelude::*, auth::secret::TokenSecret};

/// Bearer token issued by the token endpoint together with its validity window.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken {
	/// Access token secret; callers must avoid logging it.
	pub secret: TokenSecret,
	/// Instant the exchange completed.
	pub issued_at: OffsetDateTime,
	/// Expiry instant derived from issued_at plus the provider's expires_in.
	pub expires_at: OffsetDateTime,
}
impl BearerToken {
	/// Creates a token issued at an explicit instant that expires after `expires_in`.
	pub fn issued_at(secret: TokenSecret, issued_at: OffsetDateTime, expires_in: Duration) -> Self {
		Self { secret, issued_at, expires_at: issued_at + expires_in }
	}

	/// Creates a token issued at the current UTC instant.
	pub fn issued_now(secret: TokenSecret, expires_in: Duration) -> Self {
		Self::issued_at(secret, OffsetDateTime::now_utc(), expires_in)
	}

	/// Returns whether the token is still usable at `instant`.
	///
	/// A token stops counting as usable `buffer` ahead of its expiry so requests
	/// dispatched near the boundary never carry a token the provider is about to
	/// reject.
	pub fn is_usable_at(&self, instant: OffsetDateTime, buffer: Duration) -> bool {
		instant < self.expires_at - buffer
	}

	/// Convenience helper that checks usability against the current UTC instant.
	pub fn is_usable(&self, buffer: Duration) -> bool {
		self.is_usable_at(OffsetDateTime::now_utc(), buffer)
	}

	/// Builds the upstream request headers carrying this token.
	pub fn auth_headers(&self) -> AuthHeaders {
		AuthHeaders::bearer(&self.secret)
	}
}
impl Debug for BearerToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("BearerToken")
			.field("secret", &self.secret)
			.field("issued_at", &self.issued_at)
			.field("expires_at", &self.expires_at)
			.finish()
	}
}

/// Headers attached to every authenticated upstream request.
///
/// The value is derived from a [`BearerToken`] immediately before each attempt
/// so retries that outlive a token never reuse a stale header.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthHeaders {
	authorization: String,
}
impl AuthHeaders {
	/// Builds a `Bearer` authorization header from the provided secret.
	pub fn bearer(secret: &TokenSecret) -> Self {
		Self { authorization: format!("Bearer {}", secret.expose()) }
	}

	/// Returns the `Authorization` header value.
	pub fn authorization_value(&self) -> &str {
		&self.authorization
	}
}
impl Debug for AuthHeaders {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthHeaders").field("authorization", &"<redacted>").finish()
	}
}
