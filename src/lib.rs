//! Resilient access layer for the TDX transportation open-data platform - client-credentials
//! token lifecycle, TTL response cache, and a shared-budget rate-limited request executor in
//! one crate.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]
// Test builds link dev-dependencies the library itself never names.
#![cfg_attr(test, allow(unused_crate_dependencies))]

pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod executor;
pub mod fetch;
pub mod gateway;
pub mod http;
pub mod obs;
pub mod provider;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		auth::Credentials,
		config::GatewayConfig,
		gateway::{Gateway, ReqwestGateway},
		http::ReqwestTransport,
		provider::ProviderProfile,
	};

	/// Client id baked into gateways built by [`build_reqwest_test_gateway`].
	pub const TEST_CLIENT_ID: &str = "test-client";
	/// Client secret baked into gateways built by [`build_reqwest_test_gateway`].
	pub const TEST_CLIENT_SECRET: &str = "test-secret";

	/// Builds a reqwest transport that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	pub fn test_reqwest_transport() -> ReqwestTransport {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestTransport::with_client(client)
	}

	/// Builds a provider profile whose token endpoint is `{base_url}/token` and whose API
	/// base is `{base_url}/api`, for pointing a gateway at a mock server.
	pub fn test_profile(base_url: &str) -> ProviderProfile {
		ProviderProfile::from_urls(&format!("{base_url}/token"), &format!("{base_url}/api"))
			.expect("Failed to build test provider profile.")
	}

	/// Constructs a [`Gateway`] wired to a mock server through the insecure test transport.
	pub fn build_reqwest_test_gateway(base_url: &str, config: GatewayConfig) -> ReqwestGateway {
		Gateway::with_transport(
			test_reqwest_transport(),
			test_profile(base_url),
			Credentials::new(TEST_CLIENT_ID, TEST_CLIENT_SECRET),
			config,
		)
		.expect("Failed to build test gateway.")
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize, de::DeserializeOwned};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
