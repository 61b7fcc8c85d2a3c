//! Provider profile data structures and endpoint helpers shared by all fetchers.
//!
//! The module exposes the validated endpoint set of the upstream open-data platform, the
//! strongly typed resource identifiers, and the OData-style query model used when calling
//! resource endpoints.

/// Strongly typed airport/airline identifiers.
pub mod code;
/// OData-style query options and fingerprints.
pub mod query;

pub use code::{AirlineCode, AirportCode, CodeError};
pub use query::ODataQuery;

// self
use crate::{_prelude::*, error::ConfigError};

/// Token endpoint of the production TDX platform.
pub const TDX_TOKEN_ENDPOINT: &str =
	"https://tdx.transportdata.tw/auth/realms/TDXConnect/protocol/openid-connect/token";
/// API base of the production TDX platform (basic tier, v2).
pub const TDX_API_BASE: &str = "https://tdx.transportdata.tw/api/basic/v2";

/// Client authentication modes for token endpoint calls.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientAuthMethod {
	/// Form POST body parameters for `client_id`/`client_secret`.
	#[default]
	ClientSecretPost,
	/// HTTP Basic with `client_id`/`client_secret`.
	ClientSecretBasic,
}

/// Immutable description of the upstream provider consumed by the gateway.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderProfile {
	/// Token endpoint used for client-credentials exchanges.
	pub token_endpoint: Url,
	/// Base URL that resource paths extend.
	pub api_base: Url,
	/// Client authentication mechanism for the token endpoint.
	pub client_auth_method: ClientAuthMethod,
}
impl ProviderProfile {
	/// Builds a profile after validating both endpoints.
	pub fn new(token_endpoint: Url, api_base: Url) -> Result<Self, ConfigError> {
		let profile = Self { token_endpoint, api_base, client_auth_method: Default::default() };

		profile.validate()?;

		Ok(profile)
	}

	/// Builds a profile from string URLs, e.g. straight out of a configuration file.
	pub fn from_urls(token_endpoint: &str, api_base: &str) -> Result<Self, ConfigError> {
		let parse =
			|url: &str| Url::parse(url).map_err(|source| ConfigError::InvalidEndpoint { source });

		Self::new(parse(token_endpoint)?, parse(api_base)?)
	}

	/// Profile of the production TDX platform.
	pub fn tdx() -> Result<Self, ConfigError> {
		Self::from_urls(TDX_TOKEN_ENDPOINT, TDX_API_BASE)
	}

	/// Overrides the client authentication method.
	pub fn with_client_auth_method(mut self, method: ClientAuthMethod) -> Self {
		self.client_auth_method = method;

		self
	}

	/// Flight board (FIDS) endpoint for one airport.
	pub fn flights_url(&self, airport: &AirportCode) -> Result<Url, ConfigError> {
		self.resource_url(&["Air", "FIDS", "Airport", airport.as_ref()])
	}

	/// Scheduled-flights endpoint for one airport.
	pub fn schedule_url(&self, airport: &AirportCode) -> Result<Url, ConfigError> {
		self.resource_url(&["Air", "Schedule", "Airport", airport.as_ref()])
	}

	/// METAR endpoint for one airport.
	pub fn metar_url(&self, airport: &AirportCode) -> Result<Url, ConfigError> {
		self.resource_url(&["Air", "METAR", "Airport", airport.as_ref()])
	}

	/// Airline directory endpoint.
	pub fn airlines_url(&self) -> Result<Url, ConfigError> {
		self.resource_url(&["Air", "Airline"])
	}

	/// Route endpoint covering every airline.
	pub fn routes_url(&self) -> Result<Url, ConfigError> {
		self.resource_url(&["Air", "Route"])
	}

	/// Route endpoint for one airline.
	pub fn airline_routes_url(&self, airline: &AirlineCode) -> Result<Url, ConfigError> {
		self.resource_url(&["Air", "Route", "Airline", airline.as_ref()])
	}

	fn resource_url(&self, segments: &[&str]) -> Result<Url, ConfigError> {
		let mut url = self.api_base.clone();

		url.path_segments_mut()
			.map_err(|()| ConfigError::UnsupportedApiBase { url: self.api_base.to_string() })?
			.pop_if_empty()
			.extend(segments);

		Ok(url)
	}

	/// Validates invariants for the profile.
	fn validate(&self) -> Result<(), ConfigError> {
		validate_endpoint("token endpoint", &self.token_endpoint)?;
		validate_endpoint("API base", &self.api_base)?;

		if self.api_base.cannot_be_a_base() {
			return Err(ConfigError::UnsupportedApiBase { url: self.api_base.to_string() });
		}

		Ok(())
	}
}

fn validate_endpoint(name: &'static str, url: &Url) -> Result<(), ConfigError> {
	if url.scheme() != "https" {
		Err(ConfigError::InsecureEndpoint { endpoint: name, url: url.to_string() })
	} else {
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn profile() -> ProviderProfile {
		ProviderProfile::tdx().expect("TDX profile should validate.")
	}

	#[test]
	fn tdx_profile_carries_the_production_endpoints() {
		let profile = profile();

		assert_eq!(profile.token_endpoint.as_str(), TDX_TOKEN_ENDPOINT);
		assert_eq!(profile.api_base.as_str(), TDX_API_BASE);
		assert_eq!(profile.client_auth_method, ClientAuthMethod::ClientSecretPost);
	}

	#[test]
	fn insecure_endpoints_are_rejected() {
		let err = ProviderProfile::from_urls("http://example.com/token", TDX_API_BASE)
			.expect_err("Plain HTTP token endpoint must be rejected.");

		assert!(matches!(err, ConfigError::InsecureEndpoint { endpoint: "token endpoint", .. }));

		let err = ProviderProfile::from_urls(TDX_TOKEN_ENDPOINT, "http://example.com/api")
			.expect_err("Plain HTTP API base must be rejected.");

		assert!(matches!(err, ConfigError::InsecureEndpoint { endpoint: "API base", .. }));
	}

	#[test]
	fn resource_urls_extend_the_api_base() {
		let profile = profile();
		let airport = AirportCode::new("TPE").expect("Airport fixture should be valid.");
		let airline = AirlineCode::new("BR").expect("Airline fixture should be valid.");

		assert_eq!(
			profile.flights_url(&airport).expect("Flights URL should build.").as_str(),
			"https://tdx.transportdata.tw/api/basic/v2/Air/FIDS/Airport/TPE",
		);
		assert_eq!(
			profile.metar_url(&airport).expect("METAR URL should build.").as_str(),
			"https://tdx.transportdata.tw/api/basic/v2/Air/METAR/Airport/TPE",
		);
		assert_eq!(
			profile.airlines_url().expect("Airline URL should build.").as_str(),
			"https://tdx.transportdata.tw/api/basic/v2/Air/Airline",
		);
		assert_eq!(
			profile.airline_routes_url(&airline).expect("Route URL should build.").as_str(),
			"https://tdx.transportdata.tw/api/basic/v2/Air/Route/Airline/BR",
		);
	}

	#[test]
	fn trailing_slash_on_the_api_base_is_harmless() {
		let profile = ProviderProfile::from_urls(TDX_TOKEN_ENDPOINT, "https://example.com/api/v2/")
			.expect("Profile with trailing slash should validate.");
		let airport = AirportCode::new("KHH").expect("Airport fixture should be valid.");

		assert_eq!(
			profile.schedule_url(&airport).expect("Schedule URL should build.").as_str(),
			"https://example.com/api/v2/Air/Schedule/Airport/KHH",
		);
	}

	#[test]
	fn profile_serde_round_trips() {
		let profile = profile();
		let json = serde_json::to_string(&profile).expect("Profile should serialize to JSON.");
		let round_trip: ProviderProfile =
			serde_json::from_str(&json).expect("Serialized profile should deserialize.");

		assert_eq!(round_trip, profile);
	}
}
