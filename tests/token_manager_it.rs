// crates.io
use httpmock::prelude::*;
// self
use tdx_gateway::{
	_preludet::*,
	auth::{Credentials, TokenManager},
	error::AuthError,
	http::ReqwestTransport,
};

const GRANT_BODY: &str = r#"{"access_token":"wire-token","token_type":"Bearer","expires_in":3600}"#;

fn build_manager(server: &MockServer, refresh_buffer: Duration) -> TokenManager<ReqwestTransport> {
	TokenManager::new(
		test_reqwest_transport(),
		test_profile(&server.base_url()),
		Credentials::new(TEST_CLIENT_ID, TEST_CLIENT_SECRET),
		refresh_buffer,
	)
}

#[tokio::test]
async fn exchange_happens_once_until_the_buffer() {
	let server = MockServer::start_async().await;
	let manager = build_manager(&server, Duration::minutes(5));
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200).header("content-type", "application/json").body(GRANT_BODY);
		})
		.await;
	let first = manager.auth_headers().await.expect("Initial token exchange should succeed.");
	let second = manager.auth_headers().await.expect("Cached token should be reused.");

	assert_eq!(first.authorization_value(), "Bearer wire-token");
	assert_eq!(first.authorization_value(), second.authorization_value());
	assert_eq!(manager.metrics().exchanges(), 1);
	assert_eq!(manager.metrics().reuses(), 1);

	mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn token_inside_the_buffer_is_not_reused() {
	let server = MockServer::start_async().await;
	let manager = build_manager(&server, Duration::minutes(5));
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"access_token":"short-token","token_type":"Bearer","expires_in":120}"#);
		})
		.await;

	// A 120-second lifetime never clears the five-minute buffer, so each
	// call performs its own exchange.
	manager.auth_headers().await.expect("First exchange should succeed.");
	manager.auth_headers().await.expect("Second exchange should succeed.");

	assert_eq!(manager.metrics().exchanges(), 2);
	assert_eq!(manager.metrics().reuses(), 0);

	mock.assert_calls_async(2).await;
}

#[tokio::test]
async fn concurrent_cold_calls_share_one_exchange() {
	let server = MockServer::start_async().await;
	let manager = build_manager(&server, Duration::minutes(5));
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200).header("content-type", "application/json").body(GRANT_BODY);
		})
		.await;
	let (first, second) = tokio::join!(manager.auth_headers(), manager.auth_headers());

	first.expect("First concurrent call should succeed.");
	second.expect("Second concurrent call should succeed.");

	mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn invalidate_forces_a_fresh_exchange() {
	let server = MockServer::start_async().await;
	let manager = build_manager(&server, Duration::minutes(5));
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200).header("content-type", "application/json").body(GRANT_BODY);
		})
		.await;

	manager.auth_headers().await.expect("Initial exchange should succeed.");
	manager.invalidate();
	manager.auth_headers().await.expect("Exchange after invalidation should succeed.");

	mock.assert_calls_async(2).await;
}

#[tokio::test]
async fn rejected_exchange_reports_status_and_body() {
	let server = MockServer::start_async().await;
	let manager = build_manager(&server, Duration::minutes(5));
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(400)
				.header("content-type", "application/json")
				.body(r#"{"error":"invalid_client"}"#);
		})
		.await;
	let error = manager.auth_headers().await.expect_err("Rejected exchange should fail.");

	match error {
		AuthError::ExchangeStatus { status, body } => {
			assert_eq!(status, 400);
			assert!(body.is_some_and(|body| body.contains("invalid_client")));
		},
		other => panic!("Expected an exchange rejection, got {other:?}."),
	}

	assert_eq!(manager.metrics().failures(), 1);

	// Authentication failures are surfaced to the caller, never retried.
	mock.assert_calls_async(1).await;
}
