#![cfg(feature = "reqwest")]

// std
use std::sync::Arc;
// crates.io
use httpmock::prelude::*;
// self
use bearer_relay::{
	auth::CredentialPair,
	relay::{Relay, ReqwestRelay},
	request::InterceptedRequest,
	route::RoutePolicy,
	store::{CREDENTIAL_KEY, CredentialStore, MemoryStore},
};

fn build_relay(server: &MockServer) -> (ReqwestRelay, Arc<MemoryStore>) {
	let policy = RoutePolicy::for_origin(server.base_url())
		.expect("Route policy should build for the mock server origin.");
	let store = Arc::new(MemoryStore::default());
	let relay = Relay::new(store.clone(), policy);

	(relay, store)
}

async fn seed(store: &MemoryStore) {
	store
		.set(CREDENTIAL_KEY, CredentialPair::new("a1", "r1"))
		.await
		.expect("Seeding the in-memory store should succeed.");
}

#[tokio::test]
async fn logout_sends_the_refresh_token_for_revocation() {
	let server = MockServer::start_async().await;
	let (relay, store) = build_relay(&server);

	seed(&store).await;

	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/logout")
				.header("authorization", "Bearer a1")
				.header("content-type", "application/json")
				.body("{\"refresh_token\":\"r1\"}");
			then.status(200).body("{\"message\":\"Logged out\"}");
		})
		.await;
	let response = relay
		.handle_request(InterceptedRequest::new(http::Method::POST, server.url("/logout")))
		.await
		.expect("Logout should complete.");

	mock.assert_async().await;

	assert_eq!(response.status, 200);
	assert!(
		store
			.get(CREDENTIAL_KEY)
			.await
			.expect("Store read should succeed after logout.")
			.is_none()
	);
}

#[tokio::test]
async fn logout_takes_effect_locally_even_when_the_backend_fails() {
	let server = MockServer::start_async().await;
	let (relay, store) = build_relay(&server);

	seed(&store).await;

	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/logout");
			then.status(500).body("{\"message\":\"revocation failed\"}");
		})
		.await;
	let response = relay
		.handle_request(InterceptedRequest::new(http::Method::POST, server.url("/logout")))
		.await
		.expect("Logout should complete even when revocation fails upstream.");

	mock.assert_async().await;

	// The pair is deleted before the revocation request leaves; upstream failure cannot
	// resurrect the session.
	assert_eq!(response.status, 500);
	assert!(
		store
			.get(CREDENTIAL_KEY)
			.await
			.expect("Store read should succeed after a failed logout.")
			.is_none()
	);
}

#[tokio::test]
async fn logout_401_is_terminal_and_never_refreshes() {
	let server = MockServer::start_async().await;
	let (relay, store) = build_relay(&server);

	seed(&store).await;

	let logout = server
		.mock_async(|when, then| {
			when.method(POST).path("/logout");
			then.status(401).body("{\"message\":\"Unauthorized\"}");
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/refresh");
			then.status(200);
		})
		.await;
	let response = relay
		.handle_request(InterceptedRequest::new(http::Method::POST, server.url("/logout")))
		.await
		.expect("Logout should complete.");

	logout.assert_async().await;
	refresh.assert_calls_async(0).await;

	assert_eq!(response.status, 401);
}
