#![cfg(feature = "reqwest")]

// std
use std::sync::Arc;
// crates.io
use httpmock::prelude::*;
// self
use bearer_relay::{
	auth::CredentialPair,
	error::{Error, Result, TransientError},
	relay::{Relay, ReqwestRelay},
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

async fn seed(store: &MemoryStore, access: &str, refresh: &str) {
	store
		.set(CREDENTIAL_KEY, CredentialPair::new(access, refresh))
		.await
		.expect("Seeding the in-memory store should succeed.");
}

#[tokio::test]
async fn refresh_signal_without_credentials_is_a_noop() {
	let server = MockServer::start_async().await;
	let (relay, _store) = build_relay(&server);
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/refresh");
			then.status(200);
		})
		.await;

	relay.handle_refresh_signal().await.expect("A signal without a session should be a no-op.");

	refresh.assert_calls_async(0).await;

	assert_eq!(relay.refresh_metrics.attempts(), 0);
}

#[tokio::test]
async fn refresh_signal_rotates_the_stored_pair() {
	let server = MockServer::start_async().await;
	let (relay, store) = build_relay(&server);

	seed(&store, "a1", "r1").await;

	let refresh = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/refresh")
				.header("content-type", "application/json")
				.body("{\"refresh_token\":\"r1\"}");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"a2\",\"refresh_token\":\"r2\"}");
		})
		.await;

	relay.handle_refresh_signal().await.expect("Session extension should succeed.");

	refresh.assert_async().await;

	let pair = store
		.get(CREDENTIAL_KEY)
		.await
		.expect("Store read should succeed after the signal.")
		.expect("Rotated pair should be persisted.");

	assert_eq!(pair.access_token.expose(), "a2");
	assert_eq!(pair.refresh_token.expose(), "r2");
	assert_eq!(relay.refresh_metrics.attempts(), 1);
	assert_eq!(relay.refresh_metrics.successes(), 1);
}

#[tokio::test]
async fn concurrent_observers_share_a_single_exchange() {
	let server = MockServer::start_async().await;
	let (relay, store) = build_relay(&server);

	seed(&store, "a1", "r1").await;

	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/refresh").body("{\"refresh_token\":\"r1\"}");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"a2\",\"refresh_token\":\"r2\"}");
		})
		.await;
	// Both callers watched "a1" fail; whoever loses the guard race finds the pair already
	// rotated and skips its own exchange.
	let (first, second): (Result<CredentialPair>, Result<CredentialPair>) = tokio::join!(
		relay.refresh_credentials(Some("a1")),
		relay.refresh_credentials(Some("a1")),
	);
	let first = first.expect("First concurrent refresh should succeed.");
	let second = second.expect("Second concurrent refresh should succeed.");

	refresh.assert_calls_async(1).await;

	assert_eq!(first.access_token.expose(), "a2");
	assert_eq!(second.access_token.expose(), "a2");
	assert_eq!(relay.refresh_metrics.attempts(), 2);
	assert_eq!(relay.refresh_metrics.successes(), 2);
}

#[tokio::test]
async fn forced_refresh_without_credentials_is_an_error() {
	let server = MockServer::start_async().await;
	let (relay, _store) = build_relay(&server);
	let err = relay
		.refresh_credentials(None)
		.await
		.expect_err("A forced exchange with no stored pair should fail.");

	assert!(matches!(err, Error::MissingCredentials));
}

#[tokio::test]
async fn incomplete_exchange_response_leaves_the_stale_pair() {
	let server = MockServer::start_async().await;
	let (relay, store) = build_relay(&server);

	seed(&store, "a1", "r1").await;

	server
		.mock_async(|when, then| {
			when.method(POST).path("/refresh");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"a2\"}");
		})
		.await;

	let err = relay
		.refresh_credentials(None)
		.await
		.expect_err("An exchange missing the refresh token should fail.");

	assert!(matches!(
		err,
		Error::Transient(TransientError::IncompleteCredentialPair { status: Some(200) })
	));

	let pair = store
		.get(CREDENTIAL_KEY)
		.await
		.expect("Store read should succeed after the failed exchange.")
		.expect("Stale pair should remain after the failed exchange.");

	assert_eq!(pair.access_token.expose(), "a1");
	assert_eq!(relay.refresh_metrics.failures(), 1);
}
