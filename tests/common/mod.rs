//! Shared fixtures for integration tests.

#![allow(dead_code)]

// std
use std::sync::Arc;
// crates.io
use clap::Parser;
use httpmock::prelude::*;
use time::OffsetDateTime;
// self
use esign_broker::{
	auth::{IntegrationKey, ProviderId, SessionId, UserId},
	config::Config,
	flows::{Broker, ReqwestBroker},
	http::ReqwestHttpClient,
	oauth::{ReqwestTransportErrorMapper, ServiceAccount, SigningKey},
	provider::{DefaultProviderStrategy, ProviderDescriptor, ProviderStrategy},
	reqwest::{Client as ReqwestClient, redirect::Policy},
	server::{self, AppState},
	store::{MemoryStore, SessionStore},
	url::Url,
};

pub const PRIVATE_KEY_PATH: &str =
	concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/service_rsa.pem");
pub const STATIC_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/public");
pub const ACCOUNT_ID: &str = "acc-1";
pub const TEMPLATE_ID: &str = "tpl-1";
pub const SIGNING_BASE: &str = "https://demo.example.net/Signing/";

pub fn token_body(token: &str, expires_in: i64) -> String {
	format!(
		"{{\"access_token\":\"{token}\",\"token_type\":\"Bearer\",\"expires_in\":{expires_in}}}"
	)
}

pub fn account_path(rest: &str) -> String {
	format!("/restapi/v2.1/accounts/{ACCOUNT_ID}{rest}")
}

pub fn descriptor(server: &MockServer) -> ProviderDescriptor {
	let provider_id = ProviderId::new("mock-esign").expect("Provider identifier should be valid.");

	ProviderDescriptor::builder(provider_id)
		.oauth_base(&Url::parse(&server.base_url()).expect("Mock base URL should parse."))
		.expect("Token endpoint should derive from the mock base URL.")
		.api_base(Url::parse(&server.url("/restapi")).expect("Mock API base should parse."))
		.build()
		.expect("Provider descriptor should build for the mock server.")
}

pub fn service_account() -> ServiceAccount {
	ServiceAccount::new(
		IntegrationKey::new("ik-test").expect("Integration key fixture should be valid."),
		UserId::new("user-test").expect("User fixture should be valid."),
		SigningKey::from_file(PRIVATE_KEY_PATH).expect("Private key fixture should load."),
	)
}

/// Builds a reqwest client that accepts the self-signed certificates served by `httpmock`.
pub fn test_reqwest_client() -> ReqwestClient {
	ReqwestClient::builder()
		.danger_accept_invalid_certs(true)
		.danger_accept_invalid_hostnames(true)
		.redirect(Policy::none())
		.build()
		.expect("Failed to build insecure Reqwest client for tests.")
}

/// Builds a broker backed by an in-memory store and the default strategy.
pub fn build_test_broker(descriptor: ProviderDescriptor) -> (ReqwestBroker, Arc<MemoryStore>) {
	let store_backend = Arc::new(MemoryStore::default());
	let store: Arc<dyn SessionStore> = store_backend.clone();
	let strategy: Arc<dyn ProviderStrategy> = Arc::new(DefaultProviderStrategy);
	let broker = Broker::with_http_client(
		store,
		descriptor,
		strategy,
		service_account(),
		ReqwestHttpClient::with_client(test_reqwest_client()),
		Arc::new(ReqwestTransportErrorMapper),
	);

	(broker, store_backend)
}

pub fn test_config(server: &MockServer) -> Config {
	let base_path = server.url("/restapi");
	let oauth_base = server.base_url();

	Config::try_parse_from([
		"esign-broker",
		"--base-path",
		base_path.as_str(),
		"--oauth-base-path",
		oauth_base.as_str(),
		"--account-id",
		ACCOUNT_ID,
		"--template-id",
		TEMPLATE_ID,
		"--integration-key",
		"ik-test",
		"--user-id",
		"user-test",
		"--private-key-path",
		PRIVATE_KEY_PATH,
		"--static-dir",
		STATIC_DIR,
		"--signing-base-url",
		SIGNING_BASE,
		"--return-url",
		"http://localhost:4000/success",
		"--host",
		"127.0.0.1",
		"--port",
		"0",
	])
	.expect("Test configuration should parse.")
}

/// Serves the application on an ephemeral port and returns its base URL.
pub async fn spawn_app(config: &Config) -> (String, AppState) {
	let state = AppState::with_http_client(config, test_reqwest_client())
		.expect("Application state should build.");
	let listener =
		tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("Ephemeral port should bind.");
	let addr = listener.local_addr().expect("Listener should expose its address.");
	let app = server::router(state.clone());

	tokio::spawn(async move { axum::serve(listener, app).await });

	(format!("http://{addr}"), state)
}

/// Browser stand-in that never follows redirects.
pub fn browser() -> ReqwestClient {
	test_reqwest_client()
}

/// Opens a session slot so the broker will serve tokens for it.
pub async fn open_session(store: &MemoryStore, id: &str) -> SessionId {
	let session = SessionId::new(id).expect("Session fixture should be valid.");

	store.open(&session, OffsetDateTime::now_utc()).await.expect("Opening a session should succeed.");

	session
}
