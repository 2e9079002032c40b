mod common;

// crates.io
use httpmock::prelude::*;
use serde_json::Value;
// self
use common::*;
use esign_broker::{
	reqwest::{
		Response, StatusCode,
		header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE},
	},
	server::{SESSION_COOKIE, SessionSweeper},
};
use time::Duration;
use tokio::sync::watch;

async fn mock_token<'a>(server: &'a MockServer, token: &str) -> httpmock::Mock<'a> {
	let body = token_body(token, 3_600);

	server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/token");
			then.status(200).header("content-type", "application/json").body(body);
		})
		.await
}

async fn mock_token_failure(server: &MockServer) -> httpmock::Mock<'_> {
	server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/token");
			then.status(400)
				.header("content-type", "application/json")
				.body("{\"error\":\"consent_required\"}");
		})
		.await
}

async fn mock_template<'a>(server: &'a MockServer, body: &str) -> httpmock::Mock<'a> {
	let body = body.to_owned();

	server
		.mock_async(|when, then| {
			when.method(GET)
				.path(account_path(&format!("/templates/{TEMPLATE_ID}")))
				.header("authorization", "Bearer tok-1");
			then.status(200).header("content-type", "application/json").body(body);
		})
		.await
}

fn session_cookie(response: &Response) -> String {
	let value = response
		.headers()
		.get(SET_COOKIE)
		.expect("Response should set the session cookie.")
		.to_str()
		.expect("Session cookie should be ASCII.");

	assert!(value.contains("HttpOnly"));

	value.split(';').next().expect("Cookie should carry a name-value pair.").to_owned()
}

fn location(response: &Response) -> &str {
	response
		.headers()
		.get(LOCATION)
		.expect("Redirect should carry a Location header.")
		.to_str()
		.expect("Location should be ASCII.")
}

async fn error_message(response: Response) -> String {
	let body = response.json::<Value>().await.expect("Error body should be JSON.");

	body["error"].as_str().expect("Error body should carry a message.").to_owned()
}

#[tokio::test]
async fn index_starts_a_session_and_reuses_its_token() {
	let server = MockServer::start_async().await;
	let token = mock_token(&server, "tok-1").await;
	let (base, state) = spawn_app(&test_config(&server)).await;
	let browser = browser();
	let first = browser.get(format!("{base}/")).send().await.expect("Index request should succeed.");

	assert_eq!(first.status(), StatusCode::OK);

	let cookie = session_cookie(&first);

	assert!(cookie.starts_with(&format!("{SESSION_COOKIE}=")));
	assert!(first.text().await.expect("Index body should be readable.").contains("/send-envelope"));

	let second = browser
		.get(format!("{base}/"))
		.header(COOKIE, &cookie)
		.send()
		.await
		.expect("Second index request should succeed.");

	assert_eq!(second.status(), StatusCode::OK);
	assert!(second.headers().get(SET_COOKIE).is_none());

	token.assert_calls_async(1).await;

	assert_eq!(state.broker.metrics.cache_hits(), 1);
}

#[tokio::test]
async fn send_envelope_redirects_into_the_signing_ceremony() {
	let server = MockServer::start_async().await;
	let token = mock_token(&server, "tok-1").await;
	let envelope = server
		.mock_async(|when, then| {
			when.method(POST)
				.path(account_path("/envelopes"))
				.header("authorization", "Bearer tok-1")
				.header("content-type", "application/json");
			then.status(201)
				.header("content-type", "application/json")
				.body("{\"envelopeId\":\"env-1\",\"status\":\"sent\"}");
		})
		.await;
	let view = server
		.mock_async(|when, then| {
			when.method(POST)
				.path(account_path("/envelopes/env-1/views/recipient"))
				.header("authorization", "Bearer tok-1");
			then.status(201)
				.header("content-type", "application/json")
				.body("{\"url\":\"https://demo.example.net/Signing/StartInSession.aspx?t=abc\"}");
		})
		.await;
	let (base, _) = spawn_app(&test_config(&server)).await;
	let response = browser()
		.post(format!("{base}/send-envelope"))
		.form(&[("name", "Ada Lovelace"), ("email", "ada@example.com"), ("company", "Engines")])
		.send()
		.await
		.expect("Envelope request should succeed.");

	assert_eq!(response.status(), StatusCode::SEE_OTHER);
	assert_eq!(location(&response), "https://demo.example.net/Signing/StartInSession.aspx?t=abc");

	token.assert_calls_async(1).await;
	envelope.assert_calls_async(1).await;
	view.assert_calls_async(1).await;
}

#[tokio::test]
async fn send_envelope_rejects_incomplete_forms() {
	let server = MockServer::start_async().await;
	let token = mock_token(&server, "tok-1").await;
	let (base, _) = spawn_app(&test_config(&server)).await;
	let browser = browser();
	let missing_email = browser
		.post(format!("{base}/send-envelope"))
		.form(&[("name", "Ada"), ("email", ""), ("company", "Engines")])
		.send()
		.await
		.expect("Envelope request should complete.");

	assert_eq!(missing_email.status(), StatusCode::BAD_REQUEST);
	assert!(error_message(missing_email).await.contains("email"));

	let malformed = browser
		.post(format!("{base}/send-envelope"))
		.header(CONTENT_TYPE, "application/x-www-form-urlencoded")
		.body("company=Engines")
		.send()
		.await
		.expect("Envelope request should complete.");

	assert_eq!(malformed.status(), StatusCode::BAD_REQUEST);

	token.assert_calls_async(0).await;
}

#[tokio::test]
async fn send_envelope_reports_token_failures_as_bad_gateway() {
	let server = MockServer::start_async().await;
	let token = mock_token_failure(&server).await;
	let (base, state) = spawn_app(&test_config(&server)).await;
	let response = browser()
		.post(format!("{base}/send-envelope"))
		.form(&[("name", "Ada"), ("email", "ada@example.com"), ("company", "Engines")])
		.send()
		.await
		.expect("Envelope request should complete.");

	assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

	token.assert_calls_async(1).await;

	assert_eq!(state.broker.metrics.failures(), 1);
}

#[tokio::test]
async fn details_redirects_to_the_applicant_signing_url() {
	let server = MockServer::start_async().await;
	let _token = mock_token(&server, "tok-1").await;
	let template = mock_template(
		&server,
		r#"{
			"templateId": "tpl-1",
			"documents": [
				{ "documentId": "2", "order": "2", "uri": "/documents/2" },
				{ "documentId": "1", "order": "1", "uri": "/documents/1" }
			],
			"recipients": {
				"signers": [
					{ "roleName": "Witness", "email": "witness@example.com" },
					{ "roleName": "Applicant", "email": "applicant@example.com" }
				]
			}
		}"#,
	)
	.await;
	let (base, _) = spawn_app(&test_config(&server)).await;
	let response = browser()
		.get(format!("{base}/details"))
		.send()
		.await
		.expect("Details request should succeed.");

	assert_eq!(response.status(), StatusCode::SEE_OTHER);
	assert_eq!(location(&response), format!("{SIGNING_BASE}?ti=applicant@example.com/documents/1"));

	template.assert_calls_async(1).await;
}

#[tokio::test]
async fn details_without_applicant_email_redirects_to_the_document_path() {
	let server = MockServer::start_async().await;
	let _token = mock_token(&server, "tok-1").await;
	let _template = mock_template(
		&server,
		r#"{
			"documents": [{ "order": "1", "uri": "/documents/1" }],
			"recipients": { "signers": [{ "roleName": "Applicant" }] }
		}"#,
	)
	.await;
	let (base, _) = spawn_app(&test_config(&server)).await;
	let response = browser()
		.get(format!("{base}/details"))
		.send()
		.await
		.expect("Details request should succeed.");

	assert_eq!(response.status(), StatusCode::SEE_OTHER);
	assert_eq!(location(&response), "/documents/1");
}

#[tokio::test]
async fn details_failures_collapse_into_one_message() {
	let server = MockServer::start_async().await;
	let _token = mock_token(&server, "tok-1").await;
	let missing = server
		.mock_async(|when, then| {
			when.method(GET).path(account_path(&format!("/templates/{TEMPLATE_ID}")));
			then.status(404)
				.header("content-type", "application/json")
				.body("{\"errorCode\":\"TEMPLATE_NOT_FOUND\",\"message\":\"Template not found.\"}");
		})
		.await;
	let (base, _) = spawn_app(&test_config(&server)).await;
	let response = browser()
		.get(format!("{base}/details"))
		.send()
		.await
		.expect("Details request should complete.");

	assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
	assert_eq!(error_message(response).await, "Failed to fetch template details");

	missing.assert_calls_async(1).await;
}

#[tokio::test]
async fn details_token_failures_use_the_same_message() {
	let server = MockServer::start_async().await;
	let _token = mock_token_failure(&server).await;
	let (base, _) = spawn_app(&test_config(&server)).await;
	let response = browser()
		.get(format!("{base}/details"))
		.send()
		.await
		.expect("Details request should complete.");

	assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
	assert_eq!(error_message(response).await, "Failed to fetch template details");
}

#[tokio::test]
async fn success_page_needs_no_session() {
	let server = MockServer::start_async().await;
	let token = mock_token(&server, "tok-1").await;
	let (base, state) = spawn_app(&test_config(&server)).await;
	let response = browser()
		.get(format!("{base}/success"))
		.send()
		.await
		.expect("Success request should succeed.");

	assert_eq!(response.status(), StatusCode::OK);
	assert!(response.headers().get(SET_COOKIE).is_none());

	token.assert_calls_async(0).await;

	assert_eq!(state.broker.guard_count(), 0);
}

#[tokio::test]
async fn swept_sessions_are_replaced_on_the_next_visit() {
	let server = MockServer::start_async().await;
	let token = mock_token(&server, "tok-1").await;
	let (base, state) = spawn_app(&test_config(&server)).await;
	let browser = browser();
	let first = browser.get(format!("{base}/")).send().await.expect("Index request should succeed.");
	let cookie = session_cookie(&first);

	assert_eq!(state.broker.guard_count(), 1);

	SessionSweeper::new(state.broker.clone(), Duration::ZERO, 60).sweep_once().await;

	assert_eq!(state.broker.guard_count(), 0);

	let second = browser
		.get(format!("{base}/"))
		.header(COOKIE, &cookie)
		.send()
		.await
		.expect("Index request after the sweep should succeed.");

	assert_ne!(session_cookie(&second), cookie);

	token.assert_calls_async(2).await;
}

#[tokio::test]
async fn disabled_sweeper_returns_immediately() {
	let server = MockServer::start_async().await;
	let (_, state) = spawn_app(&test_config(&server)).await;
	let (_shutdown_tx, shutdown_rx) = watch::channel(false);

	SessionSweeper::new(state.broker.clone(), Duration::hours(1), 0).run(shutdown_rx).await;
}
