//! Cookie-backed session tracking.
//!
//! Each browser carries an opaque [`SessionId`] in the `esign.sid` cookie. Unknown or malformed
//! identifiers are never adopted: the middleware opens a fresh slot and issues a new cookie.

// crates.io
use axum::{
	extract::{Request, State},
	http::{
		HeaderMap, HeaderValue,
		header::{COOKIE, SET_COOKIE},
	},
	middleware::Next,
	response::{IntoResponse, Response},
};
// self
use crate::{
	_prelude::*,
	auth::SessionId,
	server::{AppError, AppState},
	store::SessionStore,
};

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "esign.sid";

/// Session attached to the current request by [`track`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session(pub SessionId);

/// Resolves or creates the session and exposes it to handlers as an extension.
pub async fn track(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
	let (session, fresh) = match resolve(state.store.as_ref(), request.headers()).await {
		Ok(resolved) => resolved,
		Err(err) => return AppError::from(err).into_response(),
	};

	request.extensions_mut().insert(Session(session.clone()));

	let mut response = next.run(request).await;

	if fresh {
		match HeaderValue::try_from(set_cookie(&session)) {
			Ok(value) => {
				response.headers_mut().append(SET_COOKIE, value);
			},
			Err(err) => tracing::error!(error = %err, "Session cookie could not be encoded."),
		}
	}

	response
}

async fn resolve(store: &dyn SessionStore, headers: &HeaderMap) -> Result<(SessionId, bool)> {
	let now = OffsetDateTime::now_utc();

	if let Some(session) = cookie_session(headers) {
		if store.touch(&session, now).await? {
			return Ok((session, false));
		}

		tracing::debug!(session = %session, "Unknown session cookie replaced.");
	}

	let session = SessionId::generate();

	store.open(&session, now).await?;
	tracing::debug!(session = %session, "Session started.");

	Ok((session, true))
}

/// Extracts a well-formed session identifier from the request cookies.
pub fn cookie_session(headers: &HeaderMap) -> Option<SessionId> {
	headers
		.get_all(COOKIE)
		.iter()
		.filter_map(|value| value.to_str().ok())
		.flat_map(|value| value.split(';'))
		.filter_map(|pair| pair.trim().split_once('='))
		.find(|(name, _)| *name == SESSION_COOKIE)
		.and_then(|(_, value)| SessionId::new(value).ok())
}

/// Renders the `Set-Cookie` value for a new session.
pub fn set_cookie(session: &SessionId) -> String {
	format!("{SESSION_COOKIE}={session}; Path=/; HttpOnly; SameSite=Lax")
}
