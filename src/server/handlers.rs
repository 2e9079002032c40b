//! Route handlers.

// std
use std::path::Path;
// crates.io
use axum::{
	Extension, Form,
	extract::{State, rejection::FormRejection},
	http::HeaderValue,
	response::{Html, Redirect},
};
use uuid::Uuid;
// self
use crate::{
	_prelude::*,
	auth::SessionId,
	esign::{self, Applicant},
	server::{AppError, AppState, Session},
};

/// `GET /`: makes sure the session holds a token, then serves the form.
pub async fn index(
	State(state): State<AppState>,
	Extension(Session(session)): Extension<Session>,
) -> Result<Html<String>, AppError> {
	state.broker.session_token(&session).await?;

	page(&state.settings.static_dir.join("index.html")).await
}

/// `GET /success`: landing page after the signing ceremony.
pub async fn success(State(state): State<AppState>) -> Result<Html<String>, AppError> {
	page(&state.settings.static_dir.join("success").join("success.html")).await
}

/// `POST /send-envelope`: creates an envelope for the applicant and enters embedded signing.
pub async fn send_envelope(
	State(state): State<AppState>,
	Extension(Session(session)): Extension<Session>,
	form: Result<Form<Applicant>, FormRejection>,
) -> Result<Redirect, AppError> {
	let Form(applicant) = form.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;

	if let Some(field) = applicant.missing_field() {
		return Err(AppError::BadRequest(format!("Field `{field}` is required.")));
	}

	let token = state.broker.session_token(&session).await?;
	let client_user_id = Uuid::new_v4().to_string();
	let envelope = esign::make_envelope(&state.settings.template_id, &applicant, &client_user_id);
	let summary = state.esign.create_envelope(&token.access_token, &envelope).await?;

	tracing::info!(envelope_id = %summary.envelope_id, "Envelope created.");

	let view_request =
		esign::make_recipient_view_request(&state.settings.return_url, &applicant, &client_user_id);
	let view = state
		.esign
		.create_recipient_view(&token.access_token, &summary.envelope_id, &view_request)
		.await?;

	redirect(&view.url)
}

/// `GET /details`: redirects to the applicant's signing URL joined with the first document.
pub async fn details(
	State(state): State<AppState>,
	Extension(Session(session)): Extension<Session>,
) -> Result<Redirect, AppError> {
	signing_redirect(&state, &session).await.map_err(AppError::template_details)
}

async fn signing_redirect(state: &AppState, session: &SessionId) -> Result<Redirect, AppError> {
	let token = state.broker.session_token(session).await?;
	let template = state.esign.get_template(&token.access_token, &state.settings.template_id).await?;

	redirect(&esign::signing_target(&template, &state.settings.signing_base_url))
}

// `Redirect` panics on values that are not valid header values.
fn redirect(target: &str) -> Result<Redirect, AppError> {
	HeaderValue::try_from(target).map_err(|_| AppError::InvalidRedirect)?;

	Ok(Redirect::to(target))
}

async fn page(path: &Path) -> Result<Html<String>, AppError> {
	tokio::fs::read_to_string(path)
		.await
		.map(Html)
		.map_err(|source| AppError::Page { path: path.display().to_string(), source })
}
