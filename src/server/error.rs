//! HTTP boundary error: every handler failure becomes one JSON response here.

// crates.io
use axum::{
	Json,
	http::StatusCode,
	response::{IntoResponse, Response},
};
use serde_json::json;
// self
use crate::{_prelude::*, esign::ApiError};

/// Message returned when the template details route fails for any reason.
pub const TEMPLATE_DETAILS_FAILED: &str = "Failed to fetch template details";

/// Failures surfaced by route handlers.
#[derive(Debug, ThisError)]
pub enum AppError {
	/// Form input was missing or malformed.
	#[error("Invalid request: {0}")]
	BadRequest(String),
	/// Session bookkeeping or token acquisition failed.
	#[error(transparent)]
	Broker(#[from] Error),
	/// The e-signature REST API call failed.
	#[error(transparent)]
	Api(#[from] ApiError),
	/// Provider handed back a URL that cannot be used as a redirect target.
	#[error("Redirect target is not a valid header value.")]
	InvalidRedirect,
	/// A static page could not be read.
	#[error("Page `{path}` could not be read.")]
	Page {
		/// Path of the page on disk.
		path: String,
		/// Underlying IO failure.
		#[source]
		source: std::io::Error,
	},
	/// Any failure while resolving the template details redirect.
	#[error("Failed to fetch template details")]
	TemplateDetails(#[source] Box<AppError>),
}
impl AppError {
	/// Collapses `self` into the template details failure.
	pub fn template_details(self) -> Self {
		match self {
			Self::TemplateDetails(_) => self,
			other => Self::TemplateDetails(Box::new(other)),
		}
	}
}
impl IntoResponse for AppError {
	fn into_response(self) -> Response {
		let (status, message) = match self {
			AppError::BadRequest(msg) => {
				tracing::debug!(message = %msg, "Bad request");

				(StatusCode::BAD_REQUEST, msg)
			},
			AppError::Broker(Error::Storage(e)) => {
				tracing::error!(error = %e, "Session store failure");

				(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_owned())
			},
			AppError::Broker(e) => {
				tracing::error!(error = %e, auth = e.is_auth_failure(), "Token acquisition failed");

				(StatusCode::BAD_GATEWAY, "Failed to obtain an access token".to_owned())
			},
			AppError::Api(e) => {
				tracing::error!(error = %e, "E-signature API call failed");

				(StatusCode::BAD_GATEWAY, "E-signature request failed".to_owned())
			},
			AppError::InvalidRedirect => {
				tracing::error!("Provider returned an unusable redirect target");

				(StatusCode::BAD_GATEWAY, "E-signature request failed".to_owned())
			},
			AppError::Page { path, source } => {
				tracing::error!(path = %path, error = %source, "Static page unavailable");

				(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_owned())
			},
			AppError::TemplateDetails(inner) => {
				tracing::error!(error = %inner, "Error fetching template details");

				(StatusCode::INTERNAL_SERVER_ERROR, TEMPLATE_DETAILS_FAILED.to_owned())
			},
		};

		(status, Json(json!({ "error": message }))).into_response()
	}
}
