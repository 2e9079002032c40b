//! Thin REST client for the envelope, recipient-view, and template endpoints.
//!
//! Every call is scoped to one account below `{api_base}/v2.1/accounts/{account_id}` and
//! authenticated with a session's bearer token obtained from [`Broker`](crate::flows::Broker).

pub mod builder;
pub mod model;

pub use builder::*;
pub use model::*;

// crates.io
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	auth::{AccountId, TemplateId, TokenSecret},
	provider::ProviderDescriptor,
};

const API_VERSION: &str = "v2.1";

/// Failures raised by [`EsignClient`] calls.
#[derive(Debug, ThisError)]
pub enum ApiError {
	/// REST API answered with a non-success status.
	#[error("E-signature API returned HTTP {status}: {message}.")]
	Api {
		/// HTTP status code.
		status: u16,
		/// Provider error code, when the body carried one.
		error_code: Option<String>,
		/// Provider message or a body preview.
		message: String,
	},
	/// Request could not be sent or the response body could not be read.
	#[error("E-signature API request failed.")]
	Transport(#[from] ReqwestError),
	/// Success body did not match the expected model.
	#[error("E-signature API returned an unexpected body.")]
	Decode(#[from] serde_path_to_error::Error<serde_json::Error>),
	/// Endpoint URL could not be derived from the descriptor.
	#[error("E-signature API URL is invalid.")]
	InvalidUrl(#[from] url::ParseError),
}

/// Account-scoped REST client.
#[derive(Clone, Debug)]
pub struct EsignClient {
	http: ReqwestClient,
	descriptor: Arc<ProviderDescriptor>,
	account_id: AccountId,
}
impl EsignClient {
	const MESSAGE_PREVIEW_LIMIT: usize = 256;

	/// Creates a client for `account_id` sharing the given reqwest pool.
	pub fn new(
		http: ReqwestClient,
		descriptor: impl Into<Arc<ProviderDescriptor>>,
		account_id: AccountId,
	) -> Self {
		Self { http, descriptor: descriptor.into(), account_id }
	}

	/// Creates an envelope and returns its summary.
	pub async fn create_envelope(
		&self,
		token: &TokenSecret,
		envelope: &EnvelopeDefinition,
	) -> Result<EnvelopeSummary, ApiError> {
		let url = self.account_url(&["envelopes"])?;

		self.send(self.request(Method::POST, url, token).json(envelope)).await
	}

	/// Requests an embedded signing URL for a recipient of `envelope_id`.
	pub async fn create_recipient_view(
		&self,
		token: &TokenSecret,
		envelope_id: &str,
		request: &RecipientViewRequest,
	) -> Result<ViewUrl, ApiError> {
		let url = self.account_url(&["envelopes", envelope_id, "views", "recipient"])?;

		self.send(self.request(Method::POST, url, token).json(request)).await
	}

	/// Fetches template metadata.
	pub async fn get_template(
		&self,
		token: &TokenSecret,
		template_id: &TemplateId,
	) -> Result<EnvelopeTemplate, ApiError> {
		let url = self.account_url(&["templates", template_id.as_ref()])?;

		self.send(self.request(Method::GET, url, token)).await
	}

	fn account_url(&self, segments: &[&str]) -> Result<Url, ApiError> {
		let mut path = vec![API_VERSION, "accounts", self.account_id.as_ref()];

		path.extend_from_slice(segments);

		Ok(self.descriptor.api_url(&path)?)
	}

	fn request(&self, method: Method, url: Url, token: &TokenSecret) -> RequestBuilder {
		self.http
			.request(method, url)
			.header(reqwest::header::AUTHORIZATION, token.bearer())
			.header(reqwest::header::ACCEPT, "application/json")
	}

	async fn send<T>(&self, request: RequestBuilder) -> Result<T, ApiError>
	where
		T: DeserializeOwned,
	{
		let response = request.send().await?;
		let status = response.status();
		let body = response.bytes().await?;

		if !status.is_success() {
			return Err(api_error(status, &body));
		}

		let mut de = serde_json::Deserializer::from_slice(&body);

		Ok(serde_path_to_error::deserialize(&mut de)?)
	}
}

fn api_error(status: StatusCode, body: &[u8]) -> ApiError {
	let details = serde_json::from_slice::<ApiErrorDetails>(body).unwrap_or_default();
	let message = details.message.unwrap_or_else(|| {
		String::from_utf8_lossy(body).chars().take(EsignClient::MESSAGE_PREVIEW_LIMIT).collect()
	});

	ApiError::Api { status: status.as_u16(), error_code: details.error_code, message }
}
