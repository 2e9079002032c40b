//! JWT bearer grant facade and error mapping.

pub mod assertion;

pub use assertion::*;
pub use oauth2;

// crates.io
use oauth2::{
	AsyncHttpClient, HttpClientError, HttpResponse, TokenResponse,
	basic::{BasicErrorResponse, BasicTokenResponse},
	http::{
		Method,
		header::{ACCEPT, CONTENT_TYPE},
	},
};
// self
use crate::{
	_prelude::*,
	auth::{ScopeSet, TokenRecord},
	error::{ConfigError, TransientError, TransportError},
	http::{ResponseMetadata, ResponseMetadataSlot, TokenHttpClient},
	provider::{
		JWT_BEARER_GRANT, ProviderDescriptor, ProviderErrorContext, ProviderErrorKind,
		ProviderStrategy,
	},
};

/// Maps HTTP transport failures into broker [`Error`] values.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an [`HttpClientError`] emitted by the transport into a broker error.
	fn map_transport_error(
		&self,
		strategy: &dyn ProviderStrategy,
		metadata: Option<&ResponseMetadata>,
		error: HttpClientError<E>,
	) -> Error;
}

/// Default mapper for reqwest-backed transports.
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(
		&self,
		strategy: &dyn ProviderStrategy,
		meta: Option<&ResponseMetadata>,
		err: HttpClientError<ReqwestError>,
	) -> Error {
		match err {
			HttpClientError::Reqwest(inner) => map_reqwest_error(strategy, meta, *inner),
			HttpClientError::Http(inner) => ConfigError::from(inner).into(),
			HttpClientError::Io(inner) => TransportError::Io(inner).into(),
			HttpClientError::Other(message) => transient(
				meta,
				format!("HTTP client error occurred while calling the token endpoint: {message}"),
			),
			_ => transient(meta, "HTTP client error occurred while calling the token endpoint"),
		}
	}
}

/// One-shot JWT grant exchange against a descriptor's token endpoint.
pub(crate) struct JwtGrantFacade<'a, C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	pub(crate) descriptor: &'a ProviderDescriptor,
	pub(crate) strategy: &'a dyn ProviderStrategy,
	pub(crate) http_client: &'a C,
	pub(crate) error_mapper: &'a M,
}
impl<C, M> JwtGrantFacade<'_, C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Signs an assertion, posts it, and turns the answer into a margin-adjusted record.
	pub(crate) async fn exchange(
		&self,
		account: &ServiceAccount,
		scope: &ScopeSet,
		lifetime: Duration,
	) -> Result<TokenRecord> {
		let requested_scope = if self.descriptor.quirks.implicit_impersonation {
			scope.with("impersonation").map_err(ConfigError::from)?
		} else {
			scope.clone()
		};
		let issued_at = OffsetDateTime::now_utc();
		let assertion = account.assertion(
			&self.descriptor.audience,
			&format_scope(&requested_scope, self.descriptor.quirks.scope_delimiter),
			issued_at,
			lifetime,
		)?;
		let mut form = BTreeMap::from([
			("grant_type".to_owned(), JWT_BEARER_GRANT.to_owned()),
			("assertion".to_owned(), assertion),
		]);

		self.strategy.augment_token_request(&mut form);

		let body = url::form_urlencoded::Serializer::new(String::new()).extend_pairs(&form).finish();
		let request = oauth2::http::Request::builder()
			.method(Method::POST)
			.uri(self.descriptor.endpoints.token.as_str())
			.header(CONTENT_TYPE, "application/x-www-form-urlencoded")
			.header(ACCEPT, "application/json")
			.body(body.into_bytes())
			.map_err(ConfigError::from)?;
		let meta = ResponseMetadataSlot::default();
		let handle = self.http_client.with_metadata(meta.clone());
		let response = handle.call(request).await.map_err(|err| {
			self.error_mapper.map_transport_error(self.strategy, meta.take().as_ref(), err)
		})?;
		let meta = meta.take();

		if !response.status().is_success() {
			return Err(map_error_response(self.strategy, &response, meta.as_ref()));
		}

		let mut de = serde_json::Deserializer::from_slice(response.body());
		let parsed: BasicTokenResponse = serde_path_to_error::deserialize(&mut de).map_err(
			|source| TransientError::TokenResponseParse {
				source,
				status: Some(response.status().as_u16()),
			},
		)?;

		map_token_response(requested_scope, issued_at, parsed)
	}
}

/// Joins normalized scopes with the provider's delimiter.
pub(crate) fn format_scope(scope: &ScopeSet, delimiter: char) -> String {
	if delimiter == ' ' {
		return scope.normalized();
	}

	scope.iter().collect::<Vec<_>>().join(&delimiter.to_string())
}

fn map_token_response(
	scope: ScopeSet,
	issued_at: OffsetDateTime,
	response: BasicTokenResponse,
) -> Result<TokenRecord> {
	let expires_in = response.expires_in().ok_or(ConfigError::MissingExpiresIn)?.as_secs();
	let expires_in = i64::try_from(expires_in).map_err(|_| ConfigError::ExpiresInOutOfRange)?;

	if expires_in <= 0 {
		return Err(ConfigError::NonPositiveExpiresIn.into());
	}

	TokenRecord::builder(scope)
		.access_token(response.access_token().secret().to_owned())
		.issued_at(issued_at)
		.expires_in(Duration::seconds(expires_in))
		.safety_margin(TokenRecord::SAFETY_MARGIN)
		.build()
		.map_err(|err| ConfigError::from(err).into())
}

fn map_error_response(
	strategy: &dyn ProviderStrategy,
	response: &HttpResponse,
	meta: Option<&ResponseMetadata>,
) -> Error {
	let status = response.status().as_u16();
	let mut ctx = ProviderErrorContext::new().with_http_status(status);
	let message = match serde_json::from_slice::<BasicErrorResponse>(response.body()) {
		Ok(parsed) => {
			let code = parsed.error().as_ref().to_owned();

			ctx = ctx.with_oauth_error(code.clone());

			if let Some(description) = parsed.error_description() {
				ctx = ctx.with_error_description(description.clone());

				format!("Token endpoint returned an OAuth error: {description}")
			} else {
				format!("Token endpoint returned an OAuth error: {code}")
			}
		},
		Err(_) => {
			ctx = ctx.with_body_preview(String::from_utf8_lossy(response.body()));

			format!("Token endpoint returned HTTP {status}")
		},
	};

	match strategy.classify_token_error(&ctx) {
		ProviderErrorKind::InvalidGrant => Error::InvalidGrant { reason: message },
		ProviderErrorKind::InvalidClient => Error::InvalidClient { reason: message },
		ProviderErrorKind::ConsentRequired => Error::ConsentRequired { reason: message },
		ProviderErrorKind::InsufficientScope => Error::InsufficientScope { reason: message },
		ProviderErrorKind::Transient => TransientError::TokenEndpoint {
			message,
			status: Some(status),
			retry_after: meta.and_then(|value| value.retry_after),
		}
		.into(),
	}
}

fn map_reqwest_error(
	strategy: &dyn ProviderStrategy,
	meta: Option<&ResponseMetadata>,
	err: ReqwestError,
) -> Error {
	if err.is_builder() {
		return ConfigError::from(err).into();
	}
	if err.is_timeout() {
		return transient(meta, "Request timed out while calling the token endpoint");
	}

	let ctx = ProviderErrorContext::network_failure();

	match strategy.classify_token_error(&ctx) {
		ProviderErrorKind::Transient => TransportError::from(err).into(),
		_ => Error::InvalidClient { reason: err.to_string() },
	}
}

fn transient(meta: Option<&ResponseMetadata>, message: impl Into<String>) -> Error {
	TransientError::TokenEndpoint {
		message: message.into(),
		status: meta.and_then(|value| value.status),
		retry_after: meta.and_then(|value| value.retry_after),
	}
	.into()
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::provider::DefaultProviderStrategy;

	fn response(status: u16, body: &str) -> HttpResponse {
		let mut response = HttpResponse::new(body.as_bytes().to_vec());

		*response.status_mut() =
			oauth2::http::StatusCode::from_u16(status).expect("Fixture status should be valid.");

		response
	}

	#[test]
	fn scope_formatting_handles_custom_delimiters() {
		let scope = ScopeSet::new(["signature", "impersonation"]).expect("Failed to build test scope.");

		assert_eq!(format_scope(&scope, ' '), "impersonation signature");
		assert_eq!(format_scope(&scope, ','), "impersonation,signature");
	}

	#[test]
	fn consent_errors_are_classified() {
		let err = map_error_response(
			&DefaultProviderStrategy,
			&response(400, "{\"error\":\"consent_required\"}"),
			None,
		);

		assert!(matches!(err, Error::ConsentRequired { .. }));
	}

	#[test]
	fn non_json_errors_fall_back_to_status() {
		let err = map_error_response(
			&DefaultProviderStrategy,
			&response(503, "<html>maintenance</html>"),
			Some(&ResponseMetadata { status: Some(503), retry_after: Some(Duration::seconds(5)) }),
		);

		match err {
			Error::Transient(TransientError::TokenEndpoint { status, retry_after, .. }) => {
				assert_eq!(status, Some(503));
				assert_eq!(retry_after, Some(Duration::seconds(5)));
			},
			other => panic!("Unexpected error: {other:?}"),
		}
	}

	#[test]
	fn token_response_applies_safety_margin() {
		let parsed: BasicTokenResponse = serde_json::from_str(
			"{\"access_token\":\"abc\",\"token_type\":\"Bearer\",\"expires_in\":3600}",
		)
		.expect("Token response fixture should parse.");
		let issued_at =
			OffsetDateTime::from_unix_timestamp(1_000).expect("Fixture timestamp should be valid.");
		let scope = ScopeSet::new(["signature"]).expect("Scope fixture should be valid.");
		let record =
			map_token_response(scope, issued_at, parsed).expect("Token response should map.");

		assert_eq!(record.expires_at.unix_timestamp(), 4_540);
		assert_eq!(record.access_token.expose(), "abc");
	}

	#[test]
	fn token_response_without_lifetime_is_rejected() {
		let parsed: BasicTokenResponse =
			serde_json::from_str("{\"access_token\":\"abc\",\"token_type\":\"Bearer\"}")
				.expect("Token response fixture should parse.");
		let scope = ScopeSet::new(["signature"]).expect("Scope fixture should be valid.");
		let err = map_token_response(scope, OffsetDateTime::now_utc(), parsed)
			.expect_err("Missing expires_in must be rejected.");

		assert!(matches!(err, Error::Config(ConfigError::MissingExpiresIn)));
	}
}
