//! Process configuration parsed from flags, environment variables, and `.env`.

// std
use std::path::PathBuf;
// crates.io
use clap::{Args, Parser, ValueEnum};
// self
use crate::{
	_prelude::*,
	auth::{AccountId, IntegrationKey, ProviderId, TemplateId, UserId},
	error::ConfigError,
	oauth::{ServiceAccount, SigningKey},
	provider::ProviderDescriptor,
};

/// Top-level configuration.
#[derive(Clone, Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Config {
	/// Provider endpoints and service-account credentials.
	#[command(flatten)]
	pub provider: ProviderConfig,

	/// Listener and static assets.
	#[command(flatten)]
	pub server: ServerConfig,

	/// Session eviction.
	#[command(flatten)]
	pub session: SessionConfig,

	/// Logging.
	#[command(flatten)]
	pub telemetry: TelemetryConfig,
}
impl Config {
	/// Loads `.env` (when present) and parses flags and environment variables.
	pub fn load() -> Self {
		dotenvy::dotenv().ok();

		Self::parse()
	}

	/// Builds the validated provider descriptor.
	pub fn descriptor(&self) -> Result<ProviderDescriptor, ConfigError> {
		let provider = &self.provider;

		Ok(ProviderDescriptor::builder(ProviderId::new("esign")?)
			.oauth_base(&provider.oauth_base_path)
			.map_err(|source| ConfigError::InvalidDescriptor { source })?
			.api_base(provider.base_path.clone())
			.build()?)
	}

	/// Loads the service-account credentials, reading the private key from disk.
	pub fn service_account(&self) -> Result<ServiceAccount, ConfigError> {
		let provider = &self.provider;

		Ok(ServiceAccount::new(
			provider.integration_key.clone(),
			provider.user_id.clone(),
			SigningKey::from_file(&provider.private_key_path)?,
		))
	}

	/// Builds the shared HTTP client used for token and REST calls.
	pub fn http_client(&self) -> Result<ReqwestClient, ConfigError> {
		Ok(ReqwestClient::builder()
			.timeout(std::time::Duration::from_secs(self.provider.http_timeout_secs))
			.redirect(reqwest::redirect::Policy::none())
			.build()?)
	}
}

/// Provider endpoints, account, and service-account credentials.
#[derive(Clone, Debug, Args)]
pub struct ProviderConfig {
	/// REST API base path, e.g. https://demo.docusign.net/restapi
	#[arg(long, env = "BASE_PATH")]
	pub base_path: Url,

	/// Account owning envelopes and templates
	#[arg(long, env = "ACCOUNT_ID")]
	pub account_id: AccountId,

	/// Template used for every envelope
	#[arg(long, env = "TEMPLATE_ID")]
	pub template_id: TemplateId,

	/// Integration key (OAuth client id) of the service account
	#[arg(long, env = "INTEGRATION_KEY")]
	pub integration_key: IntegrationKey,

	/// User impersonated by the service account
	#[arg(long, env = "USER_ID")]
	pub user_id: UserId,

	/// RSA private key (PEM) used to sign assertions
	#[arg(long, env = "PRIVATE_KEY_PATH", default_value = "private.key")]
	pub private_key_path: PathBuf,

	/// Authorization server base URL
	#[arg(long, env = "OAUTH_BASE_PATH", default_value = "https://account-d.docusign.com")]
	pub oauth_base_path: Url,

	/// Lifetime requested in each assertion, in seconds
	#[arg(long, env = "TOKEN_LIFETIME_SECS", default_value_t = 7200)]
	pub token_lifetime_secs: u32,

	/// Where the provider sends signers after the ceremony
	#[arg(long, env = "RETURN_URL", default_value = "http://localhost:4000/success")]
	pub return_url: Url,

	/// Prefix of signing URLs built from template metadata
	#[arg(long, env = "SIGNING_BASE_URL", default_value = "https://demo.docusign.net/Signing/")]
	pub signing_base_url: String,

	/// Timeout applied to every outbound HTTP call, in seconds
	#[arg(long, env = "HTTP_TIMEOUT_SECS", default_value_t = 30)]
	pub http_timeout_secs: u64,
}
impl ProviderConfig {
	/// Requested assertion lifetime.
	pub fn token_lifetime(&self) -> Duration {
		Duration::seconds(self.token_lifetime_secs.into())
	}
}

/// HTTP listener settings.
#[derive(Clone, Debug, Args)]
pub struct ServerConfig {
	/// Host to listen on
	#[arg(long, env = "HOST", default_value = "127.0.0.1")]
	pub host: String,

	/// Port to listen on
	#[arg(long, env = "PORT", default_value_t = 4000)]
	pub port: u16,

	/// Directory holding the form and success pages
	#[arg(long, env = "STATIC_DIR", default_value = "public")]
	pub static_dir: PathBuf,
}
impl ServerConfig {
	/// `host:port` pair for the listener.
	pub fn bind_addr(&self) -> String {
		format!("{}:{}", self.host, self.port)
	}
}

/// Session eviction settings.
#[derive(Clone, Debug, Args)]
pub struct SessionConfig {
	/// Sessions unseen for this many seconds are destroyed
	#[arg(long = "session-idle-secs", env = "SESSION_IDLE_SECS", default_value_t = 86_400)]
	pub idle_secs: u64,

	/// Interval between idle-session sweeps, in seconds (0 disables sweeping)
	#[arg(long = "session-sweep-interval-secs", env = "SESSION_SWEEP_INTERVAL_SECS", default_value_t = 300)]
	pub sweep_interval_secs: u64,
}
impl SessionConfig {
	/// Idle period after which a session is destroyed.
	pub fn idle_timeout(&self) -> Duration {
		Duration::seconds(i64::try_from(self.idle_secs).unwrap_or(i64::MAX))
	}
}

/// Logging settings.
#[derive(Clone, Debug, Args)]
pub struct TelemetryConfig {
	/// Log output format
	#[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
	pub log_format: LogFormat,
}

/// Log line encoding.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
	/// Human-readable lines.
	#[default]
	Text,
	/// One JSON object per line.
	Json,
}
