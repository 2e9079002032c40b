//! axum front end: routes, shared state, session tracking, and process lifecycle.

pub mod error;
pub mod handlers;
pub mod session;
pub mod sweeper;

pub use error::*;
pub use session::{SESSION_COOKIE, Session};
pub use sweeper::SessionSweeper;

// std
use std::path::PathBuf;
// crates.io
use axum::{
	Router, middleware,
	routing::{get, post},
};
use tokio::{net::TcpListener, sync::watch};
use tower_http::{services::ServeDir, trace::TraceLayer};
// self
use crate::{
	_prelude::*,
	auth::TemplateId,
	config::Config,
	error::ConfigError,
	esign::EsignClient,
	flows::ReqwestBroker,
	http::ReqwestHttpClient,
	oauth::ReqwestTransportErrorMapper,
	provider::DefaultProviderStrategy,
	store::{MemoryStore, SessionStore},
};

/// Values the handlers need besides the broker and the REST client.
#[derive(Clone, Debug)]
pub struct SigningSettings {
	/// Template every envelope is created from.
	pub template_id: TemplateId,
	/// Where the provider sends signers after the ceremony.
	pub return_url: Url,
	/// Prefix of signing URLs built from template metadata.
	pub signing_base_url: String,
	/// Directory holding the static pages.
	pub static_dir: PathBuf,
}

/// State shared by every request.
#[derive(Clone)]
pub struct AppState {
	/// Per-session token broker.
	pub broker: Arc<ReqwestBroker>,
	/// Account-scoped REST client.
	pub esign: EsignClient,
	/// Session store shared with the broker.
	pub store: Arc<dyn SessionStore>,
	/// Static handler settings.
	pub settings: Arc<SigningSettings>,
}
impl AppState {
	/// Wires the broker, REST client, and in-memory session store from configuration.
	pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
		Self::with_http_client(config, config.http_client()?)
	}

	/// Same as [`from_config`](Self::from_config) but shares a caller-built reqwest client for
	/// token and REST calls.
	pub fn with_http_client(config: &Config, http: ReqwestClient) -> Result<Self, ConfigError> {
		let descriptor = config.descriptor()?;
		let store: Arc<dyn SessionStore> = Arc::new(MemoryStore::default());
		let broker = ReqwestBroker::with_http_client(
			store.clone(),
			descriptor.clone(),
			Arc::new(DefaultProviderStrategy),
			config.service_account()?,
			ReqwestHttpClient::with_client(http.clone()),
			ReqwestTransportErrorMapper,
		)
		.with_token_lifetime(config.provider.token_lifetime());
		let esign = EsignClient::new(http, descriptor, config.provider.account_id.clone());
		let settings = SigningSettings {
			template_id: config.provider.template_id.clone(),
			return_url: config.provider.return_url.clone(),
			signing_base_url: config.provider.signing_base_url.clone(),
			static_dir: config.server.static_dir.clone(),
		};

		Ok(Self { broker: Arc::new(broker), esign, store, settings: Arc::new(settings) })
	}
}

impl Debug for AppState {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AppState")
			.field("broker", &self.broker)
			.field("esign", &self.esign)
			.field("settings", &self.settings)
			.finish()
	}
}

/// Builds the application router.
///
/// Token-bearing routes run behind the session middleware; `/success` and every other path
/// are served without a session.
pub fn router(state: AppState) -> Router {
	let static_files = ServeDir::new(&state.settings.static_dir);

	Router::new()
		.route("/", get(handlers::index))
		.route("/send-envelope", post(handlers::send_envelope))
		.route("/details", get(handlers::details))
		.route_layer(middleware::from_fn_with_state(state.clone(), session::track))
		.route("/success", get(handlers::success))
		.fallback_service(static_files)
		.layer(TraceLayer::new_for_http())
		.with_state(state)
}

/// Runs the server until Ctrl-C or SIGTERM.
pub async fn run(config: Config) -> anyhow::Result<()> {
	let state = AppState::from_config(&config)?;
	let (shutdown_tx, shutdown_rx) = watch::channel(false);

	spawn_signal_handler(shutdown_tx.clone());

	let sweeper = tokio::spawn(
		SessionSweeper::new(
			state.broker.clone(),
			config.session.idle_timeout(),
			config.session.sweep_interval_secs,
		)
		.run(shutdown_rx.clone()),
	);
	let listener = TcpListener::bind(config.server.bind_addr()).await?;

	tracing::info!(address = %listener.local_addr()?, "listening");

	let mut server_rx = shutdown_rx.clone();

	axum::serve(listener, router(state))
		.with_graceful_shutdown(async move {
			let _ = server_rx.wait_for(|&stop| stop).await;
		})
		.await?;

	let _ = shutdown_tx.send(true);

	if let Err(e) = sweeper.await {
		tracing::warn!(error = %e, "Session sweeper ended abnormally");
	}

	Ok(())
}

/// Flips `shutdown` to `true` on Ctrl-C or SIGTERM.
pub fn spawn_signal_handler(shutdown: watch::Sender<bool>) {
	tokio::spawn(async move {
		let ctrl_c = async {
			if let Err(e) = tokio::signal::ctrl_c().await {
				tracing::error!(error = %e, "Failed to listen for Ctrl-C");
				std::future::pending::<()>().await;
			}
		};

		#[cfg(unix)]
		let terminate = async {
			match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
				Ok(mut signal) => {
					signal.recv().await;
				},
				Err(e) => {
					tracing::error!(error = %e, "Failed to listen for SIGTERM");
					std::future::pending::<()>().await;
				},
			}
		};
		#[cfg(not(unix))]
		let terminate = std::future::pending::<()>();

		tokio::select! {
			_ = ctrl_c => {},
			_ = terminate => {},
		}

		tracing::info!("Shutdown signal received");

		let _ = shutdown.send(true);
	});
}
