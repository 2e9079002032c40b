//! esign-broker server entry point.

// self
use esign_broker::{config::Config, server, telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let config = Config::load();

	telemetry::init_telemetry(&config.telemetry)?;
	tracing::info!(
		template = %config.provider.template_id,
		account = %config.provider.account_id,
		"Starting esign-broker"
	);

	server::run(config).await
}
