//! Tracing subscriber setup.

// crates.io
use tracing_subscriber::{EnvFilter, Registry, layer::SubscriberExt, util::SubscriberInitExt};
// self
use crate::config::{LogFormat, TelemetryConfig};

const DEFAULT_FILTER: &str = "info,hyper=warn,reqwest=warn";

/// Installs the global subscriber; `RUST_LOG` overrides the default filter.
pub fn init_telemetry(config: &TelemetryConfig) -> anyhow::Result<()> {
	let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(DEFAULT_FILTER))?;
	let registry = Registry::default().with(filter);

	match config.log_format {
		LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).try_init()?,
		LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).try_init()?,
	}

	Ok(())
}
