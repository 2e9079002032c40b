//! Background eviction of idle sessions.

// crates.io
use tokio::sync::watch;
// self
use crate::{_prelude::*, flows::ReqwestBroker};

/// Periodically destroys sessions idle longer than `idle_timeout`.
#[derive(Debug)]
pub struct SessionSweeper {
	broker: Arc<ReqwestBroker>,
	idle_timeout: Duration,
	interval_secs: u64,
}
impl SessionSweeper {
	/// Creates a sweeper; an interval of zero disables it.
	pub fn new(broker: Arc<ReqwestBroker>, idle_timeout: Duration, interval_secs: u64) -> Self {
		Self { broker, idle_timeout, interval_secs }
	}

	/// Runs until `shutdown` flips to `true`.
	pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
		if self.interval_secs == 0 {
			tracing::info!("Session sweeping is disabled (interval = 0)");

			return;
		}

		let mut interval =
			tokio::time::interval(std::time::Duration::from_secs(self.interval_secs));

		while !*shutdown.borrow() {
			tokio::select! {
				_ = interval.tick() => self.sweep_once().await,
				changed = shutdown.changed() => if changed.is_err() {
					break;
				},
			}
		}

		tracing::info!("Session sweeper shutting down...");
	}

	/// Runs a single sweep relative to the current clock.
	pub async fn sweep_once(&self) {
		let cutoff = OffsetDateTime::now_utc() - self.idle_timeout;

		if let Err(e) = self.broker.purge_idle_sessions(cutoff).await {
			tracing::error!(error = %e, "Session sweep failed");
		}
	}
}
