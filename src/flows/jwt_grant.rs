//! Session-scoped JWT grant orchestration with caching + single-flight guards.
//!
//! [`Broker::access_token`] returns a usable bearer token for one browser session. The
//! cached record is reused while it is active; otherwise the broker signs a fresh assertion,
//! exchanges it, and stores the margin-adjusted record for that session only. A per-session
//! guard makes concurrent callers wait for the in-flight exchange instead of minting their own.
//! Failed exchanges leave the session's previous record untouched.

// self
use crate::{
	_prelude::*,
	auth::{SessionId, TokenRecord, TokenStatus},
	flows::{
		Broker,
		common::{self, CachedTokenRequest},
	},
	http::TokenHttpClient,
	oauth::{JwtGrantFacade, TransportErrorMapper},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	store::SessionStore,
};

impl<C, M> Broker<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Returns the session's active token, acquiring a new one when missing or expired.
	///
	/// Only open sessions receive tokens; every call counts as session activity.
	pub async fn access_token(&self, request: CachedTokenRequest) -> Result<TokenRecord> {
		const KIND: FlowKind = FlowKind::JwtGrant;

		let span = FlowSpan::new(KIND, "access_token");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);
		self.metrics.record_attempt();

		let result = span
			.instrument(async move {
				let guard = common::flow_guard(self, &request.session);
				let _singleflight = guard.lock().await;
				let now = OffsetDateTime::now_utc();

				if !<dyn SessionStore>::touch(self.store.as_ref(), &request.session, now).await? {
					return Err(Error::UnknownSession { session: request.session.clone() });
				}

				let current =
					<dyn SessionStore>::fetch(self.store.as_ref(), &request.session).await?;

				if let Some(current) =
					current.as_ref().filter(|record| !request.should_refresh(record, now))
				{
					obs::record_flow_outcome(KIND, FlowOutcome::CacheHit);
					self.metrics.record_cache_hit();
					tracing::debug!(
						session = %request.session,
						remaining_secs = current.remaining_at(now).whole_seconds(),
						"Reusing cached access token."
					);

					return Ok(current.clone());
				}

				tracing::info!(
					session = %request.session,
					status = ?TokenStatus::of(current.as_ref(), now),
					"Acquiring access token."
				);

				let facade = JwtGrantFacade {
					descriptor: &self.descriptor,
					strategy: self.strategy.as_ref(),
					http_client: self.http_client.as_ref(),
					error_mapper: self.transport_mapper.as_ref(),
				};
				let record = facade
					.exchange(&self.service_account, &request.scope, self.token_lifetime)
					.await?;

				if !<dyn SessionStore>::save(self.store.as_ref(), &request.session, record.clone())
					.await?
				{
					// Destroyed mid-flight; waiters will find the session gone.
					common::drop_guard(self, &request.session);
					tracing::debug!(session = %request.session, "Session closed during acquisition.");
				}

				self.metrics.record_success();

				Ok(record)
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(err) => {
				obs::record_flow_outcome(KIND, FlowOutcome::Failure);
				self.metrics.record_failure();
				tracing::warn!(error = %err, "Token acquisition failed.");
			},
		}

		result
	}

	/// Convenience wrapper requesting the default scopes for `session`.
	pub async fn session_token(&self, session: &SessionId) -> Result<TokenRecord> {
		self.access_token(CachedTokenRequest::for_session(session.clone())?).await
	}

	/// Destroys sessions idle since before `cutoff`, along with their idle guards.
	///
	/// Guards still held by an in-flight acquisition are left to their holder.
	pub async fn purge_idle_sessions(&self, cutoff: OffsetDateTime) -> Result<Vec<SessionId>> {
		const KIND: FlowKind = FlowKind::SessionSweep;

		let span = FlowSpan::new(KIND, "purge_idle_sessions");
		let result = span
			.instrument(async move {
				let purged = <dyn SessionStore>::purge_idle(self.store.as_ref(), cutoff).await?;

				common::forget_guards(self, &purged);

				if !purged.is_empty() {
					tracing::info!(count = purged.len(), "Purged idle sessions.");
				}

				Ok(purged)
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}
}
