//! Shared helpers for flow implementations (cached-request state, guards).

// self
use crate::{
	_prelude::*,
	auth::{ScopeSet, SessionId, TokenRecord},
	flows::Broker,
	http::TokenHttpClient,
	oauth::TransportErrorMapper,
};

/// Scopes every session token carries unless a caller asks for more.
pub const DEFAULT_SCOPES: [&str; 1] = ["signature"];

/// Request parameters for flows that evaluate the cached record before contacting the
/// provider.
#[derive(Clone, Debug)]
pub struct CachedTokenRequest {
	/// Session owning the token.
	pub session: SessionId,
	/// Normalized scope set for the request.
	pub scope: ScopeSet,
	/// Forces cache bypass when true.
	pub force: bool,
}
impl CachedTokenRequest {
	/// Creates a request for the given session and scope.
	pub fn new(session: SessionId, scope: ScopeSet) -> Self {
		Self { session, scope, force: false }
	}

	/// Creates a request using [`DEFAULT_SCOPES`].
	pub fn for_session(session: SessionId) -> Result<Self> {
		let scope = ScopeSet::new(DEFAULT_SCOPES).map_err(crate::error::ConfigError::from)?;

		Ok(Self::new(session, scope))
	}

	/// Forces the broker to bypass cache checks.
	pub fn force_refresh(mut self) -> Self {
		self.force = true;

		self
	}

	/// Determines whether the cached record must be replaced.
	///
	/// Records minted for a narrower scope are replaced too.
	pub fn should_refresh(&self, record: &TokenRecord, now: OffsetDateTime) -> bool {
		if self.force || !record.status_at(now).is_usable() {
			return true;
		}

		!self.scope.iter().all(|scope| record.scope.contains(scope))
	}
}

/// Returns (and creates on demand) the single-flight guard for a session.
pub(crate) fn flow_guard<C, M>(broker: &Broker<C, M>, session: &SessionId) -> Arc<AsyncMutex<()>>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	let mut guards = broker.flow_guards.lock();

	guards.entry(session.clone()).or_insert_with(|| Arc::new(AsyncMutex::new(()))).clone()
}

/// Drops the guards of destroyed sessions that nobody holds or waits on.
pub(crate) fn forget_guards<C, M>(broker: &Broker<C, M>, sessions: &[SessionId])
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	let mut guards = broker.flow_guards.lock();

	for session in sessions {
		// The map holds the only reference unless a request is using the guard.
		if guards.get(session).is_some_and(|guard| Arc::strong_count(guard) == 1) {
			guards.remove(session);
		}
	}
}

/// Drops a session's guard unconditionally; used by the holder once the session is gone.
pub(crate) fn drop_guard<C, M>(broker: &Broker<C, M>, session: &SessionId)
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	broker.flow_guards.lock().remove(session);
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn record(scopes: &[&str], expires_at: i64) -> TokenRecord {
		TokenRecord::builder(ScopeSet::new(scopes.iter().copied()).expect("Scope fixture should be valid."))
			.access_token("token")
			.issued_at(OffsetDateTime::UNIX_EPOCH)
			.expires_at(
				OffsetDateTime::from_unix_timestamp(expires_at)
					.expect("Fixture timestamp should be in range."),
			)
			.build()
			.expect("Record fixture should build.")
	}

	fn request() -> CachedTokenRequest {
		CachedTokenRequest::for_session(SessionId::new("s-1").expect("Session fixture should be valid."))
			.expect("Default scopes should be valid.")
	}

	#[test]
	fn active_records_with_matching_scope_are_reused() {
		let now = OffsetDateTime::from_unix_timestamp(100).expect("Fixture timestamp should be in range.");

		assert!(!request().should_refresh(&record(&["impersonation", "signature"], 200), now));
		assert!(request().should_refresh(&record(&["signature"], 100), now));
		assert!(request().should_refresh(&record(&["impersonation"], 200), now));
		assert!(request().force_refresh().should_refresh(&record(&["signature"], 200), now));
	}
}
