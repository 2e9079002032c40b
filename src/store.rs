//! Storage contracts and the built-in session store for token records.

pub mod memory;

pub use memory::MemoryStore;

// self
use crate::{
	_prelude::*,
	auth::{SessionId, TokenRecord},
};

/// Boxed future returned by [`SessionStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Session-keyed token storage injected into the broker.
///
/// Every session owns at most one [`TokenRecord`]; records are never shared across sessions.
/// Slots exist from [`open`](Self::open) until [`remove`](Self::remove) or
/// [`purge_idle`](Self::purge_idle) drops them.
pub trait SessionStore
where
	Self: Send + Sync,
{
	/// Creates an empty slot for a newly started session, replacing any previous slot.
	fn open<'a>(&'a self, session: &'a SessionId, instant: OffsetDateTime) -> StoreFuture<'a, ()>;

	/// Marks a known session as seen at `instant`; returns `false` for unknown sessions.
	fn touch<'a>(
		&'a self,
		session: &'a SessionId,
		instant: OffsetDateTime,
	) -> StoreFuture<'a, bool>;

	/// Persists or replaces the token record of an open session.
	///
	/// Returns `false` and stores nothing when the session is unknown, so a record minted
	/// while its session was being destroyed never brings the slot back.
	fn save<'a>(&'a self, session: &'a SessionId, record: TokenRecord) -> StoreFuture<'a, bool>;

	/// Fetches the token record of a session, if one was acquired.
	fn fetch<'a>(&'a self, session: &'a SessionId) -> StoreFuture<'a, Option<TokenRecord>>;

	/// Destroys a session slot; returns `true` when the session existed.
	fn remove<'a>(&'a self, session: &'a SessionId) -> StoreFuture<'a, bool>;

	/// Destroys every session last seen before `cutoff` and returns their identifiers.
	fn purge_idle(&self, cutoff: OffsetDateTime) -> StoreFuture<'_, Vec<SessionId>>;
}

/// Error type produced by [`SessionStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
