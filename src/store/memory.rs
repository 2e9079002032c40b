//! Thread-safe in-memory [`SessionStore`] implementation.

// self
use crate::{
	_prelude::*,
	auth::{SessionId, TokenRecord},
	store::{SessionStore, StoreFuture},
};

type SessionMap = Arc<RwLock<HashMap<SessionId, SessionSlot>>>;

#[derive(Clone, Debug)]
struct SessionSlot {
	record: Option<TokenRecord>,
	last_seen: OffsetDateTime,
}
impl SessionSlot {
	fn empty(instant: OffsetDateTime) -> Self {
		Self { record: None, last_seen: instant }
	}
}

/// Process-local session store; contents vanish when the process restarts.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(SessionMap);
impl MemoryStore {
	/// Number of live sessions.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Returns `true` when no session is tracked.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}

	fn open_now(map: SessionMap, session: SessionId, instant: OffsetDateTime) {
		map.write().insert(session, SessionSlot::empty(instant));
	}

	fn touch_now(map: SessionMap, session: &SessionId, instant: OffsetDateTime) -> bool {
		match map.write().get_mut(session) {
			Some(slot) => {
				slot.last_seen = slot.last_seen.max(instant);

				true
			},
			None => false,
		}
	}

	fn save_now(map: SessionMap, session: &SessionId, record: TokenRecord) -> bool {
		match map.write().get_mut(session) {
			Some(slot) => {
				slot.last_seen = slot.last_seen.max(record.issued_at);
				slot.record = Some(record);

				true
			},
			None => false,
		}
	}

	fn fetch_now(map: SessionMap, session: &SessionId) -> Option<TokenRecord> {
		map.read().get(session).and_then(|slot| slot.record.clone())
	}

	fn purge_now(map: SessionMap, cutoff: OffsetDateTime) -> Vec<SessionId> {
		let mut guard = map.write();
		let idle = guard
			.iter()
			.filter(|(_, slot)| slot.last_seen < cutoff)
			.map(|(session, _)| session.clone())
			.collect::<Vec<_>>();

		for session in &idle {
			guard.remove(session);
		}

		idle
	}
}
impl SessionStore for MemoryStore {
	fn open<'a>(&'a self, session: &'a SessionId, instant: OffsetDateTime) -> StoreFuture<'a, ()> {
		let map = self.0.clone();
		let session = session.to_owned();

		Box::pin(async move {
			Self::open_now(map, session, instant);

			Ok(())
		})
	}

	fn touch<'a>(
		&'a self,
		session: &'a SessionId,
		instant: OffsetDateTime,
	) -> StoreFuture<'a, bool> {
		let map = self.0.clone();

		Box::pin(async move { Ok(Self::touch_now(map, session, instant)) })
	}

	fn save<'a>(&'a self, session: &'a SessionId, record: TokenRecord) -> StoreFuture<'a, bool> {
		let map = self.0.clone();

		Box::pin(async move { Ok(Self::save_now(map, session, record)) })
	}

	fn fetch<'a>(&'a self, session: &'a SessionId) -> StoreFuture<'a, Option<TokenRecord>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(Self::fetch_now(map, session)) })
	}

	fn remove<'a>(&'a self, session: &'a SessionId) -> StoreFuture<'a, bool> {
		let map = self.0.clone();

		Box::pin(async move { Ok(map.write().remove(session).is_some()) })
	}

	fn purge_idle(&self, cutoff: OffsetDateTime) -> StoreFuture<'_, Vec<SessionId>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(Self::purge_now(map, cutoff)) })
	}
}
