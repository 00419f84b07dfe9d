//! In-memory session store.

use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::errors::StoreError;
use crate::session::{NewSession, SessionKey, SessionRecord};
use crate::store::SessionStore;

/// Session store backed by a concurrent map. Contents are lost on drop.
#[derive(Debug)]
pub struct MemorySessionStore {
    sessions: DashMap<SessionKey, SessionRecord>,
    next_id: AtomicI64,
}

impl MemorySessionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }

    /// Number of recorded sessions, revoked ones included.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn lookup(&self, key: &SessionKey) -> Result<Option<SessionRecord>, StoreError> {
        Ok(self.sessions.get(key).map(|entry| entry.value().clone()))
    }

    async fn insert(&self, session: NewSession) -> Result<SessionRecord, StoreError> {
        match self.sessions.entry(session.key.clone()) {
            Entry::Occupied(_) => Err(StoreError::DuplicateKey(session.key.to_string())),
            Entry::Vacant(slot) => {
                let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                let record = session.into_record(id);
                slot.insert(record.clone());
                tracing::debug!(key = %record.key, id, "Recorded session");
                Ok(record)
            }
        }
    }

    async fn revoke(&self, key: &SessionKey) -> Result<bool, StoreError> {
        match self.sessions.get_mut(key) {
            Some(mut entry) => {
                entry.valid = false;
                tracing::debug!(key = %key, "Revoked session");
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
