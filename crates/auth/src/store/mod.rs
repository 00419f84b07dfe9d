//! Session store implementations.

mod memory;
mod sqlite;

pub use memory::MemorySessionStore;
pub use sqlite::SqliteSessionStore;

use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::StoreError;
use crate::session::{NewSession, SessionKey, SessionRecord};

/// Server-side session bookkeeping, keyed by the token's `jti`.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Find the session recorded under `key`.
    async fn lookup(&self, key: &SessionKey) -> Result<Option<SessionRecord>, StoreError>;

    /// Record a new, valid session. Keys are unique.
    async fn insert(&self, session: NewSession) -> Result<SessionRecord, StoreError>;

    /// Mark the session invalid. Returns whether `key` was recorded.
    async fn revoke(&self, key: &SessionKey) -> Result<bool, StoreError>;
}

#[async_trait]
impl<S: SessionStore + ?Sized> SessionStore for Arc<S> {
    async fn lookup(&self, key: &SessionKey) -> Result<Option<SessionRecord>, StoreError> {
        (**self).lookup(key).await
    }

    async fn insert(&self, session: NewSession) -> Result<SessionRecord, StoreError> {
        (**self).insert(session).await
    }

    async fn revoke(&self, key: &SessionKey) -> Result<bool, StoreError> {
        (**self).revoke(key).await
    }
}
