//! Session payload and store records.
//!
//! An [`AuthSession`] is what a token carries. A [`SessionRecord`] is what
//! the store keeps about the same session; the two share the session key
//! (`jti`) and have independent expiry times, so a session can be revoked or
//! cut short without touching the token text.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{AuthError, AuthResult};

/// Session key, embedded in tokens as `jti` and used as the store key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionKey(String);

impl SessionKey {
    /// Create a new random session key
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionKey {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SessionKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Token payload for an authenticated session.
///
/// Times are UNIX seconds. `exp == 0` means the token itself never expires;
/// the store-side expiry still applies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    /// Session key, looked up in the store.
    pub jti: SessionKey,
    /// Identifier of the resource owner the session grants access to.
    pub did: String,
    pub exp: i64,
    pub iat: i64,
    pub nbf: i64,
}

impl AuthSession {
    /// New session for `did`, valid from `now` until `exp`, with a fresh key.
    pub fn issue(did: impl Into<String>, now: i64, exp: i64) -> Self {
        Self {
            jti: SessionKey::new(),
            did: did.into(),
            exp,
            iat: now,
            nbf: now,
        }
    }

    /// Check the embedded not-before and expiry times against `now`.
    pub fn check_window(&self, now: i64) -> AuthResult<()> {
        if now < self.nbf {
            return Err(AuthError::NotYetValid { nbf: self.nbf });
        }
        if self.exp > 0 && now > self.exp {
            return Err(AuthError::Expired { exp: self.exp });
        }
        Ok(())
    }
}

/// A session row as kept by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: i64,
    /// Host the token was issued for.
    pub host: String,
    /// Cleared on revocation.
    pub valid: bool,
    pub key: SessionKey,
    /// Free-form operator note.
    pub note: String,
    /// Store-side expiry (UNIX seconds).
    pub expired: i64,
    pub created: i64,
}

/// Input for recording a new session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSession {
    pub key: SessionKey,
    pub host: String,
    pub note: String,
    pub expired: i64,
    pub created: i64,
}

impl NewSession {
    /// Row matching a freshly issued token: same key, same expiry.
    pub fn for_token(session: &AuthSession) -> Self {
        Self {
            key: session.jti.clone(),
            host: String::new(),
            note: String::new(),
            expired: session.exp,
            created: session.iat,
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }

    pub(crate) fn into_record(self, id: i64) -> SessionRecord {
        SessionRecord {
            id,
            host: self.host,
            valid: true,
            key: self.key,
            note: self.note,
            expired: self.expired,
            created: self.created,
        }
    }
}
