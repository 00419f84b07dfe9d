//! Bearer token authorization.
//!
//! A request is authorized when its token verifies against the secret, its
//! embedded time window covers the request time, and the store holds a valid,
//! unexpired session under its `jti`. Checks run in that order and the first
//! failure is reported.

use bwt::{MessagePack, PayloadCodec, Secret, TokenCodec};
use tracing::debug;

use crate::bearer::bearer_token;
use crate::errors::{AuthError, AuthResult};
use crate::session::AuthSession;
use crate::store::SessionStore;

/// A request that passed every check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizedSession {
    /// Verified token payload.
    pub info: AuthSession,
    /// Store-side expiry of the session.
    pub expired: i64,
}

/// Checks bearer tokens against a secret and a session store.
#[derive(Debug)]
pub struct Authorizer<S, C = MessagePack> {
    secret: Secret,
    codec: TokenCodec<C>,
    store: S,
}

impl<S: SessionStore> Authorizer<S, MessagePack> {
    /// Authorizer for MessagePack tokens.
    pub fn new(secret: Secret, store: S) -> Self {
        Self {
            secret,
            codec: TokenCodec::new(),
            store,
        }
    }
}

impl<S: SessionStore, C: PayloadCodec> Authorizer<S, C> {
    /// Authorizer for tokens serialized with `codec`.
    pub fn with_codec(secret: Secret, store: S, codec: C) -> Self {
        Self {
            secret,
            codec: TokenCodec::with_codec(codec),
            store,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Authorize `token` at UNIX time `now`.
    pub async fn authorize(&self, token: &str, now: i64) -> AuthResult<AuthorizedSession> {
        let info: AuthSession = self
            .codec
            .verify(token, &self.secret)
            .inspect_err(|e| debug!(error = %e, "Rejected token"))?;

        info.check_window(now)
            .inspect_err(|e| debug!(jti = %info.jti, error = %e, "Token outside its window"))?;

        let record = self
            .store
            .lookup(&info.jti)
            .await?
            .ok_or_else(|| AuthError::UnknownSession(info.jti.to_string()))
            .inspect_err(|_| debug!(jti = %info.jti, "No session for token"))?;

        if !record.valid {
            debug!(jti = %info.jti, "Session revoked");
            return Err(AuthError::Revoked(info.jti.to_string()));
        }
        if record.expired > 0 && now > record.expired {
            debug!(jti = %info.jti, expired = record.expired, "Session expired");
            return Err(AuthError::SessionExpired {
                expired: record.expired,
            });
        }

        debug!(jti = %info.jti, did = %info.did, "Authorized session");
        Ok(AuthorizedSession {
            info,
            expired: record.expired,
        })
    }

    /// Authorize the value of an `Authorization` header.
    pub async fn authorize_header(
        &self,
        header: Option<&str>,
        now: i64,
    ) -> AuthResult<AuthorizedSession> {
        let token = header
            .and_then(bearer_token)
            .ok_or(AuthError::MissingBearer)?;
        self.authorize(token, now).await
    }

    /// Authorize `token` at the current wall-clock time.
    pub async fn authorize_now(&self, token: &str) -> AuthResult<AuthorizedSession> {
        self.authorize(token, chrono::Utc::now().timestamp()).await
    }
}
