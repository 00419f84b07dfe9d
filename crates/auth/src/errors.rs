//! Error types for session storage and authorization.

use std::fmt;

use bwt::{MalformedToken, TokenError};
use http::StatusCode;
use thiserror::Error;

/// Result type for authorization.
pub type AuthResult<T> = Result<T, AuthError>;

/// Session store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A session with this key is already recorded.
    #[error("session key already exists: {0}")]
    DuplicateKey(String),

    /// Could not create the database directory or file.
    #[error("failed to prepare session database at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// SQLite reported an error.
    #[error("session database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Internal store error.
    #[error("internal store error: {0}")]
    Internal(String),
}

/// Client-facing error codes.
///
/// Authorization failures only ever produce `UnauthorizedAccess`. The other
/// two belong to the API boundary: a handler reports `UnpermittedAccess` when
/// an authorized session asks for another owner's resource, and
/// `ResourceNotFound` when the session's `did` has nothing to serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// No valid session (401).
    UnauthorizedAccess,
    /// Valid session, resource outside its grant (403).
    UnpermittedAccess,
    /// Valid session, nothing recorded for it (404).
    ResourceNotFound,
}

impl ErrorCode {
    /// Wire form of the code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnauthorizedAccess => "auth#unauthorized-access",
            Self::UnpermittedAccess => "auth#unpermitted-access",
            Self::ResourceNotFound => "error#resource-not-found",
        }
    }

    /// HTTP status that accompanies the code.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::UnauthorizedAccess => StatusCode::UNAUTHORIZED,
            Self::UnpermittedAccess => StatusCode::FORBIDDEN,
            Self::ResourceNotFound => StatusCode::NOT_FOUND,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a bearer token was not accepted.
///
/// Variants are listed in the order the checks run.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No `Authorization: Bearer <token>` header.
    #[error("missing bearer token")]
    MissingBearer,

    /// Not a token at all.
    #[error("malformed token: {0}")]
    Malformed(#[source] MalformedToken),

    /// Signature mismatch: tampered, or minted with another secret.
    #[error("token signature mismatch")]
    Forged,

    /// Embedded `nbf` is still in the future.
    #[error("token not valid before {nbf}")]
    NotYetValid { nbf: i64 },

    /// Embedded `exp` has passed.
    #[error("token expired at {exp}")]
    Expired { exp: i64 },

    /// No session recorded under the token's `jti`.
    #[error("unknown session {0}")]
    UnknownSession(String),

    /// Session was marked invalid.
    #[error("session {0} has been revoked")]
    Revoked(String),

    /// Store-side expiry has passed, independently of the token.
    #[error("session expired at {expired}")]
    SessionExpired { expired: i64 },

    /// The session store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AuthError {
    /// Error code to report to the client, `None` for internal failures.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::Store(_) => None,
            _ => Some(ErrorCode::UnauthorizedAccess),
        }
    }

    /// HTTP status an API boundary should answer with.
    pub fn status(&self) -> StatusCode {
        self.code()
            .map(|code| code.status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Malformed(reason) => Self::Malformed(reason),
            TokenError::Forged => Self::Forged,
            // Only minting serializes; reported as a payload problem if it ever surfaces
            TokenError::Serialize(e) => Self::Malformed(MalformedToken::Payload(e)),
        }
    }
}
