//! Session-backed authorization for Binary Web Tokens.
//!
//! Tokens are stateless; this crate adds the server side. Each issued token
//! carries an [`AuthSession`] whose `jti` names a row in a [`SessionStore`],
//! and the [`Authorizer`] accepts a token only while that row is valid.
//!
//! Two stores are provided: [`MemorySessionStore`] for tests and embedding,
//! and [`SqliteSessionStore`] for a persistent session database.

// ============================================================================
// Module Declarations
// ============================================================================

pub mod authorize;
pub mod bearer;
pub mod errors;
pub mod session;
pub mod store;

// ============================================================================
// Public API Re-exports
// ============================================================================

pub use authorize::{AuthorizedSession, Authorizer};
pub use bearer::bearer_token;
pub use errors::{AuthError, AuthResult, ErrorCode, StoreError};
pub use session::{AuthSession, NewSession, SessionKey, SessionRecord};
pub use store::{MemorySessionStore, SessionStore, SqliteSessionStore};
