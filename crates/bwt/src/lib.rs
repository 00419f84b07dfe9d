//! Binary Web Tokens
//!
//! Compact, self-verifying bearer tokens. A token is a random salt, an
//! HMAC-SHA1 signature and a serialized payload, each encoded with a
//! lowercase, unpadded base32hex alphabet and laid end to end.
//!
//! - **Codec**: [`base32hex`] converts bytes to text and back, exactly
//! - **Tokens**: [`mint`], [`parse`] (unverified) and [`verify`]
//! - **Payloads**: any serde record, serialized through a [`PayloadCodec`]
//!
//! # Example
//!
//! ```
//! use bwt::{Secret, TokenError};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, PartialEq, Serialize, Deserialize)]
//! struct Claims {
//!     id: String,
//!     exp: i64,
//! }
//!
//! let secret = Secret::new([0u8; 32]);
//! let claims = Claims { id: "abc123".into(), exp: 2000 };
//!
//! let token = bwt::mint(&claims, &secret)?;
//! let verified: Claims = bwt::verify(&token, &secret)?;
//! assert_eq!(verified, claims);
//!
//! let forged = bwt::verify::<Claims>(&token, &Secret::new([0xFFu8; 32]));
//! assert_eq!(forged, Err(TokenError::Forged));
//! # Ok::<(), TokenError>(())
//! ```

// ============================================================================
// Module Declarations
// ============================================================================

pub mod base32hex;
pub mod errors;
pub mod payload;
pub mod secret;
pub mod token;

// ============================================================================
// Public API Re-exports
// ============================================================================

pub use errors::{
    DecodeError, MalformedToken, PayloadError, SecretError, Segment, TokenError, TokenResult,
};
pub use payload::{Json, MessagePack, PayloadCodec};
pub use secret::Secret;
pub use token::{mint, parse, verify, RawToken, TokenCodec};
