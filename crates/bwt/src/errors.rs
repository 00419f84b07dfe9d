//! Error types for the token codec.

use std::fmt;

use thiserror::Error;

/// Result type for token operations.
pub type TokenResult<T> = Result<T, TokenError>;

/// Errors from decoding base32hex text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// A character outside the 32-symbol alphabet.
    #[error("invalid symbol {symbol:?} at position {position}")]
    InvalidSymbol { symbol: char, position: usize },

    /// Length with remainder 1, 3 or 6 modulo 8 cannot come out of the encoder.
    #[error("invalid encoded length {len}")]
    InvalidLength { len: usize },

    /// The last symbol of a partial group sets bits past the final byte.
    #[error("non-zero padding bits in symbol at position {position}")]
    NonCanonical { position: usize },
}

/// Errors from the structured payload serializer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayloadError {
    /// Failed to serialize the payload.
    #[error("failed to encode payload: {0}")]
    Encode(String),

    /// Bytes do not deserialize into the requested shape.
    #[error("failed to decode payload: {0}")]
    Decode(String),

    /// The payload decoded but left bytes unconsumed.
    #[error("{count} trailing byte(s) after payload")]
    TrailingBytes { count: usize },
}

/// Errors from loading a signing secret.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SecretError {
    /// The secret is not valid base64.
    #[error("secret is not valid base64: {0}")]
    InvalidBase64(String),

    /// The secret decoded to zero bytes.
    #[error("secret is empty")]
    Empty,
}

/// Token segment, used to locate structural failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    Salt,
    Signature,
    Payload,
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Salt => f.write_str("salt"),
            Segment::Signature => f.write_str("signature"),
            Segment::Payload => f.write_str("payload"),
        }
    }
}

/// Reasons a string is not a token at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedToken {
    /// Too short to hold the salt, the signature and a payload.
    #[error("token too short: {len} symbols")]
    TooShort { len: usize },

    /// Tokens are pure ASCII; anything else cannot be split into segments.
    #[error("non-ASCII character at position {position}")]
    NonAscii { position: usize },

    /// A segment failed base32hex decoding.
    #[error("{segment} segment: {source}")]
    Segment {
        segment: Segment,
        #[source]
        source: DecodeError,
    },

    /// The payload bytes do not deserialize into the expected record.
    #[error("payload: {0}")]
    Payload(#[source] PayloadError),
}

/// Outcome of a failed mint, parse or verify.
///
/// `Malformed` and `Forged` are deliberately separate: the first means the
/// input is not a token, the second means it is one but must not be trusted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    /// Structurally invalid token.
    #[error("malformed token: {0}")]
    Malformed(#[from] MalformedToken),

    /// Signature does not match: tampered, or signed with another key.
    #[error("token signature mismatch")]
    Forged,

    /// The payload could not be serialized while minting.
    #[error("cannot mint token: {0}")]
    Serialize(#[source] PayloadError),
}

impl TokenError {
    /// Check if the input was not a token at all.
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed(_))
    }

    /// Check if the token failed signature verification.
    pub fn is_forged(&self) -> bool {
        matches!(self, Self::Forged)
    }
}
