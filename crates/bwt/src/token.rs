//! Signed token codec.
//!
//! # Token Format
//!
//! ```text
//! +-------------+------------------+------------------------+
//! | salt (8)    | signature (32)   | payload (variable)     |
//! +-------------+------------------+------------------------+
//! ```
//!
//! Every segment is base32hex text. Segment boundaries come from the fixed
//! encoded lengths of the 5-byte salt and the 20-byte signature; there are
//! no delimiters.
//!
//! - **salt**: 5 fresh random bytes per token
//! - **signature**: `HMAC-SHA1(secret, payload || salt)`
//! - **payload**: the serialized record
//!
//! Tokens are immutable and carry no server-side handle. Revocation is the
//! job of whoever maps the payload onto a session.

use hmac::{Hmac, Mac};
use rand::RngCore;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sha1::Sha1;
use tracing::trace;

use crate::base32hex;
use crate::errors::{MalformedToken, Segment, TokenError, TokenResult};
use crate::payload::{MessagePack, PayloadCodec};
use crate::secret::Secret;

/// Random salt size in bytes.
pub const SALT_BYTES: usize = 5;

/// HMAC-SHA1 digest size in bytes.
pub const SIGNATURE_BYTES: usize = 20;

/// Encoded salt length in symbols.
pub const SALT_LEN: usize = base32hex::encoded_len(SALT_BYTES);

/// Encoded signature length in symbols.
pub const SIGNATURE_LEN: usize = base32hex::encoded_len(SIGNATURE_BYTES);

/// Salt plus signature; a token must be strictly longer than this.
pub const HEADER_LEN: usize = SALT_LEN + SIGNATURE_LEN;

type HmacSha1 = Hmac<Sha1>;

/// A token split into its decoded segments. Nothing is authenticated yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawToken {
    salt: Vec<u8>,
    signature: Vec<u8>,
    payload: Vec<u8>,
}

impl RawToken {
    /// Split token text into segments and decode each one.
    pub fn split(token: &str) -> Result<Self, MalformedToken> {
        if token.len() <= HEADER_LEN {
            return Err(MalformedToken::TooShort { len: token.len() });
        }

        // Segment offsets are byte offsets; they only line up with ASCII
        if let Some(position) = token.bytes().position(|b| !b.is_ascii()) {
            return Err(MalformedToken::NonAscii { position });
        }

        let (salt, rest) = token.split_at(SALT_LEN);
        let (signature, payload) = rest.split_at(SIGNATURE_LEN);

        Ok(Self {
            salt: decode_segment(salt, Segment::Salt)?,
            signature: decode_segment(signature, Segment::Signature)?,
            payload: decode_segment(payload, Segment::Payload)?,
        })
    }

    pub fn salt(&self) -> &[u8] {
        &self.salt
    }

    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    /// Serialized payload bytes.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Recompute the signature and compare in constant time.
    pub fn check_signature(&self, secret: &Secret) -> TokenResult<()> {
        signer(secret, &self.payload, &self.salt)
            .verify_slice(&self.signature)
            .map_err(|_| TokenError::Forged)
    }
}

fn decode_segment(text: &str, segment: Segment) -> Result<Vec<u8>, MalformedToken> {
    base32hex::decode(text).map_err(|source| MalformedToken::Segment { segment, source })
}

/// HMAC state over `payload || salt`, ready to finalize or verify.
fn signer(secret: &Secret, payload: &[u8], salt: &[u8]) -> HmacSha1 {
    let mut mac =
        HmacSha1::new_from_slice(secret.as_bytes()).expect("HMAC accepts keys of any length");
    mac.update(payload);
    mac.update(salt);
    mac
}

/// Mints, parses and verifies tokens with a chosen payload serializer.
///
/// The codec is stateless; the same value can be shared freely between
/// threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenCodec<C = MessagePack> {
    codec: C,
}

impl TokenCodec<MessagePack> {
    /// Codec using the default MessagePack serializer.
    pub fn new() -> Self {
        Self { codec: MessagePack }
    }
}

impl<C: PayloadCodec> TokenCodec<C> {
    /// Codec using a custom payload serializer.
    pub fn with_codec(codec: C) -> Self {
        Self { codec }
    }

    /// Serialize, salt and sign `payload` into token text.
    pub fn mint<T: Serialize + ?Sized>(&self, payload: &T, secret: &Secret) -> TokenResult<String> {
        let mut salt = [0u8; SALT_BYTES];
        rand::thread_rng().fill_bytes(&mut salt);
        self.mint_with_salt(payload, secret, &salt)
    }

    fn mint_with_salt<T: Serialize + ?Sized>(
        &self,
        payload: &T,
        secret: &Secret,
        salt: &[u8; SALT_BYTES],
    ) -> TokenResult<String> {
        let raw = self.codec.encode(payload).map_err(TokenError::Serialize)?;
        let signature = signer(secret, &raw, salt).finalize().into_bytes();

        let mut token = String::with_capacity(HEADER_LEN + base32hex::encoded_len(raw.len()));
        base32hex::encode_into(&mut token, salt);
        base32hex::encode_into(&mut token, &signature);
        base32hex::encode_into(&mut token, &raw);

        trace!(payload_bytes = raw.len(), token_len = token.len(), "Minted token");
        Ok(token)
    }

    /// Decode a token without checking its signature.
    ///
    /// Only for contexts that verify separately, or for display. The result
    /// is whatever the bearer put there.
    pub fn parse<T: DeserializeOwned>(&self, token: &str) -> TokenResult<T> {
        let raw = RawToken::split(token)?;
        self.decode_payload(&raw)
    }

    /// Decode a token and check its signature against `secret`.
    ///
    /// The signature is checked before the payload is deserialized, so any
    /// change to a structurally valid token reports [`TokenError::Forged`]
    /// even when the altered bytes would no longer deserialize.
    pub fn verify<T: DeserializeOwned>(&self, token: &str, secret: &Secret) -> TokenResult<T> {
        let raw = RawToken::split(token).inspect_err(|e| trace!(error = %e, "Malformed token"))?;
        raw.check_signature(secret)
            .inspect_err(|_| trace!("Token signature mismatch"))?;
        self.decode_payload(&raw)
    }

    fn decode_payload<T: DeserializeOwned>(&self, raw: &RawToken) -> TokenResult<T> {
        self.codec
            .decode(raw.payload())
            .map_err(|e| TokenError::Malformed(MalformedToken::Payload(e)))
    }
}

/// Mint a token with the default MessagePack serializer.
pub fn mint<T: Serialize + ?Sized>(payload: &T, secret: &Secret) -> TokenResult<String> {
    TokenCodec::new().mint(payload, secret)
}

/// Decode a MessagePack token without verifying it.
pub fn parse<T: DeserializeOwned>(token: &str) -> TokenResult<T> {
    TokenCodec::new().parse(token)
}

/// Decode and verify a MessagePack token.
pub fn verify<T: DeserializeOwned>(token: &str, secret: &Secret) -> TokenResult<T> {
    TokenCodec::new().verify(token, secret)
}
