//! Structured payload serializers.
//!
//! The token codec only sees byte buffers; any deterministic, round-trip
//! safe encoding of serde records can be plugged in through [`PayloadCodec`].

use std::io::Cursor;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::errors::PayloadError;

/// Serializer used to turn payload records into token bytes and back.
pub trait PayloadCodec {
    /// Serialize a record to bytes.
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, PayloadError>;

    /// Deserialize bytes into a record, consuming all of them.
    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, PayloadError>;
}

/// MessagePack with named fields (records travel as maps).
///
/// This is the default codec: compact, binary and self-describing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MessagePack;

impl PayloadCodec for MessagePack {
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, PayloadError> {
        rmp_serde::to_vec_named(value).map_err(|e| PayloadError::Encode(e.to_string()))
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, PayloadError> {
        let mut cursor = Cursor::new(bytes);
        let value =
            rmp_serde::from_read(&mut cursor).map_err(|e| PayloadError::Decode(e.to_string()))?;

        let consumed = cursor.position() as usize;
        if consumed != bytes.len() {
            return Err(PayloadError::TrailingBytes {
                count: bytes.len() - consumed,
            });
        }

        Ok(value)
    }
}

/// JSON payloads. Larger than MessagePack, but readable once decoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Json;

impl PayloadCodec for Json {
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, PayloadError> {
        serde_json::to_vec(value).map_err(|e| PayloadError::Encode(e.to_string()))
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, PayloadError> {
        serde_json::from_slice(bytes).map_err(|e| PayloadError::Decode(e.to_string()))
    }
}
