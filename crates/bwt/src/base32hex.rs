//! Base32hex byte/text codec.
//!
//! Uses the RFC 4648 "extended hex" alphabet in lowercase and never emits
//! padding. Input is processed in 5-byte groups, each becoming 8 symbols
//! (MSB first). The final partial group is cut short, so the encoded length
//! alone tells the decoder how many bytes it carries:
//!
//! ```text
//! bytes in group     1  2  3  4  5
//! symbols emitted    2  4  5  7  8
//! ```
//!
//! Remainders of 1, 3 and 6 symbols never come out of the encoder and are
//! rejected on decode, as is a final symbol whose unused low bits are not
//! zero. Every byte string therefore has exactly one encoding, up to case.

use crate::errors::DecodeError;

/// The 32-symbol alphabet; position is the 5-bit value.
pub const ALPHABET: &[u8; 32] = b"0123456789abcdefghijklmnopqrstuv";

const INVALID: u8 = 0xFF;

/// ASCII byte -> 5-bit value, `INVALID` for anything outside the alphabet.
const DECODE_TABLE: [u8; 256] = build_decode_table();

/// Symbols emitted for a group of `n` bytes.
const SYMBOLS_PER_BYTES: [usize; 6] = [0, 2, 4, 5, 7, 8];

/// Bytes carried by a group of `n` symbols, `None` for impossible lengths.
const BYTES_PER_SYMBOLS: [Option<usize>; 9] = [
    Some(0),
    None,
    Some(1),
    None,
    Some(2),
    Some(3),
    None,
    Some(4),
    Some(5),
];

const fn build_decode_table() -> [u8; 256] {
    let mut table = [INVALID; 256];
    let mut i = 0;
    while i < ALPHABET.len() {
        let symbol = ALPHABET[i];
        table[symbol as usize] = i as u8;
        table[symbol.to_ascii_uppercase() as usize] = i as u8;
        i += 1;
    }
    table
}

/// Length of the encoding of `n` bytes, i.e. `ceil(n * 8 / 5)`.
pub const fn encoded_len(n: usize) -> usize {
    n / 5 * 8 + SYMBOLS_PER_BYTES[n % 5]
}

/// Number of bytes encoded by `n` symbols, `None` if no input encodes to
/// that length.
pub const fn decoded_len(n: usize) -> Option<usize> {
    match BYTES_PER_SYMBOLS[n % 8] {
        Some(tail) => Some(n / 8 * 5 + tail),
        None => None,
    }
}

/// Encode bytes as lowercase base32hex without padding.
pub fn encode(data: &[u8]) -> String {
    let mut out = String::with_capacity(encoded_len(data.len()));
    encode_into(&mut out, data);
    out
}

/// Append the encoding of `data` to `out`.
pub fn encode_into(out: &mut String, data: &[u8]) {
    out.reserve(encoded_len(data.len()));

    for chunk in data.chunks(5) {
        // Missing trailing bits of a partial group read as zero
        let mut group = [0u8; 5];
        group[..chunk.len()].copy_from_slice(chunk);

        let values = split_group(&group);
        for &value in &values[..SYMBOLS_PER_BYTES[chunk.len()]] {
            out.push(ALPHABET[value as usize] as char);
        }
    }
}

/// Decode base32hex text (either case) back to bytes.
pub fn decode(text: &str) -> Result<Vec<u8>, DecodeError> {
    if let Some((position, symbol)) = text
        .char_indices()
        .find(|&(_, c)| !c.is_ascii() || DECODE_TABLE[c as usize] == INVALID)
    {
        return Err(DecodeError::InvalidSymbol { symbol, position });
    }

    // All ASCII from here on, so byte length == symbol count
    let input = text.as_bytes();
    let len = decoded_len(input.len()).ok_or(DecodeError::InvalidLength { len: input.len() })?;

    let mut out = Vec::with_capacity(len);
    for (index, chunk) in input.chunks(8).enumerate() {
        let mut values = [0u8; 8];
        for (value, &symbol) in values.iter_mut().zip(chunk) {
            *value = DECODE_TABLE[symbol as usize];
        }

        let group = join_group(&values);
        let n = BYTES_PER_SYMBOLS[chunk.len()].unwrap_or(0);

        // Only a partial group has spare bits, all in its last symbol
        if n < 5 {
            let mut kept = [0u8; 5];
            kept[..n].copy_from_slice(&group[..n]);
            let last = chunk.len() - 1;
            if split_group(&kept)[last] != values[last] {
                return Err(DecodeError::NonCanonical {
                    position: index * 8 + last,
                });
            }
        }
        out.extend_from_slice(&group[..n]);
    }

    debug_assert_eq!(out.len(), len);
    Ok(out)
}

/// Slice 40 bits into eight 5-bit values, most significant first.
fn split_group(b: &[u8; 5]) -> [u8; 8] {
    [
        b[0] >> 3,
        ((b[0] & 0x07) << 2) | (b[1] >> 6),
        (b[1] & 0x3E) >> 1,
        ((b[1] & 0x01) << 4) | (b[2] >> 4),
        ((b[2] & 0x0F) << 1) | (b[3] >> 7),
        (b[3] & 0x7C) >> 2,
        ((b[3] & 0x03) << 3) | (b[4] >> 5),
        b[4] & 0x1F,
    ]
}

/// Inverse of [`split_group`]; every value must be below 32.
fn join_group(v: &[u8; 8]) -> [u8; 5] {
    [
        (v[0] << 3) | (v[1] >> 2),
        ((v[1] & 0x03) << 6) | (v[2] << 1) | (v[3] >> 4),
        ((v[3] & 0x0F) << 4) | (v[4] >> 1),
        ((v[4] & 0x01) << 7) | (v[5] << 2) | (v[6] >> 3),
        ((v[6] & 0x07) << 5) | v[7],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    // RFC 4648 section 10, lowercased and unpadded
    const VECTORS: &[(&str, &str)] = &[
        ("", ""),
        ("f", "co"),
        ("fo", "cpng"),
        ("foo", "cpnmu"),
        ("foob", "cpnmuog"),
        ("fooba", "cpnmuoj1"),
        ("foobar", "cpnmuoj1e8"),
    ];

    #[test]
    fn test_rfc4648_vectors() {
        for (plain, encoded) in VECTORS {
            assert_eq!(encode(plain.as_bytes()), *encoded, "encode {:?}", plain);
            assert_eq!(decode(encoded).unwrap(), plain.as_bytes(), "decode {:?}", encoded);
        }
    }

    #[test]
    fn test_decode_is_case_insensitive() {
        assert_eq!(decode("CPNMUOJ1E8").unwrap(), b"foobar");
        assert_eq!(decode("CpNmUoJ1e8").unwrap(), b"foobar");
    }

    #[test]
    fn test_encode_is_lowercase() {
        let encoded = encode(&[0xFF; 10]);
        assert_eq!(encoded, "vvvvvvvvvvvvvvvv");
    }

    #[test]
    fn test_every_remainder_class_roundtrips() {
        let data: Vec<u8> = (0u8..=255).collect();
        for len in 0..=20 {
            for start in [0usize, 7, 128, 235] {
                let slice = &data[start..start + len];
                let encoded = encode(slice);
                assert_eq!(encoded.len(), encoded_len(len));
                assert_eq!(decode(&encoded).unwrap(), slice, "len {} start {}", len, start);
            }
        }
    }

    #[test]
    fn test_four_byte_tail_uses_seven_symbols() {
        let encoded = encode(&[0xDE, 0xAD, 0xBE, 0xEF]);
        assert_eq!(encoded.len(), 7);
        assert_eq!(decode(&encoded).unwrap(), [0xDE, 0xAD, 0xBE, 0xEF]);
    }

    #[test]
    fn test_rejects_impossible_lengths() {
        for len in [1usize, 3, 6, 9, 11, 14] {
            let text = "0".repeat(len);
            assert_eq!(decode(&text), Err(DecodeError::InvalidLength { len }));
        }
    }

    #[test]
    fn test_rejects_symbols_outside_alphabet() {
        assert_eq!(
            decode("cpnw"),
            Err(DecodeError::InvalidSymbol { symbol: 'w', position: 3 })
        );
        assert_eq!(
            decode("c="),
            Err(DecodeError::InvalidSymbol { symbol: '=', position: 1 })
        );
        assert!(matches!(
            decode("cé"),
            Err(DecodeError::InvalidSymbol { symbol: 'é', .. })
        ));
    }

    #[test]
    fn test_rejects_non_zero_padding_bits() {
        // "f" is "co"; 'o' leaves its two low bits unused
        assert_eq!(decode("cp"), Err(DecodeError::NonCanonical { position: 1 }));
        assert_eq!(decode("cv"), Err(DecodeError::NonCanonical { position: 1 }));
        assert_eq!(decode("CO").unwrap(), b"f");

        // 4-byte tail: three spare bits in the seventh symbol
        let encoded = encode(&[0xDE, 0xAD, 0xBE, 0xEF]);
        let mut tweaked = encoded.into_bytes();
        tweaked[6] = ALPHABET[(DECODE_TABLE[tweaked[6] as usize] ^ 0x01) as usize];
        let tweaked = String::from_utf8(tweaked).unwrap();
        assert_eq!(decode(&tweaked), Err(DecodeError::NonCanonical { position: 6 }));

        // Full groups have no spare bits
        assert_eq!(decode("vvvvvvvv").unwrap(), [0xFF; 5]);
    }

    #[test]
    fn test_length_helpers() {
        assert_eq!(encoded_len(0), 0);
        assert_eq!(encoded_len(5), 8);
        assert_eq!(encoded_len(20), 32);
        assert_eq!(decoded_len(8), Some(5));
        assert_eq!(decoded_len(32), Some(20));
        assert_eq!(decoded_len(15), Some(9));
        assert_eq!(decoded_len(6), None);
    }
}
