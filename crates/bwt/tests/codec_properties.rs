//! Property-based tests for the base32hex codec and signed tokens.

use bwt::base32hex::{self, ALPHABET};
use bwt::token::{HEADER_LEN, SALT_LEN};
use bwt::{DecodeError, RawToken, Secret, TokenError};
use proptest::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Session {
    jti: String,
    did: String,
    iat: i64,
    nbf: i64,
    exp: i64,
}

/// Strategy for generating binary data of specified size range.
fn binary_data(min: usize, max: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), min..=max)
}

fn session() -> impl Strategy<Value = Session> {
    (
        "[a-z0-9-]{0,40}",
        "\\PC{0,24}",
        any::<i64>(),
        any::<i64>(),
        any::<i64>(),
    )
        .prop_map(|(jti, did, iat, nbf, exp)| Session {
            jti,
            did,
            iat,
            nbf,
            exp,
        })
}

fn secret() -> impl Strategy<Value = Secret> {
    binary_data(0, 64).prop_map(Secret::new)
}

fn trim_zeros(key: &[u8]) -> &[u8] {
    let end = key.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
    &key[..end]
}

/// Rebuild a token with one bit flipped in the given decoded segment.
fn flip_bit(token: &str, segment: usize, bit: prop::sample::Index) -> String {
    let raw = RawToken::split(token).unwrap();
    let mut parts = [
        raw.salt().to_vec(),
        raw.signature().to_vec(),
        raw.payload().to_vec(),
    ];
    let target = &mut parts[segment];
    let bit = bit.index(target.len() * 8);
    target[bit / 8] ^= 1 << (bit % 8);

    parts.iter().map(|p| base32hex::encode(p)).collect()
}

/// Flip the lowest bit of the last symbol, which is always a spare bit
/// when the input ends in a partial group.
fn flip_last_spare_bit(encoded: &str) -> String {
    let mut bytes = encoded.as_bytes().to_vec();
    let last = bytes.len() - 1;
    let value = ALPHABET.iter().position(|&a| a == bytes[last]).unwrap();
    bytes[last] = ALPHABET[value ^ 1];
    String::from_utf8(bytes).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 1000,
        ..ProptestConfig::default()
    })]

    // ========================================================================
    // Base32hex Properties
    // ========================================================================

    /// decode(encode(b)) == b for every byte sequence.
    #[test]
    fn base32hex_roundtrip(data in binary_data(0, 512)) {
        let encoded = base32hex::encode(&data);
        prop_assert_eq!(base32hex::decode(&encoded).unwrap(), data);
    }

    /// Each remainder class mod 5 is hit explicitly.
    #[test]
    fn base32hex_roundtrip_each_remainder(
        groups in 0usize..20,
        tail in 0usize..5,
        seed in any::<u8>()
    ) {
        let data: Vec<u8> = (0..groups * 5 + tail)
            .map(|i| seed.wrapping_mul(31).wrapping_add(i as u8))
            .collect();
        let encoded = base32hex::encode(&data);
        prop_assert_eq!(base32hex::decode(&encoded).unwrap(), data);
    }

    /// len(encode(b)) == ceil(len(b) * 8 / 5).
    #[test]
    fn base32hex_length_invariant(data in binary_data(0, 512)) {
        let encoded = base32hex::encode(&data);
        prop_assert_eq!(encoded.len(), (data.len() * 8).div_ceil(5));
        prop_assert!(matches!(encoded.len() % 8, 0 | 2 | 4 | 5 | 7));
        prop_assert!(encoded.bytes().all(|b| ALPHABET.contains(&b)));
    }

    /// Any out-of-alphabet character fails decode, at any position.
    #[test]
    fn base32hex_rejects_foreign_symbols(
        data in binary_data(1, 64),
        bad in "[^0-9a-vA-V]",
        pos in any::<prop::sample::Index>()
    ) {
        let mut encoded = base32hex::encode(&data);
        let at = pos.index(encoded.len());
        encoded.replace_range(at..at + 1, &bad);
        let is_invalid_symbol = matches!(
            base32hex::decode(&encoded),
            Err(DecodeError::InvalidSymbol { .. })
        );
        prop_assert!(is_invalid_symbol);
    }

    /// Lengths with remainder 1, 3 or 6 mod 8 fail regardless of content.
    #[test]
    fn base32hex_rejects_impossible_lengths(
        groups in 0usize..16,
        rem in prop::sample::select(vec![1usize, 3, 6]),
        symbol in prop::sample::select(ALPHABET.to_vec())
    ) {
        let len = groups * 8 + rem;
        let text = (symbol as char).to_string().repeat(len);
        prop_assert_eq!(base32hex::decode(&text), Err(DecodeError::InvalidLength { len }));
    }

    /// Each byte string has one encoding: spare bits must stay zero.
    #[test]
    fn base32hex_rejects_spare_bits(
        data in binary_data(1, 64).prop_filter("partial final group", |d| d.len() % 5 != 0)
    ) {
        let tweaked = flip_last_spare_bit(&base32hex::encode(&data));
        prop_assert_eq!(
            base32hex::decode(&tweaked),
            Err(DecodeError::NonCanonical { position: tweaked.len() - 1 })
        );
    }

    // ========================================================================
    // Token Properties
    // ========================================================================

    /// verify(mint(p, s), s) == p.
    #[test]
    fn token_integrity(payload in session(), secret in secret()) {
        let token = bwt::mint(&payload, &secret).unwrap();
        let verified: Session = bwt::verify(&token, &secret).unwrap();
        prop_assert_eq!(verified, payload);
    }

    /// parse(mint(p, s)) == p without the secret.
    #[test]
    fn token_parse_roundtrip(payload in session(), secret in secret()) {
        let token = bwt::mint(&payload, &secret).unwrap();
        let parsed: Session = bwt::parse(&token).unwrap();
        prop_assert_eq!(parsed, payload);
    }

    /// One flipped bit in the signature or payload is reported as forged.
    #[test]
    fn token_tamper_detection(
        payload in session(),
        secret in secret(),
        segment in 1usize..=2,
        bit in any::<prop::sample::Index>()
    ) {
        let token = bwt::mint(&payload, &secret).unwrap();
        let tampered = flip_bit(&token, segment, bit);
        prop_assert_ne!(&tampered, &token);

        let result = bwt::verify::<Session>(&tampered, &secret);
        prop_assert_eq!(result, Err(TokenError::Forged));
    }

    /// Salt is covered by the signature too.
    #[test]
    fn token_salt_tamper_detection(
        payload in session(),
        secret in secret(),
        bit in any::<prop::sample::Index>()
    ) {
        let token = bwt::mint(&payload, &secret).unwrap();
        let tampered = flip_bit(&token, 0, bit);

        let result = bwt::verify::<Session>(&tampered, &secret);
        prop_assert_eq!(result, Err(TokenError::Forged));
    }

    /// A different key yields the forged signal.
    #[test]
    fn token_key_sensitivity(
        payload in session(),
        s1 in binary_data(1, 64),
        s2 in binary_data(1, 64)
    ) {
        // HMAC zero-pads short keys, so trailing zeros do not make a new key
        prop_assume!(trim_zeros(&s1) != trim_zeros(&s2));
        let token = bwt::mint(&payload, &Secret::new(s1)).unwrap();
        let result = bwt::verify::<Session>(&token, &Secret::new(s2));
        prop_assert_eq!(result, Err(TokenError::Forged));
    }

    /// Identical inputs give different tokens that both verify.
    #[test]
    fn token_salt_non_determinism(payload in session(), secret in secret()) {
        let a = bwt::mint(&payload, &secret).unwrap();
        let b = bwt::mint(&payload, &secret).unwrap();
        prop_assert_ne!(&a, &b);
        prop_assert_eq!(bwt::verify::<Session>(&a, &secret).unwrap(), payload.clone());
        prop_assert_eq!(bwt::verify::<Session>(&b, &secret).unwrap(), payload);
    }

    /// Truncated tokens are malformed, never forged.
    #[test]
    fn token_truncation_is_malformed(
        payload in session(),
        secret in secret(),
        keep in any::<prop::sample::Index>()
    ) {
        let token = bwt::mint(&payload, &secret).unwrap();
        let keep = keep.index(HEADER_LEN + 1);
        let result = bwt::verify::<Session>(&token[..keep], &secret);
        prop_assert!(result.unwrap_err().is_malformed());
    }

    /// Alphabet violations are malformed, never forged.
    #[test]
    fn token_foreign_symbol_is_malformed(
        payload in session(),
        secret in secret(),
        bad in "[w-zW-Z!=+/]",
        pos in any::<prop::sample::Index>()
    ) {
        let mut token = bwt::mint(&payload, &secret).unwrap();
        let at = pos.index(token.len());
        token.replace_range(at..at + 1, &bad);

        let result = bwt::verify::<Session>(&token, &secret);
        prop_assert!(result.unwrap_err().is_malformed());
    }
}

#[test]
fn salt_segment_is_eight_symbols() {
    assert_eq!(SALT_LEN, 8);

    let token = bwt::mint(&0u8, &Secret::new(b"k".to_vec())).unwrap();
    let raw = RawToken::split(&token).unwrap();
    assert_eq!(raw.salt().len(), 5);
    assert_eq!(base32hex::decode(&token[..8]).unwrap(), raw.salt());
}

#[test]
fn spare_bit_in_payload_is_malformed() {
    let secret = Secret::new(b"k".to_vec());
    // "a" serializes to two bytes, leaving four spare bits in the last symbol
    let token = bwt::mint("a", &secret).unwrap();
    assert_eq!(bwt::verify::<String>(&token, &secret).unwrap(), "a");

    let tweaked = flip_last_spare_bit(&token);
    let result = bwt::verify::<String>(&tweaked, &secret);
    assert!(result.unwrap_err().is_malformed());
}
