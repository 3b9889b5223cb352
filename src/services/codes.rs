//! Generation, normalization and hashing of room codes, promo codes and admin tokens.

use rand::Rng;
use sha2::{Digest, Sha256};

/// Characters allowed in room codes.
pub const ROOM_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
pub const ROOM_CODE_LENGTH: usize = 5;

/// Characters allowed in promo codes. `I`, `O`, `0` and `1` are left out.
pub const PROMO_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
pub const PROMO_CODE_LENGTH: usize = 6;

fn random_code(alphabet: &[u8], length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| char::from(alphabet[rng.random_range(0..alphabet.len())]))
        .collect()
}

/// Draw a fresh room code. Uniqueness is enforced by the store.
pub fn generate_room_code() -> String {
    random_code(ROOM_CODE_ALPHABET, ROOM_CODE_LENGTH)
}

/// Draw a fresh promo code. Uniqueness is enforced by the store on the hash.
pub fn generate_promo_code() -> String {
    random_code(PROMO_CODE_ALPHABET, PROMO_CODE_LENGTH)
}

/// Trim and uppercase a user-entered code.
pub fn normalize_code(raw: &str) -> String {
    raw.trim().to_ascii_uppercase()
}

/// Lowercase hex SHA-256 digest of `input`.
pub fn sha256_hex(input: &str) -> String {
    hex::encode(Sha256::digest(input.as_bytes()))
}

/// Compare two secrets without short-circuiting on the first differing byte.
///
/// Inputs of different lengths return `false` before any byte is inspected.
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    let a = a.as_bytes();
    let b = b.as_bytes();
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn room_codes_use_the_room_alphabet() {
        for _ in 0..200 {
            let code = generate_room_code();
            assert_eq!(code.len(), ROOM_CODE_LENGTH);
            assert!(code.bytes().all(|b| ROOM_CODE_ALPHABET.contains(&b)));
        }
    }

    #[test]
    fn promo_codes_skip_ambiguous_characters() {
        for _ in 0..200 {
            let code = generate_promo_code();
            assert_eq!(code.len(), PROMO_CODE_LENGTH);
            assert!(code.bytes().all(|b| PROMO_CODE_ALPHABET.contains(&b)));
            assert!(!code.contains(['I', 'O', '0', '1']));
        }
    }

    #[test]
    fn room_code_collisions_are_rare() {
        // 36^5 ≈ 60M codes; 2 000 draws collide with probability well under 5%.
        let draws = 2_000;
        let unique: HashSet<String> = (0..draws).map(|_| generate_room_code()).collect();
        assert!(unique.len() >= draws - 2);
    }

    #[test]
    fn normalize_trims_and_uppercases() {
        assert_eq!(normalize_code("  ab3k9 \n"), "AB3K9");
    }

    #[test]
    fn sha256_matches_known_vector() {
        assert_eq!(
            sha256_hex("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn constant_time_eq_rejects_length_mismatch() {
        assert!(constant_time_eq("token", "token"));
        assert!(!constant_time_eq("token", "tokens"));
        assert!(!constant_time_eq("", "x"));
        assert!(!constant_time_eq("token", "tokem"));
    }
}
