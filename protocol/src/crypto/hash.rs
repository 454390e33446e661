//! # Digest Engine
//!
//! SHA-256 over arbitrary bytes, plus the lowercase hex rendering that the
//! token payload is built from.
//!
//! The token format never Base58-encodes the raw 32 digest bytes. It encodes
//! the 64-character hex *string*, so [`digest_hex`] is the function everything
//! else in the token path goes through. Hex rendering keeps the leading zero
//! of every byte (`0x0f` is `"0f"`, never `"f"`); dropping it would shift the
//! whole payload and break every previously issued token.

use sha2::{Digest, Sha256};

use crate::config::DIGEST_LENGTH;

/// Compute the SHA-256 hash of the input data as a fixed-size array.
///
/// # Example
///
/// ```
/// use claimseal_protocol::crypto::sha256;
///
/// let hash = sha256(b"claim");
/// assert_eq!(hash.len(), 32);
/// ```
pub fn sha256(data: &[u8]) -> [u8; DIGEST_LENGTH] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// SHA-256 of `data` rendered as 64 lowercase hex characters.
///
/// # Example
///
/// ```
/// use claimseal_protocol::crypto::digest_hex;
///
/// assert_eq!(
///     digest_hex(b""),
///     "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
/// );
/// ```
pub fn digest_hex(data: &[u8]) -> String {
    hex::encode(sha256(data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DIGEST_HEX_LENGTH;

    #[test]
    fn test_sha256_known_vector() {
        let hash = sha256(b"abc");
        let expected =
            hex::decode("ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad")
                .unwrap();
        assert_eq!(hash.as_slice(), expected.as_slice());
    }

    #[test]
    fn test_digest_hex_empty_input() {
        assert_eq!(
            digest_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn digest_hex_is_lowercase_and_fixed_length() {
        for input in [&b""[..], b"a", b"{\"uniqueId\":\"1000\"}", &[0u8; 1024][..]] {
            let hex_str = digest_hex(input);
            assert_eq!(hex_str.len(), DIGEST_HEX_LENGTH);
            assert!(hex_str
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
        }
    }

    #[test]
    fn test_digest_hex_keeps_leading_zero_nibbles() {
        // SHA-256("abc") contains the byte 0x01 right after 0x8f.
        let hash = sha256(b"abc");
        let rendered = digest_hex(b"abc");
        for (i, byte) in hash.iter().enumerate() {
            assert_eq!(&rendered[i * 2..i * 2 + 2], format!("{byte:02x}"));
        }
        assert!(rendered.starts_with("ba7816bf8f01"));
    }

    #[test]
    fn sha256_deterministic() {
        assert_eq!(sha256(b"claim"), sha256(b"claim"));
        assert_ne!(sha256(b"claim"), sha256(b"Claim"));
    }
}
