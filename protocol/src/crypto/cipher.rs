//! # Asymmetric Cipher
//!
//! Raw RSA transforms with PKCS#1 v1.5 padding, in both directions.
//!
//! The token format signs by "encrypting with the private key": the payload
//! is wrapped in a block-type-1 padding (`00 01 FF..FF 00 || message`) and
//! raised to the private exponent. There is no DigestInfo prefix and no hash
//! inside the primitive. Verification raises the signature to the public
//! exponent, strips the padding and hands back the message.
//!
//! This is textbook RSA signing with ad hoc framing, kept bit-for-bit because
//! every token already issued depends on it. A new format should use
//! RSASSA-PSS with SHA-256 instead.
//!
//! The other direction (public-key encryption, private-key decryption, block
//! type 2, randomized) is here as well for callers that need to hand a
//! confidential value to the key holder.

use rand::rngs::OsRng;
use rsa::traits::PublicKeyParts;
use rsa::{BigUint, Pkcs1v15Encrypt, Pkcs1v15Sign};
use thiserror::Error;

use super::encoding::{base64_decode, base64_encode, bytes_to_text, DecodingError};
use super::keys::{PrivateKey, PublicKey};

/// PKCS#1 v1.5 framing overhead: two marker bytes, the zero separator and at
/// least eight padding bytes.
pub const PKCS1_OVERHEAD: usize = 11;

/// Errors from the RSA transforms.
#[derive(Debug, Error)]
pub enum CipherError {
    /// The input does not fit in one block for this modulus.
    #[error("message of {len} bytes does not fit a {modulus_bytes}-byte modulus")]
    MessageTooLong {
        /// Message length in bytes.
        len: usize,
        /// Modulus length in bytes.
        modulus_bytes: usize,
    },

    /// A ciphertext block must be exactly as long as the modulus.
    #[error("ciphertext is {len} bytes, expected {modulus_bytes}")]
    InvalidLength {
        /// Ciphertext length in bytes.
        len: usize,
        /// Modulus length in bytes.
        modulus_bytes: usize,
    },

    /// The ciphertext, read as an integer, is not below the modulus.
    #[error("ciphertext is out of range for this modulus")]
    OutOfRange,

    /// The recovered block does not carry the expected padding.
    #[error("invalid PKCS#1 v1.5 padding")]
    InvalidPadding,

    /// Base64 or UTF-8 framing around the block was malformed.
    #[error(transparent)]
    Decoding(#[from] DecodingError),

    /// The RSA backend reported an error.
    #[error("rsa backend error: {0}")]
    Backend(String),
}

// ---------------------------------------------------------------------------
// Private-key direction (signing)
// ---------------------------------------------------------------------------

/// Pad `plaintext` with block type 1 and apply the private-key transform.
///
/// Deterministic: the same key and input always produce the same block.
pub fn encrypt_with_private(key: &PrivateKey, plaintext: &[u8]) -> Result<Vec<u8>, CipherError> {
    let modulus_bytes = key.as_rsa().size();
    if plaintext.len() + PKCS1_OVERHEAD > modulus_bytes {
        return Err(CipherError::MessageTooLong {
            len: plaintext.len(),
            modulus_bytes,
        });
    }
    key.as_rsa()
        .sign(Pkcs1v15Sign::new_unprefixed(), plaintext)
        .map_err(|e| CipherError::Backend(e.to_string()))
}

/// Apply the public-key transform to a block made by
/// [`encrypt_with_private`] and strip its padding.
pub fn decrypt_with_public(key: &PublicKey, ciphertext: &[u8]) -> Result<Vec<u8>, CipherError> {
    let rsa_key = key.as_rsa();
    let modulus_bytes = rsa_key.size();
    if ciphertext.len() != modulus_bytes {
        return Err(CipherError::InvalidLength {
            len: ciphertext.len(),
            modulus_bytes,
        });
    }

    let c = BigUint::from_bytes_be(ciphertext);
    if &c >= rsa_key.n() {
        return Err(CipherError::OutOfRange);
    }
    let m = c.modpow(rsa_key.e(), rsa_key.n());

    let block = left_pad(&m.to_bytes_be(), modulus_bytes)?;
    strip_type1_padding(&block).map(<[u8]>::to_vec)
}

/// [`encrypt_with_private`] over UTF-8 text, Base64-encoding the result.
pub fn encrypt_text_with_private(key: &PrivateKey, plaintext: &str) -> Result<String, CipherError> {
    Ok(base64_encode(&encrypt_with_private(key, plaintext.as_bytes())?))
}

/// Inverse of [`encrypt_text_with_private`].
pub fn decrypt_text_with_public(key: &PublicKey, ciphertext: &str) -> Result<String, CipherError> {
    let block = base64_decode(ciphertext)?;
    Ok(bytes_to_text(&decrypt_with_public(key, &block)?)?)
}

// ---------------------------------------------------------------------------
// Public-key direction (confidentiality)
// ---------------------------------------------------------------------------

/// Encrypt `plaintext` to the key holder (block type 2, random padding).
pub fn encrypt_with_public(key: &PublicKey, plaintext: &[u8]) -> Result<Vec<u8>, CipherError> {
    let modulus_bytes = key.size_bytes();
    if plaintext.len() + PKCS1_OVERHEAD > modulus_bytes {
        return Err(CipherError::MessageTooLong {
            len: plaintext.len(),
            modulus_bytes,
        });
    }
    key.as_rsa()
        .encrypt(&mut OsRng, Pkcs1v15Encrypt, plaintext)
        .map_err(|e| CipherError::Backend(e.to_string()))
}

/// Decrypt a block made by [`encrypt_with_public`].
pub fn decrypt_with_private(key: &PrivateKey, ciphertext: &[u8]) -> Result<Vec<u8>, CipherError> {
    let modulus_bytes = key.as_rsa().size();
    if ciphertext.len() != modulus_bytes {
        return Err(CipherError::InvalidLength {
            len: ciphertext.len(),
            modulus_bytes,
        });
    }
    key.as_rsa()
        .decrypt(Pkcs1v15Encrypt, ciphertext)
        .map_err(|_| CipherError::InvalidPadding)
}

/// [`encrypt_with_public`] over UTF-8 text, Base64-encoding the result.
pub fn encrypt_text_with_public(key: &PublicKey, plaintext: &str) -> Result<String, CipherError> {
    Ok(base64_encode(&encrypt_with_public(key, plaintext.as_bytes())?))
}

/// Inverse of [`encrypt_text_with_public`].
pub fn decrypt_text_with_private(key: &PrivateKey, ciphertext: &str) -> Result<String, CipherError> {
    let block = base64_decode(ciphertext)?;
    Ok(bytes_to_text(&decrypt_with_private(key, &block)?)?)
}

// ---------------------------------------------------------------------------
// Padding helpers
// ---------------------------------------------------------------------------

fn left_pad(bytes: &[u8], len: usize) -> Result<Vec<u8>, CipherError> {
    // `to_bytes_be` of zero is `[0]`; trim so the length check is exact.
    let first_nonzero = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len());
    let trimmed = &bytes[first_nonzero..];
    if trimmed.len() > len {
        return Err(CipherError::InvalidPadding);
    }
    let mut out = vec![0u8; len - trimmed.len()];
    out.extend_from_slice(trimmed);
    Ok(out)
}

/// `00 01 FF{8,} 00 || message` -> `message`.
fn strip_type1_padding(block: &[u8]) -> Result<&[u8], CipherError> {
    if block.len() < PKCS1_OVERHEAD || block[0] != 0x00 || block[1] != 0x01 {
        return Err(CipherError::InvalidPadding);
    }
    let body = &block[2..];
    let separator = body
        .iter()
        .position(|&b| b != 0xff)
        .ok_or(CipherError::InvalidPadding)?;
    if separator < 8 || body[separator] != 0x00 {
        return Err(CipherError::InvalidPadding);
    }
    Ok(&body[separator + 1..])
}
