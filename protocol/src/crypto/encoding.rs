//! # Text & Binary Encodings
//!
//! Three codecs move bytes through the text fields of a token and through the
//! key files on disk:
//!
//! - **UTF-8** for claim text and for the payload segment before it is fed
//!   to the cipher.
//! - **Base58** (Bitcoin alphabet) for the header and payload segments and
//!   for the persisted key material.
//! - **Base64** (standard alphabet, padded) for the signature segment.
//!
//! All decoders fail with [`DecodingError`]; nothing here panics on hostile
//! input.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use thiserror::Error;

/// Malformed text handed to one of the decoders.
#[derive(Debug, Error)]
pub enum DecodingError {
    /// Input contains characters outside the Base58 alphabet.
    #[error("invalid base58: {0}")]
    Base58(#[from] bs58::decode::Error),

    /// Input is not valid standard Base64.
    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Bytes are not valid UTF-8.
    #[error("invalid utf-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

// ---------------------------------------------------------------------------
// Byte / Text
// ---------------------------------------------------------------------------

/// UTF-8 bytes of `text`.
pub fn text_to_bytes(text: &str) -> Vec<u8> {
    text.as_bytes().to_vec()
}

/// Interpret `bytes` as UTF-8 text.
pub fn bytes_to_text(bytes: &[u8]) -> Result<String, DecodingError> {
    Ok(String::from_utf8(bytes.to_vec())?)
}

// ---------------------------------------------------------------------------
// Base58
// ---------------------------------------------------------------------------

/// Encode bytes with the Bitcoin Base58 alphabet.
///
/// Each leading zero byte becomes a leading `'1'`, so the encoding is
/// lossless for every input, including the empty slice (which encodes to the
/// empty string).
///
/// # Example
///
/// ```
/// use claimseal_protocol::crypto::encoding::{base58_decode, base58_encode};
///
/// let text = base58_encode(&[0, 0, 1]);
/// assert_eq!(text, "112");
/// assert_eq!(base58_decode(&text).unwrap(), vec![0, 0, 1]);
/// ```
pub fn base58_encode(bytes: &[u8]) -> String {
    bs58::encode(bytes).into_string()
}

/// Decode Bitcoin-alphabet Base58 text.
///
/// Rejects `0`, `O`, `I`, `l` and anything else outside the alphabet.
pub fn base58_decode(text: &str) -> Result<Vec<u8>, DecodingError> {
    Ok(bs58::decode(text).into_vec()?)
}

// ---------------------------------------------------------------------------
// Base64
// ---------------------------------------------------------------------------

/// Standard, padded Base64. Used for the signature segment.
pub fn base64_encode(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decode standard, padded Base64.
pub fn base64_decode(text: &str) -> Result<Vec<u8>, DecodingError> {
    Ok(STANDARD.decode(text)?)
}
