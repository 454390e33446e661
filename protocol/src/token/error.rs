//! Error types for token issuance and verification.
//!
//! A signature that does not match is *not* an error: it comes back as
//! [`Verification::Mismatch`](super::Verification::Mismatch). Everything here
//! means the input could not be checked at all.

use thiserror::Error;

use crate::crypto::{CipherError, DecodingError, KeyError};

/// Errors that can occur while issuing or verifying a token.
#[derive(Debug, Error)]
pub enum TokenError {
    /// Key material could not be generated, loaded or encoded.
    #[error(transparent)]
    Key(#[from] KeyError),

    /// A Base58 or Base64 segment could not be decoded.
    #[error("decoding error: {0}")]
    Decoding(#[from] DecodingError),

    /// The RSA transform refused the input while signing.
    #[error("cipher error: {0}")]
    Cipher(#[from] CipherError),

    /// The token does not split into header, payload and signature.
    #[error("malformed token: expected 3 segments, found {segments}")]
    MalformedToken {
        /// Number of `.`-separated segments actually found.
        segments: usize,
    },

    /// The claim text is not valid JSON.
    #[error("invalid claim: {0}")]
    InvalidClaim(#[from] serde_json::Error),

    /// The claim parsed, but is not a JSON object.
    #[error("invalid claim: expected a JSON object")]
    ClaimNotObject,
}

impl TokenError {
    /// True when the caller sent something unusable, as opposed to a failure
    /// on our side (key store, RSA backend).
    pub fn is_rejected_input(&self) -> bool {
        matches!(
            self,
            TokenError::Decoding(_)
                | TokenError::MalformedToken { .. }
                | TokenError::InvalidClaim(_)
                | TokenError::ClaimNotObject
        )
    }
}
