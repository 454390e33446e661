//! # Token Codec
//!
//! Issues and verifies `header.payload.signature` tokens over a claim.
//!
//! ```text
//!   header    = base58("JWS" + "SHA256")
//!   payload   = base58(utf8(hex(sha256(claim))))
//!   signature = base64(rsa_private(pkcs1_type1(payload)))
//! ```
//!
//! The payload encodes the 64-character hex *string* of the digest, not the
//! raw 32 bytes. The signature is the private-key RSA transform of the payload
//! text itself, with PKCS#1 v1.5 block-type-1 padding and no DigestInfo. Both
//! choices are part of the format and every issued token depends on them.
//!
//! ## What verification checks
//!
//! - the token has exactly three segments (otherwise
//!   [`TokenError::MalformedToken`]),
//! - the signature is valid Base64 (otherwise [`TokenError::Decoding`]),
//! - the payload segment is the one this claim produces,
//! - the signature opens under the public key to that same payload.
//!
//! A failure in the last two is a [`Verification::Mismatch`], never an error.
//!
//! The header is **not** checked. It is not covered by the signature either,
//! so headers can be swapped between tokens without detection. Verifiers that
//! care about the declared algorithm must not trust the header.
//!
//! This is not JOSE/JWS, and the signing scheme is textbook RSA with ad hoc
//! framing. Use RSASSA-PSS with SHA-256 for anything that does not have to
//! interoperate with existing tokens.

mod envelope;
mod error;
mod issue;
mod render;
mod service;
mod verify;

use std::fmt;
use std::str::FromStr;

use crate::config::{SEGMENT_DELIMITER, TOKEN_SEGMENTS};

pub use envelope::{
    issue_request, verify_request, RequestMessage, VerificationReport, MISMATCH_MESSAGE,
    VERIFIED_MESSAGE,
};
pub use error::TokenError;
pub use issue::{header_segment, issue, issue_with_private_key, payload_segment, sign_payload};
pub use service::TokenService;
pub use verify::{verify, verify_with_public_key};

// ---------------------------------------------------------------------------
// Claim
// ---------------------------------------------------------------------------

/// The bytes a token vouches for.
///
/// The codec never looks inside: whatever bytes the claim holds are exactly
/// what gets hashed. Two claims that are equal as JSON but differ in key
/// order or whitespace produce different tokens.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Claim {
    bytes: Vec<u8>,
}

impl Claim {
    /// Claim over the UTF-8 bytes of `text`, taken verbatim.
    pub fn from_text(text: &str) -> Self {
        Self {
            bytes: text.as_bytes().to_vec(),
        }
    }

    /// Claim over arbitrary bytes.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    /// Parses `json` and re-serializes it compactly, keeping key order.
    ///
    /// Pretty-printed and compact renderings of the same object become the
    /// same claim. The value must be a JSON object. The rendering escapes `/`
    /// and prints whole-valued numbers without a fraction, matching tokens
    /// issued by the earlier deployment.
    pub fn from_json_str(json: &str) -> Result<Self, TokenError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        Self::from_json_value(&value)
    }

    /// Compact serialization of an already-parsed JSON object.
    pub fn from_json_value(value: &serde_json::Value) -> Result<Self, TokenError> {
        if !value.is_object() {
            return Err(TokenError::ClaimNotObject);
        }
        Ok(Self {
            bytes: render::to_vec(value)?,
        })
    }

    /// The bytes that get hashed.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

// ---------------------------------------------------------------------------
// Token
// ---------------------------------------------------------------------------

/// A token split into its three segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token {
    header: String,
    payload: String,
    signature: String,
}

impl Token {
    /// Assembles a token from its segments. No validation.
    pub fn from_segments(
        header: impl Into<String>,
        payload: impl Into<String>,
        signature: impl Into<String>,
    ) -> Self {
        Self {
            header: header.into(),
            payload: payload.into(),
            signature: signature.into(),
        }
    }

    /// Splits `text` on `.`. Anything other than three segments is rejected.
    pub fn parse(text: &str) -> Result<Self, TokenError> {
        let segments: Vec<&str> = text.split(SEGMENT_DELIMITER).collect();
        if segments.len() != TOKEN_SEGMENTS {
            return Err(TokenError::MalformedToken {
                segments: segments.len(),
            });
        }
        Ok(Self::from_segments(segments[0], segments[1], segments[2]))
    }

    /// Base58 of the type/algorithm descriptor.
    pub fn header(&self) -> &str {
        &self.header
    }

    /// Base58 of the hex digest of the claim.
    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// Base64 of the RSA block.
    pub fn signature(&self) -> &str {
        &self.signature
    }
}

impl FromStr for Token {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{SEGMENT_DELIMITER}{}{SEGMENT_DELIMITER}{}",
            self.header, self.payload, self.signature
        )
    }
}

// ---------------------------------------------------------------------------
// Verification
// ---------------------------------------------------------------------------

/// Outcome of a verification that ran to completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verification {
    /// The token was issued for this claim under this key.
    Valid,
    /// The token does not match the claim, or was not signed by this key.
    Mismatch,
}

impl Verification {
    /// `true` for [`Verification::Valid`].
    pub fn is_valid(&self) -> bool {
        matches!(self, Verification::Valid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_three_segments() {
        let token: Token = "aaa.bbb.c+/=".parse().unwrap();
        assert_eq!(token.header(), "aaa");
        assert_eq!(token.payload(), "bbb");
        assert_eq!(token.signature(), "c+/=");
        assert_eq!(token.to_string(), "aaa.bbb.c+/=");
    }

    #[test]
    fn test_parse_rejects_wrong_segment_count() {
        for (text, n) in [("", 1), ("a", 1), ("a.b", 2), ("a.b.c.d", 4), ("....", 5)] {
            assert!(
                matches!(Token::parse(text), Err(TokenError::MalformedToken { segments }) if segments == n),
                "{text:?}"
            );
        }
    }

    #[test]
    fn test_parse_allows_empty_segments() {
        let token = Token::parse("..").unwrap();
        assert_eq!(token.header(), "");
        assert_eq!(token.signature(), "");
    }

    #[test]
    fn test_claim_from_json_is_compact_and_keeps_order() {
        let claim = Claim::from_json_str(
            "{\n  \"uniqueId\" : \"1000\",\n  \"name\" : \"test\",\n  \"num\" : \"10\"\n}",
        )
        .unwrap();
        assert_eq!(
            claim.as_bytes(),
            br#"{"uniqueId":"1000","name":"test","num":"10"}"#
        );
    }

    #[test]
    fn test_claim_from_json_escapes_slash_and_drops_whole_fraction() {
        let claim =
            Claim::from_json_str(r#"{"url": "https://x.io/a", "when": "2024/01/02", "n": 3.0}"#)
                .unwrap();
        assert_eq!(
            claim.as_bytes(),
            br#"{"url":"https:\/\/x.io\/a","when":"2024\/01\/02","n":3}"#
        );
        // Already-escaped input lands on the same bytes.
        assert_eq!(
            Claim::from_json_str(r#"{"url":"https:\/\/x.io\/a","when":"2024\/01\/02","n":3}"#)
                .unwrap(),
            claim
        );
    }

    #[test]
    fn test_claim_from_text_is_verbatim() {
        let text = "{ \"a\": 1 }";
        assert_eq!(Claim::from_text(text).as_bytes(), text.as_bytes());
        assert_ne!(
            Claim::from_text(text),
            Claim::from_json_str(text).unwrap()
        );
    }

    #[test]
    fn test_claim_rejects_invalid_json() {
        assert!(matches!(
            Claim::from_json_str("{not json"),
            Err(TokenError::InvalidClaim(_))
        ));
        assert!(matches!(
            Claim::from_json_str("[1, 2]"),
            Err(TokenError::ClaimNotObject)
        ));
    }

    #[test]
    fn test_rejected_input_classification() {
        assert!(TokenError::MalformedToken { segments: 2 }.is_rejected_input());
        assert!(TokenError::ClaimNotObject.is_rejected_input());
        assert!(!TokenError::Key(crate::crypto::KeyError::KeypairMismatch).is_rejected_input());
    }
}
