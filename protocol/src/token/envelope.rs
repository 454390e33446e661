//! Request-message envelope: a token shipped together with the claim it
//! covers.
//!
//! ```json
//! {
//!   "type": "JWS",
//!   "alg": "SHA256",
//!   "credentialSubject": { "uniqueId": "1000", "name": "test", "num": "10" },
//!   "jws": "wtEhRDrZpioF.29Le3Y….BSrz…==",
//!   "publicKey": "2TuPVg…"
//! }
//! ```
//!
//! The claim bytes are `credentialSubject` re-serialized as compact JSON in
//! document order, so an envelope verifies no matter how it was indented in
//! transit or whether its slashes arrived escaped. Reordering the keys of
//! `credentialSubject` does break it.
//!
//! `publicKey` is informational. Verification always uses the local key: a
//! key carried inside the message proves nothing about who signed it.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{TOKEN_ALG, TOKEN_TYPE};
use crate::crypto::keys::KeyPair;

use super::{issue, verify, Claim, TokenError, Verification};

/// Message returned when verification succeeds.
pub const VERIFIED_MESSAGE: &str = "verification succeeded";

/// Message returned when verification completes with a mismatch.
pub const MISMATCH_MESSAGE: &str = "verification failed";

/// A signed claim as it travels between services.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestMessage {
    /// Token type tag, `"JWS"`.
    #[serde(rename = "type", default = "default_type")]
    pub token_type: String,
    /// Digest algorithm tag, `"SHA256"`.
    #[serde(default = "default_alg")]
    pub alg: String,
    /// The claim, as a JSON object.
    pub credential_subject: serde_json::Value,
    /// The token over `credential_subject`.
    pub jws: String,
    /// Base58 public key of the issuer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
}

fn default_type() -> String {
    TOKEN_TYPE.to_string()
}

fn default_alg() -> String {
    TOKEN_ALG.to_string()
}

impl RequestMessage {
    /// Parses an envelope from JSON text.
    pub fn from_json(text: &str) -> Result<Self, TokenError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String, TokenError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// The claim bytes this envelope's token covers.
    pub fn claim(&self) -> Result<Claim, TokenError> {
        Claim::from_json_value(&self.credential_subject)
    }
}

/// Result of checking an envelope, ready to hand back to a caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationReport {
    /// Whether the token matched.
    pub verified: bool,
    /// Human-readable outcome.
    pub message: String,
}

impl From<Verification> for VerificationReport {
    fn from(outcome: Verification) -> Self {
        let message = match outcome {
            Verification::Valid => VERIFIED_MESSAGE,
            Verification::Mismatch => MISMATCH_MESSAGE,
        };
        Self {
            verified: outcome.is_valid(),
            message: message.to_string(),
        }
    }
}

/// Issues a token over `claim_json` and wraps it in an envelope that also
/// carries the claim and the issuer's public key.
pub fn issue_request(claim_json: &str, key_pair: &KeyPair) -> Result<RequestMessage, TokenError> {
    let credential_subject: serde_json::Value = serde_json::from_str(claim_json)?;
    let claim = Claim::from_json_value(&credential_subject)?;
    let token = issue(&claim, key_pair)?;

    Ok(RequestMessage {
        token_type: TOKEN_TYPE.to_string(),
        alg: TOKEN_ALG.to_string(),
        credential_subject,
        jws: token.to_string(),
        public_key: Some(key_pair.public_key_base58()?),
    })
}

/// Verifies the token inside `request` against its own claim.
pub fn verify_request(
    request: &RequestMessage,
    key_pair: &KeyPair,
) -> Result<VerificationReport, TokenError> {
    if request.token_type != TOKEN_TYPE || request.alg != TOKEN_ALG {
        debug!(
            token_type = %request.token_type,
            alg = %request.alg,
            "envelope declares unexpected type or alg, ignored"
        );
    }
    let claim = request.claim()?;
    let outcome = verify(&claim, &request.jws, key_pair)?;
    Ok(outcome.into())
}
