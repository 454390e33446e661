//! Token issuance.

use crate::config::header_descriptor;
use crate::crypto::cipher::encrypt_text_with_private;
use crate::crypto::encoding::base58_encode;
use crate::crypto::hash::digest_hex;
use crate::crypto::keys::{KeyPair, PrivateKey};

use super::{Claim, Token, TokenError};

/// The header segment. The same for every token.
pub fn header_segment() -> String {
    base58_encode(header_descriptor().as_bytes())
}

/// The payload segment for `claim`: Base58 of the UTF-8 bytes of the hex
/// digest.
pub fn payload_segment(claim: &Claim) -> String {
    base58_encode(digest_hex(claim.as_bytes()).as_bytes())
}

/// The signature segment for a payload segment.
pub fn sign_payload(payload: &str, key: &PrivateKey) -> Result<String, TokenError> {
    Ok(encrypt_text_with_private(key, payload)?)
}

/// Issues a token for `claim` under `key_pair`.
///
/// Deterministic: the same claim and key pair always give the same token.
///
/// # Example
///
/// ```no_run
/// use claimseal_protocol::crypto::{KeyAlgorithm, KeyPair};
/// use claimseal_protocol::token::{issue, verify, Claim};
///
/// let kp = KeyPair::generate(KeyAlgorithm::Rsa, 2048).unwrap();
/// let claim = Claim::from_text(r#"{"uniqueId":"1000","name":"test","num":"10"}"#);
/// let token = issue(&claim, &kp).unwrap();
/// assert!(verify(&claim, &token.to_string(), &kp).unwrap().is_valid());
/// ```
pub fn issue(claim: &Claim, key_pair: &KeyPair) -> Result<Token, TokenError> {
    issue_with_private_key(claim, key_pair.private_key())
}

/// [`issue`] with only the private half at hand.
pub fn issue_with_private_key(claim: &Claim, key: &PrivateKey) -> Result<Token, TokenError> {
    let header = header_segment();
    let payload = payload_segment(claim);
    let signature = sign_payload(&payload, key)?;
    Ok(Token::from_segments(header, payload, signature))
}
