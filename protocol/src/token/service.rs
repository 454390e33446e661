//! [`TokenService`]: issuance and verification bound to a key store.

use std::sync::Arc;

use tracing::{debug, info};

use crate::crypto::keys::KeyPair;
use crate::keystore::KeyPairManager;

use super::{
    issue, issue_request, verify, verify_request, Claim, RequestMessage, Token, TokenError,
    Verification, VerificationReport,
};

/// Issues and verifies tokens with the key pair held by a [`KeyPairManager`].
///
/// Every call goes through [`KeyPairManager::ensure_key_pair`], so the first
/// use on an empty key directory generates the pair. Cheap to clone.
#[derive(Debug, Clone)]
pub struct TokenService {
    keys: Arc<KeyPairManager>,
}

impl TokenService {
    /// Wraps a shared key store.
    pub fn new(keys: Arc<KeyPairManager>) -> Self {
        Self { keys }
    }

    /// The key store behind this service.
    pub fn key_store(&self) -> &Arc<KeyPairManager> {
        &self.keys
    }

    /// Current key pair, generating it if needed.
    pub fn key_pair(&self) -> Result<KeyPair, TokenError> {
        Ok(self.keys.ensure_key_pair()?)
    }

    /// Base58 text of the public key.
    pub fn public_key_base58(&self) -> Result<String, TokenError> {
        Ok(self.keys.public_key()?.to_base58()?)
    }

    /// Issues a token over `claim`.
    pub fn issue(&self, claim: &Claim) -> Result<Token, TokenError> {
        let token = issue(claim, &self.key_pair()?)?;
        debug!(payload = token.payload(), "issued token");
        Ok(token)
    }

    /// Checks `token` against `claim`.
    pub fn verify(&self, claim: &Claim, token: &str) -> Result<Verification, TokenError> {
        verify(claim, token, &self.key_pair()?)
    }

    /// Issues an envelope over the claim JSON.
    pub fn issue_request(&self, claim_json: &str) -> Result<RequestMessage, TokenError> {
        let request = issue_request(claim_json, &self.key_pair()?)?;
        info!("issued request message");
        Ok(request)
    }

    /// Checks an envelope.
    pub fn verify_request(&self, request: &RequestMessage) -> Result<VerificationReport, TokenError> {
        let report = verify_request(request, &self.key_pair()?)?;
        info!(verified = report.verified, "verified request message");
        Ok(report)
    }
}
