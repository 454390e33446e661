//! # Key Types
//!
//! RSA key pair generation and the opaque key handles the rest of the crate
//! passes around.
//!
//! Each half serializes to the DER encoding the legacy key files were written
//! with:
//!
//! - public key: X.509 `SubjectPublicKeyInfo`
//! - private key: PKCS#8 `PrivateKeyInfo`
//!
//! Callers outside the crate never see private key bytes. They hold a
//! [`PrivateKey`] handle and give it to the cipher; only the key store reads
//! the DER back out, to persist it.
//!
//! ## Security considerations
//!
//! - Key generation uses `OsRng`.
//! - `RsaPrivateKey` zeroizes its limbs on drop.
//! - `Debug` output shows a SHA-256 fingerprint of the public key and nothing
//!   else. Key bytes are never logged.

use std::fmt;

use rand::rngs::OsRng;
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey};
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use thiserror::Error;

use super::encoding::{base58_decode, base58_encode};
use super::hash::digest_hex;

/// Errors that can occur while generating, parsing or persisting keys.
#[derive(Debug, Error)]
pub enum KeyError {
    /// The configured algorithm identifier is not one we can generate.
    #[error("unsupported key algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// The configured key size is outside the supported range.
    #[error("unsupported key size: {0} bits")]
    UnsupportedKeySize(usize),

    /// The RSA backend refused to generate a key.
    #[error("key generation failed: {0}")]
    Generation(String),

    /// DER or Base58 key bytes could not be parsed or produced.
    #[error("malformed key material: {0}")]
    MalformedKey(String),

    /// A persisted key file exists but its content is unusable.
    #[error("corrupt key file {path}: {reason}")]
    Corrupt {
        /// The offending file.
        path: std::path::PathBuf,
        /// What was wrong with it.
        reason: String,
    },

    /// The two persisted halves do not belong to the same key pair.
    #[error("key pair validation failed: public key does not match private key")]
    KeypairMismatch,

    /// Reading or writing key material failed.
    #[error("key i/o on {path}: {source}")]
    Io {
        /// File or directory being accessed.
        path: std::path::PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

// ---------------------------------------------------------------------------
// KeyAlgorithm
// ---------------------------------------------------------------------------

/// Key generation algorithms the store understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyAlgorithm {
    /// RSA with public exponent 65537.
    Rsa,
}

impl KeyAlgorithm {
    /// Parses a configured identifier. Matching is case-insensitive.
    pub fn parse(identifier: &str) -> Result<Self, KeyError> {
        match identifier.trim().to_ascii_uppercase().as_str() {
            "RSA" => Ok(KeyAlgorithm::Rsa),
            _ => Err(KeyError::UnsupportedAlgorithm(identifier.to_string())),
        }
    }

    /// Canonical identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyAlgorithm::Rsa => "RSA",
        }
    }
}

impl fmt::Display for KeyAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// PublicKey
// ---------------------------------------------------------------------------

/// The public half of the signing key pair. Safe to share.
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKey {
    inner: RsaPublicKey,
}

impl PublicKey {
    /// Parse an X.509 `SubjectPublicKeyInfo` DER blob.
    pub fn from_der(der: &[u8]) -> Result<Self, KeyError> {
        let inner = RsaPublicKey::from_public_key_der(der)
            .map_err(|e| KeyError::MalformedKey(e.to_string()))?;
        Ok(Self { inner })
    }

    /// Parse the Base58 text format used by `public.pem`.
    pub fn from_base58(text: &str) -> Result<Self, KeyError> {
        let der = base58_decode(text.trim()).map_err(|e| KeyError::MalformedKey(e.to_string()))?;
        Self::from_der(&der)
    }

    /// DER encoding (X.509 `SubjectPublicKeyInfo`).
    pub fn to_der(&self) -> Result<Vec<u8>, KeyError> {
        let doc = self
            .inner
            .to_public_key_der()
            .map_err(|e| KeyError::MalformedKey(e.to_string()))?;
        Ok(doc.as_bytes().to_vec())
    }

    /// Base58 text of the DER encoding, exactly as written to `public.pem`.
    pub fn to_base58(&self) -> Result<String, KeyError> {
        Ok(base58_encode(&self.to_der()?))
    }

    /// Modulus size in bits.
    pub fn size_bits(&self) -> usize {
        self.inner.size() * 8
    }

    /// Modulus size in bytes. Every signature block has exactly this length.
    pub fn size_bytes(&self) -> usize {
        self.inner.size()
    }

    /// Short SHA-256 fingerprint for logs.
    pub fn fingerprint(&self) -> String {
        match self.to_der() {
            Ok(der) => digest_hex(&der)[..16].to_string(),
            Err(_) => "unencodable".to_string(),
        }
    }

    pub(crate) fn as_rsa(&self) -> &RsaPublicKey {
        &self.inner
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey(rsa-{}, {})", self.size_bits(), self.fingerprint())
    }
}

// ---------------------------------------------------------------------------
// PrivateKey
// ---------------------------------------------------------------------------

/// The private half of the signing key pair.
///
/// Opaque outside the crate: it can sign and derive its public key, and that
/// is all.
#[derive(Clone)]
pub struct PrivateKey {
    inner: RsaPrivateKey,
}

impl PrivateKey {
    /// Parse a PKCS#8 `PrivateKeyInfo` DER blob.
    pub fn from_der(der: &[u8]) -> Result<Self, KeyError> {
        let inner = RsaPrivateKey::from_pkcs8_der(der)
            .map_err(|e| KeyError::MalformedKey(e.to_string()))?;
        Ok(Self { inner })
    }

    /// The matching public key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey {
            inner: RsaPublicKey::from(&self.inner),
        }
    }

    /// Modulus size in bits.
    pub fn size_bits(&self) -> usize {
        self.inner.size() * 8
    }

    /// PKCS#8 DER. Only the key store needs this.
    pub(crate) fn to_der(&self) -> Result<Vec<u8>, KeyError> {
        let doc = self
            .inner
            .to_pkcs8_der()
            .map_err(|e| KeyError::MalformedKey(e.to_string()))?;
        Ok(doc.as_bytes().to_vec())
    }

    pub(crate) fn as_rsa(&self) -> &RsaPrivateKey {
        &self.inner
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print secret key material, not even partially.
        write!(f, "PrivateKey(rsa-{}, <redacted>)", self.size_bits())
    }
}

// ---------------------------------------------------------------------------
// KeyPair
// ---------------------------------------------------------------------------

/// Both halves of one generation event, plus the parameters they were made
/// with.
#[derive(Clone)]
pub struct KeyPair {
    private: PrivateKey,
    public: PublicKey,
    algorithm: KeyAlgorithm,
}

impl KeyPair {
    /// Generate a fresh key pair.
    ///
    /// 2048-bit generation takes a noticeable fraction of a second; 4096-bit
    /// takes several. The key store only does this when no pair is persisted.
    pub fn generate(algorithm: KeyAlgorithm, key_size_bits: usize) -> Result<Self, KeyError> {
        match algorithm {
            KeyAlgorithm::Rsa => {
                let inner = RsaPrivateKey::new(&mut OsRng, key_size_bits)
                    .map_err(|e| KeyError::Generation(e.to_string()))?;
                let private = PrivateKey { inner };
                let public = private.public_key();
                Ok(Self {
                    private,
                    public,
                    algorithm,
                })
            }
        }
    }

    /// Rebuild a pair from its two DER halves, checking they belong together.
    pub fn from_der(
        public_der: &[u8],
        private_der: &[u8],
        algorithm: KeyAlgorithm,
    ) -> Result<Self, KeyError> {
        let public = PublicKey::from_der(public_der)?;
        let private = PrivateKey::from_der(private_der)?;
        Self::from_parts(public, private, algorithm)
    }

    /// Pair up two already-parsed halves, checking they belong together.
    pub fn from_parts(
        public: PublicKey,
        private: PrivateKey,
        algorithm: KeyAlgorithm,
    ) -> Result<Self, KeyError> {
        if private.public_key() != public {
            return Err(KeyError::KeypairMismatch);
        }
        Ok(Self {
            private,
            public,
            algorithm,
        })
    }

    /// The public half.
    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    /// The private half, as an opaque handle.
    pub fn private_key(&self) -> &PrivateKey {
        &self.private
    }

    /// DER bytes of the public half.
    pub fn public_key_der(&self) -> Result<Vec<u8>, KeyError> {
        self.public.to_der()
    }

    /// Base58 text of the public half, as persisted.
    pub fn public_key_base58(&self) -> Result<String, KeyError> {
        self.public.to_base58()
    }

    /// Algorithm the pair was generated with.
    pub fn algorithm(&self) -> KeyAlgorithm {
        self.algorithm
    }

    /// Modulus size in bits.
    pub fn key_size_bits(&self) -> usize {
        self.public.size_bits()
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyPair(pub={:?})", self.public)
    }
}

impl PartialEq for KeyPair {
    /// Pairs are compared by public key only.
    fn eq(&self, other: &Self) -> bool {
        self.public == other.public
    }
}

impl Eq for KeyPair {}

#[cfg(test)]
mod tests {
    use super::*;

    // 1024-bit keys keep the unit tests fast; the integration tests use 2048.
    fn small_pair() -> KeyPair {
        KeyPair::generate(KeyAlgorithm::Rsa, 1024).unwrap()
    }

    #[test]
    fn test_algorithm_parse_is_case_insensitive() {
        assert_eq!(KeyAlgorithm::parse("RSA").unwrap(), KeyAlgorithm::Rsa);
        assert_eq!(KeyAlgorithm::parse("rsa").unwrap(), KeyAlgorithm::Rsa);
        assert_eq!(KeyAlgorithm::Rsa.to_string(), "RSA");
    }

    #[test]
    fn test_algorithm_parse_rejects_unknown() {
        for bad in ["EC", "Ed25519", ""] {
            assert!(matches!(
                KeyAlgorithm::parse(bad),
                Err(KeyError::UnsupportedAlgorithm(_))
            ));
        }
    }

    #[test]
    fn test_generate_produces_requested_size() {
        let kp = small_pair();
        assert_eq!(kp.key_size_bits(), 1024);
        assert_eq!(kp.public_key().size_bytes(), 128);
        assert_eq!(kp.private_key().size_bits(), 1024);
        assert_eq!(kp.algorithm(), KeyAlgorithm::Rsa);
    }

    #[test]
    fn der_roundtrip_preserves_pair() {
        let kp = small_pair();
        let public_der = kp.public_key_der().unwrap();
        let private_der = kp.private_key().to_der().unwrap();
        let restored = KeyPair::from_der(&public_der, &private_der, KeyAlgorithm::Rsa).unwrap();
        assert_eq!(kp, restored);
        assert_eq!(restored.public_key_der().unwrap(), public_der);
    }

    #[test]
    fn test_public_key_base58_roundtrip() {
        let kp = small_pair();
        let text = kp.public_key_base58().unwrap();
        let restored = PublicKey::from_base58(&text).unwrap();
        assert_eq!(&restored, kp.public_key());
    }

    #[test]
    fn test_mismatched_halves_rejected() {
        let a = small_pair();
        let b = small_pair();
        let result = KeyPair::from_der(
            &a.public_key_der().unwrap(),
            &b.private_key().to_der().unwrap(),
            KeyAlgorithm::Rsa,
        );
        assert!(matches!(result, Err(KeyError::KeypairMismatch)));
    }

    #[test]
    fn test_garbage_der_rejected() {
        assert!(matches!(
            PublicKey::from_der(&[0x30, 0x03, 0x02, 0x01, 0x00]),
            Err(KeyError::MalformedKey(_))
        ));
        assert!(matches!(
            PrivateKey::from_der(b"not der at all"),
            Err(KeyError::MalformedKey(_))
        ));
        assert!(matches!(
            PublicKey::from_base58("0OIl"),
            Err(KeyError::MalformedKey(_))
        ));
    }

    #[test]
    fn test_two_generated_pairs_differ() {
        assert_ne!(small_pair(), small_pair());
    }

    #[test]
    fn debug_does_not_leak_private_key() {
        let kp = small_pair();
        let rendered = format!("{:?} {:?}", kp, kp.private_key());
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains(&kp.public_key_base58().unwrap()));
    }
}
