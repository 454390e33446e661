//! # Protocol Configuration & Constants
//!
//! Every fixed value of the token format lives here. The header tag, the key
//! file names and the segment delimiter are part of the wire and disk formats:
//! tokens and key directories written by earlier deployments must keep
//! working, so none of these can change without breaking them.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::crypto::keys::{KeyAlgorithm, KeyError};

// ---------------------------------------------------------------------------
// Token Format
// ---------------------------------------------------------------------------

/// Token type tag. First half of the header descriptor.
pub const TOKEN_TYPE: &str = "JWS";

/// Digest algorithm tag. Second half of the header descriptor.
pub const TOKEN_ALG: &str = "SHA256";

/// Separator between the header, payload and signature segments.
pub const SEGMENT_DELIMITER: char = '.';

/// A token always has exactly this many segments.
pub const TOKEN_SEGMENTS: usize = 3;

/// SHA-256 output length in bytes.
pub const DIGEST_LENGTH: usize = 32;

/// Length of the hex rendering of a digest. Two characters per byte.
pub const DIGEST_HEX_LENGTH: usize = DIGEST_LENGTH * 2;

// ---------------------------------------------------------------------------
// Key Material
// ---------------------------------------------------------------------------

/// Algorithm identifier used when none is configured.
pub const DEFAULT_KEY_ALGORITHM: &str = "RSA";

/// Modulus size used when none is configured.
pub const DEFAULT_KEY_SIZE_BITS: usize = 2048;

/// Smallest modulus we agree to generate. PKCS#1 v1.5 padding needs 11 bytes
/// of overhead on top of the ~88-byte payload segment, and anything below
/// 1024 bits is not worth signing with anyway.
pub const MIN_KEY_SIZE_BITS: usize = 1024;

/// Largest modulus the RSA backend accepts for public keys.
pub const MAX_KEY_SIZE_BITS: usize = 4096;

/// File holding the Base58 text of the DER-encoded public key.
///
/// The `.pem` extension is historical: the content is *not* PEM.
pub const PUBLIC_KEY_FILE: &str = "public.pem";

/// File holding the Base58 text of the DER-encoded private key.
pub const PRIVATE_KEY_FILE: &str = "private.pem";

/// Default key directory, relative to the working directory.
pub const DEFAULT_KEY_DIR: &str = "keys";

// ---------------------------------------------------------------------------
// Key Store Configuration
// ---------------------------------------------------------------------------

/// Where and how the key pair is stored.
///
/// Supplied once when the [`KeyPairManager`](crate::keystore::KeyPairManager)
/// is built and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyStoreConfig {
    /// Directory containing `public.pem` and `private.pem`.
    pub path: PathBuf,
    /// Key generation algorithm identifier, e.g. `"RSA"`.
    pub algorithm: String,
    /// Modulus size in bits.
    pub key_size_bits: usize,
}

impl KeyStoreConfig {
    /// Builds a config for `path` with the default algorithm and key size.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            algorithm: DEFAULT_KEY_ALGORITHM.to_string(),
            key_size_bits: DEFAULT_KEY_SIZE_BITS,
        }
    }

    /// Overrides the key size.
    pub fn with_key_size(mut self, key_size_bits: usize) -> Self {
        self.key_size_bits = key_size_bits;
        self
    }

    /// Overrides the algorithm identifier.
    pub fn with_algorithm(mut self, algorithm: impl Into<String>) -> Self {
        self.algorithm = algorithm.into();
        self
    }

    /// Checks the algorithm and key size without touching the filesystem.
    pub fn validate(&self) -> Result<KeyAlgorithm, KeyError> {
        let algorithm = KeyAlgorithm::parse(&self.algorithm)?;
        if !(MIN_KEY_SIZE_BITS..=MAX_KEY_SIZE_BITS).contains(&self.key_size_bits)
            || self.key_size_bits % 8 != 0
        {
            return Err(KeyError::UnsupportedKeySize(self.key_size_bits));
        }
        Ok(algorithm)
    }

    /// Full path of the public key file.
    pub fn public_key_path(&self) -> PathBuf {
        self.path.join(PUBLIC_KEY_FILE)
    }

    /// Full path of the private key file.
    pub fn private_key_path(&self) -> PathBuf {
        self.path.join(PRIVATE_KEY_FILE)
    }

    /// The key directory.
    pub fn dir(&self) -> &Path {
        &self.path
    }
}

impl Default for KeyStoreConfig {
    fn default() -> Self {
        Self::new(DEFAULT_KEY_DIR)
    }
}

/// The bytes that make up the header segment before Base58 encoding.
pub fn header_descriptor() -> String {
    format!("{TOKEN_TYPE}{TOKEN_ALG}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_descriptor_concatenates_tags() {
        assert_eq!(header_descriptor(), "JWSSHA256");
    }

    #[test]
    fn test_default_config_is_valid() {
        let cfg = KeyStoreConfig::default();
        assert_eq!(cfg.algorithm, "RSA");
        assert_eq!(cfg.key_size_bits, 2048);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_key_file_paths_live_in_key_dir() {
        let cfg = KeyStoreConfig::new("/var/lib/claimseal/keys");
        assert_eq!(
            cfg.public_key_path(),
            PathBuf::from("/var/lib/claimseal/keys/public.pem")
        );
        assert_eq!(
            cfg.private_key_path(),
            PathBuf::from("/var/lib/claimseal/keys/private.pem")
        );
    }

    #[test]
    fn test_unsupported_algorithm_rejected() {
        let cfg = KeyStoreConfig::new("keys").with_algorithm("DSA");
        assert!(matches!(
            cfg.validate(),
            Err(KeyError::UnsupportedAlgorithm(ref a)) if a == "DSA"
        ));
    }

    #[test]
    fn test_key_size_bounds() {
        for bad in [0, 512, 1000, 8192] {
            let cfg = KeyStoreConfig::new("keys").with_key_size(bad);
            assert!(
                matches!(cfg.validate(), Err(KeyError::UnsupportedKeySize(n)) if n == bad),
                "key size {bad} should be rejected"
            );
        }
        for good in [1024, 2048, 3072, 4096] {
            assert!(KeyStoreConfig::new("keys").with_key_size(good).validate().is_ok());
        }
    }

    #[test]
    fn test_digest_constants() {
        assert_eq!(DIGEST_LENGTH, 32);
        assert_eq!(DIGEST_HEX_LENGTH, 64);
        assert_eq!(TOKEN_SEGMENTS, 3);
    }
}
