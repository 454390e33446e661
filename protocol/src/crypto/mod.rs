//! # Cryptographic Primitives
//!
//! Everything the token format is built from:
//!
//! - **SHA-256** for the claim digest ([`hash`]).
//! - **RSA** key pairs, X.509/PKCS#8 DER on the wire ([`keys`]).
//! - **PKCS#1 v1.5** raw transforms, used as the signature primitive
//!   ([`cipher`]).
//! - **UTF-8 / Base58 / Base64** codecs for the text segments ([`encoding`]).
//!
//! The RSA arithmetic and padding come from the `rsa` crate. The only framing
//! done by hand is stripping block-type-1 padding after the public-key
//! transform, which the crate does not expose without a DigestInfo check.

pub mod cipher;
pub mod encoding;
pub mod hash;
pub mod keys;

pub use cipher::CipherError;
pub use encoding::DecodingError;
pub use hash::{digest_hex, sha256};
pub use keys::{KeyAlgorithm, KeyError, KeyPair, PrivateKey, PublicKey};
