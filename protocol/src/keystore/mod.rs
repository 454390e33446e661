//! # Key Pair Store
//!
//! Owns the lifecycle of the one RSA key pair the service signs with.
//!
//! ```text
//!   ensure_key_pair()
//!         │
//!         ├── public.pem + private.pem present ──► load, check they match
//!         │
//!         └── either missing ──► generate ──► clear dir ──► write both
//! ```
//!
//! ## On-disk layout
//!
//! The configured directory holds exactly two files:
//!
//! | File          | Content                                   |
//! |---------------|-------------------------------------------|
//! | `public.pem`  | Base58 of X.509 `SubjectPublicKeyInfo` DER |
//! | `private.pem` | Base58 of PKCS#8 `PrivateKeyInfo` DER      |
//!
//! No PEM armor, no line wrapping, no trailing newline. Directories written
//! by earlier deployments load unchanged.
//!
//! ## Failure policy
//!
//! A file that exists but cannot be decoded is reported as
//! [`KeyError::Corrupt`] and left alone. Regenerating over it would silently
//! invalidate every token issued under the old key.
//!
//! ## Concurrency
//!
//! The whole check-generate-persist sequence runs under a mutex owned by the
//! manager. Share one manager per key directory (behind an `Arc`) and
//! concurrent first-time callers all end up with the same pair. Two managers
//! pointed at the same directory, or two processes, are not coordinated.

mod manager;

pub use manager::KeyPairManager;
