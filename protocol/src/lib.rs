// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # ClaimSeal Protocol — Core Library
//!
//! Issues and verifies `header.payload.signature` tokens over JSON claims,
//! signed with an RSA key pair that lives in a directory on disk.
//!
//! The token format predates this crate and is not JOSE. Its exact byte
//! layout (hex digest, Base58, PKCS#1 v1.5 private-key transform, Base64) is
//! kept so that tokens and key directories from earlier deployments keep
//! working. See [`token`] for the layout and its known weaknesses.
//!
//! ## Architecture
//!
//! - **crypto** — SHA-256, RSA keys, the raw RSA transforms, text codecs.
//! - **keystore** — Load-or-generate for the persisted key pair.
//! - **token** — Issuance, verification, request envelopes, `TokenService`.
//! - **config** — Format constants and key store configuration.
//!
//! ## Quick start
//!
//! ```no_run
//! use std::sync::Arc;
//! use claimseal_protocol::config::KeyStoreConfig;
//! use claimseal_protocol::keystore::KeyPairManager;
//! use claimseal_protocol::token::TokenService;
//!
//! let keys = Arc::new(KeyPairManager::new(KeyStoreConfig::new("keys")));
//! let service = TokenService::new(keys);
//!
//! let request = service
//!     .issue_request(r#"{"uniqueId":"1000","name":"test","num":"10"}"#)
//!     .unwrap();
//! assert!(service.verify_request(&request).unwrap().verified);
//! ```

pub mod config;
pub mod crypto;
pub mod keystore;
pub mod token;
