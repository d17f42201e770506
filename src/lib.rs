//! # Bulwark Protect
//!
//! Pluggable data protection for long-lived secrets: an opaque master key
//! becomes per-operation confidentiality + integrity protection for
//! arbitrary payloads, and low-entropy passwords become fixed-length key
//! material.
//!
//! ## Quick Start
//!
//! ```rust
//! use bulwark_protect::{CbcHmacEncryptionOptions, Secret};
//!
//! let options = CbcHmacEncryptionOptions::default();
//! options.validate().unwrap();
//!
//! let master_key = Secret::random(64).unwrap();
//! let encryptor = options.create_encryptor(master_key).unwrap();
//!
//! let packet = encryptor.encrypt(b"session-token", b"purpose:auth-cookie").unwrap();
//! let plaintext = encryptor.decrypt(&packet, b"purpose:auth-cookie").unwrap();
//!
//! assert_eq!(plaintext, b"session-token");
//! ```
//!
//! ## Password-based key derivation
//!
//! ```rust
//! use bulwark_protect::pbkdf2::{derive_key, KeyDerivationPrf};
//!
//! let key = derive_key("correct horse", b"salt", KeyDerivationPrf::Sha256, 10_000, 32).unwrap();
//! assert_eq!(key.len(), 32);
//! ```
//!
//! ## Security Properties
//!
//! - **Per-operation subkeys**: every encrypt call derives fresh
//!   encryption and validation keys from the master key and a random key
//!   modifier; the master key never touches a cipher directly
//! - **Verify-then-decrypt**: the authentication tag is checked in
//!   constant time before any block is decrypted
//! - **Uniform failure**: tampered and malformed packets produce one
//!   indistinguishable error
//! - **Strength policy**: algorithm configurations below 128-bit keys or
//!   128-bit digests are rejected at validation time, never downgraded
//!
//! ## What's NOT Provided
//!
//! - Key lifecycle management (rotation, activation, revocation)
//! - Transport of protected payloads
//! - Constant-time guarantees beyond tag comparison

#![deny(unsafe_code)]

// ---------------------------------------------------------------------------
// Extension surface (algorithm providers, PBKDF2 backends, repositories)
// ---------------------------------------------------------------------------

pub mod catalog;
pub mod cipher;
pub mod kdf;
pub mod mac;
pub mod pbkdf2;
pub mod repository;
pub mod wire;

// ---------------------------------------------------------------------------
// Core engine and configuration
// ---------------------------------------------------------------------------

mod engine;
mod error;
mod options;
mod secret;

pub use engine::CbcHmacEncryptor;
pub use error::{ConfigError, CryptoError};
pub use options::CbcHmacEncryptionOptions;
pub use secret::Secret;
