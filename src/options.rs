//! Options for configuring a CBC + HMAC authenticated encryption mechanism.

use serde::{Deserialize, Serialize};

use crate::catalog::{AlgorithmCatalog, CipherSpec, MacSpec};
use crate::engine::CbcHmacEncryptor;
use crate::error::ConfigError;
use crate::secret::Secret;

/// Validated, serializable parameter set for building a
/// [`CbcHmacEncryptor`].
///
/// The algorithm names resolve through an [`AlgorithmCatalog`]; the cipher
/// must support CBC-style chaining with a block size of 64 bits or greater,
/// and the hash algorithm must support HMAC with a digest of 128 bits or
/// greater.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CbcHmacEncryptionOptions {
    /// Name of the symmetric encryption algorithm. Required.
    pub encryption_algorithm: String,
    /// Provider carrying the encryption algorithm. Optional; `None` selects
    /// the built-ins.
    pub encryption_algorithm_provider: Option<String>,
    /// Symmetric key size in bits. Must be non-negative and 128 or greater.
    pub encryption_algorithm_key_size: i32,
    /// Name of the hash algorithm used for HMAC validation. Required.
    pub hash_algorithm: String,
    /// Provider carrying the hash algorithm. Optional; `None` selects the
    /// built-ins.
    pub hash_algorithm_provider: Option<String>,
}

impl Default for CbcHmacEncryptionOptions {
    /// AES-256-CBC with HMAC-SHA256 validation.
    fn default() -> Self {
        Self {
            encryption_algorithm: "AES".into(),
            encryption_algorithm_provider: None,
            encryption_algorithm_key_size: 256,
            hash_algorithm: "SHA256".into(),
            hash_algorithm_provider: None,
        }
    }
}

impl CbcHmacEncryptionOptions {
    /// Validate that the options are well-formed: the named algorithms
    /// exist, meet the minimum-strength policy, and round-trip data.
    ///
    /// Runs a sample payload through an encrypt-then-decrypt operation
    /// under a throwaway random master key; the options are only accepted
    /// once that self-test passes.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_with(&AlgorithmCatalog::new())
    }

    /// [`validate`](Self::validate) against a catalog carrying dynamic
    /// providers.
    pub fn validate_with(&self, catalog: &AlgorithmCatalog) -> Result<(), ConfigError> {
        let master_key = Secret::random(CbcHmacEncryptor::self_test_key_len())
            .map_err(ConfigError::SelfTestFailed)?;
        let encryptor = self.create_encryptor_with(catalog, master_key)?;
        encryptor.perform_self_test().map_err(ConfigError::SelfTestFailed)
    }

    /// Build an encryptor bound to `master_key` using the built-in
    /// algorithms only.
    pub fn create_encryptor(&self, master_key: Secret) -> Result<CbcHmacEncryptor, ConfigError> {
        self.create_encryptor_with(&AlgorithmCatalog::new(), master_key)
    }

    /// Build an encryptor bound to `master_key`, resolving algorithms
    /// through `catalog`.
    pub fn create_encryptor_with(
        &self,
        catalog: &AlgorithmCatalog,
        master_key: Secret,
    ) -> Result<CbcHmacEncryptor, ConfigError> {
        let cipher_spec = self.cipher_spec()?;
        let cipher = catalog.resolve_cipher(&cipher_spec)?;
        let mac = catalog.resolve_mac(&MacSpec {
            name: self.hash_algorithm.clone(),
            provider: self.hash_algorithm_provider.clone(),
        })?;
        let cipher_key_len = (cipher_spec.key_size_bits / 8) as usize;
        Ok(CbcHmacEncryptor::new(master_key, cipher, cipher_key_len, mac))
    }

    /// Serialize for storage in a key repository.
    pub fn to_document(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::InvalidValue {
            name: "options",
            reason: e.to_string(),
        })
    }

    /// Parse a document produced by [`to_document`](Self::to_document).
    ///
    /// Parsing does not validate; call [`validate`](Self::validate) before
    /// trusting the result.
    pub fn from_document(document: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(document).map_err(|e| ConfigError::InvalidValue {
            name: "options",
            reason: e.to_string(),
        })
    }

    fn cipher_spec(&self) -> Result<CipherSpec, ConfigError> {
        if self.encryption_algorithm_key_size < 0 {
            return Err(ConfigError::InvalidValue {
                name: "encryption_algorithm_key_size",
                reason: "must be non-negative".into(),
            });
        }
        Ok(CipherSpec {
            name: self.encryption_algorithm.clone(),
            provider: self.encryption_algorithm_provider.clone(),
            key_size_bits: self.encryption_algorithm_key_size as u32,
        })
    }
}
