//! Algorithm resolution and minimum-strength validation.
//!
//! Resolution order for both ciphers and MACs:
//!
//! 1. If no provider is named and the algorithm is one of the built-ins
//!    (`AES`; `SHA1`/`SHA256`/`SHA512` in HMAC mode), a process-wide shared
//!    handle is returned. Shared handles are read-only, live for the life of
//!    the process, and are never released by callers.
//! 2. Otherwise the name/provider pair is opened through the registered
//!    [`AlgorithmProvider`]s. Dynamically opened handles are owned by the
//!    configuration that resolved them and released exactly once when the
//!    last reference drops.
//!
//! Every resolved handle is validated against the minimum-strength policy
//! before it is returned; violations surface as
//! [`ConfigError::WeakAlgorithm`] and are never silently downgraded.

use std::sync::{Arc, OnceLock};

use tracing::debug;

use crate::cipher::{AesCbc, BlockCipher};
use crate::error::ConfigError;
use crate::mac::{HmacAlgorithm, MacAlgorithm};

/// Minimum cipher block size accepted by the policy, in bits.
pub const MIN_CIPHER_BLOCK_BITS: u32 = 64;

/// Minimum symmetric key size accepted by the policy, in bits.
pub const MIN_CIPHER_KEY_BITS: u32 = 128;

/// Minimum MAC digest size accepted by the policy, in bits.
pub const MIN_MAC_DIGEST_BITS: u32 = 128;

/// A resolved, ready-to-use cipher. Shared or owned per module docs.
pub type CipherHandle = Arc<dyn BlockCipher>;

/// A resolved, ready-to-use MAC. Shared or owned per module docs.
pub type MacHandle = Arc<dyn MacAlgorithm>;

// ---------------------------------------------------------------------------
// Algorithm specs
// ---------------------------------------------------------------------------

/// A named symmetric cipher plus the key size to use with it.
#[derive(Clone, Debug)]
pub struct CipherSpec {
    /// Algorithm name, e.g. `"AES"`.
    pub name: String,
    /// Provider to open the algorithm from; `None` selects the built-ins.
    pub provider: Option<String>,
    /// Key size in bits. Must be a whole number of bytes.
    pub key_size_bits: u32,
}

/// A named hash algorithm to be opened in HMAC mode.
#[derive(Clone, Debug)]
pub struct MacSpec {
    /// Algorithm name, e.g. `"SHA256"`.
    pub name: String,
    /// Provider to open the algorithm from; `None` selects the built-ins.
    pub provider: Option<String>,
}

// ---------------------------------------------------------------------------
// Dynamic providers
// ---------------------------------------------------------------------------

/// A source of algorithm implementations beyond the built-in set.
///
/// Providers are registered on an [`AlgorithmCatalog`] at configuration
/// time. A provider returns `None` for names it does not implement; cipher
/// handles it does return must already be opened in CBC chaining mode.
pub trait AlgorithmProvider: Send + Sync {
    /// Provider name, matched against the spec's `provider` field.
    fn name(&self) -> &str;

    /// Open a cipher by name, or `None` if this provider does not carry it.
    fn open_cipher(&self, name: &str) -> Option<CipherHandle>;

    /// Open a MAC by name, or `None` if this provider does not carry it.
    fn open_mac(&self, name: &str) -> Option<MacHandle>;
}

// ---------------------------------------------------------------------------
// Cached built-in handles
// ---------------------------------------------------------------------------

fn shared_aes_cbc() -> CipherHandle {
    static HANDLE: OnceLock<CipherHandle> = OnceLock::new();
    HANDLE.get_or_init(|| Arc::new(AesCbc)).clone()
}

fn shared_hmac_sha1() -> MacHandle {
    static HANDLE: OnceLock<MacHandle> = OnceLock::new();
    HANDLE.get_or_init(|| Arc::new(HmacAlgorithm::sha1())).clone()
}

fn shared_hmac_sha256() -> MacHandle {
    static HANDLE: OnceLock<MacHandle> = OnceLock::new();
    HANDLE.get_or_init(|| Arc::new(HmacAlgorithm::sha256())).clone()
}

fn shared_hmac_sha512() -> MacHandle {
    static HANDLE: OnceLock<MacHandle> = OnceLock::new();
    HANDLE.get_or_init(|| Arc::new(HmacAlgorithm::sha512())).clone()
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Resolves named algorithms to executable handles.
#[derive(Default)]
pub struct AlgorithmCatalog {
    providers: Vec<Arc<dyn AlgorithmProvider>>,
}

impl AlgorithmCatalog {
    /// A catalog carrying only the built-in algorithms.
    pub fn new() -> Self {
        Self { providers: Vec::new() }
    }

    /// Register a dynamic provider for the slow resolution path.
    pub fn register_provider(&mut self, provider: Arc<dyn AlgorithmProvider>) {
        self.providers.push(provider);
    }

    /// Resolve and validate a symmetric cipher.
    pub fn resolve_cipher(&self, spec: &CipherSpec) -> Result<CipherHandle, ConfigError> {
        if spec.name.is_empty() {
            return Err(ConfigError::MissingRequiredValue { name: "encryption_algorithm" });
        }
        if spec.key_size_bits % 8 != 0 {
            return Err(ConfigError::InvalidValue {
                name: "encryption_algorithm_key_size",
                reason: format!("{} bits is not a whole number of bytes", spec.key_size_bits),
            });
        }

        // Fast path: pre-opened shared handles for the built-in set.
        let handle = if spec.provider.is_none() && spec.name == "AES" {
            shared_aes_cbc()
        } else {
            self.open_dynamic_cipher(&spec.name, spec.provider.as_deref())
                .ok_or_else(|| ConfigError::UnknownAlgorithm {
                    name: spec.name.clone(),
                    provider: spec.provider.clone(),
                })?
        };

        let block_bits = (handle.block_len() as u32) * 8;
        if block_bits < MIN_CIPHER_BLOCK_BITS {
            return Err(ConfigError::WeakAlgorithm {
                parameter: "block size",
                required_bits: MIN_CIPHER_BLOCK_BITS,
                actual_bits: block_bits,
            });
        }
        if spec.key_size_bits < MIN_CIPHER_KEY_BITS {
            return Err(ConfigError::WeakAlgorithm {
                parameter: "key size",
                required_bits: MIN_CIPHER_KEY_BITS,
                actual_bits: spec.key_size_bits,
            });
        }
        let key_len = (spec.key_size_bits / 8) as usize;
        if !handle.supported_key_lengths().contains(&key_len) {
            return Err(ConfigError::InvalidValue {
                name: "encryption_algorithm_key_size",
                reason: format!("{} bits is not supported by '{}'", spec.key_size_bits, spec.name),
            });
        }

        Ok(handle)
    }

    /// Resolve and validate a hash algorithm in HMAC mode.
    pub fn resolve_mac(&self, spec: &MacSpec) -> Result<MacHandle, ConfigError> {
        if spec.name.is_empty() {
            return Err(ConfigError::MissingRequiredValue { name: "hash_algorithm" });
        }

        // Fast path: pre-opened shared handles for the built-in set.
        let handle = if spec.provider.is_none() {
            match spec.name.as_str() {
                "SHA1" => Some(shared_hmac_sha1()),
                "SHA256" => Some(shared_hmac_sha256()),
                "SHA512" => Some(shared_hmac_sha512()),
                _ => None,
            }
        } else {
            None
        };

        let handle = match handle {
            Some(h) => h,
            None => self
                .open_dynamic_mac(&spec.name, spec.provider.as_deref())
                .ok_or_else(|| ConfigError::UnknownAlgorithm {
                    name: spec.name.clone(),
                    provider: spec.provider.clone(),
                })?,
        };

        let digest_bits = (handle.digest_len() as u32) * 8;
        if digest_bits < MIN_MAC_DIGEST_BITS {
            return Err(ConfigError::WeakAlgorithm {
                parameter: "digest size",
                required_bits: MIN_MAC_DIGEST_BITS,
                actual_bits: digest_bits,
            });
        }

        Ok(handle)
    }

    fn open_dynamic_cipher(&self, name: &str, provider: Option<&str>) -> Option<CipherHandle> {
        for p in &self.providers {
            if provider.is_some_and(|want| want != p.name()) {
                continue;
            }
            if let Some(handle) = p.open_cipher(name) {
                debug!(algorithm = name, provider = p.name(), "opened cipher with CBC chaining mode");
                return Some(handle);
            }
        }
        None
    }

    fn open_dynamic_mac(&self, name: &str, provider: Option<&str>) -> Option<MacHandle> {
        for p in &self.providers {
            if provider.is_some_and(|want| want != p.name()) {
                continue;
            }
            if let Some(handle) = p.open_mac(name) {
                debug!(algorithm = name, provider = p.name(), "opened hash algorithm in HMAC mode");
                return Some(handle);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CryptoError;

    fn aes_spec(bits: u32) -> CipherSpec {
        CipherSpec { name: "AES".into(), provider: None, key_size_bits: bits }
    }

    fn mac_spec(name: &str) -> MacSpec {
        MacSpec { name: name.into(), provider: None }
    }

    #[test]
    fn builtin_cipher_resolves_and_is_shared() {
        let catalog = AlgorithmCatalog::new();
        let a = catalog.resolve_cipher(&aes_spec(256)).unwrap();
        let b = catalog.resolve_cipher(&aes_spec(128)).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn builtin_macs_resolve() {
        let catalog = AlgorithmCatalog::new();
        for name in ["SHA1", "SHA256", "SHA512"] {
            let handle = catalog.resolve_mac(&mac_spec(name)).unwrap();
            assert_eq!(handle.name(), name);
        }
    }

    #[test]
    fn empty_names_are_rejected() {
        let catalog = AlgorithmCatalog::new();
        assert!(matches!(
            catalog.resolve_cipher(&CipherSpec { name: String::new(), provider: None, key_size_bits: 256 }),
            Err(ConfigError::MissingRequiredValue { .. })
        ));
        assert!(matches!(
            catalog.resolve_mac(&MacSpec { name: String::new(), provider: None }),
            Err(ConfigError::MissingRequiredValue { .. })
        ));
    }

    #[test]
    fn weak_key_size_is_rejected() {
        let catalog = AlgorithmCatalog::new();
        let err = catalog.resolve_cipher(&aes_spec(64)).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::WeakAlgorithm { parameter: "key size", required_bits: 128, actual_bits: 64 }
        ));
    }

    #[test]
    fn non_byte_key_size_is_rejected() {
        let catalog = AlgorithmCatalog::new();
        assert!(matches!(
            catalog.resolve_cipher(&aes_spec(257)),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn unsupported_key_size_is_rejected() {
        let catalog = AlgorithmCatalog::new();
        assert!(matches!(
            catalog.resolve_cipher(&aes_spec(512)),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn unknown_names_are_rejected() {
        let catalog = AlgorithmCatalog::new();
        assert!(matches!(
            catalog.resolve_cipher(&CipherSpec { name: "ROT13".into(), provider: None, key_size_bits: 256 }),
            Err(ConfigError::UnknownAlgorithm { .. })
        ));
        assert!(matches!(
            catalog.resolve_mac(&mac_spec("MD5")),
            Err(ConfigError::UnknownAlgorithm { .. })
        ));
    }

    // -----------------------------------------------------------------------
    // Slow path via a test provider
    // -----------------------------------------------------------------------

    #[derive(Debug)]
    struct NarrowBlockCipher;

    impl crate::cipher::BlockCipher for NarrowBlockCipher {
        fn name(&self) -> &str {
            "NARROW"
        }
        fn block_len(&self) -> usize {
            4
        }
        fn supported_key_lengths(&self) -> &[usize] {
            &[16]
        }
        fn encrypt_cbc(&self, _: &[u8], _: &[u8], _: &[u8]) -> Result<Vec<u8>, CryptoError> {
            Err(CryptoError::Internal)
        }
        fn decrypt_cbc(&self, _: &[u8], _: &[u8], _: &[u8]) -> Result<Vec<u8>, CryptoError> {
            Err(CryptoError::Internal)
        }
    }

    struct ShortDigestMac;

    impl crate::mac::MacAlgorithm for ShortDigestMac {
        fn name(&self) -> &str {
            "SHORT"
        }
        fn digest_len(&self) -> usize {
            8
        }
        fn compute(&self, _: &[u8], _: &[&[u8]]) -> Vec<u8> {
            vec![0; 8]
        }
    }

    struct TestProvider;

    impl AlgorithmProvider for TestProvider {
        fn name(&self) -> &str {
            "test"
        }
        fn open_cipher(&self, name: &str) -> Option<CipherHandle> {
            (name == "NARROW").then(|| Arc::new(NarrowBlockCipher) as CipherHandle)
        }
        fn open_mac(&self, name: &str) -> Option<MacHandle> {
            (name == "SHORT").then(|| Arc::new(ShortDigestMac) as MacHandle)
        }
    }

    #[test]
    fn dynamic_cipher_with_narrow_block_is_rejected() {
        let mut catalog = AlgorithmCatalog::new();
        catalog.register_provider(Arc::new(TestProvider));
        let spec = CipherSpec { name: "NARROW".into(), provider: Some("test".into()), key_size_bits: 128 };
        assert!(matches!(
            catalog.resolve_cipher(&spec),
            Err(ConfigError::WeakAlgorithm { parameter: "block size", .. })
        ));
    }

    #[test]
    fn dynamic_mac_with_short_digest_is_rejected() {
        let mut catalog = AlgorithmCatalog::new();
        catalog.register_provider(Arc::new(TestProvider));
        let spec = MacSpec { name: "SHORT".into(), provider: Some("test".into()) };
        assert!(matches!(
            catalog.resolve_mac(&spec),
            Err(ConfigError::WeakAlgorithm { parameter: "digest size", .. })
        ));
    }

    #[test]
    fn provider_name_must_match() {
        let mut catalog = AlgorithmCatalog::new();
        catalog.register_provider(Arc::new(TestProvider));
        let spec = MacSpec { name: "SHORT".into(), provider: Some("other".into()) };
        assert!(matches!(catalog.resolve_mac(&spec), Err(ConfigError::UnknownAlgorithm { .. })));
    }
}
