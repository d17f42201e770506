//! Authenticated encryption engine: CBC encryption + HMAC validation.
//!
//! Every call derives its own pair of subkeys from the long-lived master
//! key, a fresh random key modifier, and the caller's additional
//! authenticated data:
//!
//!   context        = be64(len(km)) || km || be64(len(aad)) || aad
//!   encryption_key = KDF(master, "encryption", context, cipher_key_len)
//!   validation_key = KDF(master, "validation", context, digest_len)
//!
//! The length-prefixed context encoding is injective, so no two distinct
//! (key modifier, AAD) pairs can collide. The master key itself never
//! touches the cipher or the MAC directly.
//!
//! Decryption verifies the authentication tag in constant time before any
//! cipher operation runs; a tampered packet is rejected without decrypting
//! a single block.

use subtle::ConstantTimeEq;

use crate::catalog::{CipherHandle, MacHandle};
use crate::error::CryptoError;
use crate::kdf;
use crate::secret::Secret;
use crate::wire::{self, PacketInfo, KEY_MODIFIER_LEN};

const ENCRYPTION_LABEL: &[u8] = b"encryption";
const VALIDATION_LABEL: &[u8] = b"validation";

/// Master key length used by the configuration self-test, in bytes.
const SELF_TEST_KEY_LEN: usize = 512 / 8;

/// Payload length used by the configuration self-test, in bytes.
const SELF_TEST_PAYLOAD_LEN: usize = 128;

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// An authenticated encryptor bound to one master key and one algorithm
/// configuration.
///
/// The engine holds no per-call state; `encrypt` and `decrypt` may run
/// concurrently from any number of threads.
pub struct CbcHmacEncryptor {
    master_key: Secret,
    cipher: CipherHandle,
    cipher_key_len: usize,
    mac: MacHandle,
}

/// The two independent subkeys backing a single operation.
struct DerivedKeys {
    encryption: Secret,
    validation: Secret,
}

impl CbcHmacEncryptor {
    pub(crate) fn new(
        master_key: Secret,
        cipher: CipherHandle,
        cipher_key_len: usize,
        mac: MacHandle,
    ) -> Self {
        Self { master_key, cipher, cipher_key_len, mac }
    }

    /// Protect `plaintext`, binding (but not encrypting) `aad`.
    ///
    /// Returns the self-describing packet
    /// `key_modifier || iv || ciphertext || tag`. Two calls with identical
    /// inputs produce different packets: the key modifier and IV are drawn
    /// fresh from the secure random source every time.
    pub fn encrypt(&self, plaintext: &[u8], aad: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let mut key_modifier = [0u8; KEY_MODIFIER_LEN];
        getrandom::getrandom(&mut key_modifier).map_err(|_| CryptoError::RandomSourceFailed)?;

        let keys = self.derive_keys(&key_modifier, aad)?;

        let mut iv = vec![0u8; self.cipher.block_len()];
        getrandom::getrandom(&mut iv).map_err(|_| CryptoError::RandomSourceFailed)?;

        let ciphertext = self.cipher.encrypt_cbc(keys.encryption.as_bytes(), &iv, plaintext)?;
        let tag = self.mac.compute(
            keys.validation.as_bytes(),
            &[key_modifier.as_slice(), iv.as_slice(), ciphertext.as_slice(), aad],
        );

        Ok(wire::encode_packet(&key_modifier, &iv, &ciphertext, &tag))
    }

    /// Verify and unprotect `packet`. The `aad` must match the value given
    /// at encryption time.
    ///
    /// Any tampered or garbled input fails with
    /// [`CryptoError::AuthenticationFailed`]; the tag comparison runs in
    /// constant time and no decryption is attempted on a mismatch.
    pub fn decrypt(&self, packet: &[u8], aad: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let parts = wire::decode_packet(packet, self.cipher.block_len(), self.mac.digest_len())?;

        let keys = self.derive_keys(parts.key_modifier, aad)?;
        let expected = self.mac.compute(
            keys.validation.as_bytes(),
            &[parts.key_modifier, parts.iv, parts.ciphertext, aad],
        );
        if !bool::from(expected.ct_eq(parts.tag)) {
            return Err(CryptoError::AuthenticationFailed);
        }

        // The tag is valid, so the ciphertext is the one we produced and its
        // padding must parse. A failure here is not a recoverable condition.
        self.cipher
            .decrypt_cbc(keys.encryption.as_bytes(), parts.iv, parts.ciphertext)
            .map_err(|_| CryptoError::Internal)
    }

    /// Describe a packet's field layout under this engine's configuration.
    pub fn inspect(&self, packet: &[u8]) -> Result<PacketInfo, CryptoError> {
        wire::inspect(packet, self.cipher.block_len(), self.mac.digest_len())
    }

    /// Encrypt-then-decrypt a random payload and verify the round trip.
    ///
    /// Run at configuration time to catch a misconfigured algorithm pair
    /// before the engine is trusted with real traffic.
    pub fn perform_self_test(&self) -> Result<(), CryptoError> {
        let mut payload = vec![0u8; SELF_TEST_PAYLOAD_LEN];
        getrandom::getrandom(&mut payload).map_err(|_| CryptoError::RandomSourceFailed)?;

        let packet = self.encrypt(&payload, b"")?;
        let roundtripped = self.decrypt(&packet, b"")?;
        if roundtripped != payload {
            return Err(CryptoError::SelfTestFailed);
        }
        Ok(())
    }

    /// Master key length used by configuration-time self-tests.
    pub(crate) fn self_test_key_len() -> usize {
        SELF_TEST_KEY_LEN
    }

    fn derive_keys(&self, key_modifier: &[u8], aad: &[u8]) -> Result<DerivedKeys, CryptoError> {
        let context = kdf_context(key_modifier, aad);
        let encryption = kdf::derive(
            self.mac.as_ref(),
            &self.master_key,
            ENCRYPTION_LABEL,
            &context,
            self.cipher_key_len,
        )?;
        let validation = kdf::derive(
            self.mac.as_ref(),
            &self.master_key,
            VALIDATION_LABEL,
            &context,
            self.mac.digest_len(),
        )?;
        Ok(DerivedKeys { encryption, validation })
    }
}

/// Length-prefixed concatenation of key modifier and AAD.
fn kdf_context(key_modifier: &[u8], aad: &[u8]) -> Vec<u8> {
    let mut context = Vec::with_capacity(16 + key_modifier.len() + aad.len());
    context.extend_from_slice(&(key_modifier.len() as u64).to_be_bytes());
    context.extend_from_slice(key_modifier);
    context.extend_from_slice(&(aad.len() as u64).to_be_bytes());
    context.extend_from_slice(aad);
    context
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::cipher::AesCbc;
    use crate::mac::HmacAlgorithm;

    fn engine() -> CbcHmacEncryptor {
        CbcHmacEncryptor::new(
            Secret::new(vec![0x4D; 64]),
            Arc::new(AesCbc),
            32,
            Arc::new(HmacAlgorithm::sha256()),
        )
    }

    #[test]
    fn encrypt_is_randomized() {
        let engine = engine();
        let a = engine.encrypt(b"payload", b"aad").unwrap();
        let b = engine.encrypt(b"payload", b"aad").unwrap();
        assert_ne!(a, b);
        // Fresh key modifier and IV every call.
        assert_ne!(&a[..KEY_MODIFIER_LEN], &b[..KEY_MODIFIER_LEN]);
        assert_ne!(&a[KEY_MODIFIER_LEN..KEY_MODIFIER_LEN + 16], &b[KEY_MODIFIER_LEN..KEY_MODIFIER_LEN + 16]);
    }

    #[test]
    fn decrypt_is_deterministic() {
        let engine = engine();
        let packet = engine.encrypt(b"payload", b"aad").unwrap();
        let a = engine.decrypt(&packet, b"aad").unwrap();
        let b = engine.decrypt(&packet, b"aad").unwrap();
        assert_eq!(a, b);
        assert_eq!(a, b"payload");
    }

    #[test]
    fn kdf_context_is_injective_across_split_points() {
        assert_ne!(kdf_context(b"ab", b"c"), kdf_context(b"a", b"bc"));
        assert_ne!(kdf_context(b"", b"ab"), kdf_context(b"ab", b""));
    }

    #[test]
    fn self_test_passes_on_sane_configuration() {
        engine().perform_self_test().unwrap();
    }

    #[test]
    fn packet_geometry_matches_configuration() {
        let engine = engine();
        let packet = engine.encrypt(&[0u8; 33], b"").unwrap();
        let info = engine.inspect(&packet).unwrap();
        assert_eq!(info.key_modifier_len, KEY_MODIFIER_LEN);
        assert_eq!(info.iv_len, 16);
        // 33 bytes pads up to 48.
        assert_eq!(info.ciphertext_len, 48);
        assert_eq!(info.tag_len, 32);
    }
}
