//! Symmetric block ciphers in CBC chaining mode.
//!
//! A [`BlockCipher`] handle is key-size agnostic: the handle describes the
//! algorithm (block length, supported key lengths) and each call supplies
//! its own key and IV. Handles are read-only after construction and safe
//! for concurrent use.

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use aes::{Aes128, Aes192, Aes256};

use crate::error::CryptoError;

type Aes128CbcEnc = cbc::Encryptor<Aes128>;
type Aes128CbcDec = cbc::Decryptor<Aes128>;
type Aes192CbcEnc = cbc::Encryptor<Aes192>;
type Aes192CbcDec = cbc::Decryptor<Aes192>;
type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

// ---------------------------------------------------------------------------
// Block cipher trait
// ---------------------------------------------------------------------------

/// An executable symmetric cipher, opened in CBC chaining mode.
pub trait BlockCipher: Send + Sync + std::fmt::Debug {
    /// Algorithm name as it appears in configuration (e.g. `"AES"`).
    fn name(&self) -> &str;

    /// Cipher block length in bytes.
    fn block_len(&self) -> usize;

    /// Key lengths (in bytes) the algorithm supports.
    fn supported_key_lengths(&self) -> &[usize];

    /// CBC-encrypt `plaintext` under `key`/`iv`, applying PKCS#7 padding.
    ///
    /// The output length is the plaintext length rounded up to the next
    /// whole block (an exact multiple gains one full padding block).
    fn encrypt_cbc(&self, key: &[u8], iv: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, CryptoError>;

    /// CBC-decrypt `ciphertext` under `key`/`iv` and strip PKCS#7 padding.
    ///
    /// Callers must verify the authentication tag first; this routine is
    /// only reached with ciphertext whose integrity is already established,
    /// so a padding failure here is an internal error, not a recoverable
    /// condition.
    fn decrypt_cbc(&self, key: &[u8], iv: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError>;
}

// ---------------------------------------------------------------------------
// AES-CBC
// ---------------------------------------------------------------------------

/// AES in CBC mode with PKCS#7 padding, for 128/192/256-bit keys.
#[derive(Debug)]
pub struct AesCbc;

impl AesCbc {
    /// Supported AES key lengths in bytes.
    pub const KEY_LENGTHS: [usize; 3] = [16, 24, 32];

    /// AES block length in bytes.
    pub const BLOCK_LEN: usize = 16;
}

impl BlockCipher for AesCbc {
    fn name(&self) -> &str {
        "AES"
    }

    fn block_len(&self) -> usize {
        Self::BLOCK_LEN
    }

    fn supported_key_lengths(&self) -> &[usize] {
        &Self::KEY_LENGTHS
    }

    fn encrypt_cbc(&self, key: &[u8], iv: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        match key.len() {
            16 => Aes128CbcEnc::new_from_slices(key, iv)
                .map(|enc| enc.encrypt_padded_vec_mut::<Pkcs7>(plaintext))
                .map_err(|_| CryptoError::Internal),
            24 => Aes192CbcEnc::new_from_slices(key, iv)
                .map(|enc| enc.encrypt_padded_vec_mut::<Pkcs7>(plaintext))
                .map_err(|_| CryptoError::Internal),
            32 => Aes256CbcEnc::new_from_slices(key, iv)
                .map(|enc| enc.encrypt_padded_vec_mut::<Pkcs7>(plaintext))
                .map_err(|_| CryptoError::Internal),
            _ => Err(CryptoError::Internal),
        }
    }

    fn decrypt_cbc(&self, key: &[u8], iv: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        match key.len() {
            16 => Aes128CbcDec::new_from_slices(key, iv)
                .map_err(|_| CryptoError::Internal)?
                .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
                .map_err(|_| CryptoError::Internal),
            24 => Aes192CbcDec::new_from_slices(key, iv)
                .map_err(|_| CryptoError::Internal)?
                .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
                .map_err(|_| CryptoError::Internal),
            32 => Aes256CbcDec::new_from_slices(key, iv)
                .map_err(|_| CryptoError::Internal)?
                .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
                .map_err(|_| CryptoError::Internal),
            _ => Err(CryptoError::Internal),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cbc_roundtrip_all_key_sizes() {
        let cipher = AesCbc;
        let iv = [0x24u8; 16];
        let plaintext = b"attack at dawn";

        for &key_len in cipher.supported_key_lengths() {
            let key = vec![0x42u8; key_len];
            let ct = cipher.encrypt_cbc(&key, &iv, plaintext).unwrap();
            assert_eq!(ct.len() % 16, 0);
            let pt = cipher.decrypt_cbc(&key, &iv, &ct).unwrap();
            assert_eq!(pt, plaintext);
        }
    }

    #[test]
    fn empty_plaintext_pads_to_one_block() {
        let cipher = AesCbc;
        let key = [0x01u8; 32];
        let iv = [0x02u8; 16];

        let ct = cipher.encrypt_cbc(&key, &iv, b"").unwrap();
        assert_eq!(ct.len(), 16);
        let pt = cipher.decrypt_cbc(&key, &iv, &ct).unwrap();
        assert!(pt.is_empty());
    }

    #[test]
    fn block_aligned_plaintext_gains_padding_block() {
        let cipher = AesCbc;
        let key = [0x01u8; 16];
        let iv = [0x02u8; 16];
        let plaintext = [0x33u8; 32];

        let ct = cipher.encrypt_cbc(&key, &iv, &plaintext).unwrap();
        assert_eq!(ct.len(), 48);
    }

    #[test]
    fn unsupported_key_length_is_rejected() {
        let cipher = AesCbc;
        let iv = [0u8; 16];
        assert!(cipher.encrypt_cbc(&[0u8; 8], &iv, b"x").is_err());
        assert!(cipher.decrypt_cbc(&[0u8; 8], &iv, &[0u8; 16]).is_err());
    }

    #[test]
    fn wrong_iv_corrupts_first_block_only() {
        let cipher = AesCbc;
        let key = [0x07u8; 32];
        let plaintext = [0x55u8; 48];

        let ct = cipher.encrypt_cbc(&key, &[0u8; 16], &plaintext).unwrap();
        let pt = cipher.decrypt_cbc(&key, &[1u8; 16], &ct).unwrap();
        assert_ne!(&pt[..16], &plaintext[..16]);
        assert_eq!(&pt[16..], &plaintext[16..48]);
    }
}
