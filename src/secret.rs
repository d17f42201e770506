//! Owned key material, zeroed on release.

use std::fmt;

use zeroize::Zeroizing;

use crate::error::CryptoError;

/// An owned, fixed-length byte buffer holding key material.
///
/// The buffer is zeroed when the `Secret` is dropped, on every exit path.
/// Copies are never implicit: cloning is the only way to duplicate the
/// material, and each clone is zeroed independently.
///
/// `Secret` deliberately implements neither `Display` nor a revealing
/// `Debug`; key bytes never reach log output.
pub struct Secret {
    bytes: Zeroizing<Vec<u8>>,
}

impl Secret {
    /// Take ownership of existing key material.
    ///
    /// The caller's buffer is moved in, so no unzeroed copy is left behind.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes: Zeroizing::new(bytes) }
    }

    /// Create a secret of `len` bytes from the secure random source.
    pub fn random(len: usize) -> Result<Self, CryptoError> {
        let mut bytes = Zeroizing::new(vec![0u8; len]);
        getrandom::getrandom(&mut bytes).map_err(|_| CryptoError::RandomSourceFailed)?;
        Ok(Self { bytes })
    }

    /// Length of the key material in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the secret is empty.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Read access for cryptographic operations within the crate.
    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl Clone for Secret {
    /// Explicit duplication. The copy owns its own buffer and is zeroed
    /// independently of the original.
    fn clone(&self) -> Self {
        Self { bytes: Zeroizing::new(self.bytes.to_vec()) }
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret({} bytes)", self.bytes.len())
    }
}
