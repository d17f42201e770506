//! Password-based key derivation (PBKDF2) with interchangeable backends.
//!
//! Two implementations sit behind [`Pbkdf2Provider`]:
//!
//! - [`PortablePbkdf2Provider`] — the block loop written out directly over
//!   the HMAC primitive;
//! - [`AcceleratedPbkdf2Provider`] — the optimized `pbkdf2` crate.
//!
//! Interchangeability is a conformance contract, not an optimization
//! detail: for identical inputs every backend must return byte-identical
//! output, including when the requested length straddles a digest-length
//! boundary and when the password is far longer than the HMAC block size.
//! A backend that diverges is a defect.

use hmac::digest::KeyInit;
use hmac::{Hmac, Mac};
use pbkdf2::pbkdf2_hmac;
use sha1::Sha1;
use sha2::{Sha256, Sha512};

use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// PRF selection
// ---------------------------------------------------------------------------

/// The pseudorandom function underlying a PBKDF2 derivation.
///
/// A closed set: these three are guaranteed supported, byte-identically,
/// across all backends.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyDerivationPrf {
    /// HMAC-SHA1 (160-bit digest).
    Sha1,
    /// HMAC-SHA256 (256-bit digest).
    Sha256,
    /// HMAC-SHA512 (512-bit digest).
    Sha512,
}

impl KeyDerivationPrf {
    /// Digest length of the PRF in bytes.
    pub fn digest_len(self) -> usize {
        match self {
            Self::Sha1 => 20,
            Self::Sha256 => 32,
            Self::Sha512 => 64,
        }
    }
}

// ---------------------------------------------------------------------------
// Provider trait
// ---------------------------------------------------------------------------

/// A PBKDF2 implementation.
pub trait Pbkdf2Provider: Send + Sync {
    /// Derive exactly `num_bytes_requested` bytes from `password` and
    /// `salt` with `iteration_count` rounds of `prf`.
    ///
    /// Fails fast with [`ConfigError::InvalidValue`] when
    /// `iteration_count` or `num_bytes_requested` is zero.
    fn derive_key(
        &self,
        password: &str,
        salt: &[u8],
        prf: KeyDerivationPrf,
        iteration_count: u32,
        num_bytes_requested: usize,
    ) -> Result<Vec<u8>, ConfigError>;
}

fn check_parameters(iteration_count: u32, num_bytes_requested: usize) -> Result<(), ConfigError> {
    if iteration_count < 1 {
        return Err(ConfigError::InvalidValue {
            name: "iteration_count",
            reason: "must be at least 1".into(),
        });
    }
    if num_bytes_requested < 1 {
        return Err(ConfigError::InvalidValue {
            name: "num_bytes_requested",
            reason: "must be at least 1".into(),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Portable backend
// ---------------------------------------------------------------------------

/// PBKDF2 written out directly over the HMAC primitive.
///
/// For each output block i = 1..ceil(n / digest_len):
/// U1 = PRF(password, salt || be32(i)), Uj = PRF(password, U(j-1)),
/// block_i = U1 xor U2 xor ... xor U(iteration_count).
pub struct PortablePbkdf2Provider;

fn derive_portable<M: Mac + KeyInit + Clone>(
    password: &[u8],
    salt: &[u8],
    iteration_count: u32,
    num_bytes_requested: usize,
) -> Vec<u8> {
    // Keying through the HMAC constructor hashes over-long passwords down
    // per the keyed-hash rules instead of truncating them.
    let Ok(prf) = <M as Mac>::new_from_slice(password) else {
        unreachable!("HMAC accepts keys of any length");
    };

    let mut output = Vec::with_capacity(num_bytes_requested);
    let mut block_index: u32 = 1;
    while output.len() < num_bytes_requested {
        let mut mac = prf.clone();
        mac.update(salt);
        mac.update(&block_index.to_be_bytes());
        let mut u = mac.finalize().into_bytes();

        let mut block = u.as_slice().to_vec();
        for _ in 1..iteration_count {
            let mut mac = prf.clone();
            mac.update(u.as_slice());
            u = mac.finalize().into_bytes();
            for (acc, byte) in block.iter_mut().zip(u.as_slice()) {
                *acc ^= *byte;
            }
        }

        output.extend_from_slice(&block);
        block_index += 1;
    }
    output.truncate(num_bytes_requested);
    output
}

impl Pbkdf2Provider for PortablePbkdf2Provider {
    fn derive_key(
        &self,
        password: &str,
        salt: &[u8],
        prf: KeyDerivationPrf,
        iteration_count: u32,
        num_bytes_requested: usize,
    ) -> Result<Vec<u8>, ConfigError> {
        check_parameters(iteration_count, num_bytes_requested)?;
        let password = password.as_bytes();
        Ok(match prf {
            KeyDerivationPrf::Sha1 => {
                derive_portable::<Hmac<Sha1>>(password, salt, iteration_count, num_bytes_requested)
            }
            KeyDerivationPrf::Sha256 => {
                derive_portable::<Hmac<Sha256>>(password, salt, iteration_count, num_bytes_requested)
            }
            KeyDerivationPrf::Sha512 => {
                derive_portable::<Hmac<Sha512>>(password, salt, iteration_count, num_bytes_requested)
            }
        })
    }
}

// ---------------------------------------------------------------------------
// Accelerated backend
// ---------------------------------------------------------------------------

/// PBKDF2 delegating to the optimized `pbkdf2` crate implementation.
pub struct AcceleratedPbkdf2Provider;

impl Pbkdf2Provider for AcceleratedPbkdf2Provider {
    fn derive_key(
        &self,
        password: &str,
        salt: &[u8],
        prf: KeyDerivationPrf,
        iteration_count: u32,
        num_bytes_requested: usize,
    ) -> Result<Vec<u8>, ConfigError> {
        check_parameters(iteration_count, num_bytes_requested)?;
        let mut output = vec![0u8; num_bytes_requested];
        match prf {
            KeyDerivationPrf::Sha1 => {
                pbkdf2_hmac::<Sha1>(password.as_bytes(), salt, iteration_count, &mut output);
            }
            KeyDerivationPrf::Sha256 => {
                pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iteration_count, &mut output);
            }
            KeyDerivationPrf::Sha512 => {
                pbkdf2_hmac::<Sha512>(password.as_bytes(), salt, iteration_count, &mut output);
            }
        }
        Ok(output)
    }
}

// ---------------------------------------------------------------------------
// Default entry point
// ---------------------------------------------------------------------------

/// Derive key bytes from a password with the default (accelerated) backend.
pub fn derive_key(
    password: &str,
    salt: &[u8],
    prf: KeyDerivationPrf,
    iteration_count: u32,
    num_bytes_requested: usize,
) -> Result<Vec<u8>, ConfigError> {
    AcceleratedPbkdf2Provider.derive_key(password, salt, prf, iteration_count, num_bytes_requested)
}
