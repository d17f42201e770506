//! Subkey derivation (SP 800-108, counter mode)
//!
//! block_i = MAC(master, be32(i) || label || 0x00 || context || be32(output_bits))
//! output  = block_1 || block_2 || ... truncated to the requested length
//!
//! The single 0x00 octet separates label from context, and the trailing
//! output length keeps derivations of different lengths independent. The
//! construction is deterministic: identical inputs always yield identical
//! subkeys, and distinct (label, context) pairs yield independent ones.

use crate::error::CryptoError;
use crate::mac::MacAlgorithm;
use crate::secret::Secret;

/// Derive `output_len` bytes from `master_key`, separated by `label` and
/// `context`, using `prf` as the underlying keyed hash.
pub fn derive(
    prf: &dyn MacAlgorithm,
    master_key: &Secret,
    label: &[u8],
    context: &[u8],
    output_len: usize,
) -> Result<Secret, CryptoError> {
    // One subkey longer than 2^32 - 1 bits has no practical use; reject it
    // rather than let the length field wrap.
    let output_bits = u32::try_from(output_len)
        .ok()
        .and_then(|n| n.checked_mul(8))
        .ok_or(CryptoError::Internal)?;

    let mut output = Vec::with_capacity(output_len.next_multiple_of(prf.digest_len().max(1)));
    let mut counter: u32 = 1;
    while output.len() < output_len {
        let block = prf.compute(
            master_key.as_bytes(),
            &[&counter.to_be_bytes(), label, &[0x00], context, &output_bits.to_be_bytes()],
        );
        output.extend_from_slice(&block);
        counter = counter.checked_add(1).ok_or(CryptoError::Internal)?;
    }
    output.truncate(output_len);

    Ok(Secret::new(output))
}
