//! Packet layout
//!
//! Format:
//!   key_modifier[16] || iv[block_len] || ciphertext[block_len * n, n >= 1] || tag[digest_len]
//!
//! Fields carry no length prefixes: every length is fixed by the negotiated
//! algorithm configuration, which both the encrypt and decrypt sides must
//! share. The authentication tag covers key_modifier || iv || ciphertext
//! plus the caller's additional authenticated data.

use std::fmt;

use crate::error::CryptoError;

/// Length of the per-operation key modifier (the KDF salt), in bytes.
pub const KEY_MODIFIER_LEN: usize = 16;

/// Borrowed view of a parsed packet.
#[derive(Debug, Clone, Copy)]
pub struct PacketComponents<'a> {
    /// Random per-operation KDF salt.
    pub key_modifier: &'a [u8],
    /// CBC initialization vector, one cipher block.
    pub iv: &'a [u8],
    /// CBC output; a nonzero multiple of the cipher block length.
    pub ciphertext: &'a [u8],
    /// Keyed-hash output over the preceding fields plus the AAD.
    pub tag: &'a [u8],
}

/// Split `data` into packet fields for the given algorithm geometry.
///
/// Returns `AuthenticationFailed` for any packet whose shape is impossible
/// under the configured algorithms; malformed input is indistinguishable
/// from a tampered tag by design.
pub fn decode_packet(
    data: &[u8],
    block_len: usize,
    digest_len: usize,
) -> Result<PacketComponents<'_>, CryptoError> {
    // Smallest well-formed packet carries exactly one ciphertext block.
    let overhead = KEY_MODIFIER_LEN + block_len + digest_len;
    let min_len = overhead + block_len;
    if data.len() < min_len {
        return Err(CryptoError::AuthenticationFailed);
    }

    let ciphertext_len = data.len() - overhead;
    if ciphertext_len % block_len != 0 {
        return Err(CryptoError::AuthenticationFailed);
    }

    let (key_modifier, rest) = data.split_at(KEY_MODIFIER_LEN);
    let (iv, rest) = rest.split_at(block_len);
    let (ciphertext, tag) = rest.split_at(ciphertext_len);

    Ok(PacketComponents { key_modifier, iv, ciphertext, tag })
}

/// Assemble a packet from its fields.
pub fn encode_packet(key_modifier: &[u8], iv: &[u8], ciphertext: &[u8], tag: &[u8]) -> Vec<u8> {
    let mut out =
        Vec::with_capacity(key_modifier.len() + iv.len() + ciphertext.len() + tag.len());
    out.extend_from_slice(key_modifier);
    out.extend_from_slice(iv);
    out.extend_from_slice(ciphertext);
    out.extend_from_slice(tag);
    out
}

// ---------------------------------------------------------------------------
// Inspection (ops tooling; reveals nothing secret)
// ---------------------------------------------------------------------------

/// Packet field geometry, extracted without any key material.
#[derive(Debug, Clone)]
pub struct PacketInfo {
    /// Key modifier length in bytes.
    pub key_modifier_len: usize,
    /// IV length in bytes.
    pub iv_len: usize,
    /// Ciphertext length in bytes.
    pub ciphertext_len: usize,
    /// Authentication tag length in bytes.
    pub tag_len: usize,
    /// Total packet length in bytes.
    pub total_len: usize,
}

impl fmt::Display for PacketInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} bytes (modifier {} | iv {} | ciphertext {} | tag {})",
            self.total_len, self.key_modifier_len, self.iv_len, self.ciphertext_len, self.tag_len
        )
    }
}

/// Describe a packet's field layout for the given algorithm geometry.
pub fn inspect(data: &[u8], block_len: usize, digest_len: usize) -> Result<PacketInfo, CryptoError> {
    let parts = decode_packet(data, block_len, digest_len)?;
    Ok(PacketInfo {
        key_modifier_len: parts.key_modifier.len(),
        iv_len: parts.iv.len(),
        ciphertext_len: parts.ciphertext.len(),
        tag_len: parts.tag.len(),
        total_len: data.len(),
    })
}
