//! Keyed hash (MAC) primitives.
//!
//! A [`MacAlgorithm`] handle is the hash algorithm opened in HMAC mode. It
//! carries no key of its own; each computation is keyed by the caller, so a
//! single handle serves any number of concurrent operations.

use hmac::digest::KeyInit;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::{Sha256, Sha512};

// ---------------------------------------------------------------------------
// MAC trait
// ---------------------------------------------------------------------------

/// An executable keyed-hash algorithm.
pub trait MacAlgorithm: Send + Sync {
    /// Algorithm name as it appears in configuration (e.g. `"SHA256"`).
    fn name(&self) -> &str;

    /// Digest (tag) length in bytes.
    fn digest_len(&self) -> usize;

    /// Compute the keyed hash of `parts` concatenated in order.
    ///
    /// Keys longer than the hash block size are hashed down per the HMAC
    /// construction rather than truncated.
    fn compute(&self, key: &[u8], parts: &[&[u8]]) -> Vec<u8>;
}

// ---------------------------------------------------------------------------
// HMAC over the built-in hash set
// ---------------------------------------------------------------------------

#[derive(Clone, Copy)]
enum HashKind {
    Sha1,
    Sha256,
    Sha512,
}

/// A hash algorithm opened in HMAC mode.
pub struct HmacAlgorithm {
    kind: HashKind,
}

impl HmacAlgorithm {
    /// HMAC-SHA1 (160-bit digest).
    pub fn sha1() -> Self {
        Self { kind: HashKind::Sha1 }
    }

    /// HMAC-SHA256 (256-bit digest).
    pub fn sha256() -> Self {
        Self { kind: HashKind::Sha256 }
    }

    /// HMAC-SHA512 (512-bit digest).
    pub fn sha512() -> Self {
        Self { kind: HashKind::Sha512 }
    }
}

fn keyed_hash<M: Mac + KeyInit>(key: &[u8], parts: &[&[u8]]) -> Vec<u8> {
    let Ok(mut mac) = <M as Mac>::new_from_slice(key) else {
        unreachable!("HMAC accepts keys of any length");
    };
    for part in parts {
        mac.update(part);
    }
    mac.finalize().into_bytes().to_vec()
}

impl MacAlgorithm for HmacAlgorithm {
    fn name(&self) -> &str {
        match self.kind {
            HashKind::Sha1 => "SHA1",
            HashKind::Sha256 => "SHA256",
            HashKind::Sha512 => "SHA512",
        }
    }

    fn digest_len(&self) -> usize {
        match self.kind {
            HashKind::Sha1 => 20,
            HashKind::Sha256 => 32,
            HashKind::Sha512 => 64,
        }
    }

    fn compute(&self, key: &[u8], parts: &[&[u8]]) -> Vec<u8> {
        match self.kind {
            HashKind::Sha1 => keyed_hash::<Hmac<Sha1>>(key, parts),
            HashKind::Sha256 => keyed_hash::<Hmac<Sha256>>(key, parts),
            HashKind::Sha512 => keyed_hash::<Hmac<Sha512>>(key, parts),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_lengths_match_output() {
        for mac in [HmacAlgorithm::sha1(), HmacAlgorithm::sha256(), HmacAlgorithm::sha512()] {
            let tag = mac.compute(b"key", &[b"data"]);
            assert_eq!(tag.len(), mac.digest_len());
        }
    }

    #[test]
    fn multipart_equals_concatenated() {
        let mac = HmacAlgorithm::sha256();
        let joined = mac.compute(b"key", &[b"hello world"]);
        let split = mac.compute(b"key", &[b"hello", b" ", b"world"]);
        assert_eq!(joined, split);
    }

    #[test]
    fn rfc4231_case_2_sha256() {
        // RFC 4231 test case 2: key "Jefe", data "what do ya want for nothing?"
        let mac = HmacAlgorithm::sha256();
        let tag = mac.compute(b"Jefe", &[b"what do ya want for nothing?"]);
        assert_eq!(
            hex::encode(tag),
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn oversized_key_is_hashed_not_truncated() {
        let mac = HmacAlgorithm::sha256();
        let long_key = vec![0x61u8; 500];
        // If the key were truncated to the block size, these would collide.
        let mut longer_key = long_key.clone();
        longer_key.push(0x62);
        assert_ne!(mac.compute(&long_key, &[b"data"]), mac.compute(&longer_key, &[b"data"]));
    }
}
