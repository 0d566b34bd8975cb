//! Keyed MAC seam with HMAC-SHA-256 and keyed BLAKE3 adapters.

use super::PrimitiveError;
use hmac::{Hmac, Mac as _};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zeroize::Zeroizing;

/// Context string used to fit arbitrary key material into a BLAKE3 key.
const BLAKE3_KEY_CONTEXT: &str = "poolrng 2026-01 keyed blake3 mac key";

/// A keyed message authentication code used as a one-way mixing function.
pub trait KeyedMac: Send {
    /// Algorithm name, for logging.
    fn name(&self) -> &'static str;

    /// Tag length in bytes.
    fn output_size(&self) -> usize;

    /// Replaces the current key. Any key length is accepted.
    fn set_key(&mut self, key: &[u8]) -> Result<(), PrimitiveError>;

    /// Computes the tag over the concatenation of `parts`.
    fn mac(&self, parts: &[&[u8]]) -> Zeroizing<Vec<u8>>;

    /// Drops the current key and reverts to the empty key.
    fn clear(&mut self);
}

/// Supported MACs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MacAlgorithm {
    /// HMAC over SHA-256, the conservative default.
    #[default]
    HmacSha256,
    /// BLAKE3 in keyed mode.
    Blake3,
}

impl MacAlgorithm {
    /// Creates a fresh MAC instance keyed with the empty key.
    pub fn instantiate(self) -> Box<dyn KeyedMac> {
        match self {
            MacAlgorithm::HmacSha256 => Box::new(HmacSha256::new()),
            MacAlgorithm::Blake3 => Box::new(Blake3Mac::new()),
        }
    }
}

/// HMAC(SHA-256).
pub struct HmacSha256 {
    keyed: Hmac<Sha256>,
}

impl HmacSha256 {
    /// HMAC keyed with the empty key.
    pub fn new() -> Self {
        Self {
            keyed: Self::keyed_with(&[]),
        }
    }

    fn keyed_with(key: &[u8]) -> Hmac<Sha256> {
        // HMAC accepts keys of any length; the Err arm is unreachable.
        match Hmac::<Sha256>::new_from_slice(key) {
            Ok(mac) => mac,
            Err(_) => unreachable!("HMAC accepts any key length"),
        }
    }
}

impl Default for HmacSha256 {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyedMac for HmacSha256 {
    fn name(&self) -> &'static str {
        "HMAC(SHA-256)"
    }

    fn output_size(&self) -> usize {
        32
    }

    fn set_key(&mut self, key: &[u8]) -> Result<(), PrimitiveError> {
        self.keyed = Self::keyed_with(key);
        Ok(())
    }

    fn mac(&self, parts: &[&[u8]]) -> Zeroizing<Vec<u8>> {
        let mut mac = self.keyed.clone();
        for part in parts {
            mac.update(part);
        }
        Zeroizing::new(mac.finalize().into_bytes().to_vec())
    }

    fn clear(&mut self) {
        self.keyed = Self::keyed_with(&[]);
    }
}

/// BLAKE3 keyed hash.
///
/// Keys that are not exactly 32 bytes are first reduced with the BLAKE3
/// key derivation mode.
pub struct Blake3Mac {
    key: Zeroizing<[u8; 32]>,
}

impl Blake3Mac {
    /// BLAKE3 keyed with the derived empty key.
    pub fn new() -> Self {
        Self {
            key: Zeroizing::new(blake3::derive_key(BLAKE3_KEY_CONTEXT, &[])),
        }
    }
}

impl Default for Blake3Mac {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyedMac for Blake3Mac {
    fn name(&self) -> &'static str {
        "BLAKE3"
    }

    fn output_size(&self) -> usize {
        blake3::OUT_LEN
    }

    fn set_key(&mut self, key: &[u8]) -> Result<(), PrimitiveError> {
        let key: [u8; 32] = match key.try_into() {
            Ok(exact) => exact,
            Err(_) => blake3::derive_key(BLAKE3_KEY_CONTEXT, key),
        };
        self.key = Zeroizing::new(key);
        Ok(())
    }

    fn mac(&self, parts: &[&[u8]]) -> Zeroizing<Vec<u8>> {
        let mut hasher = blake3::Hasher::new_keyed(&self.key);
        for part in parts {
            hasher.update(part);
        }
        Zeroizing::new(hasher.finalize().as_bytes().to_vec())
    }

    fn clear(&mut self) {
        self.key = Zeroizing::new(blake3::derive_key(BLAKE3_KEY_CONTEXT, &[]));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hmac_sha256_rfc4231_case2() {
        let mut mac = HmacSha256::new();
        mac.set_key(b"Jefe").unwrap();
        let tag = mac.mac(&[b"what do ya want ", b"for nothing?"]);

        assert_eq!(
            tag.as_slice(),
            [
                0x5b, 0xdc, 0xc1, 0x46, 0xbf, 0x60, 0x75, 0x4e, 0x6a, 0x04, 0x24, 0x26, 0x08,
                0x95, 0x75, 0xc7, 0x5a, 0x00, 0x3f, 0x08, 0x9d, 0x27, 0x39, 0x83, 0x9d, 0xec,
                0x58, 0xb9, 0x64, 0xec, 0x38, 0x43
            ]
        );
    }

    #[test]
    fn test_parts_are_concatenated() {
        for algorithm in [MacAlgorithm::HmacSha256, MacAlgorithm::Blake3] {
            let mac = algorithm.instantiate();
            assert_eq!(mac.mac(&[b"ab", b"cd"]), mac.mac(&[b"abcd"]));
        }
    }

    #[test]
    fn test_blake3_key_changes_tag() {
        let mut mac = Blake3Mac::new();
        let before = mac.mac(&[b"pool"]);
        mac.set_key(&[0x11; 7]).unwrap();
        let after = mac.mac(&[b"pool"]);
        assert_ne!(before, after);
        assert_eq!(after.len(), mac.output_size());
    }

    #[test]
    fn test_clear_restores_default_key() {
        let mut mac = HmacSha256::new();
        let fresh = mac.mac(&[b"x"]);
        mac.set_key(b"secret").unwrap();
        mac.clear();
        assert_eq!(mac.mac(&[b"x"]), fresh);
    }
}
