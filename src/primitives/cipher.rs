//! Block cipher seam and AES adapters.

use super::PrimitiveError;
use aes::cipher::{generic_array::GenericArray, BlockEncrypt, KeyInit};
use aes::{Aes128, Aes256};
use serde::{Deserialize, Serialize};

/// A keyed block cipher, used only in the encrypt direction.
pub trait BlockCipher: Send {
    /// Algorithm name, for logging.
    fn name(&self) -> &'static str;

    /// Block size in bytes.
    fn block_size(&self) -> usize;

    /// Key size in bytes accepted by [`BlockCipher::set_key`].
    fn key_size(&self) -> usize;

    /// Replaces the current key.
    fn set_key(&mut self, key: &[u8]) -> Result<(), PrimitiveError>;

    /// Encrypts exactly one block in place.
    fn encrypt_block(&self, block: &mut [u8]) -> Result<(), PrimitiveError>;

    /// Drops the current key and reverts to the all-zero key.
    fn clear(&mut self);
}

/// Supported block ciphers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CipherAlgorithm {
    /// AES with a 128-bit key.
    Aes128,
    /// AES with a 256-bit key, the default.
    #[default]
    Aes256,
}

impl CipherAlgorithm {
    /// Creates a fresh, zero-keyed cipher instance.
    pub fn instantiate(self) -> Box<dyn BlockCipher> {
        match self {
            CipherAlgorithm::Aes128 => Box::new(AesCipher::aes128()),
            CipherAlgorithm::Aes256 => Box::new(AesCipher::aes256()),
        }
    }
}

enum AesKeyed {
    Aes128(Aes128),
    Aes256(Aes256),
}

/// AES adapter over the `aes` crate.
///
/// The key schedule zeroizes itself on drop; a new one replaces the old
/// on every `set_key`.
pub struct AesCipher {
    algorithm: CipherAlgorithm,
    inner: AesKeyed,
}

const AES_BLOCK: usize = 16;

impl AesCipher {
    /// AES-128 keyed with zeros.
    pub fn aes128() -> Self {
        Self::zero_keyed(CipherAlgorithm::Aes128)
    }

    /// AES-256 keyed with zeros.
    pub fn aes256() -> Self {
        Self::zero_keyed(CipherAlgorithm::Aes256)
    }

    fn zero_keyed(algorithm: CipherAlgorithm) -> Self {
        let inner = match algorithm {
            CipherAlgorithm::Aes128 => AesKeyed::Aes128(Aes128::new(&GenericArray::default())),
            CipherAlgorithm::Aes256 => AesKeyed::Aes256(Aes256::new(&GenericArray::default())),
        };
        Self { algorithm, inner }
    }
}

impl BlockCipher for AesCipher {
    fn name(&self) -> &'static str {
        match self.algorithm {
            CipherAlgorithm::Aes128 => "AES-128",
            CipherAlgorithm::Aes256 => "AES-256",
        }
    }

    fn block_size(&self) -> usize {
        AES_BLOCK
    }

    fn key_size(&self) -> usize {
        match self.algorithm {
            CipherAlgorithm::Aes128 => 16,
            CipherAlgorithm::Aes256 => 32,
        }
    }

    fn set_key(&mut self, key: &[u8]) -> Result<(), PrimitiveError> {
        let (algorithm, expected) = (self.name(), self.key_size());
        let invalid = || PrimitiveError::InvalidKeyLength {
            algorithm,
            expected,
            got: key.len(),
        };
        self.inner = match self.algorithm {
            CipherAlgorithm::Aes128 => {
                AesKeyed::Aes128(Aes128::new_from_slice(key).map_err(|_| invalid())?)
            }
            CipherAlgorithm::Aes256 => {
                AesKeyed::Aes256(Aes256::new_from_slice(key).map_err(|_| invalid())?)
            }
        };
        Ok(())
    }

    fn encrypt_block(&self, block: &mut [u8]) -> Result<(), PrimitiveError> {
        if block.len() != AES_BLOCK {
            return Err(PrimitiveError::InvalidBlockLength {
                algorithm: self.name(),
                expected: AES_BLOCK,
                got: block.len(),
            });
        }
        let block = GenericArray::from_mut_slice(block);
        match &self.inner {
            AesKeyed::Aes128(c) => c.encrypt_block(block),
            AesKeyed::Aes256(c) => c.encrypt_block(block),
        }
        Ok(())
    }

    fn clear(&mut self) {
        *self = Self::zero_keyed(self.algorithm);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aes256_known_answer() {
        // FIPS-197 appendix C.3
        let key: Vec<u8> = (0u8..32).collect();
        let mut block: Vec<u8> = (0u8..16).map(|i| i * 0x11).collect();

        let mut cipher = AesCipher::aes256();
        cipher.set_key(&key).unwrap();
        cipher.encrypt_block(&mut block).unwrap();

        assert_eq!(
            block,
            [
                0x8e, 0xa2, 0xb7, 0xca, 0x51, 0x67, 0x45, 0xbf, 0xea, 0xfc, 0x49, 0x90, 0x4b,
                0x49, 0x60, 0x89
            ]
        );
    }

    #[test]
    fn test_wrong_key_length_rejected() {
        let mut cipher = AesCipher::aes128();
        let result = cipher.set_key(&[0u8; 32]);
        assert!(matches!(
            result,
            Err(PrimitiveError::InvalidKeyLength {
                expected: 16,
                got: 32,
                ..
            })
        ));
    }

    #[test]
    fn test_wrong_block_length_rejected() {
        let cipher = AesCipher::aes256();
        let mut block = [0u8; 15];
        assert!(cipher.encrypt_block(&mut block).is_err());
    }

    #[test]
    fn test_clear_reverts_to_zero_key() {
        let mut keyed = AesCipher::aes128();
        keyed.set_key(&[0x42; 16]).unwrap();
        keyed.clear();

        let fresh = AesCipher::aes128();
        let mut a = [7u8; 16];
        let mut b = [7u8; 16];
        keyed.encrypt_block(&mut a).unwrap();
        fresh.encrypt_block(&mut b).unwrap();
        assert_eq!(a, b);
    }
}
