//! Keyed primitives consumed by the generators.
//!
//! The generators never look inside a block cipher or a MAC; they only
//! key them and call them as opaque transforms. This module defines that
//! seam and ships adapters over the RustCrypto and BLAKE3 implementations.

mod cipher;
mod mac;

pub use cipher::{AesCipher, BlockCipher, CipherAlgorithm};
pub use mac::{Blake3Mac, HmacSha256, KeyedMac, MacAlgorithm};

use thiserror::Error;

/// Errors raised when keying or combining primitives.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PrimitiveError {
    #[error("{algorithm}: invalid key length {got}, expected {expected}")]
    InvalidKeyLength {
        algorithm: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("{algorithm}: invalid block length {got}, expected {expected}")]
    InvalidBlockLength {
        algorithm: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("incompatible primitives: {reason}")]
    Incompatible { reason: String },
}
