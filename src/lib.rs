//! Entropy-pool random number generation.
//!
//! A cryptographically strong generator that gathers entropy from
//! heterogeneous platform sources, accumulates it in a cipher/MAC based pool
//! and optionally reshapes its output through an ANSI X9.31 wrapper.
//!
//! # Architecture
//!
//! ```text
//! entropy sources → Randpool → X931Rng (optional) → caller
//!        ↑              ↑           ↑
//!   SourceId registry   primitives (BlockCipher, KeyedMac)
//! ```
//!
//! [`make_rng`] assembles the standard stack and returns it seeded.
//!
//! # Design Principles
//!
//! - **Fail-closed**: no output is produced before the entropy threshold is met
//! - **Owned state**: no global generator; each instance owns its secrets
//!   and wipes them on `clear` and on drop
//! - **Standard primitives**: AES and HMAC(SHA-256) by default, keyed BLAKE3
//!   as an alternative MAC
//!
//! # Example
//!
//! ```no_run
//! use poolrng::RandomNumberGenerator;
//!
//! let mut rng = poolrng::make_rng().expect("no entropy source available");
//!
//! let mut key = [0u8; 32];
//! rng.randomize(&mut key).expect("generator failed");
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod assembler;
pub mod config;
pub mod entropy;
pub mod metrics;
pub mod primitives;
pub mod rng;

// Re-export commonly used types at crate root
pub use assembler::{make_rng, make_rng_with};
pub use config::{ConfigError, FileConfig, RngConfig};
pub use entropy::{EntropySource, SourceId, SourceSettings};
pub use primitives::{BlockCipher, CipherAlgorithm, KeyedMac, MacAlgorithm, PrimitiveError};
pub use rng::{
    PoolConfig, RandomNumberGenerator, Randpool, RngCoreAdapter, RngError, RngStats,
    X931Config, X931Rng,
};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
