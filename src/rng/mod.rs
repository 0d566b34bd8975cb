//! Random number generators.
//!
//! [`Randpool`] is the entropy-pool generator that owns the sources and the
//! secret state. [`X931Rng`] is an optional ANSI X9.31 decorator that
//! reshapes another generator's output; it is never a source of entropy
//! on its own.

mod adapter;
mod randpool;
mod x931;

pub use adapter::RngCoreAdapter;
pub use randpool::{FastPollFallback, PoolConfig, Randpool};
pub use x931::{X931Config, X931Rng};

use crate::config::ConfigError;
use crate::entropy::EntropySource;
use crate::primitives::PrimitiveError;
use thiserror::Error;

/// Errors surfaced by generators and by assembly.
#[derive(Debug, Error)]
pub enum RngError {
    /// Output was requested before enough entropy was absorbed and no
    /// registered source could supply more.
    #[error("{generator} is not seeded")]
    NotSeeded { generator: String },
    /// Assembly found no usable entropy source.
    #[error("no entropy source is available on this platform")]
    NoRandomSource,
    #[error(transparent)]
    Primitive(#[from] PrimitiveError),
    #[error(transparent)]
    InvalidConfig(#[from] ConfigError),
}

/// Counters describing a generator, for logging and metrics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RngStats {
    /// Whether the generator can currently produce output.
    pub seeded: bool,
    /// Entropy credited to the pool, in bits.
    pub entropy_bits: usize,
    /// Reseeds that absorbed fresh input.
    pub reseed_count: u64,
    /// Bytes handed to callers.
    pub bytes_generated: u64,
    /// Registered entropy sources.
    pub sources: usize,
    /// Polls that returned no data.
    pub empty_polls: u64,
}

/// A generator of cryptographically strong pseudo-random bytes.
///
/// Implementations are stateful and order-dependent; share one across
/// threads only behind a lock.
pub trait RandomNumberGenerator: Send {
    /// Descriptive name including the primitives in use.
    fn name(&self) -> String;

    /// Fills `output` with random bytes, seeding first if needed.
    ///
    /// An empty `output` is a no-op and always succeeds.
    fn randomize(&mut self, output: &mut [u8]) -> Result<(), RngError>;

    /// Returns a single random byte.
    fn next_byte(&mut self) -> Result<u8, RngError> {
        let mut byte = [0u8; 1];
        self.randomize(&mut byte)?;
        Ok(byte[0])
    }

    /// Takes ownership of an entropy source. Sources are polled in
    /// registration order.
    fn add_entropy_source(&mut self, source: Box<dyn EntropySource>);

    /// Mixes caller-supplied input into the state.
    fn add_entropy(&mut self, input: &[u8]) -> Result<(), RngError>;

    /// Polls every registered source and mixes the result into the
    /// existing state.
    fn reseed(&mut self) -> Result<(), RngError>;

    /// Whether the minimum entropy threshold has been met.
    fn is_seeded(&self) -> bool;

    /// Destroys all secret state. The generator must be reseeded before
    /// it produces output again.
    fn clear(&mut self);

    /// Current counters.
    fn stats(&self) -> RngStats;
}

impl<G: RandomNumberGenerator + ?Sized> RandomNumberGenerator for Box<G> {
    fn name(&self) -> String {
        (**self).name()
    }

    fn randomize(&mut self, output: &mut [u8]) -> Result<(), RngError> {
        (**self).randomize(output)
    }

    fn next_byte(&mut self) -> Result<u8, RngError> {
        (**self).next_byte()
    }

    fn add_entropy_source(&mut self, source: Box<dyn EntropySource>) {
        (**self).add_entropy_source(source)
    }

    fn add_entropy(&mut self, input: &[u8]) -> Result<(), RngError> {
        (**self).add_entropy(input)
    }

    fn reseed(&mut self) -> Result<(), RngError> {
        (**self).reseed()
    }

    fn is_seeded(&self) -> bool {
        (**self).is_seeded()
    }

    fn clear(&mut self) {
        (**self).clear()
    }

    fn stats(&self) -> RngStats {
        (**self).stats()
    }
}
