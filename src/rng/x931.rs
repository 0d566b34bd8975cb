//! ANSI X9.31 output wrapper.
//!
//! Reshapes the output of an inner generator with the X9.31 appendix A.2.4
//! construction. Per output block, with `K` the wrapper's cipher key and
//! `V` its secret vector:
//!
//! ```text
//! I = E_K(seed ^ stamp)     seed: one block from the inner generator
//! R = E_K(I ^ V)            stamp: monotonic nanoseconds || sample count
//! V = E_K(R ^ I)
//! ```
//!
//! `K` and `V` are drawn from the inner generator and replaced every
//! `rekey_interval_blocks` blocks. The wrapper adds no entropy of its own;
//! it is seeded exactly when its inner generator is.

use super::{RandomNumberGenerator, RngError, RngStats};
use crate::config::ConfigError;
use crate::entropy::EntropySource;
use crate::primitives::BlockCipher;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use zeroize::{Zeroize, Zeroizing};

/// Policy for [`X931Rng`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct X931Config {
    /// Output blocks produced under one `K`/`V` pair.
    pub rekey_interval_blocks: u64,
}

impl Default for X931Config {
    fn default() -> Self {
        Self {
            rekey_interval_blocks: 1024,
        }
    }
}

impl X931Config {
    /// Rejects a zero rekey interval.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rekey_interval_blocks == 0 {
            return Err(ConfigError::ZeroInterval("rekey"));
        }
        Ok(())
    }
}

/// X9.31 decorator over a seeded generator.
pub struct X931Rng<G> {
    inner: G,
    cipher: Box<dyn BlockCipher>,
    v: Zeroizing<Vec<u8>>,
    r: Zeroizing<Vec<u8>>,
    position: usize,
    keyed: bool,
    origin: Instant,
    samples: u64,
    blocks_since_rekey: u64,
    bytes_generated: u64,
    config: X931Config,
}

impl<G: RandomNumberGenerator> X931Rng<G> {
    /// Wraps `inner`. No key is drawn until the first request or reseed.
    pub fn new(
        inner: G,
        cipher: Box<dyn BlockCipher>,
        config: X931Config,
    ) -> Result<Self, RngError> {
        config.validate()?;
        let block_size = cipher.block_size();

        Ok(Self {
            inner,
            cipher,
            v: Zeroizing::new(vec![0u8; block_size]),
            r: Zeroizing::new(vec![0u8; block_size]),
            position: block_size,
            keyed: false,
            origin: Instant::now(),
            samples: 0,
            blocks_since_rekey: 0,
            bytes_generated: 0,
            config,
        })
    }

    /// Returns the wrapped generator.
    pub fn inner(&self) -> &G {
        &self.inner
    }

    /// Draws a fresh `K` and `V` from the inner generator.
    fn rekey(&mut self) -> Result<(), RngError> {
        let mut key = Zeroizing::new(vec![0u8; self.cipher.key_size()]);
        self.inner.randomize(&mut key)?;
        self.cipher.set_key(&key)?;
        self.inner.randomize(&mut self.v)?;

        self.keyed = true;
        self.blocks_since_rekey = 0;
        // Anything buffered was made under the old key.
        self.r.as_mut_slice().zeroize();
        self.position = self.r.len();

        tracing::debug!(inner = %self.inner.name(), "X9.31 wrapper rekeyed");
        Ok(())
    }

    /// Timestamp sample: nanoseconds since construction and a sample
    /// counter, so it never repeats even when the clock does.
    fn stamp(&mut self) -> [u8; 16] {
        let mut stamp = [0u8; 16];
        let nanos = self.origin.elapsed().as_nanos() as u64;
        stamp[..8].copy_from_slice(&nanos.to_be_bytes());
        stamp[8..].copy_from_slice(&self.samples.to_be_bytes());
        self.samples = self.samples.wrapping_add(1);
        stamp
    }

    /// Produces the next output block into `R`.
    fn update_buffer(&mut self) -> Result<(), RngError> {
        if self.blocks_since_rekey >= self.config.rekey_interval_blocks {
            self.rekey()?;
        }

        let block_size = self.v.len();
        let mut intermediate = Zeroizing::new(vec![0u8; block_size]);
        self.inner.randomize(&mut intermediate)?;
        for (i, byte) in self.stamp().iter().enumerate() {
            intermediate[i % block_size] ^= byte;
        }
        self.cipher.encrypt_block(&mut intermediate)?;

        xor_into(&mut self.r, &intermediate, &self.v);
        self.cipher.encrypt_block(&mut self.r)?;

        xor_into(&mut self.v, &self.r, &intermediate);
        self.cipher.encrypt_block(&mut self.v)?;

        self.position = 0;
        self.blocks_since_rekey += 1;
        Ok(())
    }
}

impl<G: RandomNumberGenerator> RandomNumberGenerator for X931Rng<G> {
    fn name(&self) -> String {
        format!("X9.31({},{})", self.cipher.name(), self.inner.name())
    }

    fn randomize(&mut self, output: &mut [u8]) -> Result<(), RngError> {
        if output.is_empty() {
            return Ok(());
        }
        if !self.keyed {
            self.rekey()?;
        }

        let mut written = 0;
        while written < output.len() {
            if self.position == self.r.len() {
                self.update_buffer()?;
            }
            let take = (output.len() - written).min(self.r.len() - self.position);
            output[written..written + take]
                .copy_from_slice(&self.r[self.position..self.position + take]);
            written += take;
            self.position += take;
        }

        self.bytes_generated += output.len() as u64;
        Ok(())
    }

    fn add_entropy_source(&mut self, source: Box<dyn EntropySource>) {
        self.inner.add_entropy_source(source);
    }

    fn add_entropy(&mut self, input: &[u8]) -> Result<(), RngError> {
        self.inner.add_entropy(input)?;
        if self.inner.is_seeded() {
            self.rekey()?;
        }
        Ok(())
    }

    fn reseed(&mut self) -> Result<(), RngError> {
        self.inner.reseed()?;
        if self.inner.is_seeded() {
            self.rekey()?;
        }
        Ok(())
    }

    fn is_seeded(&self) -> bool {
        self.keyed && self.inner.is_seeded()
    }

    fn clear(&mut self) {
        self.cipher.clear();
        self.v.as_mut_slice().zeroize();
        self.r.as_mut_slice().zeroize();
        self.position = self.r.len();
        self.keyed = false;
        self.blocks_since_rekey = 0;
        self.inner.clear();
        tracing::info!("X9.31 wrapper state cleared");
    }

    fn stats(&self) -> RngStats {
        RngStats {
            seeded: self.is_seeded(),
            bytes_generated: self.bytes_generated,
            ..self.inner.stats()
        }
    }
}

impl<G> Drop for X931Rng<G> {
    fn drop(&mut self) {
        self.cipher.clear();
    }
}

/// `out = a ^ b`, all three one block long.
fn xor_into(out: &mut [u8], a: &[u8], b: &[u8]) {
    for ((o, x), y) in out.iter_mut().zip(a).zip(b) {
        *o = x ^ y;
    }
}
