//! Entropy-pool generator.
//!
//! # Model
//!
//! The pool is a fixed number of cipher blocks of secret state. Entropy is
//! absorbed by MACing `pool || input` and folding the tag back into the
//! pool, after which both the MAC key and the cipher key are re-derived from
//! the pool and the pool is stirred with the new cipher key. Output is the
//! encryption of a running counter under the derived cipher key.
//!
//! Two refresh boundaries bound the output produced from one state:
//! - every `mix_interval_blocks` output blocks the pool is re-mixed and
//!   both keys change;
//! - every `reseed_interval_bytes` output bytes the sources are fast-polled
//!   and the result absorbed, even when the pool is already seeded.

use super::{RandomNumberGenerator, RngError, RngStats};
use crate::config::ConfigError;
use crate::entropy::{EntropyEstimator, EntropySource};
use crate::primitives::{BlockCipher, CipherAlgorithm, KeyedMac, MacAlgorithm, PrimitiveError};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, Zeroizing};

/// Domain labels separating the MAC's three uses.
const LABEL_MIX: u8 = 0x00;
const LABEL_MAC_KEY: u8 = 0x01;
const LABEL_CIPHER_KEY: u8 = 0x02;

/// What fast top-ups do with sources that have no cheap path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FastPollFallback {
    /// Call the source's `fast_poll`, which forwards to `slow_poll`.
    #[default]
    SlowPoll,
    /// Leave the source out of fast top-ups entirely.
    Skip,
}

/// Tunable policy for [`Randpool`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Pool size in cipher blocks.
    pub pool_blocks: usize,
    /// Credited entropy required before any output is produced.
    pub seed_threshold_bits: usize,
    /// Staging buffer offered to each source per poll.
    pub poll_bytes: usize,
    /// Fast-poll rounds attempted before escalating to `slow_poll`.
    pub fast_poll_rounds: usize,
    /// Treatment of sources without a cheap `fast_poll`.
    pub fast_poll_fallback: FastPollFallback,
    /// How polled bytes are credited.
    pub estimator: EntropyEstimator,
    /// Output blocks between pool re-mixes.
    pub mix_interval_blocks: u64,
    /// Output bytes between automatic fast-poll reseeds.
    pub reseed_interval_bytes: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            pool_blocks: 32,
            seed_threshold_bits: 256,
            poll_bytes: 128,
            fast_poll_rounds: 2,
            fast_poll_fallback: FastPollFallback::SlowPoll,
            estimator: EntropyEstimator::Raw,
            mix_interval_blocks: 128,
            reseed_interval_bytes: 1 << 20,
        }
    }
}

impl PoolConfig {
    /// Validates the policy parameters that do not depend on the cipher.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pool_blocks == 0 {
            return Err(ConfigError::EmptyPool);
        }
        if self.poll_bytes == 0 {
            return Err(ConfigError::EmptyPollBuffer);
        }
        if self.mix_interval_blocks == 0 {
            return Err(ConfigError::ZeroInterval("mix"));
        }
        if self.reseed_interval_bytes == 0 {
            return Err(ConfigError::ZeroInterval("reseed"));
        }
        Ok(())
    }
}

/// The entropy-pool generator.
pub struct Randpool {
    cipher: Box<dyn BlockCipher>,
    mac: Box<dyn KeyedMac>,
    pool: Zeroizing<Vec<u8>>,
    counter: Zeroizing<Vec<u8>>,
    sources: Vec<Box<dyn EntropySource>>,
    config: PoolConfig,
    entropy_bits: usize,
    blocks_since_mix: u64,
    bytes_since_reseed: u64,
    reseed_count: u64,
    bytes_generated: u64,
    empty_polls: u64,
}

impl Randpool {
    /// Creates an unseeded pool over the given primitives.
    ///
    /// The MAC tag must be at least one cipher block long, and the seed
    /// threshold must fit in the pool.
    pub fn new(
        cipher: Box<dyn BlockCipher>,
        mac: Box<dyn KeyedMac>,
        config: PoolConfig,
    ) -> Result<Self, RngError> {
        config.validate()?;

        let block_size = cipher.block_size();
        if mac.output_size() < block_size {
            return Err(PrimitiveError::Incompatible {
                reason: format!(
                    "{} output ({} bytes) is shorter than the {} block ({} bytes)",
                    mac.name(),
                    mac.output_size(),
                    cipher.name(),
                    block_size
                ),
            }
            .into());
        }

        let capacity = config.pool_blocks * block_size * 8;
        if config.seed_threshold_bits > capacity {
            return Err(ConfigError::ThresholdExceedsPool {
                threshold: config.seed_threshold_bits,
                capacity,
            }
            .into());
        }

        tracing::debug!(
            cipher = cipher.name(),
            mac = mac.name(),
            pool_bytes = config.pool_blocks * block_size,
            "Randpool created"
        );

        Ok(Self {
            pool: Zeroizing::new(vec![0u8; config.pool_blocks * block_size]),
            counter: Zeroizing::new(vec![0u8; block_size]),
            cipher,
            mac,
            sources: Vec::new(),
            config,
            entropy_bits: 0,
            blocks_since_mix: 0,
            bytes_since_reseed: 0,
            reseed_count: 0,
            bytes_generated: 0,
            empty_polls: 0,
        })
    }

    /// Creates a pool from named algorithms.
    pub fn from_algorithms(
        cipher: CipherAlgorithm,
        mac: MacAlgorithm,
        config: PoolConfig,
    ) -> Result<Self, RngError> {
        Self::new(cipher.instantiate(), mac.instantiate(), config)
    }

    /// AES-256 and HMAC(SHA-256) with the given policy.
    pub fn with_config(config: PoolConfig) -> Result<Self, RngError> {
        Self::from_algorithms(CipherAlgorithm::default(), MacAlgorithm::default(), config)
    }

    /// AES-256 and HMAC(SHA-256) with the default policy.
    pub fn with_defaults() -> Result<Self, RngError> {
        Self::with_config(PoolConfig::default())
    }

    /// Returns the policy in force.
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Returns the number of reseeds that absorbed fresh input.
    pub fn reseed_count(&self) -> u64 {
        self.reseed_count
    }

    /// Returns bytes generated since the last reseed.
    pub fn bytes_since_reseed(&self) -> u64 {
        self.bytes_since_reseed
    }

    /// Returns the entropy credited to the pool, in bits.
    pub fn entropy_bits(&self) -> usize {
        self.entropy_bits
    }

    /// Derives `len` bytes of key material from the pool under `label`.
    fn derive_key(&self, label: u8, len: usize) -> Zeroizing<Vec<u8>> {
        let mut key = Zeroizing::new(Vec::with_capacity(len + self.mac.output_size()));
        let mut index = 0u32;
        while key.len() < len {
            let block = self
                .mac
                .mac(&[&[label], &index.to_be_bytes(), self.pool.as_slice()]);
            key.extend_from_slice(&block);
            index += 1;
        }
        key.truncate(len);
        key
    }

    /// One-way mix of `input` into the pool, followed by re-keying and a
    /// full stir of the pool under the new cipher key.
    fn mix_pool(&mut self, input: &[u8]) -> Result<(), RngError> {
        let tag = self.mac.mac(&[&[LABEL_MIX], self.pool.as_slice(), input]);
        let len = self.pool.len();
        for (i, byte) in tag.iter().enumerate() {
            self.pool[i % len] ^= byte;
        }

        let mac_key = self.derive_key(LABEL_MAC_KEY, self.mac.output_size());
        self.mac.set_key(&mac_key)?;
        let cipher_key = self.derive_key(LABEL_CIPHER_KEY, self.cipher.key_size());
        self.cipher.set_key(&cipher_key)?;

        stir(self.cipher.as_ref(), &mut self.pool, &self.counter)?;
        self.blocks_since_mix = 0;

        tracing::trace!(input_bytes = input.len(), "pool mixed");
        Ok(())
    }

    /// Polls every source into one staging buffer.
    ///
    /// Returns the staged bytes and the entropy credited for them.
    fn poll_sources(&mut self, slow: bool) -> (Zeroizing<Vec<u8>>, usize) {
        let mut staged = Zeroizing::new(Vec::new());
        let mut scratch = Zeroizing::new(vec![0u8; self.config.poll_bytes]);
        let mut credited = 0usize;

        for source in self.sources.iter_mut() {
            let got = if slow {
                source.slow_poll(&mut scratch)
            } else if !source.has_fast_poll()
                && self.config.fast_poll_fallback == FastPollFallback::Skip
            {
                continue;
            } else {
                source.fast_poll(&mut scratch)
            };
            let got = got.min(scratch.len());

            if got == 0 {
                self.empty_polls += 1;
                tracing::debug!(source = source.name(), slow, "entropy source returned no data");
                continue;
            }

            let polled = &scratch[..got];
            credited += self
                .config
                .estimator
                .estimate(polled)
                .min(source.estimator().estimate(polled));
            staged.extend_from_slice(&scratch[..got]);
            scratch.as_mut_slice().zeroize();

            tracing::trace!(source = source.name(), bytes = got, slow, "polled entropy source");
        }

        (staged, credited)
    }

    /// Mixes staged input into the pool and credits it.
    fn absorb(&mut self, staged: &[u8], credited: usize) -> Result<(), RngError> {
        self.mix_pool(staged)?;
        self.bytes_since_reseed = 0;
        if !staged.is_empty() {
            self.entropy_bits = (self.entropy_bits + credited).min(self.pool.len() * 8);
            self.reseed_count += 1;
        }
        Ok(())
    }

    /// Brings the pool to a state it may produce output from.
    fn seed_if_needed(&mut self) -> Result<(), RngError> {
        if self.is_seeded() {
            if self.bytes_since_reseed >= self.config.reseed_interval_bytes {
                let (staged, credited) = self.poll_sources(false);
                self.absorb(&staged, credited)?;
                tracing::debug!(bytes = staged.len(), "periodic reseed");
            }
            return Ok(());
        }

        for round in 0..self.config.fast_poll_rounds {
            let (staged, credited) = self.poll_sources(false);
            self.absorb(&staged, credited)?;
            if self.is_seeded() {
                tracing::debug!(round, "seeded from fast polls");
                return Ok(());
            }
        }

        let (staged, credited) = self.poll_sources(true);
        self.absorb(&staged, credited)?;
        if self.is_seeded() {
            tracing::debug!("seeded from slow polls");
            return Ok(());
        }

        Err(RngError::NotSeeded {
            generator: self.name(),
        })
    }

    /// Counter-mode keystream into `output`.
    fn generate(&mut self, output: &mut [u8]) -> Result<(), RngError> {
        let mut block = Zeroizing::new(vec![0u8; self.counter.len()]);

        for chunk in output.chunks_mut(block.len()) {
            increment(&mut self.counter);
            block.copy_from_slice(&self.counter);
            self.cipher.encrypt_block(&mut block)?;
            chunk.copy_from_slice(&block[..chunk.len()]);

            self.blocks_since_mix += 1;
            if self.blocks_since_mix >= self.config.mix_interval_blocks {
                self.mix_pool(&[])?;
            }
        }
        Ok(())
    }

    fn wipe(&mut self) {
        self.pool.as_mut_slice().zeroize();
        self.counter.as_mut_slice().zeroize();
        self.cipher.clear();
        self.mac.clear();
        self.entropy_bits = 0;
        self.blocks_since_mix = 0;
        self.bytes_since_reseed = 0;
    }
}

impl RandomNumberGenerator for Randpool {
    fn name(&self) -> String {
        format!("Randpool({},{})", self.cipher.name(), self.mac.name())
    }

    fn randomize(&mut self, output: &mut [u8]) -> Result<(), RngError> {
        if output.is_empty() {
            return Ok(());
        }
        self.seed_if_needed()?;
        self.generate(output)?;

        self.bytes_since_reseed += output.len() as u64;
        self.bytes_generated += output.len() as u64;
        Ok(())
    }

    fn add_entropy_source(&mut self, source: Box<dyn EntropySource>) {
        tracing::debug!(source = source.name(), "entropy source registered");
        self.sources.push(source);
    }

    fn add_entropy(&mut self, input: &[u8]) -> Result<(), RngError> {
        if input.is_empty() {
            return Ok(());
        }
        let credited = self.config.estimator.estimate(input);
        self.absorb(input, credited)
    }

    fn reseed(&mut self) -> Result<(), RngError> {
        let (staged, credited) = self.poll_sources(true);
        self.absorb(&staged, credited)?;

        tracing::info!(
            bytes = staged.len(),
            credited_bits = credited,
            entropy_bits = self.entropy_bits,
            seeded = self.is_seeded(),
            "Randpool reseeded"
        );
        Ok(())
    }

    fn is_seeded(&self) -> bool {
        self.entropy_bits >= self.config.seed_threshold_bits
    }

    fn clear(&mut self) {
        self.wipe();
        tracing::info!("Randpool state cleared");
    }

    fn stats(&self) -> RngStats {
        RngStats {
            seeded: self.is_seeded(),
            entropy_bits: self.entropy_bits,
            reseed_count: self.reseed_count,
            bytes_generated: self.bytes_generated,
            sources: self.sources.len(),
            empty_polls: self.empty_polls,
        }
    }
}

impl Drop for Randpool {
    fn drop(&mut self) {
        self.wipe();
    }
}

/// Big-endian increment with wrap-around.
fn increment(counter: &mut [u8]) {
    for byte in counter.iter_mut().rev() {
        *byte = byte.wrapping_add(1);
        if *byte != 0 {
            break;
        }
    }
}

/// CBC-style pass over the pool: the first block is whitened with
/// `whitening`, every later block with its encrypted predecessor.
fn stir(
    cipher: &dyn BlockCipher,
    pool: &mut [u8],
    whitening: &[u8],
) -> Result<(), PrimitiveError> {
    let block_size = whitening.len();
    let mut previous = Zeroizing::new(whitening.to_vec());

    for block in pool.chunks_exact_mut(block_size) {
        for (b, p) in block.iter_mut().zip(previous.iter()) {
            *b ^= p;
        }
        cipher.encrypt_block(block)?;
        previous.copy_from_slice(block);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entropy::{MockSource, MockSourceBehaviour};
    use proptest::prelude::*;

    /// Invertible toy cipher: XOR with the key, then rotate the block.
    struct MockCipher {
        key: [u8; 16],
    }

    impl BlockCipher for MockCipher {
        fn name(&self) -> &'static str {
            "mock-cipher"
        }
        fn block_size(&self) -> usize {
            16
        }
        fn key_size(&self) -> usize {
            16
        }
        fn set_key(&mut self, key: &[u8]) -> Result<(), PrimitiveError> {
            self.key.copy_from_slice(key);
            Ok(())
        }
        fn encrypt_block(&self, block: &mut [u8]) -> Result<(), PrimitiveError> {
            for (b, k) in block.iter_mut().zip(self.key.iter()) {
                *b ^= k;
            }
            block.rotate_left(3);
            Ok(())
        }
        fn clear(&mut self) {
            self.key = [0; 16];
        }
    }

    /// Toy MAC: position-weighted sums of key and input.
    struct MockMac {
        key: Vec<u8>,
    }

    impl KeyedMac for MockMac {
        fn name(&self) -> &'static str {
            "mock-mac"
        }
        fn output_size(&self) -> usize {
            16
        }
        fn set_key(&mut self, key: &[u8]) -> Result<(), PrimitiveError> {
            self.key = key.to_vec();
            Ok(())
        }
        fn mac(&self, parts: &[&[u8]]) -> Zeroizing<Vec<u8>> {
            let mut tag = vec![0u8; 16];
            let input = self.key.iter().chain(parts.iter().flat_map(|p| p.iter()));
            for (i, &byte) in input.enumerate() {
                let slot = &mut tag[i % 16];
                *slot = slot.rotate_left(1).wrapping_add(byte).wrapping_add(i as u8);
            }
            Zeroizing::new(tag)
        }
        fn clear(&mut self) {
            self.key.clear();
        }
    }

    fn mock_pool(config: PoolConfig) -> Randpool {
        Randpool::new(
            Box::new(MockCipher { key: [0; 16] }),
            Box::new(MockMac { key: Vec::new() }),
            config,
        )
        .unwrap()
    }

    fn seeded_pool() -> Randpool {
        let mut pool = Randpool::with_defaults().unwrap();
        pool.add_entropy(b"a fixed seed that is long enough to cross the threshold")
            .unwrap();
        pool
    }

    #[test]
    fn test_fixed_pattern_source_seeds_mock_pool() {
        let mut pool = mock_pool(PoolConfig::default());
        pool.add_entropy_source(Box::new(MockSource::new(MockSourceBehaviour::Pattern(0xa7))));

        pool.reseed().unwrap();
        assert!(pool.is_seeded());

        let mut first = [0u8; 32];
        let mut second = [0u8; 32];
        pool.randomize(&mut first).unwrap();
        pool.randomize(&mut second).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_no_sources_not_seeded() {
        let mut pool = Randpool::with_defaults().unwrap();
        let mut buf = [0u8; 16];

        assert!(!pool.is_seeded());
        assert!(matches!(
            pool.randomize(&mut buf),
            Err(RngError::NotSeeded { .. })
        ));
    }

    #[test]
    fn test_zero_length_request_is_noop() {
        let mut pool = Randpool::with_defaults().unwrap();
        let mut empty = [0u8; 0];
        assert!(pool.randomize(&mut empty).is_ok());
        assert_eq!(pool.stats().bytes_generated, 0);
    }

    #[test]
    fn test_sufficient_source_seeds_on_demand() {
        let mut pool = Randpool::with_defaults().unwrap();
        pool.add_entropy_source(Box::new(MockSource::new(MockSourceBehaviour::Counter)));

        let mut buf = [0u8; 64];
        pool.randomize(&mut buf).unwrap();
        assert!(pool.is_seeded());
    }

    #[test]
    fn test_empty_sources_fail_and_are_counted() {
        let mut pool = Randpool::with_defaults().unwrap();
        pool.add_entropy_source(Box::new(MockSource::new(MockSourceBehaviour::Empty)));

        let mut buf = [0u8; 8];
        assert!(matches!(
            pool.randomize(&mut buf),
            Err(RngError::NotSeeded { .. })
        ));
        // two fast rounds plus one slow poll
        assert_eq!(pool.stats().empty_polls, 3);
    }

    #[test]
    fn test_escalates_to_slow_poll() {
        let source = MockSource::new(MockSourceBehaviour::SlowOnly(0x3c));
        let counts = source.counts();
        let mut pool = Randpool::with_defaults().unwrap();
        pool.add_entropy_source(Box::new(source));

        let mut buf = [0u8; 8];
        pool.randomize(&mut buf).unwrap();

        assert_eq!(counts.fast(), 2);
        assert_eq!(counts.slow(), 1);
    }

    #[test]
    fn test_skip_fallback_leaves_out_slow_only_sources() {
        let source = MockSource::new(MockSourceBehaviour::Pattern(0x11));
        let counts = source.counts();
        let config = PoolConfig {
            fast_poll_fallback: FastPollFallback::Skip,
            ..Default::default()
        };
        let mut pool = Randpool::with_config(config).unwrap();
        pool.add_entropy_source(Box::new(source));

        let mut buf = [0u8; 8];
        pool.randomize(&mut buf).unwrap();

        assert_eq!(counts.fast(), 0);
        assert_eq!(counts.slow(), 1);
    }

    #[test]
    fn test_identical_state_identical_output() {
        let mut a = seeded_pool();
        let mut b = seeded_pool();

        for len in [1usize, 16, 33, 500, 4096] {
            let mut out_a = vec![0u8; len];
            let mut out_b = vec![0u8; len];
            a.randomize(&mut out_a).unwrap();
            b.randomize(&mut out_b).unwrap();
            assert_eq!(out_a, out_b);
        }
    }

    #[test]
    fn test_different_seed_different_output() {
        let mut a = seeded_pool();
        let mut b = Randpool::with_defaults().unwrap();
        b.add_entropy(b"another fixed seed that is long enough to cross it")
            .unwrap();

        let mut out_a = [0u8; 32];
        let mut out_b = [0u8; 32];
        a.randomize(&mut out_a).unwrap();
        b.randomize(&mut out_b).unwrap();
        assert_ne!(out_a, out_b);
    }

    #[test]
    fn test_consecutive_blocks_never_repeat() {
        let mut pool = seeded_pool();
        let mut out = vec![0u8; 16 * 4096];
        pool.randomize(&mut out).unwrap();

        let blocks: Vec<&[u8]> = out.chunks(16).collect();
        assert!(blocks.windows(2).all(|w| w[0] != w[1]));
    }

    #[test]
    fn test_clear_is_idempotent_and_unseeds() {
        let mut pool = seeded_pool();
        pool.clear();
        pool.clear();

        assert!(!pool.is_seeded());
        let mut buf = [0u8; 16];
        assert!(matches!(
            pool.randomize(&mut buf),
            Err(RngError::NotSeeded { .. })
        ));

        pool.add_entropy(&[0x55; 64]).unwrap();
        assert!(pool.randomize(&mut buf).is_ok());
    }

    #[test]
    fn test_clear_forgets_previous_state() {
        let mut used = seeded_pool();
        let mut scratch = [0u8; 48];
        used.randomize(&mut scratch).unwrap();
        used.clear();
        used.add_entropy(&[0x55; 64]).unwrap();

        let mut fresh = Randpool::with_defaults().unwrap();
        fresh.add_entropy(&[0x55; 64]).unwrap();

        let mut a = [0u8; 32];
        let mut b = [0u8; 32];
        used.randomize(&mut a).unwrap();
        fresh.randomize(&mut b).unwrap();
        // The counter was wiped too, so both restart from the same state.
        assert_eq!(a, b);
    }

    #[test]
    fn test_periodic_reseed_polls_sources() {
        let source = MockSource::new(MockSourceBehaviour::Counter);
        let counts = source.counts();
        let config = PoolConfig {
            reseed_interval_bytes: 64,
            ..Default::default()
        };
        let mut pool = Randpool::with_config(config).unwrap();
        pool.add_entropy_source(Box::new(source));

        let mut buf = [0u8; 64];
        pool.randomize(&mut buf).unwrap();
        let after_seed = counts.fast();
        pool.randomize(&mut buf).unwrap();

        assert_eq!(counts.fast(), after_seed + 1);
        assert_eq!(pool.reseed_count(), 2);
        assert_eq!(pool.bytes_since_reseed(), 64);
    }

    #[test]
    fn test_delta_estimator_rejects_constant_source() {
        let config = PoolConfig {
            estimator: EntropyEstimator::Delta,
            ..Default::default()
        };
        let mut pool = Randpool::with_config(config).unwrap();
        pool.add_entropy_source(Box::new(MockSource::new(MockSourceBehaviour::Pattern(0xff))));

        pool.reseed().unwrap();
        assert!(!pool.is_seeded());
    }

    #[test]
    fn test_source_estimator_limits_credit() {
        let mut pool = Randpool::with_defaults().unwrap();
        pool.add_entropy_source(Box::new(
            MockSource::new(MockSourceBehaviour::Pattern(0xff)).with_estimator(EntropyEstimator::Delta),
        ));

        pool.reseed().unwrap();
        assert!(!pool.is_seeded());
        assert!(pool.entropy_bits() <= 4);
    }

    #[test]
    fn test_pool_estimator_limits_raw_source() {
        let config = PoolConfig {
            estimator: EntropyEstimator::Delta,
            ..Default::default()
        };
        let mut pool = Randpool::with_config(config).unwrap();
        pool.add_entropy_source(Box::new(
            MockSource::new(MockSourceBehaviour::Pattern(0xff)).with_estimator(EntropyEstimator::Raw),
        ));

        pool.reseed().unwrap();
        assert!(pool.entropy_bits() <= 4);
    }

    #[test]
    fn test_entropy_capped_at_pool_size() {
        let config = PoolConfig {
            pool_blocks: 2,
            ..Default::default()
        };
        let mut pool = Randpool::with_config(config).unwrap();
        pool.add_entropy(&[0x01; 1024]).unwrap();
        assert_eq!(pool.entropy_bits(), 2 * 16 * 8);
    }

    #[test]
    fn test_threshold_larger_than_pool_rejected() {
        let config = PoolConfig {
            pool_blocks: 1,
            seed_threshold_bits: 256,
            ..Default::default()
        };
        assert!(matches!(
            Randpool::with_config(config),
            Err(RngError::InvalidConfig(ConfigError::ThresholdExceedsPool { .. }))
        ));
    }

    #[test]
    fn test_short_mac_rejected() {
        struct TinyMac;
        impl KeyedMac for TinyMac {
            fn name(&self) -> &'static str {
                "tiny"
            }
            fn output_size(&self) -> usize {
                4
            }
            fn set_key(&mut self, _: &[u8]) -> Result<(), PrimitiveError> {
                Ok(())
            }
            fn mac(&self, _: &[&[u8]]) -> Zeroizing<Vec<u8>> {
                Zeroizing::new(vec![0; 4])
            }
            fn clear(&mut self) {}
        }

        let result = Randpool::new(
            CipherAlgorithm::Aes256.instantiate(),
            Box::new(TinyMac),
            PoolConfig::default(),
        );
        assert!(matches!(
            result,
            Err(RngError::Primitive(PrimitiveError::Incompatible { .. }))
        ));
    }

    #[test]
    fn test_next_byte_uses_randomize() {
        let mut pool = seeded_pool();
        pool.next_byte().unwrap();
        assert_eq!(pool.stats().bytes_generated, 1);
    }

    #[test]
    fn test_counter_increment_carries() {
        let mut counter = [0x00, 0xff, 0xff];
        increment(&mut counter);
        assert_eq!(counter, [0x01, 0x00, 0x00]);

        let mut wrapped = [0xff, 0xff];
        increment(&mut wrapped);
        assert_eq!(wrapped, [0x00, 0x00]);
    }

    proptest! {
        #[test]
        fn prop_no_adjacent_block_repeats(sizes in proptest::collection::vec(1usize..300, 1..8)) {
            let mut pool = seeded_pool();
            let mut previous: Option<Vec<u8>> = None;

            for len in sizes {
                let mut out = vec![0u8; len];
                pool.randomize(&mut out).unwrap();
                for block in out.chunks_exact(16) {
                    if let Some(prev) = &previous {
                        prop_assert_ne!(prev.as_slice(), block);
                    }
                    previous = Some(block.to_vec());
                }
            }
        }

        #[test]
        fn prop_mock_pool_deterministic(seed in proptest::collection::vec(any::<u8>(), 32..96)) {
            let mut a = mock_pool(PoolConfig::default());
            let mut b = mock_pool(PoolConfig::default());
            a.add_entropy(&seed).unwrap();
            b.add_entropy(&seed).unwrap();

            let mut out_a = [0u8; 80];
            let mut out_b = [0u8; 80];
            a.randomize(&mut out_a).unwrap();
            b.randomize(&mut out_b).unwrap();
            prop_assert_eq!(out_a, out_b);
        }
    }
}
