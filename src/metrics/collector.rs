//! Metrics collection and registry.

use crate::rng::RngStats;
use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};
use thiserror::Error;

/// Errors that can occur during metrics operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}

/// A snapshot of generator state for metrics update.
#[derive(Debug, Clone, Default)]
pub struct MetricsSnapshot {
    /// Whether the generator is seeded.
    pub seeded: bool,
    /// Entropy credited to the pool, in bits.
    pub entropy_bits: u64,
    /// Reseeds performed.
    pub reseed_count: u64,
    /// Bytes generated.
    pub bytes_generated: u64,
    /// Registered sources.
    pub sources: u64,
    /// Polls that returned no data.
    pub empty_polls: u64,
}

impl MetricsSnapshot {
    /// Creates a snapshot from generator counters.
    pub fn from_stats(stats: &RngStats) -> Self {
        Self {
            seeded: stats.seeded,
            entropy_bits: stats.entropy_bits as u64,
            reseed_count: stats.reseed_count,
            bytes_generated: stats.bytes_generated,
            sources: stats.sources as u64,
            empty_polls: stats.empty_polls,
        }
    }
}

/// Prometheus metrics registry for generator monitoring.
pub struct MetricsRegistry {
    registry: Registry,

    seeded: IntGauge,
    entropy_bits: IntGauge,
    sources: IntGauge,

    reseed_total: IntCounter,
    bytes_generated_total: IntCounter,
    empty_polls_total: IntCounter,
}

impl MetricsRegistry {
    /// Creates a new registry with all generator metrics registered.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let seeded = IntGauge::new(
            "poolrng_seeded",
            "Whether the generator can produce output (1=seeded, 0=unseeded)",
        )?;
        let entropy_bits = IntGauge::new(
            "poolrng_entropy_bits",
            "Entropy currently credited to the pool in bits",
        )?;
        let sources = IntGauge::new("poolrng_sources", "Registered entropy sources")?;

        let reseed_total = IntCounter::new(
            "poolrng_reseed_total",
            "Reseeds that absorbed fresh input",
        )?;
        let bytes_generated_total = IntCounter::new(
            "poolrng_bytes_generated_total",
            "Random bytes handed to callers",
        )?;
        let empty_polls_total = IntCounter::new(
            "poolrng_empty_polls_total",
            "Entropy source polls that returned no data",
        )?;

        registry.register(Box::new(seeded.clone()))?;
        registry.register(Box::new(entropy_bits.clone()))?;
        registry.register(Box::new(sources.clone()))?;
        registry.register(Box::new(reseed_total.clone()))?;
        registry.register(Box::new(bytes_generated_total.clone()))?;
        registry.register(Box::new(empty_polls_total.clone()))?;

        Ok(Self {
            registry,
            seeded,
            entropy_bits,
            sources,
            reseed_total,
            bytes_generated_total,
            empty_polls_total,
        })
    }

    /// Updates all metrics from a snapshot.
    ///
    /// Counters only move forward; a snapshot taken after `clear` leaves
    /// them where they were.
    pub fn update(&self, snapshot: &MetricsSnapshot) {
        self.seeded.set(i64::from(snapshot.seeded));
        self.entropy_bits.set(snapshot.entropy_bits as i64);
        self.sources.set(snapshot.sources as i64);

        advance(&self.reseed_total, snapshot.reseed_count);
        advance(&self.bytes_generated_total, snapshot.bytes_generated);
        advance(&self.empty_polls_total, snapshot.empty_polls);
    }

    /// Returns the underlying Prometheus registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encodes all metrics in Prometheus text format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

/// Increments `counter` up to `total`.
fn advance(counter: &IntCounter, total: u64) {
    let current = counter.get();
    if total > current {
        counter.inc_by(total - current);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::{Randpool, RandomNumberGenerator};

    #[test]
    fn test_registry_creation() {
        let registry = MetricsRegistry::new();
        assert!(registry.is_ok());
    }

    #[test]
    fn test_metrics_update() {
        let registry = MetricsRegistry::new().unwrap();

        let snapshot = MetricsSnapshot {
            seeded: true,
            entropy_bits: 512,
            reseed_count: 2,
            bytes_generated: 1024,
            sources: 3,
            empty_polls: 1,
        };
        registry.update(&snapshot);

        let output = registry.encode().unwrap();
        assert!(output.contains("poolrng_seeded 1"));
        assert!(output.contains("poolrng_entropy_bits 512"));
        assert!(output.contains("poolrng_reseed_total 2"));
        assert!(output.contains("poolrng_bytes_generated_total 1024"));
    }

    #[test]
    fn test_counters_do_not_move_backwards() {
        let registry = MetricsRegistry::new().unwrap();

        registry.update(&MetricsSnapshot {
            reseed_count: 5,
            ..Default::default()
        });
        registry.update(&MetricsSnapshot::default());

        let output = registry.encode().unwrap();
        assert!(output.contains("poolrng_reseed_total 5"));
        assert!(output.contains("poolrng_seeded 0"));
    }

    #[test]
    fn test_snapshot_from_pool_stats() {
        let mut pool = Randpool::with_defaults().unwrap();
        pool.add_entropy(&[0x42; 64]).unwrap();
        let mut buf = [0u8; 48];
        pool.randomize(&mut buf).unwrap();

        let snapshot = MetricsSnapshot::from_stats(&pool.stats());
        assert!(snapshot.seeded);
        assert_eq!(snapshot.entropy_bits, 512);
        assert_eq!(snapshot.bytes_generated, 48);
        assert_eq!(snapshot.reseed_count, 1);
    }
}
