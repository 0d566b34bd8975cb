//! Prometheus metrics for generator state.
//!
//! # Metrics Exposed
//!
//! - `poolrng_seeded` - Whether the generator can produce output (1/0)
//! - `poolrng_entropy_bits` - Entropy currently credited to the pool
//! - `poolrng_reseed_total` - Reseeds that absorbed fresh input
//! - `poolrng_bytes_generated_total` - Bytes handed to callers
//! - `poolrng_sources` - Registered entropy sources
//! - `poolrng_empty_polls_total` - Source polls that returned nothing
//!
//! # Example
//!
//! ```no_run
//! use poolrng::metrics::{MetricsRegistry, MetricsSnapshot};
//! use poolrng::RandomNumberGenerator;
//!
//! let rng = poolrng::make_rng().expect("no entropy source");
//! let registry = MetricsRegistry::new().expect("failed to create registry");
//!
//! registry.update(&MetricsSnapshot::from_stats(&rng.stats()));
//! println!("{}", registry.encode().expect("encoding failed"));
//! ```

mod collector;

pub use collector::{MetricsError, MetricsRegistry, MetricsSnapshot};
