//! Assembly of the default generator stack.

use crate::config::RngConfig;
use crate::entropy::{SourceId, SourceSettings};
use crate::rng::{RandomNumberGenerator, Randpool, RngError, X931Rng};
use tracing::{info, warn};

/// Builds the standard generator: an AES-256 / HMAC(SHA-256) entropy pool
/// behind the X9.31 wrapper, fed by every source the platform provides and
/// seeded before it is returned.
pub fn make_rng() -> Result<Box<dyn RandomNumberGenerator>, RngError> {
    make_rng_with(&RngConfig::default())
}

/// Builds and seeds a generator from `config`.
///
/// Fails with [`RngError::NoRandomSource`] when none of the configured
/// sources can be used here, or when polling them did not seed the stack.
/// An unseeded generator is never returned.
pub fn make_rng_with(config: &RngConfig) -> Result<Box<dyn RandomNumberGenerator>, RngError> {
    config.validate()?;

    let pool = Randpool::from_algorithms(config.cipher, config.mac, config.pool.clone())?;
    let mut rng: Box<dyn RandomNumberGenerator> = if config.compliance_wrapper {
        Box::new(X931Rng::new(
            pool,
            config.cipher.instantiate(),
            config.x931.clone(),
        )?)
    } else {
        Box::new(pool)
    };

    let sources = resolve_sources(&config.sources, &config.settings);
    if sources.is_empty() {
        return Err(RngError::NoRandomSource);
    }
    for id in &sources {
        rng.add_entropy_source(id.build(&config.settings));
    }

    rng.reseed()?;
    if !rng.is_seeded() {
        warn!(generator = %rng.name(), "initial reseed did not seed the generator");
        return Err(RngError::NoRandomSource);
    }

    info!(
        generator = %rng.name(),
        sources = ?sources,
        "random number generator ready"
    );
    Ok(rng)
}

/// Orders `ids` cheapest first and keeps those usable on this machine.
///
/// Duplicates collapse to their first occurrence. The sort is stable, so
/// sources of the same tier keep their configured order.
pub fn resolve_sources(ids: &[SourceId], settings: &SourceSettings) -> Vec<SourceId> {
    let mut ordered: Vec<SourceId> = Vec::with_capacity(ids.len());
    for id in ids {
        if !ordered.contains(id) {
            ordered.push(*id);
        }
    }
    ordered.sort_by_key(|id| id.priority());

    ordered
        .into_iter()
        .filter(|id| {
            let available = id.is_available(settings);
            if !available {
                warn!(source = %id, "entropy source unavailable, skipping");
            }
            available
        })
        .collect()
}
