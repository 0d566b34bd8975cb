//! Bridge to the `rand_core` ecosystem.

use super::RandomNumberGenerator;
use rand_core::{impls, CryptoRng, RngCore};

/// Exposes a [`RandomNumberGenerator`] as `rand_core::RngCore`.
///
/// `fill_bytes` panics if the generator is not seeded, as the `RngCore`
/// contract requires of infallible fills; use `try_fill_bytes` to observe
/// the error instead.
pub struct RngCoreAdapter<'a, G: ?Sized> {
    rng: &'a mut G,
}

impl<'a, G: RandomNumberGenerator + ?Sized> RngCoreAdapter<'a, G> {
    /// Borrows `rng` for the adapter's lifetime.
    pub fn new(rng: &'a mut G) -> Self {
        Self { rng }
    }
}

impl<G: RandomNumberGenerator + ?Sized> RngCore for RngCoreAdapter<'_, G> {
    fn next_u32(&mut self) -> u32 {
        impls::next_u32_via_fill(self)
    }

    fn next_u64(&mut self) -> u64 {
        impls::next_u64_via_fill(self)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        if let Err(e) = self.try_fill_bytes(dest) {
            panic!("random generator failed: {}", e);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
        self.rng.randomize(dest).map_err(rand_core::Error::new)
    }
}

impl<G: RandomNumberGenerator + ?Sized> CryptoRng for RngCoreAdapter<'_, G> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::{PoolConfig, Randpool};

    #[test]
    fn test_adapter_reports_unseeded() {
        let mut pool = Randpool::with_defaults().unwrap();
        let mut adapter = RngCoreAdapter::new(&mut pool);

        let mut buf = [0u8; 8];
        assert!(adapter.try_fill_bytes(&mut buf).is_err());
    }

    #[test]
    fn test_adapter_fills_when_seeded() {
        let mut pool = Randpool::with_config(PoolConfig::default()).unwrap();
        pool.add_entropy(&[0x42; 64]).unwrap();

        let mut adapter = RngCoreAdapter::new(&mut pool);
        let a = adapter.next_u64();
        let b = adapter.next_u64();
        assert_ne!(a, b);
    }
}
