//! High-resolution timing jitter.
//!
//! The cheapest source there is, and always present. Each sample is the
//! duration of a tiny busy loop; scheduler, cache and interrupt noise make
//! the low bits of that duration hard to predict.

use super::{fold_into, EntropySource};
use std::hint::black_box;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// Samples folded into each output byte by `slow_poll`.
const SAMPLES_PER_BYTE: usize = 8;

/// Timing jitter source.
pub struct TimerSource {
    origin: Instant,
    last: u64,
}

impl TimerSource {
    /// Creates a timer source anchored at the current instant.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            last: 0,
        }
    }

    fn elapsed_nanos(&self) -> u64 {
        self.origin.elapsed().as_nanos() as u64
    }

    fn jitter_loop() {
        let mut x = 0u64;
        for i in 0..16 {
            x = black_box(x.wrapping_mul(6364136223846793005).wrapping_add(i));
        }
    }

    /// One timing sample: the duration of a short busy loop.
    fn sample(&self) -> u64 {
        let start = self.elapsed_nanos();
        Self::jitter_loop();
        self.elapsed_nanos().wrapping_sub(start)
    }
}

impl Default for TimerSource {
    fn default() -> Self {
        Self::new()
    }
}

impl EntropySource for TimerSource {
    fn name(&self) -> &str {
        "timer"
    }

    fn fast_poll(&mut self, buf: &mut [u8]) -> usize {
        let now = self.elapsed_nanos();
        let wall = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or_default();
        let delta = now.wrapping_sub(self.last);
        self.last = now;

        let mut stamp = [0u8; 24];
        stamp[..8].copy_from_slice(&now.to_le_bytes());
        stamp[8..16].copy_from_slice(&wall.to_le_bytes());
        stamp[16..].copy_from_slice(&(delta ^ self.sample()).to_le_bytes());

        fold_into(buf, &stamp)
    }

    fn slow_poll(&mut self, buf: &mut [u8]) -> usize {
        for byte in buf.iter_mut() {
            let mut acc = 0u64;
            for _ in 0..SAMPLES_PER_BYTE {
                acc = acc.rotate_left(5) ^ self.sample();
            }
            *byte = acc.to_le_bytes().iter().fold(0u8, |a, b| a ^ b);
        }
        self.last = self.elapsed_nanos();
        buf.len()
    }

    fn has_fast_poll(&self) -> bool {
        true
    }
}
