//! The operating system's own entropy API (`getrandom`, `BCryptGenRandom`, ...).

use super::EntropySource;
use rand_core::{OsRng, RngCore};

/// Entropy from the OS CSPRNG via `rand_core::OsRng`.
#[derive(Debug, Default)]
pub struct OsSource;

impl OsSource {
    /// Creates the OS entropy source.
    pub fn new() -> Self {
        Self
    }
}

impl EntropySource for OsSource {
    fn name(&self) -> &str {
        "os"
    }

    fn slow_poll(&mut self, buf: &mut [u8]) -> usize {
        match OsRng.try_fill_bytes(buf) {
            Ok(()) => buf.len(),
            Err(e) => {
                tracing::debug!(error = %e, "OS entropy API failed");
                0
            }
        }
    }

    fn has_fast_poll(&self) -> bool {
        true
    }
}
