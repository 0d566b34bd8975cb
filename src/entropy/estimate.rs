//! Entropy crediting for polled input.

use serde::{Deserialize, Serialize};

/// How many bits of entropy a poll is credited with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntropyEstimator {
    /// Every byte a source returns counts as eight bits.
    #[default]
    Raw,
    /// Conservative delta heuristic: per byte, the Hamming weight of the
    /// smallest of the first, second and third order deltas, halved.
    Delta,
}

impl EntropyEstimator {
    /// Returns the number of bits credited for `input`.
    pub fn estimate(self, input: &[u8]) -> usize {
        match self {
            EntropyEstimator::Raw => input.len() * 8,
            EntropyEstimator::Delta => delta_estimate(input),
        }
    }
}

fn delta_estimate(input: &[u8]) -> usize {
    // Too short to say anything about.
    if input.len() <= 4 {
        return 0;
    }

    let mut estimate = 0usize;
    let (mut last, mut last_delta, mut last_delta2) = (0u8, 0u8, 0u8);

    for &byte in input {
        let delta = last ^ byte;
        last = byte;

        let delta2 = delta ^ last_delta;
        last_delta = delta;

        let delta3 = delta2 ^ last_delta2;
        last_delta2 = delta2;

        let min_delta = delta.min(delta2).min(delta3);
        estimate += min_delta.count_ones() as usize;
    }

    estimate / 2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_counts_bytes() {
        assert_eq!(EntropyEstimator::Raw.estimate(&[0u8; 16]), 128);
    }

    #[test]
    fn test_delta_rejects_short_input() {
        assert_eq!(EntropyEstimator::Delta.estimate(&[1, 2, 3, 4]), 0);
    }

    #[test]
    fn test_delta_constant_input_is_nearly_worthless() {
        let constant = [0xabu8; 128];
        // Only the first byte differs from the implicit zero history.
        assert!(EntropyEstimator::Delta.estimate(&constant) <= 4);
    }

    #[test]
    fn test_delta_credits_varied_input() {
        let varied: Vec<u8> = (0..128u32).map(|i| (i * 167 + 13) as u8 ^ (i >> 3) as u8).collect();
        let credited = EntropyEstimator::Delta.estimate(&varied);
        assert!(credited > 16);
        assert!(credited < varied.len() * 8);
    }
}
