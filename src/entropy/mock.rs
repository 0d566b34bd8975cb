//! Scripted entropy source for tests and demonstrations.
//!
//! NOT an entropy source. Output is entirely predictable.

use super::{EntropyEstimator, EntropySource};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// What a [`MockSource`] produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockSourceBehaviour {
    /// Both polls fill the buffer with one byte value.
    Pattern(u8),
    /// Both polls fill the buffer with an incrementing byte sequence.
    Counter,
    /// Both polls return nothing.
    Empty,
    /// Has its own `fast_poll`, which never has anything ready;
    /// `slow_poll` fills with the pattern.
    SlowOnly(u8),
}

/// Poll counters shared between a [`MockSource`] and the test observing it.
#[derive(Debug, Default)]
pub struct PollCounts {
    fast: AtomicUsize,
    slow: AtomicUsize,
}

impl PollCounts {
    /// Number of `fast_poll` calls so far.
    pub fn fast(&self) -> usize {
        self.fast.load(Ordering::Relaxed)
    }

    /// Number of `slow_poll` calls so far.
    pub fn slow(&self) -> usize {
        self.slow.load(Ordering::Relaxed)
    }
}

/// Scripted entropy source.
#[derive(Debug)]
pub struct MockSource {
    behaviour: MockSourceBehaviour,
    counts: Arc<PollCounts>,
    next: u8,
    estimator: EntropyEstimator,
}

impl MockSource {
    /// Creates a source following `behaviour`.
    pub fn new(behaviour: MockSourceBehaviour) -> Self {
        Self {
            behaviour,
            counts: Arc::new(PollCounts::default()),
            next: 1,
            estimator: EntropyEstimator::Raw,
        }
    }

    /// Asks the generator to credit this source's output with `estimator`.
    pub fn with_estimator(mut self, estimator: EntropyEstimator) -> Self {
        self.estimator = estimator;
        self
    }

    /// Returns a handle on the poll counters that outlives the source.
    pub fn counts(&self) -> Arc<PollCounts> {
        Arc::clone(&self.counts)
    }

    fn produce(&mut self, buf: &mut [u8], fast: bool) -> usize {
        match self.behaviour {
            MockSourceBehaviour::Pattern(byte) => {
                buf.fill(byte);
                buf.len()
            }
            MockSourceBehaviour::Counter => {
                for b in buf.iter_mut() {
                    *b = self.next;
                    self.next = self.next.wrapping_add(1);
                }
                buf.len()
            }
            MockSourceBehaviour::Empty => 0,
            MockSourceBehaviour::SlowOnly(_) if fast => 0,
            MockSourceBehaviour::SlowOnly(byte) => {
                buf.fill(byte);
                buf.len()
            }
        }
    }
}

impl EntropySource for MockSource {
    fn name(&self) -> &str {
        "mock"
    }

    fn fast_poll(&mut self, buf: &mut [u8]) -> usize {
        self.counts.fast.fetch_add(1, Ordering::Relaxed);
        self.produce(buf, true)
    }

    fn slow_poll(&mut self, buf: &mut [u8]) -> usize {
        self.counts.slow.fetch_add(1, Ordering::Relaxed);
        self.produce(buf, false)
    }

    fn has_fast_poll(&self) -> bool {
        matches!(self.behaviour, MockSourceBehaviour::SlowOnly(_))
    }

    fn estimator(&self) -> EntropyEstimator {
        self.estimator
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_survive_boxing() {
        let source = MockSource::new(MockSourceBehaviour::Pattern(3));
        let counts = source.counts();
        let mut boxed: Box<dyn EntropySource> = Box::new(source);

        let mut buf = [0u8; 4];
        boxed.fast_poll(&mut buf);
        boxed.slow_poll(&mut buf);
        boxed.slow_poll(&mut buf);

        assert_eq!(counts.fast(), 1);
        assert_eq!(counts.slow(), 2);
    }

    #[test]
    fn test_slow_only_behaviour() {
        let mut source = MockSource::new(MockSourceBehaviour::SlowOnly(9));
        let mut buf = [0u8; 4];

        assert_eq!(source.fast_poll(&mut buf), 0);
        assert_eq!(source.slow_poll(&mut buf), 4);
        assert_eq!(buf, [9; 4]);
    }
}
