//! Entropy sources.
//!
//! An entropy source contributes raw, best-effort unpredictable bytes. The
//! bytes are not assumed to be uniform; the generator conditions them
//! through its MAC before they influence any output.
//!
//! Every source has two entry points. `slow_poll` gathers as much as the
//! source reasonably can; `fast_poll` is the cheap top-up path and, unless a
//! source overrides it, simply forwards to `slow_poll`. Neither may block
//! indefinitely: a source with nothing to give returns 0.

mod device;
mod egd;
mod estimate;
mod filesystem;
mod mock;
mod os;
mod process;
mod registry;
mod timer;

pub use device::DeviceSource;
pub use egd::EgdSource;
pub use estimate::EntropyEstimator;
pub use filesystem::FilesystemScanSource;
pub use mock::{MockSource, MockSourceBehaviour, PollCounts};
pub use os::OsSource;
pub use process::ProcessScanSource;
pub use registry::{SourceId, SourceSettings};
pub use timer::TimerSource;

use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;

/// Capability contract for anything that can contribute entropy.
pub trait EntropySource: Send {
    /// Short identifier used in logs and metrics.
    fn name(&self) -> &str;

    /// Gathers entropy into `buf`, returning the number of bytes written.
    ///
    /// May take noticeable wall-clock time, but must return promptly with
    /// 0 rather than stall when nothing is available.
    fn slow_poll(&mut self, buf: &mut [u8]) -> usize;

    /// Cheap top-up. Defaults to [`EntropySource::slow_poll`].
    fn fast_poll(&mut self, buf: &mut [u8]) -> usize {
        self.slow_poll(buf)
    }

    /// Whether `fast_poll` is a genuinely cheap path rather than the
    /// default forward to `slow_poll`.
    fn has_fast_poll(&self) -> bool {
        false
    }

    /// How this source's output should be credited. The generator never
    /// credits more than its own configured estimator allows.
    fn estimator(&self) -> EntropyEstimator {
        EntropyEstimator::Raw
    }
}

/// Folds a stream of records into a buffer end to end.
///
/// Each record continues where the previous one stopped, wrapping at the
/// end of the buffer. Where a byte lands on a position that already holds
/// data, the old value is rotated before the new one is added, so repeated
/// records never cancel out.
pub(crate) struct Folder<'a> {
    buf: &'a mut [u8],
    position: usize,
    written: usize,
}

impl<'a> Folder<'a> {
    pub(crate) fn new(buf: &'a mut [u8]) -> Self {
        Self {
            buf,
            position: 0,
            written: 0,
        }
    }

    pub(crate) fn fold(&mut self, record: &[u8]) {
        if self.buf.is_empty() {
            return;
        }
        for &byte in record {
            let slot = &mut self.buf[self.position];
            *slot = slot.rotate_left(3).wrapping_add(byte);
            self.position = (self.position + 1) % self.buf.len();
        }
        self.written = (self.written + record.len()).min(self.buf.len());
    }

    /// Distinct buffer positions holding folded data.
    pub(crate) fn written(&self) -> usize {
        self.written
    }
}

/// Folds a single record into `buf`, returning how many bytes of `buf`
/// it reached.
pub(crate) fn fold_into(buf: &mut [u8], data: &[u8]) -> usize {
    let mut folder = Folder::new(buf);
    folder.fold(data);
    folder.written()
}

/// Opens a file for reading without letting the open or later reads block.
pub(crate) fn open_nonblocking(path: &Path) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.read(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.custom_flags(libc::O_NONBLOCK | libc::O_NOCTTY);
    }
    options.open(path)
}
