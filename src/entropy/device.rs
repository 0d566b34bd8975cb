//! Random device files such as `/dev/urandom`.

use super::{open_nonblocking, EntropySource};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// Bytes requested from a device by `fast_poll`.
const FAST_POLL_BYTES: usize = 16;

/// Reads from the first responsive device in a list of candidates.
///
/// Devices are opened non-blocking, so a device that has nothing ready
/// contributes 0 bytes instead of stalling the generator.
pub struct DeviceSource {
    paths: Vec<PathBuf>,
}

impl DeviceSource {
    /// Creates a source reading from the first usable of `paths`.
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }

    /// Returns the candidate device paths.
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    fn read_device(path: &Path, buf: &mut [u8]) -> io::Result<usize> {
        let mut device = open_nonblocking(path)?;
        match device.read(buf) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(0),
            Err(e) => Err(e),
        }
    }

    fn poll(&mut self, buf: &mut [u8]) -> usize {
        let mut got = 0;
        for path in &self.paths {
            if got == buf.len() {
                break;
            }
            match Self::read_device(path, &mut buf[got..]) {
                Ok(n) => got += n,
                Err(e) => {
                    tracing::trace!(path = %path.display(), error = %e, "device unreadable");
                }
            }
        }
        got
    }
}

impl EntropySource for DeviceSource {
    fn name(&self) -> &str {
        "device"
    }

    fn fast_poll(&mut self, buf: &mut [u8]) -> usize {
        let len = buf.len().min(FAST_POLL_BYTES);
        self.poll(&mut buf[..len])
    }

    fn slow_poll(&mut self, buf: &mut [u8]) -> usize {
        self.poll(buf)
    }

    fn has_fast_poll(&self) -> bool {
        true
    }
}
