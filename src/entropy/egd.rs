//! Entropy Gathering Daemon client.
//!
//! EGD listens on a Unix socket. A non-blocking read request is the two
//! bytes `0x01 n`; the daemon answers with one count byte followed by that
//! many bytes of entropy (possibly fewer than asked for, possibly none).

use super::EntropySource;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// EGD command: read entropy without blocking.
#[cfg(unix)]
const EGD_READ_NONBLOCKING: u8 = 0x01;

/// Largest request the protocol can express.
#[cfg(unix)]
const EGD_MAX_REQUEST: usize = 255;

/// Client for one or more EGD sockets.
pub struct EgdSource {
    paths: Vec<PathBuf>,
    timeout: Duration,
}

impl EgdSource {
    /// Creates a client trying `paths` in order, each with `timeout` per
    /// socket operation.
    pub fn new(paths: Vec<PathBuf>, timeout: Duration) -> Self {
        Self { paths, timeout }
    }

    #[cfg(unix)]
    fn request(&self, path: &Path, buf: &mut [u8]) -> std::io::Result<usize> {
        use std::io::{Read, Write};
        use std::os::unix::net::UnixStream;

        let mut stream = UnixStream::connect(path)?;
        stream.set_read_timeout(Some(self.timeout))?;
        stream.set_write_timeout(Some(self.timeout))?;

        let want = buf.len().min(EGD_MAX_REQUEST);
        stream.write_all(&[EGD_READ_NONBLOCKING, want as u8])?;

        let mut count = [0u8; 1];
        stream.read_exact(&mut count)?;
        let count = (count[0] as usize).min(want);
        stream.read_exact(&mut buf[..count])?;
        Ok(count)
    }

    #[cfg(not(unix))]
    fn request(&self, _path: &Path, _buf: &mut [u8]) -> std::io::Result<usize> {
        Ok(0)
    }
}

impl EntropySource for EgdSource {
    fn name(&self) -> &str {
        "egd"
    }

    fn slow_poll(&mut self, buf: &mut [u8]) -> usize {
        for path in &self.paths {
            match self.request(path, buf) {
                Ok(0) => continue,
                Ok(n) => return n,
                Err(e) => {
                    tracing::debug!(socket = %path.display(), error = %e, "EGD request failed");
                }
            }
        }
        0
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::os::unix::net::UnixListener;

    #[test]
    fn test_missing_socket_yields_nothing() {
        let mut source = EgdSource::new(
            vec![PathBuf::from("/nonexistent/egd-pool")],
            Duration::from_millis(50),
        );
        let mut buf = [0u8; 16];
        assert_eq!(source.slow_poll(&mut buf), 0);
    }

    #[test]
    fn test_speaks_egd_protocol() {
        let path = std::env::temp_dir().join(format!("poolrng-egd-{}.sock", std::process::id()));
        let _ = std::fs::remove_file(&path);
        let listener = UnixListener::bind(&path).unwrap();

        let daemon = std::thread::spawn(move || {
            let (mut conn, _) = listener.accept().unwrap();
            let mut request = [0u8; 2];
            conn.read_exact(&mut request).unwrap();
            assert_eq!(request[0], EGD_READ_NONBLOCKING);
            // Hand back fewer bytes than asked for.
            conn.write_all(&[4, 9, 8, 7, 6]).unwrap();
            request[1]
        });

        let mut source = EgdSource::new(vec![path.clone()], Duration::from_secs(2));
        let mut buf = [0u8; 16];
        let got = source.slow_poll(&mut buf);

        assert_eq!(daemon.join().unwrap(), 16);
        assert_eq!(got, 4);
        assert_eq!(&buf[..4], &[9, 8, 7, 6]);
        std::fs::remove_file(path).unwrap();
    }
}
