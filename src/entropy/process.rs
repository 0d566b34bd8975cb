//! Entropy from the output of system status programs.
//!
//! Tools such as `ps`, `netstat` and `vmstat` print process tables and
//! kernel counters that change constantly. Their output is low quality per
//! byte but plentiful; the generator's MAC does the compression, and the
//! output is credited with the delta estimator.

use super::{fold_into, open_nonblocking, EntropyEstimator, EntropySource, Folder};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// How often a running command is checked for completion.
const WAIT_STEP: Duration = Duration::from_millis(5);

/// Time allowed to collect buffered output after a command has finished.
const READ_GRACE: Duration = Duration::from_millis(50);

/// Runs system status programs and folds their output into the buffer.
pub struct ProcessScanSource {
    search_dirs: Vec<PathBuf>,
    commands: Vec<String>,
    timeout: Duration,
    max_output: usize,
}

impl ProcessScanSource {
    /// Creates a source running `commands`, each resolved against
    /// `search_dirs` and bounded by `timeout` and `max_output` bytes.
    pub fn new(
        search_dirs: Vec<PathBuf>,
        commands: Vec<String>,
        timeout: Duration,
        max_output: usize,
    ) -> Self {
        Self {
            search_dirs,
            commands,
            timeout,
            max_output,
        }
    }

    /// Finds the program of a command line in the search directories.
    fn resolve(&self, program: &str) -> Option<PathBuf> {
        self.search_dirs
            .iter()
            .map(|dir| dir.join(program))
            .find(|candidate| candidate.is_file())
    }

    /// Runs a program, killing it once the timeout expires.
    ///
    /// Output past `max_output` is drained and discarded so the child
    /// never stalls on a full pipe. A descendant that inherits the pipe can
    /// keep it open after the child is gone; collection stops at the
    /// deadline regardless and the reader thread is left to finish alone.
    fn run(&self, program: &Path, args: &[&str]) -> Option<Vec<u8>> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .ok()?;

        let mut stdout = child.stdout.take()?;
        let (tx, rx) = mpsc::channel::<Vec<u8>>();
        let limit = self.max_output;
        thread::spawn(move || {
            let mut chunk = [0u8; 4096];
            let mut remaining = limit;
            loop {
                match stdout.read(&mut chunk) {
                    Ok(0) => break,
                    Ok(n) => {
                        let keep = n.min(remaining);
                        remaining -= keep;
                        if keep > 0 && tx.send(chunk[..keep].to_vec()).is_err() {
                            break;
                        }
                    }
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(_) => break,
                }
            }
        });

        let deadline = Instant::now() + self.timeout;
        loop {
            match child.try_wait() {
                Ok(Some(_)) => break,
                Ok(None) if Instant::now() < deadline => thread::sleep(WAIT_STEP),
                _ => {
                    tracing::debug!(program = %program.display(), "killing slow entropy command");
                    let _ = child.kill();
                    let _ = child.wait();
                    break;
                }
            }
        }

        let cutoff = deadline.max(Instant::now() + READ_GRACE);
        let mut output = Vec::new();
        loop {
            let wait = cutoff.saturating_duration_since(Instant::now());
            match rx.recv_timeout(wait) {
                Ok(chunk) => output.extend_from_slice(&chunk),
                Err(mpsc::RecvTimeoutError::Disconnected) => break,
                Err(mpsc::RecvTimeoutError::Timeout) => {
                    tracing::debug!(
                        program = %program.display(),
                        "entropy command output still open at deadline"
                    );
                    break;
                }
            }
        }
        Some(output)
    }
}

impl EntropySource for ProcessScanSource {
    fn name(&self) -> &str {
        "process_scan"
    }

    /// Process identity and scheduler counters for the current process.
    fn fast_poll(&mut self, buf: &mut [u8]) -> usize {
        let mut sample = Vec::with_capacity(64);
        sample.extend_from_slice(&std::process::id().to_le_bytes());
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        sample.extend_from_slice(&now.to_le_bytes());

        if let Ok(file) = open_nonblocking(Path::new("/proc/self/stat")) {
            let _ = file.take(512).read_to_end(&mut sample);
        }

        fold_into(buf, &sample)
    }

    fn slow_poll(&mut self, buf: &mut [u8]) -> usize {
        let mut folder = Folder::new(buf);

        for command in &self.commands {
            let mut words = command.split_whitespace();
            let Some(program) = words.next() else {
                continue;
            };
            let args: Vec<&str> = words.collect();

            let Some(path) = self.resolve(program) else {
                tracing::trace!(program, "entropy command not found");
                continue;
            };

            if let Some(output) = self.run(&path, &args) {
                tracing::trace!(command = %command, bytes = output.len(), "entropy command finished");
                folder.fold(&output);
            }
        }

        folder.written()
    }

    fn has_fast_poll(&self) -> bool {
        true
    }

    fn estimator(&self) -> EntropyEstimator {
        EntropyEstimator::Delta
    }
}
