//! Filesystem tree traversal, typically over `/proc`.

use super::{open_nonblocking, EntropyEstimator, EntropySource, Folder};
use std::collections::VecDeque;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

/// Walks a directory tree breadth-first, folding file contents and
/// metadata into the buffer.
///
/// Trees such as `/proc` repeat a lot of identical bytes, so the output is
/// credited with the delta estimator.
///
/// Symlinks are never followed and files are opened non-blocking, so
/// character devices under the root cannot stall the walk.
pub struct FilesystemScanSource {
    root: PathBuf,
    max_files: usize,
    max_read: usize,
    max_depth: usize,
}

impl FilesystemScanSource {
    /// Creates a walk of `root` bounded in files visited, bytes read per
    /// file and directory depth.
    pub fn new(root: PathBuf, max_files: usize, max_read: usize, max_depth: usize) -> Self {
        Self {
            root,
            max_files,
            max_read,
            max_depth,
        }
    }

    /// Returns the root of the walk.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl EntropySource for FilesystemScanSource {
    fn name(&self) -> &str {
        "filesystem_scan"
    }

    fn slow_poll(&mut self, buf: &mut [u8]) -> usize {
        let mut pending = VecDeque::from([(self.root.clone(), 0usize)]);
        let mut files = 0usize;
        let mut total = 0usize;
        let mut scratch = Vec::with_capacity(self.max_read);
        let mut folder = Folder::new(buf);

        'walk: while let Some((dir, depth)) = pending.pop_front() {
            let Ok(entries) = fs::read_dir(&dir) else {
                continue;
            };

            for entry in entries.flatten() {
                if files >= self.max_files {
                    break 'walk;
                }
                let Ok(meta) = fs::symlink_metadata(entry.path()) else {
                    continue;
                };

                if meta.is_dir() {
                    if depth < self.max_depth {
                        pending.push_back((entry.path(), depth + 1));
                    }
                    continue;
                }
                if !meta.is_file() {
                    continue;
                }

                let modified = meta
                    .modified()
                    .ok()
                    .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                    .map(|d| d.as_nanos() as u64)
                    .unwrap_or_default();
                folder.fold(&modified.to_le_bytes());

                scratch.clear();
                if let Ok(file) = open_nonblocking(&entry.path()) {
                    let _ = file.take(self.max_read as u64).read_to_end(&mut scratch);
                }
                folder.fold(&scratch);
                total += 8 + scratch.len();
                files += 1;
            }
        }

        tracing::trace!(files, bytes = total, "filesystem scan finished");
        folder.written()
    }

    fn estimator(&self) -> EntropyEstimator {
        EntropyEstimator::Delta
    }
}
