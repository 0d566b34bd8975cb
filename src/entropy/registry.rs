//! Named entropy sources and the settings needed to build them.
//!
//! Which sources exist on a platform is decided in exactly one place,
//! [`SourceId::platform_defaults`]. Whether a compiled-in source is usable on
//! the running machine is checked at assembly time by
//! [`SourceId::is_available`].

use super::{
    DeviceSource, EgdSource, EntropySource, FilesystemScanSource, OsSource, ProcessScanSource,
    TimerSource,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Identifier of an entropy source kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceId {
    /// Timing jitter. Cheapest, always present.
    Timer,
    /// Random device files.
    Device,
    /// The OS entropy API.
    Os,
    /// Entropy Gathering Daemon sockets.
    Egd,
    /// Output of system status programs.
    ProcessScan,
    /// Filesystem tree traversal.
    FilesystemScan,
}

impl SourceId {
    /// Every source kind, in registration order.
    pub const ALL: [SourceId; 6] = [
        SourceId::Timer,
        SourceId::Device,
        SourceId::Os,
        SourceId::Egd,
        SourceId::ProcessScan,
        SourceId::FilesystemScan,
    ];

    /// Registration tier. Lower tiers are cheaper and registered first;
    /// this reflects cost, not trust.
    pub fn priority(self) -> u8 {
        match self {
            SourceId::Timer => 0,
            SourceId::Device | SourceId::Os => 1,
            SourceId::Egd => 2,
            SourceId::ProcessScan | SourceId::FilesystemScan => 3,
        }
    }

    /// Sources compiled in for the target platform.
    pub fn platform_defaults() -> Vec<SourceId> {
        if cfg!(unix) {
            Self::ALL.to_vec()
        } else {
            vec![SourceId::Timer, SourceId::Os]
        }
    }

    /// Whether this source can work on the running machine.
    pub fn is_available(self, settings: &SourceSettings) -> bool {
        match self {
            SourceId::Timer | SourceId::Os => true,
            SourceId::Device => settings.device_paths.iter().any(|p| p.exists()),
            SourceId::Egd => cfg!(unix) && settings.egd_paths.iter().any(|p| p.exists()),
            SourceId::ProcessScan => {
                cfg!(unix)
                    && !settings.process_commands.is_empty()
                    && settings.process_dirs.iter().any(|d| d.is_dir())
            }
            SourceId::FilesystemScan => settings.scan_root.is_dir(),
        }
    }

    /// Builds the source from its settings.
    pub fn build(self, settings: &SourceSettings) -> Box<dyn EntropySource> {
        match self {
            SourceId::Timer => Box::new(TimerSource::new()),
            SourceId::Device => Box::new(DeviceSource::new(settings.device_paths.clone())),
            SourceId::Os => Box::new(OsSource::new()),
            SourceId::Egd => Box::new(EgdSource::new(
                settings.egd_paths.clone(),
                Duration::from_millis(settings.egd_timeout_ms),
            )),
            SourceId::ProcessScan => Box::new(ProcessScanSource::new(
                settings.process_dirs.clone(),
                settings.process_commands.clone(),
                Duration::from_millis(settings.process_timeout_ms),
                settings.process_max_output,
            )),
            SourceId::FilesystemScan => Box::new(FilesystemScanSource::new(
                settings.scan_root.clone(),
                settings.scan_max_files,
                settings.scan_max_read,
                settings.scan_max_depth,
            )),
        }
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SourceId::Timer => "timer",
            SourceId::Device => "device",
            SourceId::Os => "os",
            SourceId::Egd => "egd",
            SourceId::ProcessScan => "process_scan",
            SourceId::FilesystemScan => "filesystem_scan",
        };
        f.write_str(name)
    }
}

/// Per-source settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    /// Random devices, tried in order.
    pub device_paths: Vec<PathBuf>,
    /// EGD sockets, tried in order.
    pub egd_paths: Vec<PathBuf>,
    /// Socket read/write timeout for EGD.
    pub egd_timeout_ms: u64,
    /// Directories searched for status programs.
    pub process_dirs: Vec<PathBuf>,
    /// Status command lines, program first.
    pub process_commands: Vec<String>,
    /// Wall-clock limit per status command.
    pub process_timeout_ms: u64,
    /// Output bytes kept per status command.
    pub process_max_output: usize,
    /// Root of the filesystem scan.
    pub scan_root: PathBuf,
    /// Files visited per scan.
    pub scan_max_files: usize,
    /// Bytes read per file.
    pub scan_max_read: usize,
    /// Directory depth below the root.
    pub scan_max_depth: usize,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            device_paths: ["/dev/random", "/dev/srandom", "/dev/urandom"]
                .into_iter()
                .map(PathBuf::from)
                .collect(),
            egd_paths: ["/var/run/egd-pool", "/dev/egd-pool"]
                .into_iter()
                .map(PathBuf::from)
                .collect(),
            egd_timeout_ms: 250,
            process_dirs: ["/bin", "/sbin", "/usr/bin", "/usr/sbin"]
                .into_iter()
                .map(PathBuf::from)
                .collect(),
            process_commands: [
                "ps -elf",
                "netstat -an",
                "vmstat",
                "df",
                "uptime",
                "ls -alni /tmp",
                "w",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            process_timeout_ms: 500,
            process_max_output: 16 * 1024,
            scan_root: PathBuf::from("/proc"),
            scan_max_files: 256,
            scan_max_read: 4096,
            scan_max_depth: 2,
        }
    }
}
