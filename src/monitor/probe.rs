use std::fmt;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use sysinfo::{Components, Disks, ProcessesToUpdate, System};

/// How long a CPU sample blocks between the two usage refreshes.
const CPU_SAMPLE_WINDOW: Duration = Duration::from_secs(1);

const BYTES_PER_GB: f64 = (1u64 << 30) as f64;
const BYTES_PER_MB: f64 = (1u64 << 20) as f64;

/// Fallback location for disk queries when the root filesystem cannot be
/// resolved, resolved once per process.
static HOME_DIR: Lazy<Option<PathBuf>> =
    Lazy::new(|| directories::BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf()));

pub fn home_fallback() -> Option<&'static Path> {
    HOME_DIR.as_deref()
}

#[derive(Debug)]
pub enum ProbeError {
    /// The capability does not exist on this host; retrying will not help.
    SensorUnavailable,
    /// A transient failure reading an otherwise present source.
    SampleFailed(String),
}

impl fmt::Display for ProbeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SensorUnavailable => write!(f, "sensor not available on this host"),
            Self::SampleFailed(reason) => write!(f, "sample failed: {}", reason),
        }
    }
}

impl std::error::Error for ProbeError {}

/// Raw memory reading in bytes.
#[derive(Debug, Clone, Copy)]
pub struct MemoryReading {
    pub used_bytes: u64,
    pub total_bytes: u64,
}

/// Raw disk usage reading in bytes.
#[derive(Debug, Clone, Copy)]
pub struct DiskReading {
    pub used_bytes: u64,
    pub total_bytes: u64,
}

impl MemoryReading {
    pub fn percent(&self) -> f64 {
        percent_of(self.used_bytes, self.total_bytes)
    }

    pub fn total_gb(&self) -> f64 {
        self.total_bytes as f64 / BYTES_PER_GB
    }
}

impl DiskReading {
    pub fn percent(&self) -> f64 {
        percent_of(self.used_bytes, self.total_bytes)
    }

    pub fn total_gb(&self) -> f64 {
        self.total_bytes as f64 / BYTES_PER_GB
    }
}

fn percent_of(used: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    used as f64 / total as f64 * 100.0
}

/// Boundary between the monitoring engine and the operating system.
///
/// Everything the engine knows about the host comes through this trait, so
/// tests can substitute a mock with call counters and canned failures.
pub trait SystemProbe: Send + Sync {
    /// Instantaneous CPU usage in percent. Blocks for about a second while
    /// the usage delta accumulates.
    fn cpu_percent(&self) -> Result<f64, ProbeError>;

    fn memory(&self) -> Result<MemoryReading, ProbeError>;

    /// Usage of the filesystem holding `path`.
    fn disk_usage(&self, path: &Path) -> Result<DiskReading, ProbeError>;

    /// Reading of the first available temperature sensor, in °C.
    fn temperature(&self) -> Result<f64, ProbeError>;

    /// Whether any temperature sensor exists. Consulted once, at engine
    /// construction.
    fn has_temperature_sensor(&self) -> bool;

    /// Resident memory of this process in MB.
    fn own_memory_mb(&self) -> f64;
}

/// Production probe backed by sysinfo.
pub struct OsProbe {
    system: Mutex<System>,
    disks: Mutex<Disks>,
    components: Mutex<Components>,
}

impl OsProbe {
    pub fn new() -> Self {
        let mut system = System::new();
        // Baseline refresh so the first usage delta has something to diff
        // against.
        system.refresh_cpu_usage();
        system.refresh_memory();

        Self {
            system: Mutex::new(system),
            disks: Mutex::new(Disks::new_with_refreshed_list()),
            components: Mutex::new(Components::new_with_refreshed_list()),
        }
    }
}

impl SystemProbe for OsProbe {
    fn cpu_percent(&self) -> Result<f64, ProbeError> {
        let mut system = self.system.lock();
        system.refresh_cpu_usage();
        thread::sleep(CPU_SAMPLE_WINDOW);
        system.refresh_cpu_usage();

        if system.cpus().is_empty() {
            return Err(ProbeError::SampleFailed("no CPUs reported".into()));
        }
        Ok(f64::from(system.global_cpu_usage()))
    }

    fn memory(&self) -> Result<MemoryReading, ProbeError> {
        let mut system = self.system.lock();
        system.refresh_memory();

        let total_bytes = system.total_memory();
        if total_bytes == 0 {
            return Err(ProbeError::SampleFailed("total memory reported as zero".into()));
        }
        Ok(MemoryReading {
            used_bytes: system.used_memory(),
            total_bytes,
        })
    }

    fn disk_usage(&self, path: &Path) -> Result<DiskReading, ProbeError> {
        let mut disks = self.disks.lock();
        disks.refresh();
        if disks.list().is_empty() {
            disks.refresh_list();
        }

        // The filesystem holding `path` is the mounted disk with the
        // longest mount point that is a prefix of it.
        let disk = disks
            .list()
            .iter()
            .filter(|disk| path.starts_with(disk.mount_point()))
            .max_by_key(|disk| disk.mount_point().as_os_str().len())
            .ok_or_else(|| {
                ProbeError::SampleFailed(format!(
                    "no mounted filesystem contains {}",
                    path.display()
                ))
            })?;

        let total_bytes = disk.total_space();
        if total_bytes == 0 {
            return Err(ProbeError::SampleFailed(format!(
                "{} reports zero capacity",
                disk.mount_point().display()
            )));
        }
        Ok(DiskReading {
            used_bytes: total_bytes - disk.available_space(),
            total_bytes,
        })
    }

    fn temperature(&self) -> Result<f64, ProbeError> {
        let mut components = self.components.lock();
        components.refresh();

        components
            .list()
            .first()
            .map(|component| f64::from(component.temperature()))
            .ok_or(ProbeError::SensorUnavailable)
    }

    fn has_temperature_sensor(&self) -> bool {
        !self.components.lock().list().is_empty()
    }

    fn own_memory_mb(&self) -> f64 {
        let pid = match sysinfo::get_current_pid() {
            Ok(pid) => pid,
            Err(_) => return 0.0,
        };
        let mut system = self.system.lock();
        system.refresh_processes(ProcessesToUpdate::Some(&[pid]));
        system
            .process(pid)
            .map(|process| process.memory() as f64 / BYTES_PER_MB)
            .unwrap_or(0.0)
    }
}

impl Default for OsProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_handles_zero_total() {
        let reading = DiskReading {
            used_bytes: 100,
            total_bytes: 0,
        };
        assert_eq!(reading.percent(), 0.0);
    }

    #[test]
    fn percent_of_half_used() {
        let reading = MemoryReading {
            used_bytes: 4 << 30,
            total_bytes: 8 << 30,
        };
        assert_eq!(reading.percent(), 50.0);
        assert_eq!(reading.total_gb(), 8.0);
    }

    #[test]
    fn error_display_names_the_failure() {
        let unavailable = ProbeError::SensorUnavailable;
        assert_eq!(unavailable.to_string(), "sensor not available on this host");

        let failed = ProbeError::SampleFailed("permission denied".into());
        assert_eq!(failed.to_string(), "sample failed: permission denied");
    }
}
