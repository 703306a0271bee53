mod health;
mod probe;
mod recommend;
mod sampler;

pub use probe::{OsProbe, SystemProbe};
pub use recommend::Recommendation;

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use log::{info, warn};

use health::health_score;
use probe::{home_fallback, DiskReading, ProbeError};
use sampler::{MetricKind, Sampler};

/// Temperature is re-read on a fixed cadence; it is not configurable.
const TEMP_INTERVAL: Duration = Duration::from_secs(10);

/// Own-process RSS above which sampling intervals are widened.
const MEMORY_PRESSURE_LIMIT_MB: f64 = 25.0;
/// Own-process RSS above which recommendation evaluation is skipped.
const RECOMMENDATION_MEMORY_LIMIT_MB: f64 = 30.0;

/// Intervals applied once memory pressure is detected.
const WIDE_CPU_INTERVAL: Duration = Duration::from_secs(10);
const WIDE_RAM_INTERVAL: Duration = Duration::from_secs(15);
const WIDE_DISK_INTERVAL: Duration = Duration::from_secs(20);

/// Staleness windows for the three configurable metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollIntervals {
    pub cpu: Duration,
    pub ram: Duration,
    pub disk: Duration,
}

impl Default for PollIntervals {
    fn default() -> Self {
        Self {
            cpu: Duration::from_secs(3),
            ram: Duration::from_secs(5),
            disk: Duration::from_secs(10),
        }
    }
}

/// RAM and disk capacity captured once at startup. Capacity changes during
/// the process lifetime are not tracked.
#[derive(Debug, Clone, Copy, Default)]
struct TotalsCache {
    ram_total_gb: f64,
    disk_total_gb: f64,
}

/// Point-in-time usage of a sized resource.
#[derive(Debug, Clone, Copy, Default)]
pub struct UsageLevel {
    pub used_gb: f64,
    pub total_gb: f64,
    pub percent: f64,
}

/// Full snapshot consumed by the main window.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub cpu_percent: f64,
    pub ram: UsageLevel,
    pub disk: UsageLevel,
    /// `None` when the host has no temperature sensor.
    pub temp_celsius: Option<f64>,
    pub health: f64,
    pub recommendations: Option<Vec<Recommendation>>,
}

/// Trimmed snapshot for the overlay widget, which has no room for GB
/// breakdowns.
#[derive(Debug, Clone, Copy)]
pub struct LightweightSnapshot {
    pub cpu_percent: f64,
    pub ram_percent: f64,
    pub disk_percent: f64,
    pub temp_celsius: Option<f64>,
    pub health: f64,
}

/// The monitoring engine: one staleness-gated sampler per metric, a totals
/// cache, and derivation of health and recommendations.
///
/// Shared between the producer thread and UI consumers behind an `Arc`; no
/// snapshot operation holds a lock for longer than a single metric's
/// re-sample decision.
pub struct MonitorEngine {
    probe: Box<dyn SystemProbe>,
    epoch: Instant,
    cpu: Sampler,
    ram: Sampler,
    disk: Sampler,
    /// `None` when the capability check at construction found no sensor.
    /// Never re-probed for the lifetime of the engine.
    temp: Option<Sampler>,
    totals: TotalsCache,
    disk_path: PathBuf,
}

impl MonitorEngine {
    pub fn new(intervals: PollIntervals) -> Self {
        Self::with_probe(Box::new(OsProbe::new()), intervals)
    }

    pub fn with_probe(probe: Box<dyn SystemProbe>, intervals: PollIntervals) -> Self {
        let temp_available = probe.has_temperature_sensor();
        if !temp_available {
            info!("no temperature sensor found, readings will be absent");
        }

        let disk_path = PathBuf::from("/");
        let totals = Self::init_totals(probe.as_ref(), &disk_path);

        Self {
            probe,
            epoch: Instant::now(),
            cpu: Sampler::new(MetricKind::Cpu, intervals.cpu),
            ram: Sampler::new(MetricKind::Ram, intervals.ram),
            disk: Sampler::new(MetricKind::Disk, intervals.disk),
            temp: temp_available.then(|| Sampler::new(MetricKind::Temperature, TEMP_INTERVAL)),
            totals,
            disk_path,
        }
    }

    fn init_totals(probe: &dyn SystemProbe, disk_path: &Path) -> TotalsCache {
        let ram_total_gb = match probe.memory() {
            Ok(memory) => memory.total_gb(),
            Err(e) => {
                warn!("could not read total memory: {}", e);
                0.0
            }
        };
        let disk_total_gb = match Self::disk_with_fallback(probe, disk_path) {
            Ok(disk) => disk.total_gb(),
            Err(e) => {
                warn!("could not read disk capacity: {}", e);
                0.0
            }
        };
        TotalsCache {
            ram_total_gb,
            disk_total_gb,
        }
    }

    /// Query disk usage for `path`, falling back to the home directory
    /// before giving up for this cycle.
    fn disk_with_fallback(probe: &dyn SystemProbe, path: &Path) -> Result<DiskReading, ProbeError> {
        probe.disk_usage(path).or_else(|primary| match home_fallback() {
            Some(home) => probe.disk_usage(home),
            None => Err(primary),
        })
    }

    /// Current metrics for the overlay widget. Each metric re-samples the
    /// OS only if its staleness window has elapsed.
    pub fn lightweight_snapshot(&self) -> LightweightSnapshot {
        self.lightweight_at(Instant::now())
    }

    fn lightweight_at(&self, now: Instant) -> LightweightSnapshot {
        let now_ms = now.saturating_duration_since(self.epoch).as_millis() as u64;
        let probe = self.probe.as_ref();

        let cpu = self
            .cpu
            .maybe_resample(now_ms, || probe.cpu_percent().map(clamp_percent));
        let ram = self
            .ram
            .maybe_resample(now_ms, || probe.memory().map(|m| clamp_percent(m.percent())));
        let disk = self.disk.maybe_resample(now_ms, || {
            Self::disk_with_fallback(probe, &self.disk_path).map(|d| clamp_percent(d.percent()))
        });
        let temp = self
            .temp
            .as_ref()
            .map(|sampler| sampler.maybe_resample(now_ms, || probe.temperature()));

        LightweightSnapshot {
            cpu_percent: cpu,
            ram_percent: ram,
            disk_percent: disk,
            temp_celsius: temp,
            health: health_score(cpu, ram, disk),
        }
    }

    /// Full snapshot for the main window. GB figures are derived on the fly
    /// from the cached percentages and the startup totals.
    pub fn snapshot(&self, include_recommendations: bool) -> Snapshot {
        self.snapshot_at(Instant::now(), include_recommendations)
    }

    fn snapshot_at(&self, now: Instant, include_recommendations: bool) -> Snapshot {
        let light = self.lightweight_at(now);

        Snapshot {
            cpu_percent: light.cpu_percent,
            ram: UsageLevel {
                used_gb: light.ram_percent / 100.0 * self.totals.ram_total_gb,
                total_gb: self.totals.ram_total_gb,
                percent: light.ram_percent,
            },
            disk: UsageLevel {
                used_gb: light.disk_percent / 100.0 * self.totals.disk_total_gb,
                total_gb: self.totals.disk_total_gb,
                percent: light.disk_percent,
            },
            temp_celsius: light.temp_celsius,
            health: light.health,
            recommendations: include_recommendations.then(|| self.recommendations()),
        }
    }

    /// Rule-based tips derived from the cached percentages. Skipped
    /// entirely when this process's own footprint is already too large.
    pub fn recommendations(&self) -> Vec<Recommendation> {
        if self.probe.own_memory_mb() > RECOMMENDATION_MEMORY_LIMIT_MB {
            return Vec::new();
        }
        recommend::evaluate(&recommend::Readings {
            cpu_percent: self.cpu.cached(),
            ram_percent: self.ram.cached(),
            disk_percent: self.disk.cached(),
        })
    }

    /// Widen the sampling intervals when this process's resident memory
    /// exceeds the limit. The widening is one-way: intervals are not
    /// restored when pressure subsides. Returns whether widening applied.
    pub fn check_memory_pressure(&self) -> bool {
        let rss_mb = self.probe.own_memory_mb();
        if rss_mb <= MEMORY_PRESSURE_LIMIT_MB {
            return false;
        }
        warn!(
            "resident memory at {:.1} MB, widening sampling intervals",
            rss_mb
        );
        self.cpu.set_interval(WIDE_CPU_INTERVAL);
        self.ram.set_interval(WIDE_RAM_INTERVAL);
        self.disk.set_interval(WIDE_DISK_INTERVAL);
        true
    }
}

fn clamp_percent(value: f64) -> f64 {
    value.clamp(0.0, 100.0)
}
