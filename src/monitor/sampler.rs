use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use log::debug;
use parking_lot::Mutex;

use super::probe::ProbeError;

/// Stamp value meaning "never sampled".
const NEVER: u64 = u64::MAX;

/// The metric a sampler is responsible for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Cpu,
    Ram,
    Disk,
    Temperature,
}

impl MetricKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Cpu => "cpu",
            Self::Ram => "ram",
            Self::Disk => "disk",
            Self::Temperature => "temperature",
        }
    }
}

/// Staleness-gated cache for a single metric.
///
/// The cached value and its stamp are plain atomics, so reading a fresh
/// value takes no lock at all. Re-sampling serializes on `gate`: after
/// acquiring it the staleness condition is checked a second time, so
/// callers racing past the unsynchronized check still produce at most one
/// OS query per interval window.
pub struct Sampler {
    kind: MetricKind,
    /// Bit pattern of the last known `f64` value.
    value: AtomicU64,
    /// Milliseconds since the engine epoch of the last successful sample.
    stamp_ms: AtomicU64,
    /// Current staleness window in milliseconds.
    interval_ms: AtomicU64,
    gate: Mutex<()>,
}

impl Sampler {
    pub fn new(kind: MetricKind, interval: Duration) -> Self {
        Self {
            kind,
            value: AtomicU64::new(0f64.to_bits()),
            stamp_ms: AtomicU64::new(NEVER),
            interval_ms: AtomicU64::new(interval.as_millis() as u64),
            gate: Mutex::new(()),
        }
    }

    /// Last known value, regardless of its age.
    pub fn cached(&self) -> f64 {
        f64::from_bits(self.value.load(Ordering::Acquire))
    }

    pub fn set_interval(&self, interval: Duration) {
        self.interval_ms
            .store(interval.as_millis() as u64, Ordering::Relaxed);
    }

    fn is_fresh(&self, now_ms: u64) -> bool {
        let stamp = self.stamp_ms.load(Ordering::Acquire);
        stamp != NEVER
            && now_ms.saturating_sub(stamp) < self.interval_ms.load(Ordering::Relaxed)
    }

    /// Return the cached value, refreshing it first if the staleness window
    /// has elapsed.
    ///
    /// `sample` performs the actual OS query. A failed query keeps the
    /// previous value and leaves the stamp untouched, so the next caller
    /// retries instead of waiting out a window that never produced data.
    pub fn maybe_resample<F>(&self, now_ms: u64, sample: F) -> f64
    where
        F: FnOnce() -> Result<f64, ProbeError>,
    {
        if self.is_fresh(now_ms) {
            return self.cached();
        }

        let _gate = self.gate.lock();

        // Another caller may have re-sampled while this one waited.
        if self.is_fresh(now_ms) {
            return self.cached();
        }

        match sample() {
            Ok(value) => {
                self.value.store(value.to_bits(), Ordering::Release);
                self.stamp_ms.store(now_ms, Ordering::Release);
                value
            }
            Err(e) => {
                debug!("{} sample failed, keeping last value: {}", self.kind.label(), e);
                self.cached()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;
    use std::thread;

    fn counting_ok(counter: &AtomicUsize, value: f64) -> Result<f64, ProbeError> {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(value)
    }

    #[test]
    fn first_call_always_samples() {
        let sampler = Sampler::new(MetricKind::Cpu, Duration::from_secs(3));
        let calls = AtomicUsize::new(0);

        let value = sampler.maybe_resample(0, || counting_ok(&calls, 42.0));

        assert_eq!(value, 42.0);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn fresh_value_is_reused_without_sampling() {
        let sampler = Sampler::new(MetricKind::Cpu, Duration::from_secs(3));
        let calls = AtomicUsize::new(0);

        sampler.maybe_resample(0, || counting_ok(&calls, 42.0));
        let value = sampler.maybe_resample(2_999, || counting_ok(&calls, 99.0));

        assert_eq!(value, 42.0);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn stale_value_is_refreshed() {
        let sampler = Sampler::new(MetricKind::Ram, Duration::from_secs(5));
        let calls = AtomicUsize::new(0);

        sampler.maybe_resample(0, || counting_ok(&calls, 10.0));
        let value = sampler.maybe_resample(5_000, || counting_ok(&calls, 20.0));

        assert_eq!(value, 20.0);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn failed_sample_keeps_value_and_retries_next_call() {
        let sampler = Sampler::new(MetricKind::Disk, Duration::from_secs(10));
        let calls = AtomicUsize::new(0);

        sampler.maybe_resample(0, || counting_ok(&calls, 55.0));

        // Past the window, but the query fails: the old value survives.
        let value = sampler.maybe_resample(10_000, || {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(ProbeError::SampleFailed("permission denied".into()))
        });
        assert_eq!(value, 55.0);

        // The stamp was not advanced, so the very next call retries.
        let value = sampler.maybe_resample(10_001, || counting_ok(&calls, 60.0));
        assert_eq!(value, 60.0);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn widened_interval_extends_freshness() {
        let sampler = Sampler::new(MetricKind::Cpu, Duration::from_secs(3));
        let calls = AtomicUsize::new(0);

        sampler.maybe_resample(0, || counting_ok(&calls, 30.0));
        sampler.set_interval(Duration::from_secs(10));

        // 5 s in: stale under the old 3 s window, fresh under the new one.
        let value = sampler.maybe_resample(5_000, || counting_ok(&calls, 70.0));
        assert_eq!(value, 30.0);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let value = sampler.maybe_resample(10_000, || counting_ok(&calls, 70.0));
        assert_eq!(value, 70.0);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn concurrent_callers_produce_one_query() {
        let sampler = Arc::new(Sampler::new(MetricKind::Cpu, Duration::from_secs(3)));
        let calls = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let sampler = sampler.clone();
                let calls = calls.clone();
                thread::spawn(move || {
                    sampler.maybe_resample(0, || {
                        calls.fetch_add(1, Ordering::SeqCst);
                        // Hold the gate long enough for every thread to pile up.
                        thread::sleep(Duration::from_millis(50));
                        Ok(64.0)
                    })
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), 64.0);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
