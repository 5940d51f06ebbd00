//! Runtime control surface.
//!
//! The enable flag and the flush interval are settable by the owning
//! client instance at any time; the recording call sites observe the
//! flag immediately and the next scheduled flush observes a changed
//! interval.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

/// Default flush interval for aggregated metrics.
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(600);

/// Shared runtime flags for operation metrics.
#[derive(Debug)]
pub struct MetricsControl {
    enabled: AtomicBool,
    flush_interval_us: AtomicU64,
}

impl MetricsControl {
    /// Create a control with the given initial settings.
    pub fn new(enabled: bool, flush_interval: Duration) -> Self {
        Self {
            enabled: AtomicBool::new(enabled),
            flush_interval_us: AtomicU64::new(interval_micros(flush_interval)),
        }
    }

    /// Whether operation metrics collection is enabled.
    pub fn enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Enable or disable operation metrics collection.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    /// Current flush interval.
    pub fn flush_interval(&self) -> Duration {
        Duration::from_micros(self.flush_interval_us.load(Ordering::Relaxed))
    }

    /// Change the flush interval.
    ///
    /// Takes effect when the scheduler next re-arms. A zero interval
    /// is ignored.
    pub fn set_flush_interval(&self, interval: Duration) {
        if interval.is_zero() {
            tracing::debug!(target: "op_metrics", "ignoring zero flush interval");
            return;
        }
        self.flush_interval_us
            .store(interval_micros(interval), Ordering::Relaxed);
    }
}

impl Default for MetricsControl {
    fn default() -> Self {
        Self::new(false, DEFAULT_FLUSH_INTERVAL)
    }
}

fn interval_micros(interval: Duration) -> u64 {
    u64::try_from(interval.as_micros()).unwrap_or(u64::MAX)
}
