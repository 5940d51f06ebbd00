//! Bucketed latency histogram.
//!
//! Fixed exponential-flavored bucket boundaries tuned for operation
//! latencies, with lock-free recording via atomic counters.

use std::fmt::{self, Write};
use std::sync::atomic::{AtomicU64, Ordering};

/// Default bucket boundaries in microseconds.
const LATENCY_BUCKETS_US: [u64; 14] = [
    100,       // 100 microseconds
    250,
    500,
    1_000,     // 1 millisecond
    2_500,
    5_000,
    10_000,    // 10 milliseconds
    25_000,
    50_000,
    100_000,   // 100 milliseconds
    250_000,
    500_000,
    1_000_000, // 1 second
    5_000_000, // 5 seconds
];

/// Bucketed histogram for latency measurements in microseconds.
///
/// All operations are total functions: recording never fails, values
/// beyond the last boundary are clamped into the last bucket, and
/// rendering never mutates counts.
pub struct Histogram {
    /// Upper bucket boundaries, monotonically increasing.
    buckets: Vec<u64>,
    /// Per-bucket counts.
    counts: Vec<AtomicU64>,
    sum: AtomicU64,
    count: AtomicU64,
    min: AtomicU64,
    max: AtomicU64,
}

impl Histogram {
    /// Create a histogram with the default latency buckets.
    pub fn latency() -> Self {
        Self::with_buckets(LATENCY_BUCKETS_US.to_vec())
    }

    /// Create a histogram with custom bucket boundaries.
    ///
    /// Boundaries must be monotonically increasing.
    pub fn with_buckets(buckets: Vec<u64>) -> Self {
        let counts = buckets.iter().map(|_| AtomicU64::new(0)).collect();
        Self {
            buckets,
            counts,
            sum: AtomicU64::new(0),
            count: AtomicU64::new(0),
            min: AtomicU64::new(u64::MAX),
            max: AtomicU64::new(0),
        }
    }

    /// Record a latency value in microseconds.
    pub fn record(&self, value_us: u64) {
        self.sum.fetch_add(value_us, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);

        let mut current_min = self.min.load(Ordering::Relaxed);
        while value_us < current_min {
            match self.min.compare_exchange_weak(
                current_min,
                value_us,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(actual) => current_min = actual,
            }
        }

        let mut current_max = self.max.load(Ordering::Relaxed);
        while value_us > current_max {
            match self.max.compare_exchange_weak(
                current_max,
                value_us,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(actual) => current_max = actual,
            }
        }

        for (i, &boundary) in self.buckets.iter().enumerate() {
            if value_us <= boundary {
                self.counts[i].fetch_add(1, Ordering::Relaxed);
                return;
            }
        }
        // Value exceeds every boundary; clamp into the last bucket.
        if let Some(last) = self.counts.last() {
            last.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Total count of recordings since the last reset.
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    /// Sum of all recorded values.
    pub fn sum(&self) -> u64 {
        self.sum.load(Ordering::Relaxed)
    }

    /// Smallest recorded value, or 0 when empty.
    pub fn min(&self) -> u64 {
        let min = self.min.load(Ordering::Relaxed);
        if min == u64::MAX {
            0
        } else {
            min
        }
    }

    /// Largest recorded value.
    pub fn max(&self) -> u64 {
        self.max.load(Ordering::Relaxed)
    }

    /// Approximate mean value, or 0 when empty.
    pub fn mean(&self) -> u64 {
        let count = self.count.load(Ordering::Relaxed);
        if count == 0 {
            return 0;
        }
        self.sum.load(Ordering::Relaxed) / count
    }

    /// Approximate percentile (e.g., 0.50 for P50, 0.99 for P99).
    ///
    /// Returns the upper boundary of the bucket containing the target
    /// percentile.
    pub fn percentile(&self, p: f64) -> u64 {
        let total = self.count.load(Ordering::Relaxed);
        if total == 0 {
            return 0;
        }

        let target = (total as f64 * p).ceil() as u64;
        let mut cumulative = 0u64;

        for (i, count) in self.counts.iter().enumerate() {
            cumulative += count.load(Ordering::Relaxed);
            if cumulative >= target {
                return self.buckets[i];
            }
        }

        *self.buckets.last().unwrap_or(&0)
    }

    /// P50 (median) latency.
    pub fn p50(&self) -> u64 {
        self.percentile(0.50)
    }

    /// P99 latency.
    pub fn p99(&self) -> u64 {
        self.percentile(0.99)
    }

    /// Reset all counters to zero.
    ///
    /// The periodic flush calls this after rendering so each report
    /// covers a disjoint window.
    pub fn reset(&self) {
        self.sum.store(0, Ordering::Relaxed);
        self.count.store(0, Ordering::Relaxed);
        self.min.store(u64::MAX, Ordering::Relaxed);
        self.max.store(0, Ordering::Relaxed);
        for count in &self.counts {
            count.store(0, Ordering::Relaxed);
        }
    }

    /// Snapshot of (boundary, count) pairs.
    pub fn snapshot(&self) -> Vec<(u64, u64)> {
        self.buckets
            .iter()
            .zip(self.counts.iter())
            .map(|(&boundary, count)| (boundary, count.load(Ordering::Relaxed)))
            .collect()
    }

    /// Write bucket ranges, counts and derived statistics to a sink.
    ///
    /// Does not alter counts. The flush path treats a write failure as
    /// a skipped report for the cycle, so errors propagate.
    pub fn render<W: Write>(&self, out: &mut W) -> fmt::Result {
        writeln!(
            out,
            "count={} min={}us max={}us mean={}us p50<={}us p99<={}us",
            self.count(),
            self.min(),
            self.max(),
            self.mean(),
            self.p50(),
            self.p99(),
        )?;

        let snapshot = self.snapshot();
        let last = snapshot.len().saturating_sub(1);
        let mut lower = 0u64;
        for (i, (boundary, count)) in snapshot.iter().enumerate() {
            if *count > 0 {
                if i == last {
                    // The last bucket also holds clamped overflow.
                    writeln!(out, "  {lower:>9}us..          : {count}")?;
                } else {
                    writeln!(out, "  {:>9}us..{:>9}us: {}", lower, boundary, count)?;
                }
            }
            lower = *boundary;
        }
        Ok(())
    }
}

impl Default for Histogram {
    fn default() -> Self {
        Self::latency()
    }
}

impl fmt::Debug for Histogram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Histogram")
            .field("count", &self.count())
            .field("min", &self.min())
            .field("max", &self.max())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_counts() {
        let hist = Histogram::latency();
        hist.record(50);
        hist.record(200);
        hist.record(1500);

        assert_eq!(hist.count(), 3);
        assert_eq!(hist.sum(), 50 + 200 + 1500);
    }

    #[test]
    fn test_count_tracks_recordings() {
        let hist = Histogram::latency();
        for _ in 0..1000 {
            hist.record(42);
        }
        assert_eq!(hist.count(), 1000);
    }

    #[test]
    fn test_min_max_mean() {
        let hist = Histogram::latency();
        hist.record(100);
        hist.record(5000);
        hist.record(300);

        assert_eq!(hist.min(), 100);
        assert_eq!(hist.max(), 5000);
        assert_eq!(hist.mean(), 1800);
    }

    #[test]
    fn test_overflow_clamps_into_last_bucket() {
        let hist = Histogram::with_buckets(vec![10, 100]);
        hist.record(u64::MAX);

        let snapshot = hist.snapshot();
        assert_eq!(snapshot, vec![(10, 0), (100, 1)]);
        assert_eq!(hist.count(), 1);
    }

    #[test]
    fn test_empty_histogram() {
        let hist = Histogram::latency();
        assert_eq!(hist.count(), 0);
        assert_eq!(hist.min(), 0);
        assert_eq!(hist.max(), 0);
        assert_eq!(hist.mean(), 0);
        assert_eq!(hist.p50(), 0);
        assert_eq!(hist.p99(), 0);
    }

    #[test]
    fn test_percentile() {
        let hist = Histogram::latency();
        for _ in 0..100 {
            hist.record(50);
        }
        assert_eq!(hist.p50(), 100);
        assert_eq!(hist.p99(), 100);

        for _ in 0..100 {
            hist.record(800);
        }
        assert_eq!(hist.p50(), 100);
        assert_eq!(hist.p99(), 1_000);
    }

    #[test]
    fn test_reset_then_single_record() {
        let hist = Histogram::latency();
        hist.record(1000);
        hist.record(2000);
        hist.reset();

        assert_eq!(hist.count(), 0);

        hist.record(42);
        assert_eq!(hist.count(), 1);
        assert_eq!(hist.min(), 42);
        assert_eq!(hist.max(), 42);
        assert_eq!(hist.sum(), 42);
    }

    #[test]
    fn test_render_does_not_mutate() {
        let hist = Histogram::latency();
        hist.record(50);
        hist.record(200_000);

        let mut out = String::new();
        hist.render(&mut out).unwrap();
        hist.render(&mut String::new()).unwrap();

        assert_eq!(hist.count(), 2);
        assert!(out.starts_with("count=2 min=50us max=200000us"));
        // Two populated buckets, one line each, plus the header.
        assert_eq!(out.lines().count(), 3);
    }

    #[test]
    fn test_render_empty() {
        let hist = Histogram::latency();
        let mut out = String::new();
        hist.render(&mut out).unwrap();
        assert_eq!(out.lines().count(), 1);
    }
}
