//! Meters.
//!
//! A meter is the registry owning the named recorders for one client
//! instance. Lookup-or-create is keyed by metric name only: a second
//! lookup with the same name returns the identical recorder even when
//! the tags differ. Callers that need separate streams use distinct
//! names.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::external::ExternalCollector;
use crate::recorder::{AggregatingRecorder, ValueRecorder};
use crate::tag::{format_tags, Tag};

/// One rendered flush report for one recorder.
#[derive(Debug, Clone)]
pub struct MetricReport {
    /// Metric name.
    pub name: String,
    /// Rendered tag set.
    pub tags: String,
    /// Rendered histogram report.
    pub text: String,
}

/// Registry mapping metric names to recorders for one client instance.
pub enum Meter {
    /// Built-in histogram aggregation with periodic local flush.
    Aggregating(AggregatingMeter),
    /// Recorder creation delegated to an external collector.
    External(ExternalMeter),
}

impl Meter {
    /// Create an aggregating meter.
    pub fn aggregating() -> Self {
        Meter::Aggregating(AggregatingMeter::new())
    }

    /// Create a meter backed by an external collector.
    pub fn external(collector: Arc<dyn ExternalCollector>) -> Self {
        Meter::External(ExternalMeter::new(collector))
    }

    /// Look up or create the recorder for `name`.
    ///
    /// Reference-stable: repeated calls with the same name return the
    /// identical `Arc` while the meter is alive.
    pub fn value_recorder(&self, name: &str, tags: &[Tag]) -> Arc<ValueRecorder> {
        match self {
            Meter::Aggregating(meter) => meter.value_recorder(name, tags),
            Meter::External(meter) => meter.value_recorder(name, tags),
        }
    }

    /// Drain flush reports from every aggregating recorder.
    ///
    /// The external path has no flush cycle; an external meter returns
    /// no reports.
    pub fn flush_reports(&self) -> Vec<MetricReport> {
        match self {
            Meter::Aggregating(meter) => meter.flush_reports(),
            Meter::External(_) => Vec::new(),
        }
    }

    /// Number of recorders currently owned by the meter.
    pub fn recorder_count(&self) -> usize {
        match self {
            Meter::Aggregating(meter) => meter.recorder_count(),
            Meter::External(meter) => meter.recorder_count(),
        }
    }
}

impl fmt::Debug for Meter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let variant = match self {
            Meter::Aggregating(_) => "Aggregating",
            Meter::External(_) => "External",
        };
        f.debug_struct("Meter")
            .field("variant", &variant)
            .field("recorders", &self.recorder_count())
            .finish()
    }
}

/// Meter creating histogram-backed recorders locally.
pub struct AggregatingMeter {
    recorders: Mutex<HashMap<String, Arc<ValueRecorder>>>,
}

impl AggregatingMeter {
    /// Create an empty meter.
    pub fn new() -> Self {
        Self {
            recorders: Mutex::new(HashMap::new()),
        }
    }

    /// Look up or create the recorder for `name`.
    pub fn value_recorder(&self, name: &str, tags: &[Tag]) -> Arc<ValueRecorder> {
        let mut recorders = self.recorders.lock();
        if let Some(recorder) = recorders.get(name) {
            return Arc::clone(recorder);
        }
        let recorder = Arc::new(ValueRecorder::Aggregating(AggregatingRecorder::new(
            name,
            tags.to_vec(),
        )));
        recorders.insert(name.to_string(), Arc::clone(&recorder));
        recorder
    }

    /// Render every recorder's report and reset its histogram.
    ///
    /// Each report uses its own buffer. A recorder whose rendering
    /// fails is skipped for this cycle and keeps its data for the next
    /// one.
    pub fn flush_reports(&self) -> Vec<MetricReport> {
        let recorders = self.recorders.lock();
        let mut reports = Vec::with_capacity(recorders.len());
        for recorder in recorders.values() {
            if let ValueRecorder::Aggregating(recorder) = recorder.as_ref() {
                if let Ok(text) = recorder.flush_report() {
                    reports.push(MetricReport {
                        name: recorder.name().to_string(),
                        tags: format_tags(recorder.tags()),
                        text,
                    });
                }
            }
        }
        reports
    }

    /// Number of recorders currently owned.
    pub fn recorder_count(&self) -> usize {
        self.recorders.lock().len()
    }
}

impl Default for AggregatingMeter {
    fn default() -> Self {
        Self::new()
    }
}

/// Meter delegating recorder creation to an external collector.
pub struct ExternalMeter {
    collector: Arc<dyn ExternalCollector>,
    recorders: Mutex<HashMap<String, Arc<ValueRecorder>>>,
}

impl ExternalMeter {
    /// Create a meter backed by `collector`.
    pub fn new(collector: Arc<dyn ExternalCollector>) -> Self {
        Self {
            collector,
            recorders: Mutex::new(HashMap::new()),
        }
    }

    /// Look up or create the recorder for `name`.
    ///
    /// The collector's factory is invoked synchronously, once per
    /// name; later lookups with the same name do not call it again.
    pub fn value_recorder(&self, name: &str, tags: &[Tag]) -> Arc<ValueRecorder> {
        let mut recorders = self.recorders.lock();
        if let Some(recorder) = recorders.get(name) {
            return Arc::clone(recorder);
        }
        let external = self.collector.create_recorder(name, tags);
        let recorder = Arc::new(ValueRecorder::External(external));
        recorders.insert(name.to_string(), Arc::clone(&recorder));
        recorder
    }

    /// Number of recorders currently owned.
    pub fn recorder_count(&self) -> usize {
        self.recorders.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

    use super::*;
    use crate::external::ExternalRecorder;

    #[test]
    fn test_lookup_is_reference_stable() {
        let meter = Meter::aggregating();
        let a = meter.value_recorder("get", &[Tag::new("db.coral.service", "kv")]);
        let b = meter.value_recorder("get", &[Tag::new("db.coral.service", "kv")]);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(meter.recorder_count(), 1);
    }

    #[test]
    fn test_lookup_keyed_by_name_only() {
        // Differing tags on a later lookup are ignored.
        let meter = Meter::aggregating();
        let a = meter.value_recorder("get", &[Tag::new("db.coral.service", "kv")]);
        let b = meter.value_recorder("get", &[Tag::new("db.coral.service", "query")]);
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_distinct_names_distinct_recorders() {
        let meter = Meter::aggregating();
        let a = meter.value_recorder("get", &[]);
        let b = meter.value_recorder("upsert", &[]);
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(meter.recorder_count(), 2);
    }

    #[test]
    fn test_flush_with_zero_recorders() {
        let meter = Meter::aggregating();
        assert!(meter.flush_reports().is_empty());
    }

    #[test]
    fn test_flush_reports_one_per_recorder_and_resets() {
        let meter = Meter::aggregating();
        for name in ["get", "upsert", "query"] {
            meter
                .value_recorder(name, &[Tag::new("db.coral.service", "kv")])
                .record_value(100);
        }

        let reports = meter.flush_reports();
        assert_eq!(reports.len(), 3);
        for report in &reports {
            assert!(report.text.contains("count=1"));
        }

        // Immediately after the flush every histogram shows count 0.
        for name in ["get", "upsert", "query"] {
            let recorder = meter.value_recorder(name, &[]);
            match recorder.as_ref() {
                ValueRecorder::Aggregating(inner) => assert_eq!(inner.histogram().count(), 0),
                ValueRecorder::External(_) => unreachable!(),
            }
        }
    }

    struct CountingRecorder {
        last_value: AtomicU64,
        calls: AtomicUsize,
    }

    impl ExternalRecorder for CountingRecorder {
        fn record_value(&self, value_us: u64) {
            self.last_value.store(value_us, Ordering::SeqCst);
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct CountingCollector {
        created: AtomicUsize,
        recorder: Arc<CountingRecorder>,
    }

    impl ExternalCollector for CountingCollector {
        fn create_recorder(&self, _name: &str, _tags: &[Tag]) -> Arc<dyn ExternalRecorder> {
            self.created.fetch_add(1, Ordering::SeqCst);
            self.recorder.clone()
        }
    }

    #[test]
    fn test_external_meter_creates_once_and_forwards() {
        let recorder = Arc::new(CountingRecorder {
            last_value: AtomicU64::new(0),
            calls: AtomicUsize::new(0),
        });
        let collector = Arc::new(CountingCollector {
            created: AtomicUsize::new(0),
            recorder: recorder.clone(),
        });
        let meter = Meter::external(collector.clone());

        let tags = crate::tag::operation_tags(Some("get"), Some("kv"));
        meter.value_recorder("get", &tags).record_value(120);
        meter.value_recorder("get", &tags);

        assert_eq!(collector.created.load(Ordering::SeqCst), 1);
        assert_eq!(recorder.calls.load(Ordering::SeqCst), 1);
        assert_eq!(recorder.last_value.load(Ordering::SeqCst), 120);
    }

    #[test]
    fn test_external_meter_has_no_flush_cycle() {
        let recorder = Arc::new(CountingRecorder {
            last_value: AtomicU64::new(0),
            calls: AtomicUsize::new(0),
        });
        let collector = Arc::new(CountingCollector {
            created: AtomicUsize::new(0),
            recorder,
        });
        let meter = Meter::external(collector);
        meter.value_recorder("get", &[]).record_value(5);
        assert!(meter.flush_reports().is_empty());
    }
}
