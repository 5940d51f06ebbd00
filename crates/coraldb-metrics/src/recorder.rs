//! Value recorders.
//!
//! A recorder is the sink for one named, tagged metric stream. The
//! aggregating variant owns a histogram; the external variant is a
//! stateless proxy forwarding to the host-supplied recorder.

use std::fmt::{self, Write};
use std::sync::Arc;

use crate::external::ExternalRecorder;
use crate::histogram::Histogram;
use crate::tag::Tag;

/// Name under which aggregated reports are emitted.
pub const METER_NAME: &str = "com.coraldb.client.rs";

/// Polymorphic sink for a single metric stream.
pub enum ValueRecorder {
    /// Histogram-backed recorder with periodic local flush.
    Aggregating(AggregatingRecorder),
    /// Proxy delegating to a host-supplied recorder.
    External(Arc<dyn ExternalRecorder>),
}

impl ValueRecorder {
    /// Record one latency value, in microseconds.
    pub fn record_value(&self, value_us: u64) {
        match self {
            ValueRecorder::Aggregating(recorder) => recorder.record_value(value_us),
            ValueRecorder::External(recorder) => recorder.record_value(value_us),
        }
    }
}

impl fmt::Debug for ValueRecorder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueRecorder::Aggregating(recorder) => f
                .debug_tuple("Aggregating")
                .field(&recorder.name())
                .finish(),
            ValueRecorder::External(_) => f.write_str("External"),
        }
    }
}

/// Histogram-backed recorder for one metric stream.
pub struct AggregatingRecorder {
    name: String,
    tags: Vec<Tag>,
    histogram: Histogram,
}

impl AggregatingRecorder {
    /// Create a recorder for `name` and `tags`.
    pub fn new(name: impl Into<String>, tags: Vec<Tag>) -> Self {
        Self {
            name: name.into(),
            tags,
            histogram: Histogram::latency(),
        }
    }

    /// Metric name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Tag set captured at creation time.
    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    /// The owned histogram.
    pub fn histogram(&self) -> &Histogram {
        &self.histogram
    }

    /// Record one latency value, in microseconds.
    pub fn record_value(&self, value_us: u64) {
        self.histogram.record(value_us);
    }

    /// Render this recorder's flush report and reset the histogram.
    ///
    /// When rendering fails the reset is skipped too, so the data is
    /// picked up by the next flush cycle.
    pub fn flush_report(&self) -> Result<String, fmt::Error> {
        let mut text = String::new();
        write!(&mut text, "{METER_NAME}, tags: {{")?;
        for tag in &self.tags {
            write!(&mut text, " {tag} ")?;
        }
        writeln!(&mut text, "}}")?;
        self.histogram.render(&mut text)?;
        self.histogram.reset();
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregating_records_into_histogram() {
        let recorder = AggregatingRecorder::new("get", vec![Tag::new("db.coral.service", "kv")]);
        recorder.record_value(120);
        recorder.record_value(350);

        assert_eq!(recorder.histogram().count(), 2);
        assert_eq!(recorder.histogram().max(), 350);
    }

    #[test]
    fn test_flush_report_resets() {
        let recorder = AggregatingRecorder::new(
            "get",
            vec![
                Tag::new("db.coral.service", "kv"),
                Tag::new("db.operation", "get"),
            ],
        );
        recorder.record_value(120);

        let report = recorder.flush_report().unwrap();
        assert!(report.starts_with(
            "com.coraldb.client.rs, tags: { db.coral.service=kv  db.operation=get }\n"
        ));
        assert!(report.contains("count=1"));

        // The flushed window is disjoint from the next one.
        assert_eq!(recorder.histogram().count(), 0);
    }

    #[test]
    fn test_enum_dispatch() {
        let recorder = ValueRecorder::Aggregating(AggregatingRecorder::new("get", Vec::new()));
        recorder.record_value(77);
        match &recorder {
            ValueRecorder::Aggregating(inner) => assert_eq!(inner.histogram().count(), 1),
            ValueRecorder::External(_) => unreachable!(),
        }
    }
}
