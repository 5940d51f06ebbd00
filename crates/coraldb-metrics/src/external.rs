//! External collector contract.
//!
//! An external metrics backend (an OpenTelemetry exporter, a StatsD
//! bridge, a host process across the FFI boundary) is modeled only
//! through these two traits. The client never learns its identity and
//! never inspects what it does with the values.

use std::sync::Arc;

use crate::tag::Tag;

/// Sink accepting latency values for one named, tagged metric stream.
///
/// Values are microseconds by convention at this boundary; the
/// recording call site converts from the internal clock before calling.
/// There is no error signaling path: a failing implementation is the
/// host's responsibility, not the client's.
pub trait ExternalRecorder: Send + Sync {
    /// Record one latency value, in microseconds.
    fn record_value(&self, value_us: u64);
}

/// Factory binding a recorder to a metric name and tag set.
pub trait ExternalCollector: Send + Sync {
    /// Create a recorder for `name` and `tags`.
    ///
    /// Called synchronously from recorder lookup, at most once per
    /// name while the owning meter is alive. The tag slice is
    /// transient and must not be retained beyond the call.
    fn create_recorder(&self, name: &str, tags: &[Tag]) -> Arc<dyn ExternalRecorder>;
}
