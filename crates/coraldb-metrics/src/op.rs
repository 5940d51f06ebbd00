//! Per-instance operation metrics handle.
//!
//! `OpMetrics` is what a client instance owns: the single meter, the
//! runtime control flags, and (for the aggregating path) the flush
//! task. The recording helpers are the well-defined completion points
//! the client loop calls into with a start time and an operation or
//! service label.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Notify;

use crate::config::MetricsConfig;
use crate::control::MetricsControl;
use crate::error::Error;
use crate::flush;
use crate::meter::Meter;
use crate::tag::operation_tags;

/// Key-value store mutation kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOperation {
    /// Insert a new document.
    Insert,
    /// Replace an existing document.
    Replace,
    /// Append to an existing value.
    Append,
    /// Prepend to an existing value.
    Prepend,
    /// Insert or replace.
    Upsert,
}

impl StoreOperation {
    /// Operation name used as the metric name and `db.operation` tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreOperation::Insert => "insert",
            StoreOperation::Replace => "replace",
            StoreOperation::Append => "append",
            StoreOperation::Prepend => "prepend",
            StoreOperation::Upsert => "upsert",
        }
    }
}

/// Services a client operation can be issued against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    /// Key-value service.
    Kv,
    /// Query service.
    Query,
    /// Search service.
    Search,
    /// Analytics service.
    Analytics,
    /// Views service.
    Views,
    /// Management endpoints.
    Management,
}

impl Service {
    /// Service name used in the `db.coral.service` tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Service::Kv => "kv",
            Service::Query => "query",
            Service::Search => "search",
            Service::Analytics => "analytics",
            Service::Views => "views",
            Service::Management => "management",
        }
    }
}

/// Operation metrics handle for one client instance.
///
/// Dropping the handle cancels the pending flush and releases the
/// meter together with every recorder it owns; nothing is rendered on
/// the way out.
pub struct OpMetrics {
    meter: Arc<Meter>,
    control: Arc<MetricsControl>,
    shutdown: Arc<Notify>,
}

impl OpMetrics {
    /// Build the subsystem from `config`.
    ///
    /// With an external collector the meter delegates recorder
    /// creation to it and no flush task is spawned. Without one, an
    /// aggregating meter is created and the flush task is spawned on
    /// the current tokio runtime ([`Error::NoRuntime`] when called
    /// outside of one).
    pub fn new(config: MetricsConfig) -> Result<Self, Error> {
        if config.flush_interval.is_zero() {
            return Err(Error::ZeroFlushInterval);
        }

        let control = Arc::new(MetricsControl::new(config.enabled, config.flush_interval));
        let shutdown = Arc::new(Notify::new());

        let meter = match config.collector {
            Some(collector) => Arc::new(Meter::external(collector)),
            None => {
                let handle =
                    tokio::runtime::Handle::try_current().map_err(|_| Error::NoRuntime)?;
                let meter = Arc::new(Meter::aggregating());
                flush::spawn_flush_task(
                    &handle,
                    Arc::clone(&meter),
                    Arc::clone(&control),
                    Arc::clone(&shutdown),
                );
                meter
            }
        };

        Ok(Self {
            meter,
            control,
            shutdown,
        })
    }

    /// Runtime control surface (enable flag, flush interval).
    pub fn control(&self) -> &Arc<MetricsControl> {
        &self.control
    }

    /// The meter owned by this handle.
    pub fn meter(&self) -> &Arc<Meter> {
        &self.meter
    }

    /// Record the latency of a completed key-value operation.
    ///
    /// The metric name is the operation name; the tag set carries the
    /// `kv` service and the operation.
    pub fn record_kv_op(&self, op: &str, start: Instant) {
        self.record_latency(op, Some(op), Service::Kv, start);
    }

    /// Record the latency of a completed store mutation.
    pub fn record_store_op(&self, op: StoreOperation, start: Instant) {
        self.record_kv_op(op.as_str(), start);
    }

    /// Record the latency of a completed HTTP-based service request.
    ///
    /// The metric name is the service name; the operation tag is
    /// attached when known.
    pub fn record_http_op(&self, service: Service, op: Option<&str>, start: Instant) {
        self.record_latency(service.as_str(), op, service, start);
    }

    fn record_latency(&self, name: &str, op: Option<&str>, service: Service, start: Instant) {
        if !self.control.enabled() {
            return;
        }
        let tags = operation_tags(op, Some(service.as_str()));
        self.meter
            .value_recorder(name, &tags)
            .record_value(elapsed_micros(start));
    }
}

impl Drop for OpMetrics {
    fn drop(&mut self) {
        // Cancels the pending flush; notify_one leaves a permit in
        // case the task is mid-flush rather than waiting.
        self.shutdown.notify_one();
    }
}

impl fmt::Debug for OpMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpMetrics")
            .field("meter", &self.meter)
            .field("enabled", &self.control.enabled())
            .finish()
    }
}

/// Elapsed wall-clock time since `start`, in microseconds.
///
/// The internal clock is finer-grained; the conversion happens here,
/// before any recorder boundary is crossed.
fn elapsed_micros(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_micros()).unwrap_or(u64::MAX)
}
