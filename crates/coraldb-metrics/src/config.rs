//! Metrics configuration.
//!
//! Construction-time configuration for one client instance. There is
//! no global meter or provider: the configuration is passed into the
//! instance explicitly and validated into an [`OpMetrics`] handle.
//!
//! [`OpMetrics`]: crate::op::OpMetrics

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::control::DEFAULT_FLUSH_INTERVAL;
use crate::external::ExternalCollector;

/// Operation metrics configuration.
#[derive(Clone)]
pub struct MetricsConfig {
    /// Whether collection starts enabled. Can be toggled at runtime
    /// through the control surface.
    pub enabled: bool,

    /// Flush interval for the aggregating meter. Ignored when an
    /// external collector is supplied.
    pub flush_interval: Duration,

    /// External collector; when present, recorder creation is
    /// delegated to it and no flush task runs.
    pub collector: Option<Arc<dyn ExternalCollector>>,
}

impl MetricsConfig {
    /// Create a configuration with collection disabled and the
    /// default flush interval.
    pub fn new() -> Self {
        Self {
            enabled: false,
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            collector: None,
        }
    }

    /// Set whether collection starts enabled.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Set the flush interval.
    pub fn with_flush_interval(mut self, interval: Duration) -> Self {
        self.flush_interval = interval;
        self
    }

    /// Route measurements into an external collector.
    pub fn with_collector(mut self, collector: Arc<dyn ExternalCollector>) -> Self {
        self.collector = Some(collector);
        self
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MetricsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetricsConfig")
            .field("enabled", &self.enabled)
            .field("flush_interval", &self.flush_interval)
            .field("external", &self.collector.is_some())
            .finish()
    }
}
