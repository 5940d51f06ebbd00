//! CoralDB Metrics - Operation latency metrics for the CoralDB client.
//!
//! This crate measures the wall-clock latency of individual client
//! operations (key-value gets and stores, queries, HTTP-based services)
//! and routes the measurements either into a built-in aggregating
//! histogram or into a caller-supplied external collector.
//!
//! # Quick Start
//!
//! ```ignore
//! use std::time::Instant;
//! use coraldb_metrics::{MetricsConfig, OpMetrics};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let metrics = OpMetrics::new(
//!         MetricsConfig::new()
//!             .with_enabled(true)
//!             .with_flush_interval(std::time::Duration::from_secs(10)),
//!     )?;
//!
//!     // At an operation completion point:
//!     let start = Instant::now();
//!     // ... issue the operation, wait for the response ...
//!     metrics.record_kv_op("get", start);
//!
//!     // Aggregated histograms are emitted to the `op_metrics` log
//!     // target every flush interval.
//!     Ok(())
//! }
//! ```
//!
//! To route measurements into an external collector instead, supply an
//! [`ExternalCollector`] via [`MetricsConfig::with_collector`]. The
//! external path has no flush cycle; the collector owns its own
//! emission policy.

pub mod config;
pub mod control;
pub mod error;
pub mod external;
pub mod flush;
pub mod histogram;
pub mod meter;
pub mod op;
pub mod recorder;
pub mod tag;

pub use config::MetricsConfig;
pub use control::{MetricsControl, DEFAULT_FLUSH_INTERVAL};
pub use error::Error;
pub use external::{ExternalCollector, ExternalRecorder};
pub use histogram::Histogram;
pub use meter::{AggregatingMeter, ExternalMeter, Meter, MetricReport};
pub use op::{OpMetrics, Service, StoreOperation};
pub use recorder::{AggregatingRecorder, ValueRecorder, METER_NAME};
pub use tag::{Tag, OPERATION_TAG_KEY, SERVICE_TAG_KEY};
