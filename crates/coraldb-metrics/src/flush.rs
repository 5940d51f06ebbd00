//! Periodic flush scheduler.
//!
//! A tokio task bound to the aggregating meter: sleep for the current
//! interval, drain every recorder's report, emit one structured log
//! record per recorder on the `op_metrics` target, re-arm. The
//! interval is re-read from the control before each arm, so a runtime
//! change takes effect at the next cycle. Re-arming only after the
//! previous flush completes prevents overlap.

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use crate::control::MetricsControl;
use crate::meter::Meter;

/// Spawn the flush task on `handle`.
///
/// The task ends when `shutdown` is notified; the owning handle does
/// so on drop, which cancels the pending flush.
pub(crate) fn spawn_flush_task(
    handle: &Handle,
    meter: Arc<Meter>,
    control: Arc<MetricsControl>,
    shutdown: Arc<Notify>,
) -> JoinHandle<()> {
    handle.spawn(async move {
        loop {
            let interval = control.flush_interval();
            tokio::select! {
                _ = shutdown.notified() => break,
                _ = tokio::time::sleep(interval) => {}
            }
            flush_once(&meter);
        }
        tracing::debug!(target: "op_metrics", "flush task stopped");
    })
}

/// Drain and emit all pending reports from `meter`.
pub fn flush_once(meter: &Meter) {
    for report in meter.flush_reports() {
        tracing::info!(
            target: "op_metrics",
            metric = %report.name,
            tags = %report.tags,
            "{}",
            report.text,
        );
    }
}
