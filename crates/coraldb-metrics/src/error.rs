//! Metrics error types.

use thiserror::Error;

/// Metrics subsystem errors.
#[derive(Debug, Error)]
pub enum Error {
    /// The configured flush interval is zero.
    #[error("flush interval must be non-zero")]
    ZeroFlushInterval,

    /// No tokio runtime is available to drive the flush scheduler.
    #[error("no tokio runtime available for the flush scheduler")]
    NoRuntime,
}
