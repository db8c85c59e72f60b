//! Telemetry for the PIM scheduler
//!
//! Structured logging on top of `tracing`. The scheduler core only emits
//! events; this crate decides where they go and how they look.

pub mod logging;

pub use logging::{init_logging, LogConfig, LogFormat, LogLevel, LogOutput};

use thiserror::Error;

/// Telemetry error types
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Subscriber initialization failed
    #[error("Initialization error: {0}")]
    Init(String),

    /// Logging configuration error
    #[error("Logging error: {0}")]
    Logging(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for telemetry operations
pub type Result<T> = std::result::Result<T, TelemetryError>;
