//! Error definitions.
//!
//! This module defines the error types surfaced by the model. It provides:
//! 1. **Simulation Errors:** The fatal per-core deadlock fault and wrapped configuration/trace failures.
//! 2. **Configuration Errors:** Parse, I/O and validation failures while loading a `Config`.
//! 3. **Trace Errors:** I/O and per-line parse failures while reading an instruction trace.
//!
//! Interface rejections (a cache refusing a request) are ordinary backpressure and
//! never appear here.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::core::watchdog::DeadlockReport;

/// Top-level error type for the model.
#[derive(Debug, Error)]
pub enum SimError {
    /// A pipeline buffer head has not advanced for the deadlock threshold.
    ///
    /// This is unrecoverable: it means capacity or dependency accounting is broken.
    #[error("{0}")]
    Deadlock(Box<DeadlockReport>),

    /// The configuration could not be loaded or is inconsistent.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The instruction trace could not be read.
    #[error("trace error: {0}")]
    Trace(#[from] TraceError),
}

impl SimError {
    /// Returns the deadlock report if this error is a deadlock fault.
    pub fn as_deadlock(&self) -> Option<&DeadlockReport> {
        match self {
            Self::Deadlock(report) => Some(report),
            _ => None,
        }
    }
}

impl From<DeadlockReport> for SimError {
    fn from(report: DeadlockReport) -> Self {
        Self::Deadlock(Box::new(report))
    }
}

/// Errors raised while loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read '{path}': {source}")]
    Io {
        /// Path of the configuration file.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },

    /// The configuration text is not valid JSON for `Config`.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// A field holds a value the core cannot run with.
    #[error("invalid value for `{field}`: {reason}")]
    Invalid {
        /// Dotted path of the offending field.
        field: &'static str,
        /// Why the value was rejected.
        reason: &'static str,
    },
}

/// Errors raised while reading an instruction trace.
#[derive(Debug, Error)]
pub enum TraceError {
    /// The trace file could not be opened or read.
    #[error("failed to read trace: {0}")]
    Io(#[from] io::Error),

    /// A trace line is not a valid record.
    #[error("malformed trace record on line {line}: {source}")]
    Parse {
        /// One-based line number.
        line: usize,
        /// Underlying JSON failure.
        #[source]
        source: serde_json::Error,
    },
}

/// Result alias for fallible model operations.
pub type SimResult<T> = Result<T, SimError>;
