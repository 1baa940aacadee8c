//! Common utilities and types used throughout the core model.
//!
//! This module provides fundamental building blocks shared by all components:
//! 1. **Constants:** Special register ids, operand limits and the deadlock threshold.
//! 2. **Error Handling:** The deadlock fault plus configuration and trace errors.

/// Common constants used throughout the model.
pub mod constants;

/// Error types.
pub mod error;

pub use constants::{DEADLOCK_CYCLE, LOG2_BLOCK_SIZE};
pub use error::{ConfigError, SimError, SimResult, TraceError};
