//! Core model unit tests.

/// Branch classification and stack pointer folding.
pub mod branch;

/// Pipeline behaviour driven through whole cycles.
pub mod pipeline;

/// Branch predictor, target buffer and DIB.
pub mod units;
