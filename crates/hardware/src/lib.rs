//! Out-of-order core timing model library.
//!
//! This crate implements a cycle-driven model of a superscalar out-of-order core with the following:
//! 1. **Core:** Fetch, decode, dispatch, schedule, execute, memory and retire stages over an
//!    id-indexed instruction window, with in-order retirement.
//! 2. **Memory Interface:** Per-core instruction and data cache buses in front of any `LowerLevel`.
//! 3. **Front End:** Branch classification, bimodal prediction, a BTB with return stack, and a DIB.
//! 4. **Simulation:** Trace readers, warmup and measured phases, and statistics reporting.

/// Common constants and error types.
pub mod common;
/// Model configuration (defaults, JSON loading, validation).
pub mod config;
/// The out-of-order core (instruction records, pipeline, units, watchdog).
pub mod core;
/// Trace sources and the simulator driver.
pub mod sim;
/// Memory-side components (buses, lower-level trait, fixed-latency memory).
pub mod soc;
/// Statistics collection and reporting.
pub mod stats;

/// Root configuration type; use `Config::default()` or load from JSON.
pub use crate::config::Config;
/// The core model.
pub use crate::core::O3Core;
/// Single-core simulator driven by an instruction source.
pub use crate::sim::Simulator;
