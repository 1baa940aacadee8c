//! Out-of-order core model.
//!
//! This module contains the cycle-driven core and everything it owns: the
//! instruction record, branch classification, the pipeline buffers and queues,
//! the front-end units, and the deadlock watchdog.

/// Branch classification from register usage.
pub mod branch;

/// The core structure and its per-cycle driver.
pub mod cpu;

/// In-flight instruction records and trace records.
pub mod instruction;

/// Instruction window, producer map, load/store queues and stages.
pub mod pipeline;

/// Front-end units (branch prediction, DIB, code prefetch).
pub mod units;

/// Deadlock reports and heartbeat sampling.
pub mod watchdog;

pub use self::cpu::{CoreParts, O3Core};
