//! Simulation driver and instruction sources.
//!
//! Provides the trace readers that feed a core and the simulator that runs a
//! core through its warmup and measured phases.

/// Core plus instruction source, phase control.
pub mod simulator;

/// Instruction sources (JSON-lines traces, in-memory records).
pub mod trace;

pub use simulator::Simulator;
pub use trace::{InstructionSource, JsonLinesTrace, VecSource};
