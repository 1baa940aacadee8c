//! Instruction pipeline implementation.
//!
//! This module contains the out-of-order pipeline state and its stages.
//! It includes the following components:
//! 1. **Window:** The id-indexed store of every in-flight instruction.
//! 2. **Producers:** The register producer map used to build dependency edges.
//! 3. **LSQ:** Load and store queues with store-to-load forwarding.
//! 4. **Stages:** One free function per pipeline stage.

/// Load and store queues.
pub mod lsq;

/// Register producer map.
pub mod producers;

/// Pipeline stage implementations.
pub mod stages;

/// In-flight instruction window.
pub mod window;
