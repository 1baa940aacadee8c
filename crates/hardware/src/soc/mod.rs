//! Memory-side components.
//!
//! This module organizes what sits between a core and its memory hierarchy:
//! the per-core request buses, the lower-level interface they talk to, and a
//! reference fixed-latency level.

/// Core-side request buses and memory packets.
pub mod bus;

/// Reference fixed-latency memory level.
pub mod memory;

/// Lower memory level trait.
pub mod traits;

pub use bus::{CacheBus, MemPacket};
pub use memory::FixedLatencyMemory;
pub use traits::LowerLevel;
