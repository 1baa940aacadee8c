//! Global Model Constants.
//!
//! This module defines model-wide constants used across the core. It includes:
//! 1. **Register Constants:** Architectural register ids with special meaning for branch classification.
//! 2. **Operand Limits:** Maximum register and memory operands carried by one trace record.
//! 3. **Simulation Constants:** Default deadlock threshold and cache block size.

/// Architectural register id of the stack pointer.
pub const REG_STACK_POINTER: u8 = 6;

/// Architectural register id of the flags register.
pub const REG_FLAGS: u8 = 25;

/// Architectural register id of the instruction pointer.
pub const REG_INSTRUCTION_POINTER: u8 = 26;

/// Number of distinct architectural register ids (ids are `u8`).
pub const NUM_REGISTER_IDS: usize = 256;

/// Maximum destination registers per instruction.
pub const NUM_INSTR_DESTINATIONS: usize = 2;

/// Maximum source registers per instruction.
pub const NUM_INSTR_SOURCES: usize = 4;

/// Maximum destination (store) memory operands per instruction.
pub const NUM_INSTR_DESTINATION_MEMORY: usize = 2;

/// Maximum source (load) memory operands per instruction.
pub const NUM_INSTR_SOURCE_MEMORY: usize = 4;

/// Default number of cycles a buffer head may sit still before the core is
/// declared deadlocked.
pub const DEADLOCK_CYCLE: u64 = 1_000_000;

/// Default log2 of the cache block size in bytes (64-byte blocks).
pub const LOG2_BLOCK_SIZE: u32 = 6;
