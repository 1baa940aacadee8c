//! Front-end units consulted by the core.
//!
//! This module contains the structures the core queries while initializing and
//! fetching instructions: the branch prediction unit, the decoded instruction
//! buffer, and the code prefetcher interface.

/// Branch direction predictor and target buffer.
pub mod bru;

/// Decoded Instruction Buffer.
pub mod dib;

/// Code prefetcher interface.
pub mod prefetch;
