//! Lower memory level interface.
//!
//! This module defines the `LowerLevel` trait implemented by whatever sits below
//! the core's instruction and data buses. It provides:
//! 1. **Admission:** `add_rq` / `add_wq` accept or reject a request immediately.
//! 2. **Throughput:** `max_read`, the reads the level can take per cycle.
//! 3. **Progress:** `operate`, called once per cycle, which hands completed reads back.
//!
//! Rejection is backpressure: the core keeps the request and tries again on a
//! later cycle. Implementors must be `Send` so a whole simulator can move between threads.

use std::collections::VecDeque;

use crate::soc::bus::MemPacket;

/// A memory level reachable from a core bus.
pub trait LowerLevel: Send {
    /// Reads this level accepts per cycle.
    ///
    /// The core also uses this as the number of instruction-fetch requests it
    /// attempts per cycle and the number of data responses it drains per cycle.
    fn max_read(&self) -> usize;

    /// Offers a read request.
    ///
    /// # Arguments
    ///
    /// * `packet` - The request; its `instr_depend_on_me` list travels back with the response.
    ///
    /// # Returns
    ///
    /// `true` if the request was accepted.
    fn add_rq(&mut self, packet: MemPacket) -> bool;

    /// Offers a write request.
    ///
    /// # Returns
    ///
    /// `true` if the request was accepted.
    fn add_wq(&mut self, packet: MemPacket) -> bool;

    /// Advances the level to `cycle`, appending finished reads to `returned`.
    ///
    /// # Arguments
    ///
    /// * `cycle` - The core cycle being simulated.
    /// * `returned` - The bus's processed queue.
    fn operate(&mut self, cycle: u64, returned: &mut VecDeque<MemPacket>);
}
