//! Fixed-latency memory level.
//!
//! This module implements the reference `LowerLevel` used behind both core
//! buses when no cache hierarchy is attached. It provides:
//! 1. **Bounded Queues:** Separate read and write queues with fixed capacities.
//! 2. **Per-cycle Admission:** At most `max_read` reads and `max_write` writes accepted per cycle.
//! 3. **Fixed Latency:** Every request completes `latency` cycles after acceptance.
//!
//! Every access costs the same, like a cache that always hits.

use std::collections::VecDeque;

use crate::config::LevelConfig;
use crate::soc::bus::MemPacket;
use crate::soc::traits::LowerLevel;

/// A request waiting for its completion cycle.
#[derive(Clone, Debug)]
struct Pending {
    ready_cycle: u64,
    packet: MemPacket,
}

/// Memory level in which every access takes the same number of cycles.
#[derive(Clone, Debug)]
pub struct FixedLatencyMemory {
    latency: u64,
    max_read: usize,
    max_write: usize,
    rq_size: usize,
    wq_size: usize,

    cycle: u64,
    reads_this_cycle: usize,
    writes_this_cycle: usize,
    rq: VecDeque<Pending>,
    wq: VecDeque<Pending>,

    reads_served: u64,
    writes_served: u64,
}

impl FixedLatencyMemory {
    /// Creates a level from its configuration.
    ///
    /// # Arguments
    ///
    /// * `config` - Latency, per-cycle limits and queue sizes.
    pub fn new(config: &LevelConfig) -> Self {
        Self {
            latency: config.latency,
            max_read: config.max_read,
            max_write: config.max_write,
            rq_size: config.rq_size,
            wq_size: config.wq_size,
            cycle: 0,
            reads_this_cycle: 0,
            writes_this_cycle: 0,
            rq: VecDeque::with_capacity(config.rq_size),
            wq: VecDeque::with_capacity(config.wq_size),
            reads_served: 0,
            writes_served: 0,
        }
    }

    /// Reads currently queued.
    pub fn pending_reads(&self) -> usize {
        self.rq.len()
    }

    /// Writes currently queued.
    pub fn pending_writes(&self) -> usize {
        self.wq.len()
    }

    /// Reads returned so far.
    pub const fn reads_served(&self) -> u64 {
        self.reads_served
    }

    /// Writes drained so far.
    pub const fn writes_served(&self) -> u64 {
        self.writes_served
    }
}

impl LowerLevel for FixedLatencyMemory {
    fn max_read(&self) -> usize {
        self.max_read
    }

    fn add_rq(&mut self, packet: MemPacket) -> bool {
        if self.rq.len() >= self.rq_size || self.reads_this_cycle >= self.max_read {
            return false;
        }
        self.reads_this_cycle += 1;
        self.rq.push_back(Pending {
            ready_cycle: self.cycle + self.latency,
            packet,
        });
        true
    }

    fn add_wq(&mut self, packet: MemPacket) -> bool {
        if self.wq.len() >= self.wq_size || self.writes_this_cycle >= self.max_write {
            return false;
        }
        self.writes_this_cycle += 1;
        self.wq.push_back(Pending {
            ready_cycle: self.cycle + self.latency,
            packet,
        });
        true
    }

    fn operate(&mut self, cycle: u64, returned: &mut VecDeque<MemPacket>) {
        self.cycle = cycle;
        self.reads_this_cycle = 0;
        self.writes_this_cycle = 0;

        // Constant latency keeps both queues ordered by ready cycle.
        while self.rq.front().is_some_and(|p| p.ready_cycle <= cycle) {
            if let Some(done) = self.rq.pop_front() {
                self.reads_served += 1;
                returned.push_back(done.packet);
            }
        }
        while self.wq.front().is_some_and(|p| p.ready_cycle <= cycle) {
            let _ = self.wq.pop_front();
            self.writes_served += 1;
        }
    }
}
