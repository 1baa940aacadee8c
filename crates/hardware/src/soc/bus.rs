//! Core-side memory request bus.
//!
//! Each core owns two buses, one toward the instruction cache and one toward the
//! data cache. A bus stamps outgoing packets with the core number and access
//! type, forwards them to its `LowerLevel`, and collects completed reads in a
//! processed queue that the core drains in its memory-return stage.

use std::collections::VecDeque;
use std::fmt;

use crate::core::instruction::InstrId;
use crate::soc::traits::LowerLevel;

/// Kind of memory access carried by a packet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum AccessType {
    /// A read (instruction fetch or load).
    #[default]
    Load,
    /// A store write.
    Write,
}

/// A memory request or response.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemPacket {
    /// Address used by the lower level (set from `v_address` by the bus).
    pub address: u64,
    /// Virtual address requested by the core.
    pub v_address: u64,
    /// Issuing core.
    pub cpu: usize,
    /// Access kind (set by the bus).
    pub access: AccessType,
    /// Instruction that issued the request.
    pub instr_id: InstrId,
    /// Instruction pointer of the issuer.
    pub ip: u64,
    /// Instructions satisfied by this response (instruction fetch batches).
    pub instr_depend_on_me: VecDeque<InstrId>,
}

impl MemPacket {
    /// Builds a request for `v_address` on behalf of one instruction.
    pub fn new(v_address: u64, instr_id: InstrId, ip: u64) -> Self {
        Self {
            v_address,
            instr_id,
            ip,
            ..Self::default()
        }
    }

    /// Attaches the instructions this response will satisfy.
    #[must_use]
    pub fn with_dependents(mut self, dependents: impl IntoIterator<Item = InstrId>) -> Self {
        self.instr_depend_on_me = dependents.into_iter().collect();
        self
    }
}

/// Connection between a core and one lower memory level.
pub struct CacheBus {
    cpu: usize,
    lower: Box<dyn LowerLevel>,
    processed: VecDeque<MemPacket>,
}

impl fmt::Debug for CacheBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheBus")
            .field("cpu", &self.cpu)
            .field("max_read", &self.lower.max_read())
            .field("processed", &self.processed.len())
            .finish_non_exhaustive()
    }
}

impl CacheBus {
    /// Creates a bus for core `cpu` in front of `lower`.
    pub fn new(cpu: usize, lower: Box<dyn LowerLevel>) -> Self {
        Self {
            cpu,
            lower,
            processed: VecDeque::new(),
        }
    }

    /// Sends a read. Returns `true` if the lower level accepted it.
    pub fn issue_read(&mut self, mut packet: MemPacket) -> bool {
        packet.address = packet.v_address;
        packet.cpu = self.cpu;
        packet.access = AccessType::Load;
        self.lower.add_rq(packet)
    }

    /// Sends a write. Returns `true` if the lower level accepted it.
    ///
    /// Writes carry no dependents and produce no response.
    pub fn issue_write(&mut self, mut packet: MemPacket) -> bool {
        packet.address = packet.v_address;
        packet.cpu = self.cpu;
        packet.access = AccessType::Write;
        packet.instr_depend_on_me.clear();
        self.lower.add_wq(packet)
    }

    /// Lets the lower level progress to `cycle`, collecting its responses.
    pub fn operate(&mut self, cycle: u64) {
        self.lower.operate(cycle, &mut self.processed);
    }

    /// Reads per cycle of the lower level.
    #[inline]
    pub fn max_read(&self) -> usize {
        self.lower.max_read()
    }

    /// Completed reads not yet consumed by the core.
    pub fn processed(&self) -> &VecDeque<MemPacket> {
        &self.processed
    }

    /// Mutable access to the processed queue.
    pub fn processed_mut(&mut self) -> &mut VecDeque<MemPacket> {
        &mut self.processed
    }

    /// Delivers a response directly, as a lower level's return path would.
    pub fn return_data(&mut self, packet: MemPacket) {
        self.processed.push_back(packet);
    }
}
