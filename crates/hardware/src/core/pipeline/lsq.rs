//! Load and Store Queues.
//!
//! Memory operands enter these queues at dispatch. The queues provide:
//! 1. **Allocation:** A free load slot per source operand, an appended store entry per destination operand.
//! 2. **Forwarding Lookup:** The program-order-nearest older store to the same address.
//! 3. **Readiness:** A ready cycle set when the owning instruction executes.
//! 4. **Release:** Load slots are freed on data return or store forwarding; stores leave in program order.
//!
//! The load queue is a fixed slot array (loads complete in any order); the store
//! queue is a FIFO (stores write in program order).

use std::collections::VecDeque;

use crate::core::instruction::InstrId;

/// Index of a load queue slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LqSlot(pub usize);

/// A load waiting for, or carrying, its data-cache read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LqEntry {
    /// Owning instruction.
    pub instr_id: InstrId,
    /// Address loaded.
    pub virtual_address: u64,
    /// Owning instruction pointer.
    pub ip: u64,
    /// Cycle after which the load may issue; `None` until its instruction executes.
    pub ready_cycle: Option<u64>,
    /// Older store this load is waiting on for forwarding.
    pub producer_id: Option<InstrId>,
    /// Whether the read has been accepted by the data cache.
    pub fetch_issued: bool,
}

impl LqEntry {
    /// Creates an unissued entry with no producer.
    pub const fn new(instr_id: InstrId, virtual_address: u64, ip: u64) -> Self {
        Self {
            instr_id,
            virtual_address,
            ip,
            ready_cycle: None,
            producer_id: None,
            fetch_issued: false,
        }
    }

    /// Returns true if the load may issue its own read at `cycle`.
    #[inline]
    pub fn can_issue(&self, cycle: u64) -> bool {
        self.producer_id.is_none() && !self.fetch_issued && self.ready_cycle.is_some_and(|c| c < cycle)
    }
}

/// A store, from dispatch until its write is accepted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SqEntry {
    /// Owning instruction.
    pub instr_id: InstrId,
    /// Address stored.
    pub virtual_address: u64,
    /// Owning instruction pointer.
    pub ip: u64,
    /// Cycle after which the store may act; `None` until its instruction executes.
    pub ready_cycle: Option<u64>,
    /// Whether the store has finished (its value is available for forwarding).
    pub fetch_issued: bool,
    /// Loads waiting for this store to finish.
    pub lq_dependents: Vec<LqSlot>,
}

impl SqEntry {
    /// Creates an unfinished entry.
    pub const fn new(instr_id: InstrId, virtual_address: u64, ip: u64) -> Self {
        Self {
            instr_id,
            virtual_address,
            ip,
            ready_cycle: None,
            fetch_issued: false,
            lq_dependents: Vec::new(),
        }
    }

    /// Returns true if the ready cycle is strictly before `cycle`.
    #[inline]
    pub fn ready_before(&self, cycle: u64) -> bool {
        self.ready_cycle.is_some_and(|c| c < cycle)
    }
}

/// Fixed-capacity load queue.
#[derive(Clone, Debug)]
pub struct LoadQueue {
    slots: Vec<Option<LqEntry>>,
}

impl LoadQueue {
    /// Creates an empty load queue with `capacity` slots.
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity],
        }
    }

    /// Returns the number of slots.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Returns the number of occupied slots.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Returns true if no slot is occupied.
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Returns the number of free slots.
    pub fn free_slots(&self) -> usize {
        self.slots.iter().filter(|s| s.is_none()).count()
    }

    /// Places `entry` in the first free slot. Returns `None` if the queue is full.
    pub fn allocate(&mut self, entry: LqEntry) -> Option<LqSlot> {
        let idx = self.slots.iter().position(Option::is_none)?;
        self.slots[idx] = Some(entry);
        Some(LqSlot(idx))
    }

    /// Frees a slot, returning what it held.
    pub fn release(&mut self, slot: LqSlot) -> Option<LqEntry> {
        self.slots.get_mut(slot.0).and_then(Option::take)
    }

    /// Returns the entry in `slot`, if occupied.
    pub fn get(&self, slot: LqSlot) -> Option<&LqEntry> {
        self.slots.get(slot.0).and_then(Option::as_ref)
    }

    /// Returns the entry in `slot` mutably, if occupied.
    pub fn get_mut(&mut self, slot: LqSlot) -> Option<&mut LqEntry> {
        self.slots.get_mut(slot.0).and_then(Option::as_mut)
    }

    /// Iterates over occupied slots.
    pub fn iter(&self) -> impl Iterator<Item = (LqSlot, &LqEntry)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|e| (LqSlot(i), e)))
    }

    /// Iterates mutably over occupied slots.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (LqSlot, &mut LqEntry)> {
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(i, s)| s.as_mut().map(|e| (LqSlot(i), e)))
    }

    /// Sets the ready cycle of every entry owned by `instr_id`.
    pub fn mark_ready(&mut self, instr_id: InstrId, cycle: u64) {
        for (_, entry) in self.iter_mut() {
            if entry.instr_id == instr_id {
                entry.ready_cycle = Some(cycle);
            }
        }
    }
}

/// Bounded FIFO store queue.
#[derive(Clone, Debug)]
pub struct StoreQueue {
    entries: VecDeque<SqEntry>,
    capacity: usize,
}

impl StoreQueue {
    /// Creates an empty store queue holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Returns the capacity.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of live entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the queue is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the number of free entries.
    #[inline]
    pub fn free_slots(&self) -> usize {
        self.capacity - self.entries.len()
    }

    /// Appends a store. Returns false if the queue is full.
    pub fn push(&mut self, entry: SqEntry) -> bool {
        if self.entries.len() >= self.capacity {
            return false;
        }
        self.entries.push_back(entry);
        true
    }

    /// The oldest store.
    pub fn front(&self) -> Option<&SqEntry> {
        self.entries.front()
    }

    /// Removes the oldest store.
    pub fn pop_front(&mut self) -> Option<SqEntry> {
        self.entries.pop_front()
    }

    /// Returns the entry at queue position `idx`.
    pub fn get(&self, idx: usize) -> Option<&SqEntry> {
        self.entries.get(idx)
    }

    /// Returns the entry at queue position `idx` mutably.
    pub fn get_mut(&mut self, idx: usize) -> Option<&mut SqEntry> {
        self.entries.get_mut(idx)
    }

    /// Iterates from oldest to youngest.
    pub fn iter(&self) -> impl Iterator<Item = &SqEntry> {
        self.entries.iter()
    }

    /// Iterates mutably from oldest to youngest.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut SqEntry> {
        self.entries.iter_mut()
    }

    /// Sets the ready cycle of every entry owned by `instr_id`.
    pub fn mark_ready(&mut self, instr_id: InstrId, cycle: u64) {
        for entry in &mut self.entries {
            if entry.instr_id == instr_id {
                entry.ready_cycle = Some(cycle);
            }
        }
    }

    /// Finds the store a load at `address` should forward from: the youngest
    /// store to the same address that is older than `load_id`.
    ///
    /// Returns its queue position.
    pub fn find_forwarding_store(&self, address: u64, load_id: InstrId) -> Option<usize> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.virtual_address == address && e.instr_id < load_id)
            .max_by_key(|(_, e)| e.instr_id)
            .map(|(idx, _)| idx)
    }
}
