//! In-flight instruction window.
//!
//! Every instruction between initialize and retire lives here, keyed by its
//! `InstrId`. Pipeline buffers, queue entries and dependency lists hold ids,
//! never references, so a retired instruction can be dropped without leaving
//! anything dangling: a stale id simply fails to resolve.
//!
//! Ids are handed out consecutively and instructions retire in id order, so the
//! live ids always form one contiguous range and lookup is a subtraction.

use std::collections::VecDeque;

use crate::core::instruction::{InstrId, Instruction};

/// Id-indexed storage for all in-flight instructions.
#[derive(Debug, Default)]
pub struct InstrWindow {
    entries: VecDeque<Instruction>,
}

impl InstrWindow {
    /// Creates an empty window.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of in-flight instructions.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is in flight.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Adds the youngest instruction. Its id must follow the current youngest.
    pub fn push(&mut self, instr: Instruction) {
        debug_assert!(
            self.entries
                .back()
                .is_none_or(|youngest| youngest.id.next() == instr.id),
            "instruction ids entering the window must be consecutive"
        );
        self.entries.push_back(instr);
    }

    /// Removes and returns the oldest instruction.
    pub fn pop_oldest(&mut self) -> Option<Instruction> {
        self.entries.pop_front()
    }

    /// Returns the oldest instruction.
    pub fn oldest(&self) -> Option<&Instruction> {
        self.entries.front()
    }

    #[inline]
    fn index_of(&self, id: InstrId) -> Option<usize> {
        let base = self.entries.front()?.id;
        let offset = id.0.checked_sub(base.0)?;
        let idx = usize::try_from(offset).ok()?;
        (idx < self.entries.len()).then_some(idx)
    }

    /// Looks up an in-flight instruction.
    #[inline]
    pub fn get(&self, id: InstrId) -> Option<&Instruction> {
        self.index_of(id).map(|idx| &self.entries[idx])
    }

    /// Looks up an in-flight instruction mutably.
    #[inline]
    pub fn get_mut(&mut self, id: InstrId) -> Option<&mut Instruction> {
        self.index_of(id).map(|idx| &mut self.entries[idx])
    }

    /// Returns true if `id` is still in flight.
    #[inline]
    pub fn contains(&self, id: InstrId) -> bool {
        self.index_of(id).is_some()
    }

    /// Iterates from oldest to youngest.
    pub fn iter(&self) -> impl Iterator<Item = &Instruction> {
        self.entries.iter()
    }
}
