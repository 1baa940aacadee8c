//! Register producer map.
//!
//! For each architectural register, the in-flight instructions that will write
//! it, kept sorted by id. A consumer is linked to the youngest producer older
//! than itself; a producer's entry is removed once, when it completes execution.

use crate::common::constants::NUM_REGISTER_IDS;
use crate::core::instruction::InstrId;

/// Per-core table of pending register writers.
#[derive(Debug, Clone)]
pub struct RegisterProducers {
    table: Vec<Vec<InstrId>>,
}

impl Default for RegisterProducers {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterProducers {
    /// Creates an empty map covering every register id.
    pub fn new() -> Self {
        Self {
            table: vec![Vec::new(); NUM_REGISTER_IDS],
        }
    }

    /// Pending producers of `reg`, oldest first.
    #[inline]
    pub fn producers(&self, reg: u8) -> &[InstrId] {
        &self.table[usize::from(reg)]
    }

    /// The youngest producer of `reg` that is older than `consumer`.
    pub fn latest_before(&self, reg: u8, consumer: InstrId) -> Option<InstrId> {
        let list = self.producers(reg);
        let pos = list.partition_point(|&p| p < consumer);
        pos.checked_sub(1).map(|i| list[i])
    }

    /// Records `producer` as a pending writer of `reg`, keeping id order.
    ///
    /// Returns `false` (and changes nothing) if it is already recorded.
    pub fn insert(&mut self, reg: u8, producer: InstrId) -> bool {
        let list = &mut self.table[usize::from(reg)];
        match list.binary_search(&producer) {
            Ok(_) => false,
            Err(pos) => {
                list.insert(pos, producer);
                true
            }
        }
    }

    /// Removes `producer` from the writers of `reg`.
    ///
    /// Returns `false` if it was not recorded.
    pub fn remove(&mut self, reg: u8, producer: InstrId) -> bool {
        let list = &mut self.table[usize::from(reg)];
        match list.binary_search(&producer) {
            Ok(pos) => {
                let _ = list.remove(pos);
                true
            }
            Err(_) => false,
        }
    }

    /// Total number of recorded (register, producer) pairs.
    pub fn len(&self) -> usize {
        self.table.iter().map(Vec::len).sum()
    }

    /// Returns true if no register has a pending producer.
    pub fn is_empty(&self) -> bool {
        self.table.iter().all(Vec::is_empty)
    }
}
