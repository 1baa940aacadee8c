//! Bimodal Branch Predictor.
//!
//! One 2-bit saturating counter per table entry, indexed by the branch ip
//! modulo the table size. No history is kept, so the predictor captures only
//! per-branch bias.
//!
//! # Performance
//!
//! - **Time Complexity:** `predict_branch()` and `last_branch_result()` are O(1).
//! - **Space Complexity:** O(N) counters.

use super::BranchPredictor;
use crate::core::instruction::BranchType;

/// Largest counter value.
const COUNTER_MAX: u8 = 3;
/// Counters at or above this value predict taken.
const TAKEN_THRESHOLD: u8 = COUNTER_MAX.div_ceil(2);

/// Bimodal predictor state.
#[derive(Clone, Debug)]
pub struct BimodalPredictor {
    table: Vec<u8>,
}

impl BimodalPredictor {
    /// Creates a predictor with `size` counters, all weakly not-taken.
    ///
    /// # Arguments
    ///
    /// * `size` - Number of counters. Must be non-zero.
    pub fn new(size: usize) -> Self {
        Self {
            table: vec![TAKEN_THRESHOLD - 1; size],
        }
    }

    #[inline]
    fn index(&self, ip: u64) -> usize {
        (ip % self.table.len() as u64) as usize
    }

    /// Current counter value for `ip`.
    pub fn counter(&self, ip: u64) -> u8 {
        self.table[self.index(ip)]
    }
}

impl BranchPredictor for BimodalPredictor {
    fn predict_branch(&mut self, ip: u64, _predicted_target: u64, _always_taken: bool, _branch_type: BranchType) -> bool {
        self.counter(ip) >= TAKEN_THRESHOLD
    }

    fn last_branch_result(&mut self, ip: u64, _target: u64, taken: bool, _branch_type: BranchType) {
        let idx = self.index(ip);
        let counter = &mut self.table[idx];
        if taken && *counter < COUNTER_MAX {
            *counter += 1;
        } else if !taken && *counter > 0 {
            *counter -= 1;
        }
    }
}
