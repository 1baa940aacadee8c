//! Code prefetcher interface.
//!
//! The core notifies the instruction-side prefetcher every time it consults
//! the branch predictor. The notification is fire-and-forget; the prefetcher
//! issues whatever requests it wants through its own cache.

use crate::core::instruction::BranchType;

/// Trait for instruction prefetchers driven by branch predictions.
pub trait CodePrefetcher: Send {
    /// Observes one branch prediction.
    ///
    /// # Arguments
    ///
    /// * `ip` - Instruction pointer of the branch.
    /// * `branch_type` - Class of the branch.
    /// * `predicted_target` - Target the front end will follow (0 for fall-through).
    fn branch_operate(&mut self, ip: u64, branch_type: BranchType, predicted_target: u64);
}

/// Prefetcher that ignores every notification.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoPrefetcher;

impl CodePrefetcher for NoPrefetcher {
    fn branch_operate(&mut self, _ip: u64, _branch_type: BranchType, _predicted_target: u64) {}
}
