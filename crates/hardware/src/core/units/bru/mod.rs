//! Branch resolution unit (BRU) interfaces and reference implementations.
//!
//! The core consults two collaborators for every branch it initializes:
//! 1. **Target Buffer:** `TargetBuffer` predicts the target and whether the branch is always taken.
//! 2. **Direction Predictor:** `BranchPredictor` predicts taken / not taken given that target.
//!
//! Both are trained with the actual outcome immediately afterwards. The
//! reference implementations are a bimodal predictor and a BTB with a return
//! address stack.

/// Bimodal (per-ip 2-bit counter) direction predictor.
pub mod bimodal;

/// Branch Target Buffer with always-taken bits and return prediction.
pub mod btb;

/// Return Address Stack for predicting return addresses.
pub mod ras;

pub use self::bimodal::BimodalPredictor;
pub use self::btb::Btb;

use crate::core::instruction::BranchType;

/// Direction predictor interface.
pub trait BranchPredictor: Send {
    /// Predicts whether a branch is taken.
    ///
    /// # Arguments
    ///
    /// * `ip` - Instruction pointer of the branch.
    /// * `predicted_target` - Target offered by the target buffer (0 if none).
    /// * `always_taken` - Whether the target buffer has only ever seen it taken.
    /// * `branch_type` - Class of the branch.
    ///
    /// # Returns
    ///
    /// `true` for a taken prediction.
    fn predict_branch(&mut self, ip: u64, predicted_target: u64, always_taken: bool, branch_type: BranchType) -> bool;

    /// Trains the predictor with the actual outcome.
    ///
    /// # Arguments
    ///
    /// * `ip` - Instruction pointer of the branch.
    /// * `target` - Actual target (0 when not taken).
    /// * `taken` - Actual direction.
    /// * `branch_type` - Class of the branch.
    fn last_branch_result(&mut self, ip: u64, target: u64, taken: bool, branch_type: BranchType);
}

/// Branch target predictor interface.
pub trait TargetBuffer: Send {
    /// Predicts the target of a branch.
    ///
    /// # Returns
    ///
    /// `(predicted_target, always_taken)`, with a target of 0 when nothing is known.
    fn btb_prediction(&mut self, ip: u64, branch_type: BranchType) -> (u64, bool);

    /// Trains the target buffer with the actual outcome.
    fn update_btb(&mut self, ip: u64, target: u64, taken: bool, branch_type: BranchType);
}
