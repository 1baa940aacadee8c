//! Branch Target Buffer (BTB).
//!
//! The BTB is a direct-mapped table of branch targets, each with an
//! always-taken bit that stays set until the branch is seen falling through.
//! Returns are predicted from a return address stack plus a per-call-site
//! estimate of the call instruction size, learned from previous returns.

use super::TargetBuffer;
use super::ras::Ras;
use crate::core::instruction::BranchType;

/// Call size assumed until a return has been observed for a call site.
const DEFAULT_CALL_SIZE: u64 = 4;
/// Largest believable call instruction size.
const MAX_CALL_SIZE: u64 = 10;

/// An entry in the Branch Target Buffer.
#[derive(Clone, Copy, Debug, Default)]
struct BtbEntry {
    /// Full ip of the branch owning this entry.
    tag: u64,
    /// Last taken target.
    target: u64,
    /// Cleared the first time the branch is not taken.
    always_taken: bool,
    /// Indicates if this entry contains valid data.
    valid: bool,
}

/// Branch Target Buffer with return prediction.
#[derive(Clone, Debug)]
pub struct Btb {
    /// The table of BTB entries.
    table: Vec<BtbEntry>,
    /// Calls awaiting their return.
    ras: Ras,
    /// Learned call instruction sizes, indexed by call ip.
    call_size: Vec<u64>,
    /// Call popped by the most recent return prediction.
    last_return_call: Option<u64>,
}

impl Btb {
    /// Creates a new Branch Target Buffer.
    ///
    /// # Arguments
    ///
    /// * `size` - The number of entries in the BTB. Must be a power of 2.
    /// * `ras_size` - Return address stack depth.
    /// * `call_size_trackers` - Call-size estimates kept. Must be a power of 2.
    pub fn new(size: usize, ras_size: usize, call_size_trackers: usize) -> Self {
        Self {
            table: vec![BtbEntry::default(); size],
            ras: Ras::new(ras_size),
            call_size: vec![DEFAULT_CALL_SIZE; call_size_trackers],
            last_return_call: None,
        }
    }

    /// Index into the BTB table; folds the upper ip bits so that unaligned
    /// variable-length code spreads over the whole table.
    #[inline]
    fn index(&self, ip: u64) -> usize {
        let mask = (self.table.len() - 1) as u64;
        ((ip ^ (ip >> 12)) & mask) as usize
    }

    #[inline]
    fn call_size_index(&self, call_ip: u64) -> usize {
        (call_ip & (self.call_size.len() - 1) as u64) as usize
    }

    /// Looks up the stored target for `ip`.
    ///
    /// # Returns
    ///
    /// `(target, always_taken)` if a valid entry with a matching tag exists.
    pub fn lookup(&self, ip: u64) -> Option<(u64, bool)> {
        let e = self.table[self.index(ip)];
        (e.valid && e.tag == ip).then_some((e.target, e.always_taken))
    }

    /// Depth of the return address stack.
    pub fn ras_depth(&self) -> usize {
        self.ras.len()
    }

    /// Current call-size estimate for the call at `call_ip`.
    pub fn call_size(&self, call_ip: u64) -> u64 {
        self.call_size[self.call_size_index(call_ip)]
    }
}

impl TargetBuffer for Btb {
    fn btb_prediction(&mut self, ip: u64, branch_type: BranchType) -> (u64, bool) {
        match branch_type {
            BranchType::Return => {
                let Some(call_ip) = self.ras.pop() else {
                    self.last_return_call = None;
                    return (0, true);
                };
                self.last_return_call = Some(call_ip);
                (call_ip + self.call_size(call_ip), true)
            }
            BranchType::DirectCall | BranchType::IndirectCall => {
                self.ras.push(ip);
                self.lookup(ip).unwrap_or((0, true))
            }
            _ => self.lookup(ip).unwrap_or((0, false)),
        }
    }

    fn update_btb(&mut self, ip: u64, target: u64, taken: bool, branch_type: BranchType) {
        if branch_type == BranchType::Return {
            if let Some(call_ip) = self.last_return_call.take()
                && target > call_ip
                && target - call_ip <= MAX_CALL_SIZE
            {
                let idx = self.call_size_index(call_ip);
                self.call_size[idx] = target - call_ip;
            }
            return;
        }

        let idx = self.index(ip);
        let entry = &mut self.table[idx];
        if entry.valid && entry.tag == ip {
            if taken {
                entry.target = target;
            } else {
                entry.always_taken = false;
            }
        } else if taken {
            *entry = BtbEntry {
                tag: ip,
                target,
                always_taken: true,
                valid: true,
            };
        }
    }
}
