//! Instruction records.
//!
//! This module defines the per-instruction state threaded through every stage. It provides:
//! 1. **Trace Records:** `TraceInstr`, the raw operand lists read from an instruction source.
//! 2. **Stage Progress:** `StageState`, a forward-only NotStarted → Inflight → Completed flag.
//! 3. **Branch Types:** `BranchType`, the register-pattern branch classes.
//! 4. **In-flight Records:** `Instruction`, the mutable state bag owned by the instruction window.

use std::fmt;

use serde::Deserialize;

/// Unique, monotonically increasing instruction id (program order).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct InstrId(pub u64);

impl InstrId {
    /// Returns the id that follows this one.
    #[inline]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for InstrId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Progress of one pipeline activity (fetch, decode, schedule, execute).
///
/// The variants are ordered; a flag only ever moves to a later variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum StageState {
    /// Not yet begun.
    #[default]
    NotStarted,
    /// Begun, waiting on latency or an external response.
    Inflight,
    /// Done.
    Completed,
}

impl StageState {
    /// Moves the flag forward to `next`. Requests to move backwards are ignored.
    ///
    /// Returns `true` if the flag changed.
    #[inline]
    pub fn advance(&mut self, next: Self) -> bool {
        if next > *self {
            *self = next;
            true
        } else {
            false
        }
    }

    /// Returns true once the activity has begun.
    #[inline]
    pub fn is_started(self) -> bool {
        self != Self::NotStarted
    }
}

/// Branch class derived from an instruction's register read/write pattern.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum BranchType {
    /// Not a branch.
    #[default]
    NotBranch,
    /// Unconditional jump with an encoded target.
    DirectJump,
    /// Jump through a register.
    Indirect,
    /// Flag-dependent branch.
    Conditional,
    /// Call with an encoded target.
    DirectCall,
    /// Call through a register.
    IndirectCall,
    /// Function return.
    Return,
    /// Writes the instruction pointer but fits no other class.
    Other,
}

impl BranchType {
    /// Number of branch classes, including `NotBranch`.
    pub const COUNT: usize = 8;

    /// All branch classes in index order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::NotBranch,
        Self::DirectJump,
        Self::Indirect,
        Self::Conditional,
        Self::DirectCall,
        Self::IndirectCall,
        Self::Return,
        Self::Other,
    ];

    /// Dense index for per-type counter arrays.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Report name of the class.
    pub const fn name(self) -> &'static str {
        match self {
            Self::NotBranch => "NOT_BRANCH",
            Self::DirectJump => "BRANCH_DIRECT_JUMP",
            Self::Indirect => "BRANCH_INDIRECT",
            Self::Conditional => "BRANCH_CONDITIONAL",
            Self::DirectCall => "BRANCH_DIRECT_CALL",
            Self::IndirectCall => "BRANCH_INDIRECT_CALL",
            Self::Return => "BRANCH_RETURN",
            Self::Other => "BRANCH_OTHER",
        }
    }

    /// Returns true for the classes whose misprediction is detected at decode
    /// (the target is encoded in the instruction).
    #[inline]
    pub const fn resolves_at_decode(self) -> bool {
        matches!(self, Self::DirectJump | Self::DirectCall)
    }
}

impl fmt::Display for BranchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One record as produced by an instruction source.
///
/// Register id `0` and address `0` mean "unused slot" and are dropped when the
/// in-flight record is built.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct TraceInstr {
    /// Instruction pointer.
    pub ip: u64,
    /// Actual branch outcome.
    #[serde(default, alias = "taken")]
    pub branch_taken: bool,
    /// Actual branch target; filled from the next record by the trace reader.
    #[serde(default)]
    pub branch_target: u64,
    /// Architectural registers read.
    #[serde(default, alias = "src_regs")]
    pub source_registers: Vec<u8>,
    /// Architectural registers written.
    #[serde(default, alias = "dst_regs")]
    pub destination_registers: Vec<u8>,
    /// Addresses loaded.
    #[serde(default, alias = "src_mem")]
    pub source_memory: Vec<u64>,
    /// Addresses stored.
    #[serde(default, alias = "dst_mem")]
    pub destination_memory: Vec<u64>,
}

/// Mutable per-instruction state, alive from initialize until retirement.
#[derive(Clone, Debug, Default)]
pub struct Instruction {
    /// Program-order id.
    pub id: InstrId,
    /// Instruction pointer.
    pub ip: u64,

    /// Registers read (may repeat).
    pub source_registers: Vec<u8>,
    /// Registers written (unique).
    pub destination_registers: Vec<u8>,
    /// Addresses loaded.
    pub source_memory: Vec<u64>,
    /// Addresses stored.
    pub destination_memory: Vec<u64>,

    /// Instruction fetch progress.
    pub fetched: StageState,
    /// Decode progress.
    pub decoded: StageState,
    /// Scheduling progress; Completed also means all register inputs are ready.
    pub scheduled: StageState,
    /// Execution progress.
    pub executed: StageState,
    /// Whether the instruction writes the instruction pointer.
    pub is_branch: bool,
    /// Branch class.
    pub branch_type: BranchType,
    /// Actual outcome.
    pub branch_taken: bool,
    /// Predicted direction.
    pub branch_prediction: bool,
    /// Set while an unresolved misprediction is pending on this instruction.
    pub branch_mispredicted: bool,
    /// Actual target (zero when not taken).
    pub branch_target: u64,

    /// Outstanding memory operations (loads and stores) gating completion.
    pub num_mem_ops: usize,
    /// Outstanding register producers gating execution.
    pub num_reg_dependent: usize,
    /// Earliest cycle at which the next transition may happen.
    pub event_cycle: u64,

    /// Younger instructions waiting on this one's registers.
    pub reg_dependents: Vec<InstrId>,
}

impl Instruction {
    /// Builds the in-flight record for a trace record.
    ///
    /// Unused register and memory slots are dropped and destination registers
    /// are de-duplicated. Source registers keep their repeats.
    pub fn from_trace(id: InstrId, record: TraceInstr) -> Self {
        let TraceInstr {
            ip,
            branch_taken,
            branch_target,
            mut source_registers,
            destination_registers,
            mut source_memory,
            mut destination_memory,
        } = record;

        source_registers.retain(|&r| r != 0);
        source_memory.retain(|&a| a != 0);
        destination_memory.retain(|&a| a != 0);

        let mut unique_dest = Vec::with_capacity(destination_registers.len());
        for reg in destination_registers {
            if reg != 0 && !unique_dest.contains(&reg) {
                unique_dest.push(reg);
            }
        }

        Self {
            id,
            ip,
            source_registers,
            destination_registers: unique_dest,
            num_mem_ops: source_memory.len() + destination_memory.len(),
            source_memory,
            destination_memory,
            branch_taken,
            branch_target,
            ..Self::default()
        }
    }
}
