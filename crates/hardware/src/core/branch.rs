//! Branch classification from register usage.
//!
//! Instructions carry no opcode, so the branch class is inferred from which of
//! the special registers (stack pointer, flags, instruction pointer) an
//! instruction reads and writes. This module provides:
//! 1. **Register Usage:** The read/write pattern summary (`RegisterUsage`).
//! 2. **Classification:** The pattern → `BranchType` table.
//! 3. **Stack Pointer Folding:** Removal of statically known stack pointer writes.

use crate::common::constants::{REG_FLAGS, REG_INSTRUCTION_POINTER, REG_STACK_POINTER};
use crate::core::instruction::{BranchType, Instruction};

/// Which special registers an instruction touches.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RegisterUsage {
    /// Writes the stack pointer.
    pub writes_sp: bool,
    /// Writes the instruction pointer.
    pub writes_ip: bool,
    /// Reads the stack pointer.
    pub reads_sp: bool,
    /// Reads the flags register.
    pub reads_flags: bool,
    /// Reads the instruction pointer.
    pub reads_ip: bool,
    /// Reads any register other than SP, flags and IP.
    pub reads_other: bool,
}

impl RegisterUsage {
    /// Summarizes the given source and destination register lists.
    pub fn of(sources: &[u8], destinations: &[u8]) -> Self {
        Self {
            writes_sp: destinations.contains(&REG_STACK_POINTER),
            writes_ip: destinations.contains(&REG_INSTRUCTION_POINTER),
            reads_sp: sources.contains(&REG_STACK_POINTER),
            reads_flags: sources.contains(&REG_FLAGS),
            reads_ip: sources.contains(&REG_INSTRUCTION_POINTER),
            reads_other: sources
                .iter()
                .any(|&r| r != REG_STACK_POINTER && r != REG_FLAGS && r != REG_INSTRUCTION_POINTER),
        }
    }
}

/// Outcome of classification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BranchClass {
    /// The inferred class.
    pub branch_type: BranchType,
    /// Whether the class is always taken (overrides the traced outcome).
    pub always_taken: bool,
}

/// Classifies a register usage pattern. Returns `None` for non-branches.
///
/// Rules are tried in order; the first match wins.
pub fn classify(u: RegisterUsage) -> Option<BranchClass> {
    let class = |branch_type: BranchType, always_taken: bool| {
        Some(BranchClass {
            branch_type,
            always_taken,
        })
    };

    if !u.writes_ip {
        return None;
    }
    if !u.reads_sp && !u.reads_flags && !u.reads_other {
        class(BranchType::DirectJump, true)
    } else if !u.reads_sp && !u.reads_flags && u.reads_other {
        class(BranchType::Indirect, true)
    } else if !u.reads_sp && u.reads_ip && !u.writes_sp && u.reads_flags && !u.reads_other {
        class(BranchType::Conditional, false)
    } else if u.reads_sp && u.reads_ip && u.writes_sp && !u.reads_flags && !u.reads_other {
        class(BranchType::DirectCall, true)
    } else if u.reads_sp && u.reads_ip && u.writes_sp && !u.reads_flags && u.reads_other {
        class(BranchType::IndirectCall, true)
    } else if u.reads_sp && !u.reads_ip && u.writes_sp {
        class(BranchType::Return, true)
    } else {
        class(BranchType::Other, false)
    }
}

/// Classifies `instr` in place and folds its stack pointer write.
///
/// Sets `is_branch`, `branch_type` and (for always-taken classes) `branch_taken`,
/// clears the target of not-taken instructions, and removes the stack pointer
/// from the destinations of calls, returns, pushes and pops. Returns the usage
/// pattern that was observed before folding.
pub fn classify_instruction(instr: &mut Instruction) -> RegisterUsage {
    let usage = RegisterUsage::of(&instr.source_registers, &instr.destination_registers);

    match classify(usage) {
        Some(class) => {
            instr.is_branch = true;
            instr.branch_type = class.branch_type;
            if class.always_taken {
                instr.branch_taken = true;
            }
        }
        None => {
            instr.is_branch = false;
            instr.branch_type = BranchType::NotBranch;
        }
    }

    if !instr.branch_taken {
        instr.branch_target = 0;
    }

    // A variable stack adjustment (reads another register, no memory operand)
    // keeps its dependency; everything else has a statically known delta.
    if usage.writes_sp {
        let has_memory = !instr.source_memory.is_empty() || !instr.destination_memory.is_empty();
        if instr.is_branch || has_memory || !usage.reads_other {
            instr.destination_registers.retain(|&r| r != REG_STACK_POINTER);
        }
    }

    usage
}
