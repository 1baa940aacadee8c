//! # Branch Classification Tests
//!
//! Table-driven checks of the register-pattern classifier and of stack
//! pointer folding on the classified instruction.

use o3sim_core::core::branch::classify_instruction;
use o3sim_core::core::instruction::{BranchType, InstrId, Instruction};
use rstest::rstest;

use crate::common::builder::instruction::{FLAGS, IP, SP, TraceBuilder};

fn classify(src: Vec<u8>, dst: Vec<u8>, taken: bool) -> Instruction {
    let record = TraceBuilder::new(0x40_0000)
        .src(&src)
        .dst(&dst)
        .taken(taken)
        .target(0x40_2000)
        .build();
    let mut instr = Instruction::from_trace(InstrId(0), record);
    let _ = classify_instruction(&mut instr);
    instr
}

// ══════════════════════════════════════════════════════════
// 1. Register pattern → branch type
// ══════════════════════════════════════════════════════════

#[rstest]
#[case::direct_jump(vec![], vec![IP], BranchType::DirectJump)]
#[case::indirect_jump(vec![7], vec![IP], BranchType::Indirect)]
#[case::conditional(vec![IP, FLAGS], vec![IP], BranchType::Conditional)]
#[case::direct_call(vec![SP, IP], vec![SP, IP], BranchType::DirectCall)]
#[case::indirect_call(vec![SP, IP, 7], vec![SP, IP], BranchType::IndirectCall)]
#[case::ret(vec![SP], vec![SP, IP], BranchType::Return)]
#[case::other(vec![SP, FLAGS], vec![IP], BranchType::Other)]
#[case::not_branch(vec![1, 2], vec![3], BranchType::NotBranch)]
fn test_classification_table(#[case] src: Vec<u8>, #[case] dst: Vec<u8>, #[case] expected: BranchType) {
    let instr = classify(src, dst, false);
    assert_eq!(instr.branch_type, expected);
    assert_eq!(instr.is_branch, expected != BranchType::NotBranch);
}

// ══════════════════════════════════════════════════════════
// 2. Forced outcomes
// ══════════════════════════════════════════════════════════

#[rstest]
#[case::direct_jump(vec![], vec![IP], true)]
#[case::indirect_jump(vec![7], vec![IP], true)]
#[case::direct_call(vec![SP, IP], vec![SP, IP], true)]
#[case::ret(vec![SP], vec![SP, IP], true)]
#[case::conditional(vec![IP, FLAGS], vec![IP], false)]
fn test_unconditional_classes_are_taken(#[case] src: Vec<u8>, #[case] dst: Vec<u8>, #[case] taken: bool) {
    let instr = classify(src, dst, false);
    assert_eq!(instr.branch_taken, taken);
    assert_eq!(instr.branch_target != 0, taken, "not-taken branches lose their target");
}

#[test]
fn test_taken_conditional_keeps_trace_outcome() {
    let instr = classify(vec![IP, FLAGS], vec![IP], true);
    assert!(instr.branch_taken);
    assert_eq!(instr.branch_target, 0x40_2000);
}

// ══════════════════════════════════════════════════════════
// 3. Stack pointer folding
// ══════════════════════════════════════════════════════════

#[test]
fn test_return_folds_stack_pointer() {
    let instr = classify(vec![SP], vec![SP, IP], false);
    assert_eq!(instr.destination_registers, vec![IP]);
}

#[test]
fn test_pop_with_load_folds_stack_pointer() {
    let record = TraceBuilder::new(0x100).src(&[SP]).dst(&[SP, 3]).load(0x7fff_0000).build();
    let mut instr = Instruction::from_trace(InstrId(0), record);
    let _ = classify_instruction(&mut instr);
    assert!(!instr.is_branch);
    assert_eq!(instr.destination_registers, vec![3]);
}

#[test]
fn test_register_stack_adjust_keeps_stack_pointer() {
    let instr = classify(vec![SP, 4], vec![SP], false);
    assert_eq!(instr.destination_registers, vec![SP]);
}
