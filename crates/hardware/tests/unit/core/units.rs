//! # Front-End Unit Tests
//!
//! The reference predictor, target buffer and DIB, first on their own and then
//! as the core uses them.

use o3sim_core::core::instruction::BranchType;
use o3sim_core::core::units::bru::{BimodalPredictor, BranchPredictor, Btb, TargetBuffer};
use o3sim_core::core::units::dib::Dib;
use rstest::rstest;

use crate::common::builder::instruction::{TraceBuilder, alu_run};
use crate::common::harness::TestContext;

// ══════════════════════════════════════════════════════════
// 1. Decoded instruction buffer
// ══════════════════════════════════════════════════════════

#[rstest]
#[case::window_start(0x1000, true)]
#[case::window_end(0x100f, true)]
#[case::next_window(0x1010, false)]
#[case::previous_window(0x0ff0, false)]
fn dib_entry_covers_one_window(#[case] ip: u64, #[case] hit: bool) {
    let mut dib = Dib::new(16, 32, 8);
    dib.fill_cache(0x1004, true);
    assert_eq!(dib.check_hit(ip), hit);
}

#[test]
fn dib_replaces_least_recently_used_way() {
    // One set, two ways: every window maps to the same set.
    let mut dib = Dib::new(16, 1, 2);
    dib.fill_cache(0x000, true);
    dib.fill_cache(0x100, true);
    assert!(dib.check_hit(0x000));

    dib.fill_cache(0x200, true);
    assert!(dib.check_hit(0x000));
    assert!(dib.check_hit(0x200));
    assert!(!dib.check_hit(0x100));
    assert_eq!((dib.hits(), dib.misses()), (3, 1));
}

// ══════════════════════════════════════════════════════════
// 2. Predictor and target buffer
// ══════════════════════════════════════════════════════════

#[test]
fn bimodal_tables_are_independent_per_ip() {
    let mut bp = BimodalPredictor::new(1024);
    bp.last_branch_result(0x400, 0x500, true, BranchType::Conditional);
    assert!(bp.predict_branch(0x400, 0x500, false, BranchType::Conditional));
    assert!(!bp.predict_branch(0x404, 0x500, false, BranchType::Conditional));
}

#[test]
fn nested_calls_return_in_reverse_order() {
    let mut btb = Btb::new(64, 8, 64);
    let _ = btb.btb_prediction(0x1000, BranchType::DirectCall);
    let _ = btb.btb_prediction(0x2000, BranchType::IndirectCall);

    assert_eq!(btb.btb_prediction(0x3000, BranchType::Return), (0x2004, true));
    assert_eq!(btb.btb_prediction(0x3000, BranchType::Return), (0x1004, true));
    assert_eq!(btb.ras_depth(), 0);
}

// ══════════════════════════════════════════════════════════
// 3. Through the core
// ══════════════════════════════════════════════════════════

#[test]
fn return_is_predicted_from_its_call_site() {
    let mut tc = TestContext::new();
    tc.push([TraceBuilder::new(0x1000).direct_call(0x5000).build()]);
    tc.push(alu_run(0x5000, 1));
    tc.push([TraceBuilder::new(0x5004).ret(0x1004).build()]);
    tc.push(alu_run(0x1004, 1));
    tc.drain(200);

    let phase = &tc.core.stats.current;
    assert_eq!(phase.total_branch_types[BranchType::DirectCall.index()], 1);
    assert_eq!(phase.total_branch_types[BranchType::Return.index()], 1);
    assert_eq!(phase.branch_type_misses[BranchType::DirectCall.index()], 1, "cold BTB");
    assert_eq!(phase.branch_type_misses[BranchType::Return.index()], 0);
}

#[test]
fn loop_branch_is_learned_after_one_miss() {
    let mut tc = TestContext::new();
    for _ in 0..6 {
        tc.push([TraceBuilder::new(0x1000).conditional(true, 0x1000).build()]);
    }
    tc.drain(500);

    let phase = &tc.core.stats.current;
    assert_eq!(phase.total_branch_types[BranchType::Conditional.index()], 6);
    assert_eq!(phase.branch_type_misses[BranchType::Conditional.index()], 1);
    assert_eq!(phase.total_mispredictions(), 1);
}
