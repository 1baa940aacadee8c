//! # Deadlock Detection Tests
//!
//! A buffer head that stands still for `deadlock_cycle` cycles halts the core
//! with a report naming the stalled buffer.

use o3sim_core::common::SimError;
use o3sim_core::core::instruction::InstrId;
use o3sim_core::core::watchdog::{DeadlockReport, StallPoint};

use crate::common::builder::instruction::{TraceBuilder, alu_run};
use crate::common::harness::{TestContext, test_config};

const THRESHOLD: u64 = 50;

fn ctx() -> TestContext {
    let mut config = test_config();
    config.core.deadlock_cycle = THRESHOLD;
    TestContext::with_config(config)
}

/// Ticks until the core faults and returns the report.
fn run_to_fault(tc: &mut TestContext, max_cycles: u64) -> DeadlockReport {
    for _ in 0..max_cycles {
        if let Err(err) = tc.tick() {
            return err.as_deadlock().cloned().unwrap();
        }
    }
    panic!("no deadlock within {max_cycles} cycles");
}

#[test]
fn lost_instruction_fetch_stalls_the_ifetch_buffer() {
    let mut tc = ctx();
    tc.l1i.lock().unwrap().hold_reads = true;
    tc.push(alu_run(0x1000, 2));

    let report = run_to_fault(&mut tc, 200);
    assert_eq!(report.stalled_at, StallPoint::IfetchBuffer);
    assert_eq!(report.cycle, THRESHOLD);
    let head = report.ifetch_head.as_ref().unwrap();
    assert_eq!(head.instr_id, InstrId(0));
    assert_eq!(head.ip, 0x1000);
    assert!(report.rob_head.is_none());
}

#[test]
fn lost_load_response_stalls_the_rob() {
    let mut tc = ctx();
    tc.l1d.lock().unwrap().hold_reads = true;
    tc.push([TraceBuilder::new(0x400).load(0x2000).dst(&[3]).build()]);

    let report = run_to_fault(&mut tc, 200);
    assert_eq!(report.stalled_at, StallPoint::Rob);
    let head = report.rob_head.as_ref().unwrap();
    assert_eq!(head.instr_id, InstrId(0));
    assert_eq!(head.num_mem_ops, 1);
    assert_eq!(report.cycle, head.event_cycle + THRESHOLD);

    assert_eq!(report.load_queue.len(), 1);
    assert!(report.load_queue[0].fetch_issued);
    assert_eq!(report.load_queue[0].address, 0x2000);

    let dump = report.to_string();
    assert!(dump.contains("ROB"));
}

#[test]
fn faulted_core_stays_halted() {
    let mut tc = ctx();
    tc.l1i.lock().unwrap().hold_reads = true;
    tc.push(alu_run(0x1000, 1));

    let report = run_to_fault(&mut tc, 200);
    let halted_at = tc.core.current_cycle;
    for _ in 0..3 {
        let err = tc.tick().unwrap_err();
        assert!(matches!(err, SimError::Deadlock(ref r) if **r == report));
    }
    assert_eq!(tc.core.current_cycle, halted_at, "time does not advance after a fault");
}

#[test]
fn slow_but_moving_pipeline_does_not_fault() {
    let mut tc = ctx();
    tc.push(alu_run(0x1000, 200));
    tc.drain(2_000);
    assert!(tc.core.fault.is_none());
}
