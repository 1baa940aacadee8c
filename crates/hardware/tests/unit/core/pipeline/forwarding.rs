//! # Store-to-Load Forwarding Tests
//!
//! Verifies that a load to the address of an older in-flight store takes its
//! value from the store queue instead of the data cache, that stores only
//! write once their instruction has retired, and that refused loads retry.

use o3sim_core::core::instruction::{InstrId, TraceInstr};
use o3sim_core::soc::bus::AccessType;
use pretty_assertions::assert_eq;

use crate::common::builder::instruction::TraceBuilder;
use crate::common::harness::TestContext;

const ADDR: u64 = 0x1000;

fn store_then_load() -> [TraceInstr; 2] {
    [
        TraceBuilder::new(0x400).store(ADDR).build(),
        TraceBuilder::new(0x404).load(ADDR).dst(&[3]).build(),
    ]
}

// ══════════════════════════════════════════════════════════
// 1. Load waits on an unfinished store
// ══════════════════════════════════════════════════════════

#[test]
fn load_waits_on_unfinished_store_and_completes_in_its_finish_cycle() {
    let mut tc = TestContext::new();
    tc.push(store_then_load());

    assert!(tc.run_until(100, |c| c.rob.contains(&InstrId(1))));
    let (slot, entry) = tc.core.lq.iter().next().map(|(s, e)| (s, e.clone())).unwrap();
    assert_eq!(entry.producer_id, Some(InstrId(0)));
    assert_eq!(tc.core.sq.front().map(|s| s.lq_dependents.clone()), Some(vec![slot]));

    assert!(tc.run_until(100, |c| c.sq.front().is_some_and(|s| s.fetch_issued)));
    let finish_cycle = tc.core.sq.front().and_then(|s| s.ready_cycle).unwrap();
    let load = tc.core.instr(InstrId(1)).unwrap();
    assert_eq!(load.num_mem_ops, 0);
    assert_eq!(load.event_cycle, finish_cycle);
    assert!(tc.core.lq.is_empty(), "forwarded load frees its slot");

    tc.drain(100);
    assert_eq!(tc.l1d_reads(), 0, "a forwarded load never reads the data cache");
    assert_eq!(tc.l1d_writes(), 1);
}

// ══════════════════════════════════════════════════════════
// 2. Load forwards at dispatch from a finished store
// ══════════════════════════════════════════════════════════

#[test]
fn load_behind_finished_store_forwards_at_dispatch() {
    let mut tc = TestContext::new();
    tc.l1d.lock().unwrap().reject_writes = true;

    let [store, load] = store_then_load();
    tc.push([store]);
    assert!(tc.run_until(100, |c| c.num_retired == 1));
    assert!(tc.core.sq.front().is_some_and(|s| s.fetch_issued));

    tc.push([load]);
    assert!(tc.run_until(100, |c| c.rob.contains(&InstrId(1))));
    assert_eq!(tc.core.instr(InstrId(1)).map(|i| i.num_mem_ops), Some(0));
    assert!(tc.core.lq.is_empty());

    assert!(tc.run_until(100, |c| c.num_retired == 2));
    assert_eq!(tc.l1d_reads(), 0);
}

// ══════════════════════════════════════════════════════════
// 3. Nearest older store wins
// ══════════════════════════════════════════════════════════

#[test]
fn load_forwards_from_nearest_older_store() {
    let mut tc = TestContext::new();
    tc.push([
        TraceBuilder::new(0x400).store(ADDR).build(),
        TraceBuilder::new(0x404).store(ADDR).build(),
        TraceBuilder::new(0x408).load(ADDR).build(),
    ]);

    assert!(tc.run_until(100, |c| c.rob.contains(&InstrId(2))));
    let producer = tc.core.lq.iter().next().and_then(|(_, e)| e.producer_id);
    assert_eq!(producer, Some(InstrId(1)));

    tc.drain(100);
    assert_eq!(tc.l1d_reads(), 0);
    assert_eq!(tc.l1d_writes(), 2);
}

#[test]
fn load_to_other_address_reads_the_cache() {
    let mut tc = TestContext::new();
    tc.push([
        TraceBuilder::new(0x400).store(ADDR).build(),
        TraceBuilder::new(0x404).load(ADDR + 0x100).build(),
    ]);

    tc.drain(100);
    let log = tc.l1d.lock().unwrap();
    assert_eq!(log.reads.len(), 1);
    assert_eq!(log.reads[0].v_address, ADDR + 0x100);
    assert_eq!(log.reads[0].access, AccessType::Load);
    assert_eq!(log.reads[0].instr_id, InstrId(1));
}

// ══════════════════════════════════════════════════════════
// 4. Stores write after retirement, in order
// ══════════════════════════════════════════════════════════

#[test]
fn stores_write_in_program_order_after_retirement() {
    let mut tc = TestContext::new();
    tc.push([
        TraceBuilder::new(0x400).store(0x2000).build(),
        TraceBuilder::new(0x404).store(0x3000).build(),
        TraceBuilder::new(0x408).store(0x4000).build(),
    ]);

    while !(tc.core.is_drained() && tc.core.sq.is_empty()) {
        let written = tc.l1d_writes();
        let retired = tc.core.num_retired as usize;
        assert!(written <= retired, "a store wrote before its instruction retired");
        tc.tick().unwrap();
    }

    let log = tc.l1d.lock().unwrap();
    let order: Vec<u64> = log.writes.iter().map(|p| p.v_address).collect();
    assert_eq!(order, vec![0x2000, 0x3000, 0x4000]);
    assert!(log.writes.iter().all(|p| p.access == AccessType::Write));
}

// ══════════════════════════════════════════════════════════
// 5. Refused loads retry
// ══════════════════════════════════════════════════════════

#[test]
fn refused_load_stays_unissued_and_retries() {
    let mut tc = TestContext::new();
    tc.l1d.lock().unwrap().reject_reads = true;
    tc.push([TraceBuilder::new(0x400).load(0x2000).dst(&[3]).build()]);

    let refused = |tc: &TestContext| tc.l1d.lock().unwrap().rejected_reads;
    for _ in 0..100 {
        if refused(&tc) >= 3 {
            break;
        }
        tc.tick().unwrap();
    }
    assert!(refused(&tc) >= 3, "the load is offered again every cycle");

    let entry = tc.core.lq.iter().next().map(|(_, e)| e.clone()).unwrap();
    assert_eq!(entry.instr_id, InstrId(0));
    assert!(!entry.fetch_issued);
    assert_eq!(tc.l1d_reads(), 0);
    assert_eq!(tc.core.num_retired, 0);

    tc.l1d.lock().unwrap().reject_reads = false;
    tc.drain(100);
    assert_eq!(tc.l1d_reads(), 1);
    assert!(tc.core.lq.is_empty());
}
