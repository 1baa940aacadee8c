//! # Dispatch Tests
//!
//! Verifies that dispatch only moves an instruction into the ROB when the
//! ROB, load queue and store queue can hold it.

use o3sim_core::common::constants::{NUM_INSTR_DESTINATION_MEMORY, NUM_INSTR_SOURCE_MEMORY};
use o3sim_core::core::instruction::InstrId;

use crate::common::builder::instruction::{TraceBuilder, alu_run};
use crate::common::harness::{TestContext, test_config};

// ══════════════════════════════════════════════════════════
// 1. Load queue capacity
// ══════════════════════════════════════════════════════════

#[test]
fn load_dispatches_into_last_free_slot_and_next_load_waits() {
    let mut config = test_config();
    config.core.lq_size = NUM_INSTR_SOURCE_MEMORY;
    let mut tc = TestContext::with_config(config);
    tc.push([
        TraceBuilder::new(0x1000).load(0x8000).load(0x9000).load(0xa000).dst(&[1]).build(),
        TraceBuilder::new(0x1004).load(0xb000).dst(&[2]).build(),
        TraceBuilder::new(0x1008).load(0xc000).dst(&[3]).build(),
    ]);

    assert!(tc.run_until(100, |c| c.rob.contains(&InstrId(1))));
    assert_eq!(tc.core.lq.free_slots(), 0);
    assert!(!tc.core.rob.contains(&InstrId(2)));

    // The third load stays at the head of the dispatch buffer until a slot frees.
    for _ in 0..100 {
        if tc.core.rob.contains(&InstrId(2)) {
            break;
        }
        assert_eq!(tc.core.lq.free_slots(), 0, "a free slot was left unused");
        assert_eq!(tc.core.dispatch_buffer.front(), Some(&InstrId(2)));
        tc.tick().unwrap();
    }

    assert!(tc.core.rob.contains(&InstrId(2)));
    tc.drain(200);
    assert_eq!(tc.core.num_retired, 3);
    assert_eq!(tc.l1d_reads(), 5);
}

#[test]
fn instruction_with_more_loads_than_slots_waits_for_all() {
    let mut config = test_config();
    config.core.lq_size = NUM_INSTR_SOURCE_MEMORY;
    let mut tc = TestContext::with_config(config);
    tc.push([
        TraceBuilder::new(0x1000).load(0x8000).build(),
        TraceBuilder::new(0x1004)
            .load(0x9000)
            .load(0xa000)
            .load(0xb000)
            .load(0xc000)
            .build(),
    ]);

    assert!(tc.run_until(100, |c| c.rob.contains(&InstrId(0))));
    assert!(!tc.core.rob.contains(&InstrId(1)), "three free slots cannot hold four loads");
    tc.drain(200);
    assert_eq!(tc.core.num_retired, 2);
}

// ══════════════════════════════════════════════════════════
// 2. Store queue and ROB capacity
// ══════════════════════════════════════════════════════════

#[test]
fn store_queue_full_blocks_dispatch() {
    let mut config = test_config();
    config.core.sq_size = NUM_INSTR_DESTINATION_MEMORY;
    let mut tc = TestContext::with_config(config);
    tc.l1d.lock().unwrap().reject_writes = true;
    tc.push([
        TraceBuilder::new(0x1000).store(0x8000).store(0x8080).build(),
        TraceBuilder::new(0x1004).store(0x8040).build(),
    ]);

    // The first instruction retires but its stores can never write, so they keep the whole SQ.
    assert!(tc.run_until(100, |c| c.num_retired == 1));
    for _ in 0..20 {
        tc.tick().unwrap();
    }
    assert_eq!(tc.core.sq.len(), 2);
    assert_eq!(tc.core.dispatch_buffer.front(), Some(&InstrId(1)));

    tc.l1d.lock().unwrap().reject_writes = false;
    tc.drain(200);
    assert_eq!(tc.l1d_writes(), 3);
}

#[test]
fn rob_never_exceeds_capacity() {
    let mut config = test_config();
    config.core.rob_size = 4;
    let mut tc = TestContext::with_config(config);
    tc.push(alu_run(0x1000, 40));

    for _ in 0..200 {
        if tc.core.is_drained() {
            break;
        }
        tc.tick().unwrap();
        assert!(tc.core.rob.len() <= 4);
    }
    assert_eq!(tc.core.num_retired, 40);
}

#[test]
fn dispatch_waits_one_full_cycle_after_decode() {
    let mut tc = TestContext::new();
    tc.push(alu_run(0x1000, 1));

    assert!(tc.run_until(100, |c| c.dispatch_buffer.contains(&InstrId(0))));
    let ready = tc.core.instr(InstrId(0)).map(|i| i.event_cycle).unwrap();

    // Dispatch requires the event cycle to be strictly in the past.
    while tc.core.current_cycle <= ready {
        tc.tick().unwrap();
        assert!(!tc.core.rob.contains(&InstrId(0)));
    }
    tc.tick().unwrap();
    assert!(tc.core.rob.contains(&InstrId(0)));
}
