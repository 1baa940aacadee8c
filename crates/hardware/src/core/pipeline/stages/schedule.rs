//! Schedule Stage.
//!
//! Walks the ROB oldest first and registers the register dependency edges of
//! every unscheduled instruction. The walk is bounded by the scheduler size,
//! counted in entries that have not started executing.

use crate::core::cpu::O3Core;
use crate::core::instruction::{InstrId, StageState};

/// Executes the schedule stage.
///
/// # Arguments
///
/// * `core` - Mutable reference to the core state
pub fn schedule_stage(core: &mut O3Core) {
    let mut search_bw = core.config.scheduler_size;

    for idx in 0..core.rob.len() {
        if search_bw == 0 {
            break;
        }
        let id = core.rob[idx];
        let Some(instr) = core.window.get(id) else {
            continue;
        };
        let unscheduled = instr.scheduled == StageState::NotStarted;
        let unexecuted = instr.executed == StageState::NotStarted;

        if unscheduled {
            do_scheduling(core, id);
        }
        if unexecuted {
            search_bw -= 1;
        }
    }
}

/// Links `id` to the producers of its sources and records it as the producer
/// of its destinations.
fn do_scheduling(core: &mut O3Core, id: InstrId) {
    let cycle = core.current_cycle;
    let latency = if core.warmup { 0 } else { core.config.scheduling_latency };
    let Some(instr) = core.window.get(id) else {
        return;
    };
    let sources = instr.source_registers.clone();
    let destinations = instr.destination_registers.clone();

    let mut edges = 0;
    for reg in sources {
        let Some(producer_id) = core.producers.latest_before(reg, id) else {
            continue;
        };
        let Some(producer) = core.window.get_mut(producer_id) else {
            continue;
        };
        // A repeated source register links to the same producer only once.
        if producer.reg_dependents.last() != Some(&id) {
            producer.reg_dependents.push(id);
            edges += 1;
        }
    }

    for reg in destinations {
        let _ = core.producers.insert(reg, id);
    }

    if let Some(instr) = core.window.get_mut(id) {
        instr.num_reg_dependent += edges;
        let _ = instr.scheduled.advance(StageState::Completed);
        instr.event_cycle = cycle + latency;
        tracing::debug!(target: "o3sim::rob", instr_id = id.0, dependencies = instr.num_reg_dependent, "scheduled");
    }
}
