//! Execute Stages.
//!
//! Two passes over the ROB share the execute width:
//! 1. **Complete:** In-flight executions whose latency has elapsed and whose memory
//!    operations are all done release their register dependents.
//! 2. **Execute:** Scheduled instructions with no outstanding producers start executing,
//!    and their load/store queue entries become ready at the same cycle.

use crate::core::cpu::O3Core;
use crate::core::instruction::{InstrId, StageState};

/// Completes in-flight executions.
///
/// For each completed instruction the producer map entries are removed, every
/// dependent loses one outstanding producer (becoming fully scheduled at zero),
/// and an unresolved misprediction schedules the fetch resume.
///
/// # Arguments
///
/// * `core` - Mutable reference to the core state
pub fn complete_stage(core: &mut O3Core) {
    let cycle = core.current_cycle;
    let mut complete_bw = core.config.execute_width;

    for idx in 0..core.rob.len() {
        if complete_bw == 0 {
            break;
        }
        let id = core.rob[idx];
        let Some(instr) = core.window.get_mut(id) else {
            continue;
        };
        if instr.executed != StageState::Inflight || instr.event_cycle > cycle || instr.num_mem_ops != 0 {
            continue;
        }

        let _ = instr.executed.advance(StageState::Completed);
        let mispredicted = instr.branch_mispredicted;
        let dependents = std::mem::take(&mut instr.reg_dependents);
        for &reg in &instr.destination_registers {
            let removed = core.producers.remove(reg, id);
            debug_assert!(removed, "producer {id} missing for register {reg}");
        }

        release_dependents(core, &dependents);

        if mispredicted {
            core.fetch_resume_cycle = Some(cycle + core.config.mispredict_penalty);
        }
        complete_bw -= 1;

        tracing::debug!(target: "o3sim::rob", instr_id = id.0, cycle, "execution complete");
    }
}

fn release_dependents(core: &mut O3Core, dependents: &[InstrId]) {
    for &dep in dependents {
        if let Some(consumer) = core.window.get_mut(dep) {
            debug_assert!(consumer.num_reg_dependent > 0);
            consumer.num_reg_dependent = consumer.num_reg_dependent.saturating_sub(1);
            if consumer.num_reg_dependent == 0 {
                let _ = consumer.scheduled.advance(StageState::Completed);
            }
        }
    }
}

/// Starts execution of ready instructions, oldest first.
///
/// # Arguments
///
/// * `core` - Mutable reference to the core state
pub fn execute_stage(core: &mut O3Core) {
    let cycle = core.current_cycle;
    let latency = if core.warmup { 0 } else { core.config.execute_latency };
    let mut exec_bw = core.config.execute_width;

    for idx in 0..core.rob.len() {
        if exec_bw == 0 {
            break;
        }
        let id = core.rob[idx];
        let Some(instr) = core.window.get_mut(id) else {
            continue;
        };
        let ready = instr.scheduled == StageState::Completed
            && instr.executed == StageState::NotStarted
            && instr.num_reg_dependent == 0
            && instr.event_cycle <= cycle;
        if !ready {
            continue;
        }

        let _ = instr.executed.advance(StageState::Inflight);
        instr.event_cycle = cycle + latency;
        core.lq.mark_ready(id, cycle + latency);
        core.sq.mark_ready(id, cycle + latency);
        exec_bw -= 1;

        tracing::debug!(target: "o3sim::rob", instr_id = id.0, event_cycle = cycle + latency, "execute");
    }
}
