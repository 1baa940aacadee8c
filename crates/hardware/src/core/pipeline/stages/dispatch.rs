//! Dispatch Stage.
//!
//! Moves decoded instructions from the dispatch buffer into the ROB in program
//! order. An instruction dispatches only when the ROB has room and the load and
//! store queues can hold every one of its memory operands.

use super::memory::schedule_memory;
use crate::common::error::SimResult;
use crate::core::cpu::O3Core;
use crate::core::watchdog::StallPoint;

/// Executes the dispatch stage.
///
/// # Arguments
///
/// * `core` - Mutable reference to the core state
///
/// # Errors
///
/// Returns the deadlock fault if the dispatch buffer head has timed out.
pub fn dispatch_stage(core: &mut O3Core) -> SimResult<()> {
    let cycle = core.current_cycle;
    let mut dispatch_bw = core.config.dispatch_width;

    while dispatch_bw > 0
        && let Some(&head) = core.dispatch_buffer.front()
        && let Some(instr) = core.window.get(head)
    {
        let fits = instr.event_cycle < cycle
            && core.rob.len() < core.config.rob_size
            && core.lq.free_slots() >= instr.source_memory.len()
            && core.sq.len() + instr.destination_memory.len() <= core.sq.capacity();
        if !fits {
            break;
        }

        let _ = core.dispatch_buffer.pop_front();
        core.rob.push_back(head);
        schedule_memory(core, head);
        dispatch_bw -= 1;

        tracing::debug!(target: "o3sim::rob", instr_id = head.0, cycle, rob = core.rob.len(), "dispatched");
    }

    let head = core.dispatch_buffer.front().copied();
    core.check_deadlock(StallPoint::DispatchBuffer, head)
}
