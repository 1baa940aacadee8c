//! Retire Stage.
//!
//! Removes completed instructions from the head of the ROB, in program order,
//! up to the retire width. The instruction leaves the window here; any id that
//! still refers to it simply stops resolving.

use crate::common::error::SimResult;
use crate::core::cpu::O3Core;
use crate::core::instruction::StageState;
use crate::core::watchdog::StallPoint;

/// Executes the retire stage.
///
/// # Arguments
///
/// * `core` - Mutable reference to the core state
///
/// # Errors
///
/// Returns the deadlock fault if the ROB head has timed out after retirement.
pub fn retire_stage(core: &mut O3Core) -> SimResult<()> {
    let mut retire_bandwidth = core.config.retire_width;

    while retire_bandwidth > 0
        && let Some(&head) = core.rob.front()
        && core.window.get(head).is_some_and(|i| i.executed == StageState::Completed)
    {
        let _ = core.rob.pop_front();
        // ROB order is program order and the window front is always the oldest in-flight id.
        debug_assert_eq!(core.window.oldest().map(|i| i.id), Some(head));
        let _ = core.window.pop_oldest();
        core.num_retired += 1;
        core.stats.instructions_retired = core.num_retired;
        retire_bandwidth -= 1;

        tracing::debug!(target: "o3sim::rob", instr_id = head.0, "retired");
    }

    let head = core.rob.front().copied();
    core.check_deadlock(StallPoint::Rob, head)
}
