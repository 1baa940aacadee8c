//! Instruction Decode Stages.
//!
//! This module implements the two front-end moves after fetch. It performs the following:
//! 1. **Promotion:** Fetched heads of the IFETCH buffer enter the decode buffer.
//! 2. **Decoding:** Decode buffer entries whose latency has elapsed enter the dispatch buffer
//!    and are recorded in the DIB.
//! 3. **Early Resolution:** Branches whose target is encoded in the instruction (and conditional
//!    branches with a correctly predicted direction) resolve their misprediction at decode.

use crate::common::error::SimResult;
use crate::core::cpu::O3Core;
use crate::core::instruction::{BranchType, StageState};
use crate::core::watchdog::StallPoint;

/// Moves fetched instructions from the IFETCH buffer to the decode buffer.
///
/// Instructions already decoded through the DIB skip the decode latency.
///
/// # Arguments
///
/// * `core` - Mutable reference to the core state
///
/// # Errors
///
/// Returns the deadlock fault if the IFETCH head has timed out.
pub fn promote_stage(core: &mut O3Core) -> SimResult<()> {
    let cycle = core.current_cycle;
    let mut promote_bw = core.config.fetch_width;

    while promote_bw > 0
        && core.decode_buffer.len() < core.config.decode_buffer_size
        && let Some(&head) = core.ifetch_buffer.front()
        && let Some(instr) = core.window.get_mut(head)
        && instr.fetched == StageState::Completed
    {
        let dib_hit = instr.decoded.is_started();
        if !dib_hit {
            core.stats.dib_misses += 1;
        }
        let latency = if core.warmup || dib_hit { 0 } else { core.config.decode_latency };
        let _ = instr.decoded.advance(StageState::Inflight);
        instr.event_cycle = cycle + latency;

        let _ = core.ifetch_buffer.pop_front();
        core.decode_buffer.push_back(head);
        promote_bw -= 1;

        tracing::debug!(target: "o3sim::fetch", instr_id = head.0, event_cycle = cycle + latency, "promoted to decode");
    }

    let head = core.ifetch_buffer.front().copied();
    core.check_deadlock(StallPoint::IfetchBuffer, head)
}

/// Moves decoded instructions to the dispatch buffer.
///
/// # Arguments
///
/// * `core` - Mutable reference to the core state
///
/// # Errors
///
/// Returns the deadlock fault if the decode buffer head has timed out.
pub fn decode_stage(core: &mut O3Core) -> SimResult<()> {
    let cycle = core.current_cycle;
    let latency = if core.warmup { 0 } else { core.config.dispatch_latency };
    let mut decode_bw = core.config.decode_width;

    while decode_bw > 0
        && core.dispatch_buffer.len() < core.config.dispatch_buffer_size
        && let Some(&head) = core.decode_buffer.front()
        && let Some(instr) = core.window.get_mut(head)
        && instr.event_cycle <= cycle
    {
        core.dib.fill_cache(instr.ip, true);

        if instr.branch_mispredicted && resolves_at_decode(instr.branch_type, instr.branch_taken, instr.branch_prediction)
        {
            instr.branch_mispredicted = false;
            core.fetch_resume_cycle = Some(cycle + core.config.mispredict_penalty);
            tracing::debug!(target: "o3sim::fetch", instr_id = head.0, resume = cycle + core.config.mispredict_penalty, "misprediction resolved at decode");
        }

        let _ = instr.decoded.advance(StageState::Completed);
        instr.event_cycle = cycle + latency;

        let _ = core.decode_buffer.pop_front();
        core.dispatch_buffer.push_back(head);
        decode_bw -= 1;
    }

    let head = core.decode_buffer.front().copied();
    core.check_deadlock(StallPoint::DecodeBuffer, head)
}

/// Whether a mispredicted branch of this kind is known to be wrong at decode:
/// the target is encoded, or the direction was right and only the target missed.
fn resolves_at_decode(branch_type: BranchType, taken: bool, prediction: bool) -> bool {
    branch_type.resolves_at_decode() || (branch_type == BranchType::Conditional && taken == prediction)
}
