//! Instruction Fetch Stages.
//!
//! This module implements the front of the pipeline. It performs the following:
//! 1. **Fetch Resume:** Releases a misprediction stall once its resume cycle arrives.
//! 2. **Instruction Cache Requests:** Batches unfetched IFETCH entries by cache block
//!    and issues one read per block.
//! 3. **DIB Lookup:** Entries whose ip hits the decoded instruction buffer skip fetch and decode.
//! 4. **Initialization:** Turns trace records into in-flight instructions, classifying,
//!    predicting and checking each branch on the way in.

use crate::core::branch::classify_instruction;
use crate::core::cpu::O3Core;
use crate::core::instruction::{BranchType, InstrId, Instruction, StageState};
use crate::soc::bus::MemPacket;

/// Clears a fetch stall whose resume cycle has been reached.
///
/// # Arguments
///
/// * `core` - Mutable reference to the core state
pub fn resume_fetch(core: &mut O3Core) {
    if core.fetch_stall
        && let Some(resume) = core.fetch_resume_cycle
        && core.current_cycle >= resume
    {
        core.fetch_stall = false;
        core.fetch_resume_cycle = None;
        tracing::debug!(target: "o3sim::fetch", cycle = core.current_cycle, "fetch resumed");
    }
}

/// Issues instruction cache reads for the unfetched part of the IFETCH buffer.
///
/// Starting at the first unfetched entry, each run of consecutive entries in
/// one cache block becomes one request. At most `max_read` requests go out per
/// cycle; the first rejection ends the stage.
///
/// # Arguments
///
/// * `core` - Mutable reference to the core state
pub fn fetch_stage(core: &mut O3Core) {
    let log2_block = core.config.log2_block_size;
    let mut to_read = core.l1i_bus.max_read();
    let mut begin = first_unfetched(core, 0);

    while to_read > 0
        && let Some(start) = begin
    {
        let batch = block_run(core, start, log2_block);
        let Some(&first) = batch.first() else {
            break;
        };
        let Some(ip) = core.window.get(first).map(|i| i.ip) else {
            break;
        };

        let packet = MemPacket::new(ip, first, ip).with_dependents(batch.iter().copied());
        if !core.l1i_bus.issue_read(packet) {
            break;
        }
        for &id in &batch {
            if let Some(instr) = core.window.get_mut(id)
                && instr.fetched == StageState::NotStarted
            {
                instr.fetched = StageState::Inflight;
            }
        }
        tracing::debug!(target: "o3sim::fetch", instr_id = first.0, ip, batch = batch.len(), "fetch issued");

        to_read -= 1;
        begin = first_unfetched(core, start + batch.len());
    }
}

/// Position of the first IFETCH entry at or after `from` that has not started fetching.
fn first_unfetched(core: &O3Core, from: usize) -> Option<usize> {
    core.ifetch_buffer
        .iter()
        .skip(from)
        .position(|&id| core.window.get(id).is_some_and(|i| !i.fetched.is_started()))
        .map(|offset| from + offset)
}

/// The ids of the run of IFETCH entries starting at `start` that share a cache block.
fn block_run(core: &O3Core, start: usize, log2_block: u32) -> Vec<InstrId> {
    let mut run = Vec::new();
    let mut block = None;
    for &id in core.ifetch_buffer.iter().skip(start) {
        let Some(instr) = core.window.get(id) else {
            break;
        };
        let this_block = instr.ip >> log2_block;
        if block.is_some_and(|b| b != this_block) {
            break;
        }
        block = Some(this_block);
        run.push(id);
    }
    run
}

/// Looks up the first `fetch_width` IFETCH entries in the DIB.
///
/// Every cycle re-probes the whole prefix, so an entry that missed earlier can
/// still hit once an older instruction in its window decodes. A hit completes
/// both fetch and decode.
///
/// # Arguments
///
/// * `core` - Mutable reference to the core state
pub fn dib_check_stage(core: &mut O3Core) {
    let cycle = core.current_cycle;
    let width = core.config.fetch_width;

    for idx in 0..core.ifetch_buffer.len().min(width) {
        let id = core.ifetch_buffer[idx];
        let Some(instr) = core.window.get_mut(id) else {
            continue;
        };
        if !core.dib.check_hit(instr.ip) {
            continue;
        }

        let _ = instr.fetched.advance(StageState::Completed);
        if instr.decoded.advance(StageState::Completed) {
            core.stats.dib_hits += 1;
            tracing::debug!(target: "o3sim::fetch", instr_id = id.0, ip = instr.ip, "DIB hit");
        }
        instr.event_cycle = cycle;
    }
}

/// Initializes trace records into the IFETCH buffer.
///
/// # Arguments
///
/// * `core` - Mutable reference to the core state
pub fn initialize_stage(core: &mut O3Core) {
    while !core.fetch_stall
        && core.instrs_to_read_this_cycle > 0
        && let Some(record) = core.input_queue.pop_front()
    {
        core.instrs_to_read_this_cycle -= 1;

        let id = core.next_instr_id;
        let mut instr = Instruction::from_trace(id, record);
        let _ = classify_instruction(&mut instr);
        core.stats.current.total_branch_types[instr.branch_type.index()] += 1;

        if instr.is_branch {
            predict_and_check(core, &mut instr);
        }

        instr.event_cycle = core.current_cycle;
        if core.warmup {
            instr.source_registers.clear();
            instr.destination_registers.clear();
        }

        tracing::debug!(target: "o3sim::fetch", instr_id = id.0, ip = instr.ip, branch = %instr.branch_type, "initialized");
        core.window.push(instr);
        core.ifetch_buffer.push_back(id);
        core.next_instr_id = id.next();
    }
}

/// Predicts a branch, flags a misprediction and trains the predictors.
fn predict_and_check(core: &mut O3Core, instr: &mut Instruction) {
    let (mut predicted_target, always_taken) = core.btb.btb_prediction(instr.ip, instr.branch_type);
    let prediction = core
        .branch_predictor
        .predict_branch(instr.ip, predicted_target, always_taken, instr.branch_type);
    if !prediction && !always_taken {
        predicted_target = 0;
    }
    instr.branch_prediction = prediction;

    core.prefetcher
        .branch_operate(instr.ip, instr.branch_type, predicted_target);

    let wrong_direction = instr.branch_type == BranchType::Conditional && instr.branch_taken != prediction;
    if predicted_target != instr.branch_target || wrong_direction {
        let phase = &mut core.stats.current;
        phase.total_rob_occupancy_at_branch_mispredict += core.rob.len() as u64;
        phase.branch_type_misses[instr.branch_type.index()] += 1;
        if !core.warmup {
            core.fetch_stall = true;
            core.instrs_to_read_this_cycle = 0;
            instr.branch_mispredicted = true;
            tracing::debug!(target: "o3sim::fetch", instr_id = instr.id.0, predicted = predicted_target, actual = instr.branch_target, "branch mispredicted");
        }
    } else if instr.branch_taken {
        // A taken branch redirects fetch; nothing after it is read this cycle.
        core.instrs_to_read_this_cycle = 0;
    }

    core.btb
        .update_btb(instr.ip, instr.branch_target, instr.branch_taken, instr.branch_type);
    core.branch_predictor
        .last_branch_result(instr.ip, instr.branch_target, instr.branch_taken, instr.branch_type);
}
