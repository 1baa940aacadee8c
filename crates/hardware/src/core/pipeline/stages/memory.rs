//! Memory Stages.
//!
//! This module moves memory operations between the core and its two cache buses.
//! It performs the following:
//! 1. **Memory Return:** Drains instruction-cache responses into fetched flags and
//!    data-cache responses into load completions.
//! 2. **Store Queue:** Finishes ready stores, wakes the loads forwarding from them,
//!    and writes retired stores to the data cache in program order.
//! 3. **Load Queue:** Issues data-cache reads for ready loads that have no store to forward from.
//! 4. **Memory Scheduling:** Allocates LQ/SQ entries for a newly dispatched instruction
//!    and links loads to the store they forward from.

use crate::core::cpu::O3Core;
use crate::core::instruction::{InstrId, StageState};
use crate::core::pipeline::lsq::{LqEntry, LqSlot, SqEntry};
use crate::soc::bus::MemPacket;

/// Drains completed cache responses.
///
/// # Arguments
///
/// * `core` - Mutable reference to the core state
pub fn memory_return_stage(core: &mut O3Core) {
    let cycle = core.current_cycle;
    let log2_block = core.config.log2_block_size;

    let mut l1i_bw = core.config.fetch_width;
    let mut to_read = core.l1i_bus.max_read();
    while l1i_bw > 0 && to_read > 0 {
        let Some(packet) = core.l1i_bus.processed_mut().front_mut() else {
            break;
        };
        let block = packet.v_address >> log2_block;
        while l1i_bw > 0
            && let Some(dep) = packet.instr_depend_on_me.pop_front()
        {
            if let Some(instr) = core.window.get_mut(dep)
                && instr.ip >> log2_block == block
                && instr.fetched.is_started()
            {
                let _ = instr.fetched.advance(StageState::Completed);
                l1i_bw -= 1;
                tracing::debug!(target: "o3sim::fetch", instr_id = dep.0, cycle, "fetch complete");
            }
        }
        if packet.instr_depend_on_me.is_empty() {
            let _ = core.l1i_bus.processed_mut().pop_front();
        }
        to_read -= 1;
    }

    let mut dcache_bw = core.l1d_bus.max_read();
    while dcache_bw > 0
        && let Some(packet) = core.l1d_bus.processed_mut().pop_front()
    {
        let block = packet.v_address >> log2_block;
        let returned: Vec<LqSlot> = core
            .lq
            .iter()
            .filter(|(_, e)| e.fetch_issued && e.virtual_address >> log2_block == block)
            .map(|(slot, _)| slot)
            .collect();
        for slot in returned {
            if let Some(entry) = core.lq.release(slot) {
                finish_memory_op(core, entry.instr_id);
                tracing::debug!(target: "o3sim::lsq", instr_id = entry.instr_id.0, address = entry.virtual_address, "load returned");
            }
        }
        dcache_bw -= 1;
    }
}

/// Operates the store and load queues for one cycle.
///
/// # Arguments
///
/// * `core` - Mutable reference to the core state
pub fn lsq_stage(core: &mut O3Core) {
    let cycle = core.current_cycle;
    let mut store_bw = core.config.sq_width;

    for idx in 0..core.sq.len() {
        if store_bw == 0 {
            break;
        }
        let Some(entry) = core.sq.get_mut(idx) else {
            break;
        };
        if entry.fetch_issued || !entry.ready_before(cycle) {
            continue;
        }
        entry.fetch_issued = true;
        entry.ready_cycle = Some(cycle);
        let owner = entry.instr_id;
        let waiting = std::mem::take(&mut entry.lq_dependents);

        finish_memory_op(core, owner);
        for slot in waiting {
            if let Some(load) = core.lq.release(slot) {
                finish_memory_op(core, load.instr_id);
                tracing::debug!(target: "o3sim::lsq", instr_id = load.instr_id.0, store_id = owner.0, "load forwarded");
            }
        }
        store_bw -= 1;
        tracing::debug!(target: "o3sim::lsq", instr_id = owner.0, cycle, "store finished");
    }

    // Only stores whose instruction has retired write to the cache.
    let rob_head = core.rob.front().copied();
    while store_bw > 0
        && let Some(front) = core.sq.front()
        && rob_head.is_none_or(|head| front.instr_id < head)
        && front.ready_before(cycle)
    {
        let packet = MemPacket::new(front.virtual_address, front.instr_id, front.ip);
        if !core.l1d_bus.issue_write(packet) {
            break;
        }
        if let Some(store) = core.sq.pop_front() {
            tracing::debug!(target: "o3sim::lsq", instr_id = store.instr_id.0, address = store.virtual_address, "store written");
        }
        store_bw -= 1;
    }

    let mut load_bw = core.config.lq_width;
    let ready: Vec<LqSlot> = core
        .lq
        .iter()
        .filter(|(_, e)| e.can_issue(cycle))
        .map(|(slot, _)| slot)
        .collect();
    for slot in ready {
        if load_bw == 0 {
            break;
        }
        let Some(entry) = core.lq.get_mut(slot) else {
            continue;
        };
        let packet = MemPacket::new(entry.virtual_address, entry.instr_id, entry.ip);
        if core.l1d_bus.issue_read(packet) {
            entry.fetch_issued = true;
            load_bw -= 1;
            tracing::debug!(target: "o3sim::lsq", instr_id = entry.instr_id.0, address = entry.virtual_address, "load issued");
        }
    }
}

/// Allocates the LQ and SQ entries of a just-dispatched instruction.
///
/// Loads forward from the nearest older store to the same address: at once if
/// that store has finished, otherwise by waiting on it.
///
/// # Arguments
///
/// * `core` - Mutable reference to the core state
/// * `id` - The instruction entering the ROB
pub(crate) fn schedule_memory(core: &mut O3Core, id: InstrId) {
    let Some(instr) = core.window.get(id) else {
        return;
    };
    let ip = instr.ip;
    let loads = instr.source_memory.clone();
    let stores = instr.destination_memory.clone();

    for address in loads {
        let Some(slot) = core.lq.allocate(LqEntry::new(id, address, ip)) else {
            tracing::error!(target: "o3sim::lsq", instr_id = id.0, "load queue full at dispatch");
            break;
        };
        let Some(position) = core.sq.find_forwarding_store(address, id) else {
            continue;
        };
        let Some(store) = core.sq.get_mut(position) else {
            continue;
        };
        if store.fetch_issued {
            let _ = core.lq.release(slot);
            finish_memory_op(core, id);
            tracing::debug!(target: "o3sim::lsq", instr_id = id.0, address, "load forwarded at dispatch");
        } else {
            store.lq_dependents.push(slot);
            let store_id = store.instr_id;
            if let Some(load) = core.lq.get_mut(slot) {
                load.producer_id = Some(store_id);
            }
        }
    }

    for address in stores {
        let pushed = core.sq.push(SqEntry::new(id, address, ip));
        debug_assert!(pushed, "store queue full at dispatch");
    }
}

/// Retires one outstanding memory operation of `id`.
fn finish_memory_op(core: &mut O3Core, id: InstrId) {
    let cycle = core.current_cycle;
    if let Some(instr) = core.window.get_mut(id) {
        debug_assert!(instr.num_mem_ops > 0, "memory operation underflow on {id}");
        instr.num_mem_ops = instr.num_mem_ops.saturating_sub(1);
        instr.event_cycle = cycle;
    }
}
