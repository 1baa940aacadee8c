//! Deadlock detection.
//!
//! Every buffer stage checks its head after moving instructions. A head whose
//! last event is `deadlock_cycle` or more cycles old means the core can no
//! longer make progress; the core records a report, logs it, and halts.

use super::O3Core;
use crate::common::error::SimResult;
use crate::core::instruction::InstrId;
use crate::core::watchdog::{DeadlockReport, HeadSnapshot, LqSnapshot, SqSnapshot, StallPoint};

impl O3Core {
    /// Fails with a deadlock fault if the instruction at `head` has timed out.
    ///
    /// # Arguments
    ///
    /// * `point` - The buffer being checked.
    /// * `head` - Its head, if non-empty.
    ///
    /// # Errors
    ///
    /// Returns `SimError::Deadlock` when `event_cycle + deadlock_cycle <= current_cycle`.
    pub(crate) fn check_deadlock(&mut self, point: StallPoint, head: Option<InstrId>) -> SimResult<()> {
        let Some(instr) = head.and_then(|id| self.window.get(id)) else {
            return Ok(());
        };
        if instr.event_cycle.saturating_add(self.config.deadlock_cycle) > self.current_cycle {
            return Ok(());
        }

        let report = self.deadlock_report(point);
        tracing::error!(target: "o3sim::deadlock", cpu = self.cpu, cycle = self.current_cycle, "{report}");
        self.fault = Some(report.clone());
        Err(report.into())
    }

    /// Snapshots the core for a deadlock dump.
    pub fn deadlock_report(&self, point: StallPoint) -> DeadlockReport {
        let head = |id: Option<&InstrId>| id.and_then(|&id| self.window.get(id)).map(HeadSnapshot::from);
        let load_queue = self
            .lq
            .iter()
            .map(|(slot, e)| LqSnapshot {
                slot: slot.0,
                instr_id: e.instr_id,
                address: e.virtual_address,
                fetch_issued: e.fetch_issued,
                ready_cycle: e.ready_cycle,
                producer: e.producer_id,
            })
            .collect();
        let store_queue = self
            .sq
            .iter()
            .enumerate()
            .map(|(position, e)| SqSnapshot {
                position,
                instr_id: e.instr_id,
                address: e.virtual_address,
                fetch_issued: e.fetch_issued,
                ready_cycle: e.ready_cycle,
                waiting: e
                    .lq_dependents
                    .iter()
                    .filter_map(|&slot| self.lq.get(slot).map(|l| l.instr_id))
                    .collect(),
            })
            .collect();

        DeadlockReport {
            cpu: self.cpu,
            cycle: self.current_cycle,
            stalled_at: point,
            ifetch_head: head(self.ifetch_buffer.front()),
            rob_head: head(self.rob.front()),
            load_queue,
            store_queue,
        }
    }
}
