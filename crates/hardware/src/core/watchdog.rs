//! Progress monitoring.
//!
//! This module watches a core for forward progress. It provides:
//! 1. **Deadlock Reports:** A snapshot of the stalled buffer, the IFETCH and ROB heads,
//!    and every load/store queue entry, rendered as a human-readable dump.
//! 2. **Heartbeat:** Periodic IPC samples taken every N retired instructions.

use std::fmt;

use crate::core::instruction::{InstrId, Instruction, StageState};

/// Buffer whose head stopped advancing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StallPoint {
    /// Waiting for instruction fetch.
    IfetchBuffer,
    /// Waiting to enter the dispatch buffer.
    DecodeBuffer,
    /// Waiting to enter the ROB.
    DispatchBuffer,
    /// Waiting to retire.
    Rob,
}

impl fmt::Display for StallPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::IfetchBuffer => "IFETCH_BUFFER",
            Self::DecodeBuffer => "DECODE_BUFFER",
            Self::DispatchBuffer => "DISPATCH_BUFFER",
            Self::Rob => "ROB",
        })
    }
}

/// State of a buffer head at the time of the fault.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeadSnapshot {
    /// Instruction id.
    pub instr_id: InstrId,
    /// Instruction pointer.
    pub ip: u64,
    /// Fetch progress.
    pub fetched: StageState,
    /// Decode progress.
    pub decoded: StageState,
    /// Scheduling progress.
    pub scheduled: StageState,
    /// Execution progress.
    pub executed: StageState,
    /// Unresolved register producers.
    pub num_reg_dependent: usize,
    /// Unfinished memory operations.
    pub num_mem_ops: usize,
    /// Last event cycle.
    pub event_cycle: u64,
}

impl From<&Instruction> for HeadSnapshot {
    fn from(instr: &Instruction) -> Self {
        Self {
            instr_id: instr.id,
            ip: instr.ip,
            fetched: instr.fetched,
            decoded: instr.decoded,
            scheduled: instr.scheduled,
            executed: instr.executed,
            num_reg_dependent: instr.num_reg_dependent,
            num_mem_ops: instr.num_mem_ops,
            event_cycle: instr.event_cycle,
        }
    }
}

impl fmt::Display for HeadSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "instr_id: {} ip: {:#x} fetched: {:?} decoded: {:?} scheduled: {:?} executed: {:?} \
             num_reg_dependent: {} num_mem_ops: {} event: {}",
            self.instr_id,
            self.ip,
            self.fetched,
            self.decoded,
            self.scheduled,
            self.executed,
            self.num_reg_dependent,
            self.num_mem_ops,
            self.event_cycle
        )
    }
}

/// One occupied load queue slot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LqSnapshot {
    /// Slot index.
    pub slot: usize,
    /// Owning instruction.
    pub instr_id: InstrId,
    /// Address.
    pub address: u64,
    /// Whether the read was accepted.
    pub fetch_issued: bool,
    /// Ready cycle, if executed.
    pub ready_cycle: Option<u64>,
    /// Store the load waits on.
    pub producer: Option<InstrId>,
}

/// One store queue entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SqSnapshot {
    /// Queue position (0 is the oldest).
    pub position: usize,
    /// Owning instruction.
    pub instr_id: InstrId,
    /// Address.
    pub address: u64,
    /// Whether the store has finished.
    pub fetch_issued: bool,
    /// Ready cycle, if executed.
    pub ready_cycle: Option<u64>,
    /// Owners of the loads waiting on this store.
    pub waiting: Vec<InstrId>,
}

/// Everything known about a core when it was declared deadlocked.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeadlockReport {
    /// Core number.
    pub cpu: usize,
    /// Cycle of detection.
    pub cycle: u64,
    /// Buffer whose head timed out.
    pub stalled_at: StallPoint,
    /// IFETCH buffer head.
    pub ifetch_head: Option<HeadSnapshot>,
    /// ROB head.
    pub rob_head: Option<HeadSnapshot>,
    /// Occupied load queue slots.
    pub load_queue: Vec<LqSnapshot>,
    /// Store queue entries, oldest first.
    pub store_queue: Vec<SqSnapshot>,
}

fn fmt_ready(ready: Option<u64>) -> String {
    ready.map_or_else(|| "never".to_owned(), |c| c.to_string())
}

impl fmt::Display for DeadlockReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "DEADLOCK! CPU {} cycle {} stalled at {}", self.cpu, self.cycle, self.stalled_at)?;
        match &self.ifetch_head {
            Some(head) => writeln!(f, "IFETCH_BUFFER head {head}")?,
            None => writeln!(f, "IFETCH_BUFFER empty")?,
        }
        match &self.rob_head {
            Some(head) => writeln!(f, "ROB head {head}")?,
            None => writeln!(f, "ROB empty")?,
        }

        writeln!(f, "Load Queue Entry")?;
        for lq in &self.load_queue {
            write!(
                f,
                "[LQ] entry: {} instr_id: {} address: {:#x} fetch_issued: {} event_cycle: {}",
                lq.slot,
                lq.instr_id,
                lq.address,
                lq.fetch_issued,
                fmt_ready(lq.ready_cycle)
            )?;
            if let Some(producer) = lq.producer {
                write!(f, " waits on {producer}")?;
            }
            writeln!(f)?;
        }

        writeln!(f, "Store Queue Entry")?;
        for sq in &self.store_queue {
            write!(
                f,
                "[SQ] entry: {} instr_id: {} address: {:#x} fetched: {} event_cycle: {} LQ waiting:",
                sq.position,
                sq.instr_id,
                sq.address,
                sq.fetch_issued,
                fmt_ready(sq.ready_cycle)
            )?;
            for waiter in &sq.waiting {
                write!(f, " {waiter}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// One heartbeat sample.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeartbeatSample {
    /// Instructions retired so far.
    pub instructions: u64,
    /// Current cycle.
    pub cycles: u64,
    /// IPC since the previous heartbeat.
    pub heartbeat_ipc: f64,
    /// IPC since the start of the current phase.
    pub cumulative_ipc: f64,
}

/// Heartbeat schedule.
#[derive(Clone, Debug)]
pub struct Heartbeat {
    period: u64,
    next_print: u64,
    last_instr: u64,
    last_cycle: u64,
}

#[allow(clippy::cast_precision_loss)]
fn ratio(num: u64, den: u64) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

impl Heartbeat {
    /// Creates a schedule that fires every `period` retired instructions.
    pub const fn new(period: u64) -> Self {
        Self {
            period,
            next_print: period,
            last_instr: 0,
            last_cycle: 0,
        }
    }

    /// Takes a sample if `retired` has reached the next heartbeat.
    ///
    /// # Arguments
    ///
    /// * `retired` - Instructions retired so far.
    /// * `cycle` - Current cycle.
    /// * `phase_start` - `(instructions, cycle)` at the start of the current phase.
    pub fn poll(&mut self, retired: u64, cycle: u64, phase_start: (u64, u64)) -> Option<HeartbeatSample> {
        if self.period == 0 || retired < self.next_print {
            return None;
        }
        let sample = HeartbeatSample {
            instructions: retired,
            cycles: cycle,
            heartbeat_ipc: ratio(retired - self.last_instr, cycle.saturating_sub(self.last_cycle)),
            cumulative_ipc: ratio(retired.saturating_sub(phase_start.0), cycle.saturating_sub(phase_start.1)),
        };
        self.next_print += self.period;
        self.last_instr = retired;
        self.last_cycle = cycle;
        Some(sample)
    }
}
