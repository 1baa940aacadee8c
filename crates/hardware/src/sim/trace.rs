//! Instruction Trace Sources.
//!
//! This module provides the instruction sources the simulator reads from. It provides:
//! 1. **Source Interface:** `InstructionSource`, a lazy, finite, non-restartable record stream.
//! 2. **JSON Lines Reader:** One record per line, with unused operand slots dropped, operand
//!    lists capped at the per-instruction limits, and branch targets filled from the next record.
//! 3. **In-Memory Source:** `VecSource`, for tests and generated workloads.

use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::common::constants::{
    NUM_INSTR_DESTINATION_MEMORY, NUM_INSTR_DESTINATIONS, NUM_INSTR_SOURCE_MEMORY, NUM_INSTR_SOURCES,
};
use crate::common::error::TraceError;
use crate::core::instruction::TraceInstr;

/// A stream of trace records.
pub trait InstructionSource: Send {
    /// Returns the next record, or `None` once the source is exhausted.
    ///
    /// # Errors
    ///
    /// Returns `TraceError` if the underlying input cannot be read or parsed.
    fn next_record(&mut self) -> Result<Option<TraceInstr>, TraceError>;
}

/// Reads JSON-lines trace records.
///
/// Each non-blank line holds one object with `ip`, `taken`, `src_regs`,
/// `dst_regs`, `src_mem` and `dst_mem` (all optional except `ip`). The reader
/// looks one record ahead so a record without a target can take the next
/// record's ip as its branch target.
#[derive(Debug)]
pub struct JsonLinesTrace<R> {
    reader: R,
    line: usize,
    lookahead: Option<TraceInstr>,
    started: bool,
}

impl JsonLinesTrace<BufReader<File>> {
    /// Opens a trace file.
    ///
    /// # Errors
    ///
    /// Returns `TraceError::Io` if the file cannot be opened.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, TraceError> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> JsonLinesTrace<R> {
    /// Wraps a buffered reader.
    pub const fn new(reader: R) -> Self {
        Self {
            reader,
            line: 0,
            lookahead: None,
            started: false,
        }
    }

    /// One-based number of the last line read.
    pub const fn line(&self) -> usize {
        self.line
    }

    fn read_one(&mut self) -> Result<Option<TraceInstr>, TraceError> {
        let mut buf = String::new();
        loop {
            buf.clear();
            if self.reader.read_line(&mut buf)? == 0 {
                return Ok(None);
            }
            self.line += 1;
            let text = buf.trim();
            if text.is_empty() {
                continue;
            }
            let record: TraceInstr =
                serde_json::from_str(text).map_err(|source| TraceError::Parse { line: self.line, source })?;
            return Ok(Some(normalize(record, self.line)));
        }
    }
}

impl<R: BufRead + Send> InstructionSource for JsonLinesTrace<R> {
    fn next_record(&mut self) -> Result<Option<TraceInstr>, TraceError> {
        if !self.started {
            self.started = true;
            self.lookahead = self.read_one()?;
        }
        let Some(mut current) = self.lookahead.take() else {
            return Ok(None);
        };
        self.lookahead = self.read_one()?;
        if current.branch_target == 0
            && let Some(next) = &self.lookahead
        {
            current.branch_target = next.ip;
        }
        Ok(Some(current))
    }
}

/// Drops unused slots and caps operand lists at the per-instruction limits.
fn normalize(mut record: TraceInstr, line: usize) -> TraceInstr {
    record.source_registers.retain(|&r| r != 0);
    record.destination_registers.retain(|&r| r != 0);
    record.source_memory.retain(|&a| a != 0);
    record.destination_memory.retain(|&a| a != 0);

    cap(&mut record.source_registers, NUM_INSTR_SOURCES, "source registers", line);
    cap(&mut record.destination_registers, NUM_INSTR_DESTINATIONS, "destination registers", line);
    cap(&mut record.source_memory, NUM_INSTR_SOURCE_MEMORY, "source memory operands", line);
    cap(&mut record.destination_memory, NUM_INSTR_DESTINATION_MEMORY, "destination memory operands", line);
    record
}

fn cap<T>(list: &mut Vec<T>, limit: usize, what: &str, line: usize) {
    if list.len() > limit {
        tracing::warn!(target: "o3sim::trace", line, count = list.len(), limit, "truncating {what}");
        list.truncate(limit);
    }
}

/// An in-memory instruction source.
#[derive(Clone, Debug, Default)]
pub struct VecSource {
    records: VecDeque<TraceInstr>,
}

impl VecSource {
    /// Creates a source that yields `records` in order.
    pub fn new(records: impl IntoIterator<Item = TraceInstr>) -> Self {
        Self {
            records: records.into_iter().collect(),
        }
    }

    /// Records not yet read.
    pub fn remaining(&self) -> usize {
        self.records.len()
    }
}

impl InstructionSource for VecSource {
    fn next_record(&mut self) -> Result<Option<TraceInstr>, TraceError> {
        Ok(self.records.pop_front())
    }
}
