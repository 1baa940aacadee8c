//! Simulator: owns a core and the instruction source that feeds it.
//!
//! The simulator tops up the core's input queue every cycle and runs the two
//! phases of a simulation: a warmup phase with zero latencies, then the
//! measured region of interest.

use std::fmt;

use crate::common::error::SimResult;
use crate::config::Config;
use crate::core::cpu::{CoreParts, O3Core};
use crate::sim::trace::InstructionSource;
use crate::stats::CoreStats;

/// Top-level simulator for one core.
pub struct Simulator {
    /// The modelled core.
    pub core: O3Core,
    source: Box<dyn InstructionSource>,
    exhausted: bool,
    warmup_instructions: u64,
    simulation_instructions: u64,
}

impl fmt::Debug for Simulator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simulator")
            .field("core", &self.core)
            .field("exhausted", &self.exhausted)
            .field("warmup_instructions", &self.warmup_instructions)
            .field("simulation_instructions", &self.simulation_instructions)
            .finish_non_exhaustive()
    }
}

impl Simulator {
    /// Creates a simulator with the reference collaborators.
    ///
    /// # Errors
    ///
    /// Returns `SimError::Config` if the configuration does not validate.
    pub fn new(config: &Config, source: impl InstructionSource + 'static) -> SimResult<Self> {
        config.validate()?;
        Self::with_parts(config, CoreParts::reference(config), source)
    }

    /// Creates a simulator with caller-supplied collaborators.
    ///
    /// # Errors
    ///
    /// Returns `SimError::Config` if the configuration does not validate.
    pub fn with_parts(
        config: &Config,
        parts: CoreParts,
        source: impl InstructionSource + 'static,
    ) -> SimResult<Self> {
        Ok(Self {
            core: O3Core::new(config, parts)?,
            source: Box::new(source),
            exhausted: false,
            warmup_instructions: config.general.warmup_instructions,
            simulation_instructions: config.general.simulation_instructions,
        })
    }

    /// Returns true once the source has no more records.
    pub const fn source_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Reads records until the input queue holds one fetch width's worth.
    fn refill(&mut self) -> SimResult<()> {
        while !self.exhausted && self.core.input_queue.len() < self.core.config.fetch_width {
            match self.source.next_record()? {
                Some(record) => self.core.push_input(record),
                None => {
                    self.exhausted = true;
                    tracing::debug!(target: "o3sim::trace", cycle = self.core.current_cycle, "instruction source exhausted");
                }
            }
        }
        Ok(())
    }

    /// Advances one cycle.
    ///
    /// # Errors
    ///
    /// Returns a trace error from the source or the core's deadlock fault.
    pub fn tick(&mut self) -> SimResult<()> {
        self.refill()?;
        self.core.tick()
    }

    /// Runs until `target` instructions have retired in total, or the trace is
    /// exhausted and the core drained.
    fn run_until(&mut self, target: Option<u64>) -> SimResult<()> {
        loop {
            if target.is_some_and(|t| self.core.num_retired >= t) {
                return Ok(());
            }
            if self.exhausted && self.core.is_drained() {
                return Ok(());
            }
            self.tick()?;
        }
    }

    /// Runs the warmup phase and the measured phase.
    ///
    /// A simulation length of zero runs the measured phase to the end of the trace.
    ///
    /// # Returns
    ///
    /// The core's statistics, with the region of interest covering the measured phase.
    ///
    /// # Errors
    ///
    /// Returns a trace error from the source or the core's deadlock fault.
    pub fn run(&mut self) -> SimResult<&CoreStats> {
        if self.warmup_instructions > 0 {
            self.core.set_warmup(true);
            self.core.begin_phase();
            self.run_until(Some(self.warmup_instructions))?;
        }

        self.core.set_warmup(false);
        self.core.begin_phase();
        let target = (self.simulation_instructions > 0).then(|| self.core.num_retired + self.simulation_instructions);
        self.run_until(target)?;
        self.core.end_phase(self.core.cpu);

        Ok(&self.core.stats)
    }
}
