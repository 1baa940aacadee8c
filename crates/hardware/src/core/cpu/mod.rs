//! Out-of-Order Core Definition and Cycle Driver.
//!
//! This module defines the central `O3Core` structure, which owns the complete
//! state of one modelled core. It coordinates the following:
//! 1. **Instruction State:** The in-flight window plus the IFETCH, DECODE, DISPATCH and ROB buffers.
//! 2. **Memory Ordering:** Load and store queues and the register producer map.
//! 3. **Front End:** Branch predictor, target buffer, DIB, code prefetcher, fetch stall state.
//! 4. **Memory Interface:** Instruction and data cache buses.
//! 5. **Cycle Driver:** `operate` runs every stage once, in a fixed order; `tick` also advances time.

/// Deadlock detection and report construction.
pub mod deadlock;

use std::collections::VecDeque;
use std::fmt;

use crate::common::error::SimResult;
use crate::config::{Config, CoreConfig};
use crate::core::instruction::{InstrId, Instruction, TraceInstr};
use crate::core::pipeline::lsq::{LoadQueue, StoreQueue};
use crate::core::pipeline::producers::RegisterProducers;
use crate::core::pipeline::stages;
use crate::core::pipeline::window::InstrWindow;
use crate::core::units::bru::{BimodalPredictor, BranchPredictor, Btb, TargetBuffer};
use crate::core::units::dib::Dib;
use crate::core::units::prefetch::{CodePrefetcher, NoPrefetcher};
use crate::core::watchdog::{DeadlockReport, Heartbeat};
use crate::soc::bus::CacheBus;
use crate::soc::memory::FixedLatencyMemory;
use crate::soc::traits::LowerLevel;
use crate::stats::CoreStats;

/// External collaborators a core is built with.
pub struct CoreParts {
    /// Direction predictor.
    pub branch_predictor: Box<dyn BranchPredictor>,
    /// Target buffer.
    pub btb: Box<dyn TargetBuffer>,
    /// Code prefetcher notified on every prediction.
    pub prefetcher: Box<dyn CodePrefetcher>,
    /// Level behind the instruction bus.
    pub l1i: Box<dyn LowerLevel>,
    /// Level behind the data bus.
    pub l1d: Box<dyn LowerLevel>,
}

impl fmt::Debug for CoreParts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoreParts").finish_non_exhaustive()
    }
}

impl CoreParts {
    /// Builds the reference collaborators: bimodal predictor, BTB with return
    /// stack, no prefetcher, and fixed-latency memory levels.
    pub fn reference(config: &Config) -> Self {
        Self {
            branch_predictor: Box::new(BimodalPredictor::new(config.branch.bimodal_table_size)),
            btb: Box::new(Btb::new(
                config.branch.btb_size,
                config.branch.ras_size,
                config.branch.call_size_trackers,
            )),
            prefetcher: Box::new(NoPrefetcher),
            l1i: Box::new(FixedLatencyMemory::new(&config.memory.l1i)),
            l1d: Box::new(FixedLatencyMemory::new(&config.memory.l1d)),
        }
    }
}

/// One out-of-order core.
///
/// Instructions are owned by `window`; every buffer, queue and dependency
/// list refers to them by `InstrId`.
pub struct O3Core {
    /// Core number.
    pub cpu: usize,
    /// Widths, capacities and latencies.
    pub config: CoreConfig,
    /// Current cycle.
    pub current_cycle: u64,
    /// Warmup mode: zero latencies, no register dependencies, no fetch stalls.
    pub warmup: bool,
    /// Id given to the next initialized instruction.
    pub next_instr_id: InstrId,

    /// All in-flight instructions.
    pub window: InstrWindow,
    /// Initialized instructions awaiting fetch and promotion.
    pub ifetch_buffer: VecDeque<InstrId>,
    /// Instructions being decoded.
    pub decode_buffer: VecDeque<InstrId>,
    /// Decoded instructions awaiting a ROB entry.
    pub dispatch_buffer: VecDeque<InstrId>,
    /// Reorder buffer.
    pub rob: VecDeque<InstrId>,

    /// Load queue.
    pub lq: LoadQueue,
    /// Store queue.
    pub sq: StoreQueue,
    /// Pending register writers.
    pub producers: RegisterProducers,
    /// Decoded instruction buffer.
    pub dib: Dib,

    /// Fetch is stopped behind a mispredicted branch.
    pub fetch_stall: bool,
    /// Cycle at which a stalled fetch may resume, once known.
    pub fetch_resume_cycle: Option<u64>,
    /// Trace reads left this cycle.
    pub instrs_to_read_this_cycle: usize,
    /// Instructions retired.
    pub num_retired: u64,

    /// Instruction cache bus.
    pub l1i_bus: CacheBus,
    /// Data cache bus.
    pub l1d_bus: CacheBus,
    /// Direction predictor.
    pub branch_predictor: Box<dyn BranchPredictor>,
    /// Target buffer.
    pub btb: Box<dyn TargetBuffer>,
    /// Code prefetcher.
    pub prefetcher: Box<dyn CodePrefetcher>,

    /// Trace records waiting to be initialized.
    pub input_queue: VecDeque<TraceInstr>,
    /// Performance statistics.
    pub stats: CoreStats,
    /// Heartbeat schedule, when enabled.
    pub heartbeat: Option<Heartbeat>,
    /// Set once a deadlock has been reported; the core no longer advances.
    pub fault: Option<DeadlockReport>,
}

impl fmt::Debug for O3Core {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("O3Core")
            .field("cpu", &self.cpu)
            .field("current_cycle", &self.current_cycle)
            .field("warmup", &self.warmup)
            .field("in_flight", &self.window.len())
            .field("ifetch", &self.ifetch_buffer.len())
            .field("decode", &self.decode_buffer.len())
            .field("dispatch", &self.dispatch_buffer.len())
            .field("rob", &self.rob.len())
            .field("lq", &self.lq.len())
            .field("sq", &self.sq.len())
            .field("fetch_stall", &self.fetch_stall)
            .field("num_retired", &self.num_retired)
            .finish_non_exhaustive()
    }
}

impl O3Core {
    /// Creates an idle core.
    ///
    /// # Arguments
    ///
    /// * `config` - Full model configuration; the core reads `general.cpu`,
    ///   `general.heartbeat*`, `core` and `dib`.
    /// * `parts` - Predictor, target buffer, prefetcher and memory levels.
    ///
    /// # Errors
    ///
    /// Returns `SimError::Config` if the configuration does not validate.
    pub fn new(config: &Config, parts: CoreParts) -> SimResult<Self> {
        config.validate()?;
        let cpu = config.general.cpu;
        let core = &config.core;
        Ok(Self {
            cpu,
            config: core.clone(),
            current_cycle: 0,
            warmup: false,
            next_instr_id: InstrId(0),
            window: InstrWindow::new(),
            ifetch_buffer: VecDeque::with_capacity(core.ifetch_buffer_size),
            decode_buffer: VecDeque::with_capacity(core.decode_buffer_size),
            dispatch_buffer: VecDeque::with_capacity(core.dispatch_buffer_size),
            rob: VecDeque::with_capacity(core.rob_size),
            lq: LoadQueue::new(core.lq_size),
            sq: StoreQueue::new(core.sq_size),
            producers: RegisterProducers::new(),
            dib: Dib::new(config.dib.window_size, config.dib.sets, config.dib.ways),
            fetch_stall: false,
            fetch_resume_cycle: None,
            instrs_to_read_this_cycle: 0,
            num_retired: 0,
            l1i_bus: CacheBus::new(cpu, parts.l1i),
            l1d_bus: CacheBus::new(cpu, parts.l1d),
            branch_predictor: parts.branch_predictor,
            btb: parts.btb,
            prefetcher: parts.prefetcher,
            input_queue: VecDeque::new(),
            stats: CoreStats::new(cpu),
            heartbeat: config
                .general
                .heartbeat
                .then(|| Heartbeat::new(config.general.heartbeat_period)),
            fault: None,
        })
    }

    /// Runs every stage once for the current cycle.
    ///
    /// Stage order: retire, complete, execute, schedule, memory return, LSQ,
    /// dispatch, decode, promote, fetch resume, fetch, DIB check, initialize.
    /// Time does not advance; see [`O3Core::tick`].
    ///
    /// # Errors
    ///
    /// Returns `SimError::Deadlock` when a buffer head has not moved for the
    /// configured deadlock threshold, and on every later call.
    pub fn operate(&mut self) -> SimResult<()> {
        if let Some(report) = &self.fault {
            return Err(report.clone().into());
        }

        self.instrs_to_read_this_cycle = self
            .config
            .fetch_width
            .min(self.config.ifetch_buffer_size.saturating_sub(self.ifetch_buffer.len()));

        stages::retire_stage(self)?;
        stages::complete_stage(self);
        stages::execute_stage(self);
        stages::schedule_stage(self);
        stages::memory_return_stage(self);
        stages::lsq_stage(self);
        stages::dispatch_stage(self)?;
        stages::decode_stage(self)?;
        stages::promote_stage(self)?;
        stages::resume_fetch(self);
        stages::fetch_stage(self);
        stages::dib_check_stage(self);
        stages::initialize_stage(self);

        self.poll_heartbeat();
        Ok(())
    }

    /// Advances one cycle: lets both memory levels progress, runs
    /// [`O3Core::operate`], then increments the cycle counter.
    ///
    /// # Errors
    ///
    /// Propagates the deadlock fault from `operate`.
    pub fn tick(&mut self) -> SimResult<()> {
        self.l1i_bus.operate(self.current_cycle);
        self.l1d_bus.operate(self.current_cycle);
        self.operate()?;
        self.current_cycle += 1;
        self.stats.cycles = self.current_cycle;
        Ok(())
    }

    fn poll_heartbeat(&mut self) {
        let phase_start = (self.stats.begin_phase_instr, self.stats.begin_phase_cycle);
        if let Some(hb) = self.heartbeat.as_mut()
            && let Some(sample) = hb.poll(self.num_retired, self.current_cycle, phase_start)
        {
            tracing::info!(
                target: "o3sim::heartbeat",
                cpu = self.cpu,
                instructions = sample.instructions,
                cycles = sample.cycles,
                heartbeat_ipc = sample.heartbeat_ipc,
                cumulative_ipc = sample.cumulative_ipc,
                "Heartbeat"
            );
        }
    }

    /// Queues a trace record for initialization.
    pub fn push_input(&mut self, record: TraceInstr) {
        self.input_queue.push_back(record);
    }

    /// Switches warmup mode on or off.
    pub fn set_warmup(&mut self, warmup: bool) {
        self.warmup = warmup;
    }

    /// Starts a phase, recording the retired count and cycle it began at.
    pub fn begin_phase(&mut self) {
        tracing::info!(target: "o3sim::phase", cpu = self.cpu, cycle = self.current_cycle, warmup = self.warmup, "begin phase");
        self.stats.begin_phase(self.num_retired, self.current_cycle);
    }

    /// Ends the region of interest for core `cpu`; other cores' requests are ignored.
    pub fn end_phase(&mut self, cpu: usize) {
        if cpu != self.cpu {
            return;
        }
        tracing::info!(target: "o3sim::phase", cpu = self.cpu, cycle = self.current_cycle, retired = self.num_retired, "end phase");
        self.stats.end_phase(self.num_retired, self.current_cycle);
    }

    /// Looks up an in-flight instruction.
    pub fn instr(&self, id: InstrId) -> Option<&Instruction> {
        self.window.get(id)
    }

    /// Returns true when nothing is in flight and no input is queued.
    pub fn is_drained(&self) -> bool {
        self.window.is_empty() && self.input_queue.is_empty()
    }

    /// Prints the region-of-interest summary line.
    pub fn print_roi_stats(&self) {
        println!(
            "CPU {} cumulative IPC: {:.4} instructions: {} cycles: {}",
            self.cpu,
            self.stats.roi_ipc(),
            self.stats.roi_instr(),
            self.stats.roi_cycle()
        );
    }
}
