//! Configuration system for the out-of-order core model.
//!
//! This module defines all configuration structures used to parameterize
//! the model. It provides:
//! 1. **Defaults:** Baseline widths, capacities and latencies of the modelled core.
//! 2. **Structures:** Hierarchical config for general run control, the core, the DIB,
//!    the branch unit and the reference memory levels.
//! 3. **Loading:** JSON deserialization (`Config::from_json_str`, `Config::from_file`)
//!    followed by `Config::validate`.
//!
//! Every field has a default, so a JSON document only needs to name what it changes.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::common::constants::{
    DEADLOCK_CYCLE, LOG2_BLOCK_SIZE, NUM_INSTR_DESTINATION_MEMORY, NUM_INSTR_SOURCE_MEMORY,
};
use crate::common::error::ConfigError;

/// Default configuration constants for the model.
///
/// The values describe a wide contemporary core and are used whenever a
/// field is omitted from the JSON configuration.
mod defaults {
    /// Instructions the IFETCH buffer can hold.
    pub const IFETCH_BUFFER_SIZE: usize = 64;
    /// Instructions the decode buffer can hold.
    pub const DECODE_BUFFER_SIZE: usize = 32;
    /// Instructions the dispatch buffer can hold.
    pub const DISPATCH_BUFFER_SIZE: usize = 32;
    /// Reorder buffer entries.
    pub const ROB_SIZE: usize = 352;
    /// Load queue entries.
    pub const LQ_SIZE: usize = 128;
    /// Store queue entries.
    pub const SQ_SIZE: usize = 72;

    /// Instructions read from the trace (and promoted to decode) per cycle.
    pub const FETCH_WIDTH: usize = 6;
    /// Instructions decoded per cycle.
    pub const DECODE_WIDTH: usize = 6;
    /// Instructions dispatched into the ROB per cycle.
    pub const DISPATCH_WIDTH: usize = 6;
    /// Unexecuted ROB entries the scheduler inspects per cycle.
    pub const SCHEDULER_SIZE: usize = 128;
    /// Instructions started (and completed) per cycle.
    pub const EXECUTE_WIDTH: usize = 4;
    /// Loads issued to the data cache per cycle.
    pub const LQ_WIDTH: usize = 2;
    /// Store operations (finish or write) per cycle.
    pub const SQ_WIDTH: usize = 2;
    /// Instructions retired per cycle.
    pub const RETIRE_WIDTH: usize = 5;

    /// Cycles between misprediction resolution and fetch resumption.
    pub const MISPREDICT_PENALTY: u64 = 1;
    /// Decode latency in cycles.
    pub const DECODE_LATENCY: u64 = 1;
    /// Dispatch latency in cycles.
    pub const DISPATCH_LATENCY: u64 = 1;
    /// Scheduling latency in cycles.
    pub const SCHEDULING_LATENCY: u64 = 0;
    /// Execution latency in cycles.
    pub const EXECUTE_LATENCY: u64 = 0;

    /// DIB window (bytes of code covered by one entry).
    pub const DIB_WINDOW_SIZE: u64 = 16;
    /// DIB sets.
    pub const DIB_SETS: usize = 32;
    /// DIB ways.
    pub const DIB_WAYS: usize = 8;

    /// Bimodal predictor counters.
    pub const BIMODAL_TABLE_SIZE: usize = 16384;
    /// Branch target buffer entries.
    pub const BTB_SIZE: usize = 1024;
    /// Return address stack depth.
    pub const RAS_SIZE: usize = 64;
    /// Call-size tracker entries used to predict return targets.
    pub const CALL_SIZE_TRACKERS: usize = 1024;

    /// Instruction cache hit latency.
    pub const L1I_LATENCY: u64 = 4;
    /// Data cache hit latency.
    pub const L1D_LATENCY: u64 = 5;
    /// Reads a memory level accepts per cycle.
    pub const MAX_READ: usize = 2;
    /// Writes a memory level accepts per cycle.
    pub const MAX_WRITE: usize = 2;
    /// Read queue entries of a memory level.
    pub const RQ_SIZE: usize = 64;
    /// Write queue entries of a memory level.
    pub const WQ_SIZE: usize = 64;

    /// Retired instructions between heartbeats.
    pub const HEARTBEAT_PERIOD: u64 = 10_000_000;
}

/// Root configuration structure containing all model settings.
///
/// # Examples
///
/// ```
/// use o3sim_core::config::Config;
///
/// let config = Config::default();
/// assert_eq!(config.core.rob_size, 352);
/// assert_eq!(config.core.fetch_width, 6);
/// ```
///
/// Deserializing a partial JSON document:
///
/// ```
/// use o3sim_core::config::Config;
///
/// let json = r#"{
///     "general": { "warmup_instructions": 1000, "heartbeat": true },
///     "core": { "rob_size": 128, "lq_size": 32, "sq_size": 24, "mispredict_penalty": 12 },
///     "memory": { "l1d": { "latency": 3 } }
/// }"#;
///
/// let config = Config::from_json_str(json).unwrap();
/// assert_eq!(config.general.warmup_instructions, 1000);
/// assert_eq!(config.core.rob_size, 128);
/// assert_eq!(config.core.mispredict_penalty, 12);
/// assert_eq!(config.core.fetch_width, 6);
/// assert_eq!(config.memory.l1d.latency, 3);
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Run control (phases, heartbeat, cpu number).
    #[serde(default)]
    pub general: GeneralConfig,
    /// Pipeline widths, capacities and latencies.
    #[serde(default)]
    pub core: CoreConfig,
    /// Decoded-instruction buffer geometry.
    #[serde(default)]
    pub dib: DibConfig,
    /// Reference branch predictor and BTB sizes.
    #[serde(default)]
    pub branch: BranchConfig,
    /// Reference instruction and data memory levels.
    #[serde(default)]
    pub memory: MemoryConfig,
}

impl Config {
    /// Parses a configuration from JSON text and validates it.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` for malformed JSON and `ConfigError::Invalid`
    /// when a value fails validation.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Io` if the file cannot be read, otherwise the errors
    /// of [`Config::from_json_str`].
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Checks that every value is one the core can run with.
    ///
    /// # Errors
    ///
    /// Returns the first offending field as `ConfigError::Invalid`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.core.validate()?;
        self.dib.validate()?;
        self.branch.validate()?;
        self.memory.l1i.validate("memory.l1i")?;
        self.memory.l1d.validate("memory.l1d")?;
        if self.general.heartbeat && self.general.heartbeat_period == 0 {
            return Err(invalid("general.heartbeat_period", "must be non-zero"));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: &'static str) -> ConfigError {
    ConfigError::Invalid { field, reason }
}

fn non_zero(field: &'static str, value: usize) -> Result<(), ConfigError> {
    if value == 0 {
        Err(invalid(field, "must be non-zero"))
    } else {
        Ok(())
    }
}

fn power_of_two(field: &'static str, value: usize) -> Result<(), ConfigError> {
    if value.is_power_of_two() {
        Ok(())
    } else {
        Err(invalid(field, "must be a power of two"))
    }
}

/// Run control settings.
#[derive(Debug, Clone, Deserialize)]
pub struct GeneralConfig {
    /// Index of the modelled core, used in reports.
    #[serde(default)]
    pub cpu: usize,

    /// Instructions retired in warmup mode before measurement begins.
    #[serde(default)]
    pub warmup_instructions: u64,

    /// Instructions retired in the measured phase; zero runs the trace to its end.
    #[serde(default)]
    pub simulation_instructions: u64,

    /// Emit heartbeat lines while running.
    #[serde(default)]
    pub heartbeat: bool,

    /// Retired instructions between heartbeats.
    #[serde(default = "GeneralConfig::default_heartbeat_period")]
    pub heartbeat_period: u64,
}

impl GeneralConfig {
    fn default_heartbeat_period() -> u64 {
        defaults::HEARTBEAT_PERIOD
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            cpu: 0,
            warmup_instructions: 0,
            simulation_instructions: 0,
            heartbeat: false,
            heartbeat_period: defaults::HEARTBEAT_PERIOD,
        }
    }
}

/// Pipeline widths, buffer capacities and fixed latencies.
///
/// These are consumed by the core, never changed by it.
#[derive(Debug, Clone, Deserialize)]
pub struct CoreConfig {
    /// IFETCH buffer capacity.
    #[serde(default = "CoreConfig::default_ifetch_buffer_size")]
    pub ifetch_buffer_size: usize,
    /// Decode buffer capacity.
    #[serde(default = "CoreConfig::default_decode_buffer_size")]
    pub decode_buffer_size: usize,
    /// Dispatch buffer capacity.
    #[serde(default = "CoreConfig::default_dispatch_buffer_size")]
    pub dispatch_buffer_size: usize,
    /// Reorder buffer capacity.
    #[serde(default = "CoreConfig::default_rob_size")]
    pub rob_size: usize,
    /// Load queue capacity.
    #[serde(default = "CoreConfig::default_lq_size")]
    pub lq_size: usize,
    /// Store queue capacity.
    #[serde(default = "CoreConfig::default_sq_size")]
    pub sq_size: usize,

    /// Trace reads and IFETCH-to-decode promotions per cycle.
    #[serde(default = "CoreConfig::default_fetch_width")]
    pub fetch_width: usize,
    /// Decode-to-dispatch moves per cycle.
    #[serde(default = "CoreConfig::default_decode_width")]
    pub decode_width: usize,
    /// Dispatch-to-ROB moves per cycle.
    #[serde(default = "CoreConfig::default_dispatch_width")]
    pub dispatch_width: usize,
    /// Unexecuted ROB entries the scheduler inspects per cycle.
    #[serde(default = "CoreConfig::default_scheduler_size")]
    pub scheduler_size: usize,
    /// Executions started, and completions processed, per cycle.
    #[serde(default = "CoreConfig::default_execute_width")]
    pub execute_width: usize,
    /// Loads issued per cycle.
    #[serde(default = "CoreConfig::default_lq_width")]
    pub lq_width: usize,
    /// Store finishes and writes per cycle.
    #[serde(default = "CoreConfig::default_sq_width")]
    pub sq_width: usize,
    /// Retirements per cycle.
    #[serde(default = "CoreConfig::default_retire_width")]
    pub retire_width: usize,

    /// Fetch resumes this many cycles after a misprediction resolves.
    #[serde(default = "CoreConfig::default_mispredict_penalty")]
    pub mispredict_penalty: u64,
    /// Cycles an instruction spends in decode.
    #[serde(default = "CoreConfig::default_decode_latency")]
    pub decode_latency: u64,
    /// Cycles an instruction spends in the dispatch buffer.
    #[serde(default = "CoreConfig::default_dispatch_latency")]
    pub dispatch_latency: u64,
    /// Cycles from scheduling to execution eligibility.
    #[serde(default = "CoreConfig::default_scheduling_latency")]
    pub scheduling_latency: u64,
    /// Cycles from execution start to completion.
    #[serde(default = "CoreConfig::default_execute_latency")]
    pub execute_latency: u64,

    /// Cycles a buffer head may stand still before a deadlock is reported.
    #[serde(default = "CoreConfig::default_deadlock_cycle")]
    pub deadlock_cycle: u64,
    /// log2 of the cache block size used for fetch batching and response matching.
    #[serde(default = "CoreConfig::default_log2_block_size")]
    pub log2_block_size: u32,
}

impl CoreConfig {
    fn default_ifetch_buffer_size() -> usize {
        defaults::IFETCH_BUFFER_SIZE
    }
    fn default_decode_buffer_size() -> usize {
        defaults::DECODE_BUFFER_SIZE
    }
    fn default_dispatch_buffer_size() -> usize {
        defaults::DISPATCH_BUFFER_SIZE
    }
    fn default_rob_size() -> usize {
        defaults::ROB_SIZE
    }
    fn default_lq_size() -> usize {
        defaults::LQ_SIZE
    }
    fn default_sq_size() -> usize {
        defaults::SQ_SIZE
    }
    fn default_fetch_width() -> usize {
        defaults::FETCH_WIDTH
    }
    fn default_decode_width() -> usize {
        defaults::DECODE_WIDTH
    }
    fn default_dispatch_width() -> usize {
        defaults::DISPATCH_WIDTH
    }
    fn default_scheduler_size() -> usize {
        defaults::SCHEDULER_SIZE
    }
    fn default_execute_width() -> usize {
        defaults::EXECUTE_WIDTH
    }
    fn default_lq_width() -> usize {
        defaults::LQ_WIDTH
    }
    fn default_sq_width() -> usize {
        defaults::SQ_WIDTH
    }
    fn default_retire_width() -> usize {
        defaults::RETIRE_WIDTH
    }
    fn default_mispredict_penalty() -> u64 {
        defaults::MISPREDICT_PENALTY
    }
    fn default_decode_latency() -> u64 {
        defaults::DECODE_LATENCY
    }
    fn default_dispatch_latency() -> u64 {
        defaults::DISPATCH_LATENCY
    }
    fn default_scheduling_latency() -> u64 {
        defaults::SCHEDULING_LATENCY
    }
    fn default_execute_latency() -> u64 {
        defaults::EXECUTE_LATENCY
    }
    fn default_deadlock_cycle() -> u64 {
        DEADLOCK_CYCLE
    }
    fn default_log2_block_size() -> u32 {
        LOG2_BLOCK_SIZE
    }

    fn validate(&self) -> Result<(), ConfigError> {
        non_zero("core.ifetch_buffer_size", self.ifetch_buffer_size)?;
        non_zero("core.decode_buffer_size", self.decode_buffer_size)?;
        non_zero("core.dispatch_buffer_size", self.dispatch_buffer_size)?;
        non_zero("core.rob_size", self.rob_size)?;
        // Smaller queues could never admit an instruction with a full set of memory operands.
        if self.lq_size < NUM_INSTR_SOURCE_MEMORY {
            return Err(invalid("core.lq_size", "must hold one instruction's loads"));
        }
        if self.sq_size < NUM_INSTR_DESTINATION_MEMORY {
            return Err(invalid("core.sq_size", "must hold one instruction's stores"));
        }
        non_zero("core.fetch_width", self.fetch_width)?;
        non_zero("core.decode_width", self.decode_width)?;
        non_zero("core.dispatch_width", self.dispatch_width)?;
        non_zero("core.scheduler_size", self.scheduler_size)?;
        non_zero("core.execute_width", self.execute_width)?;
        non_zero("core.lq_width", self.lq_width)?;
        non_zero("core.sq_width", self.sq_width)?;
        non_zero("core.retire_width", self.retire_width)?;
        if self.deadlock_cycle == 0 {
            return Err(invalid("core.deadlock_cycle", "must be non-zero"));
        }
        if self.log2_block_size >= u64::BITS {
            return Err(invalid("core.log2_block_size", "must be below 64"));
        }
        Ok(())
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            ifetch_buffer_size: defaults::IFETCH_BUFFER_SIZE,
            decode_buffer_size: defaults::DECODE_BUFFER_SIZE,
            dispatch_buffer_size: defaults::DISPATCH_BUFFER_SIZE,
            rob_size: defaults::ROB_SIZE,
            lq_size: defaults::LQ_SIZE,
            sq_size: defaults::SQ_SIZE,
            fetch_width: defaults::FETCH_WIDTH,
            decode_width: defaults::DECODE_WIDTH,
            dispatch_width: defaults::DISPATCH_WIDTH,
            scheduler_size: defaults::SCHEDULER_SIZE,
            execute_width: defaults::EXECUTE_WIDTH,
            lq_width: defaults::LQ_WIDTH,
            sq_width: defaults::SQ_WIDTH,
            retire_width: defaults::RETIRE_WIDTH,
            mispredict_penalty: defaults::MISPREDICT_PENALTY,
            decode_latency: defaults::DECODE_LATENCY,
            dispatch_latency: defaults::DISPATCH_LATENCY,
            scheduling_latency: defaults::SCHEDULING_LATENCY,
            execute_latency: defaults::EXECUTE_LATENCY,
            deadlock_cycle: DEADLOCK_CYCLE,
            log2_block_size: LOG2_BLOCK_SIZE,
        }
    }
}

/// Decoded-instruction buffer geometry.
#[derive(Debug, Clone, Deserialize)]
pub struct DibConfig {
    /// Bytes of code covered by one entry (power of two).
    #[serde(default = "DibConfig::default_window_size")]
    pub window_size: u64,
    /// Number of sets (power of two).
    #[serde(default = "DibConfig::default_sets")]
    pub sets: usize,
    /// Associativity.
    #[serde(default = "DibConfig::default_ways")]
    pub ways: usize,
}

impl DibConfig {
    fn default_window_size() -> u64 {
        defaults::DIB_WINDOW_SIZE
    }
    fn default_sets() -> usize {
        defaults::DIB_SETS
    }
    fn default_ways() -> usize {
        defaults::DIB_WAYS
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !self.window_size.is_power_of_two() {
            return Err(invalid("dib.window_size", "must be a power of two"));
        }
        power_of_two("dib.sets", self.sets)?;
        non_zero("dib.ways", self.ways)
    }
}

impl Default for DibConfig {
    fn default() -> Self {
        Self {
            window_size: defaults::DIB_WINDOW_SIZE,
            sets: defaults::DIB_SETS,
            ways: defaults::DIB_WAYS,
        }
    }
}

/// Sizes of the reference branch predictor and target buffer.
#[derive(Debug, Clone, Deserialize)]
pub struct BranchConfig {
    /// Bimodal counter table entries.
    #[serde(default = "BranchConfig::default_bimodal_table_size")]
    pub bimodal_table_size: usize,
    /// BTB entries (power of two).
    #[serde(default = "BranchConfig::default_btb_size")]
    pub btb_size: usize,
    /// Return address stack depth.
    #[serde(default = "BranchConfig::default_ras_size")]
    pub ras_size: usize,
    /// Call-size tracker entries (power of two).
    #[serde(default = "BranchConfig::default_call_size_trackers")]
    pub call_size_trackers: usize,
}

impl BranchConfig {
    fn default_bimodal_table_size() -> usize {
        defaults::BIMODAL_TABLE_SIZE
    }
    fn default_btb_size() -> usize {
        defaults::BTB_SIZE
    }
    fn default_ras_size() -> usize {
        defaults::RAS_SIZE
    }
    fn default_call_size_trackers() -> usize {
        defaults::CALL_SIZE_TRACKERS
    }

    fn validate(&self) -> Result<(), ConfigError> {
        non_zero("branch.bimodal_table_size", self.bimodal_table_size)?;
        power_of_two("branch.btb_size", self.btb_size)?;
        non_zero("branch.ras_size", self.ras_size)?;
        power_of_two("branch.call_size_trackers", self.call_size_trackers)
    }
}

impl Default for BranchConfig {
    fn default() -> Self {
        Self {
            bimodal_table_size: defaults::BIMODAL_TABLE_SIZE,
            btb_size: defaults::BTB_SIZE,
            ras_size: defaults::RAS_SIZE,
            call_size_trackers: defaults::CALL_SIZE_TRACKERS,
        }
    }
}

/// Reference memory levels behind the instruction and data buses.
#[derive(Debug, Clone, Deserialize)]
pub struct MemoryConfig {
    /// Level serving instruction fetches.
    #[serde(default = "MemoryConfig::default_l1i")]
    pub l1i: LevelConfig,
    /// Level serving loads and stores.
    #[serde(default = "MemoryConfig::default_l1d")]
    pub l1d: LevelConfig,
}

impl MemoryConfig {
    fn default_l1i() -> LevelConfig {
        LevelConfig {
            latency: defaults::L1I_LATENCY,
            ..LevelConfig::default()
        }
    }
    fn default_l1d() -> LevelConfig {
        LevelConfig {
            latency: defaults::L1D_LATENCY,
            ..LevelConfig::default()
        }
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            l1i: Self::default_l1i(),
            l1d: Self::default_l1d(),
        }
    }
}

/// A fixed-latency memory level.
#[derive(Debug, Clone, Deserialize)]
pub struct LevelConfig {
    /// Cycles from acceptance to response.
    #[serde(default = "LevelConfig::default_latency")]
    pub latency: u64,
    /// Reads accepted per cycle.
    #[serde(default = "LevelConfig::default_max_read")]
    pub max_read: usize,
    /// Writes accepted per cycle.
    #[serde(default = "LevelConfig::default_max_write")]
    pub max_write: usize,
    /// Outstanding reads.
    #[serde(default = "LevelConfig::default_rq_size")]
    pub rq_size: usize,
    /// Outstanding writes.
    #[serde(default = "LevelConfig::default_wq_size")]
    pub wq_size: usize,
}

impl LevelConfig {
    fn default_latency() -> u64 {
        defaults::L1D_LATENCY
    }
    fn default_max_read() -> usize {
        defaults::MAX_READ
    }
    fn default_max_write() -> usize {
        defaults::MAX_WRITE
    }
    fn default_rq_size() -> usize {
        defaults::RQ_SIZE
    }
    fn default_wq_size() -> usize {
        defaults::WQ_SIZE
    }

    fn validate(&self, field: &'static str) -> Result<(), ConfigError> {
        if self.max_read == 0 || self.max_write == 0 || self.rq_size == 0 || self.wq_size == 0 {
            return Err(invalid(field, "queue sizes and per-cycle limits must be non-zero"));
        }
        Ok(())
    }
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            latency: defaults::L1D_LATENCY,
            max_read: defaults::MAX_READ,
            max_write: defaults::MAX_WRITE,
            rq_size: defaults::RQ_SIZE,
            wq_size: defaults::WQ_SIZE,
        }
    }
}
