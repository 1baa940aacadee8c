use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use o3sim_core::common::SimResult;
use o3sim_core::config::Config;
use o3sim_core::core::instruction::TraceInstr;
use o3sim_core::core::units::bru::{BimodalPredictor, BranchPredictor, Btb, TargetBuffer};
use o3sim_core::core::units::prefetch::{CodePrefetcher, NoPrefetcher};
use o3sim_core::core::{CoreParts, O3Core};
use o3sim_core::soc::{LowerLevel, MemPacket};

/// Everything a `FakeLevel` has seen, plus switches tests can flip mid-run.
#[derive(Debug, Default)]
pub struct LevelLog {
    /// Accepted reads, in order.
    pub reads: Vec<MemPacket>,
    /// Accepted writes, in order.
    pub writes: Vec<MemPacket>,
    /// Reads refused while `reject_reads` was set.
    pub rejected_reads: usize,
    /// Accept reads but never answer them.
    pub hold_reads: bool,
    /// Refuse every read.
    pub reject_reads: bool,
    /// Refuse every write.
    pub reject_writes: bool,
}

pub type LevelHandle = Arc<Mutex<LevelLog>>;

/// A memory level that answers accepted reads after `latency` cycles.
pub struct FakeLevel {
    latency: u64,
    max_read: usize,
    cycle: u64,
    pending: VecDeque<(u64, MemPacket)>,
    log: LevelHandle,
}

impl FakeLevel {
    pub fn new(latency: u64, max_read: usize) -> (Self, LevelHandle) {
        let log = LevelHandle::default();
        let level = Self {
            latency,
            max_read,
            cycle: 0,
            pending: VecDeque::new(),
            log: Arc::clone(&log),
        };
        (level, log)
    }
}

impl LowerLevel for FakeLevel {
    fn max_read(&self) -> usize {
        self.max_read
    }

    fn add_rq(&mut self, packet: MemPacket) -> bool {
        let mut log = self.log.lock().unwrap();
        if log.reject_reads {
            log.rejected_reads += 1;
            return false;
        }
        log.reads.push(packet.clone());
        if !log.hold_reads {
            self.pending.push_back((self.cycle + self.latency, packet));
        }
        true
    }

    fn add_wq(&mut self, packet: MemPacket) -> bool {
        let mut log = self.log.lock().unwrap();
        if log.reject_writes {
            return false;
        }
        log.writes.push(packet);
        true
    }

    fn operate(&mut self, cycle: u64, returned: &mut VecDeque<MemPacket>) {
        self.cycle = cycle;
        while self.pending.front().is_some_and(|(ready, _)| *ready <= cycle) {
            if let Some((_, packet)) = self.pending.pop_front() {
                returned.push_back(packet);
            }
        }
    }
}

/// Configuration used by most pipeline tests: the defaults with a short
/// deadlock threshold so a broken test fails fast.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.core.deadlock_cycle = 10_000;
    config
}

/// A core wired to two recording memory levels.
pub struct TestContext {
    pub core: O3Core,
    pub l1i: LevelHandle,
    pub l1d: LevelHandle,
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    /// Reference predictor and BTB, no prefetcher, one-cycle memory.
    pub fn with_config(config: Config) -> Self {
        let predictor = Box::new(BimodalPredictor::new(config.branch.bimodal_table_size));
        let btb = Box::new(Btb::new(
            config.branch.btb_size,
            config.branch.ras_size,
            config.branch.call_size_trackers,
        ));
        Self::with_front_end(config, predictor, btb, Box::new(NoPrefetcher))
    }

    pub fn with_front_end(
        config: Config,
        branch_predictor: Box<dyn BranchPredictor>,
        btb: Box<dyn TargetBuffer>,
        prefetcher: Box<dyn CodePrefetcher>,
    ) -> Self {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();

        let (l1i_level, l1i) = FakeLevel::new(1, 2);
        let (l1d_level, l1d) = FakeLevel::new(1, 2);
        let parts = CoreParts {
            branch_predictor,
            btb,
            prefetcher,
            l1i: Box::new(l1i_level),
            l1d: Box::new(l1d_level),
        };
        Self {
            core: O3Core::new(&config, parts).unwrap(),
            l1i,
            l1d,
        }
    }

    pub fn push(&mut self, records: impl IntoIterator<Item = TraceInstr>) {
        for record in records {
            self.core.push_input(record);
        }
    }

    pub fn tick(&mut self) -> SimResult<()> {
        self.core.tick()
    }

    /// Ticks until `done` holds, for at most `max_cycles` cycles. Returns whether it held.
    pub fn run_until(&mut self, max_cycles: u64, done: impl Fn(&O3Core) -> bool) -> bool {
        for _ in 0..max_cycles {
            if done(&self.core) {
                return true;
            }
            self.tick().unwrap();
        }
        done(&self.core)
    }

    /// Ticks until every pushed instruction has retired.
    pub fn drain(&mut self, max_cycles: u64) {
        let drained = self.run_until(max_cycles, O3Core::is_drained);
        assert!(drained, "core did not drain within {max_cycles} cycles: {:?}", self.core);
    }

    pub fn l1d_reads(&self) -> usize {
        self.l1d.lock().unwrap().reads.len()
    }

    pub fn l1d_writes(&self) -> usize {
        self.l1d.lock().unwrap().writes.len()
    }
}
