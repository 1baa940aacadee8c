//! Core statistics collection and reporting.
//!
//! This module tracks performance metrics for one modelled core. It provides:
//! 1. **Phases:** Instruction and cycle counts at the start and end of the region of interest.
//! 2. **Branch Mix:** Counts per branch class.
//! 3. **Branch Prediction:** Mispredictions per class, accuracy, MPKI, and ROB occupancy at mispredict.
//! 4. **Front End:** Decoded instruction buffer hits and misses.

use std::time::Instant;

use crate::core::instruction::BranchType;

/// Counters for one simulation phase.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PhaseStats {
    /// Instructions initialized, per branch class (index with `BranchType::index`).
    pub total_branch_types: [u64; BranchType::COUNT],
    /// Mispredictions per branch class.
    pub branch_type_misses: [u64; BranchType::COUNT],
    /// Sum of ROB occupancies observed at each misprediction.
    pub total_rob_occupancy_at_branch_mispredict: u64,
}

impl PhaseStats {
    /// Branches seen (every class except `NotBranch`).
    pub fn total_branches(&self) -> u64 {
        self.total_branch_types.iter().skip(1).sum()
    }

    /// Mispredictions across all classes.
    pub fn total_mispredictions(&self) -> u64 {
        self.branch_type_misses.iter().sum()
    }
}

/// Simulation statistics for one core.
#[derive(Clone, Debug)]
pub struct CoreStats {
    start_time: Instant,
    /// Core number.
    pub cpu: usize,
    /// Cycles simulated so far.
    pub cycles: u64,
    /// Instructions retired so far.
    pub instructions_retired: u64,

    /// Retired count when the current phase began.
    pub begin_phase_instr: u64,
    /// Cycle when the current phase began.
    pub begin_phase_cycle: u64,
    /// Retired count when the region of interest ended.
    pub finish_phase_instr: u64,
    /// Cycle when the region of interest ended.
    pub finish_phase_cycle: u64,

    /// Counters for the phase in progress.
    pub current: PhaseStats,
    /// Counters frozen at the end of the region of interest.
    pub roi: Option<PhaseStats>,

    /// Instructions that left the IFETCH buffer already decoded by a DIB hit.
    pub dib_hits: u64,
    /// Instructions that left the IFETCH buffer without a DIB hit.
    pub dib_misses: u64,
}

impl Default for CoreStats {
    fn default() -> Self {
        Self::new(0)
    }
}

/// Section names for selective stats output.
///
/// Valid section identifiers: `"summary"`, `"branch"`, `"frontend"`.
/// Pass an empty slice to `print_sections` to print all sections.
pub const STATS_SECTIONS: &[&str] = &["summary", "branch", "frontend"];

#[allow(clippy::cast_precision_loss)]
fn per(num: u64, den: u64, scale: f64) -> f64 {
    if den == 0 { 0.0 } else { scale * num as f64 / den as f64 }
}

impl CoreStats {
    /// Creates empty statistics for core `cpu`.
    pub fn new(cpu: usize) -> Self {
        Self {
            start_time: Instant::now(),
            cpu,
            cycles: 0,
            instructions_retired: 0,
            begin_phase_instr: 0,
            begin_phase_cycle: 0,
            finish_phase_instr: 0,
            finish_phase_cycle: 0,
            current: PhaseStats::default(),
            roi: None,
            dib_hits: 0,
            dib_misses: 0,
        }
    }

    /// Starts a phase: resets the phase counters and records the start point.
    pub fn begin_phase(&mut self, retired: u64, cycle: u64) {
        self.begin_phase_instr = retired;
        self.begin_phase_cycle = cycle;
        self.current = PhaseStats::default();
    }

    /// Ends the region of interest, freezing the phase counters.
    pub fn end_phase(&mut self, retired: u64, cycle: u64) {
        self.finish_phase_instr = retired;
        self.finish_phase_cycle = cycle;
        self.roi = Some(self.current.clone());
    }

    /// Instructions retired in the region of interest (or the current phase, if it has not ended).
    pub fn roi_instr(&self) -> u64 {
        let end = if self.roi.is_some() {
            self.finish_phase_instr
        } else {
            self.instructions_retired
        };
        end.saturating_sub(self.begin_phase_instr)
    }

    /// Cycles spent in the region of interest (or the current phase, if it has not ended).
    pub fn roi_cycle(&self) -> u64 {
        let end = if self.roi.is_some() {
            self.finish_phase_cycle
        } else {
            self.cycles
        };
        end.saturating_sub(self.begin_phase_cycle)
    }

    /// Instructions per cycle over the region of interest.
    pub fn roi_ipc(&self) -> f64 {
        per(self.roi_instr(), self.roi_cycle(), 1.0)
    }

    fn reported_phase(&self) -> &PhaseStats {
        self.roi.as_ref().unwrap_or(&self.current)
    }

    /// Percentage of branches predicted correctly.
    pub fn branch_accuracy(&self) -> f64 {
        let phase = self.reported_phase();
        let total = phase.total_branches();
        per(total.saturating_sub(phase.total_mispredictions()), total, 100.0)
    }

    /// Mispredictions per thousand instructions.
    pub fn mpki(&self) -> f64 {
        per(self.reported_phase().total_mispredictions(), self.roi_instr(), 1000.0)
    }

    /// Mispredictions of one class per thousand instructions.
    pub fn branch_type_mpki(&self, branch_type: BranchType) -> f64 {
        per(
            self.reported_phase().branch_type_misses[branch_type.index()],
            self.roi_instr(),
            1000.0,
        )
    }

    /// Average ROB occupancy observed at a misprediction.
    pub fn average_rob_occupancy_at_mispredict(&self) -> f64 {
        let phase = self.reported_phase();
        per(
            phase.total_rob_occupancy_at_branch_mispredict,
            phase.total_mispredictions(),
            1.0,
        )
    }

    /// Prints only the requested statistics sections to stdout.
    ///
    /// Each element of `sections` should be one of `"summary"`, `"branch"`, or
    /// `"frontend"`. Pass an empty slice to print all sections (same as `print()`).
    ///
    /// # Arguments
    ///
    /// * `sections` - Slice of section names to print, or empty for all.
    pub fn print_sections(&self, sections: &[String]) {
        let want = |s: &str| sections.is_empty() || sections.iter().any(|x| x == s);
        let seconds = self.start_time.elapsed().as_secs_f64();

        if want("summary") {
            println!("\n==========================================================");
            println!("OUT-OF-ORDER CORE STATISTICS (CPU {})", self.cpu);
            println!("==========================================================");
            println!("host_seconds             {seconds:.4} s");
            println!("sim_cycles               {}", self.cycles);
            println!("sim_insts                {}", self.instructions_retired);
            println!("roi_cycles               {}", self.roi_cycle());
            println!("roi_insts                {}", self.roi_instr());
            println!("roi_ipc                  {:.4}", self.roi_ipc());
            println!("----------------------------------------------------------");
        }
        if want("branch") {
            let phase = self.reported_phase();
            println!("BRANCH PREDICTION");
            println!("  bp.branches            {}", phase.total_branches());
            println!("  bp.mispredicts         {}", phase.total_mispredictions());
            println!("  bp.accuracy            {:.2}%", self.branch_accuracy());
            println!("  bp.mpki                {:.4}", self.mpki());
            println!("  bp.rob_occupancy       {:.2}", self.average_rob_occupancy_at_mispredict());
            println!("  Branch type MPKI");
            for ty in BranchType::ALL.iter().skip(1) {
                println!(
                    "    {:<22} {:<10} mpki: {:.4}",
                    ty.name(),
                    phase.total_branch_types[ty.index()],
                    self.branch_type_mpki(*ty)
                );
            }
            println!("----------------------------------------------------------");
        }
        if want("frontend") {
            let lookups = self.dib_hits + self.dib_misses;
            println!("FRONT END");
            println!(
                "  dib.lookups            {} | hits: {} | hit_rate: {:.2}%",
                lookups,
                self.dib_hits,
                per(self.dib_hits, lookups, 100.0)
            );
        }
        println!("==========================================================");
    }

    /// Prints all statistics sections to stdout.
    ///
    /// Equivalent to `print_sections(&[])`.
    pub fn print(&self) {
        self.print_sections(&[]);
    }
}
