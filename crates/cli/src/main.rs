//! Out-of-order core model CLI.
//!
//! This binary drives one modelled core over an instruction trace. It performs:
//! 1. **Configuration:** Built-in defaults, optionally replaced by a JSON file and
//!    overridden by command-line phase lengths.
//! 2. **Simulation:** A warmup phase followed by the measured phase.
//! 3. **Reporting:** Statistics on success; the deadlock dump and a non-zero exit on a fault.

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use o3sim_core::common::SimError;
use o3sim_core::config::Config;
use o3sim_core::sim::{JsonLinesTrace, Simulator};
use o3sim_core::stats::STATS_SECTIONS;

#[derive(Parser, Debug)]
#[command(
    name = "o3sim",
    author,
    version,
    about = "Cycle-driven out-of-order core timing model",
    long_about = "Run a JSON-lines instruction trace through the out-of-order core model.\n\nExamples:\n  o3sim run --trace traces/loop.jsonl\n  o3sim run --trace traces/loop.jsonl --config core.json --warmup 1000000 --instructions 10000000"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Simulate one trace.
    Run {
        /// JSON-lines trace file.
        #[arg(short, long)]
        trace: PathBuf,

        /// JSON configuration file (defaults are used when omitted).
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Warmup instructions (overrides the configuration).
        #[arg(long)]
        warmup: Option<u64>,

        /// Measured instructions; 0 runs to the end of the trace (overrides the configuration).
        #[arg(short, long)]
        instructions: Option<u64>,

        /// Emit heartbeat lines during the run.
        #[arg(long)]
        heartbeat: bool,

        /// Statistics sections to print (summary, branch, frontend); all when omitted.
        #[arg(long, value_delimiter = ',')]
        stats: Vec<String>,

        /// Increase log verbosity (-v info, -vv debug, -vvv trace).
        #[arg(short, long, action = clap::ArgAction::Count)]
        verbose: u8,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            trace,
            config,
            warmup,
            instructions,
            heartbeat,
            stats,
            verbose,
        } => {
            init_logging(verbose);
            let config = load_config(config, warmup, instructions, heartbeat);
            cmd_run(&config, &trace, &stats);
        }
    }
}

/// Installs the log subscriber. `RUST_LOG` wins over `--verbose`.
fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

/// Loads the configuration and applies command-line overrides. Exits on error.
fn load_config(path: Option<PathBuf>, warmup: Option<u64>, instructions: Option<u64>, heartbeat: bool) -> Config {
    let mut config = match path {
        Some(path) => Config::from_file(&path).unwrap_or_else(|e| {
            eprintln!("\n[!] FATAL: {e}");
            process::exit(1);
        }),
        None => Config::default(),
    };
    if let Some(n) = warmup {
        config.general.warmup_instructions = n;
    }
    if let Some(n) = instructions {
        config.general.simulation_instructions = n;
    }
    config.general.heartbeat |= heartbeat;
    config
}

/// Runs the simulation and prints the requested statistics.
///
/// A deadlock prints the core dump and the statistics gathered so far, then exits with code 1.
fn cmd_run(config: &Config, trace_path: &Path, sections: &[String]) {
    if let Some(unknown) = sections.iter().find(|s| !STATS_SECTIONS.contains(&s.as_str())) {
        eprintln!("Error: unknown stats section '{unknown}' (expected one of {STATS_SECTIONS:?})");
        process::exit(2);
    }

    let trace = JsonLinesTrace::open(trace_path).unwrap_or_else(|e| {
        eprintln!("\n[!] FATAL: could not open trace '{}': {e}", trace_path.display());
        process::exit(1);
    });

    let mut sim = Simulator::new(config, trace).unwrap_or_else(|e| {
        eprintln!("\n[!] FATAL: {e}");
        process::exit(1);
    });

    println!("[*] Trace: {}", trace_path.display());
    println!(
        "    Warmup: {}  Simulation: {}",
        config.general.warmup_instructions,
        match config.general.simulation_instructions {
            0 => "to end of trace".to_owned(),
            n => n.to_string(),
        }
    );

    tracing::info!(target: "o3sim::cli", trace = %trace_path.display(), cpu = config.general.cpu, "starting simulation");
    match sim.run() {
        Ok(stats) => {
            tracing::info!(target: "o3sim::cli", cycles = stats.cycles, retired = stats.instructions_retired, "simulation finished");
            stats.print_sections(sections);
            sim.core.print_roi_stats();
        }
        Err(SimError::Deadlock(report)) => {
            eprintln!("\n[!] FATAL: {report}");
            sim.core.stats.print_sections(sections);
            process::exit(1);
        }
        Err(e) => {
            eprintln!("\n[!] FATAL: {e}");
            process::exit(1);
        }
    }
}
