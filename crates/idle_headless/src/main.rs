//! Headless idle combat runner.
//!
//! Runs battles without any front end. Designed for balance testing, CI
//! determinism checks, and replay inspection.
//!
//! # Usage
//!
//! ```bash
//! # Run a single battle and print its replay record
//! cargo run -p idle_headless -- run --scenario starter_village
//!
//! # Run batch balance test
//! cargo run -p idle_headless -- batch --scenario pvp_duel --count 1000 --output results/
//!
//! # Replay a recorded battle and check it reproduces
//! cargo run -p idle_headless -- replay --file battle.replay --verify
//! ```
//!
//! Logs go to stderr; `RUST_LOG` overrides the level chosen by `--verbose`.

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use idle_core::prelude::{CombatEngine, CombatReplayEntity};
use idle_headless::{
    batch::{item_seed_for, load_engine, run_batch, verify_determinism, BatchConfig},
    scenario::Scenario,
};

#[derive(Parser)]
#[command(name = "idle_headless")]
#[command(about = "Headless idle combat runner for balance testing and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// RON profile catalog to use instead of the built-in profiles
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single battle and print its replay record as JSON
    Run {
        /// Built-in scenario name or RON file
        #[arg(short, long, default_value = "starter_village")]
        scenario: String,

        /// Battle seed (random if omitted)
        #[arg(long, allow_negative_numbers = true)]
        seed: Option<i32>,

        /// Item seed (derived from the battle seed if omitted)
        #[arg(long, allow_negative_numbers = true, requires = "seed")]
        item_seed: Option<i32>,

        /// Write the binary replay record here
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Replay a recorded battle, printing one JSON snapshot per tick
    Replay {
        /// Replay file path
        #[arg(short, long)]
        file: PathBuf,

        /// Only check the replay reproduces the recorded outcome
        #[arg(long)]
        verify: bool,
    },

    /// Run a batch of battles for balance testing
    Batch {
        /// Built-in scenario name or RON file
        #[arg(short, long, default_value = "starter_village")]
        scenario: String,

        /// Number of battles to run
        #[arg(short, long, default_value = "100")]
        count: u32,

        /// Maximum parallel battles (0 = auto)
        #[arg(short, long, default_value = "0")]
        parallel: u32,

        /// Output directory for results
        #[arg(short, long, default_value = "results")]
        output: PathBuf,

        /// Battle seed of the first battle
        #[arg(long, default_value = "0", allow_negative_numbers = true)]
        seed: i32,
    },

    /// Verify determinism by running the same seed multiple times
    Verify {
        /// Built-in scenario name or RON file
        #[arg(short, long, default_value = "starter_village")]
        scenario: String,

        /// Seed to verify
        #[arg(long, default_value = "12345", allow_negative_numbers = true)]
        seed: i32,

        /// Number of verification runs
        #[arg(short, long, default_value = "5")]
        runs: u32,
    },

    /// List built-in scenarios
    Scenarios,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries JSON
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(filter)
        .init();

    let engine = match load_engine(cli.catalog.as_deref()) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("Failed to load catalog: {e}");
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Commands::Run {
            scenario,
            seed,
            item_seed,
            output,
        } => cmd_run(&engine, &scenario, seed, item_seed, output),
        Commands::Replay { file, verify } => cmd_replay(&engine, file, verify),
        Commands::Batch {
            scenario,
            count,
            parallel,
            output,
            seed,
        } => cmd_batch(scenario, count, parallel, output, seed, cli.catalog),
        Commands::Verify {
            scenario,
            seed,
            runs,
        } => cmd_verify(&engine, &scenario, seed, runs),
        Commands::Scenarios => {
            cmd_scenarios();
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}

/// Run a single battle
fn cmd_run(
    engine: &CombatEngine,
    scenario: &str,
    seed: Option<i32>,
    item_seed: Option<i32>,
    output: Option<PathBuf>,
) -> Result<(), String> {
    let scenario = Scenario::resolve(scenario).map_err(|e| e.to_string())?;
    let request = match seed {
        Some(seed) => scenario.to_request(seed, item_seed.unwrap_or_else(|| item_seed_for(seed))),
        None => scenario.to_fresh_request(),
    };

    tracing::info!(
        scenario = %scenario.name,
        battle_seed = request.battle_seed,
        item_seed = request.item_seed,
        "Running battle"
    );

    let record = engine
        .run_battle(request)
        .map_err(|e| format!("Battle failed: {e}"))?;

    let json = serde_json::to_string_pretty(&record).map_err(|e| e.to_string())?;
    println!("{json}");

    if let Some(path) = output {
        record
            .save(&path)
            .map_err(|e| format!("Failed to save replay: {e}"))?;
        eprintln!("Replay saved to: {}", path.display());
    }
    Ok(())
}

/// Replay a recorded battle
fn cmd_replay(engine: &CombatEngine, file: PathBuf, verify: bool) -> Result<(), String> {
    let record =
        CombatReplayEntity::load(&file).map_err(|e| format!("Failed to load replay: {e}"))?;

    eprintln!("Loaded replay:");
    eprintln!("  Map: {}", record.map_id);
    eprintln!("  Seeds: {} / {}", record.battle_seed, record.item_seed);
    eprintln!("  Result: {:?}", record.battle_result);
    eprintln!("  Duration: {} ticks", record.duration_ticks);

    if verify {
        return match engine.verify_replay(&record) {
            Ok(true) => {
                eprintln!("PASS: Replay reproduces the recorded outcome");
                Ok(())
            }
            Ok(false) => Err("FAIL: Replay produced a different outcome!".to_string()),
            Err(e) => Err(format!("FAIL: Error during verification: {e}")),
        };
    }

    let replay = engine
        .replay_battle(&record)
        .map_err(|e| format!("Failed to start replay: {e}"))?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut last = None;
    for snapshot in replay {
        let line = serde_json::to_string(&snapshot).map_err(|e| e.to_string())?;
        writeln!(out, "{line}").map_err(|e| e.to_string())?;
        last = Some((snapshot.tick, snapshot.result));
    }

    if let Some((tick, result)) = last {
        eprintln!("Replay complete at tick {tick}: {result:?}");
    }
    Ok(())
}

/// Run batch of battles for balance testing
fn cmd_batch(
    scenario: String,
    count: u32,
    parallel: u32,
    output: PathBuf,
    seed: i32,
    catalog: Option<PathBuf>,
) -> Result<(), String> {
    let num_cpus = std::thread::available_parallelism()
        .map(|p| p.get())
        .unwrap_or(1);

    tracing::info!(
        scenario = %scenario,
        count = count,
        parallel = parallel,
        seed = seed,
        output = %output.display(),
        cpus_available = num_cpus,
        catalog = ?catalog,
        "Batch configuration"
    );

    std::fs::create_dir_all(&output).map_err(|e| {
        format!(
            "FATAL: Cannot create output directory '{}': {e}",
            output.display()
        )
    })?;

    let mut config = BatchConfig::new(&scenario, count)
        .with_output(output.clone())
        .with_seed(seed)
        .with_parallel(parallel);
    if let Some(path) = catalog {
        config = config.with_catalog(path);
    }

    let results = run_batch(config).map_err(|e| e.to_string())?;

    let results_path = output.join("batch_results.json");
    results
        .save(&results_path)
        .map_err(|e| format!("FATAL: Failed to save results: {e}"))?;

    let summary = &results.summary;
    eprintln!("\n{}", "=".repeat(50));
    eprintln!("BATCH COMPLETE");
    eprintln!("{}", "=".repeat(50));
    eprintln!("Battles played: {}", summary.total_battles);
    if !results.errors.is_empty() {
        eprintln!("Battles FAILED: {}", results.errors.len());
    }
    eprintln!("Duration: {:.1}s", results.duration_seconds);
    eprintln!(
        "Throughput: {:.1} battles/sec",
        f64::from(summary.total_battles) / results.duration_seconds.max(0.001)
    );
    eprintln!("\nOutcomes:");
    eprintln!("  Victory: {}", summary.victories);
    eprintln!("  Defeat:  {}", summary.defeats);
    eprintln!("  Draw:    {}", summary.draws);
    eprintln!("  Timeout: {}", summary.timeouts);
    eprintln!("  Win rate: {:.1}%", summary.win_rate * 100.0);
    eprintln!(
        "  Duration: avg {:.0}, min {}, max {} ticks",
        summary.avg_duration_ticks, summary.min_duration_ticks, summary.max_duration_ticks
    );

    if !results.errors.is_empty() {
        eprintln!("\nBATTLE FAILURES:");
        for error in results.errors.iter().take(10) {
            eprintln!(
                "  Battle {} (seed {}): {}",
                error.battle_index, error.seed, error.message
            );
        }
        if results.errors.len() > 10 {
            eprintln!("  ... and {} more failures", results.errors.len() - 10);
        }
    }

    eprintln!("\nResults saved to: {}", results_path.display());
    Ok(())
}

/// Verify determinism
fn cmd_verify(engine: &CombatEngine, scenario: &str, seed: i32, runs: u32) -> Result<(), String> {
    tracing::info!(
        "Verifying determinism: {} with seed {} ({} runs)",
        scenario,
        seed,
        runs
    );

    let scenario = Scenario::resolve(scenario).map_err(|e| e.to_string())?;
    match verify_determinism(engine, &scenario, seed, runs) {
        Ok(true) => {
            eprintln!("PASS: All {runs} runs produced identical results");
            Ok(())
        }
        Ok(false) => Err("FAIL: Non-determinism detected!".to_string()),
        Err(e) => Err(format!("FAIL: {e}")),
    }
}

/// List built-in scenarios
fn cmd_scenarios() {
    for name in Scenario::BUILTIN_NAMES {
        if let Some(scenario) = Scenario::builtin(name) {
            println!("{:<20} {}", scenario.name, scenario.description);
        }
    }
}
