//! Batch battle runner for balance testing.
//!
//! Runs many battles in parallel using rayon. Every battle builds its own
//! context and random streams; only the engine and its catalog are shared.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use idle_core::prelude::{BattleResult, CombatEngine, DataCatalog};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::metrics::{BatchSummary, BattleMetrics, MetricsCollector};
use crate::scenario::{Scenario, ScenarioError};

/// Configuration for a batch run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Built-in scenario name or RON file path
    pub scenario: String,
    /// Number of battles to run
    pub battle_count: u32,
    /// Maximum parallel battles (0 = use rayon default)
    pub parallel_battles: u32,
    /// Output directory for results
    pub output_dir: PathBuf,
    /// Battle seed of the first battle; battle `i` uses `seed_start + i`
    pub seed_start: i32,
    /// Data-driven catalog (optional, defaults to the built-in profiles)
    pub catalog_path: Option<PathBuf>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            scenario: "starter_village".to_string(),
            battle_count: 100,
            parallel_battles: 0,
            output_dir: PathBuf::from("results"),
            seed_start: 0,
            catalog_path: None,
        }
    }
}

impl BatchConfig {
    /// Create config for a specific scenario
    pub fn new(scenario: &str, battle_count: u32) -> Self {
        Self {
            scenario: scenario.to_string(),
            battle_count,
            ..Default::default()
        }
    }

    /// Set output directory
    pub fn with_output(mut self, dir: PathBuf) -> Self {
        self.output_dir = dir;
        self
    }

    /// Set seed start
    pub fn with_seed(mut self, seed: i32) -> Self {
        self.seed_start = seed;
        self
    }

    /// Set parallelism
    pub fn with_parallel(mut self, parallel: u32) -> Self {
        self.parallel_battles = parallel;
        self
    }

    /// Use a data-driven catalog
    pub fn with_catalog(mut self, path: PathBuf) -> Self {
        self.catalog_path = Some(path);
        self
    }
}

/// Results from a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResults {
    /// Configuration used
    pub config: BatchConfig,
    /// Individual battle metrics, in seed order
    pub battles: Vec<BattleMetrics>,
    /// Aggregate summary
    pub summary: BatchSummary,
    /// Total runtime
    pub duration_seconds: f64,
    /// Errors encountered
    pub errors: Vec<BatchError>,
}

impl BatchResults {
    /// Save results to JSON file
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Load results from JSON file
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(std::io::Error::other)
    }
}

/// Error during batch run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchError {
    /// Battle index
    pub battle_index: u32,
    /// Battle seed used
    pub seed: i32,
    /// Error message
    pub message: String,
}

/// Progress tracking for batch runs
#[derive(Debug)]
pub struct BatchProgress {
    /// Total battles
    pub total: u32,
    completed: AtomicU32,
    start_time: Instant,
    outcomes: Mutex<HashMap<BattleResult, u32>>,
}

impl BatchProgress {
    /// Create new progress tracker
    pub fn new(total: u32) -> Self {
        Self {
            total,
            completed: AtomicU32::new(0),
            start_time: Instant::now(),
            outcomes: Mutex::new(HashMap::new()),
        }
    }

    /// Record a completed battle
    pub fn record_completion(&self, result: BattleResult) {
        self.completed.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut outcomes) = self.outcomes.lock() {
            *outcomes.entry(result).or_insert(0) += 1;
        }
    }

    /// Get current completion count
    pub fn current(&self) -> u32 {
        self.completed.load(Ordering::Relaxed)
    }

    /// Get completion percentage
    pub fn percentage(&self) -> f64 {
        f64::from(self.current()) / f64::from(self.total.max(1)) * 100.0
    }

    /// Get estimated time remaining
    pub fn eta(&self) -> Duration {
        let completed = self.current();
        if completed == 0 {
            return Duration::from_secs(0);
        }

        let elapsed = self.start_time.elapsed();
        let per_battle = elapsed.as_secs_f64() / f64::from(completed);
        let remaining = self.total.saturating_sub(completed);
        Duration::from_secs_f64(per_battle * f64::from(remaining))
    }

    /// Current creator win rate
    pub fn current_win_rate(&self) -> f64 {
        let completed = self.current();
        if completed == 0 {
            return 0.0;
        }
        let wins = self
            .outcomes
            .lock()
            .map_or(0, |o| o.get(&BattleResult::Victory).copied().unwrap_or(0));
        f64::from(wins) / f64::from(completed)
    }

    /// Log progress
    pub fn display(&self) {
        let eta = self.eta();
        info!(
            completed = self.current(),
            total = self.total,
            percent = format!("{:.1}", self.percentage()),
            eta = format!("{}m {}s", eta.as_secs() / 60, eta.as_secs() % 60),
            win_rate = format!("{:.1}%", self.current_win_rate() * 100.0),
            "Batch progress"
        );
    }
}

/// Build an engine, optionally backed by a RON catalog.
pub fn load_engine(catalog_path: Option<&Path>) -> idle_core::error::Result<CombatEngine> {
    let Some(path) = catalog_path else {
        return Ok(CombatEngine::default());
    };
    let catalog = DataCatalog::load(path)?;
    info!(
        path = %path.display(),
        monsters = catalog.monster_count(),
        maps = catalog.map_count(),
        "Loaded catalog"
    );
    Ok(CombatEngine::new(Arc::new(catalog)))
}

/// Item stream seed paired with a battle seed.
#[must_use]
pub const fn item_seed_for(battle_seed: i32) -> i32 {
    !battle_seed
}

/// Run one battle of `scenario` and collect its metrics.
///
/// # Errors
/// Returns an error if the battle cannot be initialized.
pub fn run_single_battle(
    engine: &CombatEngine,
    scenario: &Scenario,
    index: u32,
    seed: i32,
) -> idle_core::error::Result<BattleMetrics> {
    let request = scenario.to_request(seed, item_seed_for(seed));
    let mut battle = engine.start_battle(request)?;

    let mut collector = MetricsCollector::new(format!("battle_{index}"), scenario.name.clone());
    collector.start(battle.context());
    battle.run_to_end();
    Ok(collector.finish(&battle))
}

/// Run a batch of battles
///
/// # Errors
/// Returns an error if the scenario cannot be resolved. Individual battle
/// failures are collected in [`BatchResults::errors`].
pub fn run_batch(config: BatchConfig) -> Result<BatchResults, ScenarioError> {
    let start = Instant::now();
    let scenario = Scenario::resolve(&config.scenario)?;
    let progress = BatchProgress::new(config.battle_count);

    info!(
        "Starting batch run: {} battles of '{}'",
        config.battle_count, scenario.name
    );

    let engine = match load_engine(config.catalog_path.as_deref()) {
        Ok(engine) => engine,
        Err(e) => {
            warn!(
                "Failed to load catalog from {:?}: {}, using built-in profiles",
                config.catalog_path, e
            );
            CombatEngine::default()
        }
    };

    let run = || -> Vec<Result<BattleMetrics, BatchError>> {
        (0..config.battle_count)
            .into_par_iter()
            .map(|i| {
                let seed = config.seed_start.wrapping_add_unsigned(i);

                match run_single_battle(&engine, &scenario, i, seed) {
                    Ok(metrics) => {
                        progress.record_completion(metrics.result);

                        let completed = progress.current();
                        if completed % 10 == 0 {
                            debug!("Progress: {}/{}", completed, config.battle_count);
                        }
                        if completed % 100 == 0 {
                            progress.display();
                        }

                        Ok(metrics)
                    }
                    Err(e) => {
                        warn!("Battle {} failed: {}", i, e);
                        Err(BatchError {
                            battle_index: i,
                            seed,
                            message: e.to_string(),
                        })
                    }
                }
            })
            .collect()
    };

    let results = match rayon::ThreadPoolBuilder::new()
        .num_threads(config.parallel_battles as usize)
        .build()
    {
        Ok(pool) => pool.install(run),
        Err(e) => {
            warn!("Failed to build thread pool: {}, using global pool", e);
            run()
        }
    };

    let (battles, errors): (Vec<_>, Vec<_>) = results.into_iter().partition(Result::is_ok);
    let battles: Vec<BattleMetrics> = battles.into_iter().filter_map(Result::ok).collect();
    let errors: Vec<BatchError> = errors.into_iter().filter_map(Result::err).collect();

    let summary = BatchSummary::from_battles(&battles);
    let duration_seconds = start.elapsed().as_secs_f64();

    info!(
        "Batch complete: {} battles in {:.1}s ({:.1} battles/sec)",
        battles.len(),
        duration_seconds,
        battles.len() as f64 / duration_seconds.max(0.001)
    );

    Ok(BatchResults {
        config,
        battles,
        summary,
        duration_seconds,
        errors,
    })
}

/// Verify determinism by running the same seed several times
///
/// # Errors
/// Returns an error if a battle fails to start.
pub fn verify_determinism(
    engine: &CombatEngine,
    scenario: &Scenario,
    seed: i32,
    runs: u32,
) -> Result<bool, ScenarioError> {
    let mut results = Vec::with_capacity(runs as usize);
    for i in 0..runs {
        results.push(run_single_battle(engine, scenario, i, seed)?);
    }

    let Some(first) = results.first() else {
        return Ok(true);
    };
    Ok(results.iter().all(|r| {
        r.result == first.result
            && r.duration_ticks == first.duration_ticks
            && r.final_state_hash == first.final_state_hash
    }))
}
