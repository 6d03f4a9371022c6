//! Headless battle runner for batch simulation and CI verification.
//!
//! This crate runs battles without any front end. It enables:
//!
//! - **Balance testing**: run thousands of seeded battles in parallel
//! - **CI verification**: check that the same seed always plays out the same way
//! - **Replay inspection**: dump a recorded battle tick by tick
//!
//! # Output
//!
//! - **stdout**: replay records and per-tick snapshots (JSON)
//! - **stderr**: logs (human-readable)
//!
//! # Example
//!
//! ```bash
//! # Run a built-in scenario and keep its replay record
//! cargo run -p idle_headless -- run --scenario starter_village --seed 42 --output battle.replay
//!
//! # Dump the replay, one JSON snapshot per tick
//! cargo run -p idle_headless -- replay --file battle.replay
//!
//! # Verify determinism
//! cargo run -p idle_headless -- verify --scenario pvp_duel --runs 5
//! ```

pub mod batch;
pub mod metrics;
pub mod scenario;

pub use batch::{load_engine, run_batch, BatchConfig, BatchResults};
pub use metrics::{BatchSummary, BattleMetrics, MetricsCollector};
pub use scenario::{Scenario, ScenarioError};
