//! # Idle Core
//!
//! Deterministic combat simulation core for the idle combat game.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No wall clock
//! - No system randomness past the seeds drawn for a fresh request
//! - Fixed-point combat math
//!
//! This separation enables:
//! - Replays from a persisted seed
//! - Headless batch simulation
//! - Determinism testing
//!
//! ## Crate Structure
//!
//! - [`engine`] - Battle runner and lazy replay
//! - [`map_controller`] - Battle setup, waves, termination
//! - [`profiles`] - Actor and map profiles, profile catalogs
//! - [`combat`] - Attack resolution math
//! - [`context`] - Per-battle state and snapshots
//! - [`request`] - Requests and replay records
//! - [`random`] - Seeded random streams
//! - [`tree`] - Component arena
//! - [`math`] - Fixed-point math utilities

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod actor;
pub mod character;
pub mod combat;
pub mod context;
pub mod engine;
pub mod error;
pub mod map_controller;
pub mod math;
pub mod profiles;
pub mod random;
pub mod request;
pub mod stats;
pub mod tree;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::actor::{Actor, ActorType, Faction};
    pub use crate::character::CharacterSnapshot;
    pub use crate::context::{ActorState, BattleResult, ContextSnapshot, TickContext};
    pub use crate::engine::{Battle, CombatEngine, ReplayIter};
    pub use crate::error::{CombatError, Result};
    pub use crate::map_controller::{MapController, MapPhase};
    pub use crate::math::{Fixed, TICK_RATE};
    pub use crate::profiles::{
        ActorProfile, BuiltinCatalog, DataCatalog, MapKind, MapProfile, MapType, MonsterKind,
        PlayerKind, ProfileCatalog,
    };
    pub use crate::random::{GameRandom, RandomSource};
    pub use crate::request::{CombatReplayEntity, CombatRequest, REPLAY_VERSION};
    pub use crate::stats::CombatStats;
    pub use crate::tree::{ComponentKind, ComponentTree, NodeId};
}
