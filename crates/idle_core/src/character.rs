//! Character snapshots: the per-actor input of a combat request.

use serde::{Deserialize, Serialize};

use crate::actor::ActorType;
use crate::error::Result;
use crate::stats::CombatStats;

/// Input snapshot of one actor, as supplied in a request and persisted in a
/// replay record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterSnapshot {
    /// Character identity (0 for generated monsters).
    pub id: u64,
    /// Display name.
    pub name: String,
    /// Character level.
    pub level: i32,
    /// Actor type, selecting the profile family.
    pub actor_type: ActorType,
    /// Profile key within that family.
    pub profile_key: i32,
    /// Stat block at battle start.
    pub stats: CombatStats,
}

impl CharacterSnapshot {
    /// Player snapshot with level-default stats.
    #[must_use]
    pub fn player(name: impl Into<String>, level: i32) -> Self {
        Self {
            id: 0,
            name: name.into(),
            level,
            actor_type: ActorType::Player,
            profile_key: 0,
            stats: CombatStats::for_level(level),
        }
    }

    /// Monster snapshot with level-default stats.
    #[must_use]
    pub fn monster(name: impl Into<String>, level: i32, profile_key: i32) -> Self {
        Self {
            id: 0,
            name: name.into(),
            level,
            actor_type: ActorType::Monster,
            profile_key,
            stats: CombatStats::for_level(level),
        }
    }

    /// Set the character id.
    #[must_use]
    pub const fn with_id(mut self, id: u64) -> Self {
        self.id = id;
        self
    }

    /// Replace the stat block.
    #[must_use]
    pub fn with_stats(mut self, stats: CombatStats) -> Self {
        self.stats = stats;
        self
    }

    /// Check the snapshot's stats can be simulated.
    ///
    /// # Errors
    /// See [`CombatStats::validate`].
    pub fn validate(&self) -> Result<()> {
        self.stats.validate(&self.name)
    }
}
