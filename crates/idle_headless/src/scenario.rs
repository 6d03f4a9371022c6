//! Scenario loading and configuration.
//!
//! Scenarios define the inputs of a headless battle: the map, its
//! difficulty, the creator level, and both faction rosters. Seeds are not
//! part of a scenario; they are chosen per run.

use std::path::Path;

use idle_core::prelude::{CharacterSnapshot, CombatError, CombatRequest, MapKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// File not found.
    #[error("Scenario file not found: {0}")]
    FileNotFound(String),
    /// Name is neither a built-in scenario nor an existing file.
    #[error("Unknown scenario '{0}' (built-ins: {built_ins})", built_ins = Scenario::BUILTIN_NAMES.join(", "))]
    Unknown(String),
    /// Failed to read file.
    #[error("Failed to read scenario file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// Scenario rosters cannot be simulated.
    #[error("Invalid scenario: {0}")]
    Invalid(#[from] CombatError),
}

/// A complete scenario configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Map key.
    pub map_id: i32,
    /// Map difficulty.
    #[serde(default)]
    pub map_difficulty: i32,
    /// Level monsters are spawned at.
    #[serde(default = "default_creator_level")]
    pub creator_level: i32,
    /// Creator side, in acting order.
    pub creator_faction: Vec<CharacterSnapshot>,
    /// Enemy side. Only used on PvP maps.
    #[serde(default)]
    pub enemy_faction: Vec<CharacterSnapshot>,
}

fn default_creator_level() -> i32 {
    1
}

impl Default for Scenario {
    fn default() -> Self {
        Self::starter_village()
    }
}

impl Scenario {
    /// Names accepted by [`Scenario::builtin`].
    pub const BUILTIN_NAMES: &'static [&'static str] = &[
        "starter_village",
        "skeleton_graveyard",
        "pvp_duel",
        "pvp_stalemate",
    ];

    /// Load a scenario from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Load from a RON string (useful for embedded scenarios).
    pub fn from_ron_str(ron: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = ron::from_str(ron)?;
        Ok(scenario)
    }

    /// Serialize to pretty RON.
    pub fn to_ron_string(&self) -> Result<String, ScenarioError> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| ScenarioError::Invalid(CombatError::Codec(e.to_string())))
    }

    /// Look up a built-in scenario by name.
    #[must_use]
    pub fn builtin(name: &str) -> Option<Self> {
        match name {
            "starter_village" => Some(Self::starter_village()),
            "skeleton_graveyard" => Some(Self::skeleton_graveyard()),
            "pvp_duel" => Some(Self::pvp_duel()),
            "pvp_stalemate" => Some(Self::pvp_stalemate()),
            _ => None,
        }
    }

    /// Resolve a built-in name, falling back to a RON file path.
    pub fn resolve(name_or_path: &str) -> Result<Self, ScenarioError> {
        if let Some(scenario) = Self::builtin(name_or_path) {
            return Ok(scenario);
        }
        if Path::new(name_or_path).exists() {
            return Self::load(name_or_path);
        }
        Err(ScenarioError::Unknown(name_or_path.to_string()))
    }

    /// A level-1 hero against the Starter Village goblins.
    #[must_use]
    pub fn starter_village() -> Self {
        Self {
            name: "starter_village".to_string(),
            description: "Level 1 hero against two goblin waves".to_string(),
            map_id: MapKind::StarterVillage.key(),
            map_difficulty: 0,
            creator_level: 1,
            creator_faction: vec![CharacterSnapshot::player("Hero", 1).with_id(1)],
            enemy_faction: Vec::new(),
        }
    }

    /// A level-5 party in the Skeleton Graveyard.
    #[must_use]
    pub fn skeleton_graveyard() -> Self {
        Self {
            name: "skeleton_graveyard".to_string(),
            description: "Two level 5 heroes against three skeleton waves".to_string(),
            map_id: MapKind::SkeletonGraveyard.key(),
            map_difficulty: 2,
            creator_level: 5,
            creator_faction: vec![
                CharacterSnapshot::player("Warrior", 5).with_id(1),
                CharacterSnapshot::player("Ranger", 5).with_id(2),
            ],
            enemy_faction: Vec::new(),
        }
    }

    /// Two level-3 players in the arena.
    #[must_use]
    pub fn pvp_duel() -> Self {
        Self {
            name: "pvp_duel".to_string(),
            description: "Evenly matched level 3 duel".to_string(),
            map_id: MapKind::PvPArena.key(),
            map_difficulty: 0,
            creator_level: 3,
            creator_faction: vec![CharacterSnapshot::player("Challenger", 3).with_id(1)],
            enemy_faction: vec![CharacterSnapshot::player("Defender", 3).with_id(2)],
        }
    }

    /// Two players that cannot finish each other before the time limit.
    #[must_use]
    pub fn pvp_stalemate() -> Self {
        let turtle = |name: &str, id: u64| {
            let mut snapshot = CharacterSnapshot::player(name, 1).with_id(id);
            snapshot.stats.max_health = 1_000_000;
            snapshot.stats.current_health = 1_000_000;
            snapshot.stats.damage_min = 1;
            snapshot.stats.damage_max = 1;
            snapshot.stats.crit_chance = 0.0;
            snapshot
        };
        Self {
            name: "pvp_stalemate".to_string(),
            description: "Arena duel that always runs to the time limit".to_string(),
            map_id: MapKind::PvPArena.key(),
            map_difficulty: 0,
            creator_level: 1,
            creator_faction: vec![turtle("Turtle A", 1)],
            enemy_faction: vec![turtle("Turtle B", 2)],
        }
    }

    /// Check every roster entry can be simulated.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        self.creator_faction
            .iter()
            .chain(&self.enemy_faction)
            .try_for_each(CharacterSnapshot::validate)?;
        Ok(())
    }

    /// Build a request with pinned seeds.
    #[must_use]
    pub fn to_request(&self, battle_seed: i32, item_seed: i32) -> CombatRequest {
        self.to_fresh_request().with_seeds(battle_seed, item_seed)
    }

    /// Build a request with freshly drawn seeds.
    #[must_use]
    pub fn to_fresh_request(&self) -> CombatRequest {
        let creator_id = self.creator_faction.first().map_or(0, |c| c.id);
        CombatRequest::new_pvp(
            creator_id,
            self.map_id,
            self.map_difficulty,
            self.creator_level,
            self.creator_faction.clone(),
            self.enemy_faction.clone(),
        )
    }
}
