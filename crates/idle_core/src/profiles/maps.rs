//! Map profiles and wave generation.

use std::borrow::Cow;
use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use super::monsters::MonsterKind;
use crate::error::Result;
use crate::random::RandomSource;

/// Upper bound on monsters in a single wave, whatever the difficulty.
pub const MAX_MONSTERS_PER_WAVE: i32 = 100;

/// How a map supplies the enemy faction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MapType {
    /// Enemies arrive in generated monster waves.
    PvE,
    /// Enemies are the request's enemy faction.
    PvP,
}

/// Built-in map keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum MapKind {
    /// Starter area with goblins.
    StarterVillage = 1,
    /// Graveyard full of skeletons.
    SkeletonGraveyard = 2,
    /// Reserved key with no built-in profile.
    GoblinCave = 3,
    /// Player versus player arena.
    PvPArena = 100,
}

impl MapKind {
    /// Integer map key.
    #[must_use]
    pub const fn key(self) -> i32 {
        self as i32
    }
}

/// One scheduled wave of monsters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WaveConfig {
    /// 1-based wave number.
    pub wave_number: u32,
    /// `(monster key, count)` pairs in first-drawn order.
    pub monster_counts: Vec<(i32, u32)>,
}

impl WaveConfig {
    /// Total monsters in the wave.
    #[must_use]
    pub fn total(&self) -> u32 {
        self.monster_counts.iter().map(|&(_, count)| count).sum()
    }

    fn add(&mut self, key: i32) {
        match self.monster_counts.iter_mut().find(|(k, _)| *k == key) {
            Some((_, count)) => *count += 1,
            None => self.monster_counts.push((key, 1)),
        }
    }
}

/// Map configuration and wave schedule generation.
pub trait MapProfile: Debug + Send + Sync {
    /// Map key.
    fn key(&self) -> i32;

    /// Display name.
    fn name(&self) -> &str;

    /// PvE or PvP.
    fn map_type(&self) -> MapType;

    /// Battle length limit in seconds.
    fn max_battle_seconds(&self) -> u32;

    /// Number of waves generated for PvE.
    fn max_waves(&self) -> u32;

    /// Suggested creator level.
    fn recommended_level(&self) -> i32 {
        1
    }

    /// Lower bound of the per-wave monster roll.
    fn min_monsters_per_wave(&self) -> i32 {
        1
    }

    /// Upper bound (inclusive) of the per-wave monster roll.
    fn max_monsters_per_wave(&self) -> i32 {
        5
    }

    /// Monster keys waves draw from.
    fn possible_monsters(&self) -> &[i32];

    /// Generate the full wave schedule.
    ///
    /// Wave `i` (1-based) rolls a count in `[min, max]`, adds
    /// `difficulty / 2 + (i - 1)`, clamps to `[1, MAX_MONSTERS_PER_WAVE]`,
    /// then draws each monster uniformly from [`MapProfile::possible_monsters`].
    ///
    /// # Errors
    /// Returns [`crate::error::CombatError::InvalidRange`] if the per-wave
    /// bounds are inverted or the monster pool is empty.
    fn generate_waves(&self, difficulty: i32, rng: &mut dyn RandomSource) -> Result<Vec<WaveConfig>> {
        let pool = self.possible_monsters();
        let pool_len = i32::try_from(pool.len()).unwrap_or(i32::MAX);
        let mut waves = Vec::with_capacity(self.max_waves() as usize);

        for wave_number in 1..=self.max_waves() {
            let rolled = rng.next_range(
                self.min_monsters_per_wave(),
                self.max_monsters_per_wave().saturating_add(1),
            )?;
            let bonus = (difficulty / 2).saturating_add(wave_number as i32 - 1);
            let count = rolled.saturating_add(bonus).clamp(1, MAX_MONSTERS_PER_WAVE);

            let mut wave = WaveConfig {
                wave_number,
                monster_counts: Vec::new(),
            };
            for _ in 0..count {
                let index = rng.next_below(pool_len)?;
                wave.add(pool[index as usize]);
            }
            waves.push(wave);
        }

        Ok(waves)
    }
}

/// Map profile backed by plain data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapDefinition {
    /// Map key.
    pub key: i32,
    /// Display name.
    pub name: Cow<'static, str>,
    /// Flavor text.
    #[serde(default)]
    pub description: Cow<'static, str>,
    /// PvE or PvP.
    pub map_type: MapType,
    /// Battle length limit in seconds.
    pub max_battle_seconds: u32,
    /// Number of waves for PvE.
    #[serde(default = "default_max_waves")]
    pub max_waves: u32,
    /// Suggested creator level.
    #[serde(default = "default_recommended_level")]
    pub recommended_level: i32,
    /// Lower bound of the per-wave monster roll.
    #[serde(default = "default_min_monsters")]
    pub min_monsters_per_wave: i32,
    /// Upper bound (inclusive) of the per-wave monster roll.
    #[serde(default = "default_max_monsters")]
    pub max_monsters_per_wave: i32,
    /// Monster keys waves draw from.
    #[serde(default)]
    pub possible_monsters: Cow<'static, [i32]>,
}

fn default_max_waves() -> u32 {
    1
}

fn default_recommended_level() -> i32 {
    1
}

fn default_min_monsters() -> i32 {
    1
}

fn default_max_monsters() -> i32 {
    5
}

impl MapProfile for MapDefinition {
    fn key(&self) -> i32 {
        self.key
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn map_type(&self) -> MapType {
        self.map_type
    }

    fn max_battle_seconds(&self) -> u32 {
        self.max_battle_seconds
    }

    fn max_waves(&self) -> u32 {
        self.max_waves
    }

    fn recommended_level(&self) -> i32 {
        self.recommended_level
    }

    fn min_monsters_per_wave(&self) -> i32 {
        self.min_monsters_per_wave
    }

    fn max_monsters_per_wave(&self) -> i32 {
        self.max_monsters_per_wave
    }

    fn possible_monsters(&self) -> &[i32] {
        &self.possible_monsters
    }
}

const STARTER_VILLAGE_MONSTERS: &[i32] = &[MonsterKind::Goblin.key()];

const SKELETON_GRAVEYARD_MONSTERS: &[i32] = &[
    MonsterKind::SkeletonWarrior.key(),
    MonsterKind::SkeletonArcher.key(),
    MonsterKind::SkeletonMage.key(),
];

/// Starter Village.
pub static STARTER_VILLAGE: MapDefinition = MapDefinition {
    key: MapKind::StarterVillage.key(),
    name: Cow::Borrowed("Starter Village"),
    description: Cow::Borrowed("A quiet starting area with weak monsters"),
    map_type: MapType::PvE,
    max_battle_seconds: 120,
    max_waves: 2,
    recommended_level: 1,
    min_monsters_per_wave: 1,
    max_monsters_per_wave: 3,
    possible_monsters: Cow::Borrowed(STARTER_VILLAGE_MONSTERS),
};

/// Skeleton Graveyard.
pub static SKELETON_GRAVEYARD: MapDefinition = MapDefinition {
    key: MapKind::SkeletonGraveyard.key(),
    name: Cow::Borrowed("Skeleton Graveyard"),
    description: Cow::Borrowed("An ancient graveyard crawling with skeletons"),
    map_type: MapType::PvE,
    max_battle_seconds: 180,
    max_waves: 3,
    recommended_level: 5,
    min_monsters_per_wave: 2,
    max_monsters_per_wave: 5,
    possible_monsters: Cow::Borrowed(SKELETON_GRAVEYARD_MONSTERS),
};

/// PvP Arena.
pub static PVP_ARENA: MapDefinition = MapDefinition {
    key: MapKind::PvPArena.key(),
    name: Cow::Borrowed("PvP Arena"),
    description: Cow::Borrowed("An arena for player duels"),
    map_type: MapType::PvP,
    max_battle_seconds: 300,
    max_waves: 1,
    recommended_level: 1,
    min_monsters_per_wave: 1,
    max_monsters_per_wave: 5,
    possible_monsters: Cow::Borrowed(&[]),
};
