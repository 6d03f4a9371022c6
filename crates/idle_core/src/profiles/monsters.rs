//! Monster profiles.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use super::actor::{ActorProfile, BaseStats};
use crate::actor::ActorType;

/// Built-in monster profile keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum MonsterKind {
    /// Sturdy melee skeleton.
    SkeletonWarrior = 100,
    /// Fragile ranged skeleton.
    SkeletonArcher = 101,
    /// Slow hard-hitting caster.
    SkeletonMage = 102,
    /// Weak, fast, numerous.
    Goblin = 200,
    /// Goblin tribe leader.
    GoblinChief = 201,
}

impl MonsterKind {
    /// All built-in monsters.
    pub const ALL: [Self; 5] = [
        Self::SkeletonWarrior,
        Self::SkeletonArcher,
        Self::SkeletonMage,
        Self::Goblin,
        Self::GoblinChief,
    ];

    /// Integer profile key.
    #[must_use]
    pub const fn key(self) -> i32 {
        self as i32
    }

    /// Look up a kind by key.
    #[must_use]
    pub fn from_key(key: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.key() == key)
    }

    /// Built-in profile for this kind.
    #[must_use]
    pub fn profile(self) -> &'static MonsterProfile {
        match self {
            Self::SkeletonWarrior => &SKELETON_WARRIOR,
            Self::SkeletonArcher => &SKELETON_ARCHER,
            Self::SkeletonMage => &SKELETON_MAGE,
            Self::Goblin => &GOBLIN,
            Self::GoblinChief => &GOBLIN_CHIEF,
        }
    }
}

/// Monster profile: identity plus base stats, driven by the default actor loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonsterProfile {
    /// Profile key.
    pub key: i32,
    /// Name given to spawned monsters.
    pub name: Cow<'static, str>,
    /// Flavor text.
    #[serde(default)]
    pub description: Cow<'static, str>,
    /// Base stats before level scaling.
    #[serde(default)]
    pub base: BaseStats,
}

impl ActorProfile for MonsterProfile {
    fn key(&self) -> i32 {
        self.key
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn actor_type(&self) -> ActorType {
        ActorType::Monster
    }

    fn base_stats(&self) -> BaseStats {
        self.base
    }
}

const fn monster(
    kind: MonsterKind,
    name: &'static str,
    description: &'static str,
    max_health: i32,
    damage: (i32, i32),
    attack_speed: f32,
) -> MonsterProfile {
    MonsterProfile {
        key: kind.key(),
        name: Cow::Borrowed(name),
        description: Cow::Borrowed(description),
        base: BaseStats {
            max_health,
            damage_min: damage.0,
            damage_max: damage.1,
            attack_speed,
            ..BaseStats::DEFAULT
        },
    }
}

/// Skeleton Warrior.
pub static SKELETON_WARRIOR: MonsterProfile = monster(
    MonsterKind::SkeletonWarrior,
    "Skeleton Warrior",
    "A sword-bearing skeleton that holds the line",
    80,
    (6, 12),
    0.8,
);

/// Skeleton Archer.
pub static SKELETON_ARCHER: MonsterProfile = monster(
    MonsterKind::SkeletonArcher,
    "Skeleton Archer",
    "A skeleton that strikes from range",
    50,
    (8, 14),
    1.0,
);

/// Skeleton Mage.
pub static SKELETON_MAGE: MonsterProfile = monster(
    MonsterKind::SkeletonMage,
    "Skeleton Mage",
    "A skeleton wielding dark magic",
    40,
    (10, 18),
    0.6,
);

/// Goblin.
pub static GOBLIN: MonsterProfile = monster(
    MonsterKind::Goblin,
    "Goblin",
    "Weak alone, dangerous in numbers",
    30,
    (3, 6),
    1.5,
);

/// Goblin Chief.
pub static GOBLIN_CHIEF: MonsterProfile = monster(
    MonsterKind::GoblinChief,
    "Goblin Chief",
    "Leader of the goblin tribe",
    150,
    (12, 20),
    0.7,
);
