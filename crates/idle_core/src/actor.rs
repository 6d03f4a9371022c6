//! Combatants: actor state, type, and faction.

use serde::{Deserialize, Serialize};

use crate::character::CharacterSnapshot;
use crate::stats::CombatStats;
use crate::tree::NodeId;

/// What kind of combatant an actor is. Selects the profile family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ActorType {
    /// Unset; never dispatched.
    #[default]
    NotSpecified,
    /// Player character.
    Player,
    /// Monster.
    Monster,
    /// Summoned minion.
    Summon,
    /// Projectile actor.
    Projectile,
}

/// Side of the battle an actor fights for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Faction {
    /// Unassigned.
    #[default]
    NotSpecified,
    /// The battle creator and allies.
    Creator,
    /// Monsters or the PvP opponent side.
    Enemy,
}

impl Faction {
    /// The opposing side. `NotSpecified` has no opponent and maps to itself.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Self::Creator => Self::Enemy,
            Self::Enemy => Self::Creator,
            Self::NotSpecified => Self::NotSpecified,
        }
    }
}

/// Live state of one combatant inside a battle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Actor {
    /// Identity of the source character (0 for spawned monsters).
    pub character_id: u64,
    /// Display name.
    pub name: String,
    /// Actor level.
    pub level: i32,
    /// Actor type.
    pub actor_type: ActorType,
    /// Side in this battle.
    pub faction: Faction,
    /// Working copy of the stat block.
    pub stats: CombatStats,
    /// Node of the actor currently being attacked.
    pub current_target: Option<NodeId>,
    /// Ticks until the next attack is allowed.
    pub attack_cooldown_ticks: u32,
}

impl Actor {
    /// Build an actor from a snapshot. Stats are copied; the snapshot is untouched.
    #[must_use]
    pub fn from_snapshot(snapshot: &CharacterSnapshot, faction: Faction) -> Self {
        Self {
            character_id: snapshot.id,
            name: snapshot.name.clone(),
            level: snapshot.level,
            actor_type: snapshot.actor_type,
            faction,
            stats: snapshot.stats.clone(),
            current_target: None,
            attack_cooldown_ticks: 0,
        }
    }

    /// Check if the actor still has health.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.stats.is_alive()
    }

    /// Apply damage, flooring health at zero.
    pub fn take_damage(&mut self, amount: i32) {
        self.stats.take_damage(amount);
    }

    /// Restore health, capped at maximum.
    pub fn heal(&mut self, amount: i32) {
        self.stats.heal(amount);
    }
}
