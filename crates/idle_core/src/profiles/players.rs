//! Player profiles.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use super::actor::{ActorProfile, BaseStats};
use crate::actor::ActorType;

/// Built-in player profile keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum PlayerKind {
    /// Balanced starter character.
    BasicPlayer = 1,
}

impl PlayerKind {
    /// Integer profile key.
    #[must_use]
    pub const fn key(self) -> i32 {
        self as i32
    }
}

/// Player profile. Every player actor is driven by the catalog's single
/// player profile regardless of its own key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerProfile {
    /// Profile key.
    pub key: i32,
    /// Display name.
    pub name: Cow<'static, str>,
    /// Flavor text.
    #[serde(default)]
    pub description: Cow<'static, str>,
    /// Base stats before level scaling.
    #[serde(default)]
    pub base: BaseStats,
}

impl ActorProfile for PlayerProfile {
    fn key(&self) -> i32 {
        self.key
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn actor_type(&self) -> ActorType {
        ActorType::Player
    }

    fn base_stats(&self) -> BaseStats {
        self.base
    }
}

/// Basic player.
pub static BASIC_PLAYER: PlayerProfile = PlayerProfile {
    key: PlayerKind::BasicPlayer.key(),
    name: Cow::Borrowed("Basic Player"),
    description: Cow::Borrowed("A player character with balanced attributes"),
    base: BaseStats {
        max_health: 150,
        max_energy: 100,
        damage_min: 8,
        damage_max: 15,
        attack_speed: 1.2,
    },
};
