//! Profile catalogs: the stateless behavior and configuration values actors
//! and maps are resolved to by integer key.
//!
//! The engine only sees the [`ProfileCatalog`] contract. [`BuiltinCatalog`]
//! serves the compiled-in profiles; [`DataCatalog`] serves profiles loaded
//! from a RON document.

pub mod actor;
pub mod data;
pub mod maps;
pub mod monsters;
pub mod players;

use std::fmt::Debug;

pub use actor::{ActorProfile, BaseStats};
pub use data::{CatalogData, DataCatalog};
pub use maps::{MapDefinition, MapKind, MapProfile, MapType, WaveConfig};
pub use monsters::{MonsterKind, MonsterProfile};
pub use players::{PlayerKind, PlayerProfile};

use crate::actor::ActorType;

/// Lookup contract for actor and map profiles.
///
/// Implementations must be pure: the same key always resolves to the same
/// profile for the lifetime of the catalog.
pub trait ProfileCatalog: Debug + Send + Sync {
    /// The profile driving every player actor.
    fn player_profile(&self) -> &dyn ActorProfile;

    /// Monster profile by key.
    fn monster_profile(&self, key: i32) -> Option<&dyn ActorProfile>;

    /// Map profile by key.
    fn map_profile(&self, key: i32) -> Option<&dyn MapProfile>;

    /// Resolve the profile for an actor. Types other than players and
    /// monsters have no profile.
    fn actor_profile(&self, actor_type: ActorType, key: i32) -> Option<&dyn ActorProfile> {
        match actor_type {
            ActorType::Player => Some(self.player_profile()),
            ActorType::Monster => self.monster_profile(key),
            ActorType::NotSpecified | ActorType::Summon | ActorType::Projectile => None,
        }
    }
}

/// The compiled-in profiles.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinCatalog;

impl ProfileCatalog for BuiltinCatalog {
    fn player_profile(&self) -> &dyn ActorProfile {
        &players::BASIC_PLAYER
    }

    fn monster_profile(&self, key: i32) -> Option<&dyn ActorProfile> {
        MonsterKind::from_key(key).map(|kind| kind.profile() as &dyn ActorProfile)
    }

    fn map_profile(&self, key: i32) -> Option<&dyn MapProfile> {
        let map: &'static MapDefinition = match key {
            k if k == MapKind::StarterVillage.key() => &maps::STARTER_VILLAGE,
            k if k == MapKind::SkeletonGraveyard.key() => &maps::SKELETON_GRAVEYARD,
            k if k == MapKind::PvPArena.key() => &maps::PVP_ARENA,
            _ => return None,
        };
        Some(map)
    }
}
