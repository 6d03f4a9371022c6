//! Data-driven profile catalog loaded from RON.
//!
//! ```ron
//! (
//!     player: (key: 1, name: "Hero", base: (max_health: 150, damage_min: 8, damage_max: 15)),
//!     monsters: [
//!         (key: 200, name: "Goblin", base: (max_health: 30, damage_min: 3, damage_max: 6, attack_speed: 1.5)),
//!     ],
//!     maps: [
//!         (key: 1, name: "Village", map_type: PvE, max_battle_seconds: 120, max_waves: 2,
//!          max_monsters_per_wave: 3, possible_monsters: [200]),
//!     ],
//! )
//! ```

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::actor::{ActorProfile, BaseStats};
use super::maps::{MapDefinition, MapProfile, MapType};
use super::monsters::{MonsterKind, MonsterProfile};
use super::players::{PlayerProfile, BASIC_PLAYER};
use super::{maps, ProfileCatalog};
use crate::error::{CombatError, Result};

const INLINE_SOURCE: &str = "<inline>";

/// Serialized form of a catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogData {
    /// Profile driving every player actor.
    pub player: PlayerProfile,
    /// Monster profiles.
    #[serde(default)]
    pub monsters: Vec<MonsterProfile>,
    /// Map profiles.
    #[serde(default)]
    pub maps: Vec<MapDefinition>,
}

impl CatalogData {
    /// The compiled-in profiles as data.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            player: BASIC_PLAYER.clone(),
            monsters: MonsterKind::ALL
                .iter()
                .map(|kind| kind.profile().clone())
                .collect(),
            maps: vec![
                maps::STARTER_VILLAGE.clone(),
                maps::SKELETON_GRAVEYARD.clone(),
                maps::PVP_ARENA.clone(),
            ],
        }
    }

    /// Validate internal consistency.
    ///
    /// Checks:
    /// - Monster and map keys are unique
    /// - Damage ranges are not inverted and base health and energy are not negative
    /// - Per-wave monster bounds are not inverted
    /// - PvE maps list at least one monster, and every listed monster exists
    ///
    /// Returns a list of validation errors.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        check_base("Player", &self.player.name, &self.player.base, &mut errors);

        let mut monster_keys = HashSet::new();
        for monster in &self.monsters {
            if !monster_keys.insert(monster.key) {
                errors.push(format!("Duplicate monster key {}", monster.key));
            }
            check_base("Monster", &monster.name, &monster.base, &mut errors);
        }

        let mut map_keys = HashSet::new();
        for map in &self.maps {
            if !map_keys.insert(map.key) {
                errors.push(format!("Duplicate map key {}", map.key));
            }
            if map.map_type != MapType::PvE {
                continue;
            }
            if map.min_monsters_per_wave > map.max_monsters_per_wave {
                errors.push(format!(
                    "Map '{}' has min_monsters_per_wave {} above max_monsters_per_wave {}",
                    map.name, map.min_monsters_per_wave, map.max_monsters_per_wave
                ));
            }
            if map.possible_monsters.is_empty() {
                errors.push(format!("PvE map '{}' lists no monsters", map.name));
            }
            for key in map.possible_monsters.iter() {
                if !monster_keys.contains(key) {
                    errors.push(format!("Map '{}' lists unknown monster {}", map.name, key));
                }
            }
        }

        errors
    }
}

fn check_base(kind: &str, name: &str, base: &BaseStats, errors: &mut Vec<String>) {
    if base.damage_min > base.damage_max {
        errors.push(format!(
            "{kind} '{name}' has damage_min {} above damage_max {}",
            base.damage_min, base.damage_max
        ));
    }
    if base.max_health < 0 {
        errors.push(format!("{kind} '{name}' has negative max_health {}", base.max_health));
    }
    if base.max_energy < 0 {
        errors.push(format!("{kind} '{name}' has negative max_energy {}", base.max_energy));
    }
}

/// Profile catalog backed by validated data.
#[derive(Debug, Clone)]
pub struct DataCatalog {
    player: PlayerProfile,
    monsters: BTreeMap<i32, MonsterProfile>,
    maps: BTreeMap<i32, MapDefinition>,
}

impl DataCatalog {
    /// Build a catalog from already-parsed data.
    ///
    /// # Errors
    /// Returns [`CombatError::CatalogParse`] listing every validation failure.
    pub fn from_data(data: CatalogData) -> Result<Self> {
        Self::from_data_at(data, INLINE_SOURCE)
    }

    /// Parse and validate a RON document.
    ///
    /// # Errors
    /// Returns [`CombatError::CatalogParse`] on syntax or validation errors.
    pub fn from_ron_str(source: &str) -> Result<Self> {
        Self::parse(source, INLINE_SOURCE)
    }

    /// Load and validate a RON catalog file.
    ///
    /// # Errors
    /// Returns [`CombatError::Io`] if the file cannot be read, or
    /// [`CombatError::CatalogParse`] on syntax or validation errors.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| CombatError::Io(format!("{}: {e}", path.display())))?;
        Self::parse(&content, &path.display().to_string())
    }

    /// Serialize the catalog back to pretty RON.
    ///
    /// # Errors
    /// Returns [`CombatError::Codec`] if serialization fails.
    pub fn to_ron_string(&self) -> Result<String> {
        ron::ser::to_string_pretty(&self.to_data(), ron::ser::PrettyConfig::default())
            .map_err(|e| CombatError::Codec(e.to_string()))
    }

    /// Export the catalog contents.
    #[must_use]
    pub fn to_data(&self) -> CatalogData {
        CatalogData {
            player: self.player.clone(),
            monsters: self.monsters.values().cloned().collect(),
            maps: self.maps.values().cloned().collect(),
        }
    }

    /// Number of monster profiles.
    #[must_use]
    pub fn monster_count(&self) -> usize {
        self.monsters.len()
    }

    /// Number of map profiles.
    #[must_use]
    pub fn map_count(&self) -> usize {
        self.maps.len()
    }

    fn parse(source: &str, origin: &str) -> Result<Self> {
        let data: CatalogData = ron::from_str(source).map_err(|e| CombatError::CatalogParse {
            path: origin.to_owned(),
            message: e.to_string(),
        })?;
        Self::from_data_at(data, origin)
    }

    fn from_data_at(data: CatalogData, origin: &str) -> Result<Self> {
        let errors = data.validate();
        if !errors.is_empty() {
            return Err(CombatError::CatalogParse {
                path: origin.to_owned(),
                message: errors.join("; "),
            });
        }
        Ok(Self {
            player: data.player,
            monsters: data.monsters.into_iter().map(|m| (m.key, m)).collect(),
            maps: data.maps.into_iter().map(|m| (m.key, m)).collect(),
        })
    }
}

impl ProfileCatalog for DataCatalog {
    fn player_profile(&self) -> &dyn ActorProfile {
        &self.player
    }

    fn monster_profile(&self, key: i32) -> Option<&dyn ActorProfile> {
        self.monsters.get(&key).map(|m| m as &dyn ActorProfile)
    }

    fn map_profile(&self, key: i32) -> Option<&dyn MapProfile> {
        self.maps.get(&key).map(|m| m as &dyn MapProfile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::ActorType;

    const SAMPLE: &str = r#"(
        player: (key: 1, name: "Hero", base: (max_health: 200, damage_min: 4, damage_max: 9)),
        monsters: [
            (key: 200, name: "Rat", base: (max_health: 10, damage_min: 1, damage_max: 2)),
            (key: 201, name: "Rat King", description: "Big rat"),
        ],
        maps: [
            (key: 7, name: "Sewer", map_type: PvE, max_battle_seconds: 60, max_waves: 3,
             min_monsters_per_wave: 2, max_monsters_per_wave: 4, possible_monsters: [200, 201]),
            (key: 8, name: "Pit", map_type: PvP, max_battle_seconds: 30),
        ],
    )"#;

    #[test]
    fn test_parse_sample() {
        let catalog = DataCatalog::from_ron_str(SAMPLE).unwrap();
        assert_eq!(catalog.monster_count(), 2);
        assert_eq!(catalog.map_count(), 2);

        let player = catalog.actor_profile(ActorType::Player, 0).unwrap();
        assert_eq!(player.base_stats().max_health, 200);
        // Unspecified base values fall back to defaults
        assert_eq!(player.base_stats().max_energy, 50);

        let king = catalog.monster_profile(201).unwrap();
        assert_eq!(king.name(), "Rat King");
        assert_eq!(king.base_stats().max_health, 100);

        let sewer = catalog.map_profile(7).unwrap();
        assert_eq!(sewer.max_waves(), 3);
        assert_eq!(sewer.possible_monsters(), &[200, 201]);

        let pit = catalog.map_profile(8).unwrap();
        assert_eq!(pit.map_type(), MapType::PvP);
        assert_eq!(pit.max_waves(), 1);
    }

    #[test]
    fn test_builtin_data_is_valid() {
        let data = CatalogData::builtin();
        assert!(data.validate().is_empty());
        let catalog = DataCatalog::from_data(data).unwrap();
        assert_eq!(catalog.monster_count(), 5);
        assert_eq!(catalog.map_count(), 3);
    }

    #[test]
    fn test_ron_round_trip() {
        let catalog = DataCatalog::from_data(CatalogData::builtin()).unwrap();
        let text = catalog.to_ron_string().unwrap();
        let reparsed = DataCatalog::from_ron_str(&text).unwrap();
        assert_eq!(reparsed.to_data(), catalog.to_data());
    }

    #[test]
    fn test_validation_failures() {
        let mut data = CatalogData::builtin();
        data.monsters.push(data.monsters[0].clone());
        data.maps[0].possible_monsters = vec![999].into();
        data.player.base.damage_min = 100;

        let errors = data.validate();
        assert_eq!(errors.len(), 3, "{errors:?}");

        match DataCatalog::from_data(data) {
            Err(CombatError::CatalogParse { path, message }) => {
                assert_eq!(path, "<inline>");
                assert!(message.contains("Duplicate monster key"));
                assert!(message.contains("unknown monster 999"));
            }
            other => panic!("expected CatalogParse, got {other:?}"),
        }
    }

    #[test]
    fn test_negative_base_pools_rejected() {
        let mut data = CatalogData::builtin();
        data.monsters[0].base.max_health = -500;
        data.player.base.max_energy = -1;

        let errors = data.validate();
        assert_eq!(errors.len(), 2, "{errors:?}");
        assert!(errors.iter().any(|e| e.contains("negative max_health -500")));
        assert!(errors.iter().any(|e| e.contains("negative max_energy -1")));
    }

    #[test]
    fn test_negative_health_ron_rejected() {
        let mut data = CatalogData::builtin();
        data.monsters[0].base.max_health = -500;
        let text = ron::ser::to_string(&data).unwrap();

        match DataCatalog::from_ron_str(&text) {
            Err(CombatError::CatalogParse { message, .. }) => {
                assert!(message.contains("negative max_health"));
            }
            other => panic!("expected CatalogParse, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_pve_pool_rejected() {
        let mut data = CatalogData::builtin();
        data.maps[0].possible_monsters = Vec::new().into();
        assert!(data.validate()[0].contains("lists no monsters"));
    }

    #[test]
    fn test_syntax_error() {
        let result = DataCatalog::from_ron_str("(player: ");
        assert!(matches!(result, Err(CombatError::CatalogParse { .. })));
    }

    #[test]
    fn test_load_missing_file() {
        let result = DataCatalog::load("/nonexistent/catalog.ron");
        assert!(matches!(result, Err(CombatError::Io(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.ron");
        fs::write(&path, SAMPLE).unwrap();

        let catalog = DataCatalog::load(&path).unwrap();
        assert_eq!(catalog.map_count(), 2);
    }
}
