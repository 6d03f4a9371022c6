//! Battle requests and the replay records that reproduce them.
//!
//! A [`CombatReplayEntity`] is the minimal persisted form of a finished
//! battle: the request inputs plus the outcome. Converting it back with
//! [`CombatReplayEntity::to_request`] and running it yields the same result
//! and duration, tick for tick.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::character::CharacterSnapshot;
use crate::context::BattleResult;
use crate::error::{CombatError, Result};
use crate::random::fresh_seed;

/// Replay record format version for compatibility.
pub const REPLAY_VERSION: u32 = 1;

/// Everything needed to start one battle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatRequest {
    /// Character that started the battle.
    pub creator_character_id: u64,
    /// Map key.
    pub map_id: i32,
    /// Difficulty; raises PvE wave sizes.
    pub map_difficulty: i32,
    /// Creator level; spawned monsters use it.
    pub creator_level: i32,
    /// Seed of the combat stream.
    pub battle_seed: i32,
    /// Seed of the item stream.
    pub item_seed: i32,
    /// Creator side, in acting order.
    pub creator_faction: Vec<CharacterSnapshot>,
    /// Enemy side for PvP maps. Ignored on PvE maps.
    pub enemy_faction: Vec<CharacterSnapshot>,
    /// Replays run without the item stream.
    pub is_replay: bool,
}

impl CombatRequest {
    /// Fresh PvE request with independently drawn seeds.
    #[must_use]
    pub fn new_pve(
        creator_character_id: u64,
        map_id: i32,
        map_difficulty: i32,
        creator_level: i32,
        creator_faction: Vec<CharacterSnapshot>,
    ) -> Self {
        Self {
            creator_character_id,
            map_id,
            map_difficulty,
            creator_level,
            battle_seed: fresh_seed(),
            item_seed: fresh_seed(),
            creator_faction,
            enemy_faction: Vec::new(),
            is_replay: false,
        }
    }

    /// Fresh PvP request with independently drawn seeds.
    #[must_use]
    pub fn new_pvp(
        creator_character_id: u64,
        map_id: i32,
        map_difficulty: i32,
        creator_level: i32,
        creator_faction: Vec<CharacterSnapshot>,
        enemy_faction: Vec<CharacterSnapshot>,
    ) -> Self {
        Self {
            enemy_faction,
            ..Self::new_pve(
                creator_character_id,
                map_id,
                map_difficulty,
                creator_level,
                creator_faction,
            )
        }
    }

    /// Pin both seeds.
    #[must_use]
    pub const fn with_seeds(mut self, battle_seed: i32, item_seed: i32) -> Self {
        self.battle_seed = battle_seed;
        self.item_seed = item_seed;
        self
    }

    /// Check the request and every snapshot can be simulated.
    ///
    /// # Errors
    /// Returns [`CombatError::InvalidSnapshot`] if `creator_level` is below 1,
    /// otherwise the first snapshot validation failure.
    pub fn validate(&self) -> Result<()> {
        if self.creator_level < 1 {
            return Err(CombatError::InvalidSnapshot {
                name: format!("creator {}", self.creator_character_id),
                reason: format!("creator_level {} is below 1", self.creator_level),
            });
        }
        self.creator_faction
            .iter()
            .chain(&self.enemy_faction)
            .try_for_each(CharacterSnapshot::validate)
    }
}

/// Persisted record of a finished battle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatReplayEntity {
    /// Record format version.
    pub version: u32,
    /// Character that started the battle.
    pub creator_character_id: u64,
    /// Map key.
    pub map_id: i32,
    /// Difficulty.
    pub map_difficulty: i32,
    /// Creator level.
    pub creator_level: i32,
    /// Outcome.
    pub battle_result: BattleResult,
    /// Ticks the battle ran.
    pub duration_ticks: u32,
    /// Seed of the combat stream.
    pub battle_seed: i32,
    /// Seed of the item stream.
    pub item_seed: i32,
    /// Creator side as supplied in the request.
    pub creator_faction: Vec<CharacterSnapshot>,
    /// Enemy side as supplied in the request.
    pub enemy_faction: Vec<CharacterSnapshot>,
}

impl CombatReplayEntity {
    /// Record the outcome of `request`.
    #[must_use]
    pub fn from_request(request: &CombatRequest, battle_result: BattleResult, duration_ticks: u32) -> Self {
        Self {
            version: REPLAY_VERSION,
            creator_character_id: request.creator_character_id,
            map_id: request.map_id,
            map_difficulty: request.map_difficulty,
            creator_level: request.creator_level,
            battle_result,
            duration_ticks,
            battle_seed: request.battle_seed,
            item_seed: request.item_seed,
            creator_faction: request.creator_faction.clone(),
            enemy_faction: request.enemy_faction.clone(),
        }
    }

    /// Rebuild the request this record came from, flagged as a replay.
    #[must_use]
    pub fn to_request(&self) -> CombatRequest {
        CombatRequest {
            creator_character_id: self.creator_character_id,
            map_id: self.map_id,
            map_difficulty: self.map_difficulty,
            creator_level: self.creator_level,
            battle_seed: self.battle_seed,
            item_seed: self.item_seed,
            creator_faction: self.creator_faction.clone(),
            enemy_faction: self.enemy_faction.clone(),
            is_replay: true,
        }
    }

    /// Encode to bytes.
    ///
    /// # Errors
    /// Returns [`CombatError::Codec`] if serialization fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| CombatError::Codec(format!("Failed to serialize replay: {e}")))
    }

    /// Decode from bytes, checking the format version.
    ///
    /// # Errors
    /// Returns [`CombatError::Codec`] on malformed input, or
    /// [`CombatError::ReplayVersionMismatch`] for another format version.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let entity: Self = bincode::deserialize(bytes)
            .map_err(|e| CombatError::Codec(format!("Failed to deserialize replay: {e}")))?;

        if entity.version != REPLAY_VERSION {
            return Err(CombatError::ReplayVersionMismatch {
                expected: REPLAY_VERSION,
                found: entity.version,
            });
        }

        Ok(entity)
    }

    /// Save the record to a file.
    ///
    /// # Errors
    /// Returns an error if serialization or file writing fails.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = self.to_bytes()?;
        std::fs::write(path.as_ref(), bytes)
            .map_err(|e| CombatError::Io(format!("Failed to write replay file: {e}")))
    }

    /// Load a record from a file.
    ///
    /// # Errors
    /// Returns an error if file reading or decoding fails.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())
            .map_err(|e| CombatError::Io(format!("Failed to read replay file: {e}")))?;
        Self::from_bytes(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_request() -> CombatRequest {
        CombatRequest::new_pvp(
            9,
            100,
            2,
            3,
            vec![CharacterSnapshot::player("Alice", 3).with_id(9)],
            vec![CharacterSnapshot::player("Bob", 3).with_id(10)],
        )
        .with_seeds(1234, 5678)
    }

    #[test]
    fn test_new_pve_draws_seeds() {
        let request = CombatRequest::new_pve(1, 1, 0, 1, vec![CharacterSnapshot::player("A", 1)]);
        assert!(request.battle_seed >= 0);
        assert!(request.item_seed >= 0);
        assert!(request.enemy_faction.is_empty());
        assert!(!request.is_replay);
    }

    #[test]
    fn test_with_seeds() {
        let request = sample_request();
        assert_eq!(request.battle_seed, 1234);
        assert_eq!(request.item_seed, 5678);
        assert_eq!(request.enemy_faction.len(), 1);
    }

    #[test]
    fn test_validate_rejects_creator_level_below_one() {
        let mut request = sample_request();
        assert!(request.validate().is_ok());

        for level in [0, -10] {
            request.creator_level = level;
            assert!(matches!(
                request.validate(),
                Err(CombatError::InvalidSnapshot { .. })
            ));
        }
    }

    #[test]
    fn test_entity_round_trip_to_request() {
        let request = sample_request();
        let entity = CombatReplayEntity::from_request(&request, BattleResult::Victory, 61);

        assert_eq!(entity.version, REPLAY_VERSION);
        assert_eq!(entity.battle_result, BattleResult::Victory);
        assert_eq!(entity.duration_ticks, 61);

        let replay = entity.to_request();
        assert!(replay.is_replay);
        assert_eq!(
            CombatRequest {
                is_replay: false,
                ..replay
            },
            request
        );
    }

    #[test]
    fn test_bytes_round_trip() {
        let entity = CombatReplayEntity::from_request(&sample_request(), BattleResult::Defeat, 400);
        let bytes = entity.to_bytes().unwrap();
        assert_eq!(CombatReplayEntity::from_bytes(&bytes).unwrap(), entity);
    }

    #[test]
    fn test_version_mismatch() {
        let mut entity = CombatReplayEntity::from_request(&sample_request(), BattleResult::Draw, 1);
        entity.version = REPLAY_VERSION + 1;
        let bytes = entity.to_bytes().unwrap();

        assert_eq!(
            CombatReplayEntity::from_bytes(&bytes),
            Err(CombatError::ReplayVersionMismatch {
                expected: REPLAY_VERSION,
                found: REPLAY_VERSION + 1,
            })
        );
    }

    #[test]
    fn test_garbage_bytes() {
        assert!(matches!(
            CombatReplayEntity::from_bytes(&[1, 2, 3]),
            Err(CombatError::Codec(_))
        ));
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("battle.replay");
        let entity = CombatReplayEntity::from_request(&sample_request(), BattleResult::Timeout, 9000);

        entity.save(&path).unwrap();
        assert_eq!(CombatReplayEntity::load(&path).unwrap(), entity);
        assert!(matches!(
            CombatReplayEntity::load(dir.path().join("missing")),
            Err(CombatError::Io(_))
        ));
    }

    #[test]
    fn test_validate_rejects_bad_snapshot() {
        let mut request = sample_request();
        request.enemy_faction[0].stats.current_health = -1;
        assert!(matches!(
            request.validate(),
            Err(CombatError::InvalidSnapshot { .. })
        ));
    }
}
