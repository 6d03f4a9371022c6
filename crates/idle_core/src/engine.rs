//! Combat engine: runs battles to completion and replays recorded ones.
//!
//! ```
//! use idle_core::prelude::*;
//!
//! let engine = CombatEngine::default();
//! let request = CombatRequest::new_pve(1, 1, 0, 1, vec![CharacterSnapshot::player("Hero", 1)])
//!     .with_seeds(42, 43);
//! let record = engine.run_battle(request).unwrap();
//!
//! let last = engine.replay_battle(&record).unwrap().last().unwrap();
//! assert_eq!(last.result, record.battle_result);
//! assert_eq!(last.tick, record.duration_ticks);
//! ```

use std::iter::FusedIterator;
use std::sync::Arc;

use tracing::info;

use crate::context::{BattleResult, ContextSnapshot, TickContext};
use crate::error::Result;
use crate::map_controller::MapController;
use crate::profiles::{BuiltinCatalog, ProfileCatalog};
use crate::request::{CombatReplayEntity, CombatRequest};

/// One initialized battle, stepped a tick at a time.
///
/// Callers that need cancellation check their condition between
/// [`Battle::advance`] calls; dropping the battle releases its context.
#[derive(Debug)]
pub struct Battle {
    controller: MapController,
    context: TickContext,
}

impl Battle {
    /// Initialize a battle for `request`.
    ///
    /// # Errors
    /// Returns an error if the map is unknown or a snapshot is invalid.
    pub fn new(request: CombatRequest, catalog: Arc<dyn ProfileCatalog>) -> Result<Self> {
        let mut controller = MapController::new(catalog);
        let mut context = TickContext::new();
        controller.initialize(request, &mut context)?;
        Ok(Self {
            controller,
            context,
        })
    }

    /// Run one tick.
    ///
    /// Returns `false` without doing anything once the battle is over.
    /// Otherwise runs the map's tick (unless the tick limit is already
    /// reached), advances the tick counter, latches a timeout at the limit,
    /// and returns `true`.
    pub fn advance(&mut self) -> bool {
        if self.context.is_battle_over() {
            return false;
        }

        if self.context.current_tick < self.context.max_tick {
            self.controller.on_tick(&mut self.context);
            self.context.current_tick += 1;
        }
        self.controller.check_timeout(&mut self.context);

        #[cfg(feature = "debug-validation")]
        tracing::debug!(
            tick = self.context.current_tick,
            state_hash = self.context.state_hash(),
            "Battle state hash"
        );

        true
    }

    /// Advance until the battle is over.
    pub fn run_to_end(&mut self) {
        while self.advance() {}
    }

    /// Check if the battle has a result.
    #[must_use]
    pub const fn is_over(&self) -> bool {
        self.context.is_battle_over()
    }

    /// Outcome so far.
    #[must_use]
    pub const fn result(&self) -> BattleResult {
        self.context.result()
    }

    /// Ticks completed.
    #[must_use]
    pub const fn current_tick(&self) -> u32 {
        self.context.current_tick
    }

    /// The battle's context.
    #[must_use]
    pub const fn context(&self) -> &TickContext {
        &self.context
    }

    /// The battle's map controller.
    #[must_use]
    pub const fn controller(&self) -> &MapController {
        &self.controller
    }

    /// Snapshot of the current state.
    #[must_use]
    pub fn snapshot(&self) -> ContextSnapshot {
        self.context.snapshot()
    }

    /// Hash of the current state.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        self.context.state_hash()
    }

    /// Replay record for the battle so far.
    ///
    /// # Errors
    /// Infallible for a battle built by [`Battle::new`]; see
    /// [`MapController::generate_replay_entity`].
    pub fn replay_entity(&self) -> Result<CombatReplayEntity> {
        self.controller.generate_replay_entity(&self.context)
    }
}

/// Lazy tick-by-tick replay of a recorded battle.
///
/// Yields one [`ContextSnapshot`] after every tick. Single pass: to iterate
/// again, call [`CombatEngine::replay_battle`] again.
#[derive(Debug)]
pub struct ReplayIter {
    battle: Battle,
}

impl ReplayIter {
    /// The battle being replayed.
    #[must_use]
    pub const fn battle(&self) -> &Battle {
        &self.battle
    }
}

impl Iterator for ReplayIter {
    type Item = ContextSnapshot;

    fn next(&mut self) -> Option<Self::Item> {
        self.battle.advance().then(|| self.battle.snapshot())
    }
}

impl FusedIterator for ReplayIter {}

/// Entry point for running and replaying battles.
///
/// Cheap to clone and safe to share across threads; each battle gets its
/// own context.
#[derive(Debug, Clone)]
pub struct CombatEngine {
    catalog: Arc<dyn ProfileCatalog>,
}

impl Default for CombatEngine {
    fn default() -> Self {
        Self::new(Arc::new(BuiltinCatalog))
    }
}

impl CombatEngine {
    /// Create an engine resolving profiles from `catalog`.
    #[must_use]
    pub fn new(catalog: Arc<dyn ProfileCatalog>) -> Self {
        Self { catalog }
    }

    /// The profile catalog in use.
    #[must_use]
    pub fn catalog(&self) -> &Arc<dyn ProfileCatalog> {
        &self.catalog
    }

    /// Initialize a battle without running it.
    ///
    /// # Errors
    /// Returns an error if the map is unknown or a snapshot is invalid.
    pub fn start_battle(&self, request: CombatRequest) -> Result<Battle> {
        Battle::new(request, Arc::clone(&self.catalog))
    }

    /// Run a battle to completion and return its replay record.
    ///
    /// # Errors
    /// Returns an error if the map is unknown or a snapshot is invalid.
    pub fn run_battle(&self, request: CombatRequest) -> Result<CombatReplayEntity> {
        let mut battle = self.start_battle(request)?;
        battle.run_to_end();
        let entity = battle.replay_entity()?;

        info!(
            map_id = entity.map_id,
            result = ?entity.battle_result,
            duration_ticks = entity.duration_ticks,
            "Battle finished"
        );
        Ok(entity)
    }

    /// Replay a recorded battle lazily, one snapshot per tick.
    ///
    /// # Errors
    /// Returns an error if the record names an unknown map or carries
    /// invalid snapshots.
    pub fn replay_battle(&self, entity: &CombatReplayEntity) -> Result<ReplayIter> {
        let battle = self.start_battle(entity.to_request())?;
        Ok(ReplayIter { battle })
    }

    /// Replay a record to completion and check it reproduces its outcome.
    ///
    /// # Errors
    /// Returns an error if the replay cannot be initialized.
    pub fn verify_replay(&self, entity: &CombatReplayEntity) -> Result<bool> {
        let mut battle = self.start_battle(entity.to_request())?;
        battle.run_to_end();
        Ok(battle.result() == entity.battle_result && battle.current_tick() == entity.duration_ticks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::CharacterSnapshot;
    use crate::error::CombatError;
    use crate::profiles::MapKind;
    use crate::stats::CombatStats;

    fn fighter(name: &str, damage: i32, health: i32) -> CharacterSnapshot {
        CharacterSnapshot::player(name, 1).with_stats(CombatStats {
            max_health: health,
            current_health: health,
            damage_min: damage,
            damage_max: damage,
            attack_speed: 1.0,
            crit_chance: 0.0,
            armor: 0,
            ..CombatStats::for_level(1)
        })
    }

    fn mirror_request() -> CombatRequest {
        CombatRequest::new_pvp(
            1,
            MapKind::PvPArena.key(),
            0,
            1,
            vec![fighter("Alice", 10, 30)],
            vec![fighter("Bob", 10, 30)],
        )
        .with_seeds(100, 200)
    }

    #[test]
    fn test_mirror_match_creator_wins() {
        let engine = CombatEngine::default();
        let record = engine.run_battle(mirror_request()).unwrap();

        // Attacks land on ticks 0, 30 and 60; creators act first
        assert_eq!(record.battle_result, BattleResult::Victory);
        assert_eq!(record.duration_ticks, 61);
    }

    #[test]
    fn test_unknown_map_fails() {
        let engine = CombatEngine::default();
        let mut request = mirror_request();
        request.map_id = 4242;
        assert_eq!(
            engine.run_battle(request).unwrap_err(),
            CombatError::UnknownMap(4242)
        );
    }

    #[test]
    fn test_advance_stops_after_over() {
        let engine = CombatEngine::default();
        let mut battle = engine.start_battle(mirror_request()).unwrap();

        let mut steps = 0;
        while battle.advance() {
            steps += 1;
        }
        assert_eq!(steps, 61);
        assert!(battle.is_over());
        assert!(!battle.advance());
        assert_eq!(battle.current_tick(), 61);
    }

    #[test]
    fn test_replay_yields_snapshot_per_tick() {
        let engine = CombatEngine::default();
        let record = engine.run_battle(mirror_request()).unwrap();

        let snapshots: Vec<_> = engine.replay_battle(&record).unwrap().collect();
        assert_eq!(snapshots.len(), 61);
        for (i, snapshot) in snapshots.iter().enumerate() {
            assert_eq!(snapshot.tick, i as u32 + 1);
        }
        let last = snapshots.last().unwrap();
        assert!(last.is_battle_over);
        assert_eq!(last.result, record.battle_result);
        assert_eq!(last.tick, record.duration_ticks);
        assert!(!last.enemy_faction[0].is_alive);
    }

    #[test]
    fn test_replay_is_repeatable() {
        let engine = CombatEngine::default();
        let record = engine.run_battle(mirror_request()).unwrap();

        let first: Vec<_> = engine.replay_battle(&record).unwrap().collect();
        let second: Vec<_> = engine.replay_battle(&record).unwrap().collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_replay_iter_is_fused() {
        let engine = CombatEngine::default();
        let record = engine.run_battle(mirror_request()).unwrap();
        let mut iter = engine.replay_battle(&record).unwrap();
        for _ in iter.by_ref() {}
        assert!(iter.next().is_none());
        assert!(iter.battle().is_over());
    }

    #[test]
    fn test_replay_ends_in_same_state_hash() {
        let engine = CombatEngine::default();
        let mut battle = engine.start_battle(mirror_request()).unwrap();
        battle.run_to_end();
        let record = battle.replay_entity().unwrap();

        let mut replay = engine.start_battle(record.to_request()).unwrap();
        assert!(replay.context().item_random.is_none());
        replay.run_to_end();
        assert_eq!(replay.state_hash(), battle.state_hash());
    }

    #[test]
    fn test_verify_replay() {
        let engine = CombatEngine::default();
        let mut record = engine.run_battle(mirror_request()).unwrap();
        assert!(engine.verify_replay(&record).unwrap());

        record.duration_ticks += 1;
        assert!(!engine.verify_replay(&record).unwrap());
    }

    #[test]
    fn test_engine_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CombatEngine>();
        fn assert_send<T: Send>() {}
        assert_send::<Battle>();
    }
}
