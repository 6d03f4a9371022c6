//! Map controller: battle setup, wave spawning, and termination.
//!
//! The controller drives one battle through `Initializing → Running → Over`.
//! It owns the wave schedule and the request; all mutable battle state lives
//! in the [`TickContext`] it is handed each tick.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::actor::{Actor, Faction};
use crate::character::CharacterSnapshot;
use crate::context::{BattleResult, TickContext};
use crate::error::{CombatError, Result};
use crate::math::seconds_to_ticks;
use crate::profiles::{MapType, ProfileCatalog, WaveConfig};
use crate::random::GameRandom;
use crate::request::{CombatReplayEntity, CombatRequest};
use crate::tree::{NodeData, NodeId};

/// Lifecycle phase of a map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MapPhase {
    /// Created, not yet set up.
    Initializing,
    /// Ticking.
    Running,
    /// A result is latched.
    Over,
}

/// Runs one battle on one map.
#[derive(Debug)]
pub struct MapController {
    catalog: Arc<dyn ProfileCatalog>,
    phase: MapPhase,
    request: Option<CombatRequest>,
    map_type: MapType,
    waves: Vec<WaveConfig>,
    current_wave: usize,
}

impl MapController {
    /// Create a controller resolving profiles from `catalog`.
    #[must_use]
    pub fn new(catalog: Arc<dyn ProfileCatalog>) -> Self {
        Self {
            catalog,
            phase: MapPhase::Initializing,
            request: None,
            map_type: MapType::PvE,
            waves: Vec::new(),
            current_wave: 0,
        }
    }

    /// Set up `ctx` for `request`.
    ///
    /// Seeds both streams, spawns the creator faction under a new map root,
    /// then either pre-generates the PvE wave schedule (drawing from the
    /// battle stream before any tick) or spawns the PvP enemy faction.
    ///
    /// # Errors
    /// Returns [`CombatError::UnknownMap`] for a map key the catalog lacks,
    /// or a snapshot validation error. `ctx` is left untouched on error.
    pub fn initialize(&mut self, request: CombatRequest, ctx: &mut TickContext) -> Result<()> {
        let map = self
            .catalog
            .map_profile(request.map_id)
            .ok_or(CombatError::UnknownMap(request.map_id))?;
        request.validate()?;

        let mut battle_random = GameRandom::new(request.battle_seed);
        let waves = match map.map_type() {
            MapType::PvE => map.generate_waves(request.map_difficulty, &mut battle_random)?,
            MapType::PvP => Vec::new(),
        };

        ctx.battle_random = Some(battle_random);
        ctx.item_random = (!request.is_replay).then(|| GameRandom::new(request.item_seed));
        ctx.max_tick = seconds_to_ticks(map.max_battle_seconds());

        let root = ctx.components.insert(map.key(), NodeData::Map);
        ctx.map_node = Some(root);
        spawn_faction(ctx, root, &request.creator_faction, Faction::Creator)?;
        if map.map_type() == MapType::PvP {
            spawn_faction(ctx, root, &request.enemy_faction, Faction::Enemy)?;
        }

        info!(
            map = map.name(),
            map_id = request.map_id,
            battle_seed = request.battle_seed,
            replay = request.is_replay,
            creators = request.creator_faction.len(),
            waves = waves.len(),
            max_tick = ctx.max_tick,
            "Battle initialized"
        );

        self.map_type = map.map_type();
        self.waves = waves;
        self.current_wave = 0;
        self.request = Some(request);
        self.phase = MapPhase::Running;
        Ok(())
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> MapPhase {
        self.phase
    }

    /// Map type resolved at initialization.
    #[must_use]
    pub const fn map_type(&self) -> MapType {
        self.map_type
    }

    /// Full wave schedule.
    #[must_use]
    pub fn waves(&self) -> &[WaveConfig] {
        &self.waves
    }

    /// Number of waves spawned so far.
    #[must_use]
    pub const fn current_wave(&self) -> usize {
        self.current_wave
    }

    /// Check if unspawned waves remain.
    #[must_use]
    pub fn has_pending_waves(&self) -> bool {
        self.current_wave < self.waves.len()
    }

    /// Request this battle was initialized with.
    #[must_use]
    pub const fn request(&self) -> Option<&CombatRequest> {
        self.request.as_ref()
    }

    /// Run one tick: spawn the next wave if due, let every living actor
    /// act (creators first, then enemies), then check for a result.
    pub fn on_tick(&mut self, ctx: &mut TickContext) {
        if self.phase != MapPhase::Running || ctx.is_battle_over() {
            return;
        }

        if self.map_type == MapType::PvE && !ctx.any_alive(Faction::Enemy) && self.has_pending_waves() {
            self.spawn_wave(ctx);
            self.current_wave += 1;
        }

        self.process_faction(Faction::Creator, ctx);
        self.process_faction(Faction::Enemy, ctx);

        self.check_battle_end(ctx);
    }

    /// Latch [`BattleResult::Timeout`] once the tick limit is reached.
    pub fn check_timeout(&mut self, ctx: &mut TickContext) {
        if self.phase == MapPhase::Running && ctx.current_tick >= ctx.max_tick {
            self.finish(ctx, BattleResult::Timeout);
        }
    }

    /// Build the replay record for the battle so far.
    ///
    /// # Errors
    /// Returns [`CombatError::InvalidSnapshot`] if called before
    /// [`MapController::initialize`] succeeded.
    pub fn generate_replay_entity(&self, ctx: &TickContext) -> Result<CombatReplayEntity> {
        let request = self.request.as_ref().ok_or_else(|| CombatError::InvalidSnapshot {
            name: String::from("<map>"),
            reason: String::from("map was never initialized"),
        })?;
        Ok(CombatReplayEntity::from_request(
            request,
            ctx.result(),
            ctx.current_tick,
        ))
    }

    fn spawn_wave(&self, ctx: &mut TickContext) {
        let (Some(wave), Some(root)) = (self.waves.get(self.current_wave), ctx.map_node) else {
            return;
        };
        let level = self.request.as_ref().map_or(1, |r| r.creator_level);

        for &(key, count) in &wave.monster_counts {
            let Some(profile) = self.catalog.monster_profile(key) else {
                continue;
            };
            for _ in 0..count {
                let snapshot = CharacterSnapshot::monster(profile.name(), level, profile.key());
                let mut actor = Actor::from_snapshot(&snapshot, Faction::Enemy);
                profile.apply_level_scaling(&mut actor);
                if let Err(err) = ctx.spawn_actor(root, profile.key(), actor) {
                    error!(%err, wave = wave.wave_number, "Failed to spawn monster");
                }
            }
        }

        debug!(
            tick = ctx.current_tick,
            wave = wave.wave_number,
            monsters = wave.total(),
            "Wave spawned"
        );
    }

    fn process_faction(&self, faction: Faction, ctx: &mut TickContext) {
        let roster: Vec<NodeId> = ctx.faction(faction).to_vec();
        for id in roster {
            let Some(actor) = ctx.actor(id) else {
                continue;
            };
            if !actor.is_alive() {
                continue;
            }
            let actor_type = actor.actor_type;
            let Some(key) = ctx.components.get(id).map(|node| node.profile_key) else {
                continue;
            };
            if let Some(profile) = self.catalog.actor_profile(actor_type, key) {
                profile.on_tick(id, ctx);
            }
        }
    }

    fn check_battle_end(&mut self, ctx: &mut TickContext) {
        let creators_dead = !ctx.any_alive(Faction::Creator);
        let enemies_dead = !ctx.any_alive(Faction::Enemy);

        let result = if creators_dead && enemies_dead {
            BattleResult::Draw
        } else if creators_dead {
            BattleResult::Defeat
        } else if enemies_dead && (self.map_type == MapType::PvP || !self.has_pending_waves()) {
            BattleResult::Victory
        } else {
            return;
        };

        self.finish(ctx, result);
    }

    fn finish(&mut self, ctx: &mut TickContext, result: BattleResult) {
        if ctx.finish(result) {
            debug!(tick = ctx.current_tick, ?result, "Battle over");
        }
        self.phase = MapPhase::Over;
    }
}

fn spawn_faction(
    ctx: &mut TickContext,
    root: NodeId,
    roster: &[CharacterSnapshot],
    faction: Faction,
) -> Result<()> {
    for snapshot in roster {
        ctx.spawn_actor(root, snapshot.profile_key, Actor::from_snapshot(snapshot, faction))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profiles::{BuiltinCatalog, MapKind, MonsterKind};
    use crate::stats::CombatStats;

    fn catalog() -> Arc<dyn ProfileCatalog> {
        Arc::new(BuiltinCatalog)
    }

    fn fighter(name: &str, damage: i32, health: i32) -> CharacterSnapshot {
        CharacterSnapshot::player(name, 1).with_stats(CombatStats {
            max_health: health,
            current_health: health,
            damage_min: damage,
            damage_max: damage,
            crit_chance: 0.0,
            armor: 0,
            ..CombatStats::for_level(1)
        })
    }

    fn pve_request(seed: i32) -> CombatRequest {
        CombatRequest::new_pve(
            1,
            MapKind::StarterVillage.key(),
            0,
            1,
            vec![CharacterSnapshot::player("Hero", 1)],
        )
        .with_seeds(seed, seed + 1)
    }

    fn pvp_request(creators: Vec<CharacterSnapshot>, enemies: Vec<CharacterSnapshot>) -> CombatRequest {
        CombatRequest::new_pvp(1, MapKind::PvPArena.key(), 0, 1, creators, enemies).with_seeds(5, 6)
    }

    #[test]
    fn test_unknown_map() {
        let mut controller = MapController::new(catalog());
        let mut ctx = TickContext::new();
        let mut request = pve_request(1);
        request.map_id = 999;

        assert_eq!(
            controller.initialize(request, &mut ctx),
            Err(CombatError::UnknownMap(999))
        );
        assert_eq!(controller.phase(), MapPhase::Initializing);
        assert!(ctx.components.is_empty());
    }

    #[test]
    fn test_invalid_snapshot_rejected() {
        let mut controller = MapController::new(catalog());
        let mut ctx = TickContext::new();
        let mut request = pve_request(1);
        request.creator_faction[0].stats.damage_min = 50;

        assert!(matches!(
            controller.initialize(request, &mut ctx),
            Err(CombatError::InvalidRange { .. })
        ));
        assert!(ctx.battle_random.is_none());
    }

    #[test]
    fn test_negative_creator_level_spawns_nothing() {
        let mut controller = MapController::new(catalog());
        let mut ctx = TickContext::new();
        let mut request = pve_request(1);
        request.creator_level = -10;

        assert!(matches!(
            controller.initialize(request, &mut ctx),
            Err(CombatError::InvalidSnapshot { .. })
        ));
        assert!(ctx.faction(Faction::Enemy).is_empty());
        assert!(ctx.battle_random.is_none());
    }

    #[test]
    fn test_pve_initialize() {
        let mut controller = MapController::new(catalog());
        let mut ctx = TickContext::new();
        controller.initialize(pve_request(42), &mut ctx).unwrap();

        assert_eq!(controller.phase(), MapPhase::Running);
        assert_eq!(controller.map_type(), MapType::PvE);
        assert_eq!(controller.waves().len(), 2);
        assert_eq!(ctx.max_tick, 3600);
        assert!(ctx.battle_random.is_some());
        assert!(ctx.item_random.is_some());
        assert_eq!(ctx.faction(Faction::Creator).len(), 1);
        assert!(ctx.faction(Faction::Enemy).is_empty());

        // Wave generation drew from the battle stream before the first tick
        assert!(ctx.battle_random.as_ref().unwrap().draws() > 0);

        let root = ctx.map_node.unwrap();
        assert_eq!(ctx.components.children(root), ctx.faction(Faction::Creator));
    }

    #[test]
    fn test_replay_has_no_item_stream() {
        let mut controller = MapController::new(catalog());
        let mut ctx = TickContext::new();
        let mut request = pve_request(42);
        request.is_replay = true;
        controller.initialize(request, &mut ctx).unwrap();
        assert!(ctx.item_random.is_none());
    }

    #[test]
    fn test_first_tick_spawns_wave() {
        let mut controller = MapController::new(catalog());
        let mut ctx = TickContext::new();
        controller.initialize(pve_request(7), &mut ctx).unwrap();
        let expected = controller.waves()[0].total() as usize;

        controller.on_tick(&mut ctx);

        assert_eq!(controller.current_wave(), 1);
        assert_eq!(ctx.faction(Faction::Enemy).len(), expected);
        let goblin = ctx.actor(ctx.faction(Faction::Enemy)[0]).unwrap();
        assert_eq!(goblin.name, "Goblin");
        // Level 1 scaling on Goblin base stats
        assert_eq!(goblin.stats.max_health, 40);
        assert_eq!(goblin.stats.damage_min, 4);
        assert_eq!(goblin.stats.damage_max, 8);
        let node = ctx.components.get(ctx.faction(Faction::Enemy)[0]).unwrap();
        assert_eq!(node.profile_key, MonsterKind::Goblin.key());
    }

    #[test]
    fn test_pvp_spawns_enemy_faction() {
        let mut controller = MapController::new(catalog());
        let mut ctx = TickContext::new();
        controller
            .initialize(
                pvp_request(vec![fighter("A", 10, 30)], vec![fighter("B", 10, 30)]),
                &mut ctx,
            )
            .unwrap();

        assert!(controller.waves().is_empty());
        assert_eq!(ctx.faction(Faction::Enemy).len(), 1);
        assert_eq!(ctx.max_tick, 9000);
        assert_eq!(ctx.battle_random.as_ref().unwrap().draws(), 0);
    }

    #[test]
    fn test_pvp_victory() {
        let mut controller = MapController::new(catalog());
        let mut ctx = TickContext::new();
        controller
            .initialize(
                pvp_request(vec![fighter("A", 100, 30)], vec![fighter("B", 10, 30)]),
                &mut ctx,
            )
            .unwrap();

        controller.on_tick(&mut ctx);
        assert!(ctx.is_battle_over());
        assert_eq!(ctx.result(), BattleResult::Victory);
        assert_eq!(controller.phase(), MapPhase::Over);
    }

    #[test]
    fn test_empty_creator_faction_is_defeat() {
        let mut controller = MapController::new(catalog());
        let mut ctx = TickContext::new();
        controller
            .initialize(pvp_request(Vec::new(), vec![fighter("B", 10, 30)]), &mut ctx)
            .unwrap();

        controller.on_tick(&mut ctx);
        assert_eq!(ctx.result(), BattleResult::Defeat);
    }

    #[test]
    fn test_both_empty_is_draw() {
        let mut controller = MapController::new(catalog());
        let mut ctx = TickContext::new();
        controller
            .initialize(pvp_request(Vec::new(), Vec::new()), &mut ctx)
            .unwrap();

        controller.on_tick(&mut ctx);
        assert_eq!(ctx.result(), BattleResult::Draw);
    }

    #[test]
    fn test_result_latches() {
        let mut controller = MapController::new(catalog());
        let mut ctx = TickContext::new();
        controller
            .initialize(
                pvp_request(vec![fighter("A", 100, 30)], vec![fighter("B", 10, 30)]),
                &mut ctx,
            )
            .unwrap();
        controller.on_tick(&mut ctx);

        ctx.current_tick = ctx.max_tick;
        controller.check_timeout(&mut ctx);
        controller.on_tick(&mut ctx);
        assert_eq!(ctx.result(), BattleResult::Victory);
    }

    #[test]
    fn test_check_timeout() {
        let mut controller = MapController::new(catalog());
        let mut ctx = TickContext::new();
        controller
            .initialize(
                pvp_request(vec![fighter("A", 1, 1000)], vec![fighter("B", 1, 1000)]),
                &mut ctx,
            )
            .unwrap();

        ctx.current_tick = ctx.max_tick - 1;
        controller.check_timeout(&mut ctx);
        assert!(!ctx.is_battle_over());

        ctx.current_tick = ctx.max_tick;
        controller.check_timeout(&mut ctx);
        assert_eq!(ctx.result(), BattleResult::Timeout);
    }

    #[test]
    fn test_generate_replay_entity() {
        let mut controller = MapController::new(catalog());
        let mut ctx = TickContext::new();
        assert!(controller.generate_replay_entity(&ctx).is_err());

        let request = pve_request(3);
        controller.initialize(request.clone(), &mut ctx).unwrap();
        ctx.current_tick = 17;

        let entity = controller.generate_replay_entity(&ctx).unwrap();
        assert_eq!(entity.duration_ticks, 17);
        assert_eq!(entity.battle_seed, request.battle_seed);
        assert_eq!(entity.item_seed, request.item_seed);
        assert_eq!(entity.creator_faction, request.creator_faction);
    }
}
