//! Battle metrics collection for balance analysis.
//!
//! Metrics are gathered from the battle context at start and at finish, so
//! collecting them adds no per-tick cost.

use std::collections::HashMap;

use idle_core::prelude::{Battle, BattleResult, Faction, NodeId, TickContext};
use serde::{Deserialize, Serialize};

/// Complete metrics for a single battle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BattleMetrics {
    /// Unique battle identifier.
    pub battle_id: String,
    /// Scenario name.
    pub scenario: String,
    /// Combat stream seed.
    pub battle_seed: i32,
    /// Item stream seed.
    pub item_seed: i32,
    /// Outcome.
    pub result: BattleResult,
    /// Total battle duration in ticks.
    pub duration_ticks: u32,
    /// PvE waves spawned.
    pub waves_spawned: usize,
    /// Creator side.
    pub creators: FactionMetrics,
    /// Enemy side.
    pub enemies: FactionMetrics,
    /// Final context state hash (for determinism validation).
    pub final_state_hash: u64,
}

/// Metrics for one side of a battle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactionMetrics {
    /// Actors that fought on this side.
    pub actors: u32,
    /// Actors still alive at the end.
    pub survivors: u32,
    /// Health lost over the battle.
    pub damage_taken: i64,
    /// Health left at the end.
    pub health_remaining: i64,
}

impl FactionMetrics {
    fn collect(ctx: &TickContext, faction: Faction, initial_health: &HashMap<NodeId, i32>) -> Self {
        let mut metrics = Self::default();
        for &id in ctx.faction(faction) {
            let Some(actor) = ctx.actor(id) else {
                continue;
            };
            let start = initial_health
                .get(&id)
                .copied()
                .unwrap_or(actor.stats.max_health);
            metrics.actors += 1;
            if actor.is_alive() {
                metrics.survivors += 1;
            }
            metrics.damage_taken += i64::from(start) - i64::from(actor.stats.current_health);
            metrics.health_remaining += i64::from(actor.stats.current_health);
        }
        metrics
    }
}

/// Records the starting state of a battle and builds its metrics at the end.
///
/// Actors spawned after [`MetricsCollector::start`] (PvE waves) are assumed
/// to enter at full health.
#[derive(Debug, Default)]
pub struct MetricsCollector {
    battle_id: String,
    scenario: String,
    initial_health: HashMap<NodeId, i32>,
}

impl MetricsCollector {
    /// Create a new metrics collector.
    #[must_use]
    pub fn new(battle_id: impl Into<String>, scenario: impl Into<String>) -> Self {
        Self {
            battle_id: battle_id.into(),
            scenario: scenario.into(),
            initial_health: HashMap::new(),
        }
    }

    /// Record starting health of every actor already in the battle.
    pub fn start(&mut self, ctx: &TickContext) {
        for faction in [Faction::Creator, Faction::Enemy] {
            for &id in ctx.faction(faction) {
                if let Some(actor) = ctx.actor(id) {
                    self.initial_health.insert(id, actor.stats.current_health);
                }
            }
        }
    }

    /// Build metrics for the battle in its current state.
    #[must_use]
    pub fn finish(self, battle: &Battle) -> BattleMetrics {
        let ctx = battle.context();
        let (battle_seed, item_seed) = battle
            .controller()
            .request()
            .map_or((0, 0), |r| (r.battle_seed, r.item_seed));

        BattleMetrics {
            battle_id: self.battle_id,
            scenario: self.scenario,
            battle_seed,
            item_seed,
            result: battle.result(),
            duration_ticks: battle.current_tick(),
            waves_spawned: battle.controller().current_wave(),
            creators: FactionMetrics::collect(ctx, Faction::Creator, &self.initial_health),
            enemies: FactionMetrics::collect(ctx, Faction::Enemy, &self.initial_health),
            final_state_hash: battle.state_hash(),
        }
    }
}

/// Summary statistics across multiple battles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Total battles played.
    pub total_battles: u32,
    /// Creator victories.
    pub victories: u32,
    /// Creator defeats.
    pub defeats: u32,
    /// Draws.
    pub draws: u32,
    /// Battles that hit the tick limit.
    pub timeouts: u32,
    /// Fraction of battles the creators won.
    pub win_rate: f64,
    /// Average battle duration in ticks.
    pub avg_duration_ticks: f64,
    /// Shortest battle.
    pub min_duration_ticks: u32,
    /// Longest battle.
    pub max_duration_ticks: u32,
    /// Average health the creators lost per battle.
    pub avg_creator_damage_taken: f64,
    /// Average enemies killed per battle.
    pub avg_enemies_defeated: f64,
}

impl BatchSummary {
    /// Calculate summary from a list of battle metrics.
    #[must_use]
    pub fn from_battles(battles: &[BattleMetrics]) -> Self {
        if battles.is_empty() {
            return Self::default();
        }

        let mut summary = Self {
            total_battles: battles.len() as u32,
            min_duration_ticks: u32::MAX,
            ..Default::default()
        };

        let mut duration_sum = 0u64;
        let mut damage_sum = 0i64;
        let mut defeated_sum = 0u64;

        for battle in battles {
            duration_sum += u64::from(battle.duration_ticks);
            summary.min_duration_ticks = summary.min_duration_ticks.min(battle.duration_ticks);
            summary.max_duration_ticks = summary.max_duration_ticks.max(battle.duration_ticks);
            damage_sum += battle.creators.damage_taken;
            defeated_sum += u64::from(battle.enemies.actors - battle.enemies.survivors);

            match battle.result {
                BattleResult::Victory => summary.victories += 1,
                BattleResult::Defeat => summary.defeats += 1,
                BattleResult::Draw => summary.draws += 1,
                BattleResult::Timeout => summary.timeouts += 1,
                _ => {}
            }
        }

        let count = battles.len() as f64;
        summary.win_rate = f64::from(summary.victories) / count;
        summary.avg_duration_ticks = duration_sum as f64 / count;
        summary.avg_creator_damage_taken = damage_sum as f64 / count;
        summary.avg_enemies_defeated = defeated_sum as f64 / count;
        summary
    }

    /// Check if the creator win rate is within `threshold` of 50%.
    #[must_use]
    pub fn is_balanced(&self, threshold: f64) -> bool {
        (self.win_rate - 0.5).abs() <= threshold
    }
}
