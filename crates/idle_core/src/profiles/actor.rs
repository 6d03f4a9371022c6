//! Actor behavior profiles.
//!
//! A profile is a stateless value shared by every actor that uses it. All
//! mutable state lives on the [`Actor`] inside the battle's arena; the profile
//! only decides what to do with it each tick.

use std::fmt::Debug;

use serde::{Deserialize, Serialize};
use tracing::{error, trace, warn};

use crate::actor::{Actor, ActorType};
use crate::combat::resolve_attack;
use crate::context::TickContext;
use crate::tree::NodeId;

/// Base values a profile scales by level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaseStats {
    /// Base maximum health.
    pub max_health: i32,
    /// Base maximum energy.
    pub max_energy: i32,
    /// Base lowest damage roll.
    pub damage_min: i32,
    /// Base highest damage roll.
    pub damage_max: i32,
    /// Attacks per second.
    pub attack_speed: f32,
}

impl BaseStats {
    /// Base stats used when a profile does not override them.
    pub const DEFAULT: Self = Self {
        max_health: 100,
        max_energy: 50,
        damage_min: 5,
        damage_max: 10,
        attack_speed: 1.0,
    };
}

impl Default for BaseStats {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Per-tick behavior of one actor family.
///
/// The provided methods implement the standard melee loop: tick down the
/// cooldown, keep or reacquire a target, attack when ready. Profiles override
/// individual steps.
pub trait ActorProfile: Debug + Send + Sync {
    /// Profile key.
    fn key(&self) -> i32;

    /// Display name, used for spawned monsters.
    fn name(&self) -> &str;

    /// Actor type this profile drives.
    fn actor_type(&self) -> ActorType;

    /// Base stats scaled by [`ActorProfile::apply_level_scaling`].
    fn base_stats(&self) -> BaseStats {
        BaseStats::DEFAULT
    }

    /// Run one tick for the actor at `actor`.
    fn on_tick(&self, actor: NodeId, ctx: &mut TickContext) {
        let Some(state) = ctx.actor_mut(actor) else {
            return;
        };
        if !state.is_alive() {
            return;
        }

        state.attack_cooldown_ticks = state.attack_cooldown_ticks.saturating_sub(1);
        let cooldown = state.attack_cooldown_ticks;
        let target = state.current_target;

        let target = match target {
            Some(id) if ctx.is_alive(id) => Some(id),
            _ => {
                let found = self.find_target(actor, ctx);
                if let Some(state) = ctx.actor_mut(actor) {
                    state.current_target = found;
                }
                found
            }
        };

        if let Some(target) = target {
            if cooldown == 0 {
                self.attack(actor, target, ctx);
            }
        }
    }

    /// First living member of the opposing faction, in roster order.
    fn find_target(&self, actor: NodeId, ctx: &TickContext) -> Option<NodeId> {
        let faction = ctx.actor(actor)?.faction;
        ctx.faction(faction.opponent())
            .iter()
            .copied()
            .find(|&id| ctx.is_alive(id))
    }

    /// Resolve one attack from `attacker` on `target`.
    fn attack(&self, attacker: NodeId, target: NodeId, ctx: &mut TickContext) {
        let tick = ctx.current_tick;
        let Some(rng) = ctx.battle_random.as_mut() else {
            warn!(tick, attacker, "Attack skipped: no battle random stream");
            return;
        };
        let Some(stats) = ctx
            .components
            .get(attacker)
            .and_then(|node| node.as_actor())
            .map(|a| a.stats.clone())
        else {
            return;
        };
        let Some(armor) = ctx
            .components
            .get(target)
            .and_then(|node| node.as_actor())
            .map(|a| a.stats.armor)
        else {
            return;
        };

        let outcome = match resolve_attack(rng, &stats, armor) {
            Ok(outcome) => outcome,
            Err(err) => {
                error!(tick, attacker, %err, "Attack roll failed, skipping");
                return;
            }
        };

        if let Some(defender) = ctx.actor_mut(target) {
            defender.take_damage(outcome.damage);
            trace!(
                tick,
                attacker,
                target,
                damage = outcome.damage,
                critical = outcome.critical,
                remaining = defender.stats.current_health,
                "Attack"
            );
        }
        if let Some(state) = ctx.actor_mut(attacker) {
            state.attack_cooldown_ticks = outcome.cooldown_ticks;
        }
    }

    /// Rebuild the actor's stats from this profile's base values and its level.
    ///
    /// Pools are floored at zero and the damage range never inverts, so the
    /// result always passes snapshot validation.
    fn apply_level_scaling(&self, actor: &mut Actor) {
        let base = self.base_stats();
        let level = actor.level;
        let stats = &mut actor.stats;

        stats.max_health = base.max_health.saturating_add(level.saturating_mul(10)).max(0);
        stats.current_health = stats.max_health;
        stats.max_energy = base.max_energy.saturating_add(level.saturating_mul(5)).max(0);
        stats.current_energy = stats.max_energy;
        stats.damage_min = base.damage_min.saturating_add(level).max(0);
        stats.damage_max = base
            .damage_max
            .saturating_add(level.saturating_mul(2))
            .clamp(stats.damage_min, i32::MAX - 1);
        stats.attack_speed = base.attack_speed;
        stats.armor = level.saturating_mul(5);
        stats.evasion = level.saturating_mul(3);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::Faction;
    use crate::character::CharacterSnapshot;
    use crate::random::GameRandom;
    use crate::stats::CombatStats;
    use crate::tree::NodeData;

    #[derive(Debug)]
    struct Plain;

    impl ActorProfile for Plain {
        fn key(&self) -> i32 {
            0
        }
        fn name(&self) -> &str {
            "plain"
        }
        fn actor_type(&self) -> ActorType {
            ActorType::Monster
        }
    }

    fn fixed_stats(damage: i32, health: i32) -> CombatStats {
        CombatStats {
            max_health: health,
            current_health: health,
            damage_min: damage,
            damage_max: damage,
            attack_speed: 1.0,
            crit_chance: 0.0,
            armor: 0,
            ..CombatStats::for_level(1)
        }
    }

    fn spawn(ctx: &mut TickContext, name: &str, faction: Faction, stats: CombatStats) -> NodeId {
        let map = match ctx.map_node {
            Some(map) => map,
            None => {
                let map = ctx.components.insert(100, NodeData::Map);
                ctx.map_node = Some(map);
                map
            }
        };
        let snapshot = CharacterSnapshot::monster(name, 1, 0).with_stats(stats);
        ctx.spawn_actor(map, 0, Actor::from_snapshot(&snapshot, faction))
            .unwrap()
    }

    #[test]
    fn test_on_tick_acquires_target_and_attacks() {
        let mut ctx = TickContext::new();
        ctx.battle_random = Some(GameRandom::new(1));
        let a = spawn(&mut ctx, "a", Faction::Creator, fixed_stats(10, 30));
        let b = spawn(&mut ctx, "b", Faction::Enemy, fixed_stats(10, 30));

        Plain.on_tick(a, &mut ctx);

        let attacker = ctx.actor(a).unwrap();
        assert_eq!(attacker.current_target, Some(b));
        assert_eq!(attacker.attack_cooldown_ticks, 30);
        assert_eq!(ctx.actor(b).unwrap().stats.current_health, 20);
    }

    #[test]
    fn test_cooldown_blocks_attack() {
        let mut ctx = TickContext::new();
        ctx.battle_random = Some(GameRandom::new(1));
        let a = spawn(&mut ctx, "a", Faction::Creator, fixed_stats(10, 30));
        let b = spawn(&mut ctx, "b", Faction::Enemy, fixed_stats(10, 30));

        Plain.on_tick(a, &mut ctx);
        for _ in 0..29 {
            Plain.on_tick(a, &mut ctx);
        }
        assert_eq!(ctx.actor(b).unwrap().stats.current_health, 20);
        assert_eq!(ctx.actor(a).unwrap().attack_cooldown_ticks, 1);

        Plain.on_tick(a, &mut ctx);
        assert_eq!(ctx.actor(b).unwrap().stats.current_health, 10);
    }

    #[test]
    fn test_retargets_after_kill() {
        let mut ctx = TickContext::new();
        ctx.battle_random = Some(GameRandom::new(1));
        let a = spawn(&mut ctx, "a", Faction::Creator, fixed_stats(50, 30));
        let b = spawn(&mut ctx, "b", Faction::Enemy, fixed_stats(1, 10));
        let c = spawn(&mut ctx, "c", Faction::Enemy, fixed_stats(1, 10));

        Plain.on_tick(a, &mut ctx);
        assert!(!ctx.is_alive(b));
        ctx.actor_mut(a).unwrap().attack_cooldown_ticks = 0;

        Plain.on_tick(a, &mut ctx);
        assert_eq!(ctx.actor(a).unwrap().current_target, Some(c));
        assert!(!ctx.is_alive(c));
    }

    #[test]
    fn test_missing_random_skips_attack() {
        let mut ctx = TickContext::new();
        let a = spawn(&mut ctx, "a", Faction::Creator, fixed_stats(10, 30));
        let b = spawn(&mut ctx, "b", Faction::Enemy, fixed_stats(10, 30));

        Plain.on_tick(a, &mut ctx);

        assert_eq!(ctx.actor(a).unwrap().current_target, Some(b));
        assert_eq!(ctx.actor(b).unwrap().stats.current_health, 30);
        assert_eq!(ctx.actor(a).unwrap().attack_cooldown_ticks, 0);
    }

    #[test]
    fn test_inverted_range_skips_attack() {
        let mut ctx = TickContext::new();
        ctx.battle_random = Some(GameRandom::new(1));
        let mut broken = fixed_stats(10, 30);
        broken.damage_min = 20;
        let a = spawn(&mut ctx, "a", Faction::Creator, broken);
        let b = spawn(&mut ctx, "b", Faction::Enemy, fixed_stats(10, 30));

        Plain.on_tick(a, &mut ctx);
        assert_eq!(ctx.actor(b).unwrap().stats.current_health, 30);
    }

    #[test]
    fn test_dead_actor_does_nothing() {
        let mut ctx = TickContext::new();
        ctx.battle_random = Some(GameRandom::new(1));
        let a = spawn(&mut ctx, "a", Faction::Creator, fixed_stats(10, 30));
        let b = spawn(&mut ctx, "b", Faction::Enemy, fixed_stats(10, 30));
        ctx.actor_mut(a).unwrap().take_damage(100);
        ctx.actor_mut(a).unwrap().attack_cooldown_ticks = 5;

        Plain.on_tick(a, &mut ctx);
        assert_eq!(ctx.actor(a).unwrap().attack_cooldown_ticks, 5);
        assert_eq!(ctx.actor(b).unwrap().stats.current_health, 30);
    }

    #[test]
    fn test_no_target_available() {
        let mut ctx = TickContext::new();
        ctx.battle_random = Some(GameRandom::new(1));
        let a = spawn(&mut ctx, "a", Faction::Creator, fixed_stats(10, 30));

        Plain.on_tick(a, &mut ctx);
        assert_eq!(ctx.actor(a).unwrap().current_target, None);
        assert_eq!(ctx.battle_random.as_ref().unwrap().draws(), 0);
    }

    #[test]
    fn test_apply_level_scaling() {
        let mut actor = Actor::from_snapshot(&CharacterSnapshot::monster("m", 4, 0), Faction::Enemy);
        actor.stats.current_health = 1;
        Plain.apply_level_scaling(&mut actor);

        assert_eq!(actor.stats.max_health, 140);
        assert_eq!(actor.stats.current_health, 140);
        assert_eq!(actor.stats.max_energy, 70);
        assert_eq!(actor.stats.damage_min, 9);
        assert_eq!(actor.stats.damage_max, 18);
        assert_eq!(actor.stats.armor, 20);
        assert_eq!(actor.stats.evasion, 12);
    }

    #[derive(Debug)]
    struct Broken;

    impl ActorProfile for Broken {
        fn key(&self) -> i32 {
            1
        }
        fn name(&self) -> &str {
            "broken"
        }
        fn actor_type(&self) -> ActorType {
            ActorType::Monster
        }
        fn base_stats(&self) -> BaseStats {
            BaseStats {
                max_health: -500,
                max_energy: -500,
                damage_min: 10,
                damage_max: 2,
                attack_speed: 1.0,
            }
        }
    }

    #[test]
    fn test_apply_level_scaling_keeps_stats_valid() {
        let mut actor = Actor::from_snapshot(&CharacterSnapshot::monster("m", 1, 1), Faction::Enemy);
        Broken.apply_level_scaling(&mut actor);

        assert_eq!(actor.stats.max_health, 0);
        assert_eq!(actor.stats.current_health, 0);
        assert_eq!(actor.stats.max_energy, 0);
        assert_eq!(actor.stats.damage_min, 11);
        assert_eq!(actor.stats.damage_max, 11);
        assert!(actor.stats.validate("m").is_ok());

        // Negative levels shrink stats but never below zero
        let mut actor = Actor::from_snapshot(&CharacterSnapshot::monster("m", -10, 0), Faction::Enemy);
        Plain.apply_level_scaling(&mut actor);
        assert_eq!(actor.stats.max_health, 0);
        assert_eq!(actor.stats.max_energy, 0);
        assert_eq!(actor.stats.damage_min, 0);
        assert_eq!(actor.stats.damage_max, 0);
        assert!(actor.stats.validate("m").is_ok());
    }
}
