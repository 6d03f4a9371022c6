//! Per-battle mutable state.
//!
//! A [`TickContext`] owns everything one battle mutates: the tick counters,
//! both random streams, the component arena, and the faction rosters. It is
//! never shared between battles. Dropping it runs [`TickContext::dispose`].

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::actor::{Actor, Faction};
use crate::error::Result;
use crate::random::GameRandom;
use crate::tree::{ComponentTree, NodeData, NodeId};

/// Outcome of a battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum BattleResult {
    /// Not decided yet.
    #[default]
    NotSpecified,
    /// The creator faction won.
    Victory,
    /// The creator faction was wiped out.
    Defeat,
    /// The tick limit was reached with both sides standing.
    Timeout,
    /// Both factions died on the same tick.
    Draw,
    /// Reserved for callers; the engine never produces it.
    Error,
    /// Reserved for callers; the engine never produces it.
    PlayerExit,
}

impl BattleResult {
    /// Check if this is a decided outcome.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::NotSpecified)
    }
}

/// Per-actor view inside a [`ContextSnapshot`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorState {
    /// Arena node of the actor.
    pub node: NodeId,
    /// Display name.
    pub name: String,
    /// Side.
    pub faction: Faction,
    /// Health at snapshot time.
    pub current_health: i32,
    /// Maximum health.
    pub max_health: i32,
    /// Whether health is above zero.
    pub is_alive: bool,
    /// Current attack target.
    pub current_target: Option<NodeId>,
    /// Remaining attack cooldown.
    pub attack_cooldown_ticks: u32,
}

impl ActorState {
    fn capture(node: NodeId, actor: &Actor) -> Self {
        Self {
            node,
            name: actor.name.clone(),
            faction: actor.faction,
            current_health: actor.stats.current_health,
            max_health: actor.stats.max_health,
            is_alive: actor.is_alive(),
            current_target: actor.current_target,
            attack_cooldown_ticks: actor.attack_cooldown_ticks,
        }
    }
}

/// Immutable view of a battle after one tick. Elements of a replay trace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContextSnapshot {
    /// Ticks completed so far.
    pub tick: u32,
    /// Whether the battle has ended.
    pub is_battle_over: bool,
    /// Outcome so far.
    pub result: BattleResult,
    /// Creator faction in roster order.
    pub creator_faction: Vec<ActorState>,
    /// Enemy faction in roster order.
    pub enemy_faction: Vec<ActorState>,
}

impl ContextSnapshot {
    /// Total health remaining on one side.
    #[must_use]
    pub fn faction_health(&self, faction: Faction) -> i64 {
        let roster = match faction {
            Faction::Creator => &self.creator_faction,
            Faction::Enemy => &self.enemy_faction,
            Faction::NotSpecified => return 0,
        };
        roster.iter().map(|a| i64::from(a.current_health)).sum()
    }
}

/// Mutable state of one running battle.
#[derive(Debug, Default)]
pub struct TickContext {
    /// Ticks completed.
    pub current_tick: u32,
    /// Tick limit; reaching it unresolved ends in [`BattleResult::Timeout`].
    pub max_tick: u32,
    is_battle_over: bool,
    result: BattleResult,
    /// Combat stream. Every combat roll draws from here.
    pub battle_random: Option<GameRandom>,
    /// Item stream. Absent during replays.
    pub item_random: Option<GameRandom>,
    /// Arena holding the map, actors, and projectiles.
    pub components: ComponentTree,
    /// Map root node, once created.
    pub map_node: Option<NodeId>,
    creator_faction: Vec<NodeId>,
    enemy_faction: Vec<NodeId>,
    projectiles: Vec<NodeId>,
}

impl TickContext {
    /// Create an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if the battle has ended.
    #[must_use]
    pub const fn is_battle_over(&self) -> bool {
        self.is_battle_over
    }

    /// Outcome so far.
    #[must_use]
    pub const fn result(&self) -> BattleResult {
        self.result
    }

    /// End the battle with `result`.
    ///
    /// Latching: once over, later calls are ignored. Returns whether this
    /// call decided the battle.
    pub fn finish(&mut self, result: BattleResult) -> bool {
        if self.is_battle_over {
            return false;
        }
        self.is_battle_over = true;
        self.result = result;
        true
    }

    /// Roster of one side, in spawn order.
    #[must_use]
    pub fn faction(&self, faction: Faction) -> &[NodeId] {
        match faction {
            Faction::Creator => &self.creator_faction,
            Faction::Enemy => &self.enemy_faction,
            Faction::NotSpecified => &[],
        }
    }

    /// In-flight projectiles.
    #[must_use]
    pub fn projectiles(&self) -> &[NodeId] {
        &self.projectiles
    }

    /// Get an actor by node.
    #[must_use]
    pub fn actor(&self, id: NodeId) -> Option<&Actor> {
        self.components.get(id).and_then(|node| node.as_actor())
    }

    /// Get a mutable actor by node.
    pub fn actor_mut(&mut self, id: NodeId) -> Option<&mut Actor> {
        self.components.get_mut(id).and_then(|node| node.as_actor_mut())
    }

    /// Check if the node is a living actor.
    #[must_use]
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.actor(id).is_some_and(Actor::is_alive)
    }

    /// Check if any actor of `faction` is alive.
    #[must_use]
    pub fn any_alive(&self, faction: Faction) -> bool {
        self.faction(faction).iter().any(|&id| self.is_alive(id))
    }

    /// Insert an actor under `parent` and append it to its faction roster.
    ///
    /// # Errors
    /// Returns [`crate::error::CombatError::NodeNotFound`] if `parent` does
    /// not exist. The actor is not added in that case.
    pub fn spawn_actor(&mut self, parent: NodeId, profile_key: i32, actor: Actor) -> Result<NodeId> {
        let faction = actor.faction;
        let id = self.components.insert(profile_key, NodeData::Actor(actor));
        if let Err(err) = self.components.set_parent(id, Some(parent)) {
            self.components.remove(id);
            return Err(err);
        }
        match faction {
            Faction::Creator => self.creator_faction.push(id),
            Faction::Enemy => self.enemy_faction.push(id),
            Faction::NotSpecified => {}
        }
        Ok(id)
    }

    /// Capture the current state for a replay trace.
    #[must_use]
    pub fn snapshot(&self) -> ContextSnapshot {
        let capture = |ids: &[NodeId]| -> Vec<ActorState> {
            ids.iter()
                .filter_map(|&id| self.actor(id).map(|actor| ActorState::capture(id, actor)))
                .collect()
        };
        ContextSnapshot {
            tick: self.current_tick,
            is_battle_over: self.is_battle_over,
            result: self.result,
            creator_faction: capture(&self.creator_faction),
            enemy_faction: capture(&self.enemy_faction),
        }
    }

    /// Compute a hash of the battle state for determinism verification.
    ///
    /// Uses sorted node IDs so the result does not depend on `HashMap`
    /// iteration order. The item stream is left out: replays run without it
    /// and must hash equal to the original battle.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.current_tick.hash(&mut hasher);
        self.max_tick.hash(&mut hasher);
        self.is_battle_over.hash(&mut hasher);
        self.result.hash(&mut hasher);
        self.battle_random.as_ref().map(GameRandom::draws).hash(&mut hasher);
        self.creator_faction.hash(&mut hasher);
        self.enemy_faction.hash(&mut hasher);

        for id in self.components.sorted_ids() {
            let Some(node) = self.components.get(id) else {
                continue;
            };
            id.hash(&mut hasher);
            node.profile_key.hash(&mut hasher);
            node.parent().hash(&mut hasher);
            node.children().hash(&mut hasher);
            node.kind().hash(&mut hasher);

            if let Some(actor) = node.as_actor() {
                actor.character_id.hash(&mut hasher);
                actor.stats.current_health.hash(&mut hasher);
                actor.stats.max_health.hash(&mut hasher);
                actor.stats.current_energy.hash(&mut hasher);
                actor.stats.damage_min.hash(&mut hasher);
                actor.stats.damage_max.hash(&mut hasher);
                actor.stats.attack_speed.to_bits().hash(&mut hasher);
                actor.stats.crit_chance.to_bits().hash(&mut hasher);
                actor.stats.armor.hash(&mut hasher);
                actor.current_target.hash(&mut hasher);
                actor.attack_cooldown_ticks.hash(&mut hasher);
            }
        }

        hasher.finish()
    }

    /// Release everything the battle holds.
    ///
    /// Empties the rosters, drops both random streams, and clears the arena.
    /// Idempotent.
    pub fn dispose(&mut self) {
        self.creator_faction.clear();
        self.enemy_faction.clear();
        self.projectiles.clear();
        self.battle_random = None;
        self.item_random = None;
        self.map_node = None;
        self.components.clear();
    }
}

impl Drop for TickContext {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::CharacterSnapshot;
    use crate::random::RandomSource;

    fn context_with_pair() -> (TickContext, NodeId, NodeId) {
        let mut ctx = TickContext::new();
        let map = ctx.components.insert(1, NodeData::Map);
        ctx.map_node = Some(map);
        let hero = Actor::from_snapshot(&CharacterSnapshot::player("Hero", 1), Faction::Creator);
        let goblin = Actor::from_snapshot(
            &CharacterSnapshot::monster("Goblin", 1, 200),
            Faction::Enemy,
        );
        let a = ctx.spawn_actor(map, 0, hero).unwrap();
        let b = ctx.spawn_actor(map, 200, goblin).unwrap();
        (ctx, a, b)
    }

    #[test]
    fn test_spawn_actor_links_tree_and_roster() {
        let (ctx, a, b) = context_with_pair();
        let map = ctx.map_node.unwrap();

        assert_eq!(ctx.components.children(map), &[a, b]);
        assert_eq!(ctx.faction(Faction::Creator), &[a]);
        assert_eq!(ctx.faction(Faction::Enemy), &[b]);
        assert!(ctx.any_alive(Faction::Enemy));
    }

    #[test]
    fn test_spawn_under_missing_parent() {
        let mut ctx = TickContext::new();
        let hero = Actor::from_snapshot(&CharacterSnapshot::player("Hero", 1), Faction::Creator);
        assert!(ctx.spawn_actor(99, 0, hero).is_err());
        assert!(ctx.components.is_empty());
        assert!(ctx.faction(Faction::Creator).is_empty());
    }

    #[test]
    fn test_finish_latches() {
        let mut ctx = TickContext::new();
        assert!(!ctx.is_battle_over());
        assert!(ctx.finish(BattleResult::Victory));
        assert!(!ctx.finish(BattleResult::Timeout));
        assert_eq!(ctx.result(), BattleResult::Victory);
        assert!(ctx.is_battle_over());
    }

    #[test]
    fn test_snapshot_reflects_state() {
        let (mut ctx, a, b) = context_with_pair();
        ctx.actor_mut(b).unwrap().take_damage(1000);
        ctx.actor_mut(a).unwrap().current_target = Some(b);
        ctx.current_tick = 7;

        let snap = ctx.snapshot();
        assert_eq!(snap.tick, 7);
        assert_eq!(snap.creator_faction[0].current_target, Some(b));
        assert!(!snap.enemy_faction[0].is_alive);
        assert_eq!(snap.faction_health(Faction::Enemy), 0);
    }

    #[test]
    fn test_state_hash_tracks_changes() {
        let (mut ctx, _, b) = context_with_pair();
        let (other, _, _) = context_with_pair();
        assert_eq!(ctx.state_hash(), other.state_hash());

        ctx.actor_mut(b).unwrap().take_damage(1);
        assert_ne!(ctx.state_hash(), other.state_hash());
    }

    #[test]
    fn test_state_hash_ignores_item_stream() {
        let (mut with_items, _, _) = context_with_pair();
        let (mut replay, _, _) = context_with_pair();
        with_items.battle_random = Some(GameRandom::new(9));
        with_items.item_random = Some(GameRandom::new(10));
        replay.battle_random = Some(GameRandom::new(9));
        assert_eq!(with_items.state_hash(), replay.state_hash());

        // Combat draws still count
        if let Some(rng) = replay.battle_random.as_mut() {
            let _ = rng.next_u32();
        }
        assert_ne!(with_items.state_hash(), replay.state_hash());
    }

    #[test]
    fn test_dispose_clears_everything() {
        let (mut ctx, _, _) = context_with_pair();
        ctx.battle_random = Some(GameRandom::new(1));
        ctx.item_random = Some(GameRandom::new(2));

        ctx.dispose();
        assert!(ctx.components.is_empty());
        assert!(ctx.faction(Faction::Creator).is_empty());
        assert!(ctx.faction(Faction::Enemy).is_empty());
        assert!(ctx.battle_random.is_none());
        assert!(ctx.item_random.is_none());

        // Second dispose is a no-op
        ctx.dispose();
    }

    #[test]
    fn test_battle_result_terminal() {
        assert!(!BattleResult::NotSpecified.is_terminal());
        assert!(BattleResult::Victory.is_terminal());
        assert!(BattleResult::Timeout.is_terminal());
    }
}
