//! Test fixtures and helpers.
//!
//! Pre-built characters and requests for consistent testing.

use idle_core::prelude::*;

/// Builder for character snapshots with explicit stats.
///
/// Starts from a level-1 player with no crit and no armor so that damage is
/// exactly the rolled value unless a test opts in.
#[derive(Debug, Clone)]
pub struct CharacterBuilder {
    snapshot: CharacterSnapshot,
}

impl CharacterBuilder {
    /// Start a player character.
    #[must_use]
    pub fn player(name: &str) -> Self {
        let mut snapshot = CharacterSnapshot::player(name, 1);
        snapshot.stats.crit_chance = 0.0;
        snapshot.stats.armor = 0;
        Self { snapshot }
    }

    /// Start a monster character.
    #[must_use]
    pub fn monster(name: &str, profile_key: i32) -> Self {
        let mut builder = Self::player(name);
        builder.snapshot.actor_type = ActorType::Monster;
        builder.snapshot.profile_key = profile_key;
        builder
    }

    /// Set the character id.
    #[must_use]
    pub fn id(mut self, id: u64) -> Self {
        self.snapshot.id = id;
        self
    }

    /// Set the level without touching stats.
    #[must_use]
    pub fn level(mut self, level: i32) -> Self {
        self.snapshot.level = level;
        self
    }

    /// Set max and current health.
    #[must_use]
    pub fn health(mut self, health: i32) -> Self {
        self.snapshot.stats.max_health = health;
        self.snapshot.stats.current_health = health;
        self
    }

    /// Set an inclusive damage range.
    #[must_use]
    pub fn damage(mut self, min: i32, max: i32) -> Self {
        self.snapshot.stats.damage_min = min;
        self.snapshot.stats.damage_max = max;
        self
    }

    /// Set attacks per second.
    #[must_use]
    pub fn attack_speed(mut self, speed: f32) -> Self {
        self.snapshot.stats.attack_speed = speed;
        self
    }

    /// Set crit chance (percent) and multiplier.
    #[must_use]
    pub fn crit(mut self, chance: f32, multiplier: f32) -> Self {
        self.snapshot.stats.crit_chance = chance;
        self.snapshot.stats.crit_multiplier = multiplier;
        self
    }

    /// Set armor.
    #[must_use]
    pub fn armor(mut self, armor: i32) -> Self {
        self.snapshot.stats.armor = armor;
        self
    }

    /// Finish the snapshot.
    #[must_use]
    pub fn build(self) -> CharacterSnapshot {
        self.snapshot
    }
}

/// A fighter dealing exactly `damage` per hit at one attack per second.
#[must_use]
pub fn fighter(name: &str, damage: i32, health: i32) -> CharacterSnapshot {
    CharacterBuilder::player(name)
        .damage(damage, damage)
        .health(health)
        .attack_speed(1.0)
        .build()
}

/// PvP arena request with pinned seeds.
#[must_use]
pub fn pvp_request(
    creators: Vec<CharacterSnapshot>,
    enemies: Vec<CharacterSnapshot>,
    seed: i32,
) -> CombatRequest {
    CombatRequest::new_pvp(1, MapKind::PvPArena.key(), 0, 1, creators, enemies)
        .with_seeds(seed, seed.wrapping_add(1))
}

/// PvE request with pinned seeds.
#[must_use]
pub fn pve_request(
    map: MapKind,
    difficulty: i32,
    creator_level: i32,
    creators: Vec<CharacterSnapshot>,
    seed: i32,
) -> CombatRequest {
    CombatRequest::new_pve(1, map.key(), difficulty, creator_level, creators)
        .with_seeds(seed, seed.wrapping_add(1))
}

/// Level-1 attacker (5-10 damage, no crit) against the Starter Village.
#[must_use]
pub fn starter_village_request(seed: i32) -> CombatRequest {
    let hero = CharacterBuilder::player("Hero")
        .id(1)
        .health(110)
        .damage(5, 10)
        .attack_speed(1.0)
        .build();
    pve_request(MapKind::StarterVillage, 0, 1, vec![hero], seed)
}

/// Identical 30 hp / 10 damage fighters. Creators act first and win after 61 ticks.
#[must_use]
pub fn mirror_match(seed: i32) -> CombatRequest {
    pvp_request(
        vec![fighter("Alice", 10, 30)],
        vec![fighter("Bob", 10, 30)],
        seed,
    )
}

/// A 500-600 damage attacker against a 5000 hp defender.
#[must_use]
pub fn overwhelming_match(seed: i32) -> CombatRequest {
    let attacker = CharacterBuilder::player("Titan")
        .damage(500, 600)
        .health(1000)
        .build();
    let defender = fighter("Wall", 1, 5000);
    pvp_request(vec![attacker], vec![defender], seed)
}

/// Two sides that cannot kill each other before the arena's tick limit.
#[must_use]
pub fn stalemate_match(seed: i32) -> CombatRequest {
    pvp_request(
        vec![fighter("Turtle A", 1, 1_000_000)],
        vec![fighter("Turtle B", 1, 1_000_000)],
        seed,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_sets_stats() {
        let c = CharacterBuilder::monster("Rat", 200)
            .id(5)
            .level(3)
            .health(42)
            .damage(2, 4)
            .crit(50.0, 2.0)
            .armor(7)
            .build();

        assert_eq!(c.id, 5);
        assert_eq!(c.level, 3);
        assert_eq!(c.actor_type, ActorType::Monster);
        assert_eq!(c.profile_key, 200);
        assert_eq!(c.stats.current_health, 42);
        assert_eq!((c.stats.damage_min, c.stats.damage_max), (2, 4));
        assert_eq!(c.stats.armor, 7);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_fixture_requests_are_valid() {
        for request in [
            starter_village_request(1),
            mirror_match(1),
            overwhelming_match(1),
            stalemate_match(1),
        ] {
            assert!(request.validate().is_ok());
            assert!(!request.is_replay);
        }
    }
}
