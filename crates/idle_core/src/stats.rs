//! Combat stat block carried by every actor.

use serde::{Deserialize, Serialize};

use crate::error::{CombatError, Result};

/// Combat panel of one actor.
///
/// Integer stats are authoritative. The three rate stats are stored as `f32`
/// so snapshots stay readable and are converted to fixed point at use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatStats {
    /// Maximum health.
    pub max_health: i32,
    /// Current health, kept within `[0, max_health]`.
    pub current_health: i32,
    /// Maximum energy.
    pub max_energy: i32,
    /// Current energy.
    pub current_energy: i32,
    /// Strength attribute.
    pub strength: i32,
    /// Dexterity attribute.
    pub dexterity: i32,
    /// Intelligence attribute.
    pub intelligence: i32,
    /// Lowest damage roll (inclusive).
    pub damage_min: i32,
    /// Highest damage roll (inclusive).
    pub damage_max: i32,
    /// Attacks per second.
    pub attack_speed: f32,
    /// Critical strike chance in percent, `[0, 100]`.
    pub crit_chance: f32,
    /// Damage multiplier applied on a critical strike.
    pub crit_multiplier: f32,
    /// Flat armor; mitigation is `armor / (armor + 100)`.
    pub armor: i32,
    /// Evasion rating.
    pub evasion: i32,
    /// Fire resistance.
    pub fire_resistance: i32,
    /// Cold resistance.
    pub cold_resistance: i32,
    /// Lightning resistance.
    pub lightning_resistance: i32,
    /// Chaos resistance.
    pub chaos_resistance: i32,
}

impl Default for CombatStats {
    fn default() -> Self {
        Self::for_level(1)
    }
}

impl CombatStats {
    /// Default stat block for an actor of `level`.
    #[must_use]
    pub fn for_level(level: i32) -> Self {
        let max_health = 100_i32.saturating_add(level.saturating_mul(10));
        let max_energy = 50_i32.saturating_add(level.saturating_mul(5));
        let attribute = 10_i32.saturating_add(level);
        Self {
            max_health,
            current_health: max_health,
            max_energy,
            current_energy: max_energy,
            strength: attribute,
            dexterity: attribute,
            intelligence: attribute,
            damage_min: 5_i32.saturating_add(level),
            damage_max: 10_i32.saturating_add(level.saturating_mul(2)),
            attack_speed: 1.0,
            crit_chance: 5.0,
            crit_multiplier: 1.5,
            armor: level.saturating_mul(5),
            evasion: level.saturating_mul(3),
            fire_resistance: 0,
            cold_resistance: 0,
            lightning_resistance: 0,
            chaos_resistance: 0,
        }
    }

    /// Check if health is above zero.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.current_health > 0
    }

    /// Apply damage, flooring health at zero.
    pub fn take_damage(&mut self, amount: i32) {
        self.current_health = self.current_health.saturating_sub(amount).max(0);
    }

    /// Restore health, capped at maximum.
    pub fn heal(&mut self, amount: i32) {
        self.current_health = self
            .current_health
            .saturating_add(amount)
            .min(self.max_health);
    }

    /// Check the stat block can be simulated.
    ///
    /// # Errors
    /// Returns [`CombatError::InvalidRange`] if `damage_min > damage_max`, or
    /// [`CombatError::InvalidSnapshot`] for out-of-range health or a damage
    /// ceiling that cannot be rolled.
    pub fn validate(&self, name: &str) -> Result<()> {
        if self.damage_min > self.damage_max {
            return Err(CombatError::InvalidRange {
                min: self.damage_min,
                max: self.damage_max,
            });
        }
        if self.damage_max == i32::MAX {
            return Err(invalid(name, "damage_max must be below i32::MAX"));
        }
        if self.max_health < 0 {
            return Err(invalid(name, "max_health is negative"));
        }
        if self.current_health < 0 || self.current_health > self.max_health {
            return Err(invalid(
                name,
                &format!(
                    "current_health {} outside [0, {}]",
                    self.current_health, self.max_health
                ),
            ));
        }
        Ok(())
    }
}

fn invalid(name: &str, reason: &str) -> CombatError {
    CombatError::InvalidSnapshot {
        name: name.to_owned(),
        reason: reason.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_defaults() {
        let stats = CombatStats::for_level(5);
        assert_eq!(stats.max_health, 150);
        assert_eq!(stats.current_health, 150);
        assert_eq!(stats.max_energy, 75);
        assert_eq!(stats.strength, 15);
        assert_eq!(stats.damage_min, 10);
        assert_eq!(stats.damage_max, 20);
        assert_eq!(stats.armor, 25);
        assert_eq!(stats.evasion, 15);
        assert!((stats.crit_multiplier - 1.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_take_damage_floors_at_zero() {
        let mut stats = CombatStats::for_level(1);
        stats.take_damage(30);
        assert_eq!(stats.current_health, 80);
        stats.take_damage(500);
        assert_eq!(stats.current_health, 0);
        assert!(!stats.is_alive());
    }

    #[test]
    fn test_heal_caps_at_max() {
        let mut stats = CombatStats::for_level(1);
        stats.take_damage(50);
        stats.heal(20);
        assert_eq!(stats.current_health, 80);
        stats.heal(1000);
        assert_eq!(stats.current_health, stats.max_health);
    }

    #[test]
    fn test_validate() {
        assert!(CombatStats::for_level(3).validate("ok").is_ok());

        let mut inverted = CombatStats::for_level(1);
        inverted.damage_min = 20;
        inverted.damage_max = 10;
        assert_eq!(
            inverted.validate("inv"),
            Err(CombatError::InvalidRange { min: 20, max: 10 })
        );

        let mut overhealed = CombatStats::for_level(1);
        overhealed.current_health = overhealed.max_health + 1;
        assert!(matches!(
            overhealed.validate("hp"),
            Err(CombatError::InvalidSnapshot { .. })
        ));

        let mut ceiling = CombatStats::for_level(1);
        ceiling.damage_max = i32::MAX;
        assert!(ceiling.validate("max").is_err());
    }

    #[test]
    fn test_dead_snapshot_is_valid() {
        let mut stats = CombatStats::for_level(1);
        stats.current_health = 0;
        assert!(stats.validate("dead").is_ok());
    }
}
