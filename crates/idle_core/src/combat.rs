//! Attack resolution with armor mitigation and critical strikes.
//!
//! One attack consumes exactly two draws from the battle stream, in order:
//! the damage roll, then the crit roll. The crit roll is taken even when the
//! attacker has no crit chance, so stat changes never shift later draws.
//!
//! All arithmetic after the draws is 32.32 fixed point:
//!
//! ```text
//! raw       = roll in [damage_min, damage_max]
//! raw       = trunc(raw * crit_multiplier)      if crit roll * 100 < crit_chance
//! reduction = armor / (armor + 100)             armor clamped to >= 0
//! final     = max(1, floor(raw * (1 - reduction)))
//! ```

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::math::{to_fixed, Fixed, TICK_RATE};
use crate::random::RandomSource;
use crate::stats::CombatStats;

/// Minimum damage any landed attack deals.
pub const MIN_DAMAGE: i32 = 1;

/// Armor value at which mitigation reaches 50%.
pub const ARMOR_CONSTANT: i32 = 100;

/// Result of resolving one attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackOutcome {
    /// Damage rolled before mitigation (after crit).
    pub raw_damage: i32,
    /// Whether the crit roll succeeded.
    pub critical: bool,
    /// Damage to apply to the target.
    pub damage: i32,
    /// Cooldown to set on the attacker.
    pub cooldown_ticks: u32,
}

/// Fraction of incoming damage absorbed by `armor`.
#[must_use]
pub fn armor_reduction(armor: i32) -> Fixed {
    let armor = Fixed::from_num(armor.max(0));
    armor / (armor + Fixed::from_num(ARMOR_CONSTANT))
}

/// Apply a crit multiplier, truncating toward zero.
#[must_use]
pub fn apply_crit(raw: i32, multiplier: f32) -> i32 {
    let scaled = Fixed::from_num(raw).saturating_mul(to_fixed(multiplier));
    scaled.round_to_zero().saturating_to_num::<i32>()
}

/// Mitigate `raw` damage by `armor`, never going below [`MIN_DAMAGE`].
#[must_use]
pub fn mitigate(raw: i32, armor: i32) -> i32 {
    let multiplier = Fixed::ONE - armor_reduction(armor);
    let mitigated = Fixed::from_num(raw) * multiplier;
    mitigated
        .floor()
        .saturating_to_num::<i32>()
        .max(MIN_DAMAGE)
}

/// Ticks between attacks for a given attacks-per-second value.
///
/// Non-positive speeds, and speeds so small the cooldown does not fit, return
/// `u32::MAX`: the actor never attacks again.
#[must_use]
pub fn attack_cooldown(attack_speed: f32) -> u32 {
    let speed = to_fixed(attack_speed);
    if speed <= Fixed::ZERO {
        return u32::MAX;
    }
    Fixed::from_num(TICK_RATE)
        .checked_div(speed)
        .and_then(|ticks| ticks.floor().checked_to_num::<u32>())
        .unwrap_or(u32::MAX)
}

/// Roll and mitigate one attack from `attacker` against a target with `target_armor`.
///
/// # Errors
/// Returns [`crate::error::CombatError::InvalidRange`] if the attacker's
/// damage range is inverted. No draw is consumed in that case.
pub fn resolve_attack<R: RandomSource + ?Sized>(
    rng: &mut R,
    attacker: &CombatStats,
    target_armor: i32,
) -> Result<AttackOutcome> {
    let mut raw = rng.next_range(attacker.damage_min, attacker.damage_max.saturating_add(1))?;

    let crit_roll = rng.next_fixed() * Fixed::from_num(100);
    let critical = crit_roll < to_fixed(attacker.crit_chance);
    if critical {
        raw = apply_crit(raw, attacker.crit_multiplier);
    }

    Ok(AttackOutcome {
        raw_damage: raw,
        critical,
        damage: mitigate(raw, target_armor),
        cooldown_ticks: attack_cooldown(attacker.attack_speed),
    })
}
