//! Seeded random streams for combat and item rolls.
//!
//! Every battle owns two independent [`GameRandom`] instances: one for combat
//! rolls and one for item rolls. Replays run without the item stream, which
//! must not shift a single combat roll.
//!
//! # Algorithm
//!
//! The output stream is pinned so a replay recorded on one machine plays back
//! identically on any other:
//!
//! - Generator: ChaCha with 8 rounds (`rand_chacha::ChaCha8Rng`), seeded via
//!   `seed_from_u64` with the 32-bit seed zero-extended.
//! - Bounded integers: `min + ((next_u32 * span) >> 32)`.
//! - `f32` in `[0, 1)`: top 24 bits of `next_u32` scaled by `2^-24`.
//! - `f64` in `[0, 1)`: top 53 bits of `next_u64` scaled by `2^-53`.
//! - [`Fixed`] in `[0, 1)`: the 32 bits of `next_u32` used as the fraction.
//!
//! The `rand` distribution helpers are deliberately not used for draws,
//! since their sampling algorithms are allowed to change between releases.

use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::error::{CombatError, Result};
use crate::math::Fixed;

/// A deterministic source of random draws.
pub trait RandomSource {
    /// Next raw 32-bit value.
    fn next_u32(&mut self) -> u32;

    /// Next raw 64-bit value.
    fn next_u64(&mut self) -> u64;

    /// Non-negative integer in `[0, i32::MAX)`.
    fn next_int(&mut self) -> i32 {
        bounded(self.next_u32(), 0, i32::MAX)
    }

    /// Integer in `[0, max)`.
    ///
    /// # Errors
    /// Returns [`CombatError::InvalidRange`] if `max <= 0`.
    fn next_below(&mut self, max: i32) -> Result<i32> {
        self.next_range(0, max)
    }

    /// Integer in `[min, max)`.
    ///
    /// # Errors
    /// Returns [`CombatError::InvalidRange`] if `min >= max`.
    fn next_range(&mut self, min: i32, max: i32) -> Result<i32> {
        if min >= max {
            return Err(CombatError::InvalidRange { min, max });
        }
        Ok(bounded(self.next_u32(), min, max))
    }

    /// Float in `[0, 1)`.
    fn next_float(&mut self) -> f32 {
        (self.next_u32() >> 8) as f32 * (1.0 / 16_777_216.0)
    }

    /// Double in `[0, 1)`.
    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 * (1.0 / 9_007_199_254_740_992.0)
    }

    /// Fixed-point fraction in `[0, 1)`.
    fn next_fixed(&mut self) -> Fixed {
        Fixed::from_bits(i64::from(self.next_u32()))
    }
}

/// Multiply-shift reduction of a raw draw into `[min, max)`. Requires `min < max`.
fn bounded(raw: u32, min: i32, max: i32) -> i32 {
    let span = (i64::from(max) - i64::from(min)) as u64;
    let offset = (u64::from(raw) * span) >> 32;
    (i64::from(min) + offset as i64) as i32
}

/// Seeded game random number generator.
#[derive(Debug, Clone)]
pub struct GameRandom {
    seed: i32,
    rng: ChaCha8Rng,
    draws: u64,
}

impl GameRandom {
    /// Create a generator from a 32-bit seed.
    #[must_use]
    pub fn new(seed: i32) -> Self {
        Self {
            seed,
            rng: ChaCha8Rng::seed_from_u64(u64::from(seed as u32)),
            draws: 0,
        }
    }

    /// The seed this generator was created from.
    #[must_use]
    pub const fn seed(&self) -> i32 {
        self.seed
    }

    /// Number of raw draws taken so far.
    #[must_use]
    pub const fn draws(&self) -> u64 {
        self.draws
    }
}

impl RandomSource for GameRandom {
    fn next_u32(&mut self) -> u32 {
        self.draws += 1;
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.draws += 1;
        self.rng.next_u64()
    }
}

/// Draw a fresh non-negative seed for a new battle.
///
/// This is the only place the crate touches system entropy; everything
/// downstream of the request is seeded.
#[must_use]
pub fn fresh_seed() -> i32 {
    rand::thread_rng().gen_range(0..i32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = GameRandom::new(12345);
        let mut b = GameRandom::new(12345);

        for _ in 0..200 {
            assert_eq!(a.next_int(), b.next_int());
            assert_eq!(a.next_range(-50, 50), b.next_range(-50, 50));
            assert_eq!(a.next_float().to_bits(), b.next_float().to_bits());
            assert_eq!(a.next_f64().to_bits(), b.next_f64().to_bits());
            assert_eq!(a.next_fixed(), b.next_fixed());
        }
        assert_eq!(a.draws(), b.draws());
    }

    #[test]
    fn test_seed_42_sequence() {
        // ChaCha8 seeded through `seed_from_u64(42)`
        let mut rng = GameRandom::new(42);
        assert_eq!(rng.next_u32(), 790_661_081);
        assert_eq!(rng.next_range(5, 11), Ok(5));
        assert_eq!(rng.next_fixed().to_bits(), 3_533_892_905);
        assert_eq!(rng.draws(), 3);
    }

    #[test]
    fn test_different_seeds_diverge() {
        let mut a = GameRandom::new(1);
        let mut b = GameRandom::new(2);

        let seq_a: Vec<i32> = (0..16).map(|_| a.next_int()).collect();
        let seq_b: Vec<i32> = (0..16).map(|_| b.next_int()).collect();
        assert_ne!(seq_a, seq_b);
    }

    #[test]
    fn test_negative_and_positive_seeds_are_distinct() {
        let mut a = GameRandom::new(-7);
        let mut b = GameRandom::new(7);
        assert_ne!(a.next_u64(), b.next_u64());
    }

    #[test]
    fn test_range_bounds() {
        let mut rng = GameRandom::new(42);
        for _ in 0..1000 {
            let v = rng.next_range(5, 11).unwrap();
            assert!((5..11).contains(&v));

            let b = rng.next_below(3).unwrap();
            assert!((0..3).contains(&b));

            let n = rng.next_int();
            assert!(n >= 0 && n < i32::MAX);
        }
    }

    #[test]
    fn test_single_value_range() {
        let mut rng = GameRandom::new(9);
        for _ in 0..10 {
            assert_eq!(rng.next_range(7, 8).unwrap(), 7);
        }
    }

    #[test]
    fn test_full_i32_range() {
        let mut rng = GameRandom::new(3);
        for _ in 0..100 {
            let _ = rng.next_range(i32::MIN, i32::MAX).unwrap();
        }
    }

    #[test]
    fn test_invalid_range() {
        let mut rng = GameRandom::new(42);
        assert_eq!(
            rng.next_range(10, 10),
            Err(CombatError::InvalidRange { min: 10, max: 10 })
        );
        assert_eq!(
            rng.next_range(11, 10),
            Err(CombatError::InvalidRange { min: 11, max: 10 })
        );
        assert_eq!(
            rng.next_below(0),
            Err(CombatError::InvalidRange { min: 0, max: 0 })
        );
        // Failed draws consume nothing
        assert_eq!(rng.draws(), 0);
    }

    #[test]
    fn test_unit_interval_draws() {
        let mut rng = GameRandom::new(77);
        for _ in 0..1000 {
            let f = rng.next_float();
            assert!((0.0..1.0).contains(&f));
            let d = rng.next_f64();
            assert!((0.0..1.0).contains(&d));
            let x = rng.next_fixed();
            assert!(x >= Fixed::ZERO && x < Fixed::ONE);
        }
    }

    #[test]
    fn test_instances_do_not_share_state() {
        let mut battle = GameRandom::new(100);
        let mut item = GameRandom::new(100);
        let mut reference = GameRandom::new(100);

        // Draining the item stream must not perturb the battle stream
        for _ in 0..50 {
            let _ = item.next_u32();
        }
        for _ in 0..20 {
            assert_eq!(battle.next_u32(), reference.next_u32());
        }
    }

    #[test]
    fn test_clone_continues_identically() {
        let mut rng = GameRandom::new(5);
        let _ = rng.next_u64();
        let mut copy = rng.clone();
        assert_eq!(rng.next_u32(), copy.next_u32());
        assert_eq!(rng.seed(), 5);
    }

    #[test]
    fn test_fresh_seed_is_non_negative() {
        for _ in 0..100 {
            assert!(fresh_seed() >= 0);
        }
    }
}
