//! Fixed-point math and tick-rate utilities.
//!
//! Combat arithmetic (crit multipliers, armor mitigation, cooldowns) runs in
//! fixed point so that a replay computes bit-identical damage on every
//! platform. Snapshot stats are stored as `f32` for readability and are
//! converted exactly at the point of use.

use fixed::types::I32F32;

/// Fixed-point number type for all combat math.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
/// Range: approximately -2,147,483,648 to 2,147,483,647
/// Precision: approximately 0.00000000023
pub type Fixed = I32F32;

/// Simulation ticks per simulated second.
pub const TICK_RATE: u32 = 30;

/// Convert a stat value to fixed point.
///
/// Finite values outside the representable range saturate; NaN maps to zero.
#[must_use]
pub fn to_fixed(value: f32) -> Fixed {
    if value.is_nan() {
        return Fixed::ZERO;
    }
    Fixed::checked_from_num(value).unwrap_or(if value.is_sign_negative() {
        Fixed::MIN
    } else {
        Fixed::MAX
    })
}

/// Convert whole seconds of battle time to ticks.
#[must_use]
pub const fn seconds_to_ticks(seconds: u32) -> u32 {
    seconds.saturating_mul(TICK_RATE)
}

/// Convert ticks to (fractional) seconds, for display only.
#[must_use]
pub fn ticks_to_seconds(ticks: u32) -> f32 {
    ticks as f32 / TICK_RATE as f32
}

/// Convert milliseconds to ticks, truncating partial ticks.
#[must_use]
pub const fn millis_to_ticks(millis: u32) -> u32 {
    ((millis as u64 * TICK_RATE as u64) / 1000) as u32
}

/// Convert ticks to whole milliseconds, truncating.
#[must_use]
pub const fn ticks_to_millis(ticks: u32) -> u32 {
    ((ticks as u64 * 1000) / TICK_RATE as u64) as u32
}
