//! Integer rounding of configured ratios
//!
//! Ratios live in config and move data as `f32`, which cannot hold values
//! like 0.15 exactly: `0.15 * 100.0` comes out a hair above 15 and `ceil`
//! turns it into 16. Every formula that rounds a scaled stat goes through
//! here instead. The ratio is snapped to whole basis points and the rest is
//! integer arithmetic.

const SCALE: u64 = 10_000;

/// Ratio as whole basis points (0.15 -> 1500). Negative and NaN become 0.
pub fn basis_points(ratio: f32) -> u64 {
    (f64::from(ratio.max(0.0)) * SCALE as f64).round() as u64
}

fn scaled(ratio: f32, value: u32) -> u64 {
    basis_points(ratio).saturating_mul(u64::from(value))
}

fn clamp_u32(value: u64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

/// floor(ratio * value)
pub fn ratio_floor(ratio: f32, value: u32) -> u32 {
    clamp_u32(scaled(ratio, value) / SCALE)
}

/// ceil(ratio * value)
pub fn ratio_ceil(ratio: f32, value: u32) -> u32 {
    clamp_u32(scaled(ratio, value).saturating_add(SCALE - 1) / SCALE)
}

/// round(ratio * value), halves rounding up
pub fn ratio_round(ratio: f32, value: u32) -> u32 {
    clamp_u32(scaled(ratio, value).saturating_add(SCALE / 2) / SCALE)
}
