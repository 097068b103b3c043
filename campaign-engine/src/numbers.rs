//! Numeric conversion helpers centralizing safe numeric casts and clamps.

use num_traits::cast::cast;

/// Round a f64 and clamp it to the i64 range, returning 0 for non-finite values.
#[must_use]
pub fn round_f64_to_i64(value: f64) -> i64 {
    if !value.is_finite() {
        return 0;
    }
    let min = cast::<i64, f64>(i64::MIN).unwrap_or(f64::MIN);
    let max = cast::<i64, f64>(i64::MAX).unwrap_or(f64::MAX);
    let clamped = value.clamp(min, max).round();
    cast::<f64, i64>(clamped).unwrap_or(0)
}

/// Round a f64 and clamp it to the u32 range, returning 0 for NaN or negative values.
#[must_use]
pub fn round_f64_to_u32(value: f64) -> u32 {
    if value.is_nan() {
        return 0;
    }
    let clamped = value.clamp(0.0, f64::from(u32::MAX)).round();
    cast::<f64, u32>(clamped).unwrap_or(0)
}

/// Convert i64 to f64 while allowing precision loss in a single location.
#[must_use]
pub fn i64_to_f64(value: i64) -> f64 {
    cast::<i64, f64>(value).unwrap_or(0.0)
}

/// Convert usize to f64 while allowing precision loss in a single location.
#[must_use]
pub fn usize_to_f64(value: usize) -> f64 {
    cast::<usize, f64>(value).unwrap_or(0.0)
}

/// Clamp a percentage into `[0, 100]`, mapping NaN to 0.
#[must_use]
pub fn clamp_pct(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 100.0)
}

/// Clamp a probability into `[0, 1]`, mapping NaN to 0.
#[must_use]
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}

/// Map a unit-interval roll onto an index in `0..len`.
#[must_use]
pub fn unit_to_index(roll: f64, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let scaled = (clamp_unit(roll) * usize_to_f64(len)).floor();
    cast::<f64, usize>(scaled).unwrap_or(0).min(len - 1)
}

/// Split an integer total into `(ceil, floor)` halves.
#[must_use]
pub const fn split_ceil_floor(total: u32) -> (u32, u32) {
    let floor = total / 2;
    (total - floor, floor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounders_cover_ranges() {
        assert_eq!(round_f64_to_i64(1.6), 2);
        assert_eq!(round_f64_to_i64(f64::NAN), 0);
        assert_eq!(round_f64_to_u32(-4.0), 0);
        assert_eq!(round_f64_to_u32(f64::from(u32::MAX) * 2.0), u32::MAX);
    }

    #[test]
    fn clamps_handle_nan_and_bounds() {
        assert!(clamp_pct(f64::NAN).abs() < f64::EPSILON);
        assert!((clamp_pct(140.0) - 100.0).abs() < f64::EPSILON);
        assert!((clamp_unit(-0.2)).abs() < f64::EPSILON);
        assert!((clamp_unit(0.4) - 0.4).abs() < f64::EPSILON);
    }

    #[test]
    fn unit_rolls_map_into_bounds() {
        assert_eq!(unit_to_index(0.0, 6), 0);
        assert_eq!(unit_to_index(0.99, 6), 5);
        assert_eq!(unit_to_index(1.5, 6), 5);
        assert_eq!(unit_to_index(0.5, 0), 0);
    }

    #[test]
    fn split_puts_remainder_first() {
        assert_eq!(split_ceil_floor(7), (4, 3));
        assert_eq!(split_ceil_floor(10), (5, 5));
        assert_eq!(split_ceil_floor(0), (0, 0));
    }
}
