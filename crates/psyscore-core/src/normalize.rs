//! Normalization and numeric guards.
//!
//! Every ratio in the scoring pipeline goes through [`guarded_div`], so a
//! zero denominator yields 0 instead of NaN or infinity.

/// Divide, returning 0 when the denominator is zero or the quotient is not
/// finite.
pub fn guarded_div(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        tracing::trace!(numerator, "division guard tripped on zero denominator");
        return 0.0;
    }
    let quotient = numerator / denominator;
    if quotient.is_finite() {
        quotient
    } else {
        tracing::trace!(numerator, denominator, "division guard tripped on non-finite quotient");
        0.0
    }
}

/// Map `raw` from `[min, max]` onto `[0, 100]`, clamped.
///
/// A degenerate range (`max == min`) maps to 0.
pub fn normalize_between(raw: f64, min: f64, max: f64) -> f64 {
    let pct = guarded_div(raw - min, max - min) * 100.0;
    pct.clamp(0.0, 100.0)
}

/// Normalize a dimension sum of `question_count` items that each range over
/// `[item_min, item_max]`.
pub fn normalize(raw: f64, question_count: usize, item_min: f64, item_max: f64) -> f64 {
    let count = question_count as f64;
    normalize_between(raw, count * item_min, count * item_max)
}

/// Round to `places` decimal places, half away from zero.
pub fn round_to(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn four_item_five_point_scale() {
        assert_eq!(normalize(20.0, 4, 1.0, 5.0), 100.0);
        assert_eq!(normalize(4.0, 4, 1.0, 5.0), 0.0);
        assert_eq!(normalize(12.0, 4, 1.0, 5.0), 50.0);
    }

    #[test]
    fn degenerate_range_is_zero() {
        assert_eq!(normalize(3.0, 3, 1.0, 1.0), 0.0);
        assert_eq!(normalize(0.0, 0, 1.0, 5.0), 0.0);
        assert_eq!(normalize_between(7.0, 7.0, 7.0), 0.0);
    }

    #[test]
    fn out_of_range_is_clamped() {
        assert_eq!(normalize_between(-5.0, 0.0, 10.0), 0.0);
        assert_eq!(normalize_between(15.0, 0.0, 10.0), 100.0);
    }

    #[test]
    fn guarded_div_never_escapes_nan() {
        assert_eq!(guarded_div(12.0, 0.0), 0.0);
        assert_eq!(guarded_div(0.0, 0.0), 0.0);
        assert_eq!(guarded_div(12.0, 5.0), 2.4);
        assert_eq!(guarded_div(f64::MAX, f64::MIN_POSITIVE), 0.0);
    }

    #[test]
    fn rounding() {
        assert_eq!(round_to(2.456, 2), 2.46);
        assert_eq!(round_to(37.25, 1), 37.3);
        assert_eq!(round_to(49.5, 0), 50.0);
        assert_eq!(round_to(-1.5, 0), -2.0);
    }

    proptest! {
        #[test]
        fn normalized_stays_in_bounds(
            count in 1usize..40,
            item_min in -3.0f64..3.0,
            width in 0.5f64..10.0,
            t in 0.0f64..=1.0,
        ) {
            let item_max = item_min + width;
            let min = count as f64 * item_min;
            let max = count as f64 * item_max;
            let raw = min + t * (max - min);
            let pct = normalize(raw, count, item_min, item_max);
            prop_assert!((0.0..=100.0).contains(&pct));
        }

        #[test]
        fn extremes_map_to_zero_and_hundred(
            count in 1usize..40,
            item_min in 0.0f64..3.0,
            width in 0.5f64..10.0,
        ) {
            let item_max = item_min + width;
            let min = count as f64 * item_min;
            let max = count as f64 * item_max;
            prop_assert!(normalize(min, count, item_min, item_max).abs() < 1e-9);
            prop_assert!((normalize(max, count, item_min, item_max) - 100.0).abs() < 1e-9);
        }
    }
}
