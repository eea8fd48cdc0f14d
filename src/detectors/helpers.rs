//! Shared thresholds and shape tests for the pattern catalogue.
//!
//! The ratio and factor constants are fixed by the pattern definitions; only the
//! absolute price tolerances are meant to be tuned per instrument.

use crate::Bar;

// ============================================================
// THRESHOLDS
// ============================================================

/// Absolute price tolerance for "equal" prices (doji body, marubozu ends,
/// tweezer and matching extremes).
pub const DEFAULT_TOLERANCE: f64 = 0.001;

/// Body is small: body / range below this (spinning top, pin bars, star middle).
pub const SMALL_BODY_RATIO: f64 = 0.3;
/// Wick is long: wick exceeds body * LONG_WICK_FACTOR.
pub const LONG_WICK_FACTOR: f64 = 2.0;
/// Wick is negligible: wick <= body * NEGLIGIBLE_WICK_FACTOR.
pub const NEGLIGIBLE_WICK_FACTOR: f64 = 0.1;
/// Close sits at the extreme: distance to high/low <= range * NEAR_EXTREME_FACTOR.
pub const NEAR_EXTREME_FACTOR: f64 = 0.1;
/// Middle bar of an abandoned baby is a doji: body <= range * BABY_DOJI_FACTOR.
pub const BABY_DOJI_FACTOR: f64 = 0.1;

// ============================================================
// SHAPE TESTS
// ============================================================

/// Which side of the body a wick hangs from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WickSide {
    Upper,
    Lower,
}

impl WickSide {
    #[inline]
    pub fn opposite(self) -> Self {
        match self {
            WickSide::Upper => WickSide::Lower,
            WickSide::Lower => WickSide::Upper,
        }
    }

    #[inline]
    pub fn of(self, bar: &Bar) -> f64 {
        match self {
            WickSide::Upper => bar.upper_wick(),
            WickSide::Lower => bar.lower_wick(),
        }
    }
}

/// `|a - b| <= tolerance`
#[inline]
pub fn within(a: f64, b: f64, tolerance: f64) -> bool {
    (a - b).abs() <= tolerance
}

/// Small body with one long wick on `long` and next to nothing on the other side.
///
/// Shared by hammer, hanging man, shooting star and inverted hammer; those
/// differ only in the side and in the trend the caller reads them against.
#[inline]
pub fn is_pin_shape(
    bar: &Bar,
    long: WickSide,
    max_body_ratio: f64,
    long_wick_factor: f64,
    negligible_wick_factor: f64,
) -> bool {
    let body = bar.body_size();
    bar.body_to_range_ratio() <= max_body_ratio
        && long.of(bar) > long_wick_factor * body
        && long.opposite().of(bar) <= negligible_wick_factor * body
}

/// Body no larger than `factor` of the bar's own range.
#[inline]
pub fn is_doji_like(bar: &Bar, factor: f64) -> bool {
    bar.body_size() <= bar.total_range() * factor
}

/// Close within `factor` of the range from the high.
#[inline]
pub fn closes_near_high(bar: &Bar, factor: f64) -> bool {
    bar.high() - bar.close() <= bar.total_range() * factor
}

/// Close within `factor` of the range from the low.
#[inline]
pub fn closes_near_low(bar: &Bar, factor: f64) -> bool {
    bar.close() - bar.low() <= bar.total_range() * factor
}

/// Validate a multiplicative factor used in a detector config.
pub(crate) fn check_factor(field: &'static str, value: f64) -> crate::Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(crate::PatternError::OutOfRange {
            field,
            value,
            min: 0.0,
            max: f64::MAX,
        });
    }
    Ok(())
}
