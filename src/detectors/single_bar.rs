//! Single-bar candlestick patterns
//!
//! Patterns: Spinning Top, Marubozu, Doji (four-price / dragonfly / gravestone /
//! long-legged), Hammer, Hanging Man, Shooting Star, Inverted Hammer.
//!
//! None of these need history. The four pin-bar patterns share one shape test;
//! their names only carry the trend the caller reads them against.

use std::collections::HashMap;

use super::helpers::{
    self, check_factor, is_pin_shape, within, WickSide, LONG_WICK_FACTOR,
    NEGLIGIBLE_WICK_FACTOR, SMALL_BODY_RATIO,
};
use crate::{
    params::{get_factor, get_ratio, get_tolerance, ParamMeta, ParamType, ParameterizedDetector},
    BarRef, Detection, PatternDetector, PatternId, Ratio, Result, Tolerance, Variant,
};

impl_with_defaults!(SpinningTopDetector, MarubozuDetector, DojiDetector);

// ============================================================
// SPINNING TOP
// ============================================================

/// Small body with long wicks on both sides.
#[derive(Debug, Clone, Copy)]
pub struct SpinningTopDetector {
    /// Body / range must stay strictly below this.
    pub max_body_ratio: Ratio,
    /// Each wick must be at least this multiple of the body.
    pub wick_factor: f64,
}

impl Default for SpinningTopDetector {
    fn default() -> Self {
        Self {
            max_body_ratio: Ratio::new_const(SMALL_BODY_RATIO),
            wick_factor: LONG_WICK_FACTOR,
        }
    }
}

impl PatternDetector for SpinningTopDetector {
    fn id(&self) -> PatternId {
        PatternId("spinning_top")
    }

    fn lookback(&self) -> usize {
        0
    }

    fn detect(&self, bar: BarRef<'_>) -> Detection {
        let body = bar.body_size();
        Detection::from_flag(
            bar.body_to_range_ratio() < self.max_body_ratio.get()
                && bar.upper_wick() >= self.wick_factor * body
                && bar.lower_wick() >= self.wick_factor * body,
        )
    }

    fn validate_config(&self) -> Result<()> {
        check_factor("wick_factor", self.wick_factor)
    }

    fn description(&self) -> &'static str {
        "Small real body between long upper and lower wicks"
    }
}

// ============================================================
// MARUBOZU
// ============================================================

/// Bar with no wicks: opens at one extreme and closes at the other.
///
/// Matches as [`Variant::Bullish`] (open = low, close = high) or
/// [`Variant::Bearish`] (open = high, close = low), bullish checked first.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarubozuDetector {
    pub tolerance: Tolerance,
}

impl PatternDetector for MarubozuDetector {
    fn id(&self) -> PatternId {
        PatternId("marubozu")
    }

    fn lookback(&self) -> usize {
        0
    }

    fn detect(&self, bar: BarRef<'_>) -> Detection {
        let tol = self.tolerance.get();
        if within(bar.open(), bar.low(), tol) && within(bar.close(), bar.high(), tol) {
            Detection::Matched(Variant::Bullish)
        } else if within(bar.open(), bar.high(), tol) && within(bar.close(), bar.low(), tol) {
            Detection::Matched(Variant::Bearish)
        } else {
            Detection::NoMatch
        }
    }

    fn description(&self) -> &'static str {
        "Full-range body with no wicks on either side"
    }
}

// ============================================================
// DOJI
// ============================================================

/// Open and close within `tolerance`, classified by wick shape.
///
/// Classification order, first hit wins: four-price (no range at all),
/// dragonfly (no upper wick, long lower), gravestone (no lower wick, long
/// upper), long-legged (both wicks long). A small body with none of these
/// shapes is not reported.
#[derive(Debug, Clone, Copy, Default)]
pub struct DojiDetector {
    pub tolerance: Tolerance,
}

impl PatternDetector for DojiDetector {
    fn id(&self) -> PatternId {
        PatternId("doji")
    }

    fn lookback(&self) -> usize {
        0
    }

    fn detect(&self, bar: BarRef<'_>) -> Detection {
        let tol = self.tolerance.get();
        if bar.body_size() > tol {
            return Detection::NoMatch;
        }

        let long = LONG_WICK_FACTOR * bar.body_size();
        let variant = if bar.total_range() <= tol {
            Variant::FourPrice
        } else if bar.upper_wick() <= tol && bar.lower_wick() > long {
            Variant::Dragonfly
        } else if bar.lower_wick() <= tol && bar.upper_wick() > long {
            Variant::Gravestone
        } else if bar.upper_wick() > long && bar.lower_wick() > long {
            Variant::LongLegged
        } else {
            return Detection::NoMatch;
        };
        Detection::Matched(variant)
    }

    fn description(&self) -> &'static str {
        "Open and close practically equal"
    }
}

// ============================================================
// PIN BARS (hammer family)
// ============================================================

macro_rules! pin_detector {
    ($(#[$doc:meta])* $name:ident, $id:literal, $side:expr, $desc:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy)]
        pub struct $name {
            pub max_body_ratio: Ratio,
            pub long_wick_factor: f64,
            pub negligible_wick_factor: f64,
        }

        impl Default for $name {
            fn default() -> Self {
                Self {
                    max_body_ratio: Ratio::new_const(SMALL_BODY_RATIO),
                    long_wick_factor: LONG_WICK_FACTOR,
                    negligible_wick_factor: NEGLIGIBLE_WICK_FACTOR,
                }
            }
        }

        impl $name {
            pub fn with_defaults() -> Self {
                Self::default()
            }
        }

        impl PatternDetector for $name {
            fn id(&self) -> PatternId {
                PatternId($id)
            }

            fn lookback(&self) -> usize {
                0
            }

            fn detect(&self, bar: BarRef<'_>) -> Detection {
                Detection::from_flag(is_pin_shape(
                    &bar,
                    $side,
                    self.max_body_ratio.get(),
                    self.long_wick_factor,
                    self.negligible_wick_factor,
                ))
            }

            fn validate_config(&self) -> Result<()> {
                check_factor("long_wick_factor", self.long_wick_factor)?;
                check_factor("negligible_wick_factor", self.negligible_wick_factor)
            }

            fn description(&self) -> &'static str {
                $desc
            }
        }

        impl ParameterizedDetector for $name {
            fn param_meta() -> &'static [ParamMeta] {
                PIN_PARAMS
            }

            fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
                let detector = Self {
                    max_body_ratio: get_ratio(params, "max_body_ratio", SMALL_BODY_RATIO)?,
                    long_wick_factor: get_factor(params, "long_wick_factor", LONG_WICK_FACTOR)?,
                    negligible_wick_factor: get_factor(
                        params,
                        "negligible_wick_factor",
                        NEGLIGIBLE_WICK_FACTOR,
                    )?,
                };
                Ok(detector)
            }

            fn pattern_id_str() -> &'static str {
                $id
            }
        }
    };
}

pin_detector!(
    /// Small body at the top, long lower wick. Read after a decline.
    HammerDetector,
    "hammer",
    WickSide::Lower,
    "Small body on top of a long lower wick (after a decline)"
);

pin_detector!(
    /// Same shape as the hammer. Read after an advance.
    HangingManDetector,
    "hanging_man",
    WickSide::Lower,
    "Small body on top of a long lower wick (after an advance)"
);

pin_detector!(
    /// Small body at the bottom, long upper wick. Read after an advance.
    ShootingStarDetector,
    "shooting_star",
    WickSide::Upper,
    "Small body under a long upper wick (after an advance)"
);

pin_detector!(
    /// Same shape as the shooting star. Read after a decline.
    InvertedHammerDetector,
    "inverted_hammer",
    WickSide::Upper,
    "Small body under a long upper wick (after a decline)"
);

// ============================================================
// PARAMETER METADATA
// ============================================================

static SPINNING_TOP_PARAMS: &[ParamMeta] = &[
    ParamMeta {
        name: "max_body_ratio",
        param_type: ParamType::Ratio,
        default: SMALL_BODY_RATIO,
        range: (0.1, 0.5, 0.05),
        description: "Maximum body / range ratio",
    },
    ParamMeta {
        name: "wick_factor",
        param_type: ParamType::Factor,
        default: LONG_WICK_FACTOR,
        range: (1.0, 3.0, 0.5),
        description: "Minimum wick length as a multiple of the body",
    },
];

pub(crate) static TOLERANCE_PARAMS: &[ParamMeta] = &[ParamMeta {
    name: "tolerance",
    param_type: ParamType::Tolerance,
    default: helpers::DEFAULT_TOLERANCE,
    range: (0.0001, 0.01, 0.0001),
    description: "Absolute price tolerance for equal prices",
}];

static PIN_PARAMS: &[ParamMeta] = &[
    ParamMeta {
        name: "max_body_ratio",
        param_type: ParamType::Ratio,
        default: SMALL_BODY_RATIO,
        range: (0.1, 0.5, 0.05),
        description: "Maximum body / range ratio",
    },
    ParamMeta {
        name: "long_wick_factor",
        param_type: ParamType::Factor,
        default: LONG_WICK_FACTOR,
        range: (1.5, 3.0, 0.5),
        description: "Long wick must exceed this multiple of the body",
    },
    ParamMeta {
        name: "negligible_wick_factor",
        param_type: ParamType::Factor,
        default: NEGLIGIBLE_WICK_FACTOR,
        range: (0.0, 0.3, 0.05),
        description: "Short wick may be at most this multiple of the body",
    },
];

impl ParameterizedDetector for SpinningTopDetector {
    fn param_meta() -> &'static [ParamMeta] {
        SPINNING_TOP_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self {
            max_body_ratio: get_ratio(params, "max_body_ratio", SMALL_BODY_RATIO)?,
            wick_factor: get_factor(params, "wick_factor", LONG_WICK_FACTOR)?,
        })
    }

    fn pattern_id_str() -> &'static str {
        "spinning_top"
    }
}

impl ParameterizedDetector for MarubozuDetector {
    fn param_meta() -> &'static [ParamMeta] {
        TOLERANCE_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self {
            tolerance: get_tolerance(params, "tolerance", helpers::DEFAULT_TOLERANCE)?,
        })
    }

    fn pattern_id_str() -> &'static str {
        "marubozu"
    }
}

impl ParameterizedDetector for DojiDetector {
    fn param_meta() -> &'static [ParamMeta] {
        TOLERANCE_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self {
            tolerance: get_tolerance(params, "tolerance", helpers::DEFAULT_TOLERANCE)?,
        })
    }

    fn pattern_id_str() -> &'static str {
        "doji"
    }
}
