//! Two-bar candlestick patterns
//!
//! Patterns: Bullish/Bearish Engulfing, Tweezer Top/Bottom, Bullish/Bearish
//! Harami, Piercing Pattern, Dark Cloud Cover, Matching High/Low,
//! Bullish/Bearish Kicker, Inside Bar.
//!
//! Mirror-image pairs share one detector type parameterised by the direction
//! of the signal; each instance still reports under its own pattern name.

use super::helpers::within;
use crate::{BarRef, Detection, Direction, PatternDetector, PatternId, Tolerance};

impl_with_defaults!(PiercingDetector, DarkCloudCoverDetector, InsideBarDetector);

// ============================================================
// ENGULFING
// ============================================================

/// The second body swallows the first, against the first bar's direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngulfingDetector {
    pub side: Direction,
}

impl EngulfingDetector {
    pub const fn bullish() -> Self {
        Self {
            side: Direction::Bullish,
        }
    }

    pub const fn bearish() -> Self {
        Self {
            side: Direction::Bearish,
        }
    }
}

impl PatternDetector for EngulfingDetector {
    fn id(&self) -> PatternId {
        match self.side {
            Direction::Bullish => PatternId("bullish_engulfing"),
            Direction::Bearish => PatternId("bearish_engulfing"),
        }
    }

    fn lookback(&self) -> usize {
        1
    }

    fn detect(&self, bar: BarRef<'_>) -> Detection {
        let [prev, curr] = window_or_return!(bar, 2);
        let hit = match self.side {
            Direction::Bullish => {
                prev.is_bearish()
                    && curr.is_bullish()
                    && curr.open() < prev.close()
                    && curr.close() > prev.open()
            }
            Direction::Bearish => {
                prev.is_bullish()
                    && curr.is_bearish()
                    && curr.open() > prev.close()
                    && curr.close() < prev.open()
            }
        };
        Detection::directional(hit, self.side)
    }

    fn description(&self) -> &'static str {
        "Second body engulfs the opposite-coloured first body"
    }
}

// ============================================================
// TWEEZERS
// ============================================================

/// Opposite-coloured pair sharing the same extreme.
///
/// `Bearish` is the tweezer top (bullish then bearish, equal highs),
/// `Bullish` the tweezer bottom (bearish then bullish, equal lows).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TweezerDetector {
    pub side: Direction,
    pub tolerance: Tolerance,
}

impl TweezerDetector {
    pub fn top() -> Self {
        Self {
            side: Direction::Bearish,
            tolerance: Tolerance::default(),
        }
    }

    pub fn bottom() -> Self {
        Self {
            side: Direction::Bullish,
            tolerance: Tolerance::default(),
        }
    }

    pub fn with_tolerance(mut self, tolerance: Tolerance) -> Self {
        self.tolerance = tolerance;
        self
    }
}

impl PatternDetector for TweezerDetector {
    fn id(&self) -> PatternId {
        match self.side {
            Direction::Bearish => PatternId("tweezer_top"),
            Direction::Bullish => PatternId("tweezer_bottom"),
        }
    }

    fn lookback(&self) -> usize {
        1
    }

    fn detect(&self, bar: BarRef<'_>) -> Detection {
        let [prev, curr] = window_or_return!(bar, 2);
        let tol = self.tolerance.get();
        let hit = match self.side {
            Direction::Bearish => {
                prev.is_bullish() && curr.is_bearish() && within(curr.high(), prev.high(), tol)
            }
            Direction::Bullish => {
                prev.is_bearish() && curr.is_bullish() && within(curr.low(), prev.low(), tol)
            }
        };
        Detection::directional(hit, self.side)
    }

    fn description(&self) -> &'static str {
        "Opposite-coloured pair with matching extremes"
    }
}

// ============================================================
// HARAMI
// ============================================================

/// The second body sits inside the opposite-coloured first body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HaramiDetector {
    pub side: Direction,
}

impl HaramiDetector {
    pub const fn bullish() -> Self {
        Self {
            side: Direction::Bullish,
        }
    }

    pub const fn bearish() -> Self {
        Self {
            side: Direction::Bearish,
        }
    }
}

impl PatternDetector for HaramiDetector {
    fn id(&self) -> PatternId {
        match self.side {
            Direction::Bullish => PatternId("bullish_harami"),
            Direction::Bearish => PatternId("bearish_harami"),
        }
    }

    fn lookback(&self) -> usize {
        1
    }

    fn detect(&self, bar: BarRef<'_>) -> Detection {
        let [prev, curr] = window_or_return!(bar, 2);
        let hit = match self.side {
            Direction::Bullish => {
                prev.is_bearish()
                    && curr.is_bullish()
                    && curr.open() > prev.close()
                    && curr.close() < prev.open()
            }
            Direction::Bearish => {
                prev.is_bullish()
                    && curr.is_bearish()
                    && curr.open() < prev.close()
                    && curr.close() > prev.open()
            }
        };
        Detection::directional(hit, self.side)
    }

    fn description(&self) -> &'static str {
        "Second body contained in the opposite-coloured first body"
    }
}

// ============================================================
// PIERCING / DARK CLOUD COVER
// ============================================================

/// Bearish bar, then a bullish bar opening below its low and closing above
/// its body midpoint.
#[derive(Debug, Clone, Copy, Default)]
pub struct PiercingDetector;

impl PatternDetector for PiercingDetector {
    fn id(&self) -> PatternId {
        PatternId("piercing_pattern")
    }

    fn lookback(&self) -> usize {
        1
    }

    fn detect(&self, bar: BarRef<'_>) -> Detection {
        let [prev, curr] = window_or_return!(bar, 2);
        let hit = prev.is_bearish()
            && curr.is_bullish()
            && curr.open() < prev.low()
            && curr.close() > prev.body_midpoint();
        Detection::directional(hit, Direction::Bullish)
    }

    fn description(&self) -> &'static str {
        "Gap below a bearish bar, recovering past its midpoint"
    }
}

/// Bullish bar, then a bearish bar opening above its high and closing below
/// its body midpoint.
#[derive(Debug, Clone, Copy, Default)]
pub struct DarkCloudCoverDetector;

impl PatternDetector for DarkCloudCoverDetector {
    fn id(&self) -> PatternId {
        PatternId("dark_cloud_cover")
    }

    fn lookback(&self) -> usize {
        1
    }

    fn detect(&self, bar: BarRef<'_>) -> Detection {
        let [prev, curr] = window_or_return!(bar, 2);
        let hit = prev.is_bullish()
            && curr.is_bearish()
            && curr.open() > prev.high()
            && curr.close() < prev.body_midpoint();
        Detection::directional(hit, Direction::Bearish)
    }

    fn description(&self) -> &'static str {
        "Gap above a bullish bar, falling past its midpoint"
    }
}

// ============================================================
// MATCHING HIGH / LOW
// ============================================================

/// Which extreme of the bar a comparison looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extreme {
    High,
    Low,
}

/// Two consecutive bars with equal highs (or lows), regardless of colour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchingDetector {
    pub extreme: Extreme,
    pub tolerance: Tolerance,
}

impl MatchingDetector {
    pub fn high() -> Self {
        Self {
            extreme: Extreme::High,
            tolerance: Tolerance::default(),
        }
    }

    pub fn low() -> Self {
        Self {
            extreme: Extreme::Low,
            tolerance: Tolerance::default(),
        }
    }

    pub fn with_tolerance(mut self, tolerance: Tolerance) -> Self {
        self.tolerance = tolerance;
        self
    }
}

impl PatternDetector for MatchingDetector {
    fn id(&self) -> PatternId {
        match self.extreme {
            Extreme::High => PatternId("matching_high"),
            Extreme::Low => PatternId("matching_low"),
        }
    }

    fn lookback(&self) -> usize {
        1
    }

    fn detect(&self, bar: BarRef<'_>) -> Detection {
        let [prev, curr] = window_or_return!(bar, 2);
        let tol = self.tolerance.get();
        let hit = match self.extreme {
            Extreme::High => within(curr.high(), prev.high(), tol),
            Extreme::Low => within(curr.low(), prev.low(), tol),
        };
        Detection::from_flag(hit)
    }

    fn description(&self) -> &'static str {
        "Consecutive bars with equal extremes"
    }
}

// ============================================================
// KICKER
// ============================================================

/// Direction flips and the second bar opens beyond the first bar's open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KickerDetector {
    pub side: Direction,
}

impl KickerDetector {
    pub const fn bullish() -> Self {
        Self {
            side: Direction::Bullish,
        }
    }

    pub const fn bearish() -> Self {
        Self {
            side: Direction::Bearish,
        }
    }
}

impl PatternDetector for KickerDetector {
    fn id(&self) -> PatternId {
        match self.side {
            Direction::Bullish => PatternId("bullish_kicker"),
            Direction::Bearish => PatternId("bearish_kicker"),
        }
    }

    fn lookback(&self) -> usize {
        1
    }

    fn detect(&self, bar: BarRef<'_>) -> Detection {
        let [prev, curr] = window_or_return!(bar, 2);
        let hit = match self.side {
            Direction::Bullish => {
                prev.is_bearish() && curr.is_bullish() && curr.open() > prev.open()
            }
            Direction::Bearish => {
                prev.is_bullish() && curr.is_bearish() && curr.open() < prev.open()
            }
        };
        Detection::directional(hit, self.side)
    }

    fn description(&self) -> &'static str {
        "Direction flip with an open beyond the prior open"
    }
}

// ============================================================
// INSIDE BAR
// ============================================================

/// High and low strictly inside the previous bar's range.
#[derive(Debug, Clone, Copy, Default)]
pub struct InsideBarDetector;

impl PatternDetector for InsideBarDetector {
    fn id(&self) -> PatternId {
        PatternId("inside_bar")
    }

    fn lookback(&self) -> usize {
        1
    }

    fn detect(&self, bar: BarRef<'_>) -> Detection {
        let [prev, curr] = window_or_return!(bar, 2);
        Detection::from_flag(curr.high() < prev.high() && curr.low() > prev.low())
    }

    fn description(&self) -> &'static str {
        "Range contained in the previous bar's range"
    }
}
