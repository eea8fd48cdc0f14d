//! Three-bar candlestick patterns
//!
//! Patterns: Morning/Evening Star, Three White Soldiers/Black Crows,
//! Three Inside Up/Down, Three Outside Up/Down, Bullish/Bearish Abandoned Baby.
//!
//! Each detector looks at the window `[first, second, third]` ending at the
//! scanned bar, so it needs two ancestors.

use super::helpers::{
    closes_near_high, closes_near_low, is_doji_like, BABY_DOJI_FACTOR, NEAR_EXTREME_FACTOR,
    SMALL_BODY_RATIO,
};
use crate::{BarRef, Detection, Direction, PatternDetector, PatternId, Ratio};

// ============================================================
// MORNING STAR / EVENING STAR
// ============================================================

/// Trend bar, small-bodied middle bar, reversal bar closing past the first
/// bar's body midpoint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StarDetector {
    pub side: Direction,
    /// Middle bar body / range may be at most this.
    pub max_body_ratio: Ratio,
}

impl StarDetector {
    pub fn morning() -> Self {
        Self {
            side: Direction::Bullish,
            max_body_ratio: Ratio::new_const(SMALL_BODY_RATIO),
        }
    }

    pub fn evening() -> Self {
        Self {
            side: Direction::Bearish,
            max_body_ratio: Ratio::new_const(SMALL_BODY_RATIO),
        }
    }
}

impl PatternDetector for StarDetector {
    fn id(&self) -> PatternId {
        match self.side {
            Direction::Bullish => PatternId("morning_star"),
            Direction::Bearish => PatternId("evening_star"),
        }
    }

    fn lookback(&self) -> usize {
        2
    }

    fn detect(&self, bar: BarRef<'_>) -> Detection {
        let [first, second, third] = window_or_return!(bar, 3);
        let small_middle = second.body_to_range_ratio() <= self.max_body_ratio.get();
        let midpoint = first.body_midpoint();
        let hit = match self.side {
            Direction::Bullish => {
                first.is_bearish() && small_middle && third.is_bullish() && third.close() > midpoint
            }
            Direction::Bearish => {
                first.is_bullish() && small_middle && third.is_bearish() && third.close() < midpoint
            }
        };
        Detection::directional(hit, self.side)
    }

    fn description(&self) -> &'static str {
        "Trend bar, indecision bar, reversal past the first midpoint"
    }
}

// ============================================================
// THREE WHITE SOLDIERS / THREE BLACK CROWS
// ============================================================

/// Three same-coloured bars with strictly advancing (or declining) closes,
/// each closing near its extreme, the last at least as wide as the middle one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThreeSoldiersDetector {
    pub side: Direction,
    /// Close-to-extreme distance allowed, as a fraction of the bar's range.
    pub near_extreme_factor: f64,
}

impl ThreeSoldiersDetector {
    pub fn white_soldiers() -> Self {
        Self {
            side: Direction::Bullish,
            near_extreme_factor: NEAR_EXTREME_FACTOR,
        }
    }

    pub fn black_crows() -> Self {
        Self {
            side: Direction::Bearish,
            near_extreme_factor: NEAR_EXTREME_FACTOR,
        }
    }
}

impl PatternDetector for ThreeSoldiersDetector {
    fn id(&self) -> PatternId {
        match self.side {
            Direction::Bullish => PatternId("three_white_soldiers"),
            Direction::Bearish => PatternId("three_black_crows"),
        }
    }

    fn lookback(&self) -> usize {
        2
    }

    fn detect(&self, bar: BarRef<'_>) -> Detection {
        let [first, second, third] = window_or_return!(bar, 3);
        let f = self.near_extreme_factor;
        let run = [first, second, third];
        let hit = match self.side {
            Direction::Bullish => {
                run.iter().all(|b| b.close() > b.open() && closes_near_high(b, f))
                    && first.close() < second.close()
                    && second.close() < third.close()
            }
            Direction::Bearish => {
                run.iter().all(|b| b.close() < b.open() && closes_near_low(b, f))
                    && first.close() > second.close()
                    && second.close() > third.close()
            }
        } && third.total_range() >= second.total_range();
        Detection::directional(hit, self.side)
    }

    fn validate_config(&self) -> crate::Result<()> {
        super::helpers::check_factor("near_extreme_factor", self.near_extreme_factor)
    }

    fn description(&self) -> &'static str {
        "Three strong same-coloured bars closing near their extremes"
    }
}

// ============================================================
// THREE INSIDE UP / DOWN
// ============================================================

/// Trend bar, opposite bar closing past its midpoint, confirmation bar closing
/// beyond the first bar's extreme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreeInsideDetector {
    pub side: Direction,
}

impl ThreeInsideDetector {
    pub const fn up() -> Self {
        Self {
            side: Direction::Bullish,
        }
    }

    pub const fn down() -> Self {
        Self {
            side: Direction::Bearish,
        }
    }
}

impl PatternDetector for ThreeInsideDetector {
    fn id(&self) -> PatternId {
        match self.side {
            Direction::Bullish => PatternId("three_inside_up"),
            Direction::Bearish => PatternId("three_inside_down"),
        }
    }

    fn lookback(&self) -> usize {
        2
    }

    fn detect(&self, bar: BarRef<'_>) -> Detection {
        let [first, second, third] = window_or_return!(bar, 3);
        let midpoint = first.body_midpoint();
        let hit = match self.side {
            Direction::Bullish => {
                first.is_bearish()
                    && second.is_bullish()
                    && third.is_bullish()
                    && second.close() > midpoint
                    && third.close() > first.high()
            }
            Direction::Bearish => {
                first.is_bullish()
                    && second.is_bearish()
                    && third.is_bearish()
                    && second.close() < midpoint
                    && third.close() < first.low()
            }
        };
        Detection::directional(hit, self.side)
    }

    fn description(&self) -> &'static str {
        "Reversal bar inside the trend bar, confirmed beyond its extreme"
    }
}

// ============================================================
// THREE OUTSIDE UP / DOWN
// ============================================================

/// Engulfing pair followed by a bar closing beyond the engulfing close.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreeOutsideDetector {
    pub side: Direction,
}

impl ThreeOutsideDetector {
    pub const fn up() -> Self {
        Self {
            side: Direction::Bullish,
        }
    }

    pub const fn down() -> Self {
        Self {
            side: Direction::Bearish,
        }
    }
}

impl PatternDetector for ThreeOutsideDetector {
    fn id(&self) -> PatternId {
        match self.side {
            Direction::Bullish => PatternId("three_outside_up"),
            Direction::Bearish => PatternId("three_outside_down"),
        }
    }

    fn lookback(&self) -> usize {
        2
    }

    fn detect(&self, bar: BarRef<'_>) -> Detection {
        let [first, second, third] = window_or_return!(bar, 3);
        let hit = match self.side {
            Direction::Bullish => {
                first.is_bearish()
                    && second.is_bullish()
                    && second.open() < first.close()
                    && second.close() > first.open()
                    && third.is_bullish()
                    && third.close() > second.close()
            }
            Direction::Bearish => {
                first.is_bullish()
                    && second.is_bearish()
                    && second.open() > first.close()
                    && second.close() < first.open()
                    && third.is_bearish()
                    && third.close() < second.close()
            }
        };
        Detection::directional(hit, self.side)
    }

    fn description(&self) -> &'static str {
        "Engulfing pair confirmed by a third bar"
    }
}

// ============================================================
// ABANDONED BABY
// ============================================================

/// Doji gapped away from the bars on both sides.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AbandonedBabyDetector {
    pub side: Direction,
    /// Middle bar body may be at most this fraction of its range.
    pub doji_factor: f64,
}

impl AbandonedBabyDetector {
    pub fn bullish() -> Self {
        Self {
            side: Direction::Bullish,
            doji_factor: BABY_DOJI_FACTOR,
        }
    }

    pub fn bearish() -> Self {
        Self {
            side: Direction::Bearish,
            doji_factor: BABY_DOJI_FACTOR,
        }
    }
}

impl PatternDetector for AbandonedBabyDetector {
    fn id(&self) -> PatternId {
        match self.side {
            Direction::Bullish => PatternId("bullish_abandoned_baby"),
            Direction::Bearish => PatternId("bearish_abandoned_baby"),
        }
    }

    fn lookback(&self) -> usize {
        2
    }

    fn detect(&self, bar: BarRef<'_>) -> Detection {
        let [first, baby, third] = window_or_return!(bar, 3);
        if !is_doji_like(baby, self.doji_factor) {
            return Detection::NoMatch;
        }
        let hit = match self.side {
            Direction::Bullish => {
                first.is_bearish()
                    && baby.open() < first.low()
                    && third.open() > baby.high()
                    && third.is_bullish()
            }
            Direction::Bearish => {
                first.is_bullish()
                    && baby.open() > first.high()
                    && third.open() < baby.low()
                    && third.is_bearish()
            }
        };
        Detection::directional(hit, self.side)
    }

    fn validate_config(&self) -> crate::Result<()> {
        super::helpers::check_factor("doji_factor", self.doji_factor)
    }

    fn description(&self) -> &'static str {
        "Gapped doji between a trend bar and a reversal bar"
    }
}
