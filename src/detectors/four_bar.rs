//! Four-bar candlestick patterns
//!
//! Patterns: Bullish/Bearish Three-Line Strike.

use crate::{BarRef, Detection, Direction, PatternDetector, PatternId};

/// Three same-coloured bars with monotonic closes, struck out by a fourth bar
/// closing beyond the first bar's open.
///
/// `Bullish` expects three falling bearish bars and a bullish strike,
/// `Bearish` the mirror image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreeLineStrikeDetector {
    pub side: Direction,
}

impl ThreeLineStrikeDetector {
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

impl PatternDetector for ThreeLineStrikeDetector {
    fn id(&self) -> PatternId {
        match self.side {
            Direction::Bullish => PatternId("bullish_three_line_strike"),
            Direction::Bearish => PatternId("bearish_three_line_strike"),
        }
    }

    fn lookback(&self) -> usize {
        3
    }

    fn detect(&self, bar: BarRef<'_>) -> Detection {
        let [first, second, third, strike] = window_or_return!(bar, 4);
        let trend = self.side.opposite();
        if [first, second, third].iter().any(|b| b.direction() != trend) {
            return Detection::NoMatch;
        }
        let hit = match self.side {
            Direction::Bullish => {
                second.close() < first.close()
                    && third.close() < second.close()
                    && strike.is_bullish()
                    && strike.close() > first.open()
            }
            Direction::Bearish => {
                second.close() > first.close()
                    && third.close() > second.close()
                    && strike.is_bearish()
                    && strike.close() < first.open()
            }
        };
        Detection::directional(hit, self.side)
    }

    fn description(&self) -> &'static str {
        "Three-bar run erased by one opposite bar"
    }
}
