//! Price levels: Fibonacci retracements and swing-based support/resistance.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{Bar, BarChain, PatternError, Result};

/// Retracement ratios, shallowest first.
pub const FIBONACCI_RATIOS: [f64; 5] = [0.236, 0.382, 0.5, 0.618, 0.786];

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FibonacciLevel {
    pub ratio: f64,
    pub price: f64,
}

/// Retracement levels measured down from `swing_high`.
pub fn fibonacci_retracement(swing_high: f64, swing_low: f64) -> [FibonacciLevel; 5] {
    let span = swing_high - swing_low;
    FIBONACCI_RATIOS.map(|ratio| FibonacciLevel {
        ratio,
        price: swing_high - span * ratio,
    })
}

/// Aggregated support and resistance prices, each ascending.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Zones {
    pub support: Vec<f64>,
    pub resistance: Vec<f64>,
}

/// Swing-point support/resistance finder.
///
/// A bar is a resistance point when its high is the highest high of the
/// `window` bars on either side, and a support point when its low is the
/// lowest low. Points closer than `tolerance` (relative to the price) to the
/// running mean of a group are merged into that group.
#[derive(Debug, Clone, Copy)]
pub struct SupportResistance {
    window: usize,
    tolerance: f64,
}

impl Default for SupportResistance {
    fn default() -> Self {
        Self {
            window: 5,
            tolerance: 0.001,
        }
    }
}

impl SupportResistance {
    pub fn new(window: usize, tolerance: f64) -> Result<Self> {
        if window == 0 {
            return Err(PatternError::InvalidValue("window must be positive"));
        }
        if !tolerance.is_finite() || !(0.0..=1.0).contains(&tolerance) {
            return Err(PatternError::OutOfRange {
                field: "tolerance",
                value: tolerance,
                min: 0.0,
                max: 1.0,
            });
        }
        Ok(Self { window, tolerance })
    }

    /// Zones over the bars whose timestamp lies in `[start, end]`.
    ///
    /// Returns `None` when no bar falls in the range.
    pub fn calculate(&self, chain: &BarChain, start: DateTime<Utc>, end: DateTime<Utc>) -> Option<Zones> {
        let bars: Vec<&Bar> = chain
            .bars()
            .iter()
            .filter(|bar| bar.timestamp() >= start && bar.timestamp() <= end)
            .collect();
        if bars.is_empty() {
            return None;
        }

        let w = self.window;
        let mut support = Vec::new();
        let mut resistance = Vec::new();
        if bars.len() > 2 * w {
            for i in w..bars.len() - w {
                let around = &bars[i - w..=i + w];
                let highest = around.iter().map(|b| b.high()).fold(f64::NEG_INFINITY, f64::max);
                let lowest = around.iter().map(|b| b.low()).fold(f64::INFINITY, f64::min);
                if bars[i].high() == highest {
                    resistance.push(bars[i].high());
                }
                if bars[i].low() == lowest {
                    support.push(bars[i].low());
                }
            }
        }

        Some(Zones {
            support: self.aggregate(support),
            resistance: self.aggregate(resistance),
        })
    }

    fn aggregate(&self, mut levels: Vec<f64>) -> Vec<f64> {
        levels.sort_by(f64::total_cmp);
        let mut groups: Vec<Vec<f64>> = Vec::new();
        for price in levels {
            match groups.last_mut() {
                Some(group) if (price - group_mean(group)).abs() <= self.tolerance * price => {
                    group.push(price)
                }
                _ => groups.push(vec![price]),
            }
        }
        groups.iter().map(|g| group_mean(g)).collect()
    }
}

fn group_mean(group: &[f64]) -> f64 {
    group.iter().sum::<f64>() / group.len() as f64
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::{Ohlc, PriceRow};

    fn chain_of(highs_lows: &[(f64, f64)]) -> BarChain {
        BarChain::from_rows(highs_lows.iter().enumerate().map(|(i, &(h, l))| {
            let mid = (h + l) / 2.0;
            PriceRow::new(
                Ohlc::new(mid, h, l, mid),
                1.0,
                Utc.timestamp_opt(1_700_000_000 + 60 * i as i64, 0).unwrap(),
            )
        }))
        .unwrap()
    }

    fn ts(minute: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + 60 * minute, 0).unwrap()
    }

    #[test]
    fn test_fibonacci_levels() {
        let levels = fibonacci_retracement(200.0, 100.0);
        assert_eq!(levels[2].ratio, 0.5);
        assert!((levels[0].price - 176.4).abs() < 1e-9);
        assert!((levels[2].price - 150.0).abs() < 1e-9);
        assert!((levels[4].price - 121.4).abs() < 1e-9);
    }

    #[test]
    fn test_single_peak_and_trough() {
        let chain = chain_of(&[
            (10.0, 9.0),
            (11.0, 9.5),
            (15.0, 10.0),
            (11.0, 9.5),
            (10.0, 8.0),
            (9.0, 5.0),
            (10.0, 8.0),
        ]);
        let sr = SupportResistance::new(1, 0.001).unwrap();
        let zones = sr.calculate(&chain, ts(0), ts(6)).unwrap();
        assert_eq!(zones.resistance, vec![15.0]);
        assert_eq!(zones.support, vec![5.0]);
    }

    #[test]
    fn test_nearby_levels_merge() {
        let sr = SupportResistance::new(1, 0.01).unwrap();
        assert_eq!(sr.aggregate(vec![100.5, 100.0, 120.0]), vec![100.25, 120.0]);
    }

    #[test]
    fn test_empty_range() {
        let chain = chain_of(&[(10.0, 9.0), (11.0, 9.5)]);
        let sr = SupportResistance::default();
        assert!(sr.calculate(&chain, ts(10), ts(20)).is_none());
        // in range but too short for a full window on both sides
        assert_eq!(sr.calculate(&chain, ts(0), ts(1)), Some(Zones::default()));
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(SupportResistance::new(0, 0.001).is_err());
        assert!(SupportResistance::new(5, -1.0).is_err());
    }
}
