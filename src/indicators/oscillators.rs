//! Bounded momentum oscillators.

use super::{hlc_prefix, mean, require, rolling, rolling_max, rolling_min};
use crate::{Period, Result};

/// Relative Strength Index (RSI).
///
/// Simple rolling means of gains and losses over `period` changes, the first
/// change counted as zero. A window without losses reads 100, a window
/// without any movement is `NaN`.
#[derive(Debug, Clone, Copy)]
pub struct Rsi {
    period: Period,
}

impl Default for Rsi {
    fn default() -> Self {
        Self {
            period: Period::new_const(14),
        }
    }
}

impl Rsi {
    pub fn new(period: usize) -> Result<Self> {
        Ok(Self {
            period: Period::new(period)?,
        })
    }

    pub fn calculate(&self, data: &[f64]) -> Vec<f64> {
        let n = data.len();
        let mut gains = vec![0.0; n];
        let mut losses = vec![0.0; n];
        for i in 1..n {
            let change = data[i] - data[i - 1];
            if change > 0.0 {
                gains[i] = change;
            } else if change < 0.0 {
                losses[i] = -change;
            }
        }

        let period = self.period.get();
        let avg_gain = rolling(&gains, period, mean);
        let avg_loss = rolling(&losses, period, mean);
        avg_gain
            .iter()
            .zip(&avg_loss)
            .map(|(&g, &l)| {
                if l == 0.0 {
                    if g == 0.0 {
                        f64::NAN
                    } else {
                        100.0
                    }
                } else {
                    100.0 - 100.0 / (1.0 + g / l)
                }
            })
            .collect()
    }

    pub fn compute(&self, data: &[f64]) -> Result<Vec<f64>> {
        require(self.period.get(), data.len())?;
        Ok(self.calculate(data))
    }
}

/// %K and its moving average %D.
#[derive(Debug, Clone)]
pub struct StochasticOutput {
    pub k: Vec<f64>,
    pub d: Vec<f64>,
}

/// Stochastic Oscillator.
#[derive(Debug, Clone, Copy)]
pub struct Stochastic {
    k_period: Period,
    d_period: Period,
}

impl Default for Stochastic {
    fn default() -> Self {
        Self {
            k_period: Period::new_const(14),
            d_period: Period::new_const(3),
        }
    }
}

impl Stochastic {
    pub fn new(k_period: usize, d_period: usize) -> Result<Self> {
        Ok(Self {
            k_period: Period::new(k_period)?,
            d_period: Period::new(d_period)?,
        })
    }

    pub fn min_periods(&self) -> usize {
        self.k_period.get() + self.d_period.get() - 1
    }

    pub fn calculate(&self, high: &[f64], low: &[f64], close: &[f64]) -> StochasticOutput {
        let (high, low, close) = hlc_prefix(high, low, close);
        let hh = rolling_max(high, self.k_period.get());
        let ll = rolling_min(low, self.k_period.get());
        let k: Vec<f64> = close
            .iter()
            .zip(hh.iter().zip(&ll))
            .map(|(&c, (&h, &l))| {
                let range = h - l;
                if range == 0.0 {
                    f64::NAN
                } else {
                    100.0 * (c - l) / range
                }
            })
            .collect();

        // NaN-aware: %D only forms once d_period valid %K values exist
        let d = rolling(&k, self.d_period.get(), |w| {
            if w.iter().any(|v| v.is_nan()) {
                f64::NAN
            } else {
                mean(w)
            }
        });
        StochasticOutput { k, d }
    }

    pub fn compute(&self, high: &[f64], low: &[f64], close: &[f64]) -> Result<StochasticOutput> {
        require(self.min_periods(), hlc_prefix(high, low, close).2.len())?;
        Ok(self.calculate(high, low, close))
    }
}

/// Williams %R, from 0 (at the high) to -100 (at the low).
#[derive(Debug, Clone, Copy)]
pub struct WilliamsR {
    period: Period,
}

impl Default for WilliamsR {
    fn default() -> Self {
        Self {
            period: Period::new_const(14),
        }
    }
}

impl WilliamsR {
    pub fn new(period: usize) -> Result<Self> {
        Ok(Self {
            period: Period::new(period)?,
        })
    }

    pub fn calculate(&self, high: &[f64], low: &[f64], close: &[f64]) -> Vec<f64> {
        let (high, low, close) = hlc_prefix(high, low, close);
        let hh = rolling_max(high, self.period.get());
        let ll = rolling_min(low, self.period.get());
        close
            .iter()
            .zip(hh.iter().zip(&ll))
            .map(|(&c, (&h, &l))| {
                let range = h - l;
                if range == 0.0 {
                    f64::NAN
                } else {
                    (h - c) / range * -100.0
                }
            })
            .collect()
    }
}
