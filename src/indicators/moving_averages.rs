//! Moving averages and the indicators built directly on them.

use super::{ewm, mean, require, rolling};
use crate::{Period, Result};

/// Simple Moving Average (SMA).
///
/// Unweighted mean of the last `period` values.
#[derive(Debug, Clone, Copy)]
pub struct Sma {
    period: Period,
}

impl Sma {
    pub fn new(period: usize) -> Result<Self> {
        Ok(Self {
            period: Period::new(period)?,
        })
    }

    pub fn period(&self) -> usize {
        self.period.get()
    }

    pub fn calculate(&self, data: &[f64]) -> Vec<f64> {
        rolling(data, self.period.get(), mean)
    }

    pub fn compute(&self, data: &[f64]) -> Result<Vec<f64>> {
        require(self.period.get(), data.len())?;
        Ok(self.calculate(data))
    }
}

/// Exponential Moving Average (EMA).
///
/// `alpha = 2 / (span + 1)`, seeded with the first value, no warm-up.
#[derive(Debug, Clone, Copy)]
pub struct Ema {
    span: Period,
}

impl Ema {
    pub fn new(span: usize) -> Result<Self> {
        Ok(Self {
            span: Period::new(span)?,
        })
    }

    pub fn span(&self) -> usize {
        self.span.get()
    }

    pub fn calculate(&self, data: &[f64]) -> Vec<f64> {
        ewm(data, self.span.get())
    }
}

/// MACD line and its signal line.
#[derive(Debug, Clone)]
pub struct MacdOutput {
    pub macd: Vec<f64>,
    pub signal: Vec<f64>,
}

/// Moving Average Convergence Divergence.
#[derive(Debug, Clone, Copy)]
pub struct Macd {
    fast: Period,
    slow: Period,
    signal: Period,
}

impl Default for Macd {
    fn default() -> Self {
        Self {
            fast: Period::new_const(12),
            slow: Period::new_const(26),
            signal: Period::new_const(9),
        }
    }
}

impl Macd {
    pub fn new(fast: usize, slow: usize, signal: usize) -> Result<Self> {
        Ok(Self {
            fast: Period::new(fast)?,
            slow: Period::new(slow)?,
            signal: Period::new(signal)?,
        })
    }

    pub fn calculate(&self, data: &[f64]) -> MacdOutput {
        let fast = ewm(data, self.fast.get());
        let slow = ewm(data, self.slow.get());
        let macd: Vec<f64> = fast.iter().zip(&slow).map(|(f, s)| f - s).collect();
        let signal = ewm(&macd, self.signal.get());
        MacdOutput { macd, signal }
    }
}

/// Short and long EMA ribbons, keyed by span.
#[derive(Debug, Clone)]
pub struct GmmaOutput {
    pub short_term: Vec<(usize, Vec<f64>)>,
    pub long_term: Vec<(usize, Vec<f64>)>,
}

/// Guppy Multiple Moving Averages.
#[derive(Debug, Clone)]
pub struct Gmma {
    pub short_spans: Vec<usize>,
    pub long_spans: Vec<usize>,
}

impl Default for Gmma {
    fn default() -> Self {
        Self {
            short_spans: vec![3, 5, 8, 10, 12, 15],
            long_spans: vec![30, 35, 40, 45, 50, 60],
        }
    }
}

impl Gmma {
    pub fn calculate(&self, data: &[f64]) -> GmmaOutput {
        let ribbon = |spans: &[usize]| {
            spans
                .iter()
                .map(|&span| (span, ewm(data, span.max(1))))
                .collect::<Vec<_>>()
        };
        GmmaOutput {
            short_term: ribbon(&self.short_spans),
            long_term: ribbon(&self.long_spans),
        }
    }
}
