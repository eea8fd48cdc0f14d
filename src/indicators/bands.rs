//! Envelope indicators: a centre line with bands above and below.

use super::{ewm, hlc_prefix, mean, require, rolling, rolling_max, rolling_min, sample_std};
use crate::{Period, Result};

/// Middle, upper and lower band.
#[derive(Debug, Clone)]
pub struct BollingerOutput {
    pub middle: Vec<f64>,
    pub upper: Vec<f64>,
    pub lower: Vec<f64>,
}

/// Bollinger Bands: SMA middle, bands `num_std` sample standard deviations away.
#[derive(Debug, Clone, Copy)]
pub struct BollingerBands {
    period: Period,
    pub num_std: f64,
}

impl Default for BollingerBands {
    fn default() -> Self {
        Self {
            period: Period::new_const(20),
            num_std: 2.0,
        }
    }
}

impl BollingerBands {
    pub fn new(period: usize, num_std: f64) -> Result<Self> {
        Ok(Self {
            period: Period::new(period)?,
            num_std,
        })
    }

    pub fn calculate(&self, data: &[f64]) -> BollingerOutput {
        let period = self.period.get();
        let middle = rolling(data, period, mean);
        let std = rolling(data, period, sample_std);
        let upper = middle.iter().zip(&std).map(|(m, s)| m + self.num_std * s).collect();
        let lower = middle.iter().zip(&std).map(|(m, s)| m - self.num_std * s).collect();
        BollingerOutput { middle, upper, lower }
    }

    pub fn compute(&self, data: &[f64]) -> Result<BollingerOutput> {
        require(self.period.get(), data.len())?;
        Ok(self.calculate(data))
    }
}

/// EMA middle, upper and lower channel.
#[derive(Debug, Clone)]
pub struct KeltnerOutput {
    pub middle: Vec<f64>,
    pub upper: Vec<f64>,
    pub lower: Vec<f64>,
}

/// Keltner Channels.
///
/// The channel width is the full high-low span of the last `range_period`
/// bars times `multiplier`, not a smoothed true range.
#[derive(Debug, Clone, Copy)]
pub struct KeltnerChannels {
    ema_span: Period,
    range_period: Period,
    pub multiplier: f64,
}

impl Default for KeltnerChannels {
    fn default() -> Self {
        Self {
            ema_span: Period::new_const(20),
            range_period: Period::new_const(10),
            multiplier: 2.0,
        }
    }
}

impl KeltnerChannels {
    pub fn new(ema_span: usize, range_period: usize, multiplier: f64) -> Result<Self> {
        Ok(Self {
            ema_span: Period::new(ema_span)?,
            range_period: Period::new(range_period)?,
            multiplier,
        })
    }

    pub fn calculate(&self, high: &[f64], low: &[f64], close: &[f64]) -> KeltnerOutput {
        let (high, low, close) = hlc_prefix(high, low, close);
        let middle = ewm(close, self.ema_span.get());
        let hh = rolling_max(high, self.range_period.get());
        let ll = rolling_min(low, self.range_period.get());
        let width: Vec<f64> = hh.iter().zip(&ll).map(|(h, l)| (h - l) * self.multiplier).collect();
        let upper = middle.iter().zip(&width).map(|(m, w)| m + w).collect();
        let lower = middle.iter().zip(&width).map(|(m, w)| m - w).collect();
        KeltnerOutput { middle, upper, lower }
    }
}
