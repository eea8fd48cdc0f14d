//! Indicator adapters over price columns.
//!
//! Every indicator is a small struct holding its windows, with a `Default`
//! set to the conventional parameters. `calculate` is infallible and returns
//! a series aligned with its input, `NaN` until enough data has been seen.
//! `compute` does the same but fails with
//! [`PatternError::InsufficientData`](crate::PatternError::InsufficientData)
//! when the input is shorter than the warm-up.
//!
//! Columns come from [`BarChain`](crate::BarChain) extractors such as
//! `closes()` or `view_closes(view)`.

pub mod bands;
pub mod levels;
pub mod moving_averages;
pub mod oscillators;
pub mod trend;

pub use bands::{BollingerBands, BollingerOutput, KeltnerChannels, KeltnerOutput};
pub use levels::{fibonacci_retracement, FibonacciLevel, SupportResistance, Zones};
pub use moving_averages::{Ema, Gmma, GmmaOutput, Macd, MacdOutput, Sma};
pub use oscillators::{Rsi, Stochastic, StochasticOutput, WilliamsR};
pub use trend::{Adx, Ichimoku, IchimokuOutput, ParabolicSar};

use crate::{PatternError, Result};

// ============================================================================
// Shared rolling-window kernels
// ============================================================================

/// Fail unless `got >= need`.
pub(crate) fn require(need: usize, got: usize) -> Result<()> {
    if got < need {
        return Err(PatternError::InsufficientData { need, got });
    }
    Ok(())
}

/// High, low and close cut to the length they share.
pub(crate) fn hlc_prefix<'a>(
    high: &'a [f64],
    low: &'a [f64],
    close: &'a [f64],
) -> (&'a [f64], &'a [f64], &'a [f64]) {
    let n = high.len().min(low.len()).min(close.len());
    (&high[..n], &low[..n], &close[..n])
}

/// Apply `f` to every full trailing window of `period` values.
pub(crate) fn rolling(data: &[f64], period: usize, f: impl Fn(&[f64]) -> f64) -> Vec<f64> {
    let mut out = vec![f64::NAN; data.len()];
    if period == 0 || data.len() < period {
        return out;
    }
    for (i, window) in data.windows(period).enumerate() {
        out[i + period - 1] = f(window);
    }
    out
}

pub(crate) fn rolling_max(data: &[f64], period: usize) -> Vec<f64> {
    rolling(data, period, |w| w.iter().copied().fold(f64::NEG_INFINITY, f64::max))
}

pub(crate) fn rolling_min(data: &[f64], period: usize) -> Vec<f64> {
    rolling(data, period, |w| w.iter().copied().fold(f64::INFINITY, f64::min))
}

pub(crate) fn mean(window: &[f64]) -> f64 {
    window.iter().sum::<f64>() / window.len() as f64
}

/// Sample standard deviation (n - 1 denominator).
pub(crate) fn sample_std(window: &[f64]) -> f64 {
    if window.len() < 2 {
        return f64::NAN;
    }
    let m = mean(window);
    let ss: f64 = window.iter().map(|x| (x - m).powi(2)).sum();
    (ss / (window.len() - 1) as f64).sqrt()
}

/// Exponential moving average with `alpha = 2 / (span + 1)`, seeded with the
/// first value and no bias adjustment.
pub(crate) fn ewm(data: &[f64], span: usize) -> Vec<f64> {
    let alpha = 2.0 / (span as f64 + 1.0);
    let mut out = Vec::with_capacity(data.len());
    let mut prev: Option<f64> = None;
    for &x in data {
        let next = match prev {
            Some(p) if x.is_nan() => p,
            Some(p) => alpha * x + (1.0 - alpha) * p,
            None if x.is_nan() => {
                out.push(f64::NAN);
                continue;
            }
            None => x,
        };
        out.push(next);
        prev = Some(next);
    }
    out
}

/// Move every value `by` places later, filling the gap with `NaN`.
pub(crate) fn shift_forward(data: &[f64], by: usize) -> Vec<f64> {
    let n = data.len();
    let mut out = vec![f64::NAN; n];
    if by < n {
        out[by..].copy_from_slice(&data[..n - by]);
    }
    out
}

/// Move every value `by` places earlier, filling the tail with `NaN`.
pub(crate) fn shift_back(data: &[f64], by: usize) -> Vec<f64> {
    let n = data.len();
    let mut out = vec![f64::NAN; n];
    if by < n {
        out[..n - by].copy_from_slice(&data[by..]);
    }
    out
}
