//! Trend direction and trend strength indicators.

use super::{hlc_prefix, require, rolling_max, rolling_min, shift_back, shift_forward};
use crate::{Period, Result};

// ============================================================================
// Ichimoku
// ============================================================================

/// Ichimoku Kinko Hyo lines, all aligned with the input bars.
#[derive(Debug, Clone)]
pub struct IchimokuOutput {
    pub tenkan_sen: Vec<f64>,
    pub kijun_sen: Vec<f64>,
    /// Shifted forward by `displacement`.
    pub senkou_span_a: Vec<f64>,
    /// Shifted forward by `displacement`.
    pub senkou_span_b: Vec<f64>,
    /// Close shifted back by `displacement`.
    pub chikou_span: Vec<f64>,
}

#[derive(Debug, Clone, Copy)]
pub struct Ichimoku {
    tenkan: Period,
    kijun: Period,
    senkou_b: Period,
    displacement: usize,
}

impl Default for Ichimoku {
    fn default() -> Self {
        Self {
            tenkan: Period::new_const(9),
            kijun: Period::new_const(26),
            senkou_b: Period::new_const(52),
            displacement: 26,
        }
    }
}

impl Ichimoku {
    pub fn new(tenkan: usize, kijun: usize, senkou_b: usize, displacement: usize) -> Result<Self> {
        Ok(Self {
            tenkan: Period::new(tenkan)?,
            kijun: Period::new(kijun)?,
            senkou_b: Period::new(senkou_b)?,
            displacement,
        })
    }

    /// Bars before Senkou Span B first has a value.
    pub fn min_periods(&self) -> usize {
        self.senkou_b.get() + self.displacement
    }

    pub fn calculate(&self, high: &[f64], low: &[f64], close: &[f64]) -> IchimokuOutput {
        let (high, low, close) = hlc_prefix(high, low, close);
        let midline = |period: Period| -> Vec<f64> {
            let hh = rolling_max(high, period.get());
            let ll = rolling_min(low, period.get());
            hh.iter().zip(&ll).map(|(h, l)| (h + l) / 2.0).collect()
        };

        let tenkan_sen = midline(self.tenkan);
        let kijun_sen = midline(self.kijun);
        let span_a: Vec<f64> = tenkan_sen.iter().zip(&kijun_sen).map(|(t, k)| (t + k) / 2.0).collect();
        let span_b = midline(self.senkou_b);

        IchimokuOutput {
            senkou_span_a: shift_forward(&span_a, self.displacement),
            senkou_span_b: shift_forward(&span_b, self.displacement),
            chikou_span: shift_back(close, self.displacement),
            tenkan_sen,
            kijun_sen,
        }
    }

    pub fn compute(&self, high: &[f64], low: &[f64], close: &[f64]) -> Result<IchimokuOutput> {
        require(self.min_periods(), hlc_prefix(high, low, close).2.len())?;
        Ok(self.calculate(high, low, close))
    }
}

// ============================================================================
// ADX
// ============================================================================

/// Average Directional Index with Wilder smoothing.
///
/// The first value appears at index `2 * period - 1`.
#[derive(Debug, Clone, Copy)]
pub struct Adx {
    period: Period,
}

impl Default for Adx {
    fn default() -> Self {
        Self {
            period: Period::new_const(14),
        }
    }
}

impl Adx {
    pub fn new(period: usize) -> Result<Self> {
        Ok(Self {
            period: Period::new(period)?,
        })
    }

    pub fn min_periods(&self) -> usize {
        2 * self.period.get()
    }

    pub fn calculate(&self, high: &[f64], low: &[f64], close: &[f64]) -> Vec<f64> {
        let (high, low, close) = hlc_prefix(high, low, close);
        let n = close.len();
        let p = self.period.get();
        let mut adx = vec![f64::NAN; n];
        if n < self.min_periods() {
            return adx;
        }

        let mut tr = vec![0.0; n];
        let mut plus_dm = vec![0.0; n];
        let mut minus_dm = vec![0.0; n];
        for i in 1..n {
            let up = high[i] - high[i - 1];
            let down = low[i - 1] - low[i];
            plus_dm[i] = if up > down && up > 0.0 { up } else { 0.0 };
            minus_dm[i] = if down > up && down > 0.0 { down } else { 0.0 };
            tr[i] = (high[i] - low[i])
                .max((high[i] - close[i - 1]).abs())
                .max((low[i] - close[i - 1]).abs());
        }

        // Wilder running sums seeded with the first `p` moves
        let mut s_tr: f64 = tr[1..=p].iter().sum();
        let mut s_plus: f64 = plus_dm[1..=p].iter().sum();
        let mut s_minus: f64 = minus_dm[1..=p].iter().sum();

        let dx_at = |s_tr: f64, s_plus: f64, s_minus: f64| -> f64 {
            if s_tr == 0.0 {
                return 0.0;
            }
            let plus_di = 100.0 * s_plus / s_tr;
            let minus_di = 100.0 * s_minus / s_tr;
            let sum = plus_di + minus_di;
            if sum == 0.0 {
                0.0
            } else {
                100.0 * (plus_di - minus_di).abs() / sum
            }
        };

        let mut dx = vec![0.0; n];
        dx[p] = dx_at(s_tr, s_plus, s_minus);
        for i in (p + 1)..n {
            let pf = p as f64;
            s_tr = s_tr - s_tr / pf + tr[i];
            s_plus = s_plus - s_plus / pf + plus_dm[i];
            s_minus = s_minus - s_minus / pf + minus_dm[i];
            dx[i] = dx_at(s_tr, s_plus, s_minus);
        }

        let first = 2 * p - 1;
        let mut value = dx[p..=first].iter().sum::<f64>() / p as f64;
        adx[first] = value;
        for i in (first + 1)..n {
            value = (value * (p - 1) as f64 + dx[i]) / p as f64;
            adx[i] = value;
        }
        adx
    }

    pub fn compute(&self, high: &[f64], low: &[f64], close: &[f64]) -> Result<Vec<f64>> {
        require(self.min_periods(), hlc_prefix(high, low, close).2.len())?;
        Ok(self.calculate(high, low, close))
    }
}

// ============================================================================
// Parabolic SAR
// ============================================================================

/// Parabolic Stop and Reverse.
///
/// The initial direction comes from the directional movement between the
/// first two bars; index 0 has no value.
#[derive(Debug, Clone, Copy)]
pub struct ParabolicSar {
    pub af_start: f64,
    pub af_step: f64,
    pub af_max: f64,
}

impl Default for ParabolicSar {
    fn default() -> Self {
        Self {
            af_start: 0.02,
            af_step: 0.02,
            af_max: 0.2,
        }
    }
}

impl ParabolicSar {
    pub fn new(af_start: f64, af_step: f64, af_max: f64) -> Self {
        Self {
            af_start,
            af_step,
            af_max,
        }
    }

    pub fn calculate(&self, high: &[f64], low: &[f64]) -> Vec<f64> {
        let n = high.len().min(low.len());
        let mut out = vec![f64::NAN; n];
        if n < 2 {
            return out;
        }

        let up = high[1] - high[0];
        let down = low[0] - low[1];
        let mut is_long = !(down > 0.0 && down > up);
        let mut af = self.af_start;
        let (mut ep, mut sar) = if is_long { (high[1], low[0]) } else { (low[1], high[0]) };

        for i in 1..n {
            let prev_low = low[i - 1];
            let prev_high = high[i - 1];
            if is_long {
                if low[i] <= sar {
                    // reverse to short
                    is_long = false;
                    sar = ep.max(prev_high).max(high[i]);
                    out[i] = sar;
                    af = self.af_start;
                    ep = low[i];
                    sar = (sar + af * (ep - sar)).max(prev_high).max(high[i]);
                } else {
                    out[i] = sar;
                    if high[i] > ep {
                        ep = high[i];
                        af = (af + self.af_step).min(self.af_max);
                    }
                    sar = (sar + af * (ep - sar)).min(prev_low).min(low[i]);
                }
            } else if high[i] >= sar {
                // reverse to long
                is_long = true;
                sar = ep.min(prev_low).min(low[i]);
                out[i] = sar;
                af = self.af_start;
                ep = high[i];
                sar = (sar + af * (ep - sar)).min(prev_low).min(low[i]);
            } else {
                out[i] = sar;
                if low[i] < ep {
                    ep = low[i];
                    af = (af + self.af_step).min(self.af_max);
                }
                sar = (sar + af * (ep - sar)).max(prev_high).max(high[i]);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trending(n: usize, step: f64) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
        let close: Vec<f64> = (0..n).map(|i| 100.0 + step * i as f64).collect();
        let high = close.iter().map(|c| c + 1.0).collect();
        let low = close.iter().map(|c| c - 1.0).collect();
        (high, low, close)
    }

    #[test]
    fn test_ichimoku_shifts() {
        let (high, low, close) = trending(100, 1.0);
        let out = Ichimoku::default().calculate(&high, &low, &close);

        assert!(out.tenkan_sen[7].is_nan());
        // midpoint of the last 9 highs/lows of a linear series sits on the close 4 bars back
        assert!((out.tenkan_sen[8] - close[4]).abs() < 1e-12);
        // span B needs 52 bars, then 26 more of displacement
        assert!(out.senkou_span_b[76].is_nan());
        assert!(!out.senkou_span_b[77].is_nan());
        assert_eq!(out.chikou_span[0], close[26]);
        assert!(out.chikou_span[74].is_nan());
        assert!(Ichimoku::default().compute(&high[..50], &low[..50], &close[..50]).is_err());
    }

    #[test]
    fn test_adx_uneven_columns_use_shared_prefix() {
        let (high, low, close) = trending(60, 1.0);
        let adx = Adx::default();
        let full = adx.calculate(&high[..40], &low[..40], &close[..40]);

        let uneven = adx.calculate(&high[..40], &low, &close);
        assert_eq!(uneven.len(), 40);
        assert!(full.iter().zip(&uneven).all(|(a, b)| a.to_bits() == b.to_bits()));

        assert_eq!(
            adx.compute(&high[..20], &low, &close),
            Err(crate::PatternError::InsufficientData { need: 28, got: 20 })
        );
    }

    #[test]
    fn test_adx_strong_trend() {
        let (high, low, close) = trending(60, 1.0);
        let adx = Adx::default().calculate(&high, &low, &close);
        assert!(adx[26].is_nan());
        assert!(adx[27] > 90.0);
        assert!(adx[59] > 90.0);
    }

    #[test]
    fn test_adx_short_input() {
        let (high, low, close) = trending(20, 1.0);
        assert!(Adx::default().calculate(&high, &low, &close).iter().all(|v| v.is_nan()));
        assert!(Adx::default().compute(&high, &low, &close).is_err());
    }

    #[test]
    fn test_sar_trails_an_uptrend() {
        let (high, low, _) = trending(30, 1.0);
        let sar = ParabolicSar::default().calculate(&high, &low);
        assert!(sar[0].is_nan());
        assert_eq!(sar[1], low[0]);
        for i in 1..30 {
            assert!(sar[i] < low[i], "sar above low at {i}");
        }
    }

    #[test]
    fn test_sar_flips_on_reversal() {
        let (mut high, mut low, _) = trending(10, 1.0);
        let (down_high, down_low, _) = trending(10, -1.0);
        // continue from the last level downwards
        high.extend(down_high.iter().map(|h| h - 100.0 + 108.0));
        low.extend(down_low.iter().map(|l| l - 100.0 + 108.0));
        let sar = ParabolicSar::default().calculate(&high, &low);
        let last = high.len() - 1;
        assert!(sar[last] > high[last]);
    }
}
