//! Signal strategies combining indicator adapters.
//!
//! A strategy reads a [`BarChain`] and produces per-bar buy/sell flags. Band
//! and range inputs (highs, lows) come from the bid view the bars are built
//! on; the price the signals compare against is the close of a configurable
//! [`PriceView`], mid by default.

use serde::Serialize;
use tracing::debug;

use crate::{
    indicators::{Adx, BollingerBands, Ichimoku, ParabolicSar, Rsi, Stochastic},
    BarChain, PriceView, Result,
};

/// Buy and sell flags aligned with the bars of the evaluated chain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Signals {
    pub buy: Vec<bool>,
    pub sell: Vec<bool>,
}

impl Signals {
    fn with_len(len: usize) -> Self {
        Self {
            buy: vec![false; len],
            sell: vec![false; len],
        }
    }

    pub fn len(&self) -> usize {
        self.buy.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buy.is_empty()
    }

    pub fn buy_count(&self) -> usize {
        self.buy.iter().filter(|&&b| b).count()
    }

    pub fn sell_count(&self) -> usize {
        self.sell.iter().filter(|&&s| s).count()
    }
}

pub trait Strategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Fails with [`PatternError::InsufficientData`](crate::PatternError::InsufficientData)
    /// when the chain is shorter than the slowest indicator's warm-up, or
    /// [`PatternError::MissingPriceView`](crate::PatternError::MissingPriceView)
    /// when a bar lacks the compared view.
    fn evaluate(&self, chain: &BarChain) -> Result<Signals>;
}

fn finish(name: &str, chain: &BarChain, signals: Signals) -> Signals {
    debug!(
        strategy = name,
        bars = chain.len(),
        buys = signals.buy_count(),
        sells = signals.sell_count(),
        "strategy evaluated"
    );
    signals
}

// ============================================================
// RSI + BOLLINGER
// ============================================================

/// Mean reversion: oversold below the lower band, overbought above the upper.
#[derive(Debug, Clone, Copy)]
pub struct RsiBollingerStrategy {
    pub rsi: Rsi,
    pub bands: BollingerBands,
    pub oversold: f64,
    pub overbought: f64,
    pub view: PriceView,
}

impl Default for RsiBollingerStrategy {
    fn default() -> Self {
        Self {
            rsi: Rsi::default(),
            bands: BollingerBands::default(),
            oversold: 30.0,
            overbought: 70.0,
            view: PriceView::Mid,
        }
    }
}

impl Strategy for RsiBollingerStrategy {
    fn name(&self) -> &'static str {
        "rsi_bollinger"
    }

    fn evaluate(&self, chain: &BarChain) -> Result<Signals> {
        let bid_close = chain.closes();
        let close = chain.view_closes(self.view)?;
        let rsi = self.rsi.compute(&bid_close)?;
        let bands = self.bands.compute(&bid_close)?;

        let mut signals = Signals::with_len(chain.len());
        for i in 0..chain.len() {
            signals.buy[i] = rsi[i] < self.oversold && close[i] < bands.lower[i];
            signals.sell[i] = rsi[i] > self.overbought && close[i] > bands.upper[i];
        }
        Ok(finish(self.name(), chain, signals))
    }
}

// ============================================================
// ICHIMOKU + ADX
// ============================================================

/// Trend following: price outside the cloud while ADX confirms a trend.
#[derive(Debug, Clone, Copy)]
pub struct IchimokuAdxStrategy {
    pub ichimoku: Ichimoku,
    pub adx: Adx,
    pub adx_threshold: f64,
    pub view: PriceView,
}

impl Default for IchimokuAdxStrategy {
    fn default() -> Self {
        Self {
            ichimoku: Ichimoku::default(),
            adx: Adx::default(),
            adx_threshold: 25.0,
            view: PriceView::Mid,
        }
    }
}

impl Strategy for IchimokuAdxStrategy {
    fn name(&self) -> &'static str {
        "ichimoku_adx"
    }

    fn evaluate(&self, chain: &BarChain) -> Result<Signals> {
        let (high, low, bid_close) = (chain.highs(), chain.lows(), chain.closes());
        let close = chain.view_closes(self.view)?;
        let cloud = self.ichimoku.compute(&high, &low, &bid_close)?;
        let adx = self.adx.compute(&high, &low, &bid_close)?;

        let mut signals = Signals::with_len(chain.len());
        for i in 0..chain.len() {
            let trending = adx[i] > self.adx_threshold;
            signals.buy[i] = trending && close[i] > cloud.senkou_span_a[i];
            signals.sell[i] = trending && close[i] < cloud.senkou_span_b[i];
        }
        Ok(finish(self.name(), chain, signals))
    }
}

// ============================================================
// STOCHASTIC + PARABOLIC SAR
// ============================================================

/// Momentum crossover in the extreme zones, confirmed by the SAR side.
#[derive(Debug, Clone, Copy)]
pub struct StochasticSarStrategy {
    pub stochastic: Stochastic,
    pub sar: ParabolicSar,
    pub oversold: f64,
    pub overbought: f64,
    pub view: PriceView,
}

impl Default for StochasticSarStrategy {
    fn default() -> Self {
        Self {
            stochastic: Stochastic::default(),
            sar: ParabolicSar::default(),
            oversold: 20.0,
            overbought: 80.0,
            view: PriceView::Mid,
        }
    }
}

impl Strategy for StochasticSarStrategy {
    fn name(&self) -> &'static str {
        "stochastic_sar"
    }

    fn evaluate(&self, chain: &BarChain) -> Result<Signals> {
        let (high, low, bid_close) = (chain.highs(), chain.lows(), chain.closes());
        let close = chain.view_closes(self.view)?;
        let stoch = self.stochastic.compute(&high, &low, &bid_close)?;
        let sar = self.sar.calculate(&high, &low);

        let mut signals = Signals::with_len(chain.len());
        for i in 0..chain.len() {
            let (k, d) = (stoch.k[i], stoch.d[i]);
            signals.buy[i] = k < self.oversold && k > d && sar[i] < close[i];
            signals.sell[i] = k > self.overbought && k < d && sar[i] > close[i];
        }
        Ok(finish(self.name(), chain, signals))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;
    use crate::{Ohlc, PatternError, PriceRow};

    fn chain_from_closes(closes: &[f64], with_mid: bool) -> BarChain {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        BarChain::from_rows(closes.iter().enumerate().map(|(i, &c)| {
            let ohlc = Ohlc::new(c, c + 0.5, c - 0.5, c);
            let row = PriceRow::new(ohlc, 100.0, start + Duration::minutes(i as i64));
            if with_mid {
                row.with_mid(ohlc)
            } else {
                row
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_signals_align_with_chain() {
        let closes: Vec<f64> = (0..120).map(|i| 100.0 + (i as f64 * 0.3).sin() * 5.0).collect();
        let chain = chain_from_closes(&closes, true);
        let strategies: Vec<Box<dyn Strategy>> = vec![
            Box::new(RsiBollingerStrategy::default()),
            Box::new(IchimokuAdxStrategy::default()),
            Box::new(StochasticSarStrategy::default()),
        ];
        for strategy in &strategies {
            let signals = strategy.evaluate(&chain).unwrap();
            assert_eq!(signals.len(), 120, "{}", strategy.name());
            assert_eq!(signals.sell.len(), 120);
            // warm-up rows never signal
            assert!(!signals.buy[0] && !signals.sell[0]);
        }
    }

    #[test]
    fn test_missing_view() {
        let chain = chain_from_closes(&[100.0; 30], false);
        let err = RsiBollingerStrategy::default().evaluate(&chain).unwrap_err();
        assert_eq!(
            err,
            PatternError::MissingPriceView {
                index: 0,
                view: PriceView::Mid
            }
        );

        let bid = RsiBollingerStrategy {
            view: PriceView::Bid,
            ..Default::default()
        };
        assert!(bid.evaluate(&chain).is_ok());
    }

    #[test]
    fn test_short_chain_is_insufficient() {
        let chain = chain_from_closes(&[100.0; 10], true);
        assert!(matches!(
            IchimokuAdxStrategy::default().evaluate(&chain),
            Err(PatternError::InsufficientData { need: 78, got: 10 })
        ));
    }
}
