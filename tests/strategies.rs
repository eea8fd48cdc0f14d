//! Strategy signals on constructed price paths.

use chrono::{Duration, TimeZone, Utc};
use ohlc_patterns::strategy::{IchimokuAdxStrategy, RsiBollingerStrategy, StochasticSarStrategy, Strategy};
use ohlc_patterns::{BarChain, Ohlc, PriceRow};

/// Bars with the given closes, a one-point range and a mid view equal to bid.
fn chain_from_closes(closes: &[f64]) -> BarChain {
    let start = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
    BarChain::from_rows(closes.iter().enumerate().map(|(i, &c)| {
        let ohlc = Ohlc::new(c, c + 0.5, c - 0.5, c);
        PriceRow::new(ohlc, 500.0, start + Duration::hours(i as i64)).with_mid(ohlc)
    }))
    .unwrap()
}

/// Thirty bars chopping around 100, then a sharp five-bar move of `step`.
fn chop_then_move(step: f64) -> Vec<f64> {
    let mut closes: Vec<f64> = (0..30).map(|i| if i % 2 == 0 { 100.0 } else { 100.1 }).collect();
    let mut last = 100.0;
    for _ in 0..5 {
        last += step;
        closes.push(last);
    }
    closes
}

#[test]
fn rsi_bollinger_buys_a_capitulation() {
    let chain = chain_from_closes(&chop_then_move(-3.0));
    let signals = RsiBollingerStrategy::default().evaluate(&chain).unwrap();

    assert_eq!(signals.len(), 35);
    assert!(signals.buy[..30].iter().all(|b| !b));
    assert!(signals.buy[34]);
    assert_eq!(signals.sell_count(), 0);
}

#[test]
fn rsi_bollinger_sells_a_blow_off() {
    let chain = chain_from_closes(&chop_then_move(3.0));
    let signals = RsiBollingerStrategy::default().evaluate(&chain).unwrap();

    assert!(signals.sell[34]);
    assert_eq!(signals.buy_count(), 0);
}

#[test]
fn ichimoku_adx_follows_a_steady_trend() {
    let closes: Vec<f64> = (0..120).map(|i| 100.0 + i as f64).collect();
    let signals = IchimokuAdxStrategy::default().evaluate(&chain_from_closes(&closes)).unwrap();

    // span A first exists once the 26-bar kijun is shifted forward 26 bars
    assert!(!signals.buy[50]);
    assert!(signals.buy[51]);
    assert_eq!(signals.buy_count(), 69);
    assert_eq!(signals.sell_count(), 0);
}

#[test]
fn stochastic_sar_stays_quiet_in_a_steady_trend() {
    let closes: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
    let signals = StochasticSarStrategy::default().evaluate(&chain_from_closes(&closes)).unwrap();
    assert_eq!(signals.len(), 60);
    assert_eq!(signals.buy_count() + signals.sell_count(), 0);
}

#[test]
fn strategies_are_object_safe() {
    let chain = chain_from_closes(&(0..100).map(|i| 100.0 + (i as f64 / 7.0).cos()).collect::<Vec<_>>());
    let all: Vec<Box<dyn Strategy>> = vec![
        Box::new(RsiBollingerStrategy::default()),
        Box::new(IchimokuAdxStrategy::default()),
        Box::new(StochasticSarStrategy::default()),
    ];
    let names: Vec<_> = all.iter().map(|s| s.name()).collect();
    assert_eq!(names, ["rsi_bollinger", "ichimoku_adx", "stochastic_sar"]);
    for strategy in &all {
        let signals = strategy.evaluate(&chain).unwrap();
        assert_eq!(signals.buy.len(), chain.len());
        assert_eq!(signals.sell.len(), chain.len());
    }
}
