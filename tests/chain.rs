//! Bar geometry and chain properties.

use chrono::{Duration, TimeZone, Utc};
use ohlc_patterns::{
    detectors::{DojiDetector, EngulfingDetector, HaramiDetector, MarubozuDetector, TweezerDetector},
    BarChain, BuiltinDetector, Detection, Ohlc, PatternDetector, PatternError, PriceRow, PriceView,
    RawRow, Tolerance, Variant,
};
use proptest::prelude::*;

prop_compose! {
    /// A well-formed bar: high above and low below the body.
    fn arb_ohlc()(
        open in 1.0f64..1000.0,
        close in 1.0f64..1000.0,
        upper in 0.0f64..10.0,
        lower in 0.0f64..10.0,
    ) -> Ohlc {
        Ohlc::new(open, open.max(close) + upper, open.min(close) - lower, close)
    }
}

prop_compose! {
    /// Bars whose wicks and body are often clipped to (almost) nothing.
    fn arb_clipped_ohlc()(
        open in 1.0f64..1000.0,
        body in prop_oneof![Just(0.0), 0.0f64..0.0005, -10.0f64..10.0],
        upper in prop_oneof![Just(0.0), 0.0f64..0.0005, 0.0f64..10.0],
        lower in prop_oneof![Just(0.0), 0.0f64..0.0005, 0.0f64..10.0],
    ) -> Ohlc {
        let close = open + body;
        Ohlc::new(open, open.max(close) + upper, open.min(close) - lower, close)
    }
}

/// Any finite quadruple, well-formed or not.
fn arb_any_ohlc() -> impl Strategy<Value = Ohlc> {
    (-1e6f64..1e6, -1e6f64..1e6, -1e6f64..1e6, -1e6f64..1e6)
        .prop_map(|(o, h, l, c)| Ohlc::new(o, h, l, c))
}

fn to_rows(quads: Vec<Ohlc>) -> Vec<PriceRow> {
    let start = Utc.with_ymd_and_hms(2023, 6, 1, 0, 0, 0).unwrap();
    quads
        .into_iter()
        .enumerate()
        .map(|(i, ohlc)| PriceRow::new(ohlc, 1.0, start + Duration::minutes(5 * i as i64)))
        .collect()
}

proptest! {
    #[test]
    fn body_never_exceeds_range(ohlc in arb_ohlc()) {
        let chain = BarChain::from_rows(to_rows(vec![ohlc])).unwrap();
        let bar = chain.at(0).unwrap();
        prop_assert!(bar.body_size() <= bar.total_range() + 1e-9);
        prop_assert!(bar.upper_wick() >= -1e-9);
        prop_assert!(bar.lower_wick() >= -1e-9);
    }

    #[test]
    fn ratio_is_always_finite(ohlc in arb_any_ohlc()) {
        let chain = BarChain::from_rows(to_rows(vec![ohlc])).unwrap();
        let bar = chain.at(0).unwrap();
        prop_assert!(bar.body_to_range_ratio().is_finite());
        if bar.total_range() == 0.0 {
            prop_assert_eq!(bar.body_to_range_ratio(), 0.0);
        }
    }

    #[test]
    fn chain_preserves_order_and_ancestry(quads in proptest::collection::vec(arb_ohlc(), 0..40)) {
        let rows = to_rows(quads);
        let chain = BarChain::from_rows(rows.clone()).unwrap();
        prop_assert_eq!(chain.len(), rows.len());

        for (bar, row) in chain.iter().zip(&rows) {
            prop_assert_eq!(bar.timestamp(), row.timestamp);
            prop_assert_eq!(bar.ancestors().count(), bar.index());
            prop_assert_eq!(bar.history(), bar.index());
            if let Some(prev) = bar.previous() {
                prop_assert_eq!(prev.index() + 1, bar.index());
                prop_assert!(prev.timestamp() < bar.timestamp());
            }
        }
    }

    #[test]
    fn marubozu_variant_follows_the_body(ohlc in arb_clipped_ohlc()) {
        let chain = BarChain::from_rows(to_rows(vec![ohlc])).unwrap();
        let bar = chain.at(0).unwrap();
        let tol = Tolerance::default().get();
        prop_assume!(bar.total_range() > 2.0 * tol);

        match MarubozuDetector::default().detect(bar) {
            Detection::Matched(Variant::Bullish) => prop_assert!(bar.is_bullish()),
            Detection::Matched(Variant::Bearish) => prop_assert!(bar.is_bearish()),
            Detection::NoMatch => {}
            other => prop_assert!(false, "unexpected {:?}", other),
        }
    }

    #[test]
    fn doji_body_within_tolerance(ohlc in arb_clipped_ohlc()) {
        let chain = BarChain::from_rows(to_rows(vec![ohlc])).unwrap();
        let bar = chain.at(0).unwrap();
        let tol = Tolerance::default().get();

        if let Detection::Matched(variant) = DojiDetector::default().detect(bar) {
            prop_assert!(bar.body_size() <= tol);
            prop_assert_eq!(variant == Variant::FourPrice, bar.total_range() <= tol);
        }
    }

    #[test]
    fn two_bar_patterns_are_antisymmetric(first in arb_ohlc(), second in arb_ohlc()) {
        let chain = BarChain::from_rows(to_rows(vec![first, second])).unwrap();
        let bar = chain.at(1).unwrap();
        let pairs: [(BuiltinDetector, BuiltinDetector); 3] = [
            (EngulfingDetector::bullish().into(), EngulfingDetector::bearish().into()),
            (HaramiDetector::bullish().into(), HaramiDetector::bearish().into()),
            (TweezerDetector::bottom().into(), TweezerDetector::top().into()),
        ];
        for (bullish, bearish) in pairs {
            prop_assert!(
                !(bullish.detect(bar).is_match() && bearish.detect(bar).is_match()),
                "{} and {} both matched",
                bullish.id(),
                bearish.id()
            );
        }
    }

    #[test]
    fn window_matches_ancestors(quads in proptest::collection::vec(arb_ohlc(), 1..12)) {
        let chain = BarChain::from_rows(to_rows(quads)).unwrap();
        for bar in chain.iter() {
            match bar.window::<3>() {
                Some([a, b, c]) => {
                    prop_assert!(bar.index() >= 2);
                    prop_assert_eq!(a.index() + 2, bar.index());
                    prop_assert_eq!(b.index() + 1, bar.index());
                    prop_assert_eq!(c.index(), bar.index());
                }
                None => prop_assert!(bar.index() < 2),
            }
        }
    }
}

#[test]
fn raw_rows_report_the_failing_row() {
    let ts = Utc.with_ymd_and_hms(2023, 6, 1, 0, 0, 0).unwrap();
    let complete = RawRow {
        bid_open: Some(1.0),
        bid_high: Some(2.0),
        bid_low: Some(0.5),
        bid_close: Some(1.5),
        volume: Some(10.0),
        timestamp: Some(ts),
        ..Default::default()
    };
    let missing_close = RawRow {
        bid_close: None,
        ..complete.clone()
    };
    let partial_ask = RawRow {
        ask_open: Some(1.0),
        ..complete.clone()
    };

    let err = BarChain::from_raw_rows([complete.clone(), missing_close]).unwrap_err();
    assert_eq!(
        err,
        PatternError::MalformedRow {
            index: 1,
            field: "bid_close",
            reason: "missing field"
        }
    );

    let err = BarChain::from_raw_rows([complete.clone(), complete.clone(), partial_ask]).unwrap_err();
    assert!(matches!(
        err,
        PatternError::MalformedRow {
            index: 2,
            field: "ask_high",
            ..
        }
    ));

    assert_eq!(BarChain::from_raw_rows([complete]).unwrap().len(), 1);
}

#[test]
fn view_closes_require_the_view() {
    let ts = Utc.with_ymd_and_hms(2023, 6, 1, 0, 0, 0).unwrap();
    let bid = Ohlc::new(1.0, 2.0, 0.5, 1.5);
    let mid = Ohlc::new(1.1, 2.1, 0.6, 1.6);
    let mut chain = BarChain::new();
    chain.append(PriceRow::new(bid, 1.0, ts).with_mid(mid)).unwrap();

    assert_eq!(chain.view_closes(PriceView::Mid).unwrap(), vec![1.6]);
    assert_eq!(chain.view_closes(PriceView::Bid).unwrap(), chain.closes());
    assert_eq!(
        chain.view_closes(PriceView::Ask).unwrap_err(),
        PatternError::MissingPriceView {
            index: 0,
            view: PriceView::Ask
        }
    );
}
