//! Engine configuration and row records read from JSON.

use ohlc_patterns::prelude::*;

#[test]
fn engine_config_from_json() {
    let config: EngineConfig =
        serde_json::from_str(r#"{ "patterns": ["doji", "bullish_engulfing"], "tolerance": 0.0005 }"#).unwrap();
    assert_eq!(config.tolerance, Some(Tolerance::new(0.0005).unwrap()));

    let engine = EngineBuilder::from_config(&config).unwrap().build().unwrap();
    let ids: Vec<_> = engine.pattern_ids().iter().map(|id| id.as_str()).collect();
    assert_eq!(ids, ["doji", "bullish_engulfing"]);
}

#[test]
fn empty_config_means_every_pattern() {
    let config: EngineConfig = serde_json::from_str("{}").unwrap();
    assert_eq!(config, EngineConfig::default());
    let engine = EngineBuilder::from_config(&config).unwrap().build().unwrap();
    assert_eq!(engine.detector_count(), 32);
}

#[test]
fn invalid_configs_are_rejected() {
    assert!(serde_json::from_str::<EngineConfig>(r#"{ "tolerance": -0.1 }"#).is_err());
    assert!(serde_json::from_str::<EngineConfig>(r#"{ "min_strength": 0.5 }"#).is_err());

    let unknown: EngineConfig = serde_json::from_str(r#"{ "patterns": ["cup_and_handle"] }"#).unwrap();
    assert!(matches!(
        EngineBuilder::from_config(&unknown),
        Err(PatternError::InvalidConfig(msg)) if msg.contains("cup_and_handle")
    ));
}

#[test]
fn config_tolerance_reaches_detectors() {
    let rows: Vec<RawRow> = serde_json::from_str(
        r#"[
            { "open": 10.0, "high": 11.0, "low": 9.0, "close": 10.004, "volume": 5, "time": "2024-01-02T09:00:00Z" }
        ]"#,
    )
    .unwrap();
    let chain = BarChain::from_raw_rows(rows).unwrap();

    let strict = EngineBuilder::from_config(&serde_json::from_str(r#"{ "patterns": ["doji"] }"#).unwrap())
        .unwrap()
        .build()
        .unwrap();
    assert_eq!(strict.scan(&chain).get(0, "doji"), Some(Detection::NoMatch));

    let loose = EngineBuilder::from_config(
        &serde_json::from_str(r#"{ "patterns": ["doji"], "tolerance": 0.01 }"#).unwrap(),
    )
    .unwrap()
    .build()
    .unwrap();
    assert_eq!(
        loose.scan(&chain).get(0, "doji"),
        Some(Detection::Matched(Variant::LongLegged))
    );
}

#[test]
fn raw_rows_with_all_views() {
    let json = r#"{
        "bid_open": 1.1000, "bid_high": 1.1010, "bid_low": 1.0990, "bid_close": 1.1005,
        "ask_open": 1.1002, "ask_high": 1.1012, "ask_low": 1.0992, "ask_close": 1.1007,
        "mid_open": 1.1001, "mid_high": 1.1011, "mid_low": 1.0991, "mid_close": 1.1006,
        "volume": 120.0,
        "timestamp": "2024-01-02T09:00:00Z"
    }"#;
    let raw: RawRow = serde_json::from_str(json).unwrap();
    let row = PriceRow::try_from(raw).unwrap();
    assert_eq!(row.view(PriceView::Ask).map(|o| o.close), Some(1.1007));
    assert_eq!(row.view(PriceView::Mid).map(|o| o.open), Some(1.1001));
}

#[test]
fn series_serializes_by_pattern_name() {
    let rows: Vec<RawRow> = serde_json::from_str(
        r#"[
            { "open": 10.0, "high": 11.0, "low": 9.0, "close": 9.2, "volume": 1, "time": "2024-01-02T09:00:00Z" },
            { "open": 9.0, "high": 11.5, "low": 8.8, "close": 10.5, "volume": 1, "time": "2024-01-02T10:00:00Z" }
        ]"#,
    )
    .unwrap();
    let chain = BarChain::from_raw_rows(rows).unwrap();
    let engine = EngineBuilder::new()
        .only_patterns([PatternId("bullish_engulfing")])
        .with_two_bar_defaults()
        .build()
        .unwrap();

    let value = serde_json::to_value(engine.scan(&chain)).unwrap();
    assert_eq!(value["ids"], serde_json::json!(["bullish_engulfing"]));
    assert_eq!(
        value["rows"][0][0],
        serde_json::json!({ "insufficient_history": { "required": 1, "available": 0 } })
    );
    assert_eq!(value["rows"][1][0], serde_json::json!({ "matched": "bullish" }));
}
