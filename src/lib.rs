//! # ohlc-patterns
//!
//! Candlestick pattern detection over bid/ask/mid OHLC price series, with
//! the indicator adapters and signal strategies that consume the patterns.
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::{Duration, TimeZone, Utc};
//! use ohlc_patterns::prelude::*;
//!
//! let start = Utc.with_ymd_and_hms(2024, 1, 2, 9, 0, 0).unwrap();
//! let chain = BarChain::from_rows([
//!     PriceRow::new(Ohlc::new(10.0, 11.0, 9.0, 9.2), 1_000.0, start),
//!     PriceRow::new(Ohlc::new(9.0, 11.5, 8.8, 10.5), 1_400.0, start + Duration::hours(1)),
//! ])?;
//!
//! let engine = EngineBuilder::new().with_all_defaults().build()?;
//! let series = engine.scan(&chain);
//!
//! assert!(series.get(1, "bullish_engulfing").is_some_and(|d| d.is_match()));
//! assert!(series.get(0, "bullish_engulfing").is_some_and(|d| d.is_insufficient()));
//! # Ok::<(), ohlc_patterns::PatternError>(())
//! ```

pub mod bar;
pub mod chain;
pub mod detectors;
pub mod indicators;
pub mod params;
pub mod strategy;

pub use bar::{Bar, Ohlc, PriceRow, PriceView, RawRow};
pub use chain::{BarChain, BarRef};

pub mod prelude {
    pub use crate::{
        // Rows and chain
        bar::{Bar, Ohlc, PriceRow, PriceView, RawRow},
        chain::{BarChain, BarRef},
        // Detectors
        detectors::*,
        // Parameters
        params::{ParamMeta, ParamType, ParameterizedDetector},
        // Strategies
        strategy::{Signals, Strategy},
        // Catalogue
        all_defaults,
        four_bar_defaults,
        single_bar_defaults,
        three_bar_defaults,
        two_bar_defaults,
        // Parallel
        scan_parallel,
        // Iterator
        BarPatterns,
        Bias,
        // Engine
        BuiltinDetector,
        Detection,
        Direction,
        EngineBuilder,
        EngineConfig,
        PatternDetector,
        PatternEngine,
        // Errors
        PatternError,
        PatternId,
        PatternIterator,
        PatternSeries,
        Period,
        Ratio,
        Result,
        ScanError,
        ScanResult,
        Tolerance,
        Variant,
    };
}

use std::fmt;

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

// ============================================================
// ERRORS
// ============================================================

pub type Result<T> = std::result::Result<T, PatternError>;

/// Errors raised while ingesting rows, configuring detectors or computing
/// indicators. Missing history during detection is not an error; see
/// [`Detection::InsufficientHistory`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PatternError {
    #[error("Malformed row {index}: {field}: {reason}")]
    MalformedRow {
        index: usize,
        field: &'static str,
        reason: &'static str,
    },

    #[error("Index {index} out of range for chain of {len} bars")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Invalid value: {0}")]
    InvalidValue(&'static str),

    #[error("{field} = {value} out of range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Insufficient data: need {need} bars, got {got}")]
    InsufficientData { need: usize, got: usize },

    #[error("Bar {index} has no {view} prices")]
    MissingPriceView { index: usize, view: PriceView },
}

impl PatternError {
    /// Re-point a row error at its position in the input.
    pub(crate) fn at_index(self, index: usize) -> Self {
        match self {
            PatternError::MalformedRow { field, reason, .. } => PatternError::MalformedRow {
                index,
                field,
                reason,
            },
            other => other,
        }
    }
}

// ============================================================
// VALIDATED TYPES
// ============================================================

/// Normalized value in range 0.0..=1.0
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Ratio(f64);

impl Ratio {
    /// Create a new Ratio, validating the value is in [0.0, 1.0]
    pub fn new(value: f64) -> Result<Self> {
        if !value.is_finite() {
            return Err(PatternError::InvalidValue("Ratio cannot be NaN or infinite"));
        }
        if !(0.0..=1.0).contains(&value) {
            return Err(PatternError::OutOfRange {
                field: "Ratio",
                value,
                min: 0.0,
                max: 1.0,
            });
        }
        Ok(Self(value))
    }

    /// Create a Ratio from a compile-time constant (library internal use)
    #[doc(hidden)]
    pub const fn new_const(value: f64) -> Self {
        Self(value)
    }

    #[inline]
    pub fn get(self) -> f64 {
        self.0
    }
}

impl Serialize for Ratio {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

impl<'de> Deserialize<'de> for Ratio {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = f64::deserialize(d)?;
        Ratio::new(value).map_err(serde::de::Error::custom)
    }
}

/// Absolute price distance under which two prices count as equal
/// (finite, >= 0).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Tolerance(f64);

impl Tolerance {
    pub const DEFAULT: Tolerance = Tolerance(detectors::helpers::DEFAULT_TOLERANCE);

    pub fn new(value: f64) -> Result<Self> {
        if !value.is_finite() {
            return Err(PatternError::InvalidValue("Tolerance cannot be NaN or infinite"));
        }
        if value < 0.0 {
            return Err(PatternError::OutOfRange {
                field: "Tolerance",
                value,
                min: 0.0,
                max: f64::MAX,
            });
        }
        Ok(Self(value))
    }

    #[doc(hidden)]
    pub const fn new_const(value: f64) -> Self {
        Self(value)
    }

    #[inline]
    pub fn get(self) -> f64 {
        self.0
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl Serialize for Tolerance {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

impl<'de> Deserialize<'de> for Tolerance {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = f64::deserialize(d)?;
        Tolerance::new(value).map_err(serde::de::Error::custom)
    }
}

/// Period (must be > 0)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Period(usize);

impl Period {
    /// Create a new Period, validating value is > 0
    pub fn new(value: usize) -> Result<Self> {
        if value == 0 {
            return Err(PatternError::InvalidValue("Period must be > 0"));
        }
        Ok(Self(value))
    }

    #[doc(hidden)]
    pub const fn new_const(value: usize) -> Self {
        Self(value)
    }

    #[inline]
    pub fn get(self) -> usize {
        self.0
    }
}

impl Serialize for Period {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

impl<'de> Deserialize<'de> for Period {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = usize::deserialize(d)?;
        Period::new(value).map_err(serde::de::Error::custom)
    }
}

// ============================================================
// DIRECTION / BIAS
// ============================================================

/// Colour of a single bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Bullish,
    Bearish,
}

impl Direction {
    /// `close > open` is bullish; everything else, a flat bar included, is bearish.
    #[inline]
    pub fn of(open: f64, close: f64) -> Self {
        if close > open {
            Direction::Bullish
        } else {
            Direction::Bearish
        }
    }

    #[inline]
    pub fn opposite(self) -> Self {
        match self {
            Direction::Bullish => Direction::Bearish,
            Direction::Bearish => Direction::Bullish,
        }
    }

    #[inline]
    pub fn is_bullish(self) -> bool {
        matches!(self, Direction::Bullish)
    }

    #[inline]
    pub fn is_bearish(self) -> bool {
        matches!(self, Direction::Bearish)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Direction::Bullish => "bullish",
            Direction::Bearish => "bearish",
        })
    }
}

/// What a pattern usually signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bias {
    Bullish,
    Bearish,
    Neutral,
}

// ============================================================
// PATTERN ID / DETECTION OUTCOME
// ============================================================

/// Unique identifier for a pattern type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PatternId(pub &'static str);

impl PatternId {
    /// Returns the string identifier
    #[inline]
    pub fn as_str(&self) -> &'static str {
        self.0
    }

    /// Returns the typical bias of this pattern.
    ///
    /// `None` means the pattern matches in either direction and the
    /// [`Variant`] of the match carries it (marubozu).
    pub fn typical_bias(&self) -> Option<Bias> {
        match self.0 {
            "hammer"
            | "inverted_hammer"
            | "bullish_engulfing"
            | "tweezer_bottom"
            | "bullish_harami"
            | "piercing_pattern"
            | "bullish_kicker"
            | "morning_star"
            | "three_white_soldiers"
            | "three_inside_up"
            | "three_outside_up"
            | "bullish_abandoned_baby"
            | "bullish_three_line_strike" => Some(Bias::Bullish),
            "hanging_man"
            | "shooting_star"
            | "bearish_engulfing"
            | "tweezer_top"
            | "bearish_harami"
            | "dark_cloud_cover"
            | "bearish_kicker"
            | "evening_star"
            | "three_black_crows"
            | "three_inside_down"
            | "three_outside_down"
            | "bearish_abandoned_baby"
            | "bearish_three_line_strike" => Some(Bias::Bearish),
            "marubozu" => None,
            _ => Some(Bias::Neutral),
        }
    }
}

impl fmt::Display for PatternId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl Serialize for PatternId {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.serialize_str(self.0)
    }
}

/// Which flavour of a pattern matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    /// The pattern has a single form.
    Plain,
    Bullish,
    Bearish,
    FourPrice,
    Dragonfly,
    Gravestone,
    LongLegged,
}

impl Variant {
    pub fn as_str(self) -> &'static str {
        match self {
            Variant::Plain => "plain",
            Variant::Bullish => "bullish",
            Variant::Bearish => "bearish",
            Variant::FourPrice => "four_price",
            Variant::Dragonfly => "dragonfly",
            Variant::Gravestone => "gravestone",
            Variant::LongLegged => "long_legged",
        }
    }
}

impl From<Direction> for Variant {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Bullish => Variant::Bullish,
            Direction::Bearish => Variant::Bearish,
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of evaluating one pattern at one bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Detection {
    Matched(Variant),
    NoMatch,
    /// The bar has fewer ancestors than the pattern looks back over.
    InsufficientHistory { required: usize, available: usize },
}

impl Detection {
    #[inline]
    pub fn from_flag(hit: bool) -> Self {
        if hit {
            Detection::Matched(Variant::Plain)
        } else {
            Detection::NoMatch
        }
    }

    /// A match tagged with the signal direction, or no match.
    #[inline]
    pub fn directional(hit: bool, side: Direction) -> Self {
        if hit {
            Detection::Matched(side.into())
        } else {
            Detection::NoMatch
        }
    }

    #[inline]
    pub fn insufficient(required: usize, available: usize) -> Self {
        Detection::InsufficientHistory {
            required,
            available,
        }
    }

    #[inline]
    pub fn is_match(&self) -> bool {
        matches!(self, Detection::Matched(_))
    }

    #[inline]
    pub fn is_insufficient(&self) -> bool {
        matches!(self, Detection::InsufficientHistory { .. })
    }

    #[inline]
    pub fn variant(&self) -> Option<Variant> {
        match self {
            Detection::Matched(v) => Some(*v),
            _ => None,
        }
    }
}

// ============================================================
// PATTERN DETECTOR TRAIT
// ============================================================

/// Category of pattern by number of bars
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternCategory {
    SingleBar,
    TwoBar,
    ThreeBar,
    FourBar,
    MultiBar,
}

/// Additional metadata about a pattern
#[derive(Debug, Clone)]
pub struct PatternMetadata {
    pub name: &'static str,
    pub description: &'static str,
    pub category: PatternCategory,
    pub bias: Option<Bias>,
}

/// A named predicate over a bar and its ancestors.
///
/// Object safe, so custom detectors can be boxed next to the builtin ones.
pub trait PatternDetector: Send + Sync {
    fn id(&self) -> PatternId;

    /// Number of ancestors the pattern inspects.
    fn lookback(&self) -> usize;

    /// Evaluate at `bar`. Returns [`Detection::InsufficientHistory`] when
    /// `bar` has fewer than [`lookback`](Self::lookback) ancestors.
    fn detect(&self, bar: BarRef<'_>) -> Detection;

    fn validate_config(&self) -> Result<()> {
        Ok(())
    }

    fn description(&self) -> &'static str {
        ""
    }

    fn metadata(&self) -> PatternMetadata {
        let id = self.id();
        PatternMetadata {
            name: id.0,
            description: self.description(),
            category: match self.lookback() {
                0 => PatternCategory::SingleBar,
                1 => PatternCategory::TwoBar,
                2 => PatternCategory::ThreeBar,
                3 => PatternCategory::FourBar,
                _ => PatternCategory::MultiBar,
            },
            bias: id.typical_bias(),
        }
    }
}

// ============================================================
// BUILTIN DETECTORS - generated via macro
// ============================================================

use detectors::*;

/// Macro to generate BuiltinDetector enum without boilerplate
macro_rules! define_builtin_detectors {
    (
        $(
            $variant:ident($detector:ty)
        ),* $(,)?
    ) => {
        /// All builtin detectors - fast path via enum dispatch
        #[derive(Debug, Clone)]
        pub enum BuiltinDetector {
            $($variant($detector)),*
        }

        impl BuiltinDetector {
            #[inline]
            pub fn detect(&self, bar: BarRef<'_>) -> Detection {
                match self {
                    $(Self::$variant(d) => PatternDetector::detect(d, bar)),*
                }
            }

            #[inline]
            pub fn id(&self) -> PatternId {
                match self {
                    $(Self::$variant(d) => PatternDetector::id(d)),*
                }
            }

            #[inline]
            pub fn lookback(&self) -> usize {
                match self {
                    $(Self::$variant(d) => PatternDetector::lookback(d)),*
                }
            }

            pub fn validate_config(&self) -> Result<()> {
                match self {
                    $(Self::$variant(d) => PatternDetector::validate_config(d)),*
                }
            }

            pub fn metadata(&self) -> PatternMetadata {
                match self {
                    $(Self::$variant(d) => PatternDetector::metadata(d)),*
                }
            }
        }

        $(impl From<$detector> for BuiltinDetector {
            fn from(d: $detector) -> Self {
                Self::$variant(d)
            }
        })*
    };
}

define_builtin_detectors! {
    // Single bar
    SpinningTop(SpinningTopDetector),
    Marubozu(MarubozuDetector),
    Doji(DojiDetector),
    Hammer(HammerDetector),
    HangingMan(HangingManDetector),
    ShootingStar(ShootingStarDetector),
    InvertedHammer(InvertedHammerDetector),

    // Two bar
    Engulfing(EngulfingDetector),
    Tweezer(TweezerDetector),
    Harami(HaramiDetector),
    Piercing(PiercingDetector),
    DarkCloudCover(DarkCloudCoverDetector),
    Matching(MatchingDetector),
    Kicker(KickerDetector),
    InsideBar(InsideBarDetector),

    // Three bar
    Star(StarDetector),
    ThreeSoldiers(ThreeSoldiersDetector),
    ThreeInside(ThreeInsideDetector),
    ThreeOutside(ThreeOutsideDetector),
    AbandonedBaby(AbandonedBabyDetector),

    // Four bar
    ThreeLineStrike(ThreeLineStrikeDetector),
}

impl BuiltinDetector {
    /// Replace the equal-price tolerance of detectors that have one.
    pub fn with_tolerance(self, tolerance: Tolerance) -> Self {
        match self {
            Self::Marubozu(_) => Self::Marubozu(MarubozuDetector { tolerance }),
            Self::Doji(_) => Self::Doji(DojiDetector { tolerance }),
            Self::Tweezer(d) => Self::Tweezer(d.with_tolerance(tolerance)),
            Self::Matching(d) => Self::Matching(d.with_tolerance(tolerance)),
            other => other,
        }
    }
}

/// Single-bar catalogue with default thresholds (7).
pub fn single_bar_defaults() -> Vec<BuiltinDetector> {
    vec![
        SpinningTopDetector::default().into(),
        MarubozuDetector::default().into(),
        DojiDetector::default().into(),
        HammerDetector::default().into(),
        HangingManDetector::default().into(),
        ShootingStarDetector::default().into(),
        InvertedHammerDetector::default().into(),
    ]
}

/// Two-bar catalogue with default thresholds (13).
pub fn two_bar_defaults() -> Vec<BuiltinDetector> {
    vec![
        EngulfingDetector::bullish().into(),
        EngulfingDetector::bearish().into(),
        TweezerDetector::top().into(),
        TweezerDetector::bottom().into(),
        HaramiDetector::bullish().into(),
        HaramiDetector::bearish().into(),
        PiercingDetector.into(),
        DarkCloudCoverDetector.into(),
        MatchingDetector::high().into(),
        MatchingDetector::low().into(),
        KickerDetector::bullish().into(),
        KickerDetector::bearish().into(),
        InsideBarDetector.into(),
    ]
}

/// Three-bar catalogue with default thresholds (10).
pub fn three_bar_defaults() -> Vec<BuiltinDetector> {
    vec![
        StarDetector::morning().into(),
        StarDetector::evening().into(),
        ThreeSoldiersDetector::white_soldiers().into(),
        ThreeSoldiersDetector::black_crows().into(),
        ThreeInsideDetector::up().into(),
        ThreeInsideDetector::down().into(),
        ThreeOutsideDetector::up().into(),
        ThreeOutsideDetector::down().into(),
        AbandonedBabyDetector::bullish().into(),
        AbandonedBabyDetector::bearish().into(),
    ]
}

/// Four-bar catalogue (2).
pub fn four_bar_defaults() -> Vec<BuiltinDetector> {
    vec![
        ThreeLineStrikeDetector::bullish().into(),
        ThreeLineStrikeDetector::bearish().into(),
    ]
}

/// Every builtin pattern with default thresholds.
pub fn all_defaults() -> Vec<BuiltinDetector> {
    let mut all = single_bar_defaults();
    all.extend(two_bar_defaults());
    all.extend(three_bar_defaults());
    all.extend(four_bar_defaults());
    all
}

// ============================================================
// PATTERN ENGINE
// ============================================================

/// Serializable engine configuration.
///
/// ```json
/// { "patterns": ["doji", "bullish_engulfing"], "tolerance": 0.0005 }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Restrict the engine to these pattern names; all builtins when absent.
    pub patterns: Option<Vec<String>>,
    /// Equal-price tolerance for every detector that has one.
    pub tolerance: Option<Tolerance>,
}

/// Evaluates a fixed set of detectors over a [`BarChain`].
pub struct PatternEngine {
    builtin: Vec<BuiltinDetector>,
    custom: Vec<Box<dyn PatternDetector>>,
}

impl PatternEngine {
    /// Column order of every [`PatternSeries`] this engine produces.
    pub fn pattern_ids(&self) -> Vec<PatternId> {
        self.builtin
            .iter()
            .map(BuiltinDetector::id)
            .chain(self.custom.iter().map(|d| d.id()))
            .collect()
    }

    pub fn detector_count(&self) -> usize {
        self.builtin.len() + self.custom.len()
    }

    /// Evaluate every pattern at a single bar.
    pub fn scan_at(&self, chain: &BarChain, index: usize) -> Result<BarPatterns> {
        let bar = chain.at(index)?;
        let detections = self.pattern_ids().into_iter().zip(self.detect_all(bar)).collect();
        trace!(index, "scanned single bar");
        Ok(BarPatterns {
            index,
            timestamp: bar.timestamp(),
            detections,
        })
    }

    /// Evaluate every pattern at every bar.
    pub fn scan(&self, chain: &BarChain) -> PatternSeries {
        let rows: Vec<Vec<Detection>> = chain.iter().map(|bar| self.detect_all(bar)).collect();
        self.finish(rows)
    }

    /// [`scan`](Self::scan) with bars evaluated on the rayon pool.
    pub fn scan_par(&self, chain: &BarChain) -> PatternSeries {
        let rows: Vec<Vec<Detection>> = (0..chain.len())
            .into_par_iter()
            .filter_map(|index| chain.get(index))
            .map(|bar| self.detect_all(bar))
            .collect();
        self.finish(rows)
    }

    /// Create an iterator over bars with their patterns.
    pub fn iter<'a>(&'a self, chain: &'a BarChain) -> PatternIterator<'a> {
        PatternIterator {
            engine: self,
            chain,
            ids: self.pattern_ids(),
            current: 0,
        }
    }

    // ===========================================
    // Internal helpers
    // ===========================================

    fn detect_all(&self, bar: BarRef<'_>) -> Vec<Detection> {
        let mut row = Vec::with_capacity(self.detector_count());
        // Fast path: enum dispatch
        row.extend(
            self.builtin
                .iter()
                .map(|d| guarded(d.lookback(), bar, || d.detect(bar))),
        );
        // Slow path: vtable
        row.extend(
            self.custom
                .iter()
                .map(|d| guarded(d.lookback(), bar, || d.detect(bar))),
        );
        row
    }

    fn finish(&self, rows: Vec<Vec<Detection>>) -> PatternSeries {
        let series = PatternSeries {
            ids: self.pattern_ids(),
            rows,
        };
        debug!(
            bars = series.len(),
            detectors = series.ids.len(),
            matches = series.match_count(),
            "scan complete"
        );
        series
    }

    fn validate(&self) -> Result<()> {
        for d in &self.builtin {
            d.validate_config()?;
        }
        for d in &self.custom {
            d.validate_config()?;
        }
        Ok(())
    }
}

/// Short history is reported by the engine itself, whatever the detector
/// would have returned.
#[inline]
fn guarded(lookback: usize, bar: BarRef<'_>, detect: impl FnOnce() -> Detection) -> Detection {
    if bar.history() < lookback {
        Detection::insufficient(lookback, bar.history())
    } else {
        detect()
    }
}

impl fmt::Debug for PatternEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatternEngine")
            .field("patterns", &self.pattern_ids())
            .finish()
    }
}

// ============================================================
// PATTERN SERIES
// ============================================================

/// Scan output: one row per bar, one column per pattern, aligned with the
/// chain it was computed from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternSeries {
    ids: Vec<PatternId>,
    rows: Vec<Vec<Detection>>,
}

impl PatternSeries {
    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn pattern_ids(&self) -> &[PatternId] {
        &self.ids
    }

    fn column_index(&self, name: &str) -> Option<usize> {
        self.ids.iter().position(|id| id.0 == name)
    }

    /// Outcome of pattern `name` at bar `index`.
    pub fn get(&self, index: usize, name: &str) -> Option<Detection> {
        let col = self.column_index(name)?;
        self.rows.get(index).map(|row| row[col])
    }

    /// Every outcome at bar `index`, in [`pattern_ids`](Self::pattern_ids) order.
    pub fn row(&self, index: usize) -> Option<&[Detection]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    /// Outcomes of pattern `name` for every bar.
    pub fn column(&self, name: &str) -> Option<Vec<Detection>> {
        let col = self.column_index(name)?;
        Some(self.rows.iter().map(|row| row[col]).collect())
    }

    /// Patterns that matched at bar `index`.
    pub fn matches_at(&self, index: usize) -> Vec<(PatternId, Variant)> {
        self.rows
            .get(index)
            .map(|row| {
                self.ids
                    .iter()
                    .zip(row)
                    .filter_map(|(id, d)| d.variant().map(|v| (*id, v)))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Per bar, `name` for single-form matches and `name:variant` otherwise.
    pub fn labels(&self) -> Vec<Vec<String>> {
        (0..self.rows.len())
            .map(|index| {
                self.matches_at(index)
                    .into_iter()
                    .map(|(id, variant)| match variant {
                        Variant::Plain => id.0.to_string(),
                        v => format!("{}:{}", id.0, v),
                    })
                    .collect()
            })
            .collect()
    }

    pub fn match_count(&self) -> usize {
        self.rows
            .iter()
            .map(|row| row.iter().filter(|d| d.is_match()).count())
            .sum()
    }
}

// ============================================================
// PATTERN ITERATOR
// ============================================================

/// Patterns evaluated at a specific bar
#[derive(Debug, Clone)]
pub struct BarPatterns {
    pub index: usize,
    pub timestamp: DateTime<Utc>,
    pub detections: Vec<(PatternId, Detection)>,
}

impl BarPatterns {
    pub fn matches(&self) -> impl Iterator<Item = (PatternId, Variant)> + '_ {
        self.detections
            .iter()
            .filter_map(|(id, d)| d.variant().map(|v| (*id, v)))
    }
}

/// Iterator over bars with their patterns
pub struct PatternIterator<'a> {
    engine: &'a PatternEngine,
    chain: &'a BarChain,
    ids: Vec<PatternId>,
    current: usize,
}

impl Iterator for PatternIterator<'_> {
    type Item = BarPatterns;

    fn next(&mut self) -> Option<Self::Item> {
        let bar = self.chain.get(self.current)?;
        self.current += 1;

        let detections = self
            .ids
            .iter()
            .copied()
            .zip(self.engine.detect_all(bar))
            .collect();
        Some(BarPatterns {
            index: bar.index(),
            timestamp: bar.timestamp(),
            detections,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.chain.len().saturating_sub(self.current);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for PatternIterator<'_> {}

// ============================================================
// BUILDER
// ============================================================

/// Builder for creating PatternEngine instances
#[derive(Default)]
pub struct EngineBuilder {
    builtin: Vec<BuiltinDetector>,
    custom: Vec<Box<dyn PatternDetector>>,
    pattern_filter: Option<Vec<PatternId>>,
    tolerance: Option<Tolerance>,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder preloaded from a deserialized [`EngineConfig`].
    ///
    /// Unknown pattern names are rejected.
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        let mut builder = Self::new().with_all_defaults();
        if let Some(names) = &config.patterns {
            let known = builder.builtin.iter().map(BuiltinDetector::id).collect::<Vec<_>>();
            let ids = names
                .iter()
                .map(|name| {
                    known
                        .iter()
                        .copied()
                        .find(|id| id.0 == name)
                        .ok_or_else(|| PatternError::InvalidConfig(format!("unknown pattern `{name}`")))
                })
                .collect::<Result<Vec<_>>>()?;
            builder = builder.only_patterns(ids);
        }
        if let Some(tolerance) = config.tolerance {
            builder = builder.tolerance(tolerance);
        }
        Ok(builder)
    }

    /// Add all builtin patterns with default configurations
    pub fn with_all_defaults(self) -> Self {
        self.with_single_bar_defaults()
            .with_two_bar_defaults()
            .with_three_bar_defaults()
            .with_four_bar_defaults()
    }

    pub fn with_single_bar_defaults(mut self) -> Self {
        self.builtin.extend(single_bar_defaults());
        self
    }

    pub fn with_two_bar_defaults(mut self) -> Self {
        self.builtin.extend(two_bar_defaults());
        self
    }

    pub fn with_three_bar_defaults(mut self) -> Self {
        self.builtin.extend(three_bar_defaults());
        self
    }

    pub fn with_four_bar_defaults(mut self) -> Self {
        self.builtin.extend(four_bar_defaults());
        self
    }

    /// Add a builtin detector
    #[allow(clippy::should_implement_trait)]
    pub fn add(mut self, detector: impl Into<BuiltinDetector>) -> Self {
        self.builtin.push(detector.into());
        self
    }

    /// Add with config validation
    pub fn add_checked(mut self, detector: impl Into<BuiltinDetector>) -> Result<Self> {
        let detector = detector.into();
        detector.validate_config()?;
        self.builtin.push(detector);
        Ok(self)
    }

    /// Add a custom detector (slow path)
    pub fn add_custom<D: PatternDetector + 'static>(mut self, detector: D) -> Self {
        self.custom.push(Box::new(detector));
        self
    }

    /// Keep only these patterns; applied at [`build`](Self::build).
    pub fn only_patterns(mut self, ids: impl IntoIterator<Item = PatternId>) -> Self {
        self.pattern_filter = Some(ids.into_iter().collect());
        self
    }

    /// Override the equal-price tolerance of every builtin detector that has one.
    pub fn tolerance(mut self, tolerance: Tolerance) -> Self {
        self.tolerance = Some(tolerance);
        self
    }

    /// Build the engine
    pub fn build(self) -> Result<PatternEngine> {
        let mut builtin = self.builtin;
        let mut custom = self.custom;
        if let Some(tolerance) = self.tolerance {
            builtin = builtin.into_iter().map(|d| d.with_tolerance(tolerance)).collect();
        }
        if let Some(filter) = &self.pattern_filter {
            builtin.retain(|d| filter.contains(&d.id()));
            custom.retain(|d| filter.contains(&d.id()));
        }

        let engine = PatternEngine { builtin, custom };
        engine.validate()?;
        debug!(
            builtin = engine.builtin.len(),
            custom = engine.custom.len(),
            "pattern engine built"
        );
        Ok(engine)
    }
}

// ============================================================
// PARALLEL SCANNING
// ============================================================

/// Result of scanning a single instrument
#[derive(Debug)]
pub struct ScanResult {
    pub symbol: String,
    pub series: PatternSeries,
}

/// Error from scanning a single instrument
#[derive(Debug)]
pub struct ScanError {
    pub symbol: String,
    pub error: PatternError,
}

/// Build and scan many instruments in parallel.
///
/// Instruments whose rows fail validation are reported in the error list and
/// do not affect the others.
pub fn scan_parallel<'a, I>(engine: &PatternEngine, instruments: I) -> (Vec<ScanResult>, Vec<ScanError>)
where
    I: IntoParallelIterator<Item = (&'a str, &'a [PriceRow])>,
{
    let results: Vec<_> = instruments
        .into_par_iter()
        .map(|(symbol, rows)| {
            BarChain::from_rows(rows.iter().cloned())
                .map(|chain| ScanResult {
                    symbol: symbol.to_string(),
                    series: engine.scan(&chain),
                })
                .map_err(|error| {
                    warn!(symbol, %error, "instrument skipped");
                    ScanError {
                        symbol: symbol.to_string(),
                        error,
                    }
                })
        })
        .collect();

    let mut successes = Vec::new();
    let mut errors = Vec::new();

    for result in results {
        match result {
            Ok(r) => successes.push(r),
            Err(e) => errors.push(e),
        }
    }

    (successes, errors)
}

// ============================================================
// TESTS
// ============================================================
