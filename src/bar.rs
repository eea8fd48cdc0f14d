//! Price rows and the immutable [`Bar`] built from them.
//!
//! A [`PriceRow`] is the validated ingestion record: one mandatory bid view,
//! optional ask/mid views, volume and a UTC timestamp. [`RawRow`] is the flat,
//! column-per-field shape price files usually come in; converting it checks
//! every field once so nothing downstream has to.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Direction, PatternError, Result};

// ============================================================
// PRICE VIEWS
// ============================================================

/// One open/high/low/close quadruple.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ohlc {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl Ohlc {
    pub const fn new(open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            open,
            high,
            low,
            close,
        }
    }

    fn check(&self, view: PriceView) -> Result<()> {
        let fields = [self.open, self.high, self.low, self.close];
        for (part, value) in fields.into_iter().enumerate() {
            if !value.is_finite() {
                return Err(PatternError::MalformedRow {
                    index: 0,
                    field: view.column(part),
                    reason: "non-numeric value",
                });
            }
        }
        Ok(())
    }
}

/// Which side of the quote a price quadruple belongs to.
///
/// Pattern geometry is always computed on the bid view; ask and mid are
/// carried through for strategies and charting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceView {
    Bid,
    Ask,
    Mid,
}

impl PriceView {
    pub fn as_str(self) -> &'static str {
        match self {
            PriceView::Bid => "bid",
            PriceView::Ask => "ask",
            PriceView::Mid => "mid",
        }
    }

    /// Flat column name for `part` (0 = open, 1 = high, 2 = low, 3 = close).
    fn column(self, part: usize) -> &'static str {
        const BID: [&str; 4] = ["bid_open", "bid_high", "bid_low", "bid_close"];
        const ASK: [&str; 4] = ["ask_open", "ask_high", "ask_low", "ask_close"];
        const MID: [&str; 4] = ["mid_open", "mid_high", "mid_low", "mid_close"];
        let columns = match self {
            PriceView::Bid => &BID,
            PriceView::Ask => &ASK,
            PriceView::Mid => &MID,
        };
        columns[part.min(3)]
    }
}

impl std::fmt::Display for PriceView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================
// ROWS
// ============================================================

/// Structured input row for one bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRow {
    pub bid: Ohlc,
    #[serde(default)]
    pub ask: Option<Ohlc>,
    #[serde(default)]
    pub mid: Option<Ohlc>,
    pub volume: f64,
    pub timestamp: DateTime<Utc>,
}

impl PriceRow {
    pub fn new(bid: Ohlc, volume: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            bid,
            ask: None,
            mid: None,
            volume,
            timestamp,
        }
    }

    pub fn with_ask(mut self, ask: Ohlc) -> Self {
        self.ask = Some(ask);
        self
    }

    pub fn with_mid(mut self, mid: Ohlc) -> Self {
        self.mid = Some(mid);
        self
    }

    pub fn view(&self, view: PriceView) -> Option<&Ohlc> {
        match view {
            PriceView::Bid => Some(&self.bid),
            PriceView::Ask => self.ask.as_ref(),
            PriceView::Mid => self.mid.as_ref(),
        }
    }

    /// Check that every numeric field is finite.
    ///
    /// Geometry (`high >= low` and friends) is deliberately not checked.
    pub fn validate(&self) -> Result<()> {
        self.bid.check(PriceView::Bid)?;
        if let Some(ask) = &self.ask {
            ask.check(PriceView::Ask)?;
        }
        if let Some(mid) = &self.mid {
            mid.check(PriceView::Mid)?;
        }
        if !self.volume.is_finite() {
            return Err(PatternError::MalformedRow {
                index: 0,
                field: "volume",
                reason: "non-numeric value",
            });
        }
        Ok(())
    }
}

/// Flat row as found in price files: one optional column per field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawRow {
    #[serde(alias = "open")]
    pub bid_open: Option<f64>,
    #[serde(alias = "high")]
    pub bid_high: Option<f64>,
    #[serde(alias = "low")]
    pub bid_low: Option<f64>,
    #[serde(alias = "close")]
    pub bid_close: Option<f64>,
    pub ask_open: Option<f64>,
    pub ask_high: Option<f64>,
    pub ask_low: Option<f64>,
    pub ask_close: Option<f64>,
    pub mid_open: Option<f64>,
    pub mid_high: Option<f64>,
    pub mid_low: Option<f64>,
    pub mid_close: Option<f64>,
    pub volume: Option<f64>,
    #[serde(alias = "time")]
    pub timestamp: Option<DateTime<Utc>>,
}

fn require(value: Option<f64>, field: &'static str) -> Result<f64> {
    let value = value.ok_or(PatternError::MalformedRow {
        index: 0,
        field,
        reason: "missing field",
    })?;
    if !value.is_finite() {
        return Err(PatternError::MalformedRow {
            index: 0,
            field,
            reason: "non-numeric value",
        });
    }
    Ok(value)
}

fn required_view(parts: [Option<f64>; 4], view: PriceView) -> Result<Ohlc> {
    Ok(Ohlc::new(
        require(parts[0], view.column(0))?,
        require(parts[1], view.column(1))?,
        require(parts[2], view.column(2))?,
        require(parts[3], view.column(3))?,
    ))
}

/// An auxiliary view is either absent entirely or complete.
fn optional_view(parts: [Option<f64>; 4], view: PriceView) -> Result<Option<Ohlc>> {
    if parts.iter().all(Option::is_none) {
        return Ok(None);
    }
    required_view(parts, view).map(Some)
}

impl TryFrom<RawRow> for PriceRow {
    type Error = PatternError;

    fn try_from(raw: RawRow) -> Result<Self> {
        let bid = required_view(
            [raw.bid_open, raw.bid_high, raw.bid_low, raw.bid_close],
            PriceView::Bid,
        )?;
        let ask = optional_view(
            [raw.ask_open, raw.ask_high, raw.ask_low, raw.ask_close],
            PriceView::Ask,
        )?;
        let mid = optional_view(
            [raw.mid_open, raw.mid_high, raw.mid_low, raw.mid_close],
            PriceView::Mid,
        )?;
        let volume = require(raw.volume, "volume")?;
        let timestamp = raw.timestamp.ok_or(PatternError::MalformedRow {
            index: 0,
            field: "timestamp",
            reason: "missing field",
        })?;

        Ok(Self {
            bid,
            ask,
            mid,
            volume,
            timestamp,
        })
    }
}

// ============================================================
// BAR
// ============================================================

/// One immutable observation with its geometry derived at construction.
///
/// A bar knows its position in the chain it was built for; the predecessor
/// is reached through [`crate::BarRef::previous`], never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    index: usize,
    bid: Ohlc,
    ask: Option<Ohlc>,
    mid: Option<Ohlc>,
    volume: f64,
    timestamp: DateTime<Utc>,
    body_size: f64,
    total_range: f64,
    upper_wick: f64,
    lower_wick: f64,
    body_to_range_ratio: f64,
    direction: Direction,
}

impl Bar {
    /// Build the bar at chain position `index` from `row`.
    pub fn new(index: usize, row: PriceRow) -> Result<Self> {
        row.validate().map_err(|e| e.at_index(index))?;

        let Ohlc {
            open,
            high,
            low,
            close,
        } = row.bid;
        let body_size = (open - close).abs();
        let total_range = high - low;
        let body_to_range_ratio = if total_range != 0.0 {
            body_size / total_range
        } else {
            0.0
        };

        Ok(Self {
            index,
            bid: row.bid,
            ask: row.ask,
            mid: row.mid,
            volume: row.volume,
            timestamp: row.timestamp,
            body_size,
            total_range,
            upper_wick: high - open.max(close),
            lower_wick: open.min(close) - low,
            body_to_range_ratio,
            direction: Direction::of(open, close),
        })
    }

    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Chain position of the predecessor, `None` for the first bar.
    #[inline]
    pub fn previous_index(&self) -> Option<usize> {
        self.index.checked_sub(1)
    }

    #[inline]
    pub fn open(&self) -> f64 {
        self.bid.open
    }

    #[inline]
    pub fn high(&self) -> f64 {
        self.bid.high
    }

    #[inline]
    pub fn low(&self) -> f64 {
        self.bid.low
    }

    #[inline]
    pub fn close(&self) -> f64 {
        self.bid.close
    }

    #[inline]
    pub fn volume(&self) -> f64 {
        self.volume
    }

    #[inline]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn price(&self, view: PriceView) -> Option<&Ohlc> {
        match view {
            PriceView::Bid => Some(&self.bid),
            PriceView::Ask => self.ask.as_ref(),
            PriceView::Mid => self.mid.as_ref(),
        }
    }

    #[inline]
    pub fn body_size(&self) -> f64 {
        self.body_size
    }

    #[inline]
    pub fn total_range(&self) -> f64 {
        self.total_range
    }

    #[inline]
    pub fn upper_wick(&self) -> f64 {
        self.upper_wick
    }

    #[inline]
    pub fn lower_wick(&self) -> f64 {
        self.lower_wick
    }

    /// `body_size / total_range`, or `0.0` for a bar with no range.
    #[inline]
    pub fn body_to_range_ratio(&self) -> f64 {
        self.body_to_range_ratio
    }

    #[inline]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    #[inline]
    pub fn is_bullish(&self) -> bool {
        self.direction.is_bullish()
    }

    #[inline]
    pub fn is_bearish(&self) -> bool {
        self.direction.is_bearish()
    }

    /// Midpoint of the real body.
    #[inline]
    pub fn body_midpoint(&self) -> f64 {
        (self.bid.open + self.bid.close) / 2.0
    }
}

impl std::fmt::Display for Bar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Bar#{} ({}): O={} H={} L={} C={} body={} range={} ratio={:.2}",
            self.index,
            self.direction,
            self.bid.open,
            self.bid.high,
            self.bid.low,
            self.bid.close,
            self.body_size,
            self.total_range,
            self.body_to_range_ratio,
        )
    }
}
