//! Ordered, append-only sequence of [`Bar`]s with index-based lookback.

use std::ops::Deref;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::{
    bar::{Bar, PriceRow, PriceView, RawRow},
    PatternError, Result,
};

/// Owns the bars of one price series, in row order.
///
/// Bars are only ever appended. The predecessor of bar `i` is bar `i - 1`,
/// reached through a [`BarRef`] cursor.
#[derive(Debug, Clone, Default)]
pub struct BarChain {
    bars: Vec<Bar>,
}

impl BarChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bars: Vec::with_capacity(capacity),
        }
    }

    /// Build a chain from structured rows, failing on the first malformed one.
    pub fn from_rows<I>(rows: I) -> Result<Self>
    where
        I: IntoIterator<Item = PriceRow>,
    {
        let rows = rows.into_iter();
        let mut chain = Self::with_capacity(rows.size_hint().0);
        for row in rows {
            chain.append(row)?;
        }
        debug!(bars = chain.len(), "bar chain built");
        Ok(chain)
    }

    /// Build a chain from flat rows, validating each one once.
    pub fn from_raw_rows<I>(rows: I) -> Result<Self>
    where
        I: IntoIterator<Item = RawRow>,
    {
        let rows = rows.into_iter();
        let mut chain = Self::with_capacity(rows.size_hint().0);
        for raw in rows {
            chain.append_raw(raw)?;
        }
        debug!(bars = chain.len(), "bar chain built from raw rows");
        Ok(chain)
    }

    /// Append a bar built from `row`, linked to the current tail.
    pub fn append(&mut self, row: PriceRow) -> Result<BarRef<'_>> {
        let index = self.bars.len();
        let bar = Bar::new(index, row)?;
        self.bars.push(bar);
        Ok(BarRef { chain: self, index })
    }

    pub fn append_raw(&mut self, raw: RawRow) -> Result<BarRef<'_>> {
        let index = self.bars.len();
        let row = PriceRow::try_from(raw).map_err(|e| e.at_index(index))?;
        self.append(row)
    }

    /// Bar at `index`, or [`PatternError::IndexOutOfRange`].
    pub fn at(&self, index: usize) -> Result<BarRef<'_>> {
        self.get(index).ok_or(PatternError::IndexOutOfRange {
            index,
            len: self.bars.len(),
        })
    }

    pub fn get(&self, index: usize) -> Option<BarRef<'_>> {
        (index < self.bars.len()).then_some(BarRef { chain: self, index })
    }

    pub fn last(&self) -> Option<BarRef<'_>> {
        self.bars.len().checked_sub(1).and_then(|i| self.get(i))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Cursor over every bar, oldest first.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = BarRef<'_>> + '_ {
        (0..self.bars.len()).map(move |index| BarRef { chain: self, index })
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    // ===========================================
    // Column extraction for indicator adapters
    // ===========================================

    pub fn opens(&self) -> Vec<f64> {
        self.bars.iter().map(Bar::open).collect()
    }

    pub fn highs(&self) -> Vec<f64> {
        self.bars.iter().map(Bar::high).collect()
    }

    pub fn lows(&self) -> Vec<f64> {
        self.bars.iter().map(Bar::low).collect()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(Bar::close).collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.bars.iter().map(Bar::volume).collect()
    }

    pub fn timestamps(&self) -> Vec<DateTime<Utc>> {
        self.bars.iter().map(Bar::timestamp).collect()
    }

    /// Close prices of `view`; fails if any bar does not carry that view.
    pub fn view_closes(&self, view: PriceView) -> Result<Vec<f64>> {
        self.bars
            .iter()
            .map(|bar| {
                bar.price(view)
                    .map(|ohlc| ohlc.close)
                    .ok_or(PatternError::MissingPriceView {
                        index: bar.index(),
                        view,
                    })
            })
            .collect()
    }
}

// ============================================================
// BAR CURSOR
// ============================================================

/// A bar together with the chain it lives in, so lookback is a bounds-checked
/// index instead of a stored pointer.
#[derive(Clone, Copy)]
pub struct BarRef<'a> {
    chain: &'a BarChain,
    index: usize,
}

impl<'a> BarRef<'a> {
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    #[inline]
    pub fn bar(&self) -> &'a Bar {
        &self.chain.bars[self.index]
    }

    /// Number of ancestors reachable from this bar.
    #[inline]
    pub fn history(&self) -> usize {
        self.index
    }

    pub fn previous(&self) -> Option<BarRef<'a>> {
        self.ancestor(1)
    }

    /// The bar `k` steps back, `None` if the chain is not that deep here.
    pub fn ancestor(&self, k: usize) -> Option<BarRef<'a>> {
        self.index.checked_sub(k).map(|index| BarRef {
            chain: self.chain,
            index,
        })
    }

    /// Walk predecessors, nearest first.
    pub fn ancestors(&self) -> impl Iterator<Item = BarRef<'a>> {
        std::iter::successors(self.previous(), |b| b.previous())
    }

    /// The `N` bars ending at this one, oldest first.
    ///
    /// `None` when fewer than `N - 1` ancestors exist.
    pub fn window<const N: usize>(&self) -> Option<[&'a Bar; N]> {
        let start = (self.index + 1).checked_sub(N)?;
        let bars = &self.chain.bars;
        Some(std::array::from_fn(|i| &bars[start + i]))
    }
}

impl std::fmt::Debug for BarRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BarRef")
            .field("index", &self.index)
            .field("bar", self.bar())
            .finish()
    }
}

impl Deref for BarRef<'_> {
    type Target = Bar;

    fn deref(&self) -> &Bar {
        self.bar()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bar::Ohlc;
    use chrono::{Duration, TimeZone};

    fn rows(n: usize) -> Vec<PriceRow> {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        (0..n)
            .map(|i| {
                let base = 100.0 + i as f64;
                PriceRow::new(
                    Ohlc::new(base, base + 1.0, base - 1.0, base + 0.5),
                    1000.0,
                    start + Duration::hours(i as i64),
                )
            })
            .collect()
    }

    #[test]
    fn test_append_links_to_tail() {
        let mut chain = BarChain::new();
        let first = chain.append(rows(1).remove(0)).unwrap();
        assert!(first.previous().is_none());
        let second = chain.append(rows(2).remove(1)).unwrap();
        assert_eq!(second.previous().map(|p| p.index()), Some(0));
    }

    #[test]
    fn test_at_out_of_range() {
        let chain = BarChain::from_rows(rows(3)).unwrap();
        assert!(chain.at(2).is_ok());
        assert!(matches!(
            chain.at(3),
            Err(PatternError::IndexOutOfRange { index: 3, len: 3 })
        ));
    }

    #[test]
    fn test_window_requires_history() {
        let chain = BarChain::from_rows(rows(4)).unwrap();
        let second = chain.at(1).unwrap();
        assert!(second.window::<3>().is_none());
        assert!(second.window::<2>().is_some());

        let last = chain.at(3).unwrap();
        let [a, b, c, d] = last.window::<4>().unwrap();
        assert_eq!(
            [a.index(), b.index(), c.index(), d.index()],
            [0, 1, 2, 3]
        );
    }

    #[test]
    fn test_ancestors_count_matches_index() {
        let chain = BarChain::from_rows(rows(6)).unwrap();
        for bar in chain.iter() {
            assert_eq!(bar.ancestors().count(), bar.index());
        }
    }

    #[test]
    fn test_view_closes_missing_view() {
        let chain = BarChain::from_rows(rows(2)).unwrap();
        assert!(matches!(
            chain.view_closes(PriceView::Mid),
            Err(PatternError::MissingPriceView {
                index: 0,
                view: PriceView::Mid
            })
        ));
        assert_eq!(chain.view_closes(PriceView::Bid).unwrap(), chain.closes());
    }

    #[test]
    fn test_raw_row_error_carries_index() {
        let mut chain = BarChain::from_rows(rows(2)).unwrap();
        let err = chain.append_raw(RawRow::default()).map(|_| ()).unwrap_err();
        assert!(matches!(
            err,
            PatternError::MalformedRow {
                index: 2,
                field: "bid_open",
                ..
            }
        ));
        assert_eq!(chain.len(), 2);
    }
}
