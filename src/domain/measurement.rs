//! Two-point distance measurement.
//!
//! Selection transitions on `click(k)`:
//!
//! | state            | click k       | next              |
//! |------------------|---------------|-------------------|
//! | `Empty`          | any           | `OnePicked(k)`    |
//! | `OnePicked(i)`   | k == i        | `Empty`           |
//! | `OnePicked(i)`   | k != i        | `TwoPicked(i, k)` |
//! | `TwoPicked(..)`  | any           | `OnePicked(k)`    |
//!
//! Prices are always read from the series passed to [`Selection::measure`],
//! never cached at click time.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    Empty,
    OnePicked(usize),
    TwoPicked(usize, usize),
}

impl Selection {
    #[must_use]
    pub fn click(self, k: usize) -> Self {
        match self {
            Selection::Empty => Selection::OnePicked(k),
            Selection::OnePicked(i) if i == k => Selection::Empty,
            Selection::OnePicked(i) => Selection::TwoPicked(i, k),
            Selection::TwoPicked(..) => Selection::OnePicked(k),
        }
    }

    #[must_use]
    pub fn clear(self) -> Self {
        Selection::Empty
    }

    /// Selected indices in pick order.
    pub fn indices(&self) -> Vec<usize> {
        match *self {
            Selection::Empty => Vec::new(),
            Selection::OnePicked(i) => vec![i],
            Selection::TwoPicked(i, j) => vec![i, j],
        }
    }

    /// Measurement between the two picked points of `prices`, if both are in
    /// bounds and finite.
    pub fn measure(&self, prices: &[f64]) -> Option<Measurement> {
        let Selection::TwoPicked(i, j) = *self else {
            return None;
        };
        let p1 = *prices.get(i)?;
        let p2 = *prices.get(j)?;
        if !p1.is_finite() || !p2.is_finite() {
            return None;
        }

        let diff = (p1 - p2).abs();
        let floor = p1.min(p2);
        let pct = (floor != 0.0).then(|| diff / floor * 100.0);

        Some(Measurement {
            first_index: i,
            second_index: j,
            p1,
            p2,
            diff,
            pct,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Measurement {
    pub first_index: usize,
    pub second_index: usize,
    pub p1: f64,
    pub p2: f64,
    pub diff: f64,
    /// `None` when the lower price is zero.
    pub pct: Option<f64>,
}

/// Owns the selection across recompositions.
#[derive(Debug, Clone, Default)]
pub struct MeasurementSelector {
    state: Selection,
}

impl MeasurementSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> Selection {
        self.state
    }

    pub fn click(&mut self, k: usize) -> Selection {
        self.state = self.state.click(k);
        tracing::debug!(index = k, state = ?self.state, "selection click");
        self.state
    }

    pub fn clear(&mut self) {
        self.state = self.state.clear();
    }

    pub fn measure(&self, prices: &[f64]) -> Option<Measurement> {
        self.state.measure(prices)
    }
}
