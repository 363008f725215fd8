//! Horizontal reference levels: open, close, previous close, grid base and
//! (optionally) a fan of grid levels around the base.
//!
//! Open and close are always emitted as full-width lines. The base line is
//! dropped when it sits within [`OVERLAP_EPSILON`] of the close.

use crate::domain::bar::DayLevels;
use crate::domain::grid::{GridConfig, GridLineMode, MAX_FAN_LEVELS};
use serde::{Serialize, Serializer};
use std::fmt;

pub const OVERLAP_EPSILON: f64 = 0.0001;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    Base,
    Open,
    Close,
    PreClose,
    Grid(i32),
}

impl ReferenceKind {
    /// Wire name of the kind.
    pub fn name(&self) -> &'static str {
        match self {
            ReferenceKind::Base => "base",
            ReferenceKind::Open => "open",
            ReferenceKind::Close => "close",
            ReferenceKind::PreClose => "preClose",
            ReferenceKind::Grid(_) => "grid",
        }
    }

    pub fn grid_index(&self) -> Option<i32> {
        match self {
            ReferenceKind::Grid(i) => Some(*i),
            _ => None,
        }
    }
}

impl Serialize for ReferenceKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceKind::Base => write!(f, "Base"),
            ReferenceKind::Open => write!(f, "Open"),
            ReferenceKind::Close => write!(f, "Close"),
            ReferenceKind::PreClose => write!(f, "Prev Close"),
            ReferenceKind::Grid(i) if *i > 0 => write!(f, "Grid +{i}"),
            ReferenceKind::Grid(i) => write!(f, "Grid {i}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceLine {
    pub level: f64,
    pub kind: ReferenceKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grid_index: Option<i32>,
    pub label: String,
}

impl ReferenceLine {
    fn new(level: f64, kind: ReferenceKind) -> Self {
        Self {
            level,
            kind,
            grid_index: kind.grid_index(),
            label: kind.to_string(),
        }
    }
}

fn overlaps(a: f64, b: f64) -> bool {
    (a - b).abs() < OVERLAP_EPSILON
}

/// Emission order: open, close, previous close, base, grid levels (ascending).
pub fn build_reference_lines(
    grid: Option<&GridConfig>,
    levels: &DayLevels,
    mode: GridLineMode,
) -> Vec<ReferenceLine> {
    let mut lines = vec![
        ReferenceLine::new(levels.open, ReferenceKind::Open),
        ReferenceLine::new(levels.close, ReferenceKind::Close),
    ];
    if let Some(pre_close) = levels.pre_close {
        lines.push(ReferenceLine::new(pre_close, ReferenceKind::PreClose));
    }

    let Some(grid) = grid else {
        return lines;
    };
    if !grid.is_usable() {
        tracing::debug!(?grid, "grid config not usable, skipping grid lines");
        return lines;
    }

    if overlaps(grid.base_price, levels.close) {
        tracing::debug!(base = grid.base_price, close = levels.close, "base line overlaps close");
    } else {
        lines.push(ReferenceLine::new(grid.base_price, ReferenceKind::Base));
    }

    if let GridLineMode::Fan { levels: n } = mode {
        push_fan(&mut lines, grid, levels, n);
    }

    lines
}

fn push_fan(lines: &mut Vec<ReferenceLine>, grid: &GridConfig, day: &DayLevels, n: u32) {
    let keys = [grid.base_price, day.open, day.close];
    if n > MAX_FAN_LEVELS {
        tracing::debug!(requested = n, max = MAX_FAN_LEVELS, "fan levels clamped");
    }
    let n = n.min(MAX_FAN_LEVELS) as i32;

    for i in (-n..=n).filter(|&i| i != 0) {
        let level = grid.level(i);
        if !level.is_finite() || keys.iter().any(|&k| overlaps(level, k)) {
            continue;
        }
        lines.push(ReferenceLine::new(level, ReferenceKind::Grid(i)));
    }
}
