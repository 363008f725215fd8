//! Grid-strategy parameters and grid level arithmetic.
//!
//! In percent mode `step` is expressed in percentage points (0.5 means 0.5 %),
//! the same convention the grid simulation engine uses when it produces trades.

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepUnit {
    Percent,
    Absolute,
}

impl FromStr for StepUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "percent" | "pct" | "%" => Ok(StepUnit::Percent),
            "absolute" | "abs" => Ok(StepUnit::Absolute),
            other => Err(format!("unknown step unit '{other}' (expected percent or absolute)")),
        }
    }
}

impl fmt::Display for StepUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepUnit::Percent => write!(f, "percent"),
            StepUnit::Absolute => write!(f, "absolute"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridConfig {
    pub base_price: f64,
    pub step: f64,
    pub step_unit: StepUnit,
}

impl GridConfig {
    /// A config with a non-finite base or a non-positive step produces no grid
    /// reference lines at all.
    pub fn is_usable(&self) -> bool {
        self.base_price.is_finite() && self.step.is_finite() && self.step > 0.0
    }

    /// Price of grid level `i`; level 0 is the base price.
    pub fn level(&self, i: i32) -> f64 {
        match self.step_unit {
            StepUnit::Percent => self.base_price * (1.0 + i as f64 * self.step / 100.0),
            StepUnit::Absolute => self.base_price + i as f64 * self.step,
        }
    }
}

/// Upper bound on fan levels per side.
pub const MAX_FAN_LEVELS: u32 = 50;

/// How grid reference lines are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GridLineMode {
    #[default]
    BaseOnly,
    Fan {
        levels: u32,
    },
}
