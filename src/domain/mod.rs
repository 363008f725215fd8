//! Pure chart-composition logic. Nothing in here performs I/O.

pub mod bar;
pub mod grid;
pub mod session;
pub mod trade;
pub mod normalize;
pub mod range;
pub mod reference_line;
pub mod trade_overlay;
pub mod measurement;
pub mod day_stats;
pub mod compose;
pub mod config_validation;
pub mod error;
