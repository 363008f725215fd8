//! gridchart: composes intraday price/volume series, grid reference levels
//! and simulated trade markers into a renderable chart description.
//!
//! Hexagonal layout: pure composition in [`domain`], boundary traits in
//! [`ports`], concrete I/O in [`adapters`], command wiring in [`cli`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
