//! CDP solvency engine.
//!
//! Pure calculations over collateralized debt positions: per-position
//! metrics, portfolio aggregation, risk classification, action simulation
//! and a per-session security monitor. Nothing in this crate performs I/O
//! except loading a position seed file.

pub mod actions;
pub mod calculator;
pub mod format;
pub mod monitor;
pub mod numeric;
pub mod portfolio;
pub mod positions;
pub mod prices;
pub mod registry;
pub mod risk;
pub mod validation;
