//! tradeflow: backtester for trade lists over price panels.
//!
//! A strategy emits trades; each trade is executed against a price panel to
//! resolve its close bar under take-profit / stop-loss, and executed trades
//! are aggregated into an order history, a bar × asset transaction matrix
//! and a wealth curve.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
