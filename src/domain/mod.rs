//! Core domain types and logic.

pub mod bar;
pub mod panel;
pub mod signal;
pub mod trade;
pub mod history;
pub mod transaction;
pub mod wealth;
pub mod strategy;
pub mod observer;
pub mod backtest;
pub mod metrics;
pub mod benchmark;
pub mod randomwalk;
pub mod config_validation;
pub mod error;
