//! Port traits: the boundary between the domain and its adapters.

pub mod config_port;
pub mod panel_port;
pub mod report_port;
