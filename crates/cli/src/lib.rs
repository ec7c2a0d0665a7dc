//! Command-line client for geofence-gated attendance.

pub mod commands;
pub mod config;
pub mod logging;
pub mod sensor;
