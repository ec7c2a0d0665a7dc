//! Domain layer for the attendance client.
//!
//! This crate contains:
//! - Domain models (AttendanceRecord, Zone, LocationSample, Session)
//! - Geofence evaluation and the check-in / check-out flows
//! - Attendance statistics

pub mod models;
pub mod services;
