//! Domain services for the attendance client.
//!
//! Services contain the check-in business logic that operates on domain models.

pub mod check_in;
pub mod check_out;
pub mod distance;
pub mod statistics;
pub mod zone_evaluation;

pub use check_in::{
    Admission, AttendanceGateway, CheckInFailure, CheckInFlow, CheckInOutcome, CheckInState,
    FlowError, GatewayError, LocationSensor, MissDetail, SensorError, DEFAULT_SENSOR_TIMEOUT,
};
pub use check_out::{CheckOutFailure, CheckOutFlow, CheckOutState};
pub use distance::{haversine_distance, EARTH_RADIUS_METERS};
pub use statistics::{AttendanceSummary, DashboardStats, HistoryFilter, DEFAULT_STATS_WINDOW_DAYS};
pub use zone_evaluation::{evaluate_zones, NearestMiss, ZoneEvaluation, ZoneMatch};
