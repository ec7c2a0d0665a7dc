//! Attendance domain models.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

/// Attendance status as reported by the system of record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    #[serde(alias = "on-time")]
    OnTime,
    Late,
    CheckedIn,
    CheckedOut,
    Absent,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::OnTime => "on_time",
            AttendanceStatus::Late => "late",
            AttendanceStatus::CheckedIn => "checked_in",
            AttendanceStatus::CheckedOut => "checked_out",
            AttendanceStatus::Absent => "absent",
        }
    }

    /// Human readable label.
    pub fn label(&self) -> &'static str {
        match self {
            AttendanceStatus::OnTime => "On Time",
            AttendanceStatus::Late => "Late",
            AttendanceStatus::CheckedIn => "Checked In",
            AttendanceStatus::CheckedOut => "Checked Out",
            AttendanceStatus::Absent => "Absent",
        }
    }
}

impl FromStr for AttendanceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "on_time" | "on-time" => Ok(AttendanceStatus::OnTime),
            "late" => Ok(AttendanceStatus::Late),
            "checked_in" => Ok(AttendanceStatus::CheckedIn),
            "checked_out" => Ok(AttendanceStatus::CheckedOut),
            "absent" => Ok(AttendanceStatus::Absent),
            _ => Err(format!("Invalid attendance status: {}", s)),
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One user's attendance for one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub user_id: String,
    pub date: NaiveDate,
    pub check_in_time: DateTime<Utc>,
    #[serde(default)]
    pub check_out_time: Option<DateTime<Utc>>,
    pub status: AttendanceStatus,
    pub latitude: f64,
    pub longitude: f64,
}

impl AttendanceRecord {
    /// A record is open until the user checks out.
    pub fn is_open(&self) -> bool {
        self.check_out_time.is_none()
    }

    /// Time between check-in and check-out, `None` while the record is open.
    pub fn worked_duration(&self) -> Option<Duration> {
        self.check_out_time
            .map(|out| out - self.check_in_time)
            .filter(|d| *d >= Duration::zero())
    }
}

/// Finds the user's open record for `date`, if any.
pub fn find_open_record<'a>(
    records: &'a [AttendanceRecord],
    user_id: &str,
    date: NaiveDate,
) -> Option<&'a AttendanceRecord> {
    records
        .iter()
        .find(|r| r.user_id == user_id && r.date == date && r.is_open())
}

/// Formats a duration as `"8h 30m"`.
pub fn format_duration(duration: Duration) -> String {
    let minutes = duration.num_minutes().max(0);
    format!("{}h {}m", minutes / 60, minutes % 60)
}

/// Request body for `POST /attendance/check-in`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInRequest {
    pub latitude: f64,
    pub longitude: f64,
    pub login_time: DateTime<Utc>,
    /// Zone that admitted the sample.
    pub zone_id: String,
}

/// Request body for `POST /attendance/check-out`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckOutRequest {
    /// Wall-clock time in `HH:MM`.
    pub check_out_time: String,
}

impl CheckOutRequest {
    pub fn at(time: NaiveTime) -> Self {
        Self {
            check_out_time: time.format("%H:%M").to_string(),
        }
    }
}

/// Direction of an administrator-entered attendance correction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManualAction {
    CheckIn,
    CheckOut,
}

impl ManualAction {
    /// Endpoint path for this action.
    pub fn path(&self) -> &'static str {
        match self {
            ManualAction::CheckIn => "/attendance/manual-checkin",
            ManualAction::CheckOut => "/attendance/manual-checkout",
        }
    }
}

/// Request body for manual check-in / check-out by an administrator.
#[derive(Debug, Clone, PartialEq, Serialize, Validate)]
pub struct ManualAttendanceRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    pub date: NaiveDate,

    #[validate(custom(function = "shared::validation::validate_time_of_day"))]
    pub time: String,
}
