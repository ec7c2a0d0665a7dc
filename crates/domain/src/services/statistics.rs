//! Attendance summaries, dashboard counters and history filtering.

use std::collections::HashSet;

use chrono::{Duration, NaiveDate};

use crate::models::{AttendanceRecord, AttendanceStatus};

/// Default trailing window for dashboard punctuality counters.
pub const DEFAULT_STATS_WINDOW_DAYS: i64 = 7;

/// Per-user attendance summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AttendanceSummary {
    pub total: usize,
    pub on_time: usize,
    pub late: usize,
    pub absent: usize,
    /// Records without a check-out time.
    pub open: usize,
    /// `on_time / (on_time + late)` as a rounded percentage.
    pub on_time_percentage: u8,
}

impl AttendanceSummary {
    /// Summarizes `records`. A `checked_in` status counts as on time.
    pub fn from_records(records: &[AttendanceRecord]) -> Self {
        let mut summary = Self {
            total: records.len(),
            ..Self::default()
        };

        for record in records {
            match record.status {
                AttendanceStatus::OnTime | AttendanceStatus::CheckedIn => summary.on_time += 1,
                AttendanceStatus::Late => summary.late += 1,
                AttendanceStatus::Absent => summary.absent += 1,
                AttendanceStatus::CheckedOut => {}
            }
            if record.is_open() {
                summary.open += 1;
            }
        }

        let punctual_base = summary.on_time + summary.late;
        if punctual_base > 0 {
            summary.on_time_percentage =
                ((summary.on_time as f64 / punctual_base as f64) * 100.0).round() as u8;
        }
        summary
    }
}

/// Counters shown on the administrator dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DashboardStats {
    pub total_users: usize,
    /// Distinct users with a record dated today.
    pub checked_in_today: usize,
    /// Open records, i.e. users currently on location.
    pub on_location: usize,
    pub on_time: usize,
    pub late: usize,
}

impl DashboardStats {
    /// Computes the dashboard counters.
    ///
    /// `on_time` and `late` cover the `window_days` days ending on `today`,
    /// inclusive.
    pub fn compute(
        total_users: usize,
        records: &[AttendanceRecord],
        today: NaiveDate,
        window_days: i64,
    ) -> Self {
        let window_start = today - Duration::days(window_days.max(1) - 1);

        let checked_in_today = records
            .iter()
            .filter(|r| r.date == today)
            .map(|r| r.user_id.as_str())
            .collect::<HashSet<_>>()
            .len();

        let in_window = records
            .iter()
            .filter(|r| r.date >= window_start && r.date <= today);
        let (mut on_time, mut late) = (0, 0);
        for record in in_window {
            match record.status {
                AttendanceStatus::OnTime => on_time += 1,
                AttendanceStatus::Late => late += 1,
                _ => {}
            }
        }

        Self {
            total_users,
            checked_in_today,
            on_location: records.iter().filter(|r| r.is_open()).count(),
            on_time,
            late,
        }
    }
}

/// Criteria for narrowing an attendance history listing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryFilter {
    pub date: Option<NaiveDate>,
    pub status: Option<AttendanceStatus>,
    pub user_id: Option<String>,
}

impl HistoryFilter {
    pub fn matches(&self, record: &AttendanceRecord) -> bool {
        self.date.map_or(true, |d| record.date == d)
            && self.status.map_or(true, |s| record.status == s)
            && self
                .user_id
                .as_deref()
                .map_or(true, |u| record.user_id == u)
    }

    /// Returns the matching records, newest check-in first.
    pub fn apply(&self, records: &[AttendanceRecord]) -> Vec<AttendanceRecord> {
        let mut matching: Vec<_> = records.iter().filter(|r| self.matches(r)).cloned().collect();
        matching.sort_by(|a, b| {
            b.date
                .cmp(&a.date)
                .then_with(|| b.check_in_time.cmp(&a.check_in_time))
        });
        matching
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn record(
        user: &str,
        day: u32,
        hour: u32,
        status: AttendanceStatus,
        open: bool,
    ) -> AttendanceRecord {
        let check_in = Utc.with_ymd_and_hms(2026, 3, day, hour, 0, 0).unwrap();
        AttendanceRecord {
            id: Some(format!("{user}-{day}-{hour}")),
            user_id: user.into(),
            date: check_in.date_naive(),
            check_in_time: check_in,
            check_out_time: (!open).then(|| check_in + Duration::hours(8)),
            status,
            latitude: 5.11883,
            longitude: 7.36927,
        }
    }

    fn march(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, day).unwrap()
    }

    #[test]
    fn test_summary_counts_checked_in_as_on_time() {
        let records = vec![
            record("u1", 2, 9, AttendanceStatus::OnTime, false),
            record("u1", 3, 10, AttendanceStatus::Late, false),
            record("u1", 4, 9, AttendanceStatus::CheckedIn, true),
            record("u1", 5, 9, AttendanceStatus::Absent, false),
        ];
        let summary = AttendanceSummary::from_records(&records);

        assert_eq!(summary.total, 4);
        assert_eq!(summary.on_time, 2);
        assert_eq!(summary.late, 1);
        assert_eq!(summary.absent, 1);
        assert_eq!(summary.open, 1);
        assert_eq!(summary.on_time_percentage, 67);
    }

    #[test]
    fn test_summary_of_nothing() {
        let summary = AttendanceSummary::from_records(&[]);
        assert_eq!(summary, AttendanceSummary::default());
        assert_eq!(summary.on_time_percentage, 0);
    }

    #[test]
    fn test_dashboard_stats() {
        let records = vec![
            record("u1", 10, 9, AttendanceStatus::CheckedIn, true),
            record("u1", 10, 14, AttendanceStatus::CheckedOut, false),
            record("u2", 10, 10, AttendanceStatus::Late, false),
            record("u3", 8, 9, AttendanceStatus::OnTime, false),
            record("u3", 4, 9, AttendanceStatus::OnTime, false),
            // Outside the 7-day window ending on the 10th.
            record("u2", 3, 10, AttendanceStatus::Late, false),
        ];

        let stats = DashboardStats::compute(12, &records, march(10), DEFAULT_STATS_WINDOW_DAYS);

        assert_eq!(stats.total_users, 12);
        assert_eq!(stats.checked_in_today, 2);
        assert_eq!(stats.on_location, 1);
        assert_eq!(stats.on_time, 2);
        assert_eq!(stats.late, 1);
    }

    #[test]
    fn test_history_filter_narrows_and_sorts_newest_first() {
        let records = vec![
            record("u1", 2, 9, AttendanceStatus::OnTime, false),
            record("u2", 3, 9, AttendanceStatus::Late, false),
            record("u1", 4, 9, AttendanceStatus::Late, false),
            record("u1", 4, 13, AttendanceStatus::OnTime, true),
        ];

        let all = HistoryFilter::default().apply(&records);
        let ids: Vec<_> = all.iter().filter_map(|r| r.id.as_deref()).collect();
        assert_eq!(ids, vec!["u1-4-13", "u1-4-9", "u2-3-9", "u1-2-9"]);

        let late_u1 = HistoryFilter {
            status: Some(AttendanceStatus::Late),
            user_id: Some("u1".into()),
            ..Default::default()
        }
        .apply(&records);
        assert_eq!(late_u1.len(), 1);
        assert_eq!(late_u1[0].date, march(4));

        let by_date = HistoryFilter {
            date: Some(march(3)),
            ..Default::default()
        };
        assert_eq!(by_date.apply(&records).len(), 1);
    }
}
