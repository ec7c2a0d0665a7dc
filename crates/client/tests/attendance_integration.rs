//! Integration tests for the attendance endpoints and the flows built on them.
//!
//! Each test runs against its own in-process fake API.

mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::http::{Method, StatusCode};
use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use client::{ClientError, SessionGateway};
use common::{admin_session, envelope_failure, record_json, staff_session, FakeApi};
use domain::models::attendance::{ManualAction, ManualAttendanceRequest};
use domain::models::{
    AttendanceRecord, AttendanceStatus, CheckInRequest, CheckOutRequest, LocationSample, Zone,
};
use domain::services::{
    CheckInFailure, CheckInFlow, CheckInOutcome, CheckOutFlow, LocationSensor, SensorError,
};
use serde_json::json;
use tokio_test::{assert_err, assert_ok};
use tokio_util::sync::CancellationToken;

const HQ_LAT: f64 = 5.11883;
const HQ_LNG: f64 = 7.36927;

struct FixedSensor(LocationSample);

#[async_trait::async_trait]
impl LocationSensor for FixedSensor {
    async fn current_position(&self) -> Result<LocationSample, SensorError> {
        Ok(self.0)
    }
}

fn hq() -> Zone {
    Zone::new("hq", "Head Office", HQ_LAT, HQ_LNG, 15.0)
}

fn check_in_request() -> CheckInRequest {
    CheckInRequest {
        latitude: HQ_LAT,
        longitude: HQ_LNG,
        login_time: Utc.with_ymd_and_hms(2026, 3, 2, 8, 55, 0).unwrap(),
        zone_id: "hq".into(),
    }
}

// ============================================================================
// Raw endpoint tests
// ============================================================================

#[tokio::test]
async fn test_check_in_sends_bearer_token_and_body() {
    let api = FakeApi::start().await;
    api.respond_ok(
        Method::POST,
        "/attendance/check-in",
        record_json("u1", "2026-03-02", None, "on_time"),
    );

    let record = assert_ok!(api.client().check_in(&check_in_request(), &staff_session()).await);

    assert_eq!(record.user_id, "u1");
    assert_eq!(record.status, AttendanceStatus::OnTime);
    assert!(record.is_open());

    let request = api.last_request();
    assert_eq!(request.method, "POST");
    assert_eq!(request.path, "/attendance/check-in");
    assert_eq!(request.authorization.as_deref(), Some("Bearer staff-token"));
    assert_eq!(request.body["latitude"], HQ_LAT);
    assert_eq!(request.body["longitude"], HQ_LNG);
    assert_eq!(request.body["loginTime"], "2026-03-02T08:55:00Z");
    assert_eq!(request.body["zoneId"], "hq");
}

#[tokio::test]
async fn test_rejected_envelope_surfaces_server_message() {
    let api = FakeApi::start().await;
    api.respond(
        Method::POST,
        "/attendance/check-in",
        StatusCode::OK,
        envelope_failure("You have already checked in today"),
    );

    let err = assert_err!(api.client().check_in(&check_in_request(), &staff_session()).await);
    assert!(matches!(err, ClientError::Rejected(_)));
    assert_eq!(err.server_message(), Some("You have already checked in today"));
}

#[tokio::test]
async fn test_error_status_keeps_message() {
    let api = FakeApi::start().await;
    api.respond(
        Method::POST,
        "/attendance/check-out",
        StatusCode::BAD_REQUEST,
        json!({"message": "No active check-in found"}),
    );

    let err = assert_err!(
        api.client()
            .check_out(
                &CheckOutRequest::at(NaiveTime::from_hms_opt(17, 0, 0).unwrap()),
                &staff_session()
            )
            .await
    );
    match err {
        ClientError::Status { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message.as_deref(), Some("No active check-in found"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_bare_array_response_is_rejected() {
    let api = FakeApi::start().await;
    api.respond(
        Method::GET,
        "/attendance/today",
        StatusCode::OK,
        json!([record_json("u1", "2026-03-02", None, "on_time")]),
    );

    let err = assert_err!(api.client().today_attendance(&staff_session()).await);
    assert!(matches!(err, ClientError::InvalidResponse(_)), "{err:?}");
}

#[tokio::test]
async fn test_slow_server_times_out() {
    let api = FakeApi::start().await;
    api.respond_ok(Method::GET, "/attendance/today", json!([]));
    api.delay(Duration::from_millis(500));

    let err = assert_err!(
        api.client_with_timeout(100)
            .today_attendance(&staff_session())
            .await
    );
    assert!(matches!(err, ClientError::Timeout(100)), "{err:?}");
}

#[tokio::test]
async fn test_user_history_and_open_record() {
    let api = FakeApi::start().await;
    api.respond_ok(
        Method::GET,
        "/attendance/attendance/users/u1",
        json!([
            record_json("u1", "2026-03-01", Some("2026-03-01T17:30:00Z"), "checked_out"),
            record_json("u1", "2026-03-02", None, "checked_in"),
        ]),
    );
    let client = api.client();
    let session = staff_session();

    let history = assert_ok!(client.user_attendance("u1", &session).await);
    assert_eq!(history.len(), 2);
    assert_eq!(
        history[0].worked_duration().map(|d| d.num_minutes()),
        Some(8 * 60 + 35)
    );

    let today = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
    let open = assert_ok!(client.open_record(today, &session).await);
    assert_eq!(open.unwrap().status, AttendanceStatus::CheckedIn);

    let yesterday = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
    assert!(assert_ok!(client.open_record(yesterday, &session).await).is_none());
}

#[tokio::test]
async fn test_remote_zones_come_from_geofenced_tracks() {
    let api = FakeApi::start().await;
    api.respond_ok(
        Method::GET,
        "/tracks/tracks",
        json!([
            {"id": "t1", "name": "Backend", "latitude": HQ_LAT, "longitude": HQ_LNG, "radius": 40},
            {"id": "t2", "name": "Design"}
        ]),
    );

    let zones = assert_ok!(api.client().remote_zones(&staff_session()).await);
    assert_eq!(zones, vec![Zone::new("t1", "Backend", HQ_LAT, HQ_LNG, 40.0)]);
}

#[tokio::test]
async fn test_manual_attendance_requires_admin() {
    let api = FakeApi::start().await;
    api.respond_ok(Method::POST, "/attendance/manual-checkin", json!({}));
    let request = ManualAttendanceRequest {
        email: "ada@example.com".into(),
        date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
        time: "09:15".into(),
    };
    let client = api.client();

    let err = assert_err!(
        client
            .manual_attendance(ManualAction::CheckIn, &request, &staff_session())
            .await
    );
    assert!(matches!(err, ClientError::AdminRequired));
    assert!(api.requests().is_empty());

    assert_ok!(
        client
            .manual_attendance(ManualAction::CheckIn, &request, &admin_session())
            .await
    );
    let sent = api.last_request();
    assert_eq!(sent.path, "/attendance/manual-checkin");
    assert_eq!(
        sent.body,
        json!({"email": "ada@example.com", "date": "2026-03-02", "time": "09:15"})
    );
}

// ============================================================================
// Flow tests against the fake API
// ============================================================================

#[tokio::test]
async fn test_check_in_flow_confirms_against_server() {
    let api = FakeApi::start().await;
    api.respond_ok(
        Method::POST,
        "/attendance/check-in",
        record_json("u1", "2026-03-02", None, "late"),
    );
    let gateway = Arc::new(SessionGateway::new(api.client(), staff_session()));
    let sensor = Arc::new(FixedSensor(LocationSample::new(HQ_LAT, HQ_LNG, 5.0)));
    let flow = CheckInFlow::new(sensor, gateway);

    let outcome = assert_ok!(flow.run(&[hq()], &CancellationToken::new()).await);

    let CheckInOutcome::Confirmed(record) = outcome else {
        panic!("expected confirmation, got {outcome:?}");
    };
    assert_eq!(record.status, AttendanceStatus::Late);
    assert_eq!(api.requests().len(), 1);
}

#[tokio::test]
async fn test_out_of_range_never_reaches_server() {
    let api = FakeApi::start().await;
    let gateway = Arc::new(SessionGateway::new(api.client(), staff_session()));
    let sensor = Arc::new(FixedSensor(LocationSample::new(HQ_LAT + 0.01, HQ_LNG, 0.0)));
    let flow = CheckInFlow::new(sensor, gateway);

    let outcome = assert_ok!(flow.run(&[hq()], &CancellationToken::new()).await);

    assert!(matches!(
        outcome,
        CheckInOutcome::Denied(CheckInFailure::OutOfRange(Some(_)))
    ));
    assert!(api.requests().is_empty());
}

#[tokio::test]
async fn test_check_in_flow_reports_server_reason() {
    let api = FakeApi::start().await;
    api.respond(
        Method::POST,
        "/attendance/check-in",
        StatusCode::CONFLICT,
        envelope_failure("You have already checked in today"),
    );
    let gateway = Arc::new(SessionGateway::new(api.client(), staff_session()));
    let sensor = Arc::new(FixedSensor(LocationSample::new(HQ_LAT, HQ_LNG, 0.0)));
    let flow = CheckInFlow::new(sensor, gateway);

    let outcome = assert_ok!(flow.run(&[hq()], &CancellationToken::new()).await);

    assert_eq!(
        outcome,
        CheckInOutcome::SubmitFailed(CheckInFailure::SubmissionFailed(
            "You have already checked in today".into()
        ))
    );
}

#[tokio::test]
async fn test_cancel_while_server_is_slow_never_confirms() {
    let api = FakeApi::start().await;
    api.respond_ok(
        Method::POST,
        "/attendance/check-in",
        record_json("u1", "2026-03-02", None, "on_time"),
    );
    api.delay(Duration::from_millis(300));
    let gateway = Arc::new(SessionGateway::new(api.client(), staff_session()));
    let sensor = Arc::new(FixedSensor(LocationSample::new(HQ_LAT, HQ_LNG, 0.0)));
    let flow = Arc::new(CheckInFlow::new(sensor, gateway));
    let cancel = CancellationToken::new();

    let task = {
        let flow = flow.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { flow.run(&[hq()], &cancel).await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;
    cancel.cancel();

    let outcome = assert_ok!(task.await.unwrap());
    assert_eq!(outcome, CheckInOutcome::Cancelled);
    assert_eq!(api.requests().len(), 1);
}

#[tokio::test]
async fn test_check_out_flow_against_server() {
    let api = FakeApi::start().await;
    api.respond_ok(
        Method::POST,
        "/attendance/check-out",
        record_json("u1", "2026-03-02", Some("2026-03-02T17:30:00Z"), "checked_out"),
    );
    let client = api.client();
    let open: AttendanceRecord =
        serde_json::from_value(record_json("u1", "2026-03-02", None, "checked_in")).unwrap();
    let flow = CheckOutFlow::new(Arc::new(SessionGateway::new(client, staff_session())));

    let result = assert_ok!(
        flow.run(Some(&open), NaiveTime::from_hms_opt(17, 30, 0).unwrap())
            .await
    );

    let closed = result.unwrap();
    assert!(!closed.is_open());
    assert_eq!(api.last_request().body, json!({"checkOutTime": "17:30"}));
}
