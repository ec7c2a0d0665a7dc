//! Attendance endpoints.

use chrono::NaiveDate;
use domain::models::attendance::{find_open_record, ManualAction, ManualAttendanceRequest};
use domain::models::{AttendanceRecord, CheckInRequest, CheckOutRequest, Session};
use domain::services::{AttendanceGateway, GatewayError};
use tracing::info;
use validator::Validate;

use crate::error::ClientError;
use crate::http::ApiClient;

impl ApiClient {
    /// `POST /attendance/check-in`.
    pub async fn check_in(
        &self,
        request: &CheckInRequest,
        session: &Session,
    ) -> Result<AttendanceRecord, ClientError> {
        self.post("attendance.check_in", "/attendance/check-in", request, session)
            .await
    }

    /// `POST /attendance/check-out`.
    pub async fn check_out(
        &self,
        request: &CheckOutRequest,
        session: &Session,
    ) -> Result<AttendanceRecord, ClientError> {
        self.post("attendance.check_out", "/attendance/check-out", request, session)
            .await
    }

    /// All records of one user.
    pub async fn user_attendance(
        &self,
        user_id: &str,
        session: &Session,
    ) -> Result<Vec<AttendanceRecord>, ClientError> {
        let path = format!("/attendance/attendance/users/{}", user_id);
        self.get("attendance.user", &path, session).await
    }

    /// Today's records across all users.
    pub async fn today_attendance(
        &self,
        session: &Session,
    ) -> Result<Vec<AttendanceRecord>, ClientError> {
        self.get("attendance.today", "/attendance/today", session).await
    }

    /// The signed-in user's open record for `date`, if any.
    pub async fn open_record(
        &self,
        date: NaiveDate,
        session: &Session,
    ) -> Result<Option<AttendanceRecord>, ClientError> {
        let user = session.user().ok_or(ClientError::NotAuthenticated)?;
        let records = self.user_attendance(&user.id, session).await?;
        Ok(find_open_record(&records, &user.id, date).cloned())
    }

    /// Administrator correction: check a user in or out by email.
    pub async fn manual_attendance(
        &self,
        action: ManualAction,
        request: &ManualAttendanceRequest,
        session: &Session,
    ) -> Result<Option<String>, ClientError> {
        if !session.is_admin() {
            return Err(ClientError::AdminRequired);
        }
        request.validate()?;

        let endpoint = match action {
            ManualAction::CheckIn => "attendance.manual_checkin",
            ManualAction::CheckOut => "attendance.manual_checkout",
        };
        let message = self
            .post_ack(endpoint, action.path(), request, Some(session))
            .await?;
        info!(email = %request.email, date = %request.date, ?action, "Manual attendance recorded");
        Ok(message)
    }
}

/// [`AttendanceGateway`] bound to one session.
#[derive(Debug, Clone)]
pub struct SessionGateway {
    api: ApiClient,
    session: Session,
}

impl SessionGateway {
    pub fn new(api: ApiClient, session: Session) -> Self {
        Self { api, session }
    }
}

#[async_trait::async_trait]
impl AttendanceGateway for SessionGateway {
    async fn check_in(&self, request: &CheckInRequest) -> Result<AttendanceRecord, GatewayError> {
        Ok(self.api.check_in(request, &self.session).await?)
    }

    async fn check_out(
        &self,
        request: &CheckOutRequest,
    ) -> Result<AttendanceRecord, GatewayError> {
        Ok(self.api.check_out(request, &self.session).await?)
    }
}
