//! Check-out flow: `checked_in -> checking_out -> checked_out | checkout_failed`.
//!
//! No location is required to check out. Failures are never retried.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use chrono::NaiveTime;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::models::{AttendanceRecord, CheckOutRequest};

use super::check_in::{AttendanceGateway, FlowError, GatewayError, InFlightGuard};

/// Generic message used when the server gives no reason for a failure.
pub const CHECK_OUT_FALLBACK_MESSAGE: &str = "Check-out failed. Please try again.";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckOutFailure {
    #[error("You are not checked in today")]
    NotCheckedIn,

    #[error("{0}")]
    SubmissionFailed(String),
}

impl CheckOutFailure {
    pub fn submission(error: &GatewayError) -> Self {
        CheckOutFailure::SubmissionFailed(
            error
                .server_message()
                .filter(|m| !m.trim().is_empty())
                .unwrap_or(CHECK_OUT_FALLBACK_MESSAGE)
                .to_string(),
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CheckOutState {
    /// Nothing to check out from.
    NotCheckedIn,
    CheckedIn(AttendanceRecord),
    CheckingOut,
    CheckedOut(AttendanceRecord),
    CheckoutFailed(CheckOutFailure),
}

impl CheckOutState {
    pub fn name(&self) -> &'static str {
        match self {
            CheckOutState::NotCheckedIn => "not_checked_in",
            CheckOutState::CheckedIn(_) => "checked_in",
            CheckOutState::CheckingOut => "checking_out",
            CheckOutState::CheckedOut(_) => "checked_out",
            CheckOutState::CheckoutFailed(_) => "checkout_failed",
        }
    }
}

/// Drives check-out for one user session.
pub struct CheckOutFlow {
    gateway: Arc<dyn AttendanceGateway>,
    in_flight: AtomicBool,
    state: watch::Sender<CheckOutState>,
}

impl CheckOutFlow {
    pub fn new(gateway: Arc<dyn AttendanceGateway>) -> Self {
        let (state, _) = watch::channel(CheckOutState::NotCheckedIn);
        Self {
            gateway,
            in_flight: AtomicBool::new(false),
            state,
        }
    }

    pub fn state(&self) -> CheckOutState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<CheckOutState> {
        self.state.subscribe()
    }

    fn transition(&self, next: CheckOutState) {
        self.state.send_modify(|current| {
            debug!(from = current.name(), to = next.name(), "Check-out state change");
            *current = next;
        });
    }

    /// Checks out of `open` at wall-clock time `at`.
    ///
    /// `open` is today's record for the user, if any. Without an open record
    /// no request is sent.
    pub async fn run(
        &self,
        open: Option<&AttendanceRecord>,
        at: NaiveTime,
    ) -> Result<Result<AttendanceRecord, CheckOutFailure>, FlowError> {
        let _guard = InFlightGuard::acquire(&self.in_flight)?;

        let Some(record) = open.filter(|r| r.is_open()) else {
            self.transition(CheckOutState::NotCheckedIn);
            return Ok(Err(CheckOutFailure::NotCheckedIn));
        };

        self.transition(CheckOutState::CheckedIn(record.clone()));
        self.transition(CheckOutState::CheckingOut);

        match self.gateway.check_out(&CheckOutRequest::at(at)).await {
            Ok(updated) => {
                info!(user_id = %updated.user_id, "Check-out confirmed");
                self.transition(CheckOutState::CheckedOut(updated.clone()));
                Ok(Ok(updated))
            }
            Err(err) => {
                warn!(error = %err, "Check-out failed");
                let failure = CheckOutFailure::submission(&err);
                self.transition(CheckOutState::CheckoutFailed(failure.clone()));
                Ok(Err(failure))
            }
        }
    }
}
