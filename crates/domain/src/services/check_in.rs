//! Geofence-gated check-in flow.
//!
//! One attempt walks through:
//!
//! ```text
//! idle -> acquiring_location -> evaluating -> admitted -> submitting -> confirmed
//!                  |                  |                        |
//!                  +-> denied <-------+                        +-> submit_failed
//! ```
//!
//! Any non-terminal state may end in `cancelled` when the caller cancels the
//! attempt. Nothing is retried automatically: a new attempt re-acquires the
//! location from scratch.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use thiserror::Error;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use validator::Validate;

use crate::models::{AttendanceRecord, CheckInRequest, CheckOutRequest, LocationSample, Zone};

use super::zone_evaluation::{evaluate_zones, NearestMiss};

/// Default time allowed for acquiring a location fix.
pub const DEFAULT_SENSOR_TIMEOUT: Duration = Duration::from_secs(10);

/// Generic message used when the server gives no reason for a failure.
pub const SUBMISSION_FALLBACK_MESSAGE: &str = "Check-in failed. Please try again.";

// ============================================================================
// Collaborators
// ============================================================================

/// Failures reported by the location sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SensorError {
    #[error("Location permission denied")]
    PermissionDenied,

    #[error("Position unavailable")]
    PositionUnavailable,

    #[error("Timed out waiting for a location fix")]
    Timeout,
}

/// Source of location samples.
#[async_trait::async_trait]
pub trait LocationSensor: Send + Sync {
    /// Produces one fresh sample.
    async fn current_position(&self) -> Result<LocationSample, SensorError>;
}

/// Failures reported by the remote system of record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// The server answered with `success: false`.
    #[error("{}", .0.as_deref().unwrap_or("Request was rejected"))]
    Rejected(Option<String>),

    /// The request never produced a usable answer.
    #[error("Network error: {0}")]
    Transport(String),
}

impl GatewayError {
    /// The server-provided reason, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            GatewayError::Rejected(message) => message.as_deref(),
            GatewayError::Transport(_) => None,
        }
    }
}

/// The remote attendance API as seen by the flows.
#[async_trait::async_trait]
pub trait AttendanceGateway: Send + Sync {
    async fn check_in(&self, request: &CheckInRequest) -> Result<AttendanceRecord, GatewayError>;

    async fn check_out(&self, request: &CheckOutRequest)
        -> Result<AttendanceRecord, GatewayError>;
}

// ============================================================================
// Failures
// ============================================================================

/// Nearest-miss details attached to an out-of-range denial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissDetail {
    pub zone_name: String,
    /// Meters beyond the zone boundary, rounded to the nearest integer.
    pub overshoot_meters: i64,
}

impl From<&NearestMiss> for MissDetail {
    fn from(miss: &NearestMiss) -> Self {
        Self {
            zone_name: miss.zone.name.clone(),
            overshoot_meters: miss.rounded_overshoot(),
        }
    }
}

/// Terminal failures of a check-in attempt, with user-facing messages.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckInFailure {
    #[error("Location permission denied. Please enable location access in your device settings.")]
    SensorPermissionDenied,

    #[error("Unable to get your location. Please ensure location services are enabled.")]
    SensorUnavailable,

    #[error("Timed out while getting your location. Please try again.")]
    SensorTimeout,

    #[error("{}", out_of_range_message(.0.as_ref()))]
    OutOfRange(Option<MissDetail>),

    #[error("{0}")]
    SubmissionFailed(String),
}

fn out_of_range_message(detail: Option<&MissDetail>) -> String {
    match detail {
        Some(d) => format!(
            "You are {} meters away from {}. Please move closer to check in.",
            d.overshoot_meters, d.zone_name
        ),
        None => "No check-in locations are configured.".to_string(),
    }
}

impl CheckInFailure {
    /// Text shown to the user for this failure.
    pub fn user_message(&self) -> String {
        self.to_string()
    }

    /// Coarse classification used in logs.
    pub fn reason(&self) -> &'static str {
        match self {
            CheckInFailure::SensorPermissionDenied
            | CheckInFailure::SensorUnavailable
            | CheckInFailure::SensorTimeout => "sensor_error",
            CheckInFailure::OutOfRange(_) => "out_of_range",
            CheckInFailure::SubmissionFailed(_) => "submit_failed",
        }
    }

    /// Whether retrying straight away can succeed without user intervention
    /// outside the application.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, CheckInFailure::SensorPermissionDenied)
    }

    /// Builds a submission failure, preferring the server's own reason.
    pub fn submission(error: &GatewayError) -> Self {
        CheckInFailure::SubmissionFailed(
            error
                .server_message()
                .filter(|m| !m.trim().is_empty())
                .unwrap_or(SUBMISSION_FALLBACK_MESSAGE)
                .to_string(),
        )
    }
}

impl From<SensorError> for CheckInFailure {
    fn from(err: SensorError) -> Self {
        match err {
            SensorError::PermissionDenied => CheckInFailure::SensorPermissionDenied,
            SensorError::PositionUnavailable => CheckInFailure::SensorUnavailable,
            SensorError::Timeout => CheckInFailure::SensorTimeout,
        }
    }
}

/// Errors that prevent an attempt from starting at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FlowError {
    #[error("An attendance action is already in progress")]
    AlreadyInProgress,
}

// ============================================================================
// State machine
// ============================================================================

/// A sample that passed zone evaluation, with the zone it is attributed to.
#[derive(Debug, Clone, PartialEq)]
pub struct Admission {
    pub zone: Zone,
    pub distance_meters: f64,
    pub sample: LocationSample,
}

/// Observable state of the check-in flow.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckInState {
    Idle,
    AcquiringLocation,
    Evaluating(LocationSample),
    Admitted(Admission),
    Denied(CheckInFailure),
    Submitting(Admission),
    Confirmed(AttendanceRecord),
    SubmitFailed(CheckInFailure),
    Cancelled,
}

impl CheckInState {
    pub fn name(&self) -> &'static str {
        match self {
            CheckInState::Idle => "idle",
            CheckInState::AcquiringLocation => "acquiring_location",
            CheckInState::Evaluating(_) => "evaluating",
            CheckInState::Admitted(_) => "admitted",
            CheckInState::Denied(_) => "denied",
            CheckInState::Submitting(_) => "submitting",
            CheckInState::Confirmed(_) => "confirmed",
            CheckInState::SubmitFailed(_) => "submit_failed",
            CheckInState::Cancelled => "cancelled",
        }
    }

    /// Terminal states end an attempt; a new one starts from `Idle`.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CheckInState::Denied(_)
                | CheckInState::Confirmed(_)
                | CheckInState::SubmitFailed(_)
                | CheckInState::Cancelled
        )
    }

    /// While busy, the caller must not offer a new attempt.
    pub fn is_busy(&self) -> bool {
        !self.is_terminal() && *self != CheckInState::Idle
    }

    /// Whether `self -> next` is a legal transition.
    pub fn can_transition_to(&self, next: &CheckInState) -> bool {
        use CheckInState::*;
        match (self, next) {
            (_, Cancelled) => !self.is_terminal() && *self != Idle,
            (Idle, AcquiringLocation) => true,
            (AcquiringLocation, Evaluating(_)) | (AcquiringLocation, Denied(_)) => true,
            (Evaluating(_), Admitted(_)) | (Evaluating(_), Denied(_)) => true,
            (Admitted(_), Submitting(_)) => true,
            (Submitting(_), Confirmed(_)) | (Submitting(_), SubmitFailed(_)) => true,
            (current, Idle) => current.is_terminal(),
            _ => false,
        }
    }
}

/// How an attempt ended.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckInOutcome {
    Confirmed(AttendanceRecord),
    Denied(CheckInFailure),
    SubmitFailed(CheckInFailure),
    Cancelled,
}

impl CheckInOutcome {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, CheckInOutcome::Confirmed(_))
    }

    /// The failure behind a non-confirmed, non-cancelled outcome.
    pub fn failure(&self) -> Option<&CheckInFailure> {
        match self {
            CheckInOutcome::Denied(f) | CheckInOutcome::SubmitFailed(f) => Some(f),
            _ => None,
        }
    }
}

/// Holds the single-flight flag for the lifetime of an attempt.
pub(crate) struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    pub(crate) fn acquire(flag: &'a AtomicBool) -> Result<Self, FlowError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| Self(flag))
            .map_err(|_| FlowError::AlreadyInProgress)
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

// ============================================================================
// Flow
// ============================================================================

/// Drives check-in attempts for one user session.
pub struct CheckInFlow {
    sensor: Arc<dyn LocationSensor>,
    gateway: Arc<dyn AttendanceGateway>,
    sensor_timeout: Duration,
    in_flight: AtomicBool,
    state: watch::Sender<CheckInState>,
}

impl CheckInFlow {
    pub fn new(sensor: Arc<dyn LocationSensor>, gateway: Arc<dyn AttendanceGateway>) -> Self {
        let (state, _) = watch::channel(CheckInState::Idle);
        Self {
            sensor,
            gateway,
            sensor_timeout: DEFAULT_SENSOR_TIMEOUT,
            in_flight: AtomicBool::new(false),
            state,
        }
    }

    pub fn with_sensor_timeout(mut self, timeout: Duration) -> Self {
        self.sensor_timeout = timeout;
        self
    }

    /// Current state.
    pub fn state(&self) -> CheckInState {
        self.state.borrow().clone()
    }

    /// Receiver that observes every state change.
    pub fn subscribe(&self) -> watch::Receiver<CheckInState> {
        self.state.subscribe()
    }

    fn transition(&self, next: CheckInState) {
        self.state.send_modify(|current| {
            debug_assert!(
                current.can_transition_to(&next),
                "illegal check-in transition {} -> {}",
                current.name(),
                next.name()
            );
            debug!(from = current.name(), to = next.name(), "Check-in state change");
            *current = next;
        });
    }

    /// Runs one attempt against `zones`.
    ///
    /// Returns `FlowError::AlreadyInProgress` if another attempt is running.
    /// Cancelling `cancel` stops the attempt; a result that arrives after
    /// cancellation is discarded.
    pub async fn run(
        &self,
        zones: &[Zone],
        cancel: &CancellationToken,
    ) -> Result<CheckInOutcome, FlowError> {
        let _guard = InFlightGuard::acquire(&self.in_flight)?;

        if self.state.borrow().is_terminal() {
            self.transition(CheckInState::Idle);
        }
        self.transition(CheckInState::AcquiringLocation);

        let sample = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(self.cancelled()),
            reading = tokio::time::timeout(self.sensor_timeout, self.sensor.current_position()) => {
                match reading {
                    Ok(Ok(sample)) => sample,
                    Ok(Err(err)) => return Ok(self.deny(err.into())),
                    Err(_) => return Ok(self.deny(CheckInFailure::SensorTimeout)),
                }
            }
        };

        if let Err(errors) = sample.validate() {
            warn!(error = %errors, "Sensor produced an invalid sample");
            return Ok(self.deny(CheckInFailure::SensorUnavailable));
        }

        self.transition(CheckInState::Evaluating(sample));
        let evaluation = evaluate_zones(&sample, zones);

        let Some(best) = evaluation.best() else {
            let detail = evaluation.nearest_miss.as_ref().map(MissDetail::from);
            return Ok(self.deny(CheckInFailure::OutOfRange(detail)));
        };

        let admission = Admission {
            zone: best.zone.clone(),
            distance_meters: best.distance_meters,
            sample,
        };
        info!(
            zone_id = %admission.zone.id,
            distance_meters = admission.distance_meters,
            accuracy = sample.accuracy,
            "Location admitted"
        );
        self.transition(CheckInState::Admitted(admission.clone()));

        if cancel.is_cancelled() {
            return Ok(self.cancelled());
        }

        let request = CheckInRequest {
            latitude: sample.latitude,
            longitude: sample.longitude,
            login_time: Utc::now(),
            zone_id: admission.zone.id.clone(),
        };
        self.transition(CheckInState::Submitting(admission));

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(self.cancelled()),
            result = self.gateway.check_in(&request) => result,
        };

        // Cancellation can race the response; never apply a late result.
        if cancel.is_cancelled() {
            debug!(succeeded = result.is_ok(), "Discarding check-in result after cancellation");
            return Ok(self.cancelled());
        }

        match result {
            Ok(record) => {
                info!(user_id = %record.user_id, status = %record.status, "Check-in confirmed");
                self.transition(CheckInState::Confirmed(record.clone()));
                Ok(CheckInOutcome::Confirmed(record))
            }
            Err(err) => {
                warn!(error = %err, "Check-in submission failed");
                let failure = CheckInFailure::submission(&err);
                self.transition(CheckInState::SubmitFailed(failure.clone()));
                Ok(CheckInOutcome::SubmitFailed(failure))
            }
        }
    }

    fn deny(&self, failure: CheckInFailure) -> CheckInOutcome {
        warn!(reason = failure.reason(), message = %failure, "Check-in denied");
        self.transition(CheckInState::Denied(failure.clone()));
        CheckInOutcome::Denied(failure)
    }

    fn cancelled(&self) -> CheckInOutcome {
        info!("Check-in cancelled");
        self.transition(CheckInState::Cancelled);
        CheckInOutcome::Cancelled
    }
}
