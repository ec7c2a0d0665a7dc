//! Location sensor backed by a fix supplied on the command line.

use domain::models::LocationSample;
use domain::services::{LocationSensor, SensorError};

/// Reports the same reading on every request, captured when asked.
#[derive(Debug, Clone, Copy)]
pub struct FixedLocationSensor {
    latitude: f64,
    longitude: f64,
    accuracy: f64,
}

impl FixedLocationSensor {
    pub fn new(latitude: f64, longitude: f64, accuracy: f64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy,
        }
    }
}

#[async_trait::async_trait]
impl LocationSensor for FixedLocationSensor {
    async fn current_position(&self) -> Result<LocationSample, SensorError> {
        if !(self.latitude.is_finite() && self.longitude.is_finite()) {
            return Err(SensorError::PositionUnavailable);
        }
        Ok(LocationSample::new(self.latitude, self.longitude, self.accuracy))
    }
}
