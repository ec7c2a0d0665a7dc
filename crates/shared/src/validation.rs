//! Common validation utilities.

use chrono::NaiveTime;
use validator::ValidationError;

/// Largest zone radius accepted from configuration (50 km).
pub const MAX_ZONE_RADIUS_METERS: f64 = 50_000.0;

/// Validates that a latitude value is within valid range (-90 to 90).
pub fn validate_latitude(lat: f64) -> Result<(), ValidationError> {
    if (-90.0..=90.0).contains(&lat) {
        Ok(())
    } else {
        let mut err = ValidationError::new("latitude_range");
        err.message = Some("Latitude must be between -90 and 90".into());
        Err(err)
    }
}

/// Validates that a longitude value is within valid range (-180 to 180).
pub fn validate_longitude(lon: f64) -> Result<(), ValidationError> {
    if (-180.0..=180.0).contains(&lon) {
        Ok(())
    } else {
        let mut err = ValidationError::new("longitude_range");
        err.message = Some("Longitude must be between -180 and 180".into());
        Err(err)
    }
}

/// Validates that a sensor accuracy radius is a finite, non-negative number of meters.
pub fn validate_accuracy(accuracy: f64) -> Result<(), ValidationError> {
    if accuracy.is_finite() && accuracy >= 0.0 {
        Ok(())
    } else {
        let mut err = ValidationError::new("accuracy_range");
        err.message = Some("Accuracy must be non-negative".into());
        Err(err)
    }
}

/// Validates that a zone radius is positive and below [`MAX_ZONE_RADIUS_METERS`].
pub fn validate_radius(radius: f64) -> Result<(), ValidationError> {
    if radius > 0.0 && radius <= MAX_ZONE_RADIUS_METERS {
        Ok(())
    } else {
        let mut err = ValidationError::new("radius_range");
        err.message = Some("Radius must be greater than 0 and at most 50000 meters".into());
        Err(err)
    }
}

/// Validates that a string is not empty after trimming.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("Value must not be blank".into());
        Err(err)
    } else {
        Ok(())
    }
}

/// Validates a wall-clock time in `HH:MM` form, as used by manual attendance entries.
pub fn validate_time_of_day(value: &str) -> Result<(), ValidationError> {
    match NaiveTime::parse_from_str(value, "%H:%M") {
        Ok(_) => Ok(()),
        Err(_) => {
            let mut err = ValidationError::new("time_format");
            err.message = Some("Time must be in HH:MM format".into());
            Err(err)
        }
    }
}
