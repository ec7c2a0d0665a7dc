//! Location domain model.

use chrono::{DateTime, Utc};
use geo::Point;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// A WGS84 coordinate pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl From<Coordinates> for Point<f64> {
    fn from(c: Coordinates) -> Self {
        // geo points are (x = longitude, y = latitude)
        Point::new(c.longitude, c.latitude)
    }
}

impl From<Point<f64>> for Coordinates {
    fn from(p: Point<f64>) -> Self {
        Self::new(p.y(), p.x())
    }
}

/// A single reading from the location sensor.
///
/// Samples are produced once per check-in attempt and never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LocationSample {
    #[validate(custom(function = "shared::validation::validate_latitude"))]
    pub latitude: f64,

    #[validate(custom(function = "shared::validation::validate_longitude"))]
    pub longitude: f64,

    /// Sensor-reported uncertainty radius in meters.
    #[validate(custom(function = "shared::validation::validate_accuracy"))]
    pub accuracy: f64,

    pub captured_at: DateTime<Utc>,
}

impl LocationSample {
    /// Creates a sample captured now.
    pub fn new(latitude: f64, longitude: f64, accuracy: f64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy,
            captured_at: Utc::now(),
        }
    }

    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinates_point_conversion() {
        let c = Coordinates::new(5.11883, 7.36927);
        let p: Point<f64> = c.into();
        assert_eq!(p.x(), 7.36927);
        assert_eq!(p.y(), 5.11883);
        assert_eq!(Coordinates::from(p), c);
    }

    #[test]
    fn test_location_sample_validation() {
        assert!(LocationSample::new(5.1, 7.3, 12.0).validate().is_ok());
        assert!(LocationSample::new(95.0, 7.3, 12.0).validate().is_err());
        assert!(LocationSample::new(5.1, 190.0, 12.0).validate().is_err());
        assert!(LocationSample::new(5.1, 7.3, -1.0).validate().is_err());
    }

    #[test]
    fn test_location_sample_deserialization() {
        let json = r#"{
            "latitude": 5.11883,
            "longitude": 7.36927,
            "accuracy": 8.5,
            "capturedAt": "2026-03-02T08:15:00Z"
        }"#;
        let sample: LocationSample = serde_json::from_str(json).unwrap();
        assert_eq!(sample.accuracy, 8.5);
        assert_eq!(sample.coordinates(), Coordinates::new(5.11883, 7.36927));
    }
}
