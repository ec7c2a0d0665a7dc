//! Zone (geofenced check-in site) domain model.

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::location::Coordinates;

/// A named circular geofence eligible for check-in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Zone {
    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    pub id: String,

    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    #[validate(custom(function = "shared::validation::validate_latitude"))]
    pub latitude: f64,

    #[validate(custom(function = "shared::validation::validate_longitude"))]
    pub longitude: f64,

    /// Admission boundary in meters.
    #[serde(rename = "radius")]
    #[validate(custom(function = "shared::validation::validate_radius"))]
    pub radius_meters: f64,
}

impl Zone {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        latitude: f64,
        longitude: f64,
        radius_meters: f64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            latitude,
            longitude,
            radius_meters,
        }
    }

    pub fn center(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }
}

/// A track as returned by the remote tracks endpoint.
///
/// Tracks double as zone configuration; only tracks that carry a full
/// coordinate and radius can be turned into a [`Zone`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
}

impl Track {
    /// Converts the track into a zone if it is geofenced and valid.
    pub fn to_zone(&self) -> Option<Zone> {
        let zone = Zone::new(
            self.id.clone(),
            self.name.clone(),
            self.latitude?,
            self.longitude?,
            self.radius?,
        );
        zone.validate().ok().map(|_| zone)
    }
}

/// Request payload for creating a track.
#[derive(Debug, Clone, Serialize, Validate)]
pub struct CreateTrackRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zone_deserialization_uses_radius_key() {
        let json = r#"{
            "id": "hq",
            "name": "Head Office",
            "latitude": 5.11883,
            "longitude": 7.36927,
            "radius": 15
        }"#;
        let zone: Zone = serde_json::from_str(json).unwrap();
        assert_eq!(zone.radius_meters, 15.0);
        assert_eq!(zone.center(), Coordinates::new(5.11883, 7.36927));
    }

    #[test]
    fn test_zone_validation() {
        assert!(Zone::new("hq", "Head Office", 5.1, 7.3, 15.0).validate().is_ok());
        assert!(Zone::new("hq", "Head Office", 5.1, 7.3, 0.0).validate().is_err());
        assert!(Zone::new(" ", "Head Office", 5.1, 7.3, 15.0).validate().is_err());
        assert!(Zone::new("hq", "", 5.1, 7.3, 15.0).validate().is_err());
        assert!(Zone::new("hq", "Head Office", 91.0, 7.3, 15.0).validate().is_err());
    }

    #[test]
    fn test_track_to_zone() {
        let track = Track {
            id: "t1".into(),
            name: "Backend".into(),
            latitude: Some(5.11883),
            longitude: Some(7.36927),
            radius: Some(40.0),
        };
        let zone = track.to_zone().unwrap();
        assert_eq!(zone.id, "t1");
        assert_eq!(zone.radius_meters, 40.0);
    }

    #[test]
    fn test_track_without_geofence_is_not_a_zone() {
        let json = r#"{"id": "t2", "name": "Design"}"#;
        let track: Track = serde_json::from_str(json).unwrap();
        assert!(track.to_zone().is_none());
    }

    #[test]
    fn test_track_with_invalid_radius_is_not_a_zone() {
        let track = Track {
            id: "t3".into(),
            name: "Mobile".into(),
            latitude: Some(5.1),
            longitude: Some(7.3),
            radius: Some(-3.0),
        };
        assert!(track.to_zone().is_none());
    }
}
