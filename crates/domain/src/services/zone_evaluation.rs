//! Zone membership evaluation.
//!
//! A zone admits a sample when the distance from the sample to the zone centre
//! is at most the zone radius plus the sample's reported accuracy. Sensor
//! uncertainty is always resolved in the user's favour.

use std::cmp::Ordering;

use crate::models::{LocationSample, Zone};

use super::distance::haversine_distance;

/// A zone that admitted the sample.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneMatch {
    pub zone: Zone,
    /// Distance from the sample to the zone centre, in meters.
    pub distance_meters: f64,
}

/// The zone that came closest to admitting a denied sample.
#[derive(Debug, Clone, PartialEq)]
pub struct NearestMiss {
    pub zone: Zone,
    pub distance_meters: f64,
    /// `distance - radius`, in meters. Positive for a genuine miss.
    pub overshoot_meters: f64,
}

impl NearestMiss {
    /// Overshoot rounded to the nearest whole meter, for display.
    pub fn rounded_overshoot(&self) -> i64 {
        self.overshoot_meters.round() as i64
    }
}

/// Result of evaluating one sample against every known zone.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ZoneEvaluation {
    /// Admitting zones, best first: closest centre, then lowest id.
    pub admitted: Vec<ZoneMatch>,
    /// Present only when nothing admitted and at least one zone exists.
    pub nearest_miss: Option<NearestMiss>,
}

impl ZoneEvaluation {
    pub fn is_admitted(&self) -> bool {
        !self.admitted.is_empty()
    }

    /// The zone the check-in is attributed to.
    pub fn best(&self) -> Option<&ZoneMatch> {
        self.admitted.first()
    }
}

/// Returns true when `zone` admits a sample `distance_meters` from its centre.
pub fn admits(zone: &Zone, sample: &LocationSample, distance_meters: f64) -> bool {
    distance_meters <= zone.radius_meters + sample.accuracy
}

/// Evaluates `sample` against `zones`.
///
/// Pure and allocation-light; safe to call concurrently for independent inputs.
pub fn evaluate_zones(sample: &LocationSample, zones: &[Zone]) -> ZoneEvaluation {
    let here = sample.coordinates();

    let mut admitted = Vec::new();
    let mut nearest: Option<NearestMiss> = None;

    for zone in zones {
        let distance = haversine_distance(here, zone.center());

        if admits(zone, sample, distance) {
            admitted.push(ZoneMatch {
                zone: zone.clone(),
                distance_meters: distance,
            });
            continue;
        }

        let overshoot = distance - zone.radius_meters;
        let closer = match &nearest {
            None => true,
            Some(current) => match overshoot.total_cmp(&current.overshoot_meters) {
                Ordering::Less => true,
                Ordering::Equal => zone.id < current.zone.id,
                Ordering::Greater => false,
            },
        };
        if closer {
            nearest = Some(NearestMiss {
                zone: zone.clone(),
                distance_meters: distance,
                overshoot_meters: overshoot,
            });
        }
    }

    if admitted.is_empty() {
        return ZoneEvaluation {
            admitted,
            nearest_miss: nearest,
        };
    }

    admitted.sort_by(|a, b| {
        a.distance_meters
            .total_cmp(&b.distance_meters)
            .then_with(|| a.zone.id.cmp(&b.zone.id))
    });

    ZoneEvaluation {
        admitted,
        nearest_miss: None,
    }
}
