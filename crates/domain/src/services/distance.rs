//! Great-circle distance between WGS84 coordinates.

use geo::Point;

/// Mean Earth radius used for all distance math, in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Haversine distance in meters between two points.
///
/// Points are `(x = longitude, y = latitude)` in degrees. Inputs are not
/// range-checked; out-of-range coordinates give a defined but meaningless
/// result.
pub fn haversine_distance(from: impl Into<Point<f64>>, to: impl Into<Point<f64>>) -> f64 {
    let (from, to) = (from.into(), to.into());

    let phi1 = from.y().to_radians();
    let phi2 = to.y().to_radians();
    let d_phi = (to.y() - from.y()).to_radians();
    let d_lambda = (to.x() - from.x()).to_radians();

    let a = (d_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    // Rounding can push `a` marginally outside [0, 1] for antipodal points.
    let a = a.clamp(0.0, 1.0);

    2.0 * EARTH_RADIUS_METERS * a.sqrt().atan2((1.0 - a).sqrt())
}
