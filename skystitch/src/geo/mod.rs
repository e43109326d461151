//! Geographic bounding-box generation
//!
//! Turns a center point plus an arc-length radius into the two opposite
//! corners that drive tile selection. The math is a small-angle offset on
//! the sphere: convert the center to radians, add/subtract
//! `arc_length / sphere_radius` on both axes, convert back to degrees.

use crate::coord::GeoPoint;

/// Sphere radius used for the corner offset, in miles.
///
/// The historical formula divides a kilometre arc length by this
/// miles-calibrated radius, which inflates boxes by about 1.6x. The
/// behaviour is kept for compatibility with existing outputs; callers
/// that want self-consistent units can pass [`EARTH_RADIUS_KM`] to
/// [`BoundingBox::around_with_radius`] instead.
pub const EARTH_RADIUS_MILES: f64 = 3963.0;

/// Mean Earth radius in kilometres, for unit-consistent bounding boxes.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Arc-length radius in kilometres used when the caller does not specify one.
pub const DEFAULT_ARC_LENGTH_KM: f64 = 0.15;

/// An axis-aligned geographic bounding box.
///
/// Holds the north-west and south-east corners; by construction
/// `upper_left.lat >= lower_right.lat` and
/// `upper_left.lon <= lower_right.lon`. Created once per retrieval
/// request and never mutated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub upper_left: GeoPoint,
    pub lower_right: GeoPoint,
}

impl BoundingBox {
    /// Builds the box around `center` with the given arc-length radius in
    /// kilometres, using the compatibility sphere radius
    /// ([`EARTH_RADIUS_MILES`] — see its docs for the unit caveat).
    pub fn around(center: GeoPoint, arc_length_km: f64) -> Self {
        Self::around_with_radius(center, arc_length_km, EARTH_RADIUS_MILES)
    }

    /// Builds the box around `center` with an explicit sphere radius.
    ///
    /// `arc_length` and `sphere_radius` must share a unit for the offset
    /// to be geometrically exact.
    pub fn around_with_radius(center: GeoPoint, arc_length: f64, sphere_radius: f64) -> Self {
        let lat_rad = center.lat.to_radians();
        let lon_rad = center.lon.to_radians();
        let delta = arc_length / sphere_radius;

        Self {
            upper_left: GeoPoint::new(
                (lat_rad + delta).to_degrees(),
                (lon_rad - delta).to_degrees(),
            ),
            lower_right: GeoPoint::new(
                (lat_rad - delta).to_degrees(),
                (lon_rad + delta).to_degrees(),
            ),
        }
    }
}
