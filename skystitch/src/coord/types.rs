//! Coordinate type definitions

use std::fmt;

/// Web Mercator valid latitude range
pub const MIN_LAT: f64 = -85.05112878;
pub const MAX_LAT: f64 = 85.05112878;

/// Valid longitude range
pub const MIN_LON: f64 = -180.0;
pub const MAX_LON: f64 = 180.0;

/// Zoom levels supported by the tile pyramid.
///
/// Level 1 is the coarsest level that still subdivides the map; level 23
/// is the finest level the quadkey scheme addresses. Providers usually
/// advertise a lower maximum through their session metadata.
pub const MIN_LEVEL: u8 = 1;
pub const MAX_LEVEL: u8 = 23;

/// Side length of a pyramid tile in pixels.
pub const TILE_SIZE: u32 = 256;

/// Earth radius in meters, as used by the Web Mercator ground-resolution
/// formula (WGS-84 semi-major axis).
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// A geographic point in WGS-84 degrees.
///
/// Immutable value type; latitude grows northward, longitude eastward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    /// Latitude in degrees, nominally within [-90, 90]
    pub lat: f64,
    /// Longitude in degrees, nominally within [-180, 180]
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lon)
    }
}

/// Absolute pixel coordinates on the map at some zoom level.
///
/// Valid range is `[0, map_size(level) - 1]` on each axis; `u64` because
/// the map spans 2^31 pixels at the finest level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixelPoint {
    pub x: u64,
    pub y: u64,
}

/// Tile coordinates in the quadtree pyramid.
///
/// `x` grows eastward, `y` southward, both starting at 0 in the
/// north-west corner. Valid range at level `z` is `[0, 2^z)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileIndex {
    pub x: u32,
    pub y: u32,
}

/// Errors that can occur during coordinate conversion.
#[derive(Debug, Clone, PartialEq)]
pub enum CoordError {
    /// Quadkey is empty, too long, or contains a non-base-4 digit
    InvalidQuadkey(String),
}

impl fmt::Display for CoordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordError::InvalidQuadkey(quadkey) => {
                write!(
                    f,
                    "Invalid quadkey: '{}' (must be 1-{} base-4 digits)",
                    quadkey, MAX_LEVEL
                )
            }
        }
    }
}

impl std::error::Error for CoordError {}
