//! Tile-pyramid coordinate algebra
//!
//! Conversions between WGS-84 geographic coordinates, absolute pixel
//! coordinates, tile indices and quadkeys for the Bing/Web Mercator tile
//! scheme. Every function here is pure and deterministic; the rounding
//! behaviour of `geo_to_pixel` (clip, add 0.5, truncate toward zero)
//! matches the provider's published tile system exactly, which is what
//! keeps tile selection bit-compatible with the service.

mod types;

pub use types::{
    CoordError, GeoPoint, PixelPoint, TileIndex, EARTH_RADIUS_M, MAX_LAT, MAX_LEVEL, MAX_LON,
    MIN_LAT, MIN_LEVEL, MIN_LON, TILE_SIZE,
};

use std::f64::consts::PI;

/// Clamps `n` to the inclusive range `[lo, hi]`.
#[inline]
pub fn clip(n: f64, lo: f64, hi: f64) -> f64 {
    n.max(lo).min(hi)
}

/// Map width and height in pixels at the given zoom level.
///
/// The map is square: `256 << level` pixels per side.
#[inline]
pub fn map_size(level: u8) -> u64 {
    (TILE_SIZE as u64) << level
}

/// Ground resolution in meters per pixel at the given latitude and level.
pub fn ground_resolution(lat: f64, level: u8) -> f64 {
    let lat = clip(lat, MIN_LAT, MAX_LAT);
    (lat * PI / 180.0).cos() * 2.0 * PI * EARTH_RADIUS_M / map_size(level) as f64
}

/// Map scale denominator (the N of 1 : N) at the given latitude, level
/// and screen resolution in dots per inch.
pub fn map_scale(lat: f64, level: u8, screen_dpi: f64) -> f64 {
    ground_resolution(lat, level) * screen_dpi / 0.0254
}

/// Converts a geographic point to absolute pixel coordinates at a level.
///
/// Latitude is clipped to the Mercator-projectable range, longitude to
/// [-180, 180]; out-of-range inputs therefore land on pixel 0 or
/// `map_size - 1` rather than failing.
pub fn geo_to_pixel(point: GeoPoint, level: u8) -> PixelPoint {
    let lat = clip(point.lat, MIN_LAT, MAX_LAT);
    let lon = clip(point.lon, MIN_LON, MAX_LON);

    let x = (lon + 180.0) / 360.0;
    let sin_lat = (lat * PI / 180.0).sin();
    let y = 0.5 - ((1.0 + sin_lat) / (1.0 - sin_lat)).ln() / (4.0 * PI);

    // Truncation (not rounding) after the +0.5 bias is deliberate.
    let size = map_size(level) as f64;
    PixelPoint {
        x: clip(x * size + 0.5, 0.0, size - 1.0) as u64,
        y: clip(y * size + 0.5, 0.0, size - 1.0) as u64,
    }
}

/// Converts absolute pixel coordinates at a level back to a geographic
/// point. Inverse of [`geo_to_pixel`] up to pixel quantisation.
pub fn pixel_to_geo(pixel: PixelPoint, level: u8) -> GeoPoint {
    let size = map_size(level) as f64;
    let x = clip(pixel.x as f64, 0.0, size - 1.0) / size - 0.5;
    let y = 0.5 - clip(pixel.y as f64, 0.0, size - 1.0) / size;

    GeoPoint {
        lat: 90.0 - 360.0 * (-y * 2.0 * PI).exp().atan() / PI,
        lon: 360.0 * x,
    }
}

/// Tile index of the tile containing the given pixel.
#[inline]
pub fn pixel_to_tile(pixel: PixelPoint) -> TileIndex {
    TileIndex {
        x: (pixel.x / TILE_SIZE as u64) as u32,
        y: (pixel.y / TILE_SIZE as u64) as u32,
    }
}

/// Pixel coordinates of the north-west corner of the given tile.
#[inline]
pub fn tile_to_pixel(tile: TileIndex) -> PixelPoint {
    PixelPoint {
        x: tile.x as u64 * TILE_SIZE as u64,
        y: tile.y as u64 * TILE_SIZE as u64,
    }
}

/// Encodes a tile index at a level as a quadkey.
///
/// One base-4 digit per level, most significant quadrant first. Each
/// digit interleaves the Y bit (weight 2) before the X bit (weight 1),
/// so digit = 2 * y_bit + x_bit.
pub fn tile_to_quadkey(tile: TileIndex, level: u8) -> String {
    let mut key = String::with_capacity(level as usize);
    for i in (1..=level).rev() {
        let mask = 1u32 << (i - 1);
        let mut digit = b'0';
        if tile.x & mask != 0 {
            digit += 1;
        }
        if tile.y & mask != 0 {
            digit += 2;
        }
        key.push(digit as char);
    }
    key
}

/// Decodes a quadkey into its tile index and implied zoom level.
///
/// Exact inverse of [`tile_to_quadkey`]: the quadkey's length is the
/// level, each digit contributes one bit to the Y and X coordinates.
pub fn quadkey_to_tile(quadkey: &str) -> Result<(TileIndex, u8), CoordError> {
    let level = quadkey.len();
    if level == 0 || level > MAX_LEVEL as usize {
        return Err(CoordError::InvalidQuadkey(quadkey.to_string()));
    }

    let mut x = 0u32;
    let mut y = 0u32;
    for c in quadkey.chars() {
        x <<= 1;
        y <<= 1;
        match c {
            '0' => {}
            '1' => x |= 1,
            '2' => y |= 1,
            '3' => {
                x |= 1;
                y |= 1;
            }
            _ => return Err(CoordError::InvalidQuadkey(quadkey.to_string())),
        }
    }

    Ok((TileIndex { x, y }, level as u8))
}
