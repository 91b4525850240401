//! Geographic coordinates and the web-mercator relationship between tile rows
//! and latitude.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::tile_id::{CanonicalTileId, UnwrappedTileId};

/// Latitude limit of the square web-mercator world, in degrees.
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

/// A geographic position in degrees.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    /// Latitude in degrees, positive north.
    pub lat: f64,
    /// Longitude in degrees, positive east.
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// The north-west corner of a tile, including its world copy offset.
    #[must_use]
    pub fn from_tile(id: &UnwrappedTileId) -> Self {
        let dim = f64::from(CanonicalTileId::dim(id.canonical.z));
        let lng = f64::from(id.canonical.x) / dim * 360.0 - 180.0 + f64::from(id.wrap) * 360.0;
        let lat = tile_row_latitude(id.canonical.z, f64::from(id.canonical.y));
        Self { lat, lng }
    }

    /// Clamp latitude into the mercator range.
    #[must_use]
    pub fn clamped(self) -> Self {
        Self {
            lat: self.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE),
            lng: self.lng,
        }
    }
}

impl Default for LatLng {
    fn default() -> Self {
        Self { lat: 0.0, lng: 0.0 }
    }
}

/// Latitude in degrees of the horizontal edge at `row` for zoom `z`.
///
/// `row` may be fractional and may equal `2^z`, the southern edge of the
/// last row.
#[must_use]
pub fn tile_row_latitude(z: u8, row: f64) -> f64 {
    let n = PI - 2.0 * PI * row / f64::from(CanonicalTileId::dim(z));
    n.sinh().atan().to_degrees()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_world_corner() {
        let ll = LatLng::from_tile(&UnwrappedTileId::new(0, 0, 0));
        assert!((ll.lng + 180.0).abs() < 1e-9);
        assert!((ll.lat - MAX_LATITUDE).abs() < 1e-9);
    }

    #[test]
    fn test_equator_row() {
        assert!(tile_row_latitude(2, 2.0).abs() < 1e-9);
        assert!(tile_row_latitude(5, 16.0).abs() < 1e-9);
    }

    #[test]
    fn test_southern_edge_of_last_row() {
        assert!((tile_row_latitude(3, 8.0) + MAX_LATITUDE).abs() < 1e-9);
    }

    #[test]
    fn test_wrap_offsets_longitude() {
        let primary = LatLng::from_tile(&UnwrappedTileId::new(2, 1, 1));
        let copy = LatLng::from_tile(&UnwrappedTileId::new(2, 5, 1));
        assert!((copy.lng - primary.lng - 360.0).abs() < 1e-9);
        assert_eq!(copy.lat, primary.lat);
    }

    #[test]
    fn test_clamped() {
        let ll = LatLng::new(89.0, 10.0).clamped();
        assert_eq!(ll.lat, MAX_LATITUDE);
        assert_eq!(ll.lng, 10.0);
    }
}
