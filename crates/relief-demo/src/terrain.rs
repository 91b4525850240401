//! Synthetic elevation: a few smooth mountains and a ridge line defined over
//! the whole web-mercator square, so overlapping tiles of different zooms
//! agree where they meet.

use relief_geo::{CanonicalTileId, UnwrappedTileId};
use relief_hillshade::{DemData, DemEncoding, DemError, encode_terrarium};

/// `(u, v, height_m, radius)` with `u`, `v` in world units `[0, 1]`.
const PEAKS: [(f64, f64, f64, f64); 4] = [
    (0.30, 0.30, 4200.0, 0.06),
    (0.36, 0.42, 2800.0, 0.04),
    (0.20, 0.38, 3500.0, 0.08),
    (0.70, 0.62, 2500.0, 0.10),
];

/// Elevation in metres at a world position.
pub(crate) fn elevation(u: f64, v: f64) -> f64 {
    let peaks: f64 = PEAKS
        .iter()
        .map(|&(pu, pv, height, radius)| {
            let d2 = (u - pu).powi(2) + (v - pv).powi(2);
            height * (-d2 / (2.0 * radius * radius)).exp()
        })
        .sum();
    let ridge = 600.0 * ((u * 40.0 + v * 12.0).sin() * 0.5 + 0.5) * (-(v - 0.33).powi(2) * 200.0).exp();
    peaks + ridge - 200.0
}

/// Terrarium-encoded DEM of one tile, sampled at texel centres.
pub(crate) fn terrarium_tile(id: &UnwrappedTileId, dim: u32) -> Result<DemData, DemError> {
    let CanonicalTileId { z, x, y } = id.canonical;
    let tiles = f64::from(CanonicalTileId::dim(z));
    let mut image = Vec::with_capacity(dim as usize * dim as usize * 4);
    for py in 0..dim {
        for px in 0..dim {
            let u = (f64::from(x) + (f64::from(px) + 0.5) / f64::from(dim)) / tiles;
            let v = (f64::from(y) + (f64::from(py) + 0.5) / f64::from(dim)) / tiles;
            image.extend_from_slice(&encode_terrarium(elevation(u, v) as f32));
        }
    }
    DemData::from_tile_image(dim, DemEncoding::Terrarium, &image)
}

/// The four zoom-1 tiles plus one zoom-2 child, which leaves the parent
/// under it with three visible quadrants.
pub(crate) fn demo_tiles() -> Vec<UnwrappedTileId> {
    vec![
        UnwrappedTileId::new(1, 0, 0),
        UnwrappedTileId::new(1, 1, 0),
        UnwrappedTileId::new(1, 0, 1),
        UnwrappedTileId::new(1, 1, 1),
        UnwrappedTileId::new(2, 1, 1),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(texel: [u8; 4]) -> f64 {
        f64::from(texel[0]) * 256.0 + f64::from(texel[1]) + f64::from(texel[2]) / 256.0 - 32768.0
    }

    #[test]
    fn test_peak_is_highest_nearby() {
        let summit = elevation(0.30, 0.30);
        assert!(summit > 4000.0);
        assert!(elevation(0.32, 0.30) < summit);
        assert!(elevation(0.95, 0.05) < 100.0);
    }

    #[test]
    fn test_tile_has_border_and_terrarium_values() {
        let id = UnwrappedTileId::new(1, 0, 0);
        let dem = terrarium_tile(&id, 8).unwrap();
        assert_eq!(dem.dim(), 8);
        assert_eq!(dem.stride(), 10);
        assert_eq!(dem.encoding(), DemEncoding::Terrarium);

        // Texel (3, 2) of the image sits at (4, 3) behind the border.
        let expected = elevation((3.5 / 8.0) / 2.0, (2.5 / 8.0) / 2.0);
        let decoded = decode(dem.texel(4, 3).unwrap());
        assert!((decoded - expected).abs() < 0.01, "{decoded} vs {expected}");
    }

    #[test]
    fn test_child_agrees_with_parent() {
        let parent = terrarium_tile(&UnwrappedTileId::new(1, 0, 0), 8).unwrap();
        let child = terrarium_tile(&UnwrappedTileId::new(2, 1, 1), 4).unwrap();
        // Same texel size; parent texel (4, 4) and child texel (0, 0) share a centre.
        assert_eq!(parent.texel(5, 5).unwrap(), child.texel(1, 1).unwrap());
    }

    #[test]
    fn test_demo_tiles_contain_parent_and_child() {
        let tiles = demo_tiles();
        let child = UnwrappedTileId::new(2, 1, 1);
        assert!(tiles.contains(&child));
        assert!(tiles.iter().any(|t| child.is_child_of(t)));
    }
}
