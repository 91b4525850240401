//! Camera state for a 2D map view and the per-tile matrices derived from it.

use glam::{DMat4, DVec2, DVec3, Mat4};

use crate::latlng::LatLng;
use crate::tile_id::{CanonicalTileId, EXTENT, UnwrappedTileId};

/// The current map camera.
///
/// World pixel space has its origin at the north-west corner of world copy 0
/// and grows east (+x) and south (+y). One tile at zoom `z` spans
/// `world_size / 2^z` pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformState {
    /// Viewport width in pixels.
    pub width: u32,
    /// Viewport height in pixels.
    pub height: u32,
    /// Geographic position at the viewport centre.
    pub center: LatLng,
    /// Fractional zoom level.
    pub zoom: f64,
    /// Map rotation in radians. Positive values turn the map counter-clockwise
    /// so that a bearing of π/2 puts east at the top of the screen.
    pub bearing: f64,
    /// Size of one zoom-0 tile in pixels.
    pub tile_size: f64,
}

impl TransformState {
    /// A north-up camera looking at `(0, 0)` from zoom 0.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            ..Self::default()
        }
    }

    /// `2^zoom`.
    pub fn scale(&self) -> f64 {
        self.zoom.exp2()
    }

    /// Width of the whole world in pixels at the current zoom.
    pub fn world_size(&self) -> f64 {
        self.tile_size * self.scale()
    }

    /// Project a geographic position into world pixel space.
    pub fn project(&self, latlng: LatLng) -> DVec2 {
        let ll = latlng.clamped();
        let world = self.world_size();
        let x = (180.0 + ll.lng) / 360.0;
        let y = (180.0
            - (std::f64::consts::FRAC_PI_4 + ll.lat.to_radians() / 2.0)
                .tan()
                .ln()
                .to_degrees())
            / 360.0;
        DVec2::new(x * world, y * world)
    }

    /// World pixels to clip space.
    ///
    /// With `aligned` set the translation is snapped to whole pixels so that
    /// raster textures land on the pixel grid instead of being resampled at
    /// fractional offsets.
    pub fn projection_matrix(&self, aligned: bool) -> DMat4 {
        let w = f64::from(self.width);
        let h = f64::from(self.height);

        let mut center = self.project(self.center);
        if aligned {
            // Odd viewport sizes put the centre on a half pixel.
            let half = DVec2::new((w / 2.0).fract(), (h / 2.0).fract());
            center = (center - half).round() + half;
        }

        let screen = DMat4::orthographic_rh(0.0, w, h, 0.0, -1.0, 1.0);
        screen
            * DMat4::from_translation(DVec3::new(w / 2.0, h / 2.0, 0.0))
            * DMat4::from_rotation_z(-self.bearing)
            * DMat4::from_translation(DVec3::new(-center.x, -center.y, 0.0))
    }

    /// Tile units (`0..EXTENT`) of `id` to clip space.
    pub fn matrix_for_tile(&self, id: &UnwrappedTileId, aligned: bool) -> Mat4 {
        let tile_px = self.world_size() / f64::from(CanonicalTileId::dim(id.canonical.z));
        let origin = DVec3::new(
            id.unwrapped_x() as f64 * tile_px,
            f64::from(id.canonical.y) * tile_px,
            0.0,
        );
        let units = tile_px / f64::from(EXTENT);

        let model = DMat4::from_translation(origin) * DMat4::from_scale(DVec3::new(units, units, 1.0));
        (self.projection_matrix(aligned) * model).as_mat4()
    }
}

impl Default for TransformState {
    fn default() -> Self {
        Self {
            width: 512,
            height: 512,
            center: LatLng::default(),
            zoom: 0.0,
            bearing: 0.0,
            tile_size: 512.0,
        }
    }
}
