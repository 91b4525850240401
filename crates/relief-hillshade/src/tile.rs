//! What a layer sees of its source: the tiles to draw and their buckets.

use std::sync::Arc;

use glam::Mat4;
use relief_geo::UnwrappedTileId;
use relief_render::Backend;

use crate::bucket::HillshadeBucket;

/// A tile drawn this frame.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderTile {
    pub id: UnwrappedTileId,
    /// Tile units to clip space for the current camera, unaligned. The
    /// hillshade pipelines don't read it: composite needs the pixel-aligned
    /// matrix and asks [`relief_render::PaintParameters`] for it. Kept for
    /// other layers drawing from the same source, such as debug overlays.
    pub matrix: Mat4,
}

/// The tile collaborator a hillshade layer draws from.
pub trait RenderSource {
    type Backend: Backend;

    /// Tiles to draw this frame, in draw order.
    fn render_tiles(&self) -> Arc<[RenderTile]>;

    /// Highest zoom the source has data for.
    fn max_zoom(&self) -> u8;

    /// The bucket of a tile, if the source holds one.
    fn bucket_mut(&mut self, id: &UnwrappedTileId) -> Option<&mut HillshadeBucket<Self::Backend>>;
}

/// Snapshot a layer takes of its source before drawing.
#[derive(Clone, Debug)]
pub struct LayerPrepareParameters {
    pub render_tiles: Arc<[RenderTile]>,
    pub max_zoom: u8,
}

impl LayerPrepareParameters {
    pub fn from_source(source: &impl RenderSource) -> Self {
        Self {
            render_tiles: source.render_tiles(),
            max_zoom: source.max_zoom(),
        }
    }
}
