//! A raster-DEM source: owns one bucket per loaded tile and decides which
//! tiles are drawn.

use std::collections::BTreeMap;
use std::sync::Arc;

use log::{debug, trace};
use relief_geo::{MaskedRenderable, TileMask, TransformState, UnwrappedTileId, update_tile_masks};
use relief_render::Backend;

use crate::bucket::HillshadeBucket;
use crate::dem::DemData;
use crate::error::HillshadeError;
use crate::tile::{RenderSource, RenderTile};

struct TileSlot<B: Backend> {
    id: UnwrappedTileId,
    used: bool,
    bucket: HillshadeBucket<B>,
}

impl<B: Backend> MaskedRenderable for TileSlot<B> {
    fn id(&self) -> UnwrappedTileId {
        self.id
    }

    fn is_used(&self) -> bool {
        self.used
    }

    fn set_mask(&mut self, mask: TileMask) {
        self.bucket.set_mask(mask);
    }
}

/// Loaded DEM tiles of one source.
pub struct RasterDemSource<B: Backend> {
    tiles: BTreeMap<UnwrappedTileId, TileSlot<B>>,
    max_zoom: u8,
    render_tiles: Arc<[RenderTile]>,
}

impl<B: Backend> RasterDemSource<B> {
    pub fn new(max_zoom: u8) -> Self {
        Self {
            tiles: BTreeMap::new(),
            max_zoom,
            render_tiles: Arc::from(Vec::new()),
        }
    }

    /// Store the DEM of a tile in a fresh bucket. A bucket already held for
    /// the tile is dropped together with its prepared texture.
    pub fn add_tile(&mut self, id: UnwrappedTileId, dem: DemData) {
        self.insert(id, HillshadeBucket::new(dem));
    }

    /// Record a tile the source has no raster for.
    pub fn add_empty_tile(&mut self, id: UnwrappedTileId) {
        self.insert(id, HillshadeBucket::without_data());
    }

    fn insert(&mut self, id: UnwrappedTileId, bucket: HillshadeBucket<B>) {
        let slot = TileSlot {
            id,
            used: true,
            bucket,
        };
        if self.tiles.insert(id, slot).is_some() {
            debug!("Replaced DEM bucket for {id}");
        } else {
            trace!("Added DEM bucket for {id}");
        }
    }

    pub fn remove_tile(&mut self, id: &UnwrappedTileId) -> bool {
        self.tiles.remove(id).is_some()
    }

    /// Unused tiles stay loaded but are neither drawn nor mask other tiles.
    pub fn set_used(&mut self, id: &UnwrappedTileId, used: bool) {
        if let Some(slot) = self.tiles.get_mut(id) {
            slot.used = used;
        }
    }

    pub fn contains(&self, id: &UnwrappedTileId) -> bool {
        self.tiles.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn bucket(&self, id: &UnwrappedTileId) -> Option<&HillshadeBucket<B>> {
        self.tiles.get(id).map(|slot| &slot.bucket)
    }

    /// Recompute tile masks and the render tiles for the camera.
    pub fn update(&mut self, transform: &TransformState) {
        let mut slots: Vec<&mut TileSlot<B>> = self.tiles.values_mut().collect();
        update_tile_masks(&mut slots);

        let render_tiles: Vec<RenderTile> = slots
            .iter()
            .filter(|slot| slot.used)
            .map(|slot| RenderTile {
                id: slot.id,
                matrix: transform.matrix_for_tile(&slot.id, false),
            })
            .collect();
        self.render_tiles = render_tiles.into();
    }

    /// Upload every bucket with pending GPU data.
    pub fn upload(&mut self, backend: &mut B) -> Result<(), HillshadeError> {
        for slot in self.tiles.values_mut() {
            if slot.bucket.needs_upload() {
                slot.bucket.upload(backend)?;
            }
        }
        Ok(())
    }
}

impl<B: Backend> RenderSource for RasterDemSource<B> {
    type Backend = B;

    fn render_tiles(&self) -> Arc<[RenderTile]> {
        Arc::clone(&self.render_tiles)
    }

    fn max_zoom(&self) -> u8 {
        self.max_zoom
    }

    fn bucket_mut(&mut self, id: &UnwrappedTileId) -> Option<&mut HillshadeBucket<B>> {
        self.tiles.get_mut(id).map(|slot| &mut slot.bucket)
    }
}
