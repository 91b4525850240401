//! Per-tile GPU state of a hillshade layer.

use relief_geo::{CanonicalTileId, EXTENT, TileMask, full_tile_mask};
use relief_render::{Backend, GfxError, RasterVertex, Segment, Size};

use crate::dem::DemData;

/// The DEM of one tile and everything derived from it on the GPU.
///
/// `prepared` starts false and flips to true exactly once, when the prepare
/// pass stores the slope texture through [`HillshadeBucket::finish_prepare`].
/// `texture` is present exactly when `prepared` is true.
pub struct HillshadeBucket<B: Backend> {
    dem: Option<DemData>,
    dem_texture: Option<B::Texture>,
    prepared: bool,
    texture: Option<B::Texture>,
    mask: TileMask,
    vertices: Vec<RasterVertex>,
    indices: Vec<u16>,
    vertex_buffer: Option<B::VertexBuffer>,
    index_buffer: Option<B::IndexBuffer>,
    /// Segments of the trimmed geometry, or the cached full-tile segments.
    pub segments: Vec<Segment>,
}

impl<B: Backend> HillshadeBucket<B> {
    pub fn new(dem: DemData) -> Self {
        Self::with_dem(Some(dem))
    }

    /// A bucket for a tile the source had no raster for.
    pub fn without_data() -> Self {
        Self::with_dem(None)
    }

    fn with_dem(dem: Option<DemData>) -> Self {
        Self {
            dem,
            dem_texture: None,
            prepared: false,
            texture: None,
            mask: full_tile_mask(),
            vertices: Vec::new(),
            indices: Vec::new(),
            vertex_buffer: None,
            index_buffer: None,
            segments: Vec::new(),
        }
    }

    pub fn has_data(&self) -> bool {
        self.dem.is_some()
    }

    pub fn is_prepared(&self) -> bool {
        self.prepared
    }

    pub fn dem(&self) -> Option<&DemData> {
        self.dem.as_ref()
    }

    /// The uploaded raw DEM raster.
    pub fn dem_texture(&self) -> Option<&B::Texture> {
        self.dem_texture.as_ref()
    }

    /// The prepared slope texture.
    pub fn texture(&self) -> Option<&B::Texture> {
        self.texture.as_ref()
    }

    /// Store the result of the prepare pass.
    ///
    /// # Panics
    ///
    /// Panics if the bucket was already prepared.
    pub(crate) fn finish_prepare(&mut self, texture: B::Texture) {
        assert!(!self.prepared, "hillshade bucket prepared twice");
        self.texture = Some(texture);
        self.prepared = true;
    }

    pub fn mask(&self) -> &TileMask {
        &self.mask
    }

    /// Vertex and index buffers of the trimmed geometry, when the mask does
    /// not cover the whole tile and the geometry has been uploaded.
    pub fn trimmed_buffers(&self) -> Option<(&B::VertexBuffer, &B::IndexBuffer)> {
        self.vertex_buffer.as_ref().zip(self.index_buffer.as_ref())
    }

    /// True when deeper tiles cover this whole tile.
    pub fn is_fully_masked(&self) -> bool {
        self.mask.is_empty()
    }

    /// True when only part of the tile is drawn, through trimmed geometry.
    /// The geometry may still be waiting for [`Self::upload`].
    pub fn is_trimmed(&self) -> bool {
        !self.mask.is_empty() && self.mask != full_tile_mask()
    }

    /// Restrict drawing to the regions in `mask`.
    ///
    /// The full-tile mask drops any trimmed geometry so the shared quad is
    /// used again.
    pub fn set_mask(&mut self, mask: TileMask) {
        if self.mask == mask {
            return;
        }

        self.vertices.clear();
        self.indices.clear();
        self.segments.clear();
        self.vertex_buffer = None;
        self.index_buffer = None;

        if mask != full_tile_mask() {
            build_trimmed_geometry(&mask, &mut self.vertices, &mut self.indices, &mut self.segments);
            log::trace!("Trimmed hillshade geometry to {} regions", mask.len());
        }
        self.mask = mask;
    }

    /// Upload the DEM raster and any trimmed geometry not yet on the GPU.
    pub fn upload(&mut self, backend: &mut B) -> Result<(), GfxError> {
        if self.dem_texture.is_none() {
            if let Some(dem) = &self.dem {
                let size = Size::square(dem.stride());
                self.dem_texture = Some(backend.create_texture("hillshade-dem", size, dem.pixels())?);
            }
        }
        if !self.vertices.is_empty() && self.vertex_buffer.is_none() {
            self.vertex_buffer = Some(backend.create_vertex_buffer("hillshade-trimmed-vertices", &self.vertices)?);
        }
        if !self.indices.is_empty() && self.index_buffer.is_none() {
            self.index_buffer = Some(backend.create_index_buffer("hillshade-trimmed-indices", &self.indices)?);
        }
        Ok(())
    }

    pub fn needs_upload(&self) -> bool {
        (self.dem.is_some() && self.dem_texture.is_none())
            || (!self.vertices.is_empty() && self.vertex_buffer.is_none())
    }
}

/// One quad per mask region, in tile units.
fn build_trimmed_geometry(
    mask: &TileMask,
    vertices: &mut Vec<RasterVertex>,
    indices: &mut Vec<u16>,
    segments: &mut Vec<Segment>,
) {
    for id in mask {
        if id.z > MAX_REGION_DEPTH {
            log::warn!("Skipping hillshade mask region {id:?} below one tile unit");
            continue;
        }
        let (tl, br) = region_corners(id);

        let needs_segment = segments
            .last()
            .is_none_or(|s| s.vertex_length + 4 > usize::from(u16::MAX));
        if needs_segment {
            segments.push(Segment::new(vertices.len(), indices.len(), 0, 0));
        }

        let Some(segment) = segments.last_mut() else {
            continue;
        };
        let offset = segment.vertex_length as u16;

        vertices.push(RasterVertex::new(tl.0, tl.1, tl.0 as u16, tl.1 as u16));
        vertices.push(RasterVertex::new(br.0, tl.1, br.0 as u16, tl.1 as u16));
        vertices.push(RasterVertex::new(tl.0, br.1, tl.0 as u16, br.1 as u16));
        vertices.push(RasterVertex::new(br.0, br.1, br.0 as u16, br.1 as u16));

        indices.extend_from_slice(&[
            offset,
            offset + 1,
            offset + 2,
            offset + 1,
            offset + 2,
            offset + 3,
        ]);

        segment.vertex_length += 4;
        segment.index_length += 6;
    }
}

/// Deepest mask region that still spans at least one tile unit.
const MAX_REGION_DEPTH: u8 = 13;

/// Top-left and bottom-right corners of a relative sub-tile.
fn region_corners(id: &CanonicalTileId) -> ((i16, i16), (i16, i16)) {
    debug_assert!(
        id.z <= MAX_REGION_DEPTH,
        "mask region {id:?} is finer than one tile unit"
    );
    let extent = EXTENT >> id.z.min(MAX_REGION_DEPTH);
    let x = id.x as i32 * extent;
    let y = id.y as i32 * extent;
    (
        (x as i16, y as i16),
        ((x + extent) as i16, (y + extent) as i16),
    )
}
