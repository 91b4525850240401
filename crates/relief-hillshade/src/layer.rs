//! The hillshade layer: property evaluation, pass scheduling and the two
//! pipelines that turn a DEM into shaded relief.
//!
//! Each tile goes through two stages. In a [`RenderPass::Pass3D`] pass a
//! bucket that is not yet prepared gets its DEM converted into a slope texture
//! offscreen. In a [`RenderPass::Translucent`] pass a prepared bucket has that
//! texture shaded onto the map. A bucket is prepared once and composited on
//! every frame after that.

use std::sync::Arc;

use glam::{Mat4, Vec3};
use log::{debug, trace};
use relief_geo::{EXTENT, UnwrappedTileId, tile_row_latitude};
use relief_render::{
    Backend, CullFaceMode, DepthMaskType, DrawCall, DrawState, DrawTarget, GfxError,
    HILLSHADE_PREPARE_PROGRAM, HILLSHADE_PROGRAM, HillshadePrepareUniforms, HillshadeUniforms,
    PaintParameters, ProgramHandle, Size, StencilMode, TextureBinding, TextureChannelDataType,
    TextureFilter, UniformBlock,
};
use relief_style::{
    Color, HillshadeEvaluated, HillshadePaintProperties, HillshadeUnevaluated, IlluminationAnchor,
    PropertyEvaluationParameters, RenderPass, RenderPasses, TransitionParameters,
};

use crate::bucket::HillshadeBucket;
use crate::tile::{LayerPrepareParameters, RenderSource, RenderTile};

/// Frozen result of one evaluation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HillshadeLayerProperties {
    pub evaluated: HillshadeEvaluated,
    pub passes: RenderPasses,
}

/// A hillshade layer as seen by the renderer.
pub struct RenderHillshadeLayer {
    id: String,
    paint: HillshadePaintProperties,
    unevaluated: HillshadeUnevaluated,
    evaluated: Arc<HillshadeLayerProperties>,
    render_tiles: Option<Arc<[RenderTile]>>,
    max_zoom: u8,
}

impl RenderHillshadeLayer {
    pub fn new(id: impl Into<String>, paint: HillshadePaintProperties) -> Self {
        let unevaluated = paint.untransitioned();
        Self {
            id: id.into(),
            paint,
            unevaluated,
            evaluated: Arc::new(HillshadeLayerProperties {
                evaluated: HillshadeEvaluated::default(),
                passes: RenderPasses::NONE,
            }),
            render_tiles: None,
            max_zoom: 0,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn paint(&self) -> &HillshadePaintProperties {
        &self.paint
    }

    /// Replace the authored paint. Takes effect at the next [`Self::transition`].
    pub fn set_paint(&mut self, paint: HillshadePaintProperties) {
        self.paint = paint;
    }

    /// Start transitions from the current values towards the authored paint.
    pub fn transition(&mut self, parameters: &TransitionParameters) {
        let prior = std::mem::take(&mut self.unevaluated);
        self.unevaluated = self.paint.transitioned(parameters, prior);
    }

    /// Resolve properties for one frame and decide which passes the layer
    /// draws in.
    pub fn evaluate(&mut self, parameters: &PropertyEvaluationParameters) {
        let evaluated = self.unevaluated.evaluate(parameters);
        self.evaluated = Arc::new(HillshadeLayerProperties {
            evaluated,
            passes: evaluated.render_passes(),
        });
    }

    /// The last evaluation.
    pub fn evaluated_properties(&self) -> Arc<HillshadeLayerProperties> {
        Arc::clone(&self.evaluated)
    }

    pub fn passes(&self) -> RenderPasses {
        self.evaluated.passes
    }

    pub fn has_transition(&self) -> bool {
        self.unevaluated.has_transition()
    }

    pub fn has_crossfade(&self) -> bool {
        false
    }

    /// `[exaggeration, azimuth]` with the azimuth in radians. A viewport
    /// anchored light turns against the map `bearing` (radians) so it stays
    /// fixed on screen.
    pub fn compute_light(&self, bearing: f32) -> [f32; 2] {
        let evaluated = &self.evaluated.evaluated;
        let mut azimuth = evaluated.illumination_direction.to_radians();
        if evaluated.illumination_anchor == IlluminationAnchor::Viewport {
            azimuth -= bearing;
        }
        [evaluated.exaggeration, azimuth]
    }

    /// `[north, south]` latitude of the tile's canonical row.
    pub fn compute_lat_range(id: &UnwrappedTileId) -> [f32; 2] {
        let z = id.canonical.z;
        let y = f64::from(id.canonical.y);
        [
            tile_row_latitude(z, y) as f32,
            tile_row_latitude(z, y + 1.0) as f32,
        ]
    }

    /// Take this frame's tiles from the source.
    pub fn prepare(&mut self, parameters: &LayerPrepareParameters) {
        self.render_tiles = Some(Arc::clone(&parameters.render_tiles));
        self.max_zoom = parameters.max_zoom;
    }

    /// Draw one pass.
    ///
    /// # Panics
    ///
    /// Panics if called before [`Self::prepare`], if a bucket due for the
    /// prepare pass has no uploaded DEM texture, or if a prepared bucket has
    /// lost its texture.
    pub fn render<B: Backend>(
        &self,
        parameters: &mut PaintParameters<'_, B>,
        source: &mut impl RenderSource<Backend = B>,
    ) -> Result<(), GfxError> {
        let Some(render_tiles) = &self.render_tiles else {
            panic!("hillshade layer '{}' rendered before its tiles were prepared", self.id);
        };
        if parameters.pass != RenderPass::Translucent && parameters.pass != RenderPass::Pass3D {
            return Ok(());
        }

        let Some(program) = parameters.backend.program(HILLSHADE_PROGRAM) else {
            trace!("Program '{HILLSHADE_PROGRAM}' unavailable, skipping '{}'", self.id);
            return Ok(());
        };
        let Some(prepare_program) = parameters.backend.program(HILLSHADE_PREPARE_PROGRAM) else {
            trace!("Program '{HILLSHADE_PREPARE_PROGRAM}' unavailable, skipping '{}'", self.id);
            return Ok(());
        };

        for tile in render_tiles.iter() {
            let Some(bucket) = source.bucket_mut(&tile.id) else {
                trace!("No hillshade bucket for {}", tile.id);
                continue;
            };
            if !bucket.has_data() {
                continue;
            }

            if !bucket.is_prepared() && parameters.pass == RenderPass::Pass3D {
                self.prepare_tile(parameters, prepare_program, tile, bucket)?;
            } else if bucket.is_prepared() && parameters.pass == RenderPass::Translucent {
                self.composite_tile(parameters, program, tile, bucket)?;
            }
        }
        Ok(())
    }

    /// DEM to slope texture, drawn offscreen with the shared quad.
    fn prepare_tile<B: Backend>(
        &self,
        parameters: &mut PaintParameters<'_, B>,
        program: ProgramHandle,
        tile: &RenderTile,
        bucket: &mut HillshadeBucket<B>,
    ) -> Result<(), GfxError> {
        let Some(dem) = bucket.dem() else {
            panic!("hillshade bucket for {} has no DEM", tile.id);
        };
        let Some(dem_texture) = bucket.dem_texture() else {
            panic!("hillshade bucket for {} was not uploaded before prepare", tile.id);
        };
        let stride = dem.stride() as f32;
        let tile_size = dem.dim();

        let uniforms = UniformBlock::HillshadePrepare(HillshadePrepareUniforms {
            matrix: prepare_matrix().to_cols_array_2d(),
            unpack: dem.unpack_vector(),
            dimension: [stride, stride],
            zoom: f32::from(tile.id.canonical.z),
            maxzoom: f32::from(self.max_zoom),
        });
        let state = DrawState {
            depth: parameters.depth_mode_for_sublayer(0, DepthMaskType::ReadOnly),
            stencil: StencilMode::disabled(),
            color: parameters.color_mode_for_render_pass(),
            cull: CullFaceMode::disabled(),
        };

        let view = parameters
            .backend
            .create_offscreen_texture(Size::square(tile_size), TextureChannelDataType::UnsignedByte)?;

        // A private copy, independent of any bucket's cache.
        let segments = parameters.static_data.raster_segments();
        let static_data = parameters.static_data;
        parameters.backend.draw(
            DrawTarget::Offscreen {
                target: &view,
                clear: Some(Color::TRANSPARENT),
            },
            DrawCall {
                program,
                label: "prepare",
                state,
                vertex_buffer: &static_data.raster_vertex_buffer,
                index_buffer: &static_data.quad_triangle_index_buffer,
                segments: &segments,
                uniforms,
                texture: TextureBinding {
                    texture: dem_texture,
                    filter: TextureFilter::Nearest,
                },
            },
        )?;

        let texture = parameters.backend.offscreen_into_texture(view);
        bucket.finish_prepare(texture);
        debug!("Prepared hillshade texture {tile_size}x{tile_size} for {}", tile.id);
        Ok(())
    }

    /// Slope texture to the frame, on the tile's trimmed geometry when its
    /// mask leaves only part of it visible and on the shared quad otherwise.
    /// Trimmed geometry that has not been uploaded skips the tile.
    fn composite_tile<B: Backend>(
        &self,
        parameters: &mut PaintParameters<'_, B>,
        program: ProgramHandle,
        tile: &RenderTile,
        bucket: &mut HillshadeBucket<B>,
    ) -> Result<(), GfxError> {
        if bucket.is_fully_masked() {
            trace!("Hillshade tile {} is covered by deeper tiles", tile.id);
            return Ok(());
        }

        let evaluated = &self.evaluated.evaluated;
        let uniforms = UniformBlock::Hillshade(HillshadeUniforms {
            matrix: parameters.matrix_for_tile(&tile.id, true).to_cols_array_2d(),
            highlight: evaluated.highlight.to_array(),
            shadow: evaluated.shadow.to_array(),
            accent: evaluated.accent.to_array(),
            light: self.compute_light(parameters.state.bearing as f32),
            latrange: Self::compute_lat_range(&tile.id),
        });
        let state = DrawState {
            depth: parameters.depth_mode_for_sublayer(0, DepthMaskType::ReadOnly),
            stencil: StencilMode::disabled(),
            color: parameters.color_mode_for_render_pass(),
            cull: CullFaceMode::disabled(),
        };

        let static_data = parameters.static_data;
        let (vertex_buffer, index_buffer) = if bucket.is_trimmed() {
            let Some(buffers) = bucket.trimmed_buffers() else {
                trace!("Trimmed geometry for {} not uploaded yet, skipping", tile.id);
                return Ok(());
            };
            buffers
        } else {
            if bucket.segments.is_empty() {
                bucket.segments = static_data.raster_segments();
            }
            (
                &static_data.raster_vertex_buffer,
                &static_data.quad_triangle_index_buffer,
            )
        };
        let Some(texture) = bucket.texture() else {
            panic!("prepared hillshade bucket for {} has no texture", tile.id);
        };

        parameters.backend.draw(
            DrawTarget::Frame,
            DrawCall {
                program,
                label: &self.id,
                state,
                vertex_buffer,
                index_buffer,
                segments: &bucket.segments,
                uniforms,
                texture: TextureBinding {
                    texture,
                    filter: TextureFilter::Linear,
                },
            },
        )
    }
}

/// Tile units to the offscreen target, with rows flipped to raster order.
pub fn prepare_matrix() -> Mat4 {
    let extent = EXTENT as f32;
    Mat4::orthographic_rh(0.0, extent, -extent, 0.0, 0.0, 1.0)
        * Mat4::from_translation(Vec3::new(0.0, -extent, 0.0))
}

#[cfg(test)]
#[path = "layer_tests.rs"]
mod tests;
