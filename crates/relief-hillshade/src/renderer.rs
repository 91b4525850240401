//! Frame orchestration for hillshade layers sharing one DEM source.

use std::time::Instant;

use relief_geo::TransformState;
use relief_render::{Backend, PaintParameters, StaticData};
use relief_style::{
    HillshadePaintProperties, PropertyEvaluationParameters, RenderPass, TransitionOptions,
    TransitionParameters,
};

use crate::error::HillshadeError;
use crate::layer::RenderHillshadeLayer;
use crate::source::RasterDemSource;
use crate::tile::LayerPrepareParameters;

/// Passes of a frame, in execution order.
pub const FRAME_PASSES: [RenderPass; 2] = [RenderPass::Pass3D, RenderPass::Translucent];

/// Drives the hillshade layers of one source through a frame:
/// [`HillshadeRenderer::update`] then [`HillshadeRenderer::render_frame`].
pub struct HillshadeRenderer<B: Backend> {
    layers: Vec<RenderHillshadeLayer>,
    source: RasterDemSource<B>,
    transition: TransitionOptions,
}

impl<B: Backend> HillshadeRenderer<B> {
    pub fn new(source: RasterDemSource<B>, transition: TransitionOptions) -> Self {
        Self {
            layers: Vec::new(),
            source,
            transition,
        }
    }

    /// Add a layer on top of the existing ones.
    pub fn add_layer(&mut self, layer: RenderHillshadeLayer) {
        self.layers.push(layer);
    }

    pub fn layers(&self) -> &[RenderHillshadeLayer] {
        &self.layers
    }

    pub fn layer(&self, id: &str) -> Option<&RenderHillshadeLayer> {
        self.layers.iter().find(|layer| layer.id() == id)
    }

    pub fn source(&self) -> &RasterDemSource<B> {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut RasterDemSource<B> {
        &mut self.source
    }

    /// Change a layer's paint, easing from its current values. Returns false
    /// if no layer has that id.
    pub fn set_paint(&mut self, id: &str, paint: HillshadePaintProperties, now: Instant) -> bool {
        let Some(layer) = self.layers.iter_mut().find(|layer| layer.id() == id) else {
            return false;
        };
        layer.set_paint(paint);
        layer.transition(&TransitionParameters {
            now,
            transition: self.transition,
        });
        true
    }

    /// Bring tiles, GPU data and layer properties up to date for a frame.
    pub fn update(
        &mut self,
        backend: &mut B,
        transform: &TransformState,
        now: Instant,
    ) -> Result<(), HillshadeError> {
        self.source.update(transform);
        self.source.upload(backend)?;

        let evaluation = PropertyEvaluationParameters::new(transform.zoom as f32, now);
        let prepare = LayerPrepareParameters::from_source(&self.source);
        for layer in &mut self.layers {
            layer.evaluate(&evaluation);
            layer.prepare(&prepare);
        }
        Ok(())
    }

    /// Run every pass of the frame for each layer taking part in it.
    pub fn render_frame(
        &mut self,
        backend: &mut B,
        static_data: &StaticData<B>,
        transform: &TransformState,
    ) -> Result<(), HillshadeError> {
        let layer_count = self.layers.len() as u32;
        for pass in FRAME_PASSES {
            let mut parameters =
                PaintParameters::new(pass, transform, &mut *backend, static_data, layer_count);
            for (index, layer) in self.layers.iter().enumerate() {
                if !layer.passes().contains(pass) {
                    continue;
                }
                parameters.current_layer = index as u32;
                layer.render(&mut parameters, &mut self.source)?;
            }
        }
        Ok(())
    }

    /// True while a paint transition is in flight.
    pub fn needs_repaint(&self) -> bool {
        self.layers.iter().any(RenderHillshadeLayer::has_transition)
    }
}
