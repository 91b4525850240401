//! Per-pass context handed to layers while they draw.

use glam::Mat4;
use relief_geo::{TransformState, UnwrappedTileId};
use relief_style::RenderPass;

use crate::backend::Backend;
use crate::buffer::StaticData;
use crate::state::{ColorMode, DepthFunction, DepthMaskType, DepthMode};

/// Depth slots each layer reserves.
pub const NUM_SUBLAYERS: u32 = 3;
/// Depth distance between adjacent sublayers.
pub const DEPTH_EPSILON: f32 = 1.0 / (1 << 16) as f32;

/// Everything a layer needs to draw one pass.
pub struct PaintParameters<'a, B: Backend> {
    pub pass: RenderPass,
    pub state: &'a TransformState,
    pub backend: &'a mut B,
    pub static_data: &'a StaticData<B>,
    /// Index of the layer being drawn, bottom-most first.
    pub current_layer: u32,
    pub layer_count: u32,
}

impl<'a, B: Backend> PaintParameters<'a, B> {
    pub fn new(
        pass: RenderPass,
        state: &'a TransformState,
        backend: &'a mut B,
        static_data: &'a StaticData<B>,
        layer_count: u32,
    ) -> Self {
        Self {
            pass,
            state,
            backend,
            static_data,
            current_layer: 0,
            layer_count,
        }
    }

    /// Tile units of `id` to clip space for the current camera.
    pub fn matrix_for_tile(&self, id: &UnwrappedTileId, aligned: bool) -> Mat4 {
        self.state.matrix_for_tile(id, aligned)
    }

    /// Depth test that keeps each layer in its own slice of the depth range,
    /// later layers nearer.
    pub fn depth_mode_for_sublayer(&self, n: u8, mask: DepthMaskType) -> DepthMode {
        let depth = sublayer_depth(self.current_layer, self.layer_count, n);
        DepthMode {
            func: DepthFunction::LessEqual,
            mask,
            range: (depth, depth),
        }
    }

    /// Translucent passes blend; everything else replaces.
    pub fn color_mode_for_render_pass(&self) -> ColorMode {
        if self.pass == RenderPass::Translucent {
            ColorMode::alpha_blended()
        } else {
            ColorMode::unblended()
        }
    }
}

/// Normalized depth of sublayer `n` of `current_layer` out of `layer_count`.
fn sublayer_depth(current_layer: u32, layer_count: u32, n: u8) -> f32 {
    let range_size = 1.0 - (layer_count + 2) as f32 * NUM_SUBLAYERS as f32 * DEPTH_EPSILON;
    let slot = (layer_count - current_layer.min(layer_count)) * NUM_SUBLAYERS + u32::from(n);
    range_size + slot as f32 * DEPTH_EPSILON
}
