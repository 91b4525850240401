//! GPU abstraction for raster layers: draw state, shared geometry, hillshade programs and a headless wgpu backend.

pub mod backend;
pub mod buffer;
pub mod depth;
pub mod error;
pub mod gpu;
pub mod paint;
pub mod pipeline;
pub mod program;
pub mod shader;
pub mod state;
pub mod texture;

pub use backend::{Backend, DrawCall, DrawTarget, TextureBinding};
pub use buffer::{QUAD_TRIANGLE_INDICES, RasterVertex, Segment, StaticData, raster_vertices};
pub use depth::DepthBuffer;
pub use error::GfxError;
pub use gpu::WgpuBackend;
pub use paint::{DEPTH_EPSILON, NUM_SUBLAYERS, PaintParameters};
pub use program::{
    HILLSHADE_PREPARE_PROGRAM, HILLSHADE_PROGRAM, HillshadePrepareUniforms, HillshadeUniforms,
    ProgramHandle, UniformBlock,
};
pub use shader::ProgramLibrary;
pub use state::{
    BlendFunction, ColorMask, ColorMode, CullFaceMode, DepthFunction, DepthMaskType, DepthMode,
    DrawState, Size, StencilMode, TextureChannelDataType, TextureFilter,
};
pub use texture::{GpuTexture, OffscreenTexture, TextureHandle};
