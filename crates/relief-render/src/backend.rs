//! The GPU abstraction the hillshade core draws through.
//!
//! The core never touches wgpu directly: it asks a [`Backend`] for resources
//! and hands it fully described [`DrawCall`]s. [`crate::WgpuBackend`] is the
//! real implementation; tests substitute a recording one.

use std::fmt::Debug;

use relief_style::Color;

use crate::buffer::{RasterVertex, Segment};
use crate::error::GfxError;
use crate::program::{ProgramHandle, UniformBlock};
use crate::state::{DrawState, Size, TextureChannelDataType, TextureFilter};

/// Resource creation and draw submission.
pub trait Backend {
    /// A sampled texture. Cloning shares the underlying GPU texture.
    type Texture: Clone + Debug;
    type VertexBuffer: Debug;
    type IndexBuffer: Debug;
    /// A color target that can later be turned into a [`Backend::Texture`].
    type Offscreen: Debug;

    /// Look up a registered program by name.
    fn program(&mut self, name: &str) -> Option<ProgramHandle>;

    /// Upload an RGBA8 image.
    fn create_texture(
        &mut self,
        label: &str,
        size: Size,
        pixels: &[u8],
    ) -> Result<Self::Texture, GfxError>;

    fn create_vertex_buffer(
        &mut self,
        label: &str,
        vertices: &[RasterVertex],
    ) -> Result<Self::VertexBuffer, GfxError>;

    fn create_index_buffer(
        &mut self,
        label: &str,
        indices: &[u16],
    ) -> Result<Self::IndexBuffer, GfxError>;

    /// Allocate an offscreen color target without a depth attachment.
    fn create_offscreen_texture(
        &mut self,
        size: Size,
        channel: TextureChannelDataType,
    ) -> Result<Self::Offscreen, GfxError>;

    /// Finish with an offscreen target, keeping only its texture.
    fn offscreen_into_texture(&mut self, offscreen: Self::Offscreen) -> Self::Texture;

    /// Submit one draw.
    fn draw(&mut self, target: DrawTarget<'_, Self>, call: DrawCall<'_, Self>) -> Result<(), GfxError>;
}

/// Where a draw lands.
pub enum DrawTarget<'a, B: Backend + ?Sized> {
    /// The frame being composed.
    Frame,
    /// An offscreen target, optionally cleared first.
    Offscreen {
        target: &'a B::Offscreen,
        clear: Option<Color>,
    },
}

impl<B: Backend + ?Sized> Debug for DrawTarget<'_, B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DrawTarget::Frame => f.write_str("Frame"),
            DrawTarget::Offscreen { target, clear } => f
                .debug_struct("Offscreen")
                .field("target", target)
                .field("clear", clear)
                .finish(),
        }
    }
}

/// A texture bound to a draw together with its sampling filter.
pub struct TextureBinding<'a, B: Backend + ?Sized> {
    pub texture: &'a B::Texture,
    pub filter: TextureFilter,
}

/// A complete description of one indexed draw.
pub struct DrawCall<'a, B: Backend + ?Sized> {
    pub program: ProgramHandle,
    /// Debug label, e.g. the layer id and pass.
    pub label: &'a str,
    pub state: DrawState,
    pub vertex_buffer: &'a B::VertexBuffer,
    pub index_buffer: &'a B::IndexBuffer,
    /// Drawn in order; each draws `index_length` indices from `index_offset`,
    /// offset by `vertex_offset`.
    pub segments: &'a [Segment],
    pub uniforms: UniformBlock,
    pub texture: TextureBinding<'a, B>,
}
