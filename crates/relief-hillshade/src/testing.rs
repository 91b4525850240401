//! A [`Backend`] that records what the hillshade layer asks of it.

use std::collections::HashMap;

use relief_render::{
    Backend, DrawCall, DrawState, DrawTarget, GfxError, HILLSHADE_PREPARE_PROGRAM, HILLSHADE_PROGRAM,
    ProgramHandle, RasterVertex, Segment, Size, TextureChannelDataType, TextureFilter, UniformBlock,
};
use relief_style::Color;

#[derive(Clone, Debug, PartialEq)]
pub struct RecordedTexture {
    pub id: usize,
    pub label: String,
    pub size: Size,
}

#[derive(Debug)]
pub struct RecordedBuffer {
    pub id: usize,
    pub label: String,
    pub len: usize,
}

#[derive(Debug)]
pub struct RecordedOffscreen {
    pub texture: RecordedTexture,
    pub channel: TextureChannelDataType,
}

#[derive(Clone, Debug, PartialEq)]
pub enum RecordedTarget {
    Frame,
    Offscreen { texture: usize, clear: Option<Color> },
}

#[derive(Clone, Debug)]
pub struct RecordedDraw {
    pub program: ProgramHandle,
    pub label: String,
    pub target: RecordedTarget,
    pub state: DrawState,
    pub vertex_buffer: usize,
    pub index_buffer: usize,
    pub segments: Vec<Segment>,
    /// Address of the segment slice, to tell cached segments from fresh copies.
    pub segments_addr: usize,
    pub uniforms: UniformBlock,
    pub texture: RecordedTexture,
    pub filter: TextureFilter,
}

pub struct RecordingBackend {
    programs: HashMap<&'static str, ProgramHandle>,
    next_id: usize,
    pub textures_created: usize,
    pub offscreens: Vec<(Size, TextureChannelDataType)>,
    pub draws: Vec<RecordedDraw>,
}

impl Default for RecordingBackend {
    fn default() -> Self {
        Self {
            programs: HashMap::from([
                (HILLSHADE_PREPARE_PROGRAM, ProgramHandle(0)),
                (HILLSHADE_PROGRAM, ProgramHandle(1)),
            ]),
            next_id: 0,
            textures_created: 0,
            offscreens: Vec::new(),
            draws: Vec::new(),
        }
    }
}

impl RecordingBackend {
    pub fn without_program(mut self, name: &str) -> Self {
        self.programs.remove(name);
        self
    }

    fn next_id(&mut self) -> usize {
        self.next_id += 1;
        self.next_id
    }

    pub fn draws_with(&self, program: &str) -> Vec<&RecordedDraw> {
        let Some(&handle) = self.programs.get(program) else {
            return Vec::new();
        };
        self.draws.iter().filter(|d| d.program == handle).collect()
    }
}

impl Backend for RecordingBackend {
    type Texture = RecordedTexture;
    type VertexBuffer = RecordedBuffer;
    type IndexBuffer = RecordedBuffer;
    type Offscreen = RecordedOffscreen;

    fn program(&mut self, name: &str) -> Option<ProgramHandle> {
        self.programs.get(name).copied()
    }

    fn create_texture(
        &mut self,
        label: &str,
        size: Size,
        pixels: &[u8],
    ) -> Result<Self::Texture, GfxError> {
        relief_render::texture::validate_dimensions(size)?;
        relief_render::texture::validate_data_size(pixels, size)?;
        self.textures_created += 1;
        Ok(RecordedTexture {
            id: self.next_id(),
            label: label.to_string(),
            size,
        })
    }

    fn create_vertex_buffer(
        &mut self,
        label: &str,
        vertices: &[RasterVertex],
    ) -> Result<Self::VertexBuffer, GfxError> {
        Ok(RecordedBuffer {
            id: self.next_id(),
            label: label.to_string(),
            len: vertices.len(),
        })
    }

    fn create_index_buffer(
        &mut self,
        label: &str,
        indices: &[u16],
    ) -> Result<Self::IndexBuffer, GfxError> {
        Ok(RecordedBuffer {
            id: self.next_id(),
            label: label.to_string(),
            len: indices.len(),
        })
    }

    fn create_offscreen_texture(
        &mut self,
        size: Size,
        channel: TextureChannelDataType,
    ) -> Result<Self::Offscreen, GfxError> {
        relief_render::texture::validate_dimensions(size)?;
        self.offscreens.push((size, channel));
        Ok(RecordedOffscreen {
            texture: RecordedTexture {
                id: self.next_id(),
                label: "offscreen".to_string(),
                size,
            },
            channel,
        })
    }

    fn offscreen_into_texture(&mut self, offscreen: Self::Offscreen) -> Self::Texture {
        offscreen.texture
    }

    fn draw(&mut self, target: DrawTarget<'_, Self>, call: DrawCall<'_, Self>) -> Result<(), GfxError> {
        let target = match target {
            DrawTarget::Frame => RecordedTarget::Frame,
            DrawTarget::Offscreen { target, clear } => RecordedTarget::Offscreen {
                texture: target.texture.id,
                clear,
            },
        };
        self.draws.push(RecordedDraw {
            program: call.program,
            label: call.label.to_string(),
            target,
            state: call.state,
            vertex_buffer: call.vertex_buffer.id,
            index_buffer: call.index_buffer.id,
            segments: call.segments.to_vec(),
            segments_addr: call.segments.as_ptr() as usize,
            uniforms: call.uniforms,
            texture: call.texture.texture.clone(),
            filter: call.texture.filter,
        });
        Ok(())
    }
}
