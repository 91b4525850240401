//! Raster vertex format, draw segments and the geometry shared by every tile.

use bytemuck::{Pod, Zeroable};
use relief_geo::EXTENT;

use crate::backend::Backend;
use crate::error::GfxError;

/// A vertex of a raster quad: position and texture position, both in tile
/// units (`0..=EXTENT`).
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct RasterVertex {
    pub pos: [i16; 2],
    pub texture_pos: [u16; 2],
}

impl RasterVertex {
    pub fn new(x: i16, y: i16, tx: u16, ty: u16) -> Self {
        Self {
            pos: [x, y],
            texture_pos: [tx, ty],
        }
    }

    /// Get the vertex buffer layout for this vertex type.
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        use wgpu::{VertexAttribute, VertexFormat};

        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<RasterVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: VertexFormat::Sint16x2,
                },
                VertexAttribute {
                    offset: std::mem::size_of::<[i16; 2]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: VertexFormat::Uint16x2,
                },
            ],
        }
    }
}

/// A contiguous run of indexed geometry drawn with one call.
///
/// Indices inside a segment are relative to `vertex_offset`, which keeps
/// them within `u16` range for large buffers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Segment {
    pub vertex_offset: usize,
    pub index_offset: usize,
    pub vertex_length: usize,
    pub index_length: usize,
}

impl Segment {
    pub fn new(
        vertex_offset: usize,
        index_offset: usize,
        vertex_length: usize,
        index_length: usize,
    ) -> Self {
        Self {
            vertex_offset,
            index_offset,
            vertex_length,
            index_length,
        }
    }
}

/// The full-tile quad: four corners of the tile square.
pub fn raster_vertices() -> [RasterVertex; 4] {
    let e = EXTENT as i16;
    let t = EXTENT as u16;
    [
        RasterVertex::new(0, 0, 0, 0),
        RasterVertex::new(e, 0, t, 0),
        RasterVertex::new(0, e, 0, t),
        RasterVertex::new(e, e, t, t),
    ]
}

/// Two triangles over [`raster_vertices`].
pub const QUAD_TRIANGLE_INDICES: [u16; 6] = [0, 1, 2, 1, 2, 3];

/// GPU geometry created once per backend and shared by all layers.
pub struct StaticData<B: Backend> {
    pub raster_vertex_buffer: B::VertexBuffer,
    pub quad_triangle_index_buffer: B::IndexBuffer,
}

impl<B: Backend> StaticData<B> {
    pub fn new(backend: &mut B) -> Result<Self, GfxError> {
        let raster_vertex_buffer = backend.create_vertex_buffer("raster-vertices", &raster_vertices())?;
        let quad_triangle_index_buffer =
            backend.create_index_buffer("quad-triangle-indices", &QUAD_TRIANGLE_INDICES)?;
        Ok(Self {
            raster_vertex_buffer,
            quad_triangle_index_buffer,
        })
    }

    /// A fresh copy of the single segment covering the full-tile quad.
    pub fn raster_segments(&self) -> Vec<Segment> {
        full_tile_segments()
    }
}

fn full_tile_segments() -> Vec<Segment> {
    vec![Segment::new(0, 0, 4, 6)]
}
