//! Headless wgpu implementation of [`Backend`].
//!
//! [`WgpuBackend`] owns the device, the program registry, a pipeline cache
//! and the frame target (an RGBA8 texture plus optional depth buffer). Each
//! draw is encoded into its own render pass and submitted immediately; the
//! caller never waits on the GPU except through [`WgpuBackend::read_frame_rgba`].

use std::sync::Arc;

use glam::{Mat4, Vec3};
use relief_style::Color;
use wgpu::util::DeviceExt;

use crate::backend::{Backend, DrawCall, DrawTarget};
use crate::buffer::RasterVertex;
use crate::depth::DepthBuffer;
use crate::error::GfxError;
use crate::pipeline::{PipelineCache, PipelineKey};
use crate::program::ProgramHandle;
use crate::shader::ProgramLibrary;
use crate::state::{Size, TextureChannelDataType, TextureFilter};
use crate::texture::{
    GpuTexture, OffscreenTexture, TextureHandle, create_gpu_texture, extent, offscreen_format,
    upload_rgba8,
};

/// The color target frames are composed into.
struct FrameTarget {
    color: TextureHandle,
    depth: Option<DepthBuffer>,
}

impl FrameTarget {
    fn new(device: &wgpu::Device, size: Size, with_depth: bool) -> Result<Self, GfxError> {
        let color = create_gpu_texture(
            device,
            "frame",
            size,
            WgpuBackend::FRAME_FORMAT,
            wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        )?;
        let depth = with_depth.then(|| DepthBuffer::new(device, size.width, size.height));
        Ok(Self { color, depth })
    }
}

/// wgpu device plus everything needed to execute [`DrawCall`]s.
pub struct WgpuBackend {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    programs: ProgramLibrary,
    pipelines: PipelineCache,
    sampler_linear: wgpu::Sampler,
    sampler_nearest: wgpu::Sampler,
    frame: FrameTarget,
    draws_submitted: u64,
}

impl WgpuBackend {
    /// Format of the frame target.
    pub const FRAME_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

    /// Initialize a headless GPU device and a frame target of `size`.
    pub async fn new(size: Size, with_depth: bool) -> Result<Self, GfxError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = match instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
        {
            Ok(adapter) => adapter,
            Err(_) => return Err(GfxError::NoAdapter),
        };

        let info = adapter.get_info();
        log::info!(
            "Selected GPU: {} ({:?}, {:?})",
            info.name,
            info.backend,
            info.device_type
        );

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("relief-device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::default(),
                experimental_features: wgpu::ExperimentalFeatures::default(),
                trace: wgpu::Trace::Off,
            })
            .await?;

        Self::from_device(device, queue, size, with_depth)
    }

    /// Wrap an existing device.
    pub fn from_device(
        device: wgpu::Device,
        queue: wgpu::Queue,
        size: Size,
        with_depth: bool,
    ) -> Result<Self, GfxError> {
        let programs = ProgramLibrary::with_builtin_programs(&device);
        let pipelines = PipelineCache::new(&device);

        let sampler_linear = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("sampler-linear"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        });
        let sampler_nearest = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("sampler-nearest"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        });

        let frame = FrameTarget::new(&device, size, with_depth)?;

        Ok(Self {
            device,
            queue,
            programs,
            pipelines,
            sampler_linear,
            sampler_nearest,
            frame,
            draws_submitted: 0,
        })
    }

    /// Initialize synchronously using `pollster`.
    pub fn new_blocking(size: Size, with_depth: bool) -> Result<Self, GfxError> {
        pollster::block_on(Self::new(size, with_depth))
    }

    pub fn frame_size(&self) -> Size {
        self.frame.color.size
    }

    /// Recreate the frame target at a new size.
    pub fn resize(&mut self, size: Size) -> Result<(), GfxError> {
        if size == self.frame_size() {
            return Ok(());
        }
        let color = create_gpu_texture(
            &self.device,
            "frame",
            size,
            Self::FRAME_FORMAT,
            wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        )?;
        if let Some(depth) = self.frame.depth.as_mut() {
            depth.resize(&self.device, size.width, size.height);
        }
        self.frame.color = color;
        Ok(())
    }

    /// Clear the frame color to `clear` and its depth to the far plane.
    pub fn begin_frame(&mut self, clear: Color) {
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("begin-frame"),
            });
        {
            let depth_stencil_attachment =
                self.frame
                    .depth
                    .as_ref()
                    .map(|depth| wgpu::RenderPassDepthStencilAttachment {
                        view: &depth.view,
                        depth_ops: Some(wgpu::Operations {
                            load: wgpu::LoadOp::Clear(DepthBuffer::CLEAR_VALUE),
                            store: wgpu::StoreOp::Store,
                        }),
                        stencil_ops: None,
                    });
            let _pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("clear-frame"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.frame.color.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(to_wgpu_color(clear)),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
        }
        self.queue.submit(Some(encoder.finish()));
    }

    /// Number of draws executed since creation.
    pub fn draws_submitted(&self) -> u64 {
        self.draws_submitted
    }

    /// Number of distinct pipelines compiled so far.
    pub fn pipeline_count(&self) -> usize {
        self.pipelines.len()
    }

    /// Copy the frame back to the CPU as tightly packed RGBA8 rows.
    pub fn read_frame_rgba(&self) -> Result<Vec<u8>, GfxError> {
        self.read_texture(&self.frame.color)
    }

    /// Copy any texture created by this backend back to the CPU, rows tightly
    /// packed.
    pub fn read_texture(&self, texture: &GpuTexture) -> Result<Vec<u8>, GfxError> {
        let Size { width, height } = texture.size;
        let bpp = texture.format.block_copy_size(None).unwrap_or(4);
        let unpadded = width * bpp;
        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let padded = unpadded.div_ceil(align) * align;

        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("texture-readback"),
            size: u64::from(padded * height),
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("texture-readback"),
            });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &texture.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded),
                    rows_per_image: Some(height),
                },
            },
            extent(texture.size),
        );
        self.queue.submit(Some(encoder.finish()));

        let slice = buffer.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        self.device
            .poll(wgpu::PollType::Wait {
                submission_index: None,
                timeout: None,
            })
            .map_err(|e| GfxError::BufferMap(e.to_string()))?;
        rx.recv()
            .map_err(|e| GfxError::BufferMap(e.to_string()))?
            .map_err(|e| GfxError::BufferMap(e.to_string()))?;

        let mapped = slice.get_mapped_range();
        let mut pixels = Vec::with_capacity((unpadded * height) as usize);
        for row in 0..height {
            let start = (row * padded) as usize;
            pixels.extend_from_slice(&mapped[start..start + unpadded as usize]);
        }
        drop(mapped);
        buffer.unmap();
        Ok(pixels)
    }
}

impl Backend for WgpuBackend {
    type Texture = TextureHandle;
    type VertexBuffer = wgpu::Buffer;
    type IndexBuffer = wgpu::Buffer;
    type Offscreen = OffscreenTexture;

    fn program(&mut self, name: &str) -> Option<ProgramHandle> {
        self.programs.handle(name)
    }

    fn create_texture(
        &mut self,
        label: &str,
        size: Size,
        pixels: &[u8],
    ) -> Result<Self::Texture, GfxError> {
        upload_rgba8(&self.device, &self.queue, label, size, pixels)
    }

    fn create_vertex_buffer(
        &mut self,
        label: &str,
        vertices: &[RasterVertex],
    ) -> Result<Self::VertexBuffer, GfxError> {
        Ok(self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::cast_slice(vertices),
                usage: wgpu::BufferUsages::VERTEX,
            }))
    }

    fn create_index_buffer(
        &mut self,
        label: &str,
        indices: &[u16],
    ) -> Result<Self::IndexBuffer, GfxError> {
        Ok(self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::cast_slice(indices),
                usage: wgpu::BufferUsages::INDEX,
            }))
    }

    fn create_offscreen_texture(
        &mut self,
        size: Size,
        channel: TextureChannelDataType,
    ) -> Result<Self::Offscreen, GfxError> {
        let texture = create_gpu_texture(
            &self.device,
            "offscreen",
            size,
            offscreen_format(channel),
            wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC,
        )?;
        Ok(OffscreenTexture { texture })
    }

    fn offscreen_into_texture(&mut self, offscreen: Self::Offscreen) -> Self::Texture {
        offscreen.texture
    }

    fn draw(&mut self, target: DrawTarget<'_, Self>, call: DrawCall<'_, Self>) -> Result<(), GfxError> {
        let program = self
            .programs
            .get(call.program)
            .ok_or(GfxError::UnknownProgram(call.program))?;

        let mut uniforms = call.uniforms;
        let (color, load, depth) = match target {
            DrawTarget::Frame => (
                Arc::clone(&self.frame.color),
                wgpu::LoadOp::Load,
                self.frame.depth.as_ref(),
            ),
            DrawTarget::Offscreen { target, clear } => {
                // Offscreen targets are addressed bottom-up so that the
                // resulting texture has the same row order as its source.
                flip_y(uniforms.matrix_mut());
                let load = clear.map_or(wgpu::LoadOp::Load, |c| wgpu::LoadOp::Clear(to_wgpu_color(c)));
                (Arc::clone(&target.texture), load, None)
            }
        };

        let key = PipelineKey::new(call.program, &call.state, color.format, depth.is_some());
        let pipeline = self.pipelines.get_or_create(&self.device, program, key);

        let uniform_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(call.label),
                contents: uniforms.as_bytes(),
                usage: wgpu::BufferUsages::UNIFORM,
            });
        let sampler = match call.texture.filter {
            TextureFilter::Nearest => &self.sampler_nearest,
            TextureFilter::Linear => &self.sampler_linear,
        };
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(call.label),
            layout: self.pipelines.bind_group_layout(),
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&call.texture.texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some(call.label),
            });
        {
            let depth_stencil_attachment =
                depth.map(|depth| wgpu::RenderPassDepthStencilAttachment {
                    view: &depth.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                });
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some(call.label),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &color.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            let (near, far) = if depth.is_some() {
                call.state.depth.range
            } else {
                (0.0, 1.0)
            };
            pass.set_viewport(
                0.0,
                0.0,
                color.size.width as f32,
                color.size.height as f32,
                near,
                far,
            );
            pass.set_pipeline(&pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.set_vertex_buffer(0, call.vertex_buffer.slice(..));
            pass.set_index_buffer(call.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
            for segment in call.segments.iter().filter(|s| s.index_length > 0) {
                let first = segment.index_offset as u32;
                pass.draw_indexed(
                    first..first + segment.index_length as u32,
                    segment.vertex_offset as i32,
                    0..1,
                );
            }
        }
        self.queue.submit(Some(encoder.finish()));
        self.draws_submitted += 1;
        log::trace!("Submitted draw '{}'", call.label);
        Ok(())
    }
}

fn flip_y(matrix: &mut [[f32; 4]; 4]) {
    let flipped = Mat4::from_scale(Vec3::new(1.0, -1.0, 1.0)) * Mat4::from_cols_array_2d(matrix);
    *matrix = flipped.to_cols_array_2d();
}

fn to_wgpu_color(color: Color) -> wgpu::Color {
    wgpu::Color {
        r: f64::from(color.r),
        g: f64::from(color.g),
        b: f64::from(color.b),
        a: f64::from(color.a),
    }
}
