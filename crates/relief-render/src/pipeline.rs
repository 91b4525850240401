//! Render pipelines built on demand from a program and a [`DrawState`].

use std::collections::HashMap;
use std::num::NonZeroU64;
use std::sync::Arc;

use crate::buffer::RasterVertex;
use crate::depth::DepthBuffer;
use crate::program::ProgramHandle;
use crate::shader::LoadedProgram;
use crate::state::{
    BlendFunction, ColorMask, CullFaceMode, CullFaceSide, DepthFunction, DepthMaskType, DrawState,
    FrontFace, StencilMode,
};

/// The parts of a draw that select a distinct pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PipelineKey {
    pub program: ProgramHandle,
    pub color_format: wgpu::TextureFormat,
    /// `None` when the target has no depth attachment.
    pub depth: Option<(DepthFunction, DepthMaskType)>,
    pub blend: BlendFunction,
    pub mask: ColorMask,
    pub cull: CullFaceMode,
    pub stencil: StencilMode,
}

impl PipelineKey {
    pub fn new(
        program: ProgramHandle,
        state: &DrawState,
        color_format: wgpu::TextureFormat,
        has_depth: bool,
    ) -> Self {
        Self {
            program,
            color_format,
            depth: has_depth.then_some((state.depth.func, state.depth.mask)),
            blend: state.color.blend,
            mask: state.color.mask,
            cull: state.cull,
            stencil: state.stencil,
        }
    }
}

/// Pipelines keyed by [`PipelineKey`], sharing one bind group layout.
pub struct PipelineCache {
    bind_group_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    pipelines: HashMap<PipelineKey, Arc<wgpu::RenderPipeline>>,
}

impl PipelineCache {
    pub fn new(device: &wgpu::Device) -> Self {
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("program-bind-group-layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: NonZeroU64::new(96), // smallest uniform block
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("program-pipeline-layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        Self {
            bind_group_layout,
            pipeline_layout,
            pipelines: HashMap::new(),
        }
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout
    }

    /// Number of compiled pipelines.
    pub fn len(&self) -> usize {
        self.pipelines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pipelines.is_empty()
    }

    /// Fetch the pipeline for `key`, compiling it on first use.
    pub fn get_or_create(
        &mut self,
        device: &wgpu::Device,
        program: &LoadedProgram,
        key: PipelineKey,
    ) -> Arc<wgpu::RenderPipeline> {
        if let Some(pipeline) = self.pipelines.get(&key) {
            return Arc::clone(pipeline);
        }

        let pipeline = Arc::new(create_pipeline(device, &self.pipeline_layout, program, &key));
        log::debug!("Compiled pipeline for '{}' ({key:?})", program.name);
        self.pipelines.insert(key, Arc::clone(&pipeline));
        pipeline
    }
}

fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    program: &LoadedProgram,
    key: &PipelineKey,
) -> wgpu::RenderPipeline {
    let depth_stencil = key.depth.map(|(func, mask)| wgpu::DepthStencilState {
        format: DepthBuffer::FORMAT,
        depth_write_enabled: mask == DepthMaskType::ReadWrite,
        depth_compare: compare_function(func),
        stencil: match key.stencil {
            StencilMode::Disabled => wgpu::StencilState::default(),
        },
        bias: wgpu::DepthBiasState::default(),
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(program.name.as_str()),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: &program.module,
            entry_point: Some("vs_main"),
            buffers: &[RasterVertex::layout()],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: front_face(key.cull.front_face),
            cull_mode: cull_mode(&key.cull),
            unclipped_depth: false,
            polygon_mode: wgpu::PolygonMode::Fill,
            conservative: false,
        },
        depth_stencil,
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        fragment: Some(wgpu::FragmentState {
            module: &program.module,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: key.color_format,
                blend: blend_state(key.blend),
                write_mask: color_writes(key.mask),
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        multiview_mask: None,
        cache: None,
    })
}

pub(crate) fn compare_function(func: DepthFunction) -> wgpu::CompareFunction {
    match func {
        DepthFunction::Never => wgpu::CompareFunction::Never,
        DepthFunction::Less => wgpu::CompareFunction::Less,
        DepthFunction::Equal => wgpu::CompareFunction::Equal,
        DepthFunction::LessEqual => wgpu::CompareFunction::LessEqual,
        DepthFunction::Greater => wgpu::CompareFunction::Greater,
        DepthFunction::NotEqual => wgpu::CompareFunction::NotEqual,
        DepthFunction::GreaterEqual => wgpu::CompareFunction::GreaterEqual,
        DepthFunction::Always => wgpu::CompareFunction::Always,
    }
}

pub(crate) fn blend_state(blend: BlendFunction) -> Option<wgpu::BlendState> {
    match blend {
        BlendFunction::Replace => None,
        BlendFunction::PremultipliedAlpha => Some(wgpu::BlendState::PREMULTIPLIED_ALPHA_BLENDING),
    }
}

fn color_writes(mask: ColorMask) -> wgpu::ColorWrites {
    let mut writes = wgpu::ColorWrites::empty();
    if mask.r {
        writes |= wgpu::ColorWrites::RED;
    }
    if mask.g {
        writes |= wgpu::ColorWrites::GREEN;
    }
    if mask.b {
        writes |= wgpu::ColorWrites::BLUE;
    }
    if mask.a {
        writes |= wgpu::ColorWrites::ALPHA;
    }
    writes
}

fn cull_mode(cull: &CullFaceMode) -> Option<wgpu::Face> {
    if !cull.enabled {
        return None;
    }
    Some(match cull.side {
        CullFaceSide::Front => wgpu::Face::Front,
        CullFaceSide::Back => wgpu::Face::Back,
    })
}

fn front_face(face: FrontFace) -> wgpu::FrontFace {
    match face {
        FrontFace::Clockwise => wgpu::FrontFace::Cw,
        FrontFace::CounterClockwise => wgpu::FrontFace::Ccw,
    }
}
