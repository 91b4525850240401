//! GPU textures and the validation shared by every upload path.

use std::sync::Arc;

use crate::error::GfxError;
use crate::state::{Size, TextureChannelDataType};

/// A GPU texture with its default view.
#[derive(Debug)]
pub struct GpuTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub size: Size,
    pub format: wgpu::TextureFormat,
}

/// Shared handle to a [`GpuTexture`].
pub type TextureHandle = Arc<GpuTexture>;

/// An offscreen color target. Its texture outlives it.
#[derive(Debug)]
pub struct OffscreenTexture {
    pub(crate) texture: TextureHandle,
}

impl OffscreenTexture {
    pub fn size(&self) -> Size {
        self.texture.size
    }
}

/// Format of an offscreen target with the given channel type.
pub fn offscreen_format(channel: TextureChannelDataType) -> wgpu::TextureFormat {
    match channel {
        TextureChannelDataType::UnsignedByte => wgpu::TextureFormat::Rgba8Unorm,
        TextureChannelDataType::HalfFloat => wgpu::TextureFormat::Rgba16Float,
    }
}

/// Create an empty 2D texture.
pub(crate) fn create_gpu_texture(
    device: &wgpu::Device,
    label: &str,
    size: Size,
    format: wgpu::TextureFormat,
    usage: wgpu::TextureUsages,
) -> Result<TextureHandle, GfxError> {
    validate_dimensions(size)?;

    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: extent(size),
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

    Ok(Arc::new(GpuTexture {
        texture,
        view,
        size,
        format,
    }))
}

/// Create an RGBA8 texture and upload `pixels` into it.
pub(crate) fn upload_rgba8(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    label: &str,
    size: Size,
    pixels: &[u8],
) -> Result<TextureHandle, GfxError> {
    validate_dimensions(size)?;
    validate_data_size(pixels, size)?;

    let handle = create_gpu_texture(
        device,
        label,
        size,
        wgpu::TextureFormat::Rgba8Unorm,
        wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
    )?;

    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &handle.texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        pixels,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(size.width * 4),
            rows_per_image: None,
        },
        extent(size),
    );

    log::debug!("Created texture '{label}' ({}x{})", size.width, size.height);
    Ok(handle)
}

pub(crate) fn extent(size: Size) -> wgpu::Extent3d {
    wgpu::Extent3d {
        width: size.width,
        height: size.height,
        depth_or_array_layers: 1,
    }
}

/// Validate that dimensions are non-zero.
pub fn validate_dimensions(size: Size) -> Result<(), GfxError> {
    if size.is_empty() {
        return Err(GfxError::ZeroDimensions {
            width: size.width,
            height: size.height,
        });
    }
    Ok(())
}

/// Validate that `data` holds exactly one RGBA8 image of `size`.
pub fn validate_data_size(data: &[u8], size: Size) -> Result<(), GfxError> {
    let expected = size.width as usize * size.height as usize * 4;
    if data.len() != expected {
        return Err(GfxError::DataSizeMismatch {
            actual: data.len(),
            expected,
            width: size.width,
            height: size.height,
        });
    }
    Ok(())
}

/// Create a test GPU device and queue. Returns `None` if no GPU is available.
#[cfg(test)]
pub(crate) fn create_test_device_queue() -> Option<(wgpu::Device, wgpu::Queue)> {
    pollster::block_on(async {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok()?;

        adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::default(),
                experimental_features: Default::default(),
                ..Default::default()
            })
            .await
            .ok()
    })
}
