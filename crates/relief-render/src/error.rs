//! Errors raised by the GPU layer.

use crate::program::ProgramHandle;

/// Failures when creating GPU resources or submitting draws.
#[derive(Debug, thiserror::Error)]
pub enum GfxError {
    /// Width or height is zero.
    #[error("texture dimensions must be non-zero, got {width}x{height}")]
    ZeroDimensions { width: u32, height: u32 },

    /// Pixel data length doesn't match the RGBA8 size for the given dimensions.
    #[error("texture data size ({actual}) does not match expected ({expected}) for {width}x{height}")]
    DataSizeMismatch {
        actual: usize,
        expected: usize,
        width: u32,
        height: u32,
    },

    /// A draw referenced a program handle this backend never handed out.
    #[error("program {0:?} is not registered")]
    UnknownProgram(ProgramHandle),

    /// No compatible GPU adapter found.
    #[error("no compatible GPU adapter found")]
    NoAdapter,

    /// Failed to request GPU device.
    #[error("failed to request GPU device: {0}")]
    DeviceRequest(#[from] wgpu::RequestDeviceError),

    /// Reading a buffer back from the GPU failed.
    #[error("failed to map readback buffer: {0}")]
    BufferMap(String),
}
