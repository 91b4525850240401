use relief_render::GfxError;

/// A DEM raster whose geometry does not add up.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DemError {
    #[error("DEM dimension must be non-zero")]
    ZeroDimension,

    /// The padded row length is shorter than the data it pads.
    #[error("DEM stride {stride} is smaller than its dimension {dim}")]
    StrideTooSmall { dim: u32, stride: u32 },

    #[error("DEM holds {actual} bytes, expected {expected} for stride {stride}")]
    PixelCountMismatch {
        actual: usize,
        expected: usize,
        stride: u32,
    },
}

/// Errors surfaced while uploading or drawing hillshade tiles.
#[derive(Debug, thiserror::Error)]
pub enum HillshadeError {
    #[error("GPU error: {0}")]
    Gfx(#[from] GfxError),

    #[error("invalid DEM: {0}")]
    Dem(#[from] DemError),
}
