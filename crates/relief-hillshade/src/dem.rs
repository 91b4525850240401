//! Encoded elevation rasters.
//!
//! A [`DemData`] is an RGBA8 raster of `stride × stride` texels whose inner
//! `dim × dim` block is the tile itself. The remaining rows and columns form a
//! border so that slopes can be derived at the tile edge. Elevation is never
//! decoded on the CPU: the 4-component [`DemEncoding::unpack_vector`] is
//! handed to the prepare program, which decodes `dot(rgb·255, unpack.rgb) − unpack.a`.

use std::sync::Arc;

use crate::error::DemError;

/// How elevation is packed into the color channels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DemEncoding {
    /// `(r·65536 + g·256 + b)·0.1 − 10000` metres.
    Mapbox,
    /// `r·256 + g + b/256 − 32768` metres.
    Terrarium,
    /// Caller-supplied unpack vector.
    Custom([f32; 4]),
}

impl DemEncoding {
    /// Coefficients for `r`, `g`, `b` and the offset subtracted at the end.
    pub fn unpack_vector(&self) -> [f32; 4] {
        match self {
            DemEncoding::Mapbox => [6553.6, 25.6, 0.1, 10000.0],
            DemEncoding::Terrarium => [256.0, 1.0, 1.0 / 256.0, 32768.0],
            DemEncoding::Custom(unpack) => *unpack,
        }
    }
}

/// An immutable, validated DEM raster. Clones share the pixel data.
#[derive(Clone, Debug, PartialEq)]
pub struct DemData {
    dim: u32,
    stride: u32,
    encoding: DemEncoding,
    pixels: Arc<[u8]>,
}

impl DemData {
    /// Wrap an already padded raster of `stride × stride` RGBA8 texels.
    pub fn new(
        dim: u32,
        stride: u32,
        encoding: DemEncoding,
        pixels: Vec<u8>,
    ) -> Result<Self, DemError> {
        if dim == 0 {
            return Err(DemError::ZeroDimension);
        }
        if stride < dim {
            return Err(DemError::StrideTooSmall { dim, stride });
        }
        let expected = stride as usize * stride as usize * 4;
        if pixels.len() != expected {
            return Err(DemError::PixelCountMismatch {
                actual: pixels.len(),
                expected,
                stride,
            });
        }
        Ok(Self {
            dim,
            stride,
            encoding,
            pixels: pixels.into(),
        })
    }

    /// Build from an unpadded `dim × dim` tile image, adding a one-texel
    /// border that repeats the outermost rows and columns.
    pub fn from_tile_image(dim: u32, encoding: DemEncoding, image: &[u8]) -> Result<Self, DemError> {
        if dim == 0 {
            return Err(DemError::ZeroDimension);
        }
        let expected = dim as usize * dim as usize * 4;
        if image.len() != expected {
            return Err(DemError::PixelCountMismatch {
                actual: image.len(),
                expected,
                stride: dim,
            });
        }

        let stride = dim + 2;
        let mut pixels = vec![0u8; stride as usize * stride as usize * 4];
        for y in 0..stride {
            let src_y = y.saturating_sub(1).min(dim - 1);
            for x in 0..stride {
                let src_x = x.saturating_sub(1).min(dim - 1);
                let src = (src_y * dim + src_x) as usize * 4;
                let dst = (y * stride + x) as usize * 4;
                pixels[dst..dst + 4].copy_from_slice(&image[src..src + 4]);
            }
        }
        Self::new(dim, stride, encoding, pixels)
    }

    /// Side of the square tile, excluding the border.
    pub fn dim(&self) -> u32 {
        self.dim
    }

    /// Side of the padded raster.
    pub fn stride(&self) -> u32 {
        self.stride
    }

    pub fn encoding(&self) -> DemEncoding {
        self.encoding
    }

    pub fn unpack_vector(&self) -> [f32; 4] {
        self.encoding.unpack_vector()
    }

    /// Raw RGBA8 texels, `stride` per row.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Texel at padded coordinates `(x, y)`, `None` outside the stride.
    pub fn texel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.stride || y >= self.stride {
            return None;
        }
        let i = (y as usize * self.stride as usize + x as usize) * 4;
        self.pixels.get(i..i + 4)?.try_into().ok()
    }
}

/// Encode `metres` as a Terrarium texel.
pub fn encode_terrarium(metres: f32) -> [u8; 4] {
    let v = (metres + 32768.0).clamp(0.0, 65535.996);
    let r = (v / 256.0).floor();
    let g = (v - r * 256.0).floor();
    let b = ((v - r * 256.0 - g) * 256.0).floor();
    [r as u8, g as u8, b as u8, 255]
}
