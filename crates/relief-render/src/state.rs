//! Backend-neutral draw state: depth, stencil, color blending and culling.
//!
//! Each draw carries a complete [`DrawState`]. Backends translate it into
//! their own pipeline state; nothing here depends on wgpu.

/// Width and height in pixels or texels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub const fn square(dim: u32) -> Self {
        Self::new(dim, dim)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Per-channel storage of an offscreen color target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextureChannelDataType {
    UnsignedByte,
    HalfFloat,
}

/// Sampling filter used when a texture is bound to a draw.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextureFilter {
    Nearest,
    Linear,
}

// --- Depth ---

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DepthFunction {
    Never,
    Less,
    Equal,
    LessEqual,
    Greater,
    NotEqual,
    GreaterEqual,
    Always,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DepthMaskType {
    ReadOnly,
    ReadWrite,
}

/// Depth test plus the depth range the draw is squeezed into.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DepthMode {
    pub func: DepthFunction,
    pub mask: DepthMaskType,
    /// `(near, far)` in normalized depth.
    pub range: (f32, f32),
}

impl DepthMode {
    pub fn disabled() -> Self {
        Self {
            func: DepthFunction::Always,
            mask: DepthMaskType::ReadOnly,
            range: (0.0, 1.0),
        }
    }
}

// --- Stencil ---

/// Stencil testing. Tiles are clipped by their own geometry, so only the
/// disabled mode exists.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StencilMode {
    Disabled,
}

impl StencilMode {
    pub const fn disabled() -> Self {
        StencilMode::Disabled
    }
}

// --- Color ---

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlendFunction {
    /// Source replaces destination.
    Replace,
    /// `src + dst * (1 - src.a)` for premultiplied colors.
    PremultipliedAlpha,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ColorMask {
    pub r: bool,
    pub g: bool,
    pub b: bool,
    pub a: bool,
}

impl ColorMask {
    pub const ALL: ColorMask = ColorMask {
        r: true,
        g: true,
        b: true,
        a: true,
    };
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ColorMode {
    pub blend: BlendFunction,
    pub mask: ColorMask,
}

impl ColorMode {
    pub fn unblended() -> Self {
        Self {
            blend: BlendFunction::Replace,
            mask: ColorMask::ALL,
        }
    }

    pub fn alpha_blended() -> Self {
        Self {
            blend: BlendFunction::PremultipliedAlpha,
            mask: ColorMask::ALL,
        }
    }
}

// --- Culling ---

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CullFaceSide {
    Front,
    Back,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FrontFace {
    Clockwise,
    CounterClockwise,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CullFaceMode {
    pub enabled: bool,
    pub side: CullFaceSide,
    pub front_face: FrontFace,
}

impl CullFaceMode {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            side: CullFaceSide::Back,
            front_face: FrontFace::CounterClockwise,
        }
    }

    pub fn back_ccw() -> Self {
        Self {
            enabled: true,
            ..Self::disabled()
        }
    }
}

/// Everything a draw needs besides geometry, uniforms and textures.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawState {
    pub depth: DepthMode,
    pub stencil: StencilMode,
    pub color: ColorMode,
    pub cull: CullFaceMode,
}
