//! Hillshade programs: uniform blocks and WGSL sources.
//!
//! Two programs exist. `hillshade_prepare` turns a raw DEM raster into a
//! slope texture in an offscreen pass; `hillshade` shades that slope texture
//! onto the map.

use bytemuck::{Pod, Zeroable};

/// Name of the offscreen slope-derivation program.
pub const HILLSHADE_PREPARE_PROGRAM: &str = "hillshade_prepare";
/// Name of the on-map shading program.
pub const HILLSHADE_PROGRAM: &str = "hillshade";

/// Opaque reference to a program registered with a backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramHandle(pub u32);

/// Uniforms of the prepare program.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct HillshadePrepareUniforms {
    pub matrix: [[f32; 4]; 4],  // 64 bytes
    pub unpack: [f32; 4],       // 16 bytes
    pub dimension: [f32; 2],    // 8 bytes
    pub zoom: f32,
    pub maxzoom: f32,
}

/// Uniforms of the shading program.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct HillshadeUniforms {
    pub matrix: [[f32; 4]; 4],
    pub highlight: [f32; 4],
    pub shadow: [f32; 4],
    pub accent: [f32; 4],
    /// `[intensity, azimuth radians]`.
    pub light: [f32; 2],
    /// `[north, south]` latitude in degrees.
    pub latrange: [f32; 2],
}

/// The uniform block of one draw.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UniformBlock {
    HillshadePrepare(HillshadePrepareUniforms),
    Hillshade(HillshadeUniforms),
}

impl UniformBlock {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            UniformBlock::HillshadePrepare(u) => bytemuck::bytes_of(u),
            UniformBlock::Hillshade(u) => bytemuck::bytes_of(u),
        }
    }

    pub fn matrix(&self) -> &[[f32; 4]; 4] {
        match self {
            UniformBlock::HillshadePrepare(u) => &u.matrix,
            UniformBlock::Hillshade(u) => &u.matrix,
        }
    }

    pub(crate) fn matrix_mut(&mut self) -> &mut [[f32; 4]; 4] {
        match self {
            UniformBlock::HillshadePrepare(u) => &mut u.matrix,
            UniformBlock::Hillshade(u) => &mut u.matrix,
        }
    }
}

/// A program known to every backend.
#[derive(Clone, Copy, Debug)]
pub struct ProgramSource {
    pub name: &'static str,
    pub wgsl: &'static str,
    pub uniform_size: u64,
}

/// Programs registered at backend start-up.
pub const BUILTIN_PROGRAMS: [ProgramSource; 2] = [
    ProgramSource {
        name: HILLSHADE_PREPARE_PROGRAM,
        wgsl: HILLSHADE_PREPARE_SHADER_SOURCE,
        uniform_size: std::mem::size_of::<HillshadePrepareUniforms>() as u64,
    },
    ProgramSource {
        name: HILLSHADE_PROGRAM,
        wgsl: HILLSHADE_SHADER_SOURCE,
        uniform_size: std::mem::size_of::<HillshadeUniforms>() as u64,
    },
];

/// Derives x/y slopes from a 3×3 neighbourhood of DEM samples.
pub const HILLSHADE_PREPARE_SHADER_SOURCE: &str = r#"
struct HillshadePrepareUniforms {
    matrix: mat4x4<f32>,
    unpack: vec4<f32>,
    dimension: vec2<f32>,
    zoom: f32,
    maxzoom: f32,
};

@group(0) @binding(0)
var<uniform> uniforms: HillshadePrepareUniforms;
@group(0) @binding(1)
var t_image: texture_2d<f32>;
@group(0) @binding(2)
var s_image: sampler;

struct VertexInput {
    @location(0) pos: vec2<i32>,
    @location(1) texture_pos: vec2<u32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) pos: vec2<f32>,
};

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = uniforms.matrix * vec4<f32>(vec2<f32>(in.pos), 0.0, 1.0);

    // Skip the one-texel border around the DEM.
    let epsilon = 1.0 / uniforms.dimension;
    let scale = (uniforms.dimension.x - 2.0) / uniforms.dimension.x;
    out.pos = (vec2<f32>(in.texture_pos) / 8192.0) * scale + epsilon;
    return out;
}

fn get_elevation(coord: vec2<f32>) -> f32 {
    var data = textureSampleLevel(t_image, s_image, coord, 0.0) * 255.0;
    data.a = -1.0;
    return dot(data, uniforms.unpack) / 4.0;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let epsilon = 1.0 / uniforms.dimension;

    let a = get_elevation(in.pos + vec2<f32>(-epsilon.x, -epsilon.y));
    let b = get_elevation(in.pos + vec2<f32>(0.0, -epsilon.y));
    let c = get_elevation(in.pos + vec2<f32>(epsilon.x, -epsilon.y));
    let d = get_elevation(in.pos + vec2<f32>(-epsilon.x, 0.0));
    let f = get_elevation(in.pos + vec2<f32>(epsilon.x, 0.0));
    let g = get_elevation(in.pos + vec2<f32>(-epsilon.x, epsilon.y));
    let h = get_elevation(in.pos + vec2<f32>(0.0, epsilon.y));
    let i = get_elevation(in.pos + vec2<f32>(epsilon.x, epsilon.y));

    // Slopes are divided by 8 * metres-per-pixel, which reduces to
    // 2^(19.2562 - zoom), and exaggerated below the source max zoom.
    let exaggeration = select(select(0.3, 0.35, uniforms.zoom < 4.5), 0.4, uniforms.zoom < 2.0);
    let deriv = vec2<f32>(
        (c + f + f + i) - (a + d + d + g),
        (g + h + h + i) - (a + b + b + c),
    ) / pow(2.0, (uniforms.zoom - uniforms.maxzoom) * exaggeration + 19.2562 - uniforms.zoom);

    return clamp(
        vec4<f32>(deriv.x / 2.0 + 0.5, deriv.y / 2.0 + 0.5, 1.0, 1.0),
        vec4<f32>(0.0),
        vec4<f32>(1.0),
    );
}
"#;

/// Shades a prepared slope texture with highlight, shadow and accent colors.
pub const HILLSHADE_SHADER_SOURCE: &str = r#"
struct HillshadeUniforms {
    matrix: mat4x4<f32>,
    highlight: vec4<f32>,
    shadow: vec4<f32>,
    accent: vec4<f32>,
    light: vec2<f32>,
    latrange: vec2<f32>,
};

const PI: f32 = 3.141592653589793;

@group(0) @binding(0)
var<uniform> uniforms: HillshadeUniforms;
@group(0) @binding(1)
var t_image: texture_2d<f32>;
@group(0) @binding(2)
var s_image: sampler;

struct VertexInput {
    @location(0) pos: vec2<i32>,
    @location(1) texture_pos: vec2<u32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) pos: vec2<f32>,
};

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = uniforms.matrix * vec4<f32>(vec2<f32>(in.pos), 0.0, 1.0);
    out.pos = vec2<f32>(in.texture_pos) / 8192.0;
    return out;
}

// Floored modulo; WGSL `%` truncates.
fn floor_mod(x: f32, y: f32) -> f32 {
    return x - y * floor(x / y);
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let pixel = textureSample(t_image, s_image, in.pos);
    let deriv = pixel.rg * 2.0 - 1.0;

    // Undo mercator stretching at the pixel's approximate latitude.
    let scale_factor = cos(radians(
        (uniforms.latrange[0] - uniforms.latrange[1]) * (1.0 - in.pos.y) + uniforms.latrange[1]
    ));
    let slope = atan(1.25 * length(deriv) / scale_factor);

    var aspect: f32;
    if (deriv.x != 0.0) {
        aspect = atan2(deriv.y, -deriv.x);
    } else {
        aspect = PI / 2.0 * select(-1.0, 1.0, deriv.y > 0.0);
    }

    let intensity = uniforms.light.x;
    let azimuth = uniforms.light.y + PI;

    let base = 1.875 - intensity * 1.75;
    let max_value = 0.5 * PI;
    var scaled_slope = slope;
    if (intensity != 0.5) {
        scaled_slope = ((pow(base, slope) - 1.0) / (pow(base, max_value) - 1.0)) * max_value;
    }

    let strength = clamp(intensity * 2.0, 0.0, 1.0);
    let accent = cos(scaled_slope);
    let accent_color = (1.0 - accent) * uniforms.accent * strength;
    let shade = abs(floor_mod((aspect + azimuth) / PI + 0.5, 2.0) - 1.0);
    let shade_color = mix(uniforms.shadow, uniforms.highlight, shade) * sin(scaled_slope) * strength;
    return accent_color * (1.0 - shade_color.a) + shade_color;
}
"#;
