//! Scheduling and pipeline tests for the hillshade layer, run against a
//! recording backend.

use std::collections::HashMap;
use std::f32::consts::FRAC_PI_2;
use std::sync::Arc;
use std::time::Instant;

use glam::Mat4;
use relief_geo::{CanonicalTileId, TileMask, TransformState, UnwrappedTileId, tile_row_latitude};
use relief_render::{
    BlendFunction, DepthFunction, DepthMaskType, PaintParameters, Segment, Size, StaticData,
    TextureChannelDataType, TextureFilter, UniformBlock,
};
use relief_style::{
    Color, HillshadePaintProperties, IlluminationAnchor, PropertyEvaluationParameters, RenderPass,
    RenderPasses, Transitionable,
};

use super::*;
use crate::dem::{DemData, DemEncoding};
use crate::testing::{RecordedTarget, RecordingBackend};

struct TestSource {
    tiles: Arc<[RenderTile]>,
    buckets: HashMap<UnwrappedTileId, HillshadeBucket<RecordingBackend>>,
    max_zoom: u8,
}

impl TestSource {
    fn new(ids: &[UnwrappedTileId]) -> Self {
        let tiles: Vec<RenderTile> = ids
            .iter()
            .map(|&id| RenderTile {
                id,
                matrix: Mat4::IDENTITY,
            })
            .collect();
        Self {
            tiles: tiles.into(),
            buckets: HashMap::new(),
            max_zoom: 15,
        }
    }

    fn with_dem(mut self, id: UnwrappedTileId, dem: DemData, backend: &mut RecordingBackend) -> Self {
        let mut bucket = HillshadeBucket::new(dem);
        bucket.upload(backend).unwrap();
        self.buckets.insert(id, bucket);
        self
    }

    fn bucket(&self, id: &UnwrappedTileId) -> &HillshadeBucket<RecordingBackend> {
        &self.buckets[id]
    }
}

impl RenderSource for TestSource {
    type Backend = RecordingBackend;

    fn render_tiles(&self) -> Arc<[RenderTile]> {
        Arc::clone(&self.tiles)
    }

    fn max_zoom(&self) -> u8 {
        self.max_zoom
    }

    fn bucket_mut(&mut self, id: &UnwrappedTileId) -> Option<&mut HillshadeBucket<RecordingBackend>> {
        self.buckets.get_mut(id)
    }
}

fn paint(exaggeration: f32, direction: f32, anchor: IlluminationAnchor) -> HillshadePaintProperties {
    HillshadePaintProperties {
        exaggeration: Transitionable::constant(exaggeration),
        illumination_direction: Transitionable::constant(direction),
        illumination_anchor: Transitionable::constant(anchor),
        ..Default::default()
    }
}

fn evaluated_layer(paint: HillshadePaintProperties) -> RenderHillshadeLayer {
    let mut layer = RenderHillshadeLayer::new("hillshade", paint);
    layer.evaluate(&PropertyEvaluationParameters::new(10.0, Instant::now()));
    layer
}

fn dem_256() -> DemData {
    DemData::new(
        256,
        260,
        DemEncoding::Custom([1.0, 0.0, 0.0, 0.0]),
        vec![0; 260 * 260 * 4],
    )
    .unwrap()
}

fn small_dem() -> DemData {
    DemData::from_tile_image(2, DemEncoding::Terrarium, &[0; 16]).unwrap()
}

fn run_pass(
    layer: &mut RenderHillshadeLayer,
    source: &mut TestSource,
    backend: &mut RecordingBackend,
    static_data: &StaticData<RecordingBackend>,
    transform: &TransformState,
    pass: RenderPass,
) {
    layer.prepare(&LayerPrepareParameters::from_source(&*source));
    let mut parameters = PaintParameters::new(pass, transform, backend, static_data, 1);
    layer.render(&mut parameters, source).unwrap();
}

fn tile(z: u8, x: i64, y: i64) -> UnwrappedTileId {
    UnwrappedTileId::new(z, x, y)
}

#[test]
fn test_passes_follow_exaggeration() {
    let both = RenderPasses::of(&[RenderPass::Translucent, RenderPass::Pass3D]);
    for (exaggeration, expected) in [
        (0.0, RenderPasses::NONE),
        (0.0001, both),
        (-0.5, RenderPasses::NONE),
        (1.0, both),
    ] {
        let layer = evaluated_layer(paint(exaggeration, 335.0, IlluminationAnchor::Viewport));
        assert_eq!(layer.passes(), expected, "exaggeration {exaggeration}");
    }

    let flat = evaluated_layer(paint(0.0, 335.0, IlluminationAnchor::Viewport));
    assert!(flat.passes().contains(RenderPass::None));
    assert!(!flat.passes().contains(RenderPass::Pass3D));
}

#[test]
fn test_evaluate_is_idempotent() {
    let mut layer = RenderHillshadeLayer::new("hillshade", paint(0.7, 90.0, IlluminationAnchor::Map));
    let parameters = PropertyEvaluationParameters::new(12.0, Instant::now());
    layer.evaluate(&parameters);
    let first = layer.evaluated_properties();
    layer.evaluate(&parameters);
    let second = layer.evaluated_properties();
    assert_eq!(*first, *second);
    assert_eq!(second.evaluated.exaggeration, 0.7);
    assert!(!layer.has_transition());
    assert!(!layer.has_crossfade());
}

#[test]
fn test_unevaluated_layer_draws_in_no_pass() {
    let layer = RenderHillshadeLayer::new("hillshade", HillshadePaintProperties::default());
    assert_eq!(layer.passes(), RenderPasses::NONE);
}

#[test]
fn test_viewport_light_turns_against_bearing() {
    let viewport = evaluated_layer(paint(0.5, 315.0, IlluminationAnchor::Viewport));
    let map = evaluated_layer(paint(0.5, 315.0, IlluminationAnchor::Map));

    let bearing = 90f32.to_radians();
    let [intensity, azimuth] = viewport.compute_light(bearing);
    assert_eq!(intensity, 0.5);
    assert!((azimuth - (map.compute_light(bearing)[1] - FRAC_PI_2)).abs() < 1e-6);

    assert_eq!(map.compute_light(0.0), map.compute_light(bearing));
    assert!((map.compute_light(0.0)[1] - 315f32.to_radians()).abs() < 1e-6);
}

#[test]
fn test_lat_range_uses_canonical_row() {
    let range = RenderHillshadeLayer::compute_lat_range(&tile(2, 1, 1));
    assert_eq!(range[0], tile_row_latitude(2, 1.0) as f32);
    assert_eq!(range[1], tile_row_latitude(2, 2.0) as f32);
    assert!((range[0] - 66.51326).abs() < 1e-4);
    assert!(range[1].abs() < 1e-4);

    let east_copy = UnwrappedTileId::from_canonical(CanonicalTileId::new(2, 1, 1), 1);
    let west_copy = tile(2, 1 - 4, 1);
    assert_eq!(west_copy.wrap, -1);
    assert_eq!(RenderHillshadeLayer::compute_lat_range(&east_copy), range);
    assert_eq!(RenderHillshadeLayer::compute_lat_range(&west_copy), range);
}

#[test]
fn test_lat_range_of_last_row_reaches_world_edge() {
    let range = RenderHillshadeLayer::compute_lat_range(&tile(1, 0, 1));
    assert!(range[0].abs() < 1e-4);
    assert!((range[1] + 85.05113).abs() < 1e-4);
}

#[test]
#[should_panic(expected = "rendered before its tiles were prepared")]
fn test_render_before_prepare_panics() {
    let mut backend = RecordingBackend::default();
    let static_data = StaticData::new(&mut backend).unwrap();
    let layer = evaluated_layer(paint(0.5, 335.0, IlluminationAnchor::Map));
    let mut source = TestSource::new(&[]);
    let transform = TransformState::new(256, 256);
    let mut parameters = PaintParameters::new(RenderPass::Pass3D, &transform, &mut backend, &static_data, 1);
    let _ = layer.render(&mut parameters, &mut source);
}

#[test]
fn test_end_to_end_prepare_then_composite() {
    let mut backend = RecordingBackend::default();
    let static_data = StaticData::new(&mut backend).unwrap();
    let id = tile(3, 2, 5);
    let mut source = TestSource::new(&[id]).with_dem(id, dem_256(), &mut backend);
    let mut layer = evaluated_layer(paint(0.5, 315.0, IlluminationAnchor::Map));
    let transform = TransformState::new(512, 512);

    run_pass(&mut layer, &mut source, &mut backend, &static_data, &transform, RenderPass::Pass3D);

    assert_eq!(
        backend.offscreens,
        vec![(Size::square(256), TextureChannelDataType::UnsignedByte)]
    );
    let bucket = source.bucket(&id);
    assert!(bucket.is_prepared());
    assert_eq!(bucket.texture().unwrap().size, Size::square(256));

    let prepare = backend.draws_with(HILLSHADE_PREPARE_PROGRAM);
    assert_eq!(prepare.len(), 1);
    let prepare = prepare[0];
    let RecordedTarget::Offscreen { clear, .. } = &prepare.target else {
        panic!("prepare drew into {:?}", prepare.target);
    };
    assert_eq!(*clear, Some(Color::TRANSPARENT));
    assert_eq!(prepare.vertex_buffer, static_data.raster_vertex_buffer.id);
    assert_eq!(prepare.index_buffer, static_data.quad_triangle_index_buffer.id);
    assert_eq!(prepare.segments, vec![Segment::new(0, 0, 4, 6)]);
    assert_eq!(&prepare.texture, bucket.dem_texture().unwrap());
    let UniformBlock::HillshadePrepare(uniforms) = prepare.uniforms else {
        panic!("prepare draw carried {:?}", prepare.uniforms);
    };
    assert_eq!(uniforms.dimension, [260.0, 260.0]);
    assert_eq!(uniforms.unpack, [1.0, 0.0, 0.0, 0.0]);
    assert_eq!(uniforms.zoom, 3.0);
    assert_eq!(uniforms.maxzoom, 15.0);
    assert_eq!(uniforms.matrix, prepare_matrix().to_cols_array_2d());

    run_pass(&mut layer, &mut source, &mut backend, &static_data, &transform, RenderPass::Translucent);

    let composite = backend.draws_with(HILLSHADE_PROGRAM);
    assert_eq!(composite.len(), 1);
    let composite = composite[0];
    let bucket = source.bucket(&id);
    assert_eq!(composite.target, RecordedTarget::Frame);
    assert_eq!(composite.vertex_buffer, static_data.raster_vertex_buffer.id);
    assert_eq!(composite.index_buffer, static_data.quad_triangle_index_buffer.id);
    assert_eq!(composite.filter, TextureFilter::Linear);
    assert_eq!(&composite.texture, bucket.texture().unwrap());
    assert_eq!(composite.segments, vec![Segment::new(0, 0, 4, 6)]);
    assert_eq!(backend.draws.len(), 2);
}

#[test]
fn test_prepare_runs_once_per_bucket() {
    let mut backend = RecordingBackend::default();
    let static_data = StaticData::new(&mut backend).unwrap();
    let id = tile(2, 1, 1);
    let mut source = TestSource::new(&[id]).with_dem(id, small_dem(), &mut backend);
    let mut layer = evaluated_layer(paint(0.5, 335.0, IlluminationAnchor::Viewport));
    let transform = TransformState::new(256, 256);

    for _ in 0..3 {
        run_pass(&mut layer, &mut source, &mut backend, &static_data, &transform, RenderPass::Pass3D);
    }
    assert_eq!(backend.offscreens.len(), 1);
    assert_eq!(backend.draws.len(), 1);
}

#[test]
fn test_composite_waits_for_prepare() {
    let mut backend = RecordingBackend::default();
    let static_data = StaticData::new(&mut backend).unwrap();
    let id = tile(2, 1, 1);
    let mut source = TestSource::new(&[id]).with_dem(id, small_dem(), &mut backend);
    let mut layer = evaluated_layer(paint(0.5, 335.0, IlluminationAnchor::Viewport));
    let transform = TransformState::new(256, 256);

    run_pass(&mut layer, &mut source, &mut backend, &static_data, &transform, RenderPass::Translucent);
    assert!(backend.draws.is_empty());
    assert!(!source.bucket(&id).is_prepared());
    assert!(source.bucket(&id).segments.is_empty());

    run_pass(&mut layer, &mut source, &mut backend, &static_data, &transform, RenderPass::Pass3D);
    run_pass(&mut layer, &mut source, &mut backend, &static_data, &transform, RenderPass::Translucent);
    assert_eq!(backend.draws_with(HILLSHADE_PROGRAM).len(), 1);
}

#[test]
fn test_other_passes_draw_nothing() {
    let mut backend = RecordingBackend::default();
    let static_data = StaticData::new(&mut backend).unwrap();
    let id = tile(2, 1, 1);
    let mut source = TestSource::new(&[id]).with_dem(id, small_dem(), &mut backend);
    let mut layer = evaluated_layer(paint(0.5, 335.0, IlluminationAnchor::Viewport));
    let transform = TransformState::new(256, 256);

    run_pass(&mut layer, &mut source, &mut backend, &static_data, &transform, RenderPass::Opaque);
    run_pass(&mut layer, &mut source, &mut backend, &static_data, &transform, RenderPass::None);
    assert!(backend.draws.is_empty());
    assert!(backend.offscreens.is_empty());
}

#[test]
fn test_default_segments_cached_once() {
    let mut backend = RecordingBackend::default();
    let static_data = StaticData::new(&mut backend).unwrap();
    let id = tile(2, 1, 1);
    let mut source = TestSource::new(&[id]).with_dem(id, small_dem(), &mut backend);
    let mut layer = evaluated_layer(paint(0.5, 335.0, IlluminationAnchor::Viewport));
    let transform = TransformState::new(256, 256);

    run_pass(&mut layer, &mut source, &mut backend, &static_data, &transform, RenderPass::Pass3D);
    for _ in 0..3 {
        run_pass(&mut layer, &mut source, &mut backend, &static_data, &transform, RenderPass::Translucent);
    }

    let composites = backend.draws_with(HILLSHADE_PROGRAM);
    assert_eq!(composites.len(), 3);
    let cached = source.bucket(&id).segments.as_ptr() as usize;
    assert!(composites.iter().all(|d| d.segments_addr == cached));
    assert_eq!(source.bucket(&id).segments, vec![Segment::new(0, 0, 4, 6)]);
}

#[test]
fn test_trimmed_geometry_preferred_over_static_quad() {
    let mut backend = RecordingBackend::default();
    let static_data = StaticData::new(&mut backend).unwrap();
    let trimmed = tile(1, 0, 0);
    let sibling = tile(1, 1, 0);
    let mut source = TestSource::new(&[trimmed, sibling])
        .with_dem(trimmed, small_dem(), &mut backend)
        .with_dem(sibling, small_dem(), &mut backend);
    {
        let bucket = source.buckets.get_mut(&trimmed).unwrap();
        bucket.set_mask(TileMask::from([
            CanonicalTileId::new(1, 0, 0),
            CanonicalTileId::new(1, 1, 1),
        ]));
        bucket.upload(&mut backend).unwrap();
    }
    let mut layer = evaluated_layer(paint(0.5, 335.0, IlluminationAnchor::Viewport));
    let transform = TransformState::new(256, 256);

    run_pass(&mut layer, &mut source, &mut backend, &static_data, &transform, RenderPass::Pass3D);
    // Prepare never uses trimmed geometry.
    assert!(
        backend
            .draws_with(HILLSHADE_PREPARE_PROGRAM)
            .iter()
            .all(|d| d.vertex_buffer == static_data.raster_vertex_buffer.id)
    );

    run_pass(&mut layer, &mut source, &mut backend, &static_data, &transform, RenderPass::Translucent);
    let composites = backend.draws_with(HILLSHADE_PROGRAM);
    assert_eq!(composites.len(), 2);

    let (vertices, indices) = source.bucket(&trimmed).trimmed_buffers().unwrap();
    assert_eq!(composites[0].vertex_buffer, vertices.id);
    assert_eq!(composites[0].index_buffer, indices.id);
    assert_eq!(composites[0].segments, vec![Segment::new(0, 0, 8, 12)]);
    assert_eq!(composites[0].filter, TextureFilter::Linear);

    assert_eq!(composites[1].vertex_buffer, static_data.raster_vertex_buffer.id);
    assert_eq!(composites[1].segments, vec![Segment::new(0, 0, 4, 6)]);
}

#[test]
fn test_fully_masked_tile_is_not_composited() {
    let mut backend = RecordingBackend::default();
    let static_data = StaticData::new(&mut backend).unwrap();
    let id = tile(1, 0, 0);
    let mut source = TestSource::new(&[id]).with_dem(id, small_dem(), &mut backend);
    source.buckets.get_mut(&id).unwrap().set_mask(TileMask::new());
    let mut layer = evaluated_layer(paint(0.5, 335.0, IlluminationAnchor::Viewport));
    let transform = TransformState::new(256, 256);

    run_pass(&mut layer, &mut source, &mut backend, &static_data, &transform, RenderPass::Pass3D);
    run_pass(&mut layer, &mut source, &mut backend, &static_data, &transform, RenderPass::Translucent);
    assert_eq!(backend.draws_with(HILLSHADE_PREPARE_PROGRAM).len(), 1);
    assert!(backend.draws_with(HILLSHADE_PROGRAM).is_empty());
}

#[test]
fn test_missing_buckets_and_empty_buckets_are_skipped() {
    let mut backend = RecordingBackend::default();
    let static_data = StaticData::new(&mut backend).unwrap();
    let missing = tile(2, 0, 0);
    let empty = tile(2, 1, 0);
    let loaded = tile(2, 2, 0);
    let mut source =
        TestSource::new(&[missing, empty, loaded]).with_dem(loaded, small_dem(), &mut backend);
    source.buckets.insert(empty, HillshadeBucket::without_data());
    let mut layer = evaluated_layer(paint(0.5, 335.0, IlluminationAnchor::Viewport));
    let transform = TransformState::new(256, 256);

    run_pass(&mut layer, &mut source, &mut backend, &static_data, &transform, RenderPass::Pass3D);
    assert_eq!(backend.draws.len(), 1);
    assert!(!source.bucket(&empty).is_prepared());
    assert!(source.bucket(&loaded).is_prepared());
}

#[test]
fn test_missing_program_skips_layer() {
    for name in [HILLSHADE_PROGRAM, HILLSHADE_PREPARE_PROGRAM] {
        let mut backend = RecordingBackend::default().without_program(name);
        let static_data = StaticData::new(&mut backend).unwrap();
        let id = tile(2, 1, 1);
        let mut source = TestSource::new(&[id]).with_dem(id, small_dem(), &mut backend);
        let mut layer = evaluated_layer(paint(0.5, 335.0, IlluminationAnchor::Viewport));
        let transform = TransformState::new(256, 256);

        run_pass(&mut layer, &mut source, &mut backend, &static_data, &transform, RenderPass::Pass3D);
        assert!(backend.draws.is_empty(), "missing {name}");
        assert!(!source.bucket(&id).is_prepared());
    }
}

#[test]
#[should_panic(expected = "not uploaded before prepare")]
fn test_prepare_without_uploaded_dem_panics() {
    let mut backend = RecordingBackend::default();
    let static_data = StaticData::new(&mut backend).unwrap();
    let id = tile(2, 1, 1);
    let mut source = TestSource::new(&[id]);
    source.buckets.insert(id, HillshadeBucket::new(small_dem()));
    let mut layer = evaluated_layer(paint(0.5, 335.0, IlluminationAnchor::Viewport));
    let transform = TransformState::new(256, 256);
    run_pass(&mut layer, &mut source, &mut backend, &static_data, &transform, RenderPass::Pass3D);
}

#[test]
fn test_draw_state_is_read_only_overlay() {
    let mut backend = RecordingBackend::default();
    let static_data = StaticData::new(&mut backend).unwrap();
    let id = tile(2, 1, 1);
    let mut source = TestSource::new(&[id]).with_dem(id, small_dem(), &mut backend);
    let mut layer = evaluated_layer(paint(0.5, 335.0, IlluminationAnchor::Viewport));
    let transform = TransformState::new(256, 256);

    run_pass(&mut layer, &mut source, &mut backend, &static_data, &transform, RenderPass::Pass3D);
    run_pass(&mut layer, &mut source, &mut backend, &static_data, &transform, RenderPass::Translucent);

    for draw in &backend.draws {
        assert_eq!(draw.state.depth.func, DepthFunction::LessEqual);
        assert_eq!(draw.state.depth.mask, DepthMaskType::ReadOnly);
        assert!(!draw.state.cull.enabled);
    }
    assert_eq!(backend.draws[0].state.color.blend, BlendFunction::Replace);
    assert_eq!(backend.draws[0].filter, TextureFilter::Nearest);
    assert_eq!(backend.draws[1].state.color.blend, BlendFunction::PremultipliedAlpha);
}

#[test]
fn test_composite_uniforms() {
    let mut backend = RecordingBackend::default();
    let static_data = StaticData::new(&mut backend).unwrap();
    let id = tile(2, 1, 1);
    let mut source = TestSource::new(&[id]).with_dem(id, small_dem(), &mut backend);
    let mut paint = paint(0.25, 90.0, IlluminationAnchor::Viewport);
    paint.highlight_color = Transitionable::constant(Color::new(0.5, 0.0, 0.0, 0.5));
    let mut layer = evaluated_layer(paint);
    let mut transform = TransformState::new(256, 256);
    transform.bearing = 0.5;

    run_pass(&mut layer, &mut source, &mut backend, &static_data, &transform, RenderPass::Pass3D);
    run_pass(&mut layer, &mut source, &mut backend, &static_data, &transform, RenderPass::Translucent);

    let UniformBlock::Hillshade(uniforms) = backend.draws[1].uniforms else {
        panic!("composite draw carried {:?}", backend.draws[1].uniforms);
    };
    assert_eq!(uniforms.matrix, transform.matrix_for_tile(&id, true).to_cols_array_2d());
    assert_eq!(uniforms.highlight, [0.5, 0.0, 0.0, 0.5]);
    assert_eq!(uniforms.shadow, Color::BLACK.to_array());
    assert_eq!(uniforms.light[0], 0.25);
    assert!((uniforms.light[1] - (FRAC_PI_2 - 0.5)).abs() < 1e-6);
    assert_eq!(uniforms.latrange, RenderHillshadeLayer::compute_lat_range(&id));
}

#[test]
fn test_mask_trimmed_after_prepare_waits_for_upload() {
    let mut backend = RecordingBackend::default();
    let static_data = StaticData::new(&mut backend).unwrap();
    let id = tile(1, 0, 0);
    let mut source = TestSource::new(&[id]).with_dem(id, small_dem(), &mut backend);
    let mut layer = evaluated_layer(paint(0.5, 335.0, IlluminationAnchor::Viewport));
    let transform = TransformState::new(256, 256);

    run_pass(&mut layer, &mut source, &mut backend, &static_data, &transform, RenderPass::Pass3D);
    run_pass(&mut layer, &mut source, &mut backend, &static_data, &transform, RenderPass::Translucent);
    {
        let composites = backend.draws_with(HILLSHADE_PROGRAM);
        assert_eq!(composites.len(), 1);
        assert_eq!(composites[0].vertex_buffer, static_data.raster_vertex_buffer.id);
        assert_eq!(composites[0].index_buffer, static_data.quad_triangle_index_buffer.id);
        assert_eq!(composites[0].segments, vec![Segment::new(0, 0, 4, 6)]);
    }

    // A child tile arrived: three quadrants stay visible, not yet uploaded.
    source.buckets.get_mut(&id).unwrap().set_mask(TileMask::from([
        CanonicalTileId::new(1, 0, 0),
        CanonicalTileId::new(1, 1, 0),
        CanonicalTileId::new(1, 0, 1),
    ]));
    run_pass(&mut layer, &mut source, &mut backend, &static_data, &transform, RenderPass::Translucent);
    assert_eq!(backend.draws_with(HILLSHADE_PROGRAM).len(), 1);

    source.buckets.get_mut(&id).unwrap().upload(&mut backend).unwrap();
    run_pass(&mut layer, &mut source, &mut backend, &static_data, &transform, RenderPass::Translucent);
    let composites = backend.draws_with(HILLSHADE_PROGRAM);
    assert_eq!(composites.len(), 2);
    let (vertices, indices) = source.bucket(&id).trimmed_buffers().unwrap();
    assert_eq!(composites[1].vertex_buffer, vertices.id);
    assert_eq!(composites[1].index_buffer, indices.id);
    assert_eq!(composites[1].segments, vec![Segment::new(0, 0, 12, 18)]);
    // The bucket stays prepared across mask changes.
    assert_eq!(backend.draws_with(HILLSHADE_PREPARE_PROGRAM).len(), 1);
}

#[test]
fn test_mask_restored_to_full_falls_back_to_static_quad() {
    let mut backend = RecordingBackend::default();
    let static_data = StaticData::new(&mut backend).unwrap();
    let id = tile(1, 0, 0);
    let mut source = TestSource::new(&[id]).with_dem(id, small_dem(), &mut backend);
    {
        let bucket = source.buckets.get_mut(&id).unwrap();
        bucket.set_mask(TileMask::from([CanonicalTileId::new(1, 1, 1)]));
        bucket.upload(&mut backend).unwrap();
    }
    let mut layer = evaluated_layer(paint(0.5, 335.0, IlluminationAnchor::Viewport));
    let transform = TransformState::new(256, 256);

    run_pass(&mut layer, &mut source, &mut backend, &static_data, &transform, RenderPass::Pass3D);
    run_pass(&mut layer, &mut source, &mut backend, &static_data, &transform, RenderPass::Translucent);
    let trimmed_vertices = source.bucket(&id).trimmed_buffers().unwrap().0.id;
    {
        let composites = backend.draws_with(HILLSHADE_PROGRAM);
        assert_eq!(composites.len(), 1);
        assert_eq!(composites[0].vertex_buffer, trimmed_vertices);
        assert_eq!(composites[0].segments, vec![Segment::new(0, 0, 4, 6)]);
    }

    // The child went away: the whole tile is drawn again.
    source.buckets.get_mut(&id).unwrap().set_mask(relief_geo::full_tile_mask());
    assert!(source.bucket(&id).segments.is_empty());
    run_pass(&mut layer, &mut source, &mut backend, &static_data, &transform, RenderPass::Translucent);

    let composites = backend.draws_with(HILLSHADE_PROGRAM);
    assert_eq!(composites.len(), 2);
    assert_eq!(composites[1].vertex_buffer, static_data.raster_vertex_buffer.id);
    assert_eq!(composites[1].index_buffer, static_data.quad_triangle_index_buffer.id);
    assert_eq!(composites[1].segments, vec![Segment::new(0, 0, 4, 6)]);
    assert_eq!(composites[1].segments_addr, source.bucket(&id).segments.as_ptr() as usize);
}
