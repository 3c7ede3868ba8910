//! The batch flusher: turns accumulated frame data into minimized
//! driver call sequences.

use veld_core::profiling::profile_function;

use crate::driver::GraphicsDriver;
use crate::frame::FrameBatch;
use crate::object::RenderObject;
use crate::state_cache::StateCache;
use crate::types::{BlendMode, Overlay, StencilParams, Topology};
use crate::vertex::VertexLayout;

/// Alpha-test reference used by the depth-bearing passes. Texels below
/// it are discarded instead of writing depth.
pub const ALPHA_TEST_REF: f32 = 0.3;

/// Counters from one flush, reported through `tracing` and the stats
/// accessor on the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Objects the accumulation phase queued.
    pub objects: u32,
    /// Draw calls issued after coalescing.
    pub draw_calls: u32,
}

/// A merged span of adjacent objects sharing one comparable key.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Run<K> {
    pub key: K,
    pub first: u32,
    pub count: u32,
}

/// Fold adjacent objects into runs. Two neighbors merge exactly when
/// `key_of` yields equal keys and the topology admits concatenation;
/// every pass uses this one routine with its own key projection.
pub fn coalesce_runs<K: PartialEq + Copy>(
    objects: &[RenderObject],
    key_of: impl Fn(&RenderObject) -> K,
) -> Vec<Run<K>> {
    let mut runs: Vec<Run<K>> = Vec::new();
    let mut cursor = 0u32;
    for object in objects {
        let key = key_of(object);
        match runs.last_mut() {
            Some(run) if run.key == key && object.topology.is_mergeable() => {
                run.count += object.vertex_count;
            }
            _ => runs.push(Run {
                key,
                first: cursor,
                count: object.vertex_count,
            }),
        }
        cursor += object.vertex_count;
    }
    runs
}

/// Submit everything in `batch` through `cache` and clear the batch.
///
/// Depth-bearing work goes first (it establishes the depth buffer the
/// scene relies on), then the depth-less painter's-order pass.
pub fn flush<D: GraphicsDriver>(
    batch: &mut FrameBatch,
    cache: &mut StateCache<D>,
    lighting_enabled: bool,
) -> RenderStats {
    profile_function!();

    let mut stats = RenderStats::default();
    flush_depth(batch, cache, lighting_enabled, &mut stats);
    flush_flat(batch, cache, lighting_enabled, &mut stats);
    batch.clear();
    cache.invalidate_vertex_source();

    tracing::trace!(
        objects = stats.objects,
        draw_calls = stats.draw_calls,
        "flushed frame batch"
    );
    stats
}

/// Submit only the depth-less queue, leaving depth-bearing work queued.
/// Used around render-target redirection, which is a flat-path feature.
pub fn flush_flat_only<D: GraphicsDriver>(
    batch: &mut FrameBatch,
    cache: &mut StateCache<D>,
    lighting_enabled: bool,
) -> RenderStats {
    let mut stats = RenderStats::default();
    flush_flat(batch, cache, lighting_enabled, &mut stats);
    batch.clear_flat();
    cache.invalidate_vertex_source();
    stats
}

fn flush_flat<D: GraphicsDriver>(
    batch: &FrameBatch,
    cache: &mut StateCache<D>,
    lighting_enabled: bool,
    stats: &mut RenderStats,
) {
    let objects = batch.flat_objects();
    if objects.is_empty() {
        return;
    }
    profile_function!();

    stats.objects += objects.len() as u32;
    let runs = coalesce_runs(objects, |o| o.state_key(lighting_enabled));
    let bytes = batch.flat_vertices().bytes();

    for run in &runs {
        let key = run.key;
        cache.bind_vertex_source(key.layout(), bytes);
        cache.bind_texture(0, key.texture);
        cache.set_color_array(key.has_color);

        let overlay_texture = key.overlay.texture();
        cache.set_overlay_stage(key.overlay.kind());
        if key.overlay != Overlay::None {
            cache.set_overlay_tint(key.overlay.tint());
        }
        if overlay_texture.is_some() {
            cache.bind_texture(1, overlay_texture);
        } else {
            cache.disable_texture_unit(1);
        }

        if let Some(lit) = key.lit {
            cache.set_blend(lit.blend);
            cache.set_lighting(lit.lit);
            match lit.stencil {
                Some(params) => cache.set_stencil(params),
                None => cache.disable_stencil(),
            }
        }

        cache.draw(key.topology, run.first, run.count);
        stats.draw_calls += 1;
    }

    // Leave fixed defaults behind for whoever draws next.
    cache.set_blend(BlendMode::default());
    cache.disable_stencil();
    cache.set_lighting(false);
    cache.set_overlay_stage(crate::types::OverlayKind::None);
    cache.set_color_array(false);
    cache.disable_texture_unit(1);
    cache.disable_texture_unit(0);
}

fn flush_depth<D: GraphicsDriver>(
    batch: &FrameBatch,
    cache: &mut StateCache<D>,
    lighting_enabled: bool,
    stats: &mut RenderStats,
) {
    let has_work = !batch.depth_buckets().is_empty()
        || !batch.solo_buckets().is_empty()
        || !batch.overlay_objects().is_empty()
        || !batch.transparent_objects().is_empty();
    if !has_work {
        return;
    }
    profile_function!();

    cache.set_depth_test(true);
    cache.set_alpha_test(ALPHA_TEST_REF);
    cache.set_lighting(lighting_enabled);

    // Sub-pass 1: plain quads, one draw per texture bucket. The depth
    // test is what makes reordering across buckets safe.
    for bucket in batch.depth_buckets() {
        stats.objects += bucket.quad_count();
        cache.bind_texture(0, bucket.texture);
        cache.bind_vertex_source(VertexLayout::depth(), bucket.vertices.bytes());
        cache.draw(Topology::Quads, 0, bucket.vertices.len());
        stats.draw_calls += 1;
    }

    // Sub-pass 2: forced-solo quads. Each marks its coverage in the
    // stencil buffer and draws unlit.
    if !batch.solo_buckets().is_empty() {
        cache.set_stencil(StencilParams::write(255));
        cache.set_lighting(false);
        for bucket in batch.solo_buckets() {
            stats.objects += bucket.quad_count();
            cache.bind_texture(0, bucket.texture);
            cache.bind_vertex_source(VertexLayout::depth(), bucket.vertices.bytes());
            cache.draw(Topology::Quads, 0, bucket.vertices.len());
            stats.draw_calls += 1;
        }
        cache.disable_stencil();
        cache.set_lighting(lighting_enabled);
    }

    // Sub-pass 3: overlay-tinted quads, merged per (texture, overlay).
    let overlay_objects = batch.overlay_objects();
    if !overlay_objects.is_empty() {
        stats.objects += overlay_objects.len() as u32;
        cache.set_color_array(true);
        let bytes = batch.overlay_vertices().bytes();
        let runs = coalesce_runs(overlay_objects, |o| (o.texture, o.overlay));
        for run in &runs {
            let (texture, overlay) = run.key;
            let layout = if overlay.texture().is_some() {
                VertexLayout::overlay()
            } else {
                VertexLayout::overlay_single_texture()
            };
            cache.bind_vertex_source(layout, bytes);
            cache.bind_texture(0, texture);
            cache.set_overlay_stage(overlay.kind());
            cache.set_overlay_tint(overlay.tint());
            if overlay.texture().is_some() {
                cache.bind_texture(1, overlay.texture());
            } else {
                cache.disable_texture_unit(1);
            }
            cache.draw(Topology::Quads, run.first, run.count);
            stats.draw_calls += 1;
        }
        cache.set_overlay_stage(crate::types::OverlayKind::None);
        cache.disable_texture_unit(1);
        cache.set_color_array(false);
    }

    // Sub-pass 4: translucent tinted quads with the alpha test off so
    // partial coverage blends instead of being discarded.
    cache.disable_alpha_test();
    let transparent_objects = batch.transparent_objects();
    if !transparent_objects.is_empty() {
        stats.objects += transparent_objects.len() as u32;
        cache.set_color_array(true);
        let bytes = batch.transparent_vertices().bytes();
        let runs = coalesce_runs(transparent_objects, |o| o.texture);
        for run in &runs {
            cache.bind_vertex_source(VertexLayout::overlay_single_texture(), bytes);
            cache.bind_texture(0, run.key);
            cache.draw(Topology::Quads, run.first, run.count);
            stats.draw_calls += 1;
        }
        cache.set_color_array(false);
    }

    cache.set_depth_test(false);
    cache.set_lighting(false);
    cache.disable_texture_unit(0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BlendFactor, TextureId};

    fn quad() -> RenderObject {
        RenderObject::colored(Topology::Quads, 4)
    }

    #[test]
    fn adjacent_equal_keys_merge() {
        let objects = [quad(), quad(), quad()];
        let runs = coalesce_runs(&objects, |o| o.state_key(false));
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].first, 0);
        assert_eq!(runs[0].count, 12);
    }

    #[test]
    fn key_change_splits_and_offsets_are_cumulative() {
        let mut textured = RenderObject::textured(Topology::Quads, 4, TextureId(3));
        textured.has_color = false;
        let objects = [quad(), textured, quad()];
        let runs = coalesce_runs(&objects, |o| o.state_key(false));
        assert_eq!(runs.len(), 3);
        assert_eq!(runs[1].first, 4);
        assert_eq!(runs[2].first, 8);
    }

    #[test]
    fn strips_never_merge_even_with_equal_keys() {
        let strip = RenderObject::colored(Topology::TriangleStrip, 5);
        let objects = [strip, strip];
        let runs = coalesce_runs(&objects, |o| o.state_key(false));
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[1].first, 5);
    }

    #[test]
    fn blend_splits_only_under_lighting() {
        let mut additive = quad();
        additive.blend = BlendMode {
            src: BlendFactor::One,
            dst: BlendFactor::One,
        };
        let objects = [quad(), additive];
        assert_eq!(coalesce_runs(&objects, |o| o.state_key(false)).len(), 1);
        assert_eq!(coalesce_runs(&objects, |o| o.state_key(true)).len(), 2);
    }
}
