//! Per-frame accumulation: shape emitters, quad queues and depth buckets.

use ahash::RandomState;
use std::collections::HashMap;

use glam::Vec2;

use crate::color::Rgba;
use crate::object::RenderObject;
use crate::pool::VertexPool;
use crate::types::{BlendMode, Overlay, StencilParams, TextureId, Topology};
use crate::vertex::{DepthVertex, FlatVertex, OverlayVertex};

/// Capacity of one texture bucket, in quads.
pub const MAX_QUADS_PER_BUCKET: u32 = 600;

const VERTS_PER_QUAD: u32 = 4;

/// A depth-bearing quad bucket: all quads in it share one texture and
/// are submitted as a single draw.
#[derive(Debug)]
pub struct DepthBucket {
    pub texture: TextureId,
    pub vertices: VertexPool<DepthVertex>,
}

impl DepthBucket {
    fn new(texture: TextureId) -> Self {
        Self {
            texture,
            vertices: VertexPool::with_capacity((MAX_QUADS_PER_BUCKET * VERTS_PER_QUAD) as usize),
        }
    }

    fn has_room(&self) -> bool {
        self.vertices.len() < MAX_QUADS_PER_BUCKET * VERTS_PER_QUAD
    }

    /// Number of quads accumulated so far.
    pub fn quad_count(&self) -> u32 {
        self.vertices.len() / VERTS_PER_QUAD
    }
}

/// One frame's worth of accumulated draw work.
///
/// Emitters only append to pools and queues; nothing here talks to the
/// driver. The flusher drains everything in [`clear`](Self::clear)-able
/// state at the end of the frame (or mid-frame around a target switch).
#[derive(Debug, Default)]
pub struct FrameBatch {
    // Depth-less painter's-order path: one interleaved pool, one queue.
    flat_vertices: VertexPool<FlatVertex>,
    flat_objects: Vec<RenderObject>,

    // Depth path, plain quads bucketed by texture.
    depth_buckets: Vec<DepthBucket>,
    solo_buckets: Vec<DepthBucket>,
    open_buckets: HashMap<TextureId, usize, RandomState>,

    // Depth path, overlay-tinted quads.
    overlay_vertices: VertexPool<OverlayVertex>,
    overlay_objects: Vec<RenderObject>,

    // Depth path, translucent tinted quads.
    transparent_vertices: VertexPool<OverlayVertex>,
    transparent_objects: Vec<RenderObject>,
}

impl FrameBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.flat_objects.is_empty()
            && self.depth_buckets.is_empty()
            && self.solo_buckets.is_empty()
            && self.overlay_objects.is_empty()
            && self.transparent_objects.is_empty()
    }

    /// Drops only the depth-less queue, leaving depth-bearing work
    /// accumulated. Used when the flat path is flushed around a render
    /// target switch.
    pub fn clear_flat(&mut self) {
        self.flat_vertices.clear();
        self.flat_objects.clear();
    }

    /// Drops all accumulated work without submitting it.
    pub fn clear(&mut self) {
        self.flat_vertices.clear();
        self.flat_objects.clear();
        self.depth_buckets.clear();
        self.solo_buckets.clear();
        self.open_buckets.clear();
        self.overlay_vertices.clear();
        self.overlay_objects.clear();
        self.transparent_vertices.clear();
        self.transparent_objects.clear();
    }

    // ---- read access for the flusher and tests ----

    pub fn flat_vertices(&self) -> &VertexPool<FlatVertex> {
        &self.flat_vertices
    }

    pub fn flat_objects(&self) -> &[RenderObject] {
        &self.flat_objects
    }

    pub fn depth_buckets(&self) -> &[DepthBucket] {
        &self.depth_buckets
    }

    pub fn solo_buckets(&self) -> &[DepthBucket] {
        &self.solo_buckets
    }

    pub fn overlay_vertices(&self) -> &VertexPool<OverlayVertex> {
        &self.overlay_vertices
    }

    pub fn overlay_objects(&self) -> &[RenderObject] {
        &self.overlay_objects
    }

    pub fn transparent_vertices(&self) -> &VertexPool<OverlayVertex> {
        &self.transparent_vertices
    }

    pub fn transparent_objects(&self) -> &[RenderObject] {
        &self.transparent_objects
    }

    // ---- depth-less emitters ----

    fn push_flat(&mut self, object: RenderObject) {
        debug_assert_ne!(object.vertex_count, 0);
        self.flat_objects.push(object);
    }

    fn flat_vertex(&mut self, pos: Vec2, color: Rgba) {
        self.flat_vertices.push(FlatVertex {
            pos: pos.to_array(),
            uv: [0.0; 2],
            uv2: [0.0; 2],
            color,
        });
    }

    pub fn draw_point(&mut self, p: Vec2, color: Rgba) {
        self.flat_vertex(p, color);
        self.push_flat(RenderObject::colored(Topology::Points, 1));
    }

    /// Single-pixel write helper; the backend performs bounds checking.
    pub fn put_pixel(&mut self, x: f32, y: f32, color: Rgba) {
        self.draw_point(Vec2::new(x, y), color);
    }

    pub fn draw_line(&mut self, p1: Vec2, p2: Vec2, color: Rgba) {
        if p1 == p2 {
            return;
        }
        self.flat_vertex(p1, color);
        self.flat_vertex(p2, color);
        self.push_flat(RenderObject::colored(Topology::Lines, 2));
    }

    /// A line with thickness, expanded into a quad along its normal.
    pub fn draw_thick_line(&mut self, p1: Vec2, p2: Vec2, width: f32, color: Rgba) {
        if p1 == p2 {
            return;
        }
        if width <= 1.0 {
            self.draw_line(p1, p2, color);
            return;
        }
        let half = (p2 - p1).normalize().perp() * (width * 0.5);
        self.flat_vertex(p1 - half, color);
        self.flat_vertex(p1 + half, color);
        self.flat_vertex(p2 + half, color);
        self.flat_vertex(p2 - half, color);
        self.push_flat(RenderObject::colored(Topology::Quads, 4));
    }

    pub fn draw_polyline(&mut self, points: &[Vec2], color: Rgba) {
        if points.len() < 2 {
            return;
        }
        for &p in points {
            self.flat_vertex(p, color);
        }
        self.push_flat(RenderObject::colored(Topology::LineStrip, points.len() as u32));
    }

    /// A Bezier curve through `points`, flattened into a line strip.
    pub fn draw_bezier(&mut self, points: &[Vec2], steps: u32, color: Rgba) {
        if points.len() < 2 || steps == 0 {
            return;
        }
        let mut scratch = Vec::with_capacity(points.len());
        for i in 0..=steps {
            let t = i as f32 / steps as f32;
            scratch.clear();
            scratch.extend_from_slice(points);
            // de Casteljau
            for level in (1..scratch.len()).rev() {
                for j in 0..level {
                    scratch[j] = scratch[j].lerp(scratch[j + 1], t);
                }
            }
            self.flat_vertex(scratch[0], color);
        }
        self.push_flat(RenderObject::colored(Topology::LineStrip, steps + 1));
    }

    pub fn draw_triangle(&mut self, p1: Vec2, p2: Vec2, p3: Vec2, color: Rgba) {
        self.flat_vertex(p1, color);
        self.flat_vertex(p2, color);
        self.flat_vertex(p3, color);
        self.push_flat(RenderObject::colored(Topology::Triangles, 3));
    }

    /// Rectangle outline.
    pub fn draw_rect(&mut self, min: Vec2, max: Vec2, color: Rgba) {
        self.flat_vertex(min, color);
        self.flat_vertex(Vec2::new(max.x, min.y), color);
        self.flat_vertex(max, color);
        self.flat_vertex(Vec2::new(min.x, max.y), color);
        self.push_flat(RenderObject::colored(Topology::LineLoop, 4));
    }

    pub fn fill_rect(&mut self, min: Vec2, max: Vec2, color: Rgba) {
        self.flat_vertex(min, color);
        self.flat_vertex(Vec2::new(max.x, min.y), color);
        self.flat_vertex(max, color);
        self.flat_vertex(Vec2::new(min.x, max.y), color);
        self.push_flat(RenderObject::colored(Topology::Quads, 4));
    }

    /// Arbitrary colored quad from four corners.
    pub fn draw_quad(&mut self, p1: Vec2, p2: Vec2, p3: Vec2, p4: Vec2, color: Rgba) {
        self.flat_vertex(p1, color);
        self.flat_vertex(p2, color);
        self.flat_vertex(p3, color);
        self.flat_vertex(p4, color);
        self.push_flat(RenderObject::colored(Topology::Quads, 4));
    }

    /// A small cross marking a vertex position.
    pub fn draw_vertex_marker(&mut self, p: Vec2, half_size: f32, color: Rgba) {
        self.draw_line(
            Vec2::new(p.x - half_size, p.y),
            Vec2::new(p.x + half_size, p.y),
            color,
        );
        self.draw_line(
            Vec2::new(p.x, p.y - half_size),
            Vec2::new(p.x, p.y + half_size),
            color,
        );
    }

    fn clamp_segments(segments: u32) -> u32 {
        segments.clamp(8, 128)
    }

    pub fn draw_circle(&mut self, center: Vec2, radius: f32, segments: u32, color: Rgba) {
        if radius <= 0.0 {
            return;
        }
        let segments = Self::clamp_segments(segments);
        for i in 0..segments {
            let a = std::f32::consts::TAU * i as f32 / segments as f32;
            self.flat_vertex(center + Vec2::new(a.cos(), a.sin()) * radius, color);
        }
        self.push_flat(RenderObject::colored(Topology::LineLoop, segments));
    }

    pub fn fill_circle(&mut self, center: Vec2, radius: f32, segments: u32, color: Rgba) {
        if radius <= 0.0 {
            return;
        }
        let segments = Self::clamp_segments(segments);
        self.flat_vertex(center, color);
        for i in 0..=segments {
            let a = std::f32::consts::TAU * i as f32 / segments as f32;
            self.flat_vertex(center + Vec2::new(a.cos(), a.sin()) * radius, color);
        }
        self.push_flat(RenderObject::colored(Topology::TriangleFan, segments + 2));
    }

    /// Arc outline between two angles, in radians.
    pub fn draw_circle_segment(
        &mut self,
        center: Vec2,
        radius: f32,
        start: f32,
        end: f32,
        segments: u32,
        color: Rgba,
    ) {
        if radius <= 0.0 || start == end {
            return;
        }
        let segments = Self::clamp_segments(segments);
        for i in 0..=segments {
            let a = start + (end - start) * i as f32 / segments as f32;
            self.flat_vertex(center + Vec2::new(a.cos(), a.sin()) * radius, color);
        }
        self.push_flat(RenderObject::colored(Topology::LineStrip, segments + 1));
    }

    /// Filled pie slice between two angles, in radians.
    pub fn fill_circle_segment(
        &mut self,
        center: Vec2,
        radius: f32,
        start: f32,
        end: f32,
        segments: u32,
        color: Rgba,
    ) {
        if radius <= 0.0 || start == end {
            return;
        }
        let segments = Self::clamp_segments(segments);
        self.flat_vertex(center, color);
        for i in 0..=segments {
            let a = start + (end - start) * i as f32 / segments as f32;
            self.flat_vertex(center + Vec2::new(a.cos(), a.sin()) * radius, color);
        }
        self.push_flat(RenderObject::colored(Topology::TriangleFan, segments + 2));
    }

    /// A radial light falloff: a fan of wedges from a bright center
    /// color to a rim color, each wedge its own triangle so downstream
    /// state patching can still target individual objects.
    pub fn draw_light_primitive(
        &mut self,
        center: Vec2,
        radius: f32,
        segments: u32,
        center_color: Rgba,
        rim_color: Rgba,
    ) {
        if radius <= 0.0 {
            return;
        }
        let segments = Self::clamp_segments(segments);
        for i in 0..segments {
            let a0 = std::f32::consts::TAU * i as f32 / segments as f32;
            let a1 = std::f32::consts::TAU * (i + 1) as f32 / segments as f32;
            self.flat_vertex(center, center_color);
            self.flat_vertex(center + Vec2::new(a0.cos(), a0.sin()) * radius, rim_color);
            self.flat_vertex(center + Vec2::new(a1.cos(), a1.sin()) * radius, rim_color);
            self.push_flat(RenderObject::colored(Topology::Triangles, 3));
        }
    }

    /// An axis-aligned textured quad. `uv` is `[u0, v0, u1, v1]`.
    ///
    /// The color array is only engaged when an alpha fade is in play;
    /// fully opaque quads batch without per-vertex color.
    pub fn textured_quad(&mut self, min: Vec2, max: Vec2, texture: TextureId, uv: [f32; 4], alpha: u8) {
        let color = Rgba::new(255, 255, 255, alpha);
        let corners = quad_corners(min, max, uv);
        for (pos, tex) in corners {
            self.flat_vertices.push(FlatVertex {
                pos,
                uv: tex,
                uv2: [0.0; 2],
                color,
            });
        }
        let mut object = RenderObject::textured(Topology::Quads, 4, texture);
        object.has_color = alpha != 255;
        self.push_flat(object);
    }

    /// A textured quad with an overlay applied in a second stage.
    pub fn overlay_quad(
        &mut self,
        min: Vec2,
        max: Vec2,
        texture: TextureId,
        uv: [f32; 4],
        overlay: Overlay,
        alpha: u8,
    ) {
        let overlay = overlay.normalized();
        if overlay == Overlay::None {
            self.textured_quad(min, max, texture, uv, alpha);
            return;
        }
        let color = Rgba::new(255, 255, 255, alpha);
        let unit = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
        let corners = quad_corners(min, max, uv);
        for ((pos, tex), uv2) in corners.into_iter().zip(unit) {
            self.flat_vertices.push(FlatVertex {
                pos,
                uv: tex,
                uv2,
                color,
            });
        }
        let mut object = RenderObject::textured(Topology::Quads, 4, texture);
        object.overlay = overlay;
        object.has_color = true;
        self.push_flat(object);
    }

    /// Patches the blend, lighting and stencil state of the last
    /// `count` queued depth-less objects in place.
    pub fn override_info(
        &mut self,
        count: usize,
        blend: BlendMode,
        lit: bool,
        stencil: Option<StencilParams>,
    ) {
        let len = self.flat_objects.len();
        let start = len.saturating_sub(count);
        for object in &mut self.flat_objects[start..] {
            object.blend = blend;
            object.lit = lit;
            object.stencil = stencil;
        }
    }

    // ---- depth-bearing emitters ----

    /// A plain textured quad at depth `z`, routed into a texture bucket.
    ///
    /// `force_new_batch` routes the quad into a private solo bucket that
    /// is drawn in its own stencil-writing pass.
    pub fn textured_quad_z(
        &mut self,
        min: Vec2,
        max: Vec2,
        z: f32,
        texture: TextureId,
        uv: [f32; 4],
        force_new_batch: bool,
    ) {
        if force_new_batch {
            let mut bucket = DepthBucket::new(texture);
            for (pos, tex) in quad_corners(min, max, uv) {
                bucket.vertices.push(DepthVertex {
                    pos: [pos[0], pos[1], z],
                    uv: tex,
                });
            }
            self.solo_buckets.push(bucket);
            return;
        }
        let bucket = self.open_bucket(texture);
        for (pos, tex) in quad_corners(min, max, uv) {
            bucket.vertices.push(DepthVertex {
                pos: [pos[0], pos[1], z],
                uv: tex,
            });
        }
    }

    fn open_bucket(&mut self, texture: TextureId) -> &mut DepthBucket {
        match self.open_buckets.get(&texture) {
            Some(&index) if self.depth_buckets[index].has_room() => &mut self.depth_buckets[index],
            _ => {
                let index = self.depth_buckets.len();
                self.depth_buckets.push(DepthBucket::new(texture));
                self.open_buckets.insert(texture, index);
                &mut self.depth_buckets[index]
            }
        }
    }

    /// A translucent tinted quad at depth `z`; drawn alpha-test-off in
    /// the final depth sub-pass, merged per texture.
    pub fn tinted_quad_z(
        &mut self,
        min: Vec2,
        max: Vec2,
        z: f32,
        texture: TextureId,
        uv: [f32; 4],
        tint: Rgba,
    ) {
        for (pos, tex) in quad_corners(min, max, uv) {
            self.transparent_vertices.push(OverlayVertex {
                pos: [pos[0], pos[1], z],
                uv: tex,
                uv2: [0.0; 2],
                color: tint,
            });
        }
        let mut object = RenderObject::textured(Topology::Quads, 4, texture);
        object.has_color = true;
        self.transparent_objects.push(object);
    }

    /// An overlay-tinted quad at depth `z`; merged per (texture, overlay).
    pub fn overlay_quad_z(
        &mut self,
        min: Vec2,
        max: Vec2,
        z: f32,
        texture: TextureId,
        uv: [f32; 4],
        overlay: Overlay,
        force_new_batch: bool,
    ) {
        let overlay = overlay.normalized();
        if overlay == Overlay::None {
            self.textured_quad_z(min, max, z, texture, uv, force_new_batch);
            return;
        }
        let unit = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
        for ((pos, tex), uv2) in quad_corners(min, max, uv).into_iter().zip(unit) {
            self.overlay_vertices.push(OverlayVertex {
                pos: [pos[0], pos[1], z],
                uv: tex,
                uv2,
                color: overlay.tint(),
            });
        }
        let mut object = RenderObject::textured(Topology::Quads, 4, texture);
        object.overlay = overlay;
        object.has_color = true;
        self.overlay_objects.push(object);
    }
}

fn quad_corners(min: Vec2, max: Vec2, uv: [f32; 4]) -> [([f32; 2], [f32; 2]); 4] {
    [
        ([min.x, min.y], [uv[0], uv[1]]),
        ([max.x, min.y], [uv[2], uv[1]]),
        ([max.x, max.y], [uv[2], uv[3]]),
        ([min.x, max.y], [uv[0], uv[3]]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degenerate_emitters_queue_nothing() {
        let mut batch = FrameBatch::new();
        batch.draw_line(Vec2::splat(3.0), Vec2::splat(3.0), Rgba::WHITE);
        batch.draw_polyline(&[Vec2::ZERO], Rgba::WHITE);
        batch.draw_circle(Vec2::ZERO, 0.0, 32, Rgba::WHITE);
        batch.fill_circle(Vec2::ZERO, -1.0, 32, Rgba::WHITE);
        assert!(batch.is_empty());
        assert!(batch.flat_vertices().is_empty());
    }

    #[test]
    fn vertex_counts_match_pool_growth() {
        let mut batch = FrameBatch::new();
        batch.draw_triangle(Vec2::ZERO, Vec2::X, Vec2::Y, Rgba::RED);
        batch.fill_rect(Vec2::ZERO, Vec2::splat(8.0), Rgba::GREEN);
        batch.draw_polyline(&[Vec2::ZERO, Vec2::X, Vec2::splat(2.0)], Rgba::BLUE);

        let queued: u32 = batch.flat_objects().iter().map(|o| o.vertex_count).sum();
        assert_eq!(queued, batch.flat_vertices().len());
    }

    #[test]
    fn bucket_overflow_opens_a_new_bucket() {
        let mut batch = FrameBatch::new();
        let tex = TextureId(9);
        for i in 0..=MAX_QUADS_PER_BUCKET {
            let p = Vec2::splat(i as f32);
            batch.textured_quad_z(p, p + Vec2::ONE, 0.5, tex, [0.0, 0.0, 1.0, 1.0], false);
        }
        assert_eq!(batch.depth_buckets().len(), 2);
        assert_eq!(batch.depth_buckets()[0].quad_count(), MAX_QUADS_PER_BUCKET);
        assert_eq!(batch.depth_buckets()[1].quad_count(), 1);
    }

    #[test]
    fn forced_quads_stay_out_of_shared_buckets() {
        let mut batch = FrameBatch::new();
        let tex = TextureId(2);
        batch.textured_quad_z(Vec2::ZERO, Vec2::ONE, 0.1, tex, [0.0; 4], false);
        batch.textured_quad_z(Vec2::ZERO, Vec2::ONE, 0.2, tex, [0.0; 4], true);
        batch.textured_quad_z(Vec2::ZERO, Vec2::ONE, 0.3, tex, [0.0; 4], false);

        assert_eq!(batch.depth_buckets().len(), 1);
        assert_eq!(batch.depth_buckets()[0].quad_count(), 2);
        assert_eq!(batch.solo_buckets().len(), 1);
        assert_eq!(batch.solo_buckets()[0].quad_count(), 1);
    }

    #[test]
    fn overlay_depth_quads_carry_the_tint_in_vertex_data() {
        let mut batch = FrameBatch::new();
        let tint = Rgba::new(10, 20, 30, 200);
        batch.overlay_quad_z(
            Vec2::ZERO,
            Vec2::ONE,
            0.5,
            TextureId(1),
            [0.0, 0.0, 1.0, 1.0],
            Overlay::Tint(tint),
            false,
        );

        let vertices = batch.overlay_vertices().as_slice();
        assert_eq!(vertices.len(), 4);
        assert!(vertices.iter().all(|v| v.color == tint));
        assert_eq!(batch.overlay_objects()[0].overlay, Overlay::Tint(tint));
    }

    #[test]
    fn override_info_patches_only_the_tail() {
        let mut batch = FrameBatch::new();
        batch.fill_rect(Vec2::ZERO, Vec2::ONE, Rgba::WHITE);
        batch.fill_rect(Vec2::ONE, Vec2::splat(2.0), Rgba::WHITE);
        batch.fill_rect(Vec2::splat(2.0), Vec2::splat(3.0), Rgba::WHITE);

        let stencil = Some(StencilParams::write(255));
        batch.override_info(2, BlendMode::default(), false, stencil);

        let objects = batch.flat_objects();
        assert!(objects[0].lit && objects[0].stencil.is_none());
        assert!(!objects[1].lit && objects[1].stencil == stencil);
        assert!(!objects[2].lit && objects[2].stencil == stencil);
    }
}
