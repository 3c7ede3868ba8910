//! Change-only forwarding of pipeline state to the driver.

use crate::color::Rgba;
use crate::driver::{GraphicsDriver, RenderTarget, TextureUnits, MAX_TEXTURE_UNITS};
use crate::types::{BlendMode, OverlayKind, StencilParams, TextureId, Topology};
use crate::vertex::VertexLayout;

/// Mirror of every driver state item the engine controls.
///
/// All state changes go through the cache; a request matching the mirror
/// is dropped without touching the driver. The mirror is authoritative
/// because nothing else is allowed to mutate driver state mid-frame.
pub struct StateCache<D> {
    driver: D,
    textures: [TextureId; MAX_TEXTURE_UNITS],
    units_enabled: TextureUnits,
    blend: BlendMode,
    lighting_on: bool,
    light_color: Option<(f32, f32, f32)>,
    stencil: Option<StencilParams>,
    alpha_ref: Option<f32>,
    depth_test: bool,
    color_array: bool,
    overlay_kind: OverlayKind,
    overlay_tint: Rgba,
    /// (layout, data address, data length) of the bound vertex source.
    source: Option<(VertexLayout, usize, usize)>,
}

impl<D: GraphicsDriver> StateCache<D> {
    pub fn new(driver: D) -> Self {
        Self {
            driver,
            textures: [TextureId::NONE; MAX_TEXTURE_UNITS],
            units_enabled: TextureUnits::empty(),
            blend: BlendMode::default(),
            lighting_on: false,
            light_color: None,
            stencil: None,
            alpha_ref: None,
            depth_test: false,
            color_array: false,
            overlay_kind: OverlayKind::None,
            overlay_tint: Rgba::WHITE,
            source: None,
        }
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// Enable `unit` and bind `texture` on it. Binding [`TextureId::NONE`]
    /// disables the unit instead.
    pub fn bind_texture(&mut self, unit: u32, texture: TextureId) {
        if texture.is_none() {
            self.disable_texture_unit(unit);
            return;
        }
        let flag = TextureUnits::unit(unit);
        if !self.units_enabled.contains(flag) {
            self.units_enabled.insert(flag);
            self.driver.enable_texture_unit(unit);
        }
        if self.textures[unit as usize] != texture {
            self.textures[unit as usize] = texture;
            self.driver.bind_texture(unit, texture);
        }
    }

    pub fn disable_texture_unit(&mut self, unit: u32) {
        let flag = TextureUnits::unit(unit);
        if self.units_enabled.contains(flag) {
            self.units_enabled.remove(flag);
            self.driver.disable_texture_unit(unit);
        }
    }

    pub fn set_blend(&mut self, blend: BlendMode) {
        if self.blend != blend {
            self.blend = blend;
            self.driver.set_blend(blend);
        }
    }

    pub fn set_lighting(&mut self, enabled: bool) {
        if self.lighting_on != enabled {
            self.lighting_on = enabled;
            self.driver.set_lighting(enabled);
        }
    }

    pub fn set_light_color(&mut self, r: f32, g: f32, b: f32) {
        if self.light_color != Some((r, g, b)) {
            self.light_color = Some((r, g, b));
            self.driver.set_light_color(r, g, b);
        }
    }

    /// Forget the mirrored light color so the next set is forwarded even
    /// if it repeats the previous frame's value. Used when the light
    /// state is reset externally between frames.
    pub fn invalidate_lighting(&mut self) {
        self.light_color = None;
    }

    pub fn set_stencil(&mut self, params: StencilParams) {
        if self.stencil != Some(params) {
            self.stencil = Some(params);
            self.driver.set_stencil(params);
        }
    }

    pub fn disable_stencil(&mut self) {
        if self.stencil.is_some() {
            self.stencil = None;
            self.driver.disable_stencil();
        }
    }

    /// Stencil clears are not idempotent driver state, so they always
    /// forward.
    pub fn clear_stencil(&mut self, value: u8) {
        self.driver.clear_stencil(value);
    }

    pub fn set_alpha_test(&mut self, reference: f32) {
        if self.alpha_ref != Some(reference) {
            self.alpha_ref = Some(reference);
            self.driver.set_alpha_test(reference);
        }
    }

    pub fn disable_alpha_test(&mut self) {
        if self.alpha_ref.is_some() {
            self.alpha_ref = None;
            self.driver.disable_alpha_test();
        }
    }

    pub fn set_depth_test(&mut self, enabled: bool) {
        if self.depth_test != enabled {
            self.depth_test = enabled;
            self.driver.set_depth_test(enabled);
        }
    }

    pub fn set_color_array(&mut self, enabled: bool) {
        if self.color_array != enabled {
            self.color_array = enabled;
            self.driver.set_color_array(enabled);
        }
    }

    pub fn set_overlay_stage(&mut self, kind: OverlayKind) {
        if self.overlay_kind != kind {
            self.overlay_kind = kind;
            self.driver.set_overlay_stage(kind);
        }
    }

    pub fn set_overlay_tint(&mut self, tint: Rgba) {
        if self.overlay_tint != tint {
            self.overlay_tint = tint;
            self.driver.set_overlay_tint(tint);
        }
    }

    /// Forget the bound vertex source. Pools keep their allocations
    /// across frames, so a pointer/length match on a later flush does
    /// not mean the bytes behind it are unchanged; the flusher drops
    /// the mirror once its borrow of the pools ends.
    pub fn invalidate_vertex_source(&mut self) {
        self.source = None;
    }

    /// Bind `data` under `layout`, skipping the call when the same slice
    /// is already bound under the same layout. Valid only within one
    /// flush; see [`invalidate_vertex_source`](Self::invalidate_vertex_source).
    pub fn bind_vertex_source(&mut self, layout: VertexLayout, data: &[u8]) {
        let fingerprint = (layout, data.as_ptr() as usize, data.len());
        if self.source != Some(fingerprint) {
            self.source = Some(fingerprint);
            self.driver.bind_vertex_source(layout, data);
        }
    }

    /// Draws pass straight through; deduplicating them would drop work.
    pub fn draw(&mut self, topology: Topology, first: u32, count: u32) {
        self.driver.draw(topology, first, count);
    }

    /// Target switches always forward; the bound vertex source does not
    /// survive them on all drivers, so its mirror is dropped.
    pub fn set_render_target(&mut self, target: Option<&RenderTarget>) {
        self.source = None;
        self.driver.set_render_target(target);
    }

    pub fn clear_target(&mut self) {
        self.driver.clear_target();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Counts every forwarded call, ignoring arguments.
    #[derive(Default)]
    struct CountingDriver {
        calls: u32,
    }

    impl GraphicsDriver for CountingDriver {
        fn bind_texture(&mut self, _unit: u32, _texture: TextureId) {
            self.calls += 1;
        }
        fn enable_texture_unit(&mut self, _unit: u32) {
            self.calls += 1;
        }
        fn disable_texture_unit(&mut self, _unit: u32) {
            self.calls += 1;
        }
        fn set_blend(&mut self, _blend: BlendMode) {
            self.calls += 1;
        }
        fn set_lighting(&mut self, _enabled: bool) {
            self.calls += 1;
        }
        fn set_light_color(&mut self, _r: f32, _g: f32, _b: f32) {
            self.calls += 1;
        }
        fn set_stencil(&mut self, _params: StencilParams) {
            self.calls += 1;
        }
        fn disable_stencil(&mut self) {
            self.calls += 1;
        }
        fn clear_stencil(&mut self, _value: u8) {
            self.calls += 1;
        }
        fn set_alpha_test(&mut self, _reference: f32) {
            self.calls += 1;
        }
        fn disable_alpha_test(&mut self) {
            self.calls += 1;
        }
        fn set_depth_test(&mut self, _enabled: bool) {
            self.calls += 1;
        }
        fn set_overlay_stage(&mut self, _kind: OverlayKind) {
            self.calls += 1;
        }
        fn set_overlay_tint(&mut self, _tint: Rgba) {
            self.calls += 1;
        }
        fn set_color_array(&mut self, _enabled: bool) {
            self.calls += 1;
        }
        fn bind_vertex_source(&mut self, _layout: VertexLayout, _data: &[u8]) {
            self.calls += 1;
        }
        fn draw(&mut self, _topology: Topology, _first: u32, _count: u32) {
            self.calls += 1;
        }
        fn set_render_target(&mut self, _target: Option<&RenderTarget>) {
            self.calls += 1;
        }
        fn clear_target(&mut self) {
            self.calls += 1;
        }
    }

    #[test]
    fn repeated_state_is_not_forwarded() {
        let mut cache = StateCache::new(CountingDriver::default());
        cache.set_blend(BlendMode::default());
        assert_eq!(cache.driver().calls, 0);

        cache.set_depth_test(true);
        cache.set_depth_test(true);
        cache.set_alpha_test(0.3);
        cache.set_alpha_test(0.3);
        assert_eq!(cache.driver().calls, 2);
    }

    #[test]
    fn binding_a_texture_enables_its_unit_once() {
        let mut cache = StateCache::new(CountingDriver::default());
        cache.bind_texture(0, TextureId(5));
        // enable + bind
        assert_eq!(cache.driver().calls, 2);

        cache.bind_texture(0, TextureId(5));
        assert_eq!(cache.driver().calls, 2);

        cache.bind_texture(0, TextureId(6));
        assert_eq!(cache.driver().calls, 3);

        cache.bind_texture(0, TextureId::NONE);
        assert_eq!(cache.driver().calls, 4);
    }

    #[test]
    fn stencil_clear_always_forwards() {
        let mut cache = StateCache::new(CountingDriver::default());
        cache.clear_stencil(0);
        cache.clear_stencil(0);
        assert_eq!(cache.driver().calls, 2);
    }
}
