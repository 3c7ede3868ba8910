//! Mock graphics drivers that record operations instead of drawing.

use std::sync::Arc;

use parking_lot::Mutex;
use veld_render::{
    BlendMode, GraphicsDriver, OverlayKind, RenderTarget, Rgba, StencilParams, TextureId,
    Topology, VertexLayout,
};

/// One recorded driver operation.
///
/// Vertex data is captured by length only; tests assert on the call
/// sequence and the draw ranges, not on raw bytes.
#[derive(Debug, Clone, PartialEq)]
pub enum DriverCall {
    BindTexture { unit: u32, texture: TextureId },
    EnableTextureUnit { unit: u32 },
    DisableTextureUnit { unit: u32 },
    SetBlend(BlendMode),
    SetLighting(bool),
    SetLightColor { r: f32, g: f32, b: f32 },
    SetStencil(StencilParams),
    DisableStencil,
    ClearStencil(u8),
    SetAlphaTest(f32),
    DisableAlphaTest,
    SetDepthTest(bool),
    SetOverlayStage(OverlayKind),
    SetOverlayTint(Rgba),
    SetColorArray(bool),
    BindVertexSource { layout: VertexLayout, len: usize },
    Draw { topology: Topology, first: u32, count: u32 },
    SetRenderTarget(Option<RenderTarget>),
    ClearTarget,
}

impl DriverCall {
    pub fn is_draw(&self) -> bool {
        matches!(self, DriverCall::Draw { .. })
    }
}

/// Shared, thread-safe log of recorded calls.
///
/// The backend owns the driver, so tests hold this handle to look at
/// what was forwarded.
#[derive(Debug, Default)]
pub struct CallLog {
    calls: Mutex<Vec<DriverCall>>,
}

impl CallLog {
    pub fn record(&self, call: DriverCall) {
        self.calls.lock().push(call);
    }

    /// Snapshot of all recorded calls in order.
    pub fn calls(&self) -> Vec<DriverCall> {
        self.calls.lock().clone()
    }

    pub fn draw_count(&self) -> usize {
        self.calls.lock().iter().filter(|c| c.is_draw()).count()
    }

    /// Only the draw calls, in submission order.
    pub fn draws(&self) -> Vec<DriverCall> {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.is_draw())
            .cloned()
            .collect()
    }

    pub fn count_of(&self, predicate: impl Fn(&DriverCall) -> bool) -> usize {
        self.calls.lock().iter().filter(|c| predicate(c)).count()
    }

    pub fn clear(&self) {
        self.calls.lock().clear();
    }
}

/// A driver that records every call into a shared [`CallLog`].
#[derive(Debug, Default)]
pub struct RecordingDriver {
    log: Arc<CallLog>,
}

impl RecordingDriver {
    /// Build a driver and the log handle tests inspect afterwards.
    pub fn new() -> (Self, Arc<CallLog>) {
        let log = Arc::new(CallLog::default());
        (Self { log: log.clone() }, log)
    }
}

impl GraphicsDriver for RecordingDriver {
    fn bind_texture(&mut self, unit: u32, texture: TextureId) {
        self.log.record(DriverCall::BindTexture { unit, texture });
    }

    fn enable_texture_unit(&mut self, unit: u32) {
        self.log.record(DriverCall::EnableTextureUnit { unit });
    }

    fn disable_texture_unit(&mut self, unit: u32) {
        self.log.record(DriverCall::DisableTextureUnit { unit });
    }

    fn set_blend(&mut self, blend: BlendMode) {
        self.log.record(DriverCall::SetBlend(blend));
    }

    fn set_lighting(&mut self, enabled: bool) {
        self.log.record(DriverCall::SetLighting(enabled));
    }

    fn set_light_color(&mut self, r: f32, g: f32, b: f32) {
        self.log.record(DriverCall::SetLightColor { r, g, b });
    }

    fn set_stencil(&mut self, params: StencilParams) {
        self.log.record(DriverCall::SetStencil(params));
    }

    fn disable_stencil(&mut self) {
        self.log.record(DriverCall::DisableStencil);
    }

    fn clear_stencil(&mut self, value: u8) {
        self.log.record(DriverCall::ClearStencil(value));
    }

    fn set_alpha_test(&mut self, reference: f32) {
        self.log.record(DriverCall::SetAlphaTest(reference));
    }

    fn disable_alpha_test(&mut self) {
        self.log.record(DriverCall::DisableAlphaTest);
    }

    fn set_depth_test(&mut self, enabled: bool) {
        self.log.record(DriverCall::SetDepthTest(enabled));
    }

    fn set_overlay_stage(&mut self, kind: OverlayKind) {
        self.log.record(DriverCall::SetOverlayStage(kind));
    }

    fn set_overlay_tint(&mut self, tint: Rgba) {
        self.log.record(DriverCall::SetOverlayTint(tint));
    }

    fn set_color_array(&mut self, enabled: bool) {
        self.log.record(DriverCall::SetColorArray(enabled));
    }

    fn bind_vertex_source(&mut self, layout: VertexLayout, data: &[u8]) {
        self.log.record(DriverCall::BindVertexSource {
            layout,
            len: data.len(),
        });
    }

    fn draw(&mut self, topology: Topology, first: u32, count: u32) {
        self.log.record(DriverCall::Draw {
            topology,
            first,
            count,
        });
    }

    fn set_render_target(&mut self, target: Option<&RenderTarget>) {
        self.log.record(DriverCall::SetRenderTarget(target.copied()));
    }

    fn clear_target(&mut self) {
        self.log.record(DriverCall::ClearTarget);
    }
}

/// A driver that discards everything. Useful for benchmarking the
/// engine itself without log allocation in the way.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDriver;

impl GraphicsDriver for NullDriver {
    fn bind_texture(&mut self, _unit: u32, _texture: TextureId) {}
    fn enable_texture_unit(&mut self, _unit: u32) {}
    fn disable_texture_unit(&mut self, _unit: u32) {}
    fn set_blend(&mut self, _blend: BlendMode) {}
    fn set_lighting(&mut self, _enabled: bool) {}
    fn set_light_color(&mut self, _r: f32, _g: f32, _b: f32) {}
    fn set_stencil(&mut self, _params: StencilParams) {}
    fn disable_stencil(&mut self) {}
    fn clear_stencil(&mut self, _value: u8) {}
    fn set_alpha_test(&mut self, _reference: f32) {}
    fn disable_alpha_test(&mut self) {}
    fn set_depth_test(&mut self, _enabled: bool) {}
    fn set_overlay_stage(&mut self, _kind: OverlayKind) {}
    fn set_overlay_tint(&mut self, _tint: Rgba) {}
    fn set_color_array(&mut self, _enabled: bool) {}
    fn bind_vertex_source(&mut self, _layout: VertexLayout, _data: &[u8]) {}
    fn draw(&mut self, _topology: Topology, _first: u32, _count: u32) {}
    fn set_render_target(&mut self, _target: Option<&RenderTarget>) {}
    fn clear_target(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_driver_logs_in_call_order() {
        let (mut driver, log) = RecordingDriver::new();
        driver.set_depth_test(true);
        driver.draw(Topology::Quads, 0, 4);
        driver.set_depth_test(false);

        let calls = log.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0], DriverCall::SetDepthTest(true));
        assert!(calls[1].is_draw());
        assert_eq!(log.draw_count(), 1);
        assert_eq!(log.count_of(|c| matches!(c, DriverCall::SetDepthTest(_))), 2);
    }
}
