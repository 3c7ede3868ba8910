//! Cross-flush state deduplication: the mirror survives between
//! flushes, so repeated frames with identical state stay quiet.

use glam::Vec2;
use veld_core::geometry::Size;
use veld_render::{RenderBackend, Rgba, TextureId};
use veld_test_utils::{DriverCall, RecordingDriver};

#[test]
fn texture_binds_are_not_repeated_across_flushes() {
    let (driver, log) = RecordingDriver::new();
    let mut backend = RenderBackend::new(driver, Size::new(640, 480));
    let tex = TextureId(7);

    for _ in 0..3 {
        backend.begin_frame();
        backend
            .batch_mut()
            .textured_quad(Vec2::ZERO, Vec2::ONE, tex, [0.0, 0.0, 1.0, 1.0], 255);
        backend.flush();
    }

    // The unit is re-enabled each flush (the pass disables it on exit),
    // but the bound texture never changes so it forwards exactly once.
    let binds = log.count_of(|c| matches!(c, DriverCall::BindTexture { unit: 0, .. }));
    assert_eq!(binds, 1);
    let enables = log.count_of(|c| matches!(c, DriverCall::EnableTextureUnit { unit: 0 }));
    assert_eq!(enables, 3);
}

#[test]
fn vertex_source_rebinds_every_flush() {
    let (driver, log) = RecordingDriver::new();
    let mut backend = RenderBackend::new(driver, Size::new(640, 480));

    // Two frames with the same vertex count reuse the pool allocation,
    // so the slice address and length can repeat while the contents
    // differ. The source must be bound again regardless.
    backend
        .batch_mut()
        .fill_rect(Vec2::ZERO, Vec2::ONE, Rgba::RED);
    backend.flush();
    backend
        .batch_mut()
        .fill_rect(Vec2::splat(5.0), Vec2::splat(9.0), Rgba::RED);
    backend.flush();

    let binds = log.count_of(|c| matches!(c, DriverCall::BindVertexSource { .. }));
    assert_eq!(binds, 2);
}

#[test]
fn light_color_forwards_on_change_only() {
    let (driver, log) = RecordingDriver::new();
    let mut backend = RenderBackend::new(driver, Size::new(640, 480));
    backend.set_lighting_model(1);

    backend.set_lighting(0.5, 0.5, 0.5);
    backend.set_lighting(0.5, 0.5, 0.5);
    backend.set_lighting(0.25, 0.5, 0.5);
    assert_eq!(
        log.count_of(|c| matches!(c, DriverCall::SetLightColor { .. })),
        2
    );

    // After a reset the same color must forward again.
    backend.reset_lighting();
    backend.set_lighting(0.25, 0.5, 0.5);
    assert_eq!(
        log.count_of(|c| matches!(c, DriverCall::SetLightColor { .. })),
        4
    );
}

#[test]
fn light_color_is_ignored_without_a_lighting_model() {
    let (driver, log) = RecordingDriver::new();
    let mut backend = RenderBackend::new(driver, Size::new(640, 480));

    backend.set_lighting(0.1, 0.2, 0.3);
    backend.reset_lighting();
    assert_eq!(log.calls().len(), 0);
}

#[test]
fn stencil_clears_always_forward() {
    let (driver, log) = RecordingDriver::new();
    let mut backend = RenderBackend::new(driver, Size::new(640, 480));

    backend.clear_stencil(0);
    backend.clear_stencil(0);
    assert_eq!(
        log.count_of(|c| matches!(c, DriverCall::ClearStencil(0))),
        2
    );
}
