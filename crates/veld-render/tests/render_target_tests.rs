//! Render-target redirection: attach/detach semantics and the pixel
//! bounds check that follows the active surface.

use glam::Vec2;
use veld_core::geometry::Size;
use veld_render::{RenderBackend, RenderTarget, Rgba, TargetError, TextureId, Topology};
use veld_test_utils::{CallLog, DriverCall, RecordingDriver};

fn backend() -> (RenderBackend<RecordingDriver>, std::sync::Arc<CallLog>) {
    let (driver, log) = RecordingDriver::new();
    (RenderBackend::new(driver, Size::new(800, 600)), log)
}

fn target() -> RenderTarget {
    RenderTarget::new(TextureId(42), 128, 64)
}

#[test]
fn attach_flushes_pending_work_to_the_old_surface() {
    let (mut backend, log) = backend();
    backend
        .batch_mut()
        .fill_rect(Vec2::ZERO, Vec2::ONE, Rgba::RED);
    backend.attach_target(target(), true);

    let calls = log.calls();
    let draw = calls.iter().position(|c| c.is_draw()).unwrap();
    let redirect = calls
        .iter()
        .position(|c| matches!(c, DriverCall::SetRenderTarget(Some(_))))
        .unwrap();
    assert!(draw < redirect, "pending work must land before the switch");
}

#[test]
fn attach_flushes_depth_work_to_the_old_surface_too() {
    let (mut backend, log) = backend();
    backend.batch_mut().textured_quad_z(
        Vec2::ZERO,
        Vec2::ONE,
        0.5,
        TextureId(9),
        [0.0, 0.0, 1.0, 1.0],
        false,
    );
    backend.attach_target(target(), true);

    let calls = log.calls();
    let draw = calls
        .iter()
        .position(|c| c.is_draw())
        .expect("queued depth quad must be submitted");
    let redirect = calls
        .iter()
        .position(|c| matches!(c, DriverCall::SetRenderTarget(Some(_))))
        .unwrap();
    assert!(draw < redirect, "depth work must land before the switch");
    assert!(backend.batch().is_empty());
}

#[test]
fn attach_with_discard_clears_instead_of_redrawing() {
    let (mut backend, log) = backend();
    backend.attach_target(target(), true);

    assert_eq!(log.count_of(|c| matches!(c, DriverCall::ClearTarget)), 1);
    assert_eq!(log.draw_count(), 0);
}

#[test]
fn attach_without_discard_replays_the_target_contents() {
    let (mut backend, log) = backend();
    let target = target();
    backend.attach_target(target, false);

    let calls = log.calls();
    assert_eq!(log.count_of(|c| matches!(c, DriverCall::ClearTarget)), 0);

    let redirect = calls
        .iter()
        .position(|c| matches!(c, DriverCall::SetRenderTarget(Some(_))))
        .unwrap();
    let bind = calls
        .iter()
        .position(|c| *c == DriverCall::BindTexture { unit: 0, texture: target.texture })
        .unwrap();
    let draw = calls.iter().position(|c| c.is_draw()).unwrap();
    assert!(redirect < bind && bind < draw);
    assert_eq!(
        calls[draw],
        DriverCall::Draw {
            topology: Topology::Quads,
            first: 0,
            count: 4,
        }
    );

    // The replay quad must not linger and draw again at frame end.
    assert!(backend.batch().is_empty());
}

#[test]
fn detach_restores_the_backbuffer() {
    let (mut backend, log) = backend();
    backend.attach_target(target(), true);
    backend
        .batch_mut()
        .fill_rect(Vec2::ZERO, Vec2::splat(16.0), Rgba::GREEN);
    backend.detach_target().unwrap();

    let calls = log.calls();
    let draw = calls.iter().position(|c| c.is_draw()).unwrap();
    let restore = calls
        .iter()
        .position(|c| *c == DriverCall::SetRenderTarget(None))
        .unwrap();
    assert!(draw < restore, "target contents flush before the restore");
    assert_eq!(backend.target_size(), Size::new(800, 600));
}

#[test]
fn detach_without_attach_is_an_error() {
    let (mut backend, _log) = backend();
    assert_eq!(backend.detach_target(), Err(TargetError::NotAttached));
}

#[test]
fn pixel_bounds_follow_the_active_target() {
    let (mut backend, _log) = backend();
    assert!(backend.put_pixel(799, 599, Rgba::WHITE));
    assert!(!backend.put_pixel(800, 0, Rgba::WHITE));
    assert!(!backend.put_pixel(-1, 0, Rgba::WHITE));

    backend.attach_target(target(), true);
    assert_eq!(backend.target_size(), Size::new(128, 64));
    assert!(backend.put_pixel(127, 63, Rgba::WHITE));
    assert!(!backend.put_pixel(128, 0, Rgba::WHITE));

    backend.detach_target().unwrap();
    assert!(backend.put_pixel(400, 300, Rgba::WHITE));
}

#[test]
fn switching_targets_reattaches_cleanly() {
    let (mut backend, log) = backend();
    backend.attach_target(target(), true);
    backend.attach_target(RenderTarget::new(TextureId(43), 32, 32), true);

    let redirects = log.count_of(|c| matches!(c, DriverCall::SetRenderTarget(Some(_))));
    assert_eq!(redirects, 2);
    assert_eq!(backend.target_size(), Size::new(32, 32));
}
