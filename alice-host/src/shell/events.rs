//! Winit event handling.
//!
//! Translates `WindowEvent`s into surface resizes, pointer state and frame
//! cycles. Pointer coordinates are flipped so the origin is bottom-left.

use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::event_loop::ActiveEventLoop;

use super::app::CanvasApp;

pub fn handle_window_event(app: &mut CanvasApp, event_loop: &ActiveEventLoop, event: WindowEvent) {
    match event {
        // ── Window lifecycle ──────────────────────────────────────
        WindowEvent::CloseRequested => {
            tracing::info!("Window close requested");
            event_loop.exit();
        }

        WindowEvent::Destroyed => {
            tracing::info!("Window destroyed");
        }

        // ── Resize ───────────────────────────────────────────────
        WindowEvent::Resized(size) => {
            if let Some(session) = &mut app.session {
                session
                    .bridge_mut()
                    .backend_mut()
                    .resize(size.width, size.height);
            }
            app.request_redraw();
        }

        // ── Pointer ──────────────────────────────────────────────
        WindowEvent::CursorMoved { position, .. } => {
            let height = app.surface_height() as f64;
            app.input.pointer_x = position.x.max(0.0) as u32;
            app.input.pointer_y = (height - position.y).max(0.0) as u32;
        }

        WindowEvent::MouseInput { state, button, .. } => {
            let down = state == ElementState::Pressed;
            match button {
                MouseButton::Left => app.input.buttons.left = down,
                MouseButton::Right => app.input.buttons.right = down,
                MouseButton::Middle => app.input.buttons.middle = down,
                _ => {}
            }
        }

        // Releases outside the window are never delivered.
        WindowEvent::Focused(false) => {
            app.input.buttons = Default::default();
        }

        // ── Frame ────────────────────────────────────────────────
        WindowEvent::RedrawRequested => {
            app.redraw(event_loop);
        }

        _ => {}
    }
}
