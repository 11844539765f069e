// alice-host/src/shell/app.rs
//! Application state and winit event loop.
//!
//! The window and the wgpu surface are created on the first `resumed`; the
//! module is compiled and its `entry_point` run right after, so the surface
//! exists before any `gpu_*` import can be called. After that every
//! `RedrawRequested` drives one frame and immediately asks for the next one;
//! the surface's vsync present mode paces the loop.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use alice_gpu::WgpuBackend;

use crate::config::HostConfig;
use crate::session::{FrameInput, Session};

// ════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════

pub struct CanvasApp {
    // ── Startup ──
    config: HostConfig,
    wasm: Vec<u8>,

    // ── Window + session ──
    pub(crate) window: Option<Arc<Window>>,
    pub(crate) session: Option<Session<WgpuBackend>>,

    // ── Input ──
    pub(crate) input: FrameInput,

    // ── Outcome ──
    pub(crate) frames: u64,
    failure: Option<anyhow::Error>,
}

impl CanvasApp {
    pub fn new(config: HostConfig, wasm: Vec<u8>) -> Self {
        Self {
            config,
            wasm,
            window: None,
            session: None,
            input: FrameInput::default(),
            frames: 0,
            failure: None,
        }
    }

    pub fn request_redraw(&self) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    /// Surface height, used to flip pointer coordinates.
    pub fn surface_height(&self) -> u32 {
        self.window
            .as_ref()
            .map(|w| w.inner_size().height)
            .unwrap_or(0)
    }

    /// Stop the loop and keep `error` for [`run`] to return.
    pub(crate) fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        tracing::error!("{error:#}");
        self.failure.get_or_insert(error);
        event_loop.exit();
    }

    /// One frame cycle.
    pub(crate) fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(session) = &mut self.session else {
            return;
        };

        match session.run_frame(&self.input, Instant::now()) {
            Ok(Some(report)) => {
                self.frames += 1;
                let reported = session.take_reported();
                if !reported.is_empty() {
                    tracing::debug!(
                        frame = report.index,
                        errors = reported.len(),
                        skipped = report.draws_skipped,
                        "frame had recoverable errors"
                    );
                }
            }
            Ok(None) => {}
            Err(error) => {
                self.fail(event_loop, error);
                return;
            }
        }
        self.request_redraw();
    }

    fn boot(&mut self, window: Arc<Window>) -> Result<Session<WgpuBackend>> {
        let size = window.inner_size();
        let backend = WgpuBackend::new(
            window,
            (size.width, size.height),
            self.config.surface_options(),
        )
        .context("GPU init failed")?;

        let wasm = std::mem::take(&mut self.wasm);
        let mut session = Session::load(&wasm, backend, self.config.session_options())?;
        session.start()?;
        Ok(session)
    }
}

// ════════════════════════════════════════════════════════════════════
// ApplicationHandler
// ════════════════════════════════════════════════════════════════════

impl ApplicationHandler for CanvasApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs = Window::default_attributes()
            .with_title(self.config.window.title.clone())
            .with_inner_size(PhysicalSize::new(
                self.config.window.width,
                self.config.window.height,
            ));

        let window = match event_loop.create_window(attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                self.fail(event_loop, anyhow::Error::new(e).context("window creation failed"));
                return;
            }
        };
        self.window = Some(window.clone());

        match self.boot(window) {
            Ok(session) => {
                tracing::info!("window, GPU and module ready");
                self.session = Some(session);
                self.request_redraw();
            }
            Err(e) => self.fail(event_loop, e),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        super::events::handle_window_event(self, event_loop, event);
    }
}

// ════════════════════════════════════════════════════════════════════
// Entry
// ════════════════════════════════════════════════════════════════════

/// Open a window and run the module until it is closed or fails.
pub fn run(config: HostConfig, wasm: Vec<u8>) -> Result<()> {
    let event_loop = EventLoop::new().context("failed to create event loop")?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = CanvasApp::new(config, wasm);
    event_loop
        .run_app(&mut app)
        .context("event loop failed")?;

    tracing::info!(frames = app.frames, "window closed");
    match app.failure {
        Some(error) => Err(error),
        None => Ok(()),
    }
}
