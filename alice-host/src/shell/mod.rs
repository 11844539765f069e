//! Windowed shell: winit lifecycle and event dispatch.
//!
//! The shell owns the event loop and one [`Session`](crate::Session) on the
//! wgpu backend. Platform events become [`FrameInput`](crate::FrameInput)
//! and each redraw runs one frame cycle.

pub(crate) mod app;
mod events;

pub use app::run;
