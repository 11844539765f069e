//! # Alice GPU
//!
//! Resource operations behind the module's `gpu_*` imports, generic over a
//! [`GpuBackend`]: the real wgpu device ([`WgpuBackend`]) or a headless
//! recorder ([`RecordingBackend`]).

pub mod backend;
pub mod bridge;
pub mod frame;
pub mod gfx;
pub mod recording;
pub mod shader;

pub use backend::{BackendError, DrawCall, GpuBackend};
pub use bridge::{Bridge, DrawOutcome};
pub use frame::{FrameStats, OpenFrame};
pub use gfx::{SurfaceOptions, WgpuBackend};
pub use recording::RecordingBackend;
