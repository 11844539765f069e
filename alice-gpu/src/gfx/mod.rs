//! wgpu Backend.
//!
//! Sub-modules:
//!   device  : wgpu device/surface lifecycle, frame open/submit
//!   pipeline: shared bind group layout, module pipelines, per-draw bind groups
//!   convert : wire enums to wgpu types

pub(crate) mod convert;
mod device;
mod pipeline;

pub use device::{SurfaceOptions, WgpuBackend, WgpuFrame, WgpuPipeline, WgpuTexture};
