//! The seam between resource operations and an actual GPU.
//!
//! `Bridge` is generic over [`GpuBackend`]. The windowed host plugs in
//! `WgpuBackend`; tests and `--headless` runs plug in `RecordingBackend`.

use std::ops::Range;

use alice_core::codec::VertexFormat;
use alice_core::formats::{BufferMode, FilterMode, TextureFormat};
use alice_core::{BridgeError, Rect, ResourceKind};
use thiserror::Error;

use crate::shader::ValidatedShader;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("no suitable GPU adapter found: {0}")]
    NoAdapter(String),

    #[error("device request failed: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("surface creation failed: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("surface reports no usable texture format")]
    NoSurfaceFormat,

    /// The device cannot express what the module asked for.
    #[error("{0}")]
    Unsupported(String),

    #[error("GPU out of memory")]
    OutOfMemory,
}

impl BackendError {
    /// Unsupported requests become a reported rejection of `kind`; anything
    /// else means the device itself is gone.
    pub fn into_bridge(self, kind: ResourceKind) -> BridgeError {
        match self {
            BackendError::Unsupported(reason) => BridgeError::rejected(kind, reason),
            other => BridgeError::Unavailable(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferDesc {
    pub size: u64,
    pub mode: BufferMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureDesc {
    pub format: TextureFormat,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplerDesc {
    pub mag_filter: FilterMode,
    pub min_filter: FilterMode,
}

/// Everything one indexed draw needs, already resolved from handles and
/// clamped to the frame extent.
pub struct DrawCall<'a, B: GpuBackend + ?Sized> {
    pub pipeline: &'a B::Pipeline,
    pub constant_buffer: &'a B::Buffer,
    pub vertex_buffer: &'a B::Buffer,
    pub index_buffer: &'a B::Buffer,
    pub texture: &'a B::Texture,
    pub sampler: &'a B::Sampler,
    pub indices: Range<u32>,
    pub depth_test: bool,
    /// Non-empty, inside the frame extent.
    pub viewport: Rect,
    /// Non-empty, inside the frame extent.
    pub scissor: Rect,
}

pub trait GpuBackend: 'static {
    type Buffer: 'static;
    type Texture: 'static;
    type Sampler: 'static;
    type Shader: 'static;
    type Pipeline: 'static;
    /// One open command stream and render pass on the current target.
    type Frame: 'static;

    fn create_buffer(&mut self, desc: &BufferDesc) -> Result<Self::Buffer, BackendError>;

    /// `offset` and `data.len()` are already validated against the buffer.
    fn write_buffer(&mut self, buffer: &mut Self::Buffer, offset: u64, data: &[u8]);

    fn create_texture(&mut self, desc: &TextureDesc) -> Result<Self::Texture, BackendError>;

    /// `data` holds exactly `region.area() * bytes_per_pixel` tightly packed bytes.
    fn write_texture(
        &mut self,
        texture: &mut Self::Texture,
        region: Rect,
        bytes_per_pixel: u32,
        data: &[u8],
    );

    fn create_sampler(&mut self, desc: &SamplerDesc) -> Result<Self::Sampler, BackendError>;

    fn create_shader(&mut self, shader: &ValidatedShader) -> Result<Self::Shader, BackendError>;

    fn create_pipeline(
        &mut self,
        shader: &Self::Shader,
        vertex_format: &VertexFormat,
    ) -> Result<Self::Pipeline, BackendError>;

    /// Device limits the bridge checks module requests against before
    /// calling `create_*`.
    fn limits(&self) -> wgpu::Limits {
        wgpu::Limits::default()
    }

    /// Current render target size in pixels.
    fn extent(&self) -> (u32, u32);

    /// `Ok(None)` when no target image is available this cycle.
    fn begin_frame(&mut self) -> Result<Option<Self::Frame>, BackendError>;

    fn draw(&mut self, frame: &mut Self::Frame, call: DrawCall<'_, Self>);

    fn submit_frame(&mut self, frame: Self::Frame);
}
