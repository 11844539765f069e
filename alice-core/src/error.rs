//! Error taxonomy shared by every layer of the bridge.
//!
//! Errors fall in two classes. Fatal errors (`BridgeError::is_fatal`) mean
//! the module and host disagree about memory or layout, so the session is
//! terminated. Everything else is reported and the offending operation
//! becomes a no-op.

use thiserror::Error;

use crate::formats::TextureFormat;
use crate::handles::{Handle, ResourceKind};
use crate::rect::Rect;

/// The two sides disagree on a wire layout or on call sequencing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("unknown vertex attribute format {0}")]
    UnknownVertexFormat(u16),

    #[error("vertex format declares {count} attributes, at most {max} are allowed")]
    TooManyAttributes { count: u16, max: u16 },

    #[error("unknown texture format {0}")]
    UnknownTextureFormat(u32),

    #[error("unknown sampler filter mode {0}")]
    UnknownFilterMode(u32),

    #[error("unknown buffer mode {0}")]
    UnknownBufferMode(u32),

    #[error("inverted rectangle ({x0}, {y0}) -> ({x1}, {y1})")]
    InvertedRect { x0: u32, y0: u32, x1: u32, y1: u32 },

    #[error("{what} {value} is not a multiple of {align}")]
    Misaligned {
        what: &'static str,
        value: u64,
        align: u64,
    },

    #[error(
        "download format {download} ({} B/px) does not match texture format {texture} ({} B/px)",
        .download.bytes_per_pixel(),
        .texture.bytes_per_pixel()
    )]
    FormatMismatch {
        download: TextureFormat,
        texture: TextureFormat,
    },

    #[error("draw command issued outside an open frame")]
    NoOpenFrame,

    #[error("frame started while another is still in progress")]
    FrameInProgress,

    #[error("module has no linear memory to exchange records through")]
    NoMemory,
}

/// Every failure a bridge operation can produce.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BridgeError {
    #[error("out-of-bounds access: offset {offset:#x} + len {len:#x} exceeds size {size:#x}")]
    OutOfBounds { offset: u64, len: u64, size: u64 },

    #[error("handle {0} not found")]
    NotFound(Handle),

    #[error("handle {handle} names a {actual}, expected a {expected}")]
    KindMismatch {
        handle: Handle,
        expected: ResourceKind,
        actual: ResourceKind,
    },

    #[error("protocol mismatch: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("region {region:?} lies outside a {width}x{height} texture")]
    RegionOutOfBounds {
        region: Rect,
        width: u32,
        height: u32,
    },

    #[error("{kind} rejected: {reason}")]
    Rejected { kind: ResourceKind, reason: String },

    #[error("GPU capability unavailable: {0}")]
    Unavailable(String),

    #[error("handle space exhausted")]
    HandleSpaceExhausted,

    #[error("module panicked: {0}")]
    GuestPanic(String),

    #[error("frame budget exceeded")]
    FrameBudgetExceeded,
}

impl BridgeError {
    /// Fatal errors terminate the session; the rest are reported and skipped.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            BridgeError::NotFound(_) | BridgeError::KindMismatch { .. } | BridgeError::Rejected { .. }
        )
    }

    pub fn rejected(kind: ResourceKind, reason: impl Into<String>) -> Self {
        BridgeError::Rejected {
            kind,
            reason: reason.into(),
        }
    }
}
