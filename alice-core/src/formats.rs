//! Wire enums and their frozen lookup tables.
//!
//! Each enum's discriminant is the integer the module sends. Decoding an
//! unknown value is a protocol error: it means the module was built against
//! a different table.

use std::fmt;

use crate::error::ProtocolError;

// ════════════════════════════════════════════════════════════════════
// Texture formats
// ════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    Rgba8Unorm,
    Rgba8Snorm,
    R8Unorm,
    R8Snorm,
}

impl TextureFormat {
    pub const ALL: [TextureFormat; 4] = [
        TextureFormat::Rgba8Unorm,
        TextureFormat::Rgba8Snorm,
        TextureFormat::R8Unorm,
        TextureFormat::R8Snorm,
    ];

    pub fn from_wire(raw: u32) -> Result<Self, ProtocolError> {
        usize::try_from(raw)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
            .ok_or(ProtocolError::UnknownTextureFormat(raw))
    }

    pub fn to_wire(self) -> u32 {
        self as u32
    }

    pub fn name(self) -> &'static str {
        match self {
            TextureFormat::Rgba8Unorm => "rgba8unorm",
            TextureFormat::Rgba8Snorm => "rgba8snorm",
            TextureFormat::R8Unorm => "r8unorm",
            TextureFormat::R8Snorm => "r8snorm",
        }
    }

    pub fn bytes_per_pixel(self) -> u32 {
        match self {
            TextureFormat::Rgba8Unorm | TextureFormat::Rgba8Snorm => 4,
            TextureFormat::R8Unorm | TextureFormat::R8Snorm => 1,
        }
    }
}

impl fmt::Display for TextureFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ════════════════════════════════════════════════════════════════════
// Sampler filters
// ════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterMode {
    Linear,
    Nearest,
}

impl FilterMode {
    pub fn from_wire(raw: u32) -> Result<Self, ProtocolError> {
        match raw {
            0 => Ok(FilterMode::Linear),
            1 => Ok(FilterMode::Nearest),
            other => Err(ProtocolError::UnknownFilterMode(other)),
        }
    }
}

// ════════════════════════════════════════════════════════════════════
// Buffer modes
// ════════════════════════════════════════════════════════════════════

/// Update-frequency hint. Both modes get the same usage flags today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferMode {
    Static,
    Dynamic,
}

impl BufferMode {
    pub fn from_wire(raw: u32) -> Result<Self, ProtocolError> {
        match raw {
            0 => Ok(BufferMode::Static),
            1 => Ok(BufferMode::Dynamic),
            other => Err(ProtocolError::UnknownBufferMode(other)),
        }
    }
}

// ════════════════════════════════════════════════════════════════════
// Vertex attribute formats
// ════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    Float32,
    Uint16,
    Uint32,
}

impl ElementType {
    pub fn size_bytes(self) -> u32 {
        match self {
            ElementType::Float32 | ElementType::Uint32 => 4,
            ElementType::Uint16 => 2,
        }
    }

    fn prefix(self) -> &'static str {
        match self {
            ElementType::Float32 => "float32",
            ElementType::Uint16 => "uint16",
            ElementType::Uint32 => "uint32",
        }
    }
}

/// (component count, element type) pair selected by a wire index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexAttributeFormat {
    pub components: u8,
    pub element: ElementType,
}

const fn attr(components: u8, element: ElementType) -> VertexAttributeFormat {
    VertexAttributeFormat {
        components,
        element,
    }
}

/// Index on the wire == position in this table.
pub const VERTEX_ATTRIBUTE_FORMATS: [VertexAttributeFormat; 12] = [
    attr(1, ElementType::Float32),
    attr(2, ElementType::Float32),
    attr(3, ElementType::Float32),
    attr(4, ElementType::Float32),
    attr(1, ElementType::Uint16),
    attr(2, ElementType::Uint16),
    attr(3, ElementType::Uint16),
    attr(4, ElementType::Uint16),
    attr(1, ElementType::Uint32),
    attr(2, ElementType::Uint32),
    attr(3, ElementType::Uint32),
    attr(4, ElementType::Uint32),
];

impl VertexAttributeFormat {
    pub fn from_wire(raw: u16) -> Result<Self, ProtocolError> {
        VERTEX_ATTRIBUTE_FORMATS
            .get(raw as usize)
            .copied()
            .ok_or(ProtocolError::UnknownVertexFormat(raw))
    }

    pub fn to_wire(self) -> u16 {
        VERTEX_ATTRIBUTE_FORMATS
            .iter()
            .position(|f| *f == self)
            .map(|i| i as u16)
            .unwrap_or(u16::MAX)
    }

    pub fn size_bytes(self) -> u32 {
        self.components as u32 * self.element.size_bytes()
    }
}

impl fmt::Display for VertexAttributeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.components == 1 {
            f.write_str(self.element.prefix())
        } else {
            write!(f, "{}x{}", self.element.prefix(), self.components)
        }
    }
}
