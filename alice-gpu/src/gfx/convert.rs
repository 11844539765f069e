//! Wire enums to wgpu types.

use alice_core::codec::VertexFormat;
use alice_core::formats::{ElementType, FilterMode, TextureFormat, VertexAttributeFormat};

use crate::backend::BackendError;

pub fn texture_format(format: TextureFormat) -> wgpu::TextureFormat {
    match format {
        TextureFormat::Rgba8Unorm => wgpu::TextureFormat::Rgba8Unorm,
        TextureFormat::Rgba8Snorm => wgpu::TextureFormat::Rgba8Snorm,
        TextureFormat::R8Unorm => wgpu::TextureFormat::R8Unorm,
        TextureFormat::R8Snorm => wgpu::TextureFormat::R8Snorm,
    }
}

pub fn filter_mode(filter: FilterMode) -> wgpu::FilterMode {
    match filter {
        FilterMode::Linear => wgpu::FilterMode::Linear,
        FilterMode::Nearest => wgpu::FilterMode::Nearest,
    }
}

/// `None` for formats the device has no vertex fetch for (three-wide u16).
pub fn vertex_format(format: VertexAttributeFormat) -> Option<wgpu::VertexFormat> {
    use wgpu::VertexFormat as V;
    let mapped = match (format.element, format.components) {
        (ElementType::Float32, 1) => V::Float32,
        (ElementType::Float32, 2) => V::Float32x2,
        (ElementType::Float32, 3) => V::Float32x3,
        (ElementType::Float32, 4) => V::Float32x4,
        (ElementType::Uint16, 1) => V::Uint16,
        (ElementType::Uint16, 2) => V::Uint16x2,
        (ElementType::Uint16, 4) => V::Uint16x4,
        (ElementType::Uint32, 1) => V::Uint32,
        (ElementType::Uint32, 2) => V::Uint32x2,
        (ElementType::Uint32, 3) => V::Uint32x3,
        (ElementType::Uint32, 4) => V::Uint32x4,
        _ => return None,
    };
    Some(mapped)
}

/// Attribute `i` of the descriptor binds to shader location `i`.
pub fn vertex_attributes(layout: &VertexFormat) -> Result<Vec<wgpu::VertexAttribute>, BackendError> {
    layout
        .attributes
        .iter()
        .enumerate()
        .map(|(location, attribute)| {
            let format = vertex_format(attribute.format).ok_or_else(|| {
                BackendError::Unsupported(format!(
                    "vertex attribute {location} uses {}, which the device cannot fetch",
                    attribute.format
                ))
            })?;
            Ok(wgpu::VertexAttribute {
                format,
                offset: attribute.offset as wgpu::BufferAddress,
                shader_location: location as u32,
            })
        })
        .collect()
}
