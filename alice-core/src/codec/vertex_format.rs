//! Vertex Format Descriptor: a 4-byte header followed by `attribute_count`
//! 4-byte attribute entries. Consumed once by pipeline creation.

use super::layout::{Field, FieldKind, RecordLayout};
use crate::error::{BridgeError, ProtocolError};
use crate::formats::VertexAttributeFormat;
use crate::memory::LinearMemory;

pub const MAX_VERTEX_ATTRIBUTES: u16 = 16;

/// Strides and wide attribute offsets must be multiples of this.
pub const VERTEX_ALIGNMENT: u16 = 4;

pub const VERTEX_FORMAT_HEADER_SIZE: usize = 4;
pub const VERTEX_ATTRIBUTE_SIZE: usize = 4;

pub const STRIDE: Field = Field::new("stride", 0, FieldKind::U16);
pub const ATTRIBUTE_COUNT: Field = Field::new("attribute_count", 2, FieldKind::U16);

pub const ATTRIBUTE_OFFSET: Field = Field::new("attribute.offset", 0, FieldKind::U16);
pub const ATTRIBUTE_FORMAT: Field = Field::new("attribute.format", 2, FieldKind::U16);

pub const VERTEX_FORMAT_HEADER_LAYOUT: RecordLayout = RecordLayout {
    name: "vertex_format.header",
    size: VERTEX_FORMAT_HEADER_SIZE,
    fields: &[STRIDE, ATTRIBUTE_COUNT],
};

pub const VERTEX_ATTRIBUTE_LAYOUT: RecordLayout = RecordLayout {
    name: "vertex_format.attribute",
    size: VERTEX_ATTRIBUTE_SIZE,
    fields: &[ATTRIBUTE_OFFSET, ATTRIBUTE_FORMAT],
};

const _: () = VERTEX_FORMAT_HEADER_LAYOUT.assert_packed();
const _: () = VERTEX_ATTRIBUTE_LAYOUT.assert_packed();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    pub offset: u16,
    pub format: VertexAttributeFormat,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexFormat {
    pub stride: u16,
    pub attributes: Vec<VertexAttribute>,
}

impl VertexFormat {
    /// Decode a descriptor starting at `ptr` in module memory.
    ///
    /// The attribute count is checked against [`MAX_VERTEX_ATTRIBUTES`]
    /// before any attribute bytes are read.
    pub fn decode(memory: &LinearMemory<'_>, ptr: u64) -> Result<Self, BridgeError> {
        let header: [u8; VERTEX_FORMAT_HEADER_SIZE] = memory.read_array(ptr)?;
        let stride = STRIDE.get_u16(&header);
        let count = ATTRIBUTE_COUNT.get_u16(&header);

        if count > MAX_VERTEX_ATTRIBUTES {
            return Err(ProtocolError::TooManyAttributes {
                count,
                max: MAX_VERTEX_ATTRIBUTES,
            }
            .into());
        }

        let list_ptr = ptr + VERTEX_FORMAT_HEADER_SIZE as u64;
        let list = memory.read(list_ptr, count as u64 * VERTEX_ATTRIBUTE_SIZE as u64)?;

        let attributes = list
            .chunks_exact(VERTEX_ATTRIBUTE_SIZE)
            .map(|entry| {
                Ok(VertexAttribute {
                    offset: ATTRIBUTE_OFFSET.get_u16(entry),
                    format: VertexAttributeFormat::from_wire(ATTRIBUTE_FORMAT.get_u16(entry))?,
                })
            })
            .collect::<Result<Vec<_>, ProtocolError>>()?;

        Ok(Self { stride, attributes })
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = vec![0u8; self.encoded_len()];
        let (header, list) = out.split_at_mut(VERTEX_FORMAT_HEADER_SIZE);
        STRIDE.put_u16(header, self.stride);
        ATTRIBUTE_COUNT.put_u16(header, self.attributes.len() as u16);

        for (entry, attribute) in list
            .chunks_exact_mut(VERTEX_ATTRIBUTE_SIZE)
            .zip(&self.attributes)
        {
            ATTRIBUTE_OFFSET.put_u16(entry, attribute.offset);
            ATTRIBUTE_FORMAT.put_u16(entry, attribute.format.to_wire());
        }
        out
    }

    pub fn encoded_len(&self) -> usize {
        VERTEX_FORMAT_HEADER_SIZE + self.attributes.len() * VERTEX_ATTRIBUTE_SIZE
    }

    /// First attribute whose bytes run past the stride, if any.
    pub fn attribute_outside_stride(&self) -> Option<(usize, &VertexAttribute)> {
        self.attributes
            .iter()
            .enumerate()
            .find(|(_, a)| a.offset as u32 + a.format.size_bytes() > self.stride as u32)
    }

    /// First attribute whose offset is not a multiple of `min(4, size)`.
    pub fn misaligned_attribute(&self) -> Option<(usize, &VertexAttribute)> {
        self.attributes.iter().enumerate().find(|(_, a)| {
            let align = a.format.size_bytes().min(VERTEX_ALIGNMENT as u32);
            a.offset as u32 % align != 0
        })
    }
}
