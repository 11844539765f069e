//! Draw Command Record: 17 little-endian `u32` words, one record per draw.

use super::layout::{Field, FieldKind, RecordLayout};
use crate::error::ProtocolError;
use crate::handles::Handle;
use crate::rect::Rect;

pub const DRAW_COMMAND_SIZE: usize = 17 * 4;

pub const CONSTANT_BUFFER: Field = Field::new("constant_buffer", 0, FieldKind::U32);
pub const VERTEX_BUFFER: Field = Field::new("vertex_buffer", 4, FieldKind::U32);
pub const INDEX_BUFFER: Field = Field::new("index_buffer", 8, FieldKind::U32);
pub const PIPELINE: Field = Field::new("pipeline", 12, FieldKind::U32);
pub const TEXTURE: Field = Field::new("texture", 16, FieldKind::U32);
pub const SAMPLER: Field = Field::new("sampler", 20, FieldKind::U32);
pub const INDEX_COUNT: Field = Field::new("index_count", 24, FieldKind::U32);
pub const INDEX_OFFSET: Field = Field::new("index_offset", 28, FieldKind::U32);
pub const DEPTH_TEST: Field = Field::new("depth_test", 32, FieldKind::U32);
pub const VIEWPORT_X0: Field = Field::new("viewport.x0", 36, FieldKind::U32);
pub const VIEWPORT_Y0: Field = Field::new("viewport.y0", 40, FieldKind::U32);
pub const VIEWPORT_X1: Field = Field::new("viewport.x1", 44, FieldKind::U32);
pub const VIEWPORT_Y1: Field = Field::new("viewport.y1", 48, FieldKind::U32);
pub const CLIP_X0: Field = Field::new("clip.x0", 52, FieldKind::U32);
pub const CLIP_Y0: Field = Field::new("clip.y0", 56, FieldKind::U32);
pub const CLIP_X1: Field = Field::new("clip.x1", 60, FieldKind::U32);
pub const CLIP_Y1: Field = Field::new("clip.y1", 64, FieldKind::U32);

pub const DRAW_COMMAND_LAYOUT: RecordLayout = RecordLayout {
    name: "draw_command",
    size: DRAW_COMMAND_SIZE,
    fields: &[
        CONSTANT_BUFFER,
        VERTEX_BUFFER,
        INDEX_BUFFER,
        PIPELINE,
        TEXTURE,
        SAMPLER,
        INDEX_COUNT,
        INDEX_OFFSET,
        DEPTH_TEST,
        VIEWPORT_X0,
        VIEWPORT_Y0,
        VIEWPORT_X1,
        VIEWPORT_Y1,
        CLIP_X0,
        CLIP_Y0,
        CLIP_X1,
        CLIP_Y1,
    ],
};

const _: () = DRAW_COMMAND_LAYOUT.assert_packed();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawCommand {
    pub constant_buffer: Handle,
    pub vertex_buffer: Handle,
    pub index_buffer: Handle,
    pub pipeline: Handle,
    pub texture: Handle,
    pub sampler: Handle,
    pub index_count: u32,
    /// First index read from the index buffer.
    pub index_offset: u32,
    pub depth_test: bool,
    pub viewport: Rect,
    pub clip: Rect,
}

impl DrawCommand {
    pub fn decode(record: &[u8; DRAW_COMMAND_SIZE]) -> Result<Self, ProtocolError> {
        let handle = |field: Field| Handle::from_raw(field.get_u32(record));
        let rect = |x0: Field, y0: Field, x1: Field, y1: Field| {
            Rect::new(
                x0.get_u32(record),
                y0.get_u32(record),
                x1.get_u32(record),
                y1.get_u32(record),
            )
        };

        Ok(Self {
            constant_buffer: handle(CONSTANT_BUFFER),
            vertex_buffer: handle(VERTEX_BUFFER),
            index_buffer: handle(INDEX_BUFFER),
            pipeline: handle(PIPELINE),
            texture: handle(TEXTURE),
            sampler: handle(SAMPLER),
            index_count: INDEX_COUNT.get_u32(record),
            index_offset: INDEX_OFFSET.get_u32(record),
            depth_test: DEPTH_TEST.get_u32(record) != 0,
            viewport: rect(VIEWPORT_X0, VIEWPORT_Y0, VIEWPORT_X1, VIEWPORT_Y1)?,
            clip: rect(CLIP_X0, CLIP_Y0, CLIP_X1, CLIP_Y1)?,
        })
    }

    pub fn encode(&self) -> [u8; DRAW_COMMAND_SIZE] {
        let mut record = [0u8; DRAW_COMMAND_SIZE];
        let r = &mut record;
        CONSTANT_BUFFER.put_u32(r, self.constant_buffer.raw());
        VERTEX_BUFFER.put_u32(r, self.vertex_buffer.raw());
        INDEX_BUFFER.put_u32(r, self.index_buffer.raw());
        PIPELINE.put_u32(r, self.pipeline.raw());
        TEXTURE.put_u32(r, self.texture.raw());
        SAMPLER.put_u32(r, self.sampler.raw());
        INDEX_COUNT.put_u32(r, self.index_count);
        INDEX_OFFSET.put_u32(r, self.index_offset);
        DEPTH_TEST.put_u32(r, self.depth_test as u32);
        VIEWPORT_X0.put_u32(r, self.viewport.x0);
        VIEWPORT_Y0.put_u32(r, self.viewport.y0);
        VIEWPORT_X1.put_u32(r, self.viewport.x1);
        VIEWPORT_Y1.put_u32(r, self.viewport.y1);
        CLIP_X0.put_u32(r, self.clip.x0);
        CLIP_Y0.put_u32(r, self.clip.y0);
        CLIP_X1.put_u32(r, self.clip.x1);
        CLIP_Y1.put_u32(r, self.clip.y1);
        record
    }
}
