//! Frame State Record: written by the host once per frame at the address
//! the module registered, read by the module during `next_frame`.

use super::layout::{Field, FieldKind, RecordLayout};

pub const FRAME_STATE_SIZE: usize = 32;

pub const RESOLUTION_WIDTH: Field = Field::new("resolution.width", 0, FieldKind::U32);
pub const RESOLUTION_HEIGHT: Field = Field::new("resolution.height", 4, FieldKind::U32);
pub const FRAME_DELTA: Field = Field::new("frame_delta", 8, FieldKind::F32);
pub const POINTER_X: Field = Field::new("pointer.x", 12, FieldKind::U32);
pub const POINTER_Y: Field = Field::new("pointer.y", 16, FieldKind::U32);
pub const BUTTON_LEFT: Field = Field::new("pointer.button.left", 20, FieldKind::U32);
pub const BUTTON_RIGHT: Field = Field::new("pointer.button.right", 24, FieldKind::U32);
pub const BUTTON_MIDDLE: Field = Field::new("pointer.button.middle", 28, FieldKind::U32);

pub const FRAME_STATE_LAYOUT: RecordLayout = RecordLayout {
    name: "frame_state",
    size: FRAME_STATE_SIZE,
    fields: &[
        RESOLUTION_WIDTH,
        RESOLUTION_HEIGHT,
        FRAME_DELTA,
        POINTER_X,
        POINTER_Y,
        BUTTON_LEFT,
        BUTTON_RIGHT,
        BUTTON_MIDDLE,
    ],
};

const _: () = FRAME_STATE_LAYOUT.assert_packed();

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PointerButtons {
    pub left: bool,
    pub right: bool,
    pub middle: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameState {
    pub width: u32,
    pub height: u32,
    /// Seconds since the previous frame.
    pub frame_delta: f32,
    pub pointer_x: u32,
    pub pointer_y: u32,
    pub buttons: PointerButtons,
}

impl FrameState {
    pub fn encode(&self) -> [u8; FRAME_STATE_SIZE] {
        let mut record = [0u8; FRAME_STATE_SIZE];
        RESOLUTION_WIDTH.put_u32(&mut record, self.width);
        RESOLUTION_HEIGHT.put_u32(&mut record, self.height);
        FRAME_DELTA.put_f32(&mut record, self.frame_delta);
        POINTER_X.put_u32(&mut record, self.pointer_x);
        POINTER_Y.put_u32(&mut record, self.pointer_y);
        BUTTON_LEFT.put_u32(&mut record, self.buttons.left as u32);
        BUTTON_RIGHT.put_u32(&mut record, self.buttons.right as u32);
        BUTTON_MIDDLE.put_u32(&mut record, self.buttons.middle as u32);
        record
    }

    /// Any non-zero button word reads as pressed.
    pub fn decode(record: &[u8; FRAME_STATE_SIZE]) -> Self {
        Self {
            width: RESOLUTION_WIDTH.get_u32(record),
            height: RESOLUTION_HEIGHT.get_u32(record),
            frame_delta: FRAME_DELTA.get_f32(record),
            pointer_x: POINTER_X.get_u32(record),
            pointer_y: POINTER_Y.get_u32(record),
            buttons: PointerButtons {
                left: BUTTON_LEFT.get_u32(record) != 0,
                right: BUTTON_RIGHT.get_u32(record) != 0,
                middle: BUTTON_MIDDLE.get_u32(record) != 0,
            },
        }
    }
}
