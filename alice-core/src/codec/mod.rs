//! Fixed-layout binary records exchanged with the module.
//!
//! All multi-byte values are little-endian. There is no version field on the
//! wire; both sides are built against these exact layouts.

pub mod draw_command;
pub mod frame_state;
pub mod layout;
pub mod vertex_format;

pub use draw_command::{DRAW_COMMAND_LAYOUT, DRAW_COMMAND_SIZE, DrawCommand};
pub use frame_state::{FRAME_STATE_LAYOUT, FRAME_STATE_SIZE, FrameState, PointerButtons};
pub use layout::{Field, FieldKind, RecordLayout};
pub use vertex_format::{MAX_VERTEX_ATTRIBUTES, VERTEX_ALIGNMENT, VertexAttribute, VertexFormat};
