// alice-core/tests/mod.rs
//
// Integration tests for the trust-boundary layer:
//   LinearMemory : bounds enforcement at the exact edge, overflow
//   HandleTable  : uniqueness, no resurrection, kind checks
//   codec        : frame state, vertex format, draw command records
//   formats      : wire enum tables
//   Rect         : validation and clamping

use alice_core::codec::{
    DRAW_COMMAND_LAYOUT, DRAW_COMMAND_SIZE, DrawCommand, FRAME_STATE_LAYOUT, FRAME_STATE_SIZE,
    FrameState, MAX_VERTEX_ATTRIBUTES, PointerButtons, VertexAttribute, VertexFormat,
};
use alice_core::formats::{ElementType, FilterMode, TextureFormat, VertexAttributeFormat};
use alice_core::{
    BridgeError, Handle, HandleTable, LinearMemory, ProtocolError, Rect, ResourceKind, Tagged,
};

// ════════════════════════════════════════════════════════════════════
// Helpers
// ════════════════════════════════════════════════════════════════════

#[derive(Debug, PartialEq)]
struct Obj(ResourceKind, u32);

impl Tagged for Obj {
    fn kind(&self) -> ResourceKind {
        self.0
    }
}

fn le_u16s(values: &[u16]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

// ════════════════════════════════════════════════════════════════════
// LinearMemory
// ════════════════════════════════════════════════════════════════════

#[test]
fn test_memory_read_ending_exactly_at_size_succeeds() {
    let mut bytes = vec![7u8; 64];
    let mem = LinearMemory::new(&mut bytes);
    assert_eq!(mem.read(60, 4).unwrap(), &[7, 7, 7, 7]);
    assert_eq!(mem.read(0, 64).unwrap().len(), 64);
    assert!(mem.read(64, 0).unwrap().is_empty());
}

#[test]
fn test_memory_read_one_past_size_fails() {
    let mut bytes = vec![0u8; 64];
    let mem = LinearMemory::new(&mut bytes);
    let err = mem.read(61, 4).unwrap_err();
    assert_eq!(
        err,
        BridgeError::OutOfBounds {
            offset: 61,
            len: 4,
            size: 64
        }
    );
    assert!(err.is_fatal());
    assert!(mem.read(0, 65).is_err());
    assert!(mem.read(65, 0).is_err());
}

#[test]
fn test_memory_write_boundaries() {
    let mut bytes = vec![0u8; 16];
    let mut mem = LinearMemory::new(&mut bytes);
    mem.write(12, &[1, 2, 3, 4]).unwrap();
    assert!(matches!(
        mem.write(13, &[1, 2, 3, 4]),
        Err(BridgeError::OutOfBounds { .. })
    ));
    assert_eq!(&bytes[12..], &[1, 2, 3, 4]);
}

#[test]
fn test_memory_offset_overflow_is_out_of_bounds() {
    let mut bytes = vec![0u8; 16];
    let mem = LinearMemory::new(&mut bytes);
    assert!(matches!(
        mem.read(u64::MAX, 2),
        Err(BridgeError::OutOfBounds { .. })
    ));
    assert!(matches!(
        mem.read(8, u64::MAX),
        Err(BridgeError::OutOfBounds { .. })
    ));
}

#[test]
fn test_memory_failed_write_leaves_bytes_untouched() {
    let mut bytes = vec![9u8; 8];
    {
        let mut mem = LinearMemory::new(&mut bytes);
        assert!(mem.write(6, &[0, 0, 0]).is_err());
    }
    assert_eq!(bytes, vec![9u8; 8]);
}

#[test]
fn test_memory_read_array() {
    let mut bytes: Vec<u8> = (0..32).collect();
    let mem = LinearMemory::new(&mut bytes);
    let arr: [u8; 4] = mem.read_array(28).unwrap();
    assert_eq!(arr, [28, 29, 30, 31]);
    assert!(mem.read_array::<4>(29).is_err());
}

#[test]
fn test_memory_debug_shows_size_only() {
    let mut bytes = vec![0u8; 10];
    let mem = LinearMemory::new(&mut bytes);
    let debug = format!("{:?}", mem);
    assert!(debug.contains("LinearMemory"));
    assert!(debug.contains("10"));
}

// ════════════════════════════════════════════════════════════════════
// HandleTable
// ════════════════════════════════════════════════════════════════════

#[test]
fn test_handles_are_unique_and_non_zero() {
    let kinds = [
        ResourceKind::Buffer,
        ResourceKind::Texture,
        ResourceKind::Sampler,
        ResourceKind::Shader,
        ResourceKind::Pipeline,
    ];
    let mut table = HandleTable::new();
    let mut seen = std::collections::HashSet::new();
    for i in 0..1000u32 {
        let h = table.allocate(Obj(kinds[i as usize % kinds.len()], i)).unwrap();
        assert!(!h.is_null());
        assert!(seen.insert(h), "handle {h} issued twice");
    }
    assert_eq!(table.len(), 1000);
}

#[test]
fn test_handles_start_at_one_and_increase() {
    let mut table = HandleTable::new();
    let a = table.allocate(Obj(ResourceKind::Buffer, 0)).unwrap();
    let b = table.allocate(Obj(ResourceKind::Texture, 0)).unwrap();
    assert_eq!(a.raw(), 1);
    assert_eq!(b.raw(), 2);
}

#[test]
fn test_released_handle_is_never_resurrected() {
    let mut table = HandleTable::new();
    let h = table.allocate(Obj(ResourceKind::Buffer, 1)).unwrap();
    assert_eq!(table.release(h).unwrap(), Obj(ResourceKind::Buffer, 1));
    assert_eq!(table.lookup(h).unwrap_err(), BridgeError::NotFound(h));

    for i in 0..100 {
        let fresh = table.allocate(Obj(ResourceKind::Buffer, i)).unwrap();
        assert_ne!(fresh, h);
        assert!(fresh.raw() > h.raw());
    }
    assert!(table.lookup(h).is_err());
}

#[test]
fn test_double_release_reports_not_found() {
    let mut table = HandleTable::new();
    let h = table.allocate(Obj(ResourceKind::Sampler, 0)).unwrap();
    assert!(table.release(h).is_ok());
    let err = table.release(h).unwrap_err();
    assert_eq!(err, BridgeError::NotFound(h));
    assert!(!err.is_fatal());
}

#[test]
fn test_null_handle_never_resolves() {
    let mut table = HandleTable::new();
    table.allocate(Obj(ResourceKind::Buffer, 0)).unwrap();
    assert_eq!(
        table.lookup(Handle::NULL).unwrap_err(),
        BridgeError::NotFound(Handle::NULL)
    );
}

#[test]
fn test_lookup_as_rejects_wrong_kind() {
    let mut table = HandleTable::new();
    let h = table.allocate(Obj(ResourceKind::Pipeline, 5)).unwrap();
    let err = table.lookup_as(h, ResourceKind::Texture).unwrap_err();
    assert_eq!(
        err,
        BridgeError::KindMismatch {
            handle: h,
            expected: ResourceKind::Texture,
            actual: ResourceKind::Pipeline
        }
    );
    assert!(!err.is_fatal());
    assert_eq!(table.lookup_as(h, ResourceKind::Pipeline).unwrap().1, 5);
}

#[test]
fn test_release_as_wrong_kind_keeps_entry() {
    let mut table = HandleTable::new();
    let h = table.allocate(Obj(ResourceKind::Texture, 0)).unwrap();
    assert!(table.release_as(h, ResourceKind::Buffer).is_err());
    assert!(table.contains(h));
    assert!(table.release_as(h, ResourceKind::Texture).is_ok());
    assert!(table.is_empty());
}

#[test]
fn test_count_by_kind() {
    let mut table = HandleTable::new();
    table.allocate(Obj(ResourceKind::Buffer, 0)).unwrap();
    table.allocate(Obj(ResourceKind::Buffer, 1)).unwrap();
    table.allocate(Obj(ResourceKind::Shader, 2)).unwrap();
    assert_eq!(table.count(ResourceKind::Buffer), 2);
    assert_eq!(table.count(ResourceKind::Shader), 1);
    assert_eq!(table.count(ResourceKind::Pipeline), 0);
}

// ════════════════════════════════════════════════════════════════════
// Frame State Record
// ════════════════════════════════════════════════════════════════════

#[test]
fn test_frame_state_round_trip() {
    let states = [
        FrameState::default(),
        FrameState {
            width: 1920,
            height: 1080,
            frame_delta: 1.0 / 60.0,
            pointer_x: 640,
            pointer_y: 360,
            buttons: PointerButtons {
                left: true,
                right: false,
                middle: true,
            },
        },
        FrameState {
            width: u32::MAX,
            height: 1,
            frame_delta: f32::MAX,
            pointer_x: u32::MAX,
            pointer_y: 0,
            buttons: PointerButtons {
                left: false,
                right: true,
                middle: false,
            },
        },
    ];
    for state in states {
        let record = state.encode();
        assert_eq!(FrameState::decode(&record), state);
    }
}

#[test]
fn test_frame_state_byte_layout_is_little_endian() {
    let state = FrameState {
        width: 0x0403_0201,
        height: 2,
        frame_delta: 0.5,
        pointer_x: 3,
        pointer_y: 4,
        buttons: PointerButtons {
            left: true,
            right: true,
            middle: false,
        },
    };
    let record = state.encode();
    assert_eq!(record.len(), FRAME_STATE_SIZE);
    assert_eq!(&record[0..4], &[1, 2, 3, 4]);
    assert_eq!(&record[4..8], &2u32.to_le_bytes());
    assert_eq!(&record[8..12], &0.5f32.to_le_bytes());
    assert_eq!(&record[20..24], &1u32.to_le_bytes());
    assert_eq!(&record[24..28], &1u32.to_le_bytes());
    assert_eq!(&record[28..32], &0u32.to_le_bytes());
}

#[test]
fn test_frame_state_nonzero_button_word_reads_pressed() {
    let mut record = [0u8; FRAME_STATE_SIZE];
    record[20..24].copy_from_slice(&7u32.to_le_bytes());
    assert!(FrameState::decode(&record).buttons.left);
}

#[test]
fn test_frame_state_layout_table() {
    assert_eq!(FRAME_STATE_LAYOUT.size, 32);
    assert_eq!(FRAME_STATE_LAYOUT.fields.len(), 8);
    assert_eq!(FRAME_STATE_LAYOUT.field("frame_delta").unwrap().offset, 8);
    assert!(FRAME_STATE_LAYOUT.field("nope").is_none());
}

// ════════════════════════════════════════════════════════════════════
// Vertex Format Descriptor
// ════════════════════════════════════════════════════════════════════

#[test]
fn test_vertex_format_decode() {
    // stride 20, 3 attributes: float32x2 @0, float32x2 @8, uint32 @16
    let mut bytes = vec![0u8; 8];
    bytes.extend(le_u16s(&[20, 3, 0, 1, 8, 1, 16, 8]));
    bytes.extend([0u8; 8]);
    let mem = LinearMemory::new(&mut bytes);

    let format = VertexFormat::decode(&mem, 8).unwrap();
    assert_eq!(format.stride, 20);
    assert_eq!(format.attributes.len(), 3);
    assert_eq!(format.attributes[1].offset, 8);
    assert_eq!(format.attributes[1].format.to_string(), "float32x2");
    assert_eq!(format.attributes[2].format.to_string(), "uint32");
    assert!(format.attribute_outside_stride().is_none());
}

#[test]
fn test_vertex_format_encode_matches_wire_bytes() {
    let format = VertexFormat {
        stride: 12,
        attributes: vec![
            VertexAttribute {
                offset: 0,
                format: VertexAttributeFormat::from_wire(1).unwrap(),
            },
            VertexAttribute {
                offset: 8,
                format: VertexAttributeFormat::from_wire(8).unwrap(),
            },
        ],
    };
    assert_eq!(format.encode(), le_u16s(&[12, 2, 0, 1, 8, 8]));
}

#[test]
fn test_vertex_format_rejects_too_many_attributes() {
    let mut bytes = le_u16s(&[4, MAX_VERTEX_ATTRIBUTES + 1]);
    bytes.resize(256, 0);
    let mem = LinearMemory::new(&mut bytes);
    let err = VertexFormat::decode(&mem, 0).unwrap_err();
    assert_eq!(
        err,
        BridgeError::Protocol(ProtocolError::TooManyAttributes {
            count: 17,
            max: 16
        })
    );
    assert!(err.is_fatal());
}

#[test]
fn test_vertex_format_accepts_maximum_attribute_count() {
    let mut words = vec![64, MAX_VERTEX_ATTRIBUTES];
    for i in 0..MAX_VERTEX_ATTRIBUTES {
        words.extend([i * 4, 0]);
    }
    let mut bytes = le_u16s(&words);
    let mem = LinearMemory::new(&mut bytes);
    assert_eq!(VertexFormat::decode(&mem, 0).unwrap().attributes.len(), 16);
}

#[test]
fn test_vertex_format_rejects_unknown_format_enum() {
    let mut bytes = le_u16s(&[8, 1, 0, 12]);
    let mem = LinearMemory::new(&mut bytes);
    assert_eq!(
        VertexFormat::decode(&mem, 0).unwrap_err(),
        BridgeError::Protocol(ProtocolError::UnknownVertexFormat(12))
    );
}

#[test]
fn test_vertex_format_attribute_list_past_memory_end() {
    let mut bytes = le_u16s(&[8, 2, 0, 0]);
    let mem = LinearMemory::new(&mut bytes);
    assert!(matches!(
        VertexFormat::decode(&mem, 0),
        Err(BridgeError::OutOfBounds { .. })
    ));
}

#[test]
fn test_vertex_format_attribute_outside_stride() {
    let mut bytes = le_u16s(&[8, 1, 4, 1]); // float32x2 at 4 needs 12 bytes
    let mem = LinearMemory::new(&mut bytes);
    let format = VertexFormat::decode(&mem, 0).unwrap();
    let (index, _) = format.attribute_outside_stride().unwrap();
    assert_eq!(index, 0);
}

#[test]
fn test_vertex_format_misaligned_attribute() {
    // float32x2 at 2, uint16 at 6
    let mut bytes = le_u16s(&[24, 2, 2, 1, 6, 4]);
    let mem = LinearMemory::new(&mut bytes);
    let format = VertexFormat::decode(&mem, 0).unwrap();
    let (index, attribute) = format.misaligned_attribute().unwrap();
    assert_eq!((index, attribute.offset), (0, 2));

    // two-byte elements only need two-byte offsets
    let mut bytes = le_u16s(&[8, 2, 0, 4, 6, 4]);
    let mem = LinearMemory::new(&mut bytes);
    assert!(VertexFormat::decode(&mem, 0).unwrap().misaligned_attribute().is_none());
}

// ════════════════════════════════════════════════════════════════════
// Draw Command Record
// ════════════════════════════════════════════════════════════════════

fn sample_draw() -> DrawCommand {
    DrawCommand {
        constant_buffer: Handle::from_raw(1),
        vertex_buffer: Handle::from_raw(2),
        index_buffer: Handle::from_raw(3),
        pipeline: Handle::from_raw(4),
        texture: Handle::from_raw(5),
        sampler: Handle::from_raw(6),
        index_count: 6,
        index_offset: 12,
        depth_test: true,
        viewport: Rect::new(0, 0, 800, 600).unwrap(),
        clip: Rect::new(10, 20, 30, 40).unwrap(),
    }
}

#[test]
fn test_draw_command_field_order_on_the_wire() {
    let record = sample_draw().encode();
    let words: Vec<u32> = record
        .chunks_exact(4)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();
    assert_eq!(
        words,
        vec![1, 2, 3, 4, 5, 6, 6, 12, 1, 0, 0, 800, 600, 10, 20, 30, 40]
    );
}

#[test]
fn test_draw_command_decode() {
    let record = sample_draw().encode();
    assert_eq!(DrawCommand::decode(&record).unwrap(), sample_draw());
}

#[test]
fn test_draw_command_inverted_clip_is_protocol_error() {
    let mut record = sample_draw().encode();
    // clip.x1 (offset 60) below clip.x0
    record[60..64].copy_from_slice(&5u32.to_le_bytes());
    assert_eq!(
        DrawCommand::decode(&record).unwrap_err(),
        ProtocolError::InvertedRect {
            x0: 10,
            y0: 20,
            x1: 5,
            y1: 40
        }
    );
}

#[test]
fn test_draw_command_layout_size() {
    assert_eq!(DRAW_COMMAND_SIZE, 68);
    assert_eq!(DRAW_COMMAND_LAYOUT.fields.len(), 17);
    assert_eq!(DRAW_COMMAND_LAYOUT.field("clip.y1").unwrap().offset, 64);
}

// ════════════════════════════════════════════════════════════════════
// Format tables
// ════════════════════════════════════════════════════════════════════

#[test]
fn test_texture_format_table() {
    assert_eq!(TextureFormat::from_wire(0).unwrap().name(), "rgba8unorm");
    assert_eq!(TextureFormat::from_wire(1).unwrap().bytes_per_pixel(), 4);
    assert_eq!(TextureFormat::from_wire(2).unwrap().name(), "r8unorm");
    assert_eq!(TextureFormat::from_wire(3).unwrap().bytes_per_pixel(), 1);
    assert_eq!(
        TextureFormat::from_wire(4).unwrap_err(),
        ProtocolError::UnknownTextureFormat(4)
    );
    for format in TextureFormat::ALL {
        assert_eq!(TextureFormat::from_wire(format.to_wire()).unwrap(), format);
    }
}

#[test]
fn test_vertex_attribute_format_table() {
    let f = VertexAttributeFormat::from_wire(6).unwrap();
    assert_eq!(f.components, 3);
    assert_eq!(f.element, ElementType::Uint16);
    assert_eq!(f.size_bytes(), 6);
    assert_eq!(VertexAttributeFormat::from_wire(3).unwrap().to_string(), "float32x4");
    assert_eq!(VertexAttributeFormat::from_wire(11).unwrap().size_bytes(), 16);
    assert!(VertexAttributeFormat::from_wire(u16::MAX).is_err());
}

#[test]
fn test_filter_mode_table() {
    assert_eq!(FilterMode::from_wire(0).unwrap(), FilterMode::Linear);
    assert_eq!(FilterMode::from_wire(1).unwrap(), FilterMode::Nearest);
    assert!(FilterMode::from_wire(2).is_err());
}

// ════════════════════════════════════════════════════════════════════
// Rect
// ════════════════════════════════════════════════════════════════════

#[test]
fn test_rect_dimensions() {
    let r = Rect::new(10, 20, 110, 70).unwrap();
    assert_eq!(r.width(), 100);
    assert_eq!(r.height(), 50);
    assert_eq!(r.area(), 5000);
    assert!(!r.is_empty());
    assert!(Rect::new(5, 5, 5, 9).unwrap().is_empty());
}

#[test]
fn test_rect_clamp_to_surface() {
    let r = Rect::new(700, 500, 900, 700).unwrap();
    assert_eq!(r.clamp_to(800, 600), Rect::new(700, 500, 800, 600).unwrap());
    assert!(r.fits_within(900, 700));
    assert!(!r.fits_within(800, 600));

    let outside = Rect::new(900, 0, 1000, 10).unwrap().clamp_to(800, 600);
    assert!(outside.is_empty());
}

// ════════════════════════════════════════════════════════════════════
// Error classification
// ════════════════════════════════════════════════════════════════════

#[test]
fn test_error_fatality() {
    assert!(!BridgeError::NotFound(Handle::from_raw(3)).is_fatal());
    assert!(!BridgeError::rejected(ResourceKind::Shader, "bad wgsl").is_fatal());
    assert!(BridgeError::Protocol(ProtocolError::NoOpenFrame).is_fatal());
    assert!(BridgeError::GuestPanic("boom".into()).is_fatal());
    assert!(BridgeError::Unavailable("no adapter".into()).is_fatal());
    assert!(BridgeError::FrameBudgetExceeded.is_fatal());
}

#[test]
fn test_error_messages() {
    let err = BridgeError::Protocol(ProtocolError::FormatMismatch {
        download: TextureFormat::R8Unorm,
        texture: TextureFormat::Rgba8Unorm,
    });
    let msg = err.to_string();
    assert!(msg.contains("r8unorm"));
    assert!(msg.contains("1 B/px"));
    assert!(msg.contains("4 B/px"));
    assert_eq!(
        BridgeError::NotFound(Handle::from_raw(9)).to_string(),
        "handle #9 not found"
    );
}
