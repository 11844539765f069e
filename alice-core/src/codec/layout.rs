//! Record schema tables.
//!
//! Every wire record is declared once as a list of [`Field`]s. Encoders and
//! decoders only ever go through a `Field`, so an offset cannot change on
//! one side without the other. `RecordLayout::assert_packed` runs at compile
//! time for each layout and rejects gaps, overlaps and size drift.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    U16,
    U32,
    F32,
}

impl FieldKind {
    pub const fn width(self) -> usize {
        match self {
            FieldKind::U16 => 2,
            FieldKind::U32 | FieldKind::F32 => 4,
        }
    }
}

/// One little-endian field at a fixed offset inside a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub offset: usize,
    pub kind: FieldKind,
}

impl Field {
    pub const fn new(name: &'static str, offset: usize, kind: FieldKind) -> Self {
        Self { name, offset, kind }
    }

    pub const fn end(&self) -> usize {
        self.offset + self.kind.width()
    }

    fn bytes<const N: usize>(&self, record: &[u8]) -> [u8; N] {
        debug_assert_eq!(self.kind.width(), N, "field {} read with wrong width", self.name);
        let mut out = [0u8; N];
        out.copy_from_slice(&record[self.offset..self.offset + N]);
        out
    }

    fn put<const N: usize>(&self, record: &mut [u8], bytes: [u8; N]) {
        debug_assert_eq!(self.kind.width(), N, "field {} written with wrong width", self.name);
        record[self.offset..self.offset + N].copy_from_slice(&bytes);
    }

    pub fn get_u16(&self, record: &[u8]) -> u16 {
        u16::from_le_bytes(self.bytes(record))
    }

    pub fn get_u32(&self, record: &[u8]) -> u32 {
        u32::from_le_bytes(self.bytes(record))
    }

    pub fn get_f32(&self, record: &[u8]) -> f32 {
        f32::from_le_bytes(self.bytes(record))
    }

    pub fn put_u16(&self, record: &mut [u8], value: u16) {
        self.put(record, value.to_le_bytes());
    }

    pub fn put_u32(&self, record: &mut [u8], value: u32) {
        self.put(record, value.to_le_bytes());
    }

    pub fn put_f32(&self, record: &mut [u8], value: f32) {
        self.put(record, value.to_le_bytes());
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RecordLayout {
    pub name: &'static str,
    pub size: usize,
    pub fields: &'static [Field],
}

impl RecordLayout {
    /// Panics (at compile time when used in a `const`) unless the fields are
    /// contiguous, start at 0, and end exactly at `size`.
    pub const fn assert_packed(&self) {
        let mut cursor = 0;
        let mut i = 0;
        while i < self.fields.len() {
            let field = &self.fields[i];
            if field.offset != cursor {
                panic!("record field is not packed against its predecessor");
            }
            cursor = field.end();
            i += 1;
        }
        if cursor != self.size {
            panic!("record fields do not add up to the declared size");
        }
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}
