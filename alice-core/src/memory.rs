//! Bounds-checked view over the module's linear memory.
//!
//! A view is built from the engine's current memory slice for each host call
//! and dropped when the call returns. The module's allocator may grow memory
//! between calls, so nothing about the size outlives the view.

use std::ops::Range;

use crate::error::BridgeError;

pub struct LinearMemory<'a> {
    bytes: &'a mut [u8],
}

impl<'a> LinearMemory<'a> {
    pub fn new(bytes: &'a mut [u8]) -> Self {
        Self { bytes }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Resolve `[offset, offset + len)` against the current size.
    fn range(&self, offset: u64, len: u64) -> Result<Range<usize>, BridgeError> {
        let size = self.size();
        let out_of_bounds = BridgeError::OutOfBounds { offset, len, size };

        let end = match offset.checked_add(len) {
            Some(end) if end <= size => end,
            _ => return Err(out_of_bounds),
        };

        // `end <= size` and size came from a slice length, so both fit.
        let start = usize::try_from(offset).map_err(|_| out_of_bounds.clone())?;
        let end = usize::try_from(end).map_err(|_| out_of_bounds)?;
        Ok(start..end)
    }

    pub fn read(&self, offset: u64, len: u64) -> Result<&[u8], BridgeError> {
        let range = self.range(offset, len)?;
        Ok(&self.bytes[range])
    }

    /// Read a fixed-size record.
    pub fn read_array<const N: usize>(&self, offset: u64) -> Result<[u8; N], BridgeError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read(offset, N as u64)?);
        Ok(out)
    }

    pub fn write(&mut self, offset: u64, data: &[u8]) -> Result<(), BridgeError> {
        let range = self.range(offset, data.len() as u64)?;
        self.bytes[range].copy_from_slice(data);
        Ok(())
    }
}

impl std::fmt::Debug for LinearMemory<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinearMemory")
            .field("size", &self.bytes.len())
            .finish()
    }
}
