use crate::error::ProtocolError;

/// Axis-aligned integer rectangle, `(x0, y0)` inclusive to `(x1, y1)` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl Rect {
    /// Rejects rectangles whose far corner lies before the near one.
    pub fn new(x0: u32, y0: u32, x1: u32, y1: u32) -> Result<Self, ProtocolError> {
        if x1 < x0 || y1 < y0 {
            return Err(ProtocolError::InvertedRect { x0, y0, x1, y1 });
        }
        Ok(Self { x0, y0, x1, y1 })
    }

    pub fn from_size(width: u32, height: u32) -> Self {
        Self {
            x0: 0,
            y0: 0,
            x1: width,
            y1: height,
        }
    }

    pub fn width(&self) -> u32 {
        self.x1.saturating_sub(self.x0)
    }

    pub fn height(&self) -> u32 {
        self.y1.saturating_sub(self.y0)
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Number of pixels covered.
    pub fn area(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    /// True when the rectangle lies inside a `width` x `height` surface.
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.x1 <= width && self.y1 <= height
    }

    /// Intersect with a `width` x `height` surface anchored at the origin.
    pub fn clamp_to(&self, width: u32, height: u32) -> Rect {
        let x1 = self.x1.min(width);
        let y1 = self.y1.min(height);
        Rect {
            x0: self.x0.min(x1),
            y0: self.y0.min(y1),
            x1,
            y1,
        }
    }
}
