use crate::backend::GpuBackend;

/// Per-frame draw accounting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub index: u64,
    pub draws_issued: u32,
    /// Draws dropped because a handle was missing or of the wrong kind.
    pub draws_skipped: u32,
    /// Draws whose viewport or clip was empty after clamping to the target.
    pub draws_culled: u32,
}

/// Token proving a command stream and render pass are open.
///
/// Only [`crate::Bridge::begin_frame`] creates one, and draws require it,
/// so a draw outside a frame cannot reach the backend.
pub struct OpenFrame<B: GpuBackend> {
    pub(crate) target: B::Frame,
    pub(crate) extent: (u32, u32),
    pub(crate) stats: FrameStats,
}

impl<B: GpuBackend> OpenFrame<B> {
    pub fn index(&self) -> u64 {
        self.stats.index
    }

    /// Render target size this frame was opened against.
    pub fn extent(&self) -> (u32, u32) {
        self.extent
    }

    pub fn stats(&self) -> FrameStats {
        self.stats
    }
}

impl<B: GpuBackend> std::fmt::Debug for OpenFrame<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenFrame")
            .field("extent", &self.extent)
            .field("stats", &self.stats)
            .finish()
    }
}
