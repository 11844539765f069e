//! Per-session host state, owned by the wasmtime `Store`.

use alice_core::BridgeError;
use alice_gpu::{Bridge, GpuBackend, OpenFrame};
use wasmtime::Memory;

/// Everything a host import can touch. One per session; no globals.
pub struct HostContext<B: GpuBackend> {
    pub(crate) bridge: Bridge<B>,
    /// Host-provided memory, or the module's exported one once instantiated.
    pub(crate) memory: Option<Memory>,
    /// Address registered through `platform_set_shared_memory`.
    pub(crate) shared_memory: Option<u32>,
    /// Present only while `next_frame` runs.
    pub(crate) frame: Option<OpenFrame<B>>,
    reported: Vec<BridgeError>,
}

impl<B: GpuBackend> HostContext<B> {
    pub fn new(backend: B) -> Self {
        Self {
            bridge: Bridge::new(backend),
            memory: None,
            shared_memory: None,
            frame: None,
            reported: Vec::new(),
        }
    }

    pub fn bridge(&self) -> &Bridge<B> {
        &self.bridge
    }

    pub fn bridge_mut(&mut self) -> &mut Bridge<B> {
        &mut self.bridge
    }

    pub fn shared_memory(&self) -> Option<u32> {
        self.shared_memory
    }

    /// Record a non-fatal error for later draining.
    pub(crate) fn report(&mut self, error: BridgeError) {
        self.reported.push(error);
    }

    pub fn take_reported(&mut self) -> Vec<BridgeError> {
        std::mem::take(&mut self.reported)
    }
}
