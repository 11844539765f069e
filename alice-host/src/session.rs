//! Module session: compile, link, instantiate, then drive frames.
//!
//! A session owns the wasmtime store (and through it the [`HostContext`]),
//! the module's two exports and the frame sequencer. After a fatal error it
//! records why and refuses further frames.

use std::time::Instant;

use alice_core::codec::{FRAME_STATE_SIZE, FrameState, PointerButtons};
use alice_core::{BridgeError, LinearMemory, ProtocolError};
use alice_gpu::{Bridge, GpuBackend};
use anyhow::{Context, Result, anyhow, bail};
use thiserror::Error;
use wasmtime::{
    Config, Engine, ExternType, Linker, Memory, MemoryType, Module, Store, Trap, TypedFunc,
};

use crate::context::HostContext;
use crate::imports;
use crate::sequencer::{FrameReport, Phase, Sequencer};

/// 256 pages of 64 KiB: 16 MiB.
pub const DEFAULT_MEMORY_PAGES: u64 = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    /// Initial size of a host-provided `env.memory`.
    pub memory_pages: u64,
    /// Fuel granted to each `next_frame` call. `None` disables metering.
    pub frame_fuel: Option<u64>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            memory_pages: DEFAULT_MEMORY_PAGES,
            frame_fuel: None,
        }
    }
}

/// Pointer input for one frame, in surface pixels with the origin at the
/// bottom-left.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameInput {
    pub pointer_x: u32,
    pub pointer_y: u32,
    pub buttons: PointerButtons,
}

/// Why a session stopped.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Termination {
    #[error(transparent)]
    Bridge(#[from] BridgeError),

    #[error("module trapped: {0}")]
    Trap(String),
}

impl Termination {
    fn classify(error: &wasmtime::Error) -> Self {
        if let Some(bridge) = error.downcast_ref::<BridgeError>() {
            return Termination::Bridge(bridge.clone());
        }
        if let Some(Trap::OutOfFuel) = error.downcast_ref::<Trap>() {
            return Termination::Bridge(BridgeError::FrameBudgetExceeded);
        }
        Termination::Trap(format!("{error:#}"))
    }
}

pub struct Session<B: GpuBackend> {
    store: Store<HostContext<B>>,
    memory: Memory,
    entry_point: TypedFunc<u32, ()>,
    next_frame: TypedFunc<(), ()>,
    sequencer: Sequencer,
    frame_fuel: Option<u64>,
    started: bool,
    termination: Option<Termination>,
}

impl<B: GpuBackend> Session<B> {
    /// Compile and instantiate a module (binary or WAT text).
    pub fn load(wasm: &[u8], backend: B, options: SessionOptions) -> Result<Self> {
        let mut config = Config::new();
        config.consume_fuel(options.frame_fuel.is_some());
        let engine = Engine::new(&config)?;

        let module = Module::new(&engine, wasm)
            .map_err(anyhow::Error::from)
            .context("failed to compile module")?;

        let mut linker = Linker::new(&engine);
        imports::link(&mut linker)?;

        let mut store = Store::new(&engine, HostContext::new(backend));
        if options.frame_fuel.is_some() {
            store.set_fuel(u64::MAX)?;
        }

        let provided = provide_memory(&module, &mut linker, &mut store, options.memory_pages)?;
        store.data_mut().memory = provided;

        let instance = linker
            .instantiate(&mut store, &module)
            .map_err(anyhow::Error::from)
            .context("failed to instantiate module")?;

        let memory = match provided {
            Some(memory) => memory,
            None => instance
                .get_memory(&mut store, "memory")
                .context("module neither exports nor imports `memory`")?,
        };
        store.data_mut().memory = Some(memory);

        let entry_point = instance
            .get_typed_func::<u32, ()>(&mut store, "entry_point")
            .map_err(anyhow::Error::from)
            .context("module must export `entry_point(i32)`")?;
        let next_frame = instance
            .get_typed_func::<(), ()>(&mut store, "next_frame")
            .map_err(anyhow::Error::from)
            .context("module must export `next_frame()`")?;

        tracing::info!(
            memory_bytes = memory.data_size(&store),
            host_memory = provided.is_some(),
            metered = options.frame_fuel.is_some(),
            "module instantiated"
        );

        Ok(Self {
            store,
            memory,
            entry_point,
            next_frame,
            sequencer: Sequencer::new(),
            frame_fuel: options.frame_fuel,
            started: false,
            termination: None,
        })
    }

    /// Call `entry_point(logical_core_count)`. Runs once, unmetered.
    pub fn start(&mut self) -> Result<()> {
        if self.started {
            bail!("entry_point already ran");
        }
        self.started = true;

        let cores = std::thread::available_parallelism()
            .map(|n| n.get() as u32)
            .unwrap_or(1);
        if self.frame_fuel.is_some() {
            self.store.set_fuel(u64::MAX)?;
        }

        tracing::debug!(cores, "calling entry_point");
        if let Err(error) = self.entry_point.call(&mut self.store, cores) {
            let termination = Termination::classify(&error);
            return Err(self.terminate(termination).context("entry_point failed"));
        }
        Ok(())
    }

    /// Run one frame cycle. `Ok(None)` when the render target was
    /// unavailable and the cycle was skipped without calling the module.
    pub fn run_frame(&mut self, input: &FrameInput, now: Instant) -> Result<Option<FrameReport>> {
        if let Some(termination) = &self.termination {
            bail!("session terminated: {termination}");
        }
        if !self.started {
            bail!("entry_point has not run");
        }
        self.sequencer.begin()?;

        // Packing. The target is acquired before the state is written so a
        // lost surface skips the cycle untouched, and so the packed extent is
        // the one the pass will render to.
        let open = match self.store.data_mut().bridge.begin_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                self.sequencer.abandon();
                tracing::debug!("render target unavailable, cycle skipped");
                return Ok(None);
            }
            Err(error) => return Err(self.terminate(error.into())),
        };

        let delta = self.sequencer.tick(now);
        let (width, height) = open.extent();
        let state = FrameState {
            width,
            height,
            frame_delta: delta,
            pointer_x: input.pointer_x,
            pointer_y: input.pointer_y,
            buttons: input.buttons,
        };
        let written = match self.pack(&state) {
            Ok(written) => written,
            Err(error) => return Err(self.terminate(error.into())),
        };

        // Recording
        self.sequencer.advance(Phase::Recording);
        self.store.data_mut().frame = Some(open);

        // Executing
        self.sequencer.advance(Phase::Executing);
        if let Some(budget) = self.frame_fuel {
            self.store.set_fuel(budget)?;
        }
        if let Err(error) = self.next_frame.call(&mut self.store, ()) {
            let termination = Termination::classify(&error);
            return Err(self.terminate(termination));
        }

        // Submitting
        self.sequencer.advance(Phase::Submitting);
        let Some(frame) = self.store.data_mut().frame.take() else {
            return Err(self.terminate(BridgeError::from(ProtocolError::NoOpenFrame).into()));
        };
        let stats = self.store.data_mut().bridge.submit(frame);
        self.sequencer.finish();

        let report = FrameReport::new(stats, delta, written);
        tracing::trace!(?report, "frame presented");
        Ok(Some(report))
    }

    /// Write the frame state record at the registered address, if any.
    fn pack(&mut self, state: &FrameState) -> Result<bool, BridgeError> {
        let Some(addr) = self.store.data().shared_memory else {
            return Ok(false);
        };
        let mut view = LinearMemory::new(self.memory.data_mut(&mut self.store));
        view.write(addr as u64, &state.encode())?;
        Ok(true)
    }

    fn terminate(&mut self, termination: Termination) -> anyhow::Error {
        tracing::error!(target: "alice::bridge", %termination, "session terminated");
        self.sequencer.terminate();
        // An unsubmitted frame is discarded with the error.
        self.store.data_mut().frame = None;
        self.termination = Some(termination.clone());
        anyhow!(termination)
    }

    pub fn termination(&self) -> Option<&Termination> {
        self.termination.as_ref()
    }

    pub fn phase(&self) -> Phase {
        self.sequencer.phase()
    }

    pub fn bridge(&self) -> &Bridge<B> {
        self.store.data().bridge()
    }

    pub fn bridge_mut(&mut self) -> &mut Bridge<B> {
        self.store.data_mut().bridge_mut()
    }

    pub fn shared_memory(&self) -> Option<u32> {
        self.store.data().shared_memory()
    }

    /// Non-fatal errors reported since the last call.
    pub fn take_reported(&mut self) -> Vec<BridgeError> {
        self.store.data_mut().take_reported()
    }

    pub fn memory_size(&self) -> usize {
        self.memory.data_size(&self.store)
    }

    /// Read back the frame state record from module memory.
    pub fn frame_state(&mut self) -> Option<FrameState> {
        let addr = self.shared_memory()?;
        let view = LinearMemory::new(self.memory.data_mut(&mut self.store));
        view.read_array::<FRAME_STATE_SIZE>(addr as u64)
            .ok()
            .map(|record| FrameState::decode(&record))
    }
}

/// Create and define `env.memory` when the module imports it.
fn provide_memory<B: GpuBackend>(
    module: &Module,
    linker: &mut Linker<HostContext<B>>,
    store: &mut Store<HostContext<B>>,
    pages: u64,
) -> Result<Option<Memory>> {
    let Some(ty) = module.imports().find_map(|import| match import.ty() {
        ExternType::Memory(ty) if import.module() == imports::MODULE && import.name() == "memory" => {
            Some(ty)
        }
        _ => None,
    }) else {
        return Ok(None);
    };

    let mut pages = pages.max(ty.minimum());
    if let Some(maximum) = ty.maximum() {
        pages = pages.min(maximum);
    }
    let minimum = u32::try_from(pages).context("memory page count out of range")?;
    let maximum = ty
        .maximum()
        .map(u32::try_from)
        .transpose()
        .context("memory maximum out of range")?;

    let memory = Memory::new(&mut *store, MemoryType::new(minimum, maximum))?;
    linker.define(&*store, imports::MODULE, "memory", memory)?;
    tracing::debug!(pages = minimum, "provided env.memory");
    Ok(Some(memory))
}
