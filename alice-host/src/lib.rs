//! # Alice Host
//!
//! Runs a sandboxed canvas module under wasmtime and services its `env`
//! imports against a GPU backend. The module owns all per-frame logic; the
//! host owns every GPU object and hands the module small integer handles.
//!
//! [`Session`] is the embeddable core. [`shell::run`] wraps it in a winit
//! window on the wgpu backend; [`run_headless`] drives it on the recording
//! backend with a synthetic clock.

use std::time::{Duration, Instant};

use alice_gpu::RecordingBackend;
use anyhow::Result;

pub mod cli;
pub mod config;
pub mod context;
pub mod imports;
pub mod sequencer;
pub mod session;
pub mod shell;
pub mod util;

pub use cli::Cli;
pub use config::{HeadlessConfig, HostConfig, PowerPreference, WindowConfig};
pub use context::HostContext;
pub use sequencer::{FrameReport, Phase, Sequencer};
pub use session::{FrameInput, Session, SessionOptions, Termination};

/// Synthetic frame interval for headless runs.
pub const HEADLESS_FRAME_INTERVAL: Duration = Duration::from_micros(16_667);

/// Totals over a headless run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeadlessSummary {
    pub presented: u32,
    pub skipped: u32,
    pub draws_issued: u64,
    pub draws_skipped: u64,
    pub draws_culled: u64,
    pub recoverable_errors: u64,
}

/// Run `config.headless.frames` cycles on a [`RecordingBackend`].
pub fn run_headless(config: &HostConfig, wasm: &[u8]) -> Result<HeadlessSummary> {
    let backend = RecordingBackend::new(config.headless.width, config.headless.height);
    let mut session = Session::load(wasm, backend, config.session_options())?;
    session.start()?;

    let origin = Instant::now();
    let input = FrameInput::default();
    let mut summary = HeadlessSummary::default();

    for n in 0..config.headless.frames {
        match session.run_frame(&input, origin + HEADLESS_FRAME_INTERVAL * n)? {
            Some(report) => {
                summary.presented += 1;
                summary.draws_issued += u64::from(report.draws_issued);
                summary.draws_skipped += u64::from(report.draws_skipped);
                summary.draws_culled += u64::from(report.draws_culled);
            }
            None => summary.skipped += 1,
        }
        summary.recoverable_errors += session.take_reported().len() as u64;
    }

    tracing::info!(?summary, "headless run complete");
    Ok(summary)
}
