//! Command line.

use std::path::PathBuf;

use clap::Parser;

use crate::config::HostConfig;

#[derive(Debug, Parser)]
#[command(name = "alice-host")]
#[command(author, version, about = "Run an Alice canvas module", long_about = None)]
pub struct Cli {
    /// Module to run (.wasm binary or .wat text)
    #[arg(value_name = "MODULE")]
    pub module: PathBuf,

    /// Config file (defaults to <config dir>/alice/host.json)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Run without a window on the recording backend
    #[arg(long)]
    pub headless: bool,

    /// Frames to run in headless mode
    #[arg(long)]
    pub frames: Option<u32>,

    /// Surface width in pixels
    #[arg(long)]
    pub width: Option<u32>,

    /// Surface height in pixels
    #[arg(long)]
    pub height: Option<u32>,

    /// Fuel budget per frame
    #[arg(long)]
    pub fuel: Option<u64>,
}

impl Cli {
    /// Fold command-line overrides into `config`.
    pub fn apply(&self, config: &mut HostConfig) {
        if let Some(frames) = self.frames {
            config.headless.frames = frames;
        }
        if let Some(width) = self.width {
            config.window.width = width;
            config.headless.width = width;
        }
        if let Some(height) = self.height {
            config.window.height = height;
            config.headless.height = height;
        }
        if self.fuel.is_some() {
            config.frame_fuel = self.fuel;
        }
    }
}
