//! Host configuration.
//!
//! Read from JSON: an explicit `--config` path, else `host.json` in the
//! platform config directory when it exists, else built-in defaults. Missing
//! fields fall back to their defaults, so a file only needs what it changes.

use std::path::{Path, PathBuf};

use alice_gpu::SurfaceOptions;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::session::{DEFAULT_MEMORY_PAGES, SessionOptions};

pub const CONFIG_FILE: &str = "host.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PowerPreference {
    HighPerformance,
    LowPower,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Alice".to_string(),
            width: 1280,
            height: 720,
        }
    }
}

/// Settings for `--headless` runs on the recording backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadlessConfig {
    pub frames: u32,
    pub width: u32,
    pub height: u32,
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        Self {
            frames: 60,
            width: 800,
            height: 600,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    pub window: WindowConfig,
    /// Linear RGBA the surface is cleared to before each frame.
    pub clear_color: [f64; 4],
    /// Initial size of a host-provided `env.memory`, in 64 KiB pages.
    pub memory_pages: u64,
    /// Per-frame fuel budget; unset means unmetered.
    pub frame_fuel: Option<u64>,
    /// `EnvFilter` directives. `RUST_LOG` still wins when set.
    pub log_filter: Option<String>,
    pub power_preference: PowerPreference,
    pub headless: HeadlessConfig,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            clear_color: [0.0, 0.0, 0.0, 1.0],
            memory_pages: DEFAULT_MEMORY_PAGES,
            frame_fuel: None,
            log_filter: None,
            power_preference: PowerPreference::HighPerformance,
            headless: HeadlessConfig::default(),
        }
    }
}

impl HostConfig {
    /// Load from `explicit`, or the default location, or fall back to
    /// defaults. Only an explicit path is required to exist.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        match Self::default_path() {
            Some(path) if path.is_file() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    /// `<config dir>/alice/host.json` on this platform.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "alice").map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config = Self::from_json(&text)
            .with_context(|| format!("invalid config {}", path.display()))?;
        tracing::debug!(path = %path.display(), "config loaded");
        Ok(config)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            memory_pages: self.memory_pages,
            frame_fuel: self.frame_fuel,
        }
    }

    pub fn surface_options(&self) -> SurfaceOptions {
        SurfaceOptions {
            clear_color: self.clear_color,
            high_performance: self.power_preference == PowerPreference::HighPerformance,
        }
    }
}
