//! Render configuration, loaded from JSON

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_WIDTH: u32 = 900;
pub const DEFAULT_HEIGHT: u32 = 600;
pub const DEFAULT_SCALE: u32 = 16;

/// Everything the frame pipeline needs to know; missing fields take defaults
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Display width in pixels
    pub width: u32,
    /// Display height in pixels
    pub height: u32,
    /// Supersample factor: drawing happens at `scale` x the display size
    pub scale: u32,
    pub background: u8,
    pub fill_gray: u8,
    pub stroke_gray: u8,
    /// Stroke width in supersampled pixels (defaults to `scale`)
    pub stroke_width: Option<u32>,
    /// Fill rows on a worker pool instead of the calling thread
    pub parallel: bool,
    /// Worker count (defaults to available hardware parallelism)
    pub workers: Option<usize>,
    pub frame_interval_ms: u64,
    /// Drawing file in `x0 y0 x1 y1` format (defaults to the built-in leaf)
    pub drawing: Option<PathBuf>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            scale: DEFAULT_SCALE,
            background: 192,
            fill_gray: 255,
            stroke_gray: 0,
            stroke_width: None,
            parallel: true,
            workers: None,
            frame_interval_ms: 500,
            drawing: None,
        }
    }
}

impl RenderConfig {
    /// Load from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: Self = serde_json::from_str(&json)
            .with_context(|| format!("invalid config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).with_context(|| format!("failed to write config {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.width > 0 && self.height > 0, "display size must be non-zero");
        ensure!(self.scale > 0, "scale must be non-zero");
        ensure!(self.workers != Some(0), "workers must be non-zero");
        ensure!(
            self.supersampled_size().is_some(),
            "supersampled size {}x{} x{} overflows",
            self.width,
            self.height,
            self.scale
        );
        Ok(())
    }

    /// Supersampled (width, height), or None on overflow
    pub fn supersampled_size(&self) -> Option<(u32, u32)> {
        let w = self.width.checked_mul(self.scale)?;
        let h = self.height.checked_mul(self.scale)?;
        (w as usize).checked_mul(h as usize)?;
        Some((w, h))
    }

    pub fn stroke_width(&self) -> u32 {
        self.stroke_width.unwrap_or(self.scale)
    }
}
