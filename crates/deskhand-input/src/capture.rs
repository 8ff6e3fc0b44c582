use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use deskhand_core::config::CaptureConfig;
use deskhand_core::{DeskError, Result};
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, ImageFormat, RgbaImage};
use tracing::debug;

use crate::process::{program_exists, run_tool};

// ─── Screenshot ───────────────────────────────────────────────────────────

/// A PNG-encoded capture of the display.
#[derive(Debug, Clone)]
pub struct Screenshot {
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub captured_at: DateTime<Utc>,
}

impl Screenshot {
    /// Wrap encoded bytes after checking they are a non-empty PNG.
    pub fn from_png(png: Vec<u8>) -> Result<Self> {
        if png.is_empty() {
            return Err(DeskError::Capture("capture produced no bytes".into()));
        }
        match image::guess_format(&png) {
            Ok(ImageFormat::Png) => {}
            _ => return Err(DeskError::Capture("capture is not a PNG image".into())),
        }
        let (width, height) = png_dimensions(&png)
            .ok_or_else(|| DeskError::Capture("PNG header is truncated".into()))?;
        if width == 0 || height == 0 {
            return Err(DeskError::Capture(format!(
                "capture has empty dimensions {width}x{height}"
            )));
        }
        Ok(Self {
            png,
            width,
            height,
            captured_at: Utc::now(),
        })
    }
}

/// Width and height from the IHDR chunk, which always directly follows the
/// 8-byte signature.
fn png_dimensions(png: &[u8]) -> Option<(u32, u32)> {
    let ihdr = png.get(8..24)?;
    if &ihdr[4..8] != b"IHDR" {
        return None;
    }
    let width = u32::from_be_bytes(ihdr[8..12].try_into().ok()?);
    let height = u32::from_be_bytes(ihdr[12..16].try_into().ok()?);
    Some((width, height))
}

pub(crate) fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    PngEncoder::new(&mut buf)
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            ExtendedColorType::Rgba8,
        )
        .map_err(|e| DeskError::Capture(format!("PNG encoding failed: {e}")))?;
    Ok(buf)
}

// ─── ScreenCapture ────────────────────────────────────────────────────────

#[async_trait]
pub trait ScreenCapture: Send + Sync {
    fn name(&self) -> &'static str;

    async fn capture(&self) -> Result<Screenshot>;
}

/// Build the capture strategy selected in the config.
pub fn build_capture(config: &CaptureConfig) -> Arc<dyn ScreenCapture> {
    match config {
        CaptureConfig::Native => Arc::new(NativeCapture),
        CaptureConfig::Shell { grim, timeout_ms } => Arc::new(ShellCapture::new(
            grim.clone(),
            Duration::from_millis(*timeout_ms),
        )),
    }
}

// ─── NativeCapture ────────────────────────────────────────────────────────

/// Captures the primary monitor (or the first one) through `xcap`.
pub struct NativeCapture;

fn capture_primary() -> Result<Screenshot> {
    let monitors =
        xcap::Monitor::all().map_err(|e| DeskError::Capture(format!("listing monitors: {e}")))?;
    let monitor = monitors
        .iter()
        .find(|m| m.is_primary())
        .or_else(|| monitors.first())
        .ok_or_else(|| DeskError::Capture("no monitor found".into()))?;
    debug!(monitor = monitor.name(), "capturing monitor");
    let image = monitor
        .capture_image()
        .map_err(|e| DeskError::Capture(e.to_string()))?;
    Screenshot::from_png(encode_png(&image)?)
}

#[async_trait]
impl ScreenCapture for NativeCapture {
    fn name(&self) -> &'static str {
        "native"
    }

    async fn capture(&self) -> Result<Screenshot> {
        tokio::task::spawn_blocking(capture_primary)
            .await
            .map_err(|e| DeskError::Capture(format!("capture task failed: {e}")))?
    }
}

// ─── ShellCapture ─────────────────────────────────────────────────────────

/// Runs `grim <file>` into a scratch file, reads it back and deletes it.
pub struct ShellCapture {
    grim: String,
    timeout: Duration,
}

impl ShellCapture {
    pub fn new(grim: impl Into<String>, timeout: Duration) -> Self {
        Self {
            grim: grim.into(),
            timeout,
        }
    }

    /// `true` when the configured `grim` resolves to an executable.
    pub fn is_available(&self) -> bool {
        program_exists(&self.grim)
    }
}

#[async_trait]
impl ScreenCapture for ShellCapture {
    fn name(&self) -> &'static str {
        "shell"
    }

    async fn capture(&self) -> Result<Screenshot> {
        let scratch = tempfile::Builder::new()
            .prefix("deskhand-")
            .suffix(".png")
            .tempfile()
            .map_err(|e| DeskError::Capture(format!("cannot create scratch file: {e}")))?;
        let path = scratch.path().display().to_string();

        run_tool(&self.grim, &[path], self.timeout)
            .await
            .map_err(|e| DeskError::Capture(e.to_string()))?;

        let png = tokio::fs::read(scratch.path())
            .await
            .map_err(|e| {
                DeskError::Capture(format!("cannot read {}: {e}", scratch.path().display()))
            })?;
        drop(scratch);
        Screenshot::from_png(png)
    }
}
