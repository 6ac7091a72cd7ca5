//! Active-window capture via xcap
//!
//! Grabs the focused window (falling back to the first window that is
//! not minimized) and encodes it as JPEG. Failures here are surfaced to
//! the trigger, which logs them and continues without a screenshot.

use anyhow::{Context, Result};
use savepoint_watcher::ScreenshotHook;
use std::io::Cursor;

pub struct ActiveWindowCapture;

impl ScreenshotHook for ActiveWindowCapture {
    fn capture(&self) -> Result<Vec<u8>> {
        let windows = xcap::Window::all().context("failed to enumerate windows")?;

        let target = windows
            .iter()
            .find(|w| w.is_focused().unwrap_or(false))
            .or_else(|| windows.iter().find(|w| !w.is_minimized().unwrap_or(true)))
            .context("no capturable window found")?;

        let rgba = target
            .capture_image()
            .context("window capture failed")?;

        // JPEG has no alpha channel.
        let rgb = image::DynamicImage::ImageRgba8(rgba).to_rgb8();
        let mut buf = Vec::new();
        rgb.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Jpeg)
            .context("jpeg encoding failed")?;
        Ok(buf)
    }
}
