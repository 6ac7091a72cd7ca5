//! Screenshot hook seam
//!
//! The trigger captures an image of the active window at the moment a
//! cycle arms. Capture is an external capability (the CLI provides an
//! xcap-backed implementation), so it hangs off a trait here. The hook
//! runs synchronously on the event-handling path and should return
//! quickly; failures are logged and the cycle proceeds without a
//! screenshot.

use anyhow::Result;

/// Point-in-time capture of the active window as encoded JPEG bytes.
pub trait ScreenshotHook: Send + Sync {
    fn capture(&self) -> Result<Vec<u8>>;
}

/// Hook that never produces an image. Useful when capture is
/// unavailable (headless sessions) and in tests.
#[derive(Debug, Default)]
pub struct NoScreenshot;

impl ScreenshotHook for NoScreenshot {
    fn capture(&self) -> Result<Vec<u8>> {
        anyhow::bail!("screenshot capture disabled")
    }
}
