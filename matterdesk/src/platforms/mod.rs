use crate::element::{Bounds, UIElement};
use crate::keys::Key;
use crate::{AutomationError, ScreenshotResult};
use std::sync::Arc;

/// The common trait that all platform-specific engines must implement
///
/// Input is global: keys go to whichever control holds keyboard focus in the foreground
/// application, and the clipboard is the system clipboard.
pub trait AccessibilityEngine: Send + Sync {
    /// All top-level windows, in OS enumeration order
    fn top_level_windows(&self) -> Result<Vec<UIElement>, AutomationError>;

    /// Send one key (or modifier combination) to the focused control
    fn send_key(&self, key: Key) -> Result<(), AutomationError>;

    /// Replace the clipboard contents with `text`
    fn set_clipboard_text(&self, text: &str) -> Result<(), AutomationError>;

    /// Capture a screen rectangle (physical pixels, RGBA)
    fn capture_region(&self, region: Bounds) -> Result<ScreenshotResult, AutomationError>;

    /// OCR on screenshot
    fn ocr_screenshot(&self, screenshot: &ScreenshotResult) -> Result<String, AutomationError>;

    /// Enable downcasting to concrete engine types
    fn as_any(&self) -> &dyn std::any::Any;
}

#[cfg(target_os = "windows")]
pub mod windows;

/// Create the appropriate engine for the current platform
pub fn create_engine() -> Result<Arc<dyn AccessibilityEngine>, AutomationError> {
    #[cfg(target_os = "windows")]
    {
        Ok(Arc::new(windows::WindowsEngine::new()?))
    }
    #[cfg(not(target_os = "windows"))]
    {
        Err(AutomationError::UnsupportedPlatform(
            "the target application only runs on Windows".to_string(),
        ))
    }
}
