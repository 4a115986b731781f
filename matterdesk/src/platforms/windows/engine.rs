#![allow(clippy::arc_with_non_send_sync)]

use super::{create_ui_automation_with_com_init, ThreadSafeWinUIAutomation, WindowsUIElement};
use crate::element::Bounds;
use crate::keys::Key;
use crate::platforms::AccessibilityEngine;
use crate::{AutomationError, ScreenshotResult, UIElement};
use image::{DynamicImage, ImageBuffer, Rgba};
use std::sync::Arc;
use tokio::runtime::Runtime;
use tracing::debug;
use uiautomation::inputs::Keyboard;
use uiautomation::types::TreeScope;
use uni_ocr::{OcrEngine, OcrProvider};

// milliseconds between synthesized key events inside one sequence
const KEY_INTERVAL_MS: u64 = 10;

pub struct WindowsEngine {
    pub automation: ThreadSafeWinUIAutomation,
}

impl WindowsEngine {
    pub fn new() -> Result<Self, AutomationError> {
        let automation = create_ui_automation_with_com_init()?;
        Ok(Self {
            automation: ThreadSafeWinUIAutomation(Arc::new(automation)),
        })
    }
}

impl AccessibilityEngine for WindowsEngine {
    fn top_level_windows(&self) -> Result<Vec<UIElement>, AutomationError> {
        let root = self.automation.0.get_root_element().map_err(|e| {
            AutomationError::PlatformError(format!("Failed to get root element: {e}"))
        })?;
        let condition = self
            .automation
            .0
            .create_true_condition()
            .map_err(|e| AutomationError::PlatformError(e.to_string()))?;
        let windows = root
            .find_all(TreeScope::Children, &condition)
            .map_err(|e| AutomationError::PlatformError(e.to_string()))?;
        debug!("enumerated {} top-level windows", windows.len());
        Ok(windows.into_iter().map(WindowsUIElement::wrap).collect())
    }

    fn send_key(&self, key: Key) -> Result<(), AutomationError> {
        let sequence = key.to_uia_sequence();
        debug!("sending keys {}", sequence);
        Keyboard::new()
            .interval(KEY_INTERVAL_MS)
            .send_keys(&sequence)
            .map_err(|e| AutomationError::PlatformError(format!("Failed to press key: {e:?}")))
    }

    fn set_clipboard_text(&self, text: &str) -> Result<(), AutomationError> {
        let mut clipboard = arboard::Clipboard::new()
            .map_err(|e| AutomationError::PlatformError(format!("Clipboard unavailable: {e}")))?;
        clipboard
            .set_text(text.to_string())
            .map_err(|e| AutomationError::PlatformError(format!("Clipboard write failed: {e}")))
    }

    fn capture_region(&self, region: Bounds) -> Result<ScreenshotResult, AutomationError> {
        let monitors = xcap::Monitor::all()
            .map_err(|e| AutomationError::PlatformError(format!("Failed to get monitors: {e}")))?;

        let left = region.x as i32;
        let top = region.y as i32;
        for monitor in monitors {
            let mx = monitor.x().map_err(|e| {
                AutomationError::PlatformError(format!("Failed to get monitor x: {e}"))
            })?;
            let my = monitor.y().map_err(|e| {
                AutomationError::PlatformError(format!("Failed to get monitor y: {e}"))
            })?;
            let mw = monitor.width().map_err(|e| {
                AutomationError::PlatformError(format!("Failed to get monitor width: {e}"))
            })?;
            let mh = monitor.height().map_err(|e| {
                AutomationError::PlatformError(format!("Failed to get monitor height: {e}"))
            })?;

            let inside = left >= mx
                && top >= my
                && left < mx + mw as i32
                && top < my + mh as i32;
            if !inside {
                continue;
            }

            let rel_x = (left - mx) as u32;
            let rel_y = (top - my) as u32;
            let width = (region.width as u32).min(mw - rel_x);
            let height = (region.height as u32).min(mh - rel_y);

            let capture = monitor
                .capture_region(rel_x, rel_y, width, height)
                .map_err(|e| {
                    AutomationError::PlatformError(format!("Failed to capture region: {e}"))
                })?;

            return Ok(ScreenshotResult {
                image_data: capture.to_vec(),
                width,
                height,
            });
        }

        Err(AutomationError::PlatformError(format!(
            "Region {region:?} is not visible on any monitor"
        )))
    }

    fn ocr_screenshot(&self, screenshot: &ScreenshotResult) -> Result<String, AutomationError> {
        let img_buffer: ImageBuffer<Rgba<u8>, Vec<u8>> = ImageBuffer::from_raw(
            screenshot.width,
            screenshot.height,
            screenshot.image_data.clone(),
        )
        .ok_or_else(|| {
            AutomationError::InvalidArgument(
                "Invalid screenshot data for buffer creation".to_string(),
            )
        })?;
        let dynamic_image = DynamicImage::ImageRgba8(img_buffer);

        // the automation flow is blocking; the OCR engine is async
        let rt = Runtime::new().map_err(|e| {
            AutomationError::PlatformError(format!("Failed to create Tokio runtime: {e}"))
        })?;

        rt.block_on(async {
            let engine = OcrEngine::new(OcrProvider::Auto).map_err(|e| {
                AutomationError::PlatformError(format!("Failed to create OCR engine: {e}"))
            })?;

            let (text, _language, _confidence) =
                engine.recognize_image(&dynamic_image).await.map_err(|e| {
                    AutomationError::OcrExtractionFailure(format!("OCR recognition failed: {e}"))
                })?;

            Ok(text)
        })
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}
