//! Windows engine on top of UI Automation.

mod element;
mod engine;

pub use element::WindowsUIElement;
pub use engine::WindowsEngine;

use crate::AutomationError;
use std::sync::Arc;
use uiautomation::UIAutomation;
use windows::core::HRESULT;
use windows::Win32::System::Com::{CoInitializeEx, COINIT_MULTITHREADED};

/// Thread-safe wrapper for UIElement
#[derive(Clone)]
pub(crate) struct ThreadSafeWinUIElement(pub(crate) Arc<uiautomation::UIElement>);

// Safety: UIElement is thread-safe when wrapped properly
unsafe impl Send for ThreadSafeWinUIElement {}
unsafe impl Sync for ThreadSafeWinUIElement {}

// thread-safety
#[derive(Clone)]
pub struct ThreadSafeWinUIAutomation(pub Arc<UIAutomation>);

// send and sync for wrapper
unsafe impl Send for ThreadSafeWinUIAutomation {}
unsafe impl Sync for ThreadSafeWinUIAutomation {}

// RPC_E_CHANGED_MODE: COM already initialized on this thread with another model
const COM_ALREADY_INITIALIZED: HRESULT = HRESULT(0x80010106u32 as i32);

pub(crate) fn create_ui_automation_with_com_init() -> Result<UIAutomation, AutomationError> {
    unsafe {
        let hr = CoInitializeEx(None, COINIT_MULTITHREADED);
        if hr.is_err() && hr != COM_ALREADY_INITIALIZED {
            return Err(AutomationError::PlatformError(format!(
                "Failed to initialize COM: {hr}"
            )));
        }
    }

    UIAutomation::new_direct().map_err(|e| AutomationError::PlatformError(e.to_string()))
}
