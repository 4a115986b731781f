//! Windows UI Element implementation

use super::{create_ui_automation_with_com_init, ThreadSafeWinUIElement};
use crate::element::{Bounds, UIElementImpl};
use crate::{AutomationError, UIElement};
use std::fmt::Debug;
use tracing::debug;
use uiautomation::patterns;
use uiautomation::types::TreeScope;

pub struct WindowsUIElement {
    pub(crate) element: ThreadSafeWinUIElement,
}

impl WindowsUIElement {
    /// Get the raw UI element for direct automation
    pub fn get_raw_element(&self) -> &uiautomation::UIElement {
        &self.element.0
    }

    /// Create a new WindowsUIElement from a raw uiautomation element
    pub fn new(element: uiautomation::UIElement) -> Self {
        Self {
            #[allow(clippy::arc_with_non_send_sync)]
            element: ThreadSafeWinUIElement(std::sync::Arc::new(element)),
        }
    }

    pub(crate) fn wrap(element: uiautomation::UIElement) -> UIElement {
        UIElement::new(Box::new(Self::new(element)))
    }

    fn find_all(&self, scope: TreeScope) -> Result<Vec<UIElement>, AutomationError> {
        let automation = create_ui_automation_with_com_init()?;
        let condition = automation
            .create_true_condition()
            .map_err(|e| AutomationError::PlatformError(e.to_string()))?;
        let found = self
            .element
            .0
            .find_all(scope, &condition)
            .map_err(|e| AutomationError::PlatformError(e.to_string()))?;
        Ok(found.into_iter().map(Self::wrap).collect())
    }
}

impl Debug for WindowsUIElement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WindowsUIElement")
            .field("name", &self.element.0.get_name().unwrap_or_default())
            .finish()
    }
}

impl UIElementImpl for WindowsUIElement {
    fn object_id(&self) -> usize {
        // runtime ids are stable for the lifetime of the element
        self.element
            .0
            .get_runtime_id()
            .map(|ids| {
                ids.iter()
                    .fold(17usize, |acc, v| acc.wrapping_mul(31).wrapping_add(*v as usize))
            })
            .unwrap_or(0)
    }

    fn role(&self) -> String {
        self.element
            .0
            .get_control_type()
            .map(|ct| ct.to_string())
            .unwrap_or_else(|_| "unknown".to_string())
    }

    fn name(&self) -> Option<String> {
        self.element.0.get_name().ok().filter(|n| !n.is_empty())
    }

    fn value(&self) -> Option<String> {
        self.element
            .0
            .get_pattern::<patterns::UIValuePattern>()
            .and_then(|p| p.get_value())
            .ok()
    }

    fn children(&self) -> Result<Vec<UIElement>, AutomationError> {
        self.find_all(TreeScope::Children)
    }

    fn descendants(&self) -> Result<Vec<UIElement>, AutomationError> {
        self.find_all(TreeScope::Descendants)
    }

    fn bounds(&self) -> Result<Bounds, AutomationError> {
        let rect = self.element.0.get_bounding_rectangle().map_err(|e| {
            AutomationError::PlatformError(format!("Failed to get bounding rectangle: {e}"))
        })?;
        Ok(Bounds::new(
            rect.get_left() as f64,
            rect.get_top() as f64,
            rect.get_width() as f64,
            rect.get_height() as f64,
        ))
    }

    fn is_enabled(&self) -> Result<bool, AutomationError> {
        self.element
            .0
            .is_enabled()
            .map_err(|e| AutomationError::ElementNotFound(e.to_string()))
    }

    fn is_visible(&self) -> Result<bool, AutomationError> {
        self.element
            .0
            .is_offscreen()
            .map(|is_offscreen| !is_offscreen)
            .map_err(|e| AutomationError::ElementNotFound(e.to_string()))
    }

    fn focus(&self) -> Result<(), AutomationError> {
        self.element
            .0
            .set_focus()
            .map_err(|e| AutomationError::PlatformError(e.to_string()))
    }

    fn click(&self) -> Result<(), AutomationError> {
        debug!("attempting to click element: {:?}", self.element.0);
        self.element
            .0
            .click()
            .map_err(|e| AutomationError::PlatformError(e.to_string()))
    }

    fn set_value(&self, value: &str) -> Result<(), AutomationError> {
        let value_par = self
            .element
            .0
            .get_pattern::<patterns::UIValuePattern>()
            .map_err(|e| {
                AutomationError::UnsupportedOperation(format!(
                    "Element does not support ValuePattern: {e}"
                ))
            })?;

        value_par
            .set_value(value)
            .map_err(|e| AutomationError::PlatformError(e.to_string()))
    }

    fn activate_window(&self) -> Result<(), AutomationError> {
        use windows::Win32::UI::WindowsAndMessaging::{
            BringWindowToTop, IsIconic, SetForegroundWindow, ShowWindow, SW_RESTORE,
        };

        let hwnd = match self.element.0.get_native_window_handle() {
            Ok(handle) => handle,
            Err(_) => {
                debug!("Could not get native window handle, falling back to set_focus");
                return self.focus();
            }
        };

        unsafe {
            let hwnd_param: windows::Win32::Foundation::HWND = hwnd.into();

            if IsIconic(hwnd_param).as_bool() {
                let _ = ShowWindow(hwnd_param, SW_RESTORE);
            }
            let _ = BringWindowToTop(hwnd_param);
            if !SetForegroundWindow(hwnd_param).as_bool() {
                debug!("SetForegroundWindow failed, but continuing");
            }
            let _ = self.element.0.set_focus();
        }

        Ok(())
    }

    fn clone_box(&self) -> Box<dyn UIElementImpl> {
        Box::new(WindowsUIElement {
            element: self.element.clone(),
        })
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}
