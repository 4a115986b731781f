use crate::errors::AutomationError;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use tracing::debug;

/// Control-type names as reported by the accessibility layer.
pub mod roles {
    pub const WINDOW: &str = "Window";
    pub const PANE: &str = "Pane";
    pub const TEXT: &str = "Text";
    pub const EDIT: &str = "Edit";
    pub const DOCUMENT: &str = "Document";
    pub const BUTTON: &str = "Button";
}

/// Screen rectangle in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn mid_y(&self) -> f64 {
        self.y + self.height / 2.0
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// Interface for platform-specific element implementations
pub trait UIElementImpl: Send + Sync + Debug {
    fn object_id(&self) -> usize;
    fn role(&self) -> String;
    fn name(&self) -> Option<String>;
    /// Current value for value-bearing controls (edits, documents).
    fn value(&self) -> Option<String>;
    fn children(&self) -> Result<Vec<UIElement>, AutomationError>;
    fn bounds(&self) -> Result<Bounds, AutomationError>;
    fn is_enabled(&self) -> Result<bool, AutomationError>;
    fn is_visible(&self) -> Result<bool, AutomationError>;
    fn focus(&self) -> Result<(), AutomationError>;
    fn click(&self) -> Result<(), AutomationError>;
    fn set_value(&self, value: &str) -> Result<(), AutomationError>;
    fn activate_window(&self) -> Result<(), AutomationError>;

    /// Depth-first descendants. Platforms with a native subtree query override this.
    fn descendants(&self) -> Result<Vec<UIElement>, AutomationError> {
        let mut out = Vec::new();
        let mut stack = self.children()?;
        stack.reverse();
        while let Some(el) = stack.pop() {
            let mut kids = el.children().unwrap_or_default();
            kids.reverse();
            out.push(el);
            stack.extend(kids);
        }
        Ok(out)
    }

    fn clone_box(&self) -> Box<dyn UIElementImpl>;
    fn as_any(&self) -> &dyn std::any::Any;
}

/// Represents a UI element in the driven application
#[derive(Debug)]
pub struct UIElement {
    inner: Box<dyn UIElementImpl>,
}

impl UIElement {
    pub fn new(impl_: Box<dyn UIElementImpl>) -> Self {
        Self { inner: impl_ }
    }

    pub fn object_id(&self) -> usize {
        self.inner.object_id()
    }

    pub fn role(&self) -> String {
        self.inner.role()
    }

    pub fn name(&self) -> Option<String> {
        self.inner.name()
    }

    /// Name trimmed, empty when absent.
    pub fn name_or_empty(&self) -> String {
        self.name().map(|n| n.trim().to_string()).unwrap_or_default()
    }

    pub fn value(&self) -> Option<String> {
        self.inner.value()
    }

    pub fn children(&self) -> Result<Vec<UIElement>, AutomationError> {
        self.inner.children()
    }

    pub fn descendants(&self) -> Result<Vec<UIElement>, AutomationError> {
        self.inner.descendants()
    }

    /// Descendants whose control type equals `role`.
    pub fn descendants_by_role(&self, role: &str) -> Result<Vec<UIElement>, AutomationError> {
        Ok(self
            .descendants()?
            .into_iter()
            .filter(|el| el.role().eq_ignore_ascii_case(role))
            .collect())
    }

    /// Descendants that accept typed input (edits and rich documents).
    pub fn input_controls(&self) -> Result<Vec<UIElement>, AutomationError> {
        Ok(self
            .descendants()?
            .into_iter()
            .filter(|el| {
                let role = el.role();
                role.eq_ignore_ascii_case(roles::EDIT) || role.eq_ignore_ascii_case(roles::DOCUMENT)
            })
            .collect())
    }

    /// Trimmed non-empty names of every `Text` descendant, in tree order.
    pub fn visible_texts(&self) -> Result<Vec<String>, AutomationError> {
        Ok(self
            .descendants_by_role(roles::TEXT)?
            .iter()
            .map(|t| t.name_or_empty())
            .filter(|t| !t.is_empty())
            .collect())
    }

    /// First direct or nested child with the given role and exact name.
    pub fn find_child(&self, role: &str, name: &str) -> Result<UIElement, AutomationError> {
        self.descendants()?
            .into_iter()
            .find(|el| el.role().eq_ignore_ascii_case(role) && el.name_or_empty() == name)
            .ok_or_else(|| AutomationError::ElementNotFound(format!("{role} '{name}'")))
    }

    pub fn bounds(&self) -> Result<Bounds, AutomationError> {
        self.inner.bounds()
    }

    pub fn is_enabled(&self) -> Result<bool, AutomationError> {
        self.inner.is_enabled()
    }

    pub fn is_visible(&self) -> Result<bool, AutomationError> {
        self.inner.is_visible()
    }

    pub fn focus(&self) -> Result<(), AutomationError> {
        debug!("focusing {} '{}'", self.role(), self.name_or_empty());
        self.inner.focus()
    }

    pub fn click(&self) -> Result<(), AutomationError> {
        self.inner.click()
    }

    pub fn set_value(&self, value: &str) -> Result<(), AutomationError> {
        self.inner.set_value(value)
    }

    pub fn activate_window(&self) -> Result<(), AutomationError> {
        self.inner.activate_window()
    }

    pub fn as_any(&self) -> &dyn std::any::Any {
        self.inner.as_any()
    }
}

impl PartialEq for UIElement {
    fn eq(&self, other: &Self) -> bool {
        self.inner.object_id() == other.inner.object_id()
    }
}

impl Eq for UIElement {}

impl std::hash::Hash for UIElement {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.inner.object_id().hash(state);
    }
}

impl Clone for UIElement {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone_box(),
        }
    }
}
