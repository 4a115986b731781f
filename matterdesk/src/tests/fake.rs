//! In-memory desktop used to drive the automation without the real application.

use crate::element::{roles, Bounds, UIElement, UIElementImpl};
use crate::keys::Key;
use crate::notify::Notifier;
use crate::platforms::AccessibilityEngine;
use crate::{AutomationError, ScreenshotResult};
use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Key(Key),
    Clipboard(String),
    Focus(String),
    Click(String),
    SetValue(String, String),
    Activate(String),
}

pub type EventLog = Arc<Mutex<Vec<Event>>>;

pub struct FakeNode {
    id: usize,
    role: String,
    name: String,
    value: Mutex<String>,
    bounds: Mutex<Bounds>,
    enabled: AtomicBool,
    visible: AtomicBool,
    children: Mutex<Vec<Arc<FakeNode>>>,
    log: EventLog,
}

impl fmt::Debug for FakeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FakeNode")
            .field("id", &self.id)
            .field("role", &self.role)
            .field("name", &self.name)
            .finish()
    }
}

impl FakeNode {
    fn label(&self) -> String {
        if self.name.is_empty() {
            format!("#{}", self.id)
        } else {
            self.name.clone()
        }
    }

    fn record(&self, event: Event) {
        self.log.lock().unwrap().push(event);
    }

    pub fn add(self: &Arc<Self>, child: Arc<FakeNode>) -> Arc<Self> {
        self.children.lock().unwrap().push(child);
        self.clone()
    }

    pub fn set_children(&self, children: Vec<Arc<FakeNode>>) {
        *self.children.lock().unwrap() = children;
    }

    pub fn with_bounds(self: &Arc<Self>, bounds: Bounds) -> Arc<Self> {
        *self.bounds.lock().unwrap() = bounds;
        self.clone()
    }

    pub fn with_value(self: &Arc<Self>, value: &str) -> Arc<Self> {
        *self.value.lock().unwrap() = value.to_string();
        self.clone()
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    pub fn set_visible(&self, visible: bool) {
        self.visible.store(visible, Ordering::SeqCst);
    }

    pub fn current_value(&self) -> String {
        self.value.lock().unwrap().clone()
    }

    pub fn element(self: &Arc<Self>) -> UIElement {
        UIElement::new(Box::new(FakeElement(self.clone())))
    }
}

#[derive(Debug)]
struct FakeElement(Arc<FakeNode>);

impl UIElementImpl for FakeElement {
    fn object_id(&self) -> usize {
        self.0.id
    }

    fn role(&self) -> String {
        self.0.role.clone()
    }

    fn name(&self) -> Option<String> {
        Some(self.0.name.clone()).filter(|n| !n.is_empty())
    }

    fn value(&self) -> Option<String> {
        Some(self.0.current_value())
    }

    fn children(&self) -> Result<Vec<UIElement>, AutomationError> {
        Ok(self
            .0
            .children
            .lock()
            .unwrap()
            .iter()
            .map(|c| c.element())
            .collect())
    }

    fn bounds(&self) -> Result<Bounds, AutomationError> {
        Ok(*self.0.bounds.lock().unwrap())
    }

    fn is_enabled(&self) -> Result<bool, AutomationError> {
        Ok(self.0.enabled.load(Ordering::SeqCst))
    }

    fn is_visible(&self) -> Result<bool, AutomationError> {
        Ok(self.0.visible.load(Ordering::SeqCst))
    }

    fn focus(&self) -> Result<(), AutomationError> {
        if !self.0.enabled.load(Ordering::SeqCst) {
            return Err(AutomationError::PlatformError("element disabled".into()));
        }
        self.0.record(Event::Focus(self.0.label()));
        Ok(())
    }

    fn click(&self) -> Result<(), AutomationError> {
        self.0.record(Event::Click(self.0.label()));
        Ok(())
    }

    fn set_value(&self, value: &str) -> Result<(), AutomationError> {
        *self.0.value.lock().unwrap() = value.to_string();
        self.0
            .record(Event::SetValue(self.0.label(), value.to_string()));
        Ok(())
    }

    fn activate_window(&self) -> Result<(), AutomationError> {
        self.0.record(Event::Activate(self.0.label()));
        Ok(())
    }

    fn clone_box(&self) -> Box<dyn UIElementImpl> {
        Box::new(FakeElement(self.0.clone()))
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

type KeyHook = Box<dyn FnMut(Key) + Send>;

/// Scripted desktop: an element tree, a key/clipboard log and canned OCR results.
#[derive(Default)]
pub struct FakeDesktop {
    next_id: AtomicUsize,
    log: EventLog,
    windows: Mutex<Vec<Arc<FakeNode>>>,
    clipboard: Mutex<String>,
    ocr_results: Mutex<VecDeque<String>>,
    captures: Mutex<Vec<Bounds>>,
    key_hook: Mutex<Option<KeyHook>>,
}

impl FakeDesktop {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn node(&self, role: &str, name: &str) -> Arc<FakeNode> {
        Arc::new(FakeNode {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            role: role.to_string(),
            name: name.to_string(),
            value: Mutex::new(String::new()),
            bounds: Mutex::new(Bounds::default()),
            enabled: AtomicBool::new(true),
            visible: AtomicBool::new(true),
            children: Mutex::new(Vec::new()),
            log: self.log.clone(),
        })
    }

    pub fn add_window(&self, window: Arc<FakeNode>) {
        self.windows.lock().unwrap().push(window);
    }

    /// Top-level window titled like the target application.
    pub fn main_window(&self) -> Arc<FakeNode> {
        let window = self
            .node(roles::WINDOW, "PCLaw® Enterprise - Cabinet")
            .with_bounds(Bounds::new(0.0, 0.0, 1280.0, 1024.0));
        self.add_window(window.clone());
        window
    }

    pub fn queue_ocr(&self, text: &str) {
        self.ocr_results.lock().unwrap().push_back(text.to_string());
    }

    pub fn on_key(&self, hook: impl FnMut(Key) + Send + 'static) {
        *self.key_hook.lock().unwrap() = Some(Box::new(hook));
    }

    pub fn events(&self) -> Vec<Event> {
        self.log.lock().unwrap().clone()
    }

    pub fn keys(&self) -> Vec<Key> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Key(k) => Some(k),
                _ => None,
            })
            .collect()
    }

    /// Text that each Ctrl+V delivered, in order.
    pub fn pasted(&self) -> Vec<String> {
        let mut current = String::new();
        let mut pasted = Vec::new();
        for event in self.events() {
            match event {
                Event::Clipboard(text) => current = text,
                Event::Key(Key::Paste) => pasted.push(current.clone()),
                _ => {}
            }
        }
        pasted
    }

    pub fn clicks(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Click(name) => Some(name),
                _ => None,
            })
            .collect()
    }

    pub fn captures(&self) -> Vec<Bounds> {
        self.captures.lock().unwrap().clone()
    }
}

impl AccessibilityEngine for FakeDesktop {
    fn top_level_windows(&self) -> Result<Vec<UIElement>, AutomationError> {
        Ok(self
            .windows
            .lock()
            .unwrap()
            .iter()
            .map(|w| w.element())
            .collect())
    }

    fn send_key(&self, key: Key) -> Result<(), AutomationError> {
        self.log.lock().unwrap().push(Event::Key(key));
        if let Some(hook) = self.key_hook.lock().unwrap().as_mut() {
            hook(key);
        }
        Ok(())
    }

    fn set_clipboard_text(&self, text: &str) -> Result<(), AutomationError> {
        *self.clipboard.lock().unwrap() = text.to_string();
        self.log
            .lock()
            .unwrap()
            .push(Event::Clipboard(text.to_string()));
        Ok(())
    }

    fn capture_region(&self, region: Bounds) -> Result<ScreenshotResult, AutomationError> {
        self.captures.lock().unwrap().push(region);
        Ok(ScreenshotResult {
            image_data: Vec::new(),
            width: region.width as u32,
            height: region.height as u32,
        })
    }

    fn ocr_screenshot(&self, _screenshot: &ScreenshotResult) -> Result<String, AutomationError> {
        self.ocr_results
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| AutomationError::OcrExtractionFailure("nothing recognised".into()))
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

/// A three-pane modal dialog that switches panes on Ctrl+Left / Ctrl+Right.
pub struct TabbedDialog {
    pub dialog: Arc<FakeNode>,
    pub tab: Arc<AtomicUsize>,
    /// When set, the dialog ignores focus-shift keys.
    pub frozen: Arc<AtomicBool>,
    pub main_edits: Vec<Arc<FakeNode>>,
    pub billing_template: Arc<FakeNode>,
    pub custom_edits: Vec<Arc<FakeNode>>,
}

impl TabbedDialog {
    pub fn install(desktop: &Arc<FakeDesktop>, parent: &Arc<FakeNode>, title: &str) -> Self {
        let d = desktop.as_ref();
        let main_edits = vec![
            {
                let locked = d.node(roles::EDIT, "Matter No");
                locked.set_enabled(false);
                locked
            },
            d.node(roles::EDIT, "Client"),
        ];
        let main_pane = vec![
            d.node(roles::TEXT, "Type of Law"),
            d.node(roles::TEXT, "Responsible Lawyer"),
            main_edits[0].clone(),
            main_edits[1].clone(),
        ];

        let billing_template = d.node(roles::EDIT, "Template").with_value("Default");
        let billing_pane = vec![
            d.node(roles::TEXT, "Billing Template"),
            d.node(roles::EDIT, "Bill Format").with_value("Standard"),
            billing_template.clone(),
        ];

        let custom_edits = vec![
            d.node(roles::EDIT, "Custom 1"),
            d.node(roles::EDIT, "Custom 2"),
        ];
        let custom_pane = vec![
            d.node(roles::TEXT, "BARREAU-2025"),
            custom_edits[0].clone(),
            custom_edits[1].clone(),
        ];

        let content = d.node(roles::PANE, "");
        content.set_children(main_pane.clone());
        let dialog = d
            .node(roles::WINDOW, title)
            .with_bounds(Bounds::new(100.0, 50.0, 400.0, 200.0))
            .add(content.clone());
        parent.add(dialog.clone());

        let tab = Arc::new(AtomicUsize::new(0));
        let frozen = Arc::new(AtomicBool::new(false));
        let panes = [main_pane, billing_pane, custom_pane];
        {
            let tab = tab.clone();
            let frozen = frozen.clone();
            desktop.on_key(move |key| {
                if frozen.load(Ordering::SeqCst) {
                    return;
                }
                let current = tab.load(Ordering::SeqCst);
                let next = match key {
                    Key::CtrlRight => (current + 1).min(2),
                    Key::CtrlLeft => current.saturating_sub(1),
                    _ => return,
                };
                tab.store(next, Ordering::SeqCst);
                content.set_children(panes[next].clone());
            });
        }

        Self {
            dialog,
            tab,
            frozen,
            main_edits,
            billing_template,
            custom_edits,
        }
    }
}

/// Notifier that answers confirmations from a script and records every notice.
#[derive(Default)]
pub struct ScriptedNotifier {
    answers: Mutex<VecDeque<bool>>,
    notices: Mutex<Vec<(&'static str, String)>>,
}

impl ScriptedNotifier {
    pub fn answering(answers: &[bool]) -> Self {
        Self {
            answers: Mutex::new(answers.iter().copied().collect()),
            notices: Mutex::default(),
        }
    }

    pub fn notices(&self) -> Vec<(&'static str, String)> {
        self.notices.lock().unwrap().clone()
    }

    pub fn count(&self, kind: &str) -> usize {
        self.notices().iter().filter(|(k, _)| *k == kind).count()
    }

    fn push(&self, kind: &'static str, message: &str) {
        self.notices
            .lock()
            .unwrap()
            .push((kind, message.to_string()));
    }
}

impl Notifier for ScriptedNotifier {
    fn info(&self, message: &str) {
        self.push("info", message);
    }

    fn warning(&self, message: &str) {
        self.push("warning", message);
    }

    fn error(&self, message: &str) {
        self.push("error", message);
    }

    fn confirm(&self, message: &str) -> bool {
        self.push("confirm", message);
        self.answers.lock().unwrap().pop_front().unwrap_or(false)
    }
}
