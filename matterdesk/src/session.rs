//! Connection to the target application's main window.

use crate::clipboard::{ClipboardChannel, ClipboardLease};
use crate::clock::{wait_until, Clock};
use crate::config::AutomationConfig;
use crate::element::{roles, UIElement};
use crate::errors::AutomationError;
use crate::keys::Key;
use crate::platforms::AccessibilityEngine;
use regex::Regex;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Exclusive handle on the target application's top-level window for one automation run.
///
/// Becomes useless once the window closes; nothing re-attaches automatically.
pub struct Session {
    engine: Arc<dyn AccessibilityEngine>,
    clock: Arc<dyn Clock>,
    config: Arc<AutomationConfig>,
    window: UIElement,
    clipboard: ClipboardChannel,
}

impl Session {
    /// Connects using the configured window title pattern.
    pub fn connect(
        engine: Arc<dyn AccessibilityEngine>,
        clock: Arc<dyn Clock>,
        config: Arc<AutomationConfig>,
    ) -> Result<Self, AutomationError> {
        let pattern = config.window_title_pattern.clone();
        Self::connect_with_pattern(engine, clock, config, &pattern)
    }

    /// Finds the first top-level window whose title matches `title_pattern`.
    ///
    /// When several windows match, the first one enumerated by the OS wins; there is no
    /// disambiguation. The window is not brought to the foreground.
    #[instrument(skip(engine, clock, config))]
    pub fn connect_with_pattern(
        engine: Arc<dyn AccessibilityEngine>,
        clock: Arc<dyn Clock>,
        config: Arc<AutomationConfig>,
        title_pattern: &str,
    ) -> Result<Self, AutomationError> {
        let re = Regex::new(title_pattern).map_err(|e| {
            AutomationError::InvalidArgument(format!("bad window title pattern: {e}"))
        })?;

        let mut matches: Vec<UIElement> = engine
            .top_level_windows()?
            .into_iter()
            .filter(|w| re.is_match(&w.name_or_empty()))
            .collect();

        if matches.is_empty() {
            return Err(AutomationError::ConnectionError(format!(
                "no window title matches '{title_pattern}'"
            )));
        }
        if matches.len() > 1 {
            warn!(
                "{} windows match '{}', using the first one",
                matches.len(),
                title_pattern
            );
        }
        let window = matches.remove(0);
        info!("Connected to '{}'", window.name_or_empty());

        Ok(Self {
            engine,
            clock,
            config,
            window,
            clipboard: ClipboardChannel::new(),
        })
    }

    pub fn window(&self) -> &UIElement {
        &self.window
    }

    pub fn engine(&self) -> &dyn AccessibilityEngine {
        self.engine.as_ref()
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn config(&self) -> &AutomationConfig {
        &self.config
    }

    pub fn bring_to_foreground(&self) -> Result<(), AutomationError> {
        self.window.activate_window()
    }

    pub fn settle(&self, duration: Duration) {
        if !duration.is_zero() {
            self.clock.sleep(duration);
        }
    }

    pub fn press(&self, key: Key) -> Result<(), AutomationError> {
        self.engine.send_key(key)
    }

    /// Sends `key` `times` times, settling after each press.
    pub fn press_times(
        &self,
        key: Key,
        times: usize,
        settle: Duration,
    ) -> Result<(), AutomationError> {
        for _ in 0..times {
            self.engine.send_key(key)?;
            self.settle(settle);
        }
        Ok(())
    }

    pub fn clipboard(&self) -> Result<ClipboardLease<'_>, AutomationError> {
        self.clipboard.lease(self.engine.as_ref())
    }

    /// Pastes one value into the focused control under a short-lived clipboard lease.
    pub fn paste(&self, text: &str) -> Result<(), AutomationError> {
        self.clipboard()?.paste(text)
    }

    /// Child window of the main window with the given title, if currently present.
    pub fn find_dialog(&self, title: &str) -> Option<UIElement> {
        self.window
            .descendants_by_role(roles::WINDOW)
            .ok()?
            .into_iter()
            .find(|w| w.name_or_empty() == title)
    }

    /// Waits until the dialog titled `title` is visible and enabled.
    #[instrument(skip(self))]
    pub fn wait_for_dialog(&self, title: &str) -> Result<UIElement, AutomationError> {
        let timeout = self.config.dialog_timeout();
        let mut found = None;
        let ready = wait_until(self.clock(), timeout, self.config.poll_interval(), || {
            match self.find_dialog(title) {
                Some(dlg)
                    if dlg.is_visible().unwrap_or(false) && dlg.is_enabled().unwrap_or(false) =>
                {
                    found = Some(dlg);
                    true
                }
                _ => false,
            }
        });

        match (ready, found) {
            (Ok(()), Some(dlg)) => {
                debug!("dialog '{}' ready", title);
                Ok(dlg)
            }
            _ => Err(AutomationError::DialogTimeout {
                title: title.to_string(),
                waited_ms: timeout.as_millis() as u64,
            }),
        }
    }

    /// Clicks a button by its caption anywhere under the main window.
    pub fn click_button(&self, caption: &str) -> Result<(), AutomationError> {
        let button = self.window.find_child(roles::BUTTON, caption)?;
        debug!("clicking '{}'", caption);
        button.click()
    }
}
