//! The clipboard as the single data channel into focused controls.
//!
//! Paste is used instead of direct text injection because some of the target's fields
//! reject programmatic value changes. The clipboard is process-global, so it is handed out
//! as a lease: one fill operation holds it at a time and a second lease attempt fails
//! instead of interleaving writes.

use crate::errors::AutomationError;
use crate::keys::Key;
use crate::platforms::AccessibilityEngine;
use std::sync::{Mutex, MutexGuard, TryLockError};
use tracing::debug;

#[derive(Default)]
pub struct ClipboardChannel {
    writer: Mutex<()>,
}

impl ClipboardChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lease<'a>(
        &'a self,
        engine: &'a dyn AccessibilityEngine,
    ) -> Result<ClipboardLease<'a>, AutomationError> {
        let guard = match self.writer.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::WouldBlock) => {
                return Err(AutomationError::Internal(
                    "clipboard is already leased by another fill operation".to_string(),
                ))
            }
            // a panicked holder cannot have left a half-written paste behind
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
        };
        Ok(ClipboardLease {
            _guard: guard,
            engine,
            pastes: 0,
        })
    }
}

pub struct ClipboardLease<'a> {
    _guard: MutexGuard<'a, ()>,
    engine: &'a dyn AccessibilityEngine,
    pastes: usize,
}

impl ClipboardLease<'_> {
    /// Puts `text` on the clipboard and pastes it into the focused control.
    pub fn paste(&mut self, text: &str) -> Result<(), AutomationError> {
        self.engine.set_clipboard_text(text)?;
        self.engine.send_key(Key::Paste)?;
        self.pastes += 1;
        Ok(())
    }

    pub fn pastes(&self) -> usize {
        self.pastes
    }
}

impl Drop for ClipboardLease<'_> {
    fn drop(&mut self) {
        debug!("clipboard lease released after {} paste(s)", self.pastes);
    }
}
