//! Blind field filling.
//!
//! The target dialogs do not expose stable identifiers for their inputs, so fields are
//! addressed by their position in the dialog's Tab order: starting from the control that
//! has focus when the dialog opens, field `n` is reached after `n` Tab presses.

pub mod label;

use crate::config::ms;
use crate::errors::AutomationError;
use crate::keys::Key;
use crate::session::Session;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

pub use label::{build_label_input_map, fill_by_label, LabelFillReport, LabelInputMap};

/// A value for the control at traversal `index`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldAssignment {
    pub index: usize,
    pub value: String,
}

impl FieldAssignment {
    pub fn new(index: usize, value: impl Into<String>) -> Self {
        Self {
            index,
            value: value.into(),
        }
    }
}

/// Tracks the traversal position across several fill calls on one dialog.
pub struct FieldFiller<'a> {
    session: &'a Session,
    current: usize,
    filled_any: bool,
}

impl<'a> FieldFiller<'a> {
    /// Filler positioned on traversal index 0.
    pub fn new(session: &'a Session) -> Self {
        Self {
            session,
            current: 0,
            filled_any: false,
        }
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    /// Tab counts for each assignment, or an error if the order ever goes backwards.
    ///
    /// The first field may sit on the current index; every later field must be strictly
    /// further along. Nothing is sent when this fails.
    pub fn plan(&self, fields: &[FieldAssignment]) -> Result<Vec<usize>, AutomationError> {
        let mut at = self.current;
        let mut first = !self.filled_any;
        let mut tabs = Vec::with_capacity(fields.len());
        for field in fields {
            let ahead = if first { field.index >= at } else { field.index > at };
            if !ahead {
                return Err(AutomationError::InvalidArgument(format!(
                    "field index {} is not after traversal position {}",
                    field.index, at
                )));
            }
            tabs.push(field.index - at);
            at = field.index;
            first = false;
        }
        Ok(tabs)
    }

    /// Tabs to each field in turn and pastes its value.
    #[instrument(skip(self, fields), fields(count = fields.len()))]
    pub fn fill(&mut self, fields: &[FieldAssignment]) -> Result<(), AutomationError> {
        let tabs = self.plan(fields)?;
        let timings = &self.session.config().timings;
        let tab_settle = ms(timings.tab_key_settle_ms);
        let paste_settle = ms(timings.paste_settle_ms);

        let mut clipboard = self.session.clipboard()?;
        for (field, count) in fields.iter().zip(tabs) {
            self.session.press_times(Key::Tab, count, tab_settle)?;
            clipboard.paste(&field.value)?;
            self.session.settle(paste_settle);
            debug!("filled field {} after {} tab(s)", field.index, count);
            self.current = field.index;
            self.filled_any = true;
        }
        Ok(())
    }

    pub fn fill_one(&mut self, index: usize, value: &str) -> Result<(), AutomationError> {
        self.fill(&[FieldAssignment::new(index, value)])
    }
}

/// Fills `fields` starting from traversal index 0.
pub fn fill_by_index(session: &Session, fields: &[FieldAssignment]) -> Result<(), AutomationError> {
    FieldFiller::new(session).fill(fields)
}
