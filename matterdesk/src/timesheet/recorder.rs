//! Replays timesheet entries into the application's time-entry dialog.

use super::{mark_recorded, TimeEntry};
use crate::config::ms;
use crate::errors::AutomationError;
use crate::fill::{FieldAssignment, FieldFiller};
use crate::keys::Key;
use crate::notify::Notifier;
use crate::session::Session;
use serde::Serialize;
use std::path::Path;
use tracing::{info, instrument, warn};

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordOutcome {
    Committed,
    /// The user declined the entry; the dialog was cancelled and the sheet left untouched.
    Cancelled,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub recorded: usize,
    pub cancelled: bool,
    /// Entries not attempted because the batch stopped early.
    pub remaining: usize,
}

/// The time-entry dialog's explanation field mangles typographic characters.
fn plain_description(description: &str) -> String {
    description
        .replace(['\u{2019}', '\u{2018}'], "'")
        .replace('\u{0153}', "oe")
        .replace('\u{0152}', "OE")
}

fn open_time_entry_dialog(session: &Session) -> Result<(), AutomationError> {
    let t = &session.config().timings;
    session.press(Key::Alt('d'))?;
    session.settle(ms(t.menu_open_ms));
    session.press_times(Key::Down, 3, ms(t.menu_step_ms))?;
    session.press(Key::Enter)?;
    session.settle(ms(t.time_entry_open_ms));
    Ok(())
}

/// Enters one time entry and, once committed, marks its row recorded in `path`.
///
/// With `confirm_before_saving` the user is asked before the dialog is committed; a "no"
/// cancels the dialog and leaves both the application and the spreadsheet unchanged.
#[instrument(skip(session, notifier, entry), fields(row = entry.row_index, matter = %entry.matter))]
pub fn record_entry(
    session: &Session,
    notifier: &dyn Notifier,
    entry: &mut TimeEntry,
    path: &Path,
    confirm_before_saving: bool,
) -> Result<RecordOutcome, AutomationError> {
    let config = session.config();
    let fields = &config.timesheet.fields;
    let description = plain_description(&entry.description);
    let date = entry.date.format(DATE_FORMAT).to_string();
    let rate = config.rates.rate_for(&description).to_string();

    open_time_entry_dialog(session)?;

    // the dialog opens with focus one past the date field, which holds a default date
    session.press(Key::ShiftTab)?;
    session.press(Key::Backspace)?;

    let mut filler = FieldFiller::new(session);
    filler.fill_one(fields.date, &date)?;
    filler.fill_one(fields.matter, &entry.matter)?;
    // the matter lookup repopulates the dialog asynchronously
    session.settle(ms(config.timings.matter_lookup_ms));
    filler.fill(&[
        FieldAssignment::new(fields.hours, entry.hours.clone()),
        FieldAssignment::new(fields.rate, rate),
        FieldAssignment::new(fields.description, description),
    ])?;

    let summary = format!("{} on {} - {}h", entry.client, date, entry.hours);
    if confirm_before_saving && !notifier.confirm(&format!("Confirm time entry for {summary}?")) {
        session.click_button(&config.dialogs.cancel_button)?;
        notifier.warning("Time entry recording cancelled by user.");
        return Ok(RecordOutcome::Cancelled);
    }

    session.click_button(&config.dialogs.ok_button)?;
    mark_recorded(path, entry.row_index, &config.timesheet)?;
    entry.recorded = true;
    info!("Recorded time entry for {}", summary);
    Ok(RecordOutcome::Committed)
}

/// Records every unrecorded entry in order, stopping at the first cancellation.
pub fn record_batch(
    session: &Session,
    notifier: &dyn Notifier,
    entries: &mut [TimeEntry],
    path: &Path,
    confirm_before_saving: bool,
) -> Result<BatchReport, AutomationError> {
    let mut report = BatchReport::default();
    let pending: Vec<usize> = (0..entries.len()).filter(|i| !entries[*i].recorded).collect();

    for (done, i) in pending.iter().enumerate() {
        match record_entry(session, notifier, &mut entries[*i], path, confirm_before_saving)? {
            RecordOutcome::Committed => report.recorded += 1,
            RecordOutcome::Cancelled => {
                report.cancelled = true;
                report.remaining = pending.len() - done - 1;
                warn!("Batch stopped by user, {} entries left", report.remaining);
                break;
            }
        }
    }
    if !report.cancelled && report.recorded > 0 {
        notifier.info(&format!("{} time entries recorded.", report.recorded));
    }
    Ok(report)
}
