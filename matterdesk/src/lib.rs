//! Accessibility-driven automation of a legacy practice-management desktop application
//!
//! The application has no API. Everything here works through what a person at the desk
//! would use: window titles, keyboard focus, the clipboard and the pixels on screen.
//! Matter intake is blind-filled by Tab position, tabbed dialogs are navigated with the
//! focus-shift shortcut, destructive actions are gated on an OCR read of the balances, and
//! timesheets are replayed entry by entry with the spreadsheet kept as the record.

pub mod calendar;
pub mod cleanup;
pub mod clipboard;
pub mod clock;
pub mod config;
pub mod element;
pub mod errors;
pub mod fill;
pub mod keys;
pub mod matter;
pub mod navigator;
pub mod notify;
pub mod ocr;
pub mod payload;
pub mod platforms;
pub mod session;
#[cfg(test)]
mod tests;
pub mod timesheet;

pub use calendar::{CalendarEvent, CalendarSource, JsonCalendarSource, ProposedSlot};
pub use clock::{wait_until, Clock, FakeClock, SystemClock};
pub use config::AutomationConfig;
pub use element::{Bounds, UIElement, UIElementImpl};
pub use errors::AutomationError;
pub use fill::{fill_by_index, FieldAssignment, FieldFiller};
pub use keys::{Direction, Key};
pub use navigator::{DialogNavigator, NavOutcome, TabMarkers, TabState};
pub use notify::{ConsoleNotifier, Notifier};
pub use ocr::{Amount, BalanceLabel, FinancialSnapshot};
pub use payload::Payload;
pub use platforms::{create_engine, AccessibilityEngine};
pub use session::Session;
pub use timesheet::{TimeEntry, TimesheetLayout};

/// Holds the screenshot data
#[derive(Debug, Clone)]
pub struct ScreenshotResult {
    /// Raw image data (RGBA)
    pub image_data: Vec<u8>,
    /// Width of the image
    pub width: u32,
    /// Height of the image
    pub height: u32,
}
