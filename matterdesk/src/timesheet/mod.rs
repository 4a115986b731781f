//! Timesheet import: turn a lawyer's monthly spreadsheet into time entries to replay.
//!
//! The spreadsheet is the only record of what has already been entered, so a row counts as
//! recorded when its client cell carries the recorded fill or its status column is set.

pub mod recorder;
pub mod workbook;

use crate::errors::AutomationError;
use chrono::{Duration as DateDelta, NaiveDate};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, instrument};

pub use recorder::{record_batch, record_entry, BatchReport, RecordOutcome};
pub use workbook::{mark_recorded, read_grid, CellContent, GridCell, SheetGrid};

/// Header names (lower case) of the columns the parser needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimesheetColumns {
    pub date: String,
    pub client: String,
    pub matter: String,
    pub description: String,
    pub hours: String,
}

impl Default for TimesheetColumns {
    fn default() -> Self {
        Self {
            date: "date".to_string(),
            client: "client".to_string(),
            matter: "matter".to_string(),
            description: "description".to_string(),
            hours: "time (hours)".to_string(),
        }
    }
}

/// Tab-order positions of the time-entry dialog's fields, counted from the date field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeEntryFields {
    pub date: usize,
    pub matter: usize,
    pub hours: usize,
    pub rate: usize,
    pub description: usize,
}

impl Default for TimeEntryFields {
    fn default() -> Self {
        Self {
            date: 0,
            matter: 1,
            hours: 5,
            rate: 6,
            description: 9,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimesheetLayout {
    pub header_row: u32,
    pub first_data_row: u32,
    /// Fill colour of a recorded client cell, `RRGGBB`.
    pub recorded_color: String,
    /// Header of the machine-readable recorded column.
    pub status_column: String,
    /// Value written to the status column of a recorded row.
    pub recorded_value: String,
    /// Client value of rows that are never billed.
    pub reserved_client: String,
    pub columns: TimesheetColumns,
    pub fields: TimeEntryFields,
}

impl Default for TimesheetLayout {
    fn default() -> Self {
        Self {
            header_row: 1,
            first_data_row: 4,
            recorded_color: "92D050".to_string(),
            status_column: "Recorded".to_string(),
            recorded_value: "yes".to_string(),
            reserved_client: "administration".to_string(),
            columns: TimesheetColumns::default(),
            fields: TimeEntryFields::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeEntry {
    pub date: NaiveDate,
    pub client: String,
    pub matter: String,
    pub description: String,
    /// Hours as written in the sheet, e.g. `1.5`.
    pub hours: String,
    pub recorded: bool,
    /// 1-based spreadsheet row.
    pub row_index: u32,
}

// Excel serial day 0; 1900 leap-year bug included
fn excel_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1899, 12, 30).unwrap_or_default()
}

// 9999-12-31, the last day Excel can display
const MAX_EXCEL_SERIAL: f64 = 2_958_465.0;

fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || !(1.0..=MAX_EXCEL_SERIAL).contains(&serial) {
        return None;
    }
    excel_epoch().checked_add_signed(DateDelta::try_days(serial.trunc() as i64)?)
}

fn is_recorded_marker(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "yes" | "y" | "x" | "true" | "1" | "recorded" | "oui"
    )
}

struct Columns {
    date: u32,
    client: u32,
    matter: u32,
    description: u32,
    hours: u32,
    status: Option<u32>,
}

fn locate_columns(grid: &SheetGrid, layout: &TimesheetLayout) -> Result<Columns, AutomationError> {
    let headers = grid.headers(layout.header_row);
    let find = |name: &str| {
        let key = name.trim().to_lowercase();
        headers.get(&key).copied().ok_or_else(|| {
            AutomationError::Spreadsheet(format!("missing required column: '{name}'"))
        })
    };
    Ok(Columns {
        date: find(&layout.columns.date)?,
        client: find(&layout.columns.client)?,
        matter: find(&layout.columns.matter)?,
        description: find(&layout.columns.description)?,
        hours: find(&layout.columns.hours)?,
        status: headers
            .get(&layout.status_column.trim().to_lowercase())
            .copied(),
    })
}

/// Unrecorded, billable entries of `grid`, sorted by date.
///
/// The date column is filled sparsely: a literal date starts a day, a formula (the sheet's
/// "previous + 1") advances it, and a blank repeats it.
pub fn parse_grid(grid: &SheetGrid, layout: &TimesheetLayout) -> Result<Vec<TimeEntry>, AutomationError> {
    let cols = locate_columns(grid, layout)?;
    let recorded_color = workbook::normalize_rgb(&layout.recorded_color);

    let mut entries = Vec::new();
    let mut current: Option<NaiveDate> = None;

    for row in layout.first_data_row..=grid.max_row() {
        let content = grid
            .cell(cols.date, row)
            .map(|c| c.content.clone())
            .unwrap_or(CellContent::Empty);

        let resolved = match content {
            CellContent::Number(serial) => serial_to_date(serial),
            CellContent::Text(text) => NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").ok(),
            CellContent::Formula(_) => current.and_then(|d| d.succ_opt()),
            CellContent::Empty => current,
        };
        let Some(date) = resolved else {
            debug!("row {}: no date", row);
            continue;
        };
        current = Some(date);

        let client_cell = grid.cell(cols.client, row);
        if client_cell.and_then(|c| c.fill.as_deref()) == Some(recorded_color.as_str()) {
            continue;
        }
        if let Some(status) = cols.status {
            if is_recorded_marker(&grid.text(status, row)) {
                continue;
            }
        }

        let client = grid.text(cols.client, row);
        if client.eq_ignore_ascii_case(&layout.reserved_client) {
            continue;
        }
        let matter = grid.text(cols.matter, row);
        let description = grid.text(cols.description, row);
        let hours = grid.text(cols.hours, row);
        if client.is_empty() || matter.is_empty() || description.is_empty() || hours.is_empty() {
            debug!("row {}: missing required data", row);
            continue;
        }

        entries.push(TimeEntry {
            date,
            client,
            matter,
            description,
            hours,
            recorded: false,
            row_index: row,
        });
    }

    entries.sort_by_key(|e| e.date);
    Ok(entries)
}

/// Reads the workbook at `path` and returns its pending entries.
#[instrument(skip(layout))]
pub fn parse(path: &Path, layout: &TimesheetLayout) -> Result<Vec<TimeEntry>, AutomationError> {
    let grid = read_grid(path)?;
    let entries = parse_grid(&grid, layout)?;
    info!("{} pending time entries in {}", entries.len(), path.display());
    Ok(entries)
}
