//! Spreadsheet access for timesheets.
//!
//! Everything that touches `umya_spreadsheet` is kept in this file. The rest of the module
//! works on [`SheetGrid`], a plain snapshot of the active sheet.

use super::TimesheetLayout;
use crate::errors::AutomationError;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

/// What a cell holds, as far as timesheet parsing cares.
#[derive(Debug, Clone, PartialEq)]
pub enum CellContent {
    Empty,
    Number(f64),
    Text(String),
    /// Formula source without the leading `=`.
    Formula(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct GridCell {
    pub content: CellContent,
    /// Solid fill colour as `RRGGBB` (alpha stripped), upper case.
    pub fill: Option<String>,
}

impl GridCell {
    /// Display text of a value cell; empty for formulas and blanks.
    pub fn text(&self) -> String {
        match &self.content {
            CellContent::Empty | CellContent::Formula(_) => String::new(),
            CellContent::Number(n) => format_number(*n),
            CellContent::Text(t) => t.trim().to_string(),
        }
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// Snapshot of a worksheet keyed by 1-based `(column, row)`.
#[derive(Debug, Clone, Default)]
pub struct SheetGrid {
    cells: HashMap<(u32, u32), GridCell>,
    max_row: u32,
    max_col: u32,
}

impl SheetGrid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, col: u32, row: u32, content: CellContent) -> &mut Self {
        let cell = self.cells.entry((col, row)).or_insert(GridCell {
            content: CellContent::Empty,
            fill: None,
        });
        cell.content = content;
        self.max_row = self.max_row.max(row);
        self.max_col = self.max_col.max(col);
        self
    }

    pub fn set_fill(&mut self, col: u32, row: u32, rgb: &str) -> &mut Self {
        let cell = self.cells.entry((col, row)).or_insert(GridCell {
            content: CellContent::Empty,
            fill: None,
        });
        cell.fill = Some(normalize_rgb(rgb));
        self.max_row = self.max_row.max(row);
        self.max_col = self.max_col.max(col);
        self
    }

    pub fn cell(&self, col: u32, row: u32) -> Option<&GridCell> {
        self.cells.get(&(col, row))
    }

    pub fn text(&self, col: u32, row: u32) -> String {
        self.cell(col, row).map(GridCell::text).unwrap_or_default()
    }

    pub fn max_row(&self) -> u32 {
        self.max_row
    }

    /// Lower-cased, trimmed header text to 1-based column.
    pub fn headers(&self, header_row: u32) -> HashMap<String, u32> {
        let mut headers = HashMap::new();
        for col in 1..=self.max_col {
            let name = self.text(col, header_row).to_lowercase();
            if !name.is_empty() {
                headers.entry(name).or_insert(col);
            }
        }
        headers
    }
}

/// `FF92D050` and `92d050` both become `92D050`.
pub fn normalize_rgb(color: &str) -> String {
    let upper = color.trim().trim_start_matches('#').to_uppercase();
    if upper.len() == 8 {
        upper[2..].to_string()
    } else {
        upper
    }
}

fn spreadsheet_err(path: &Path, e: impl std::fmt::Display) -> AutomationError {
    AutomationError::Spreadsheet(format!("{}: {e}", path.display()))
}

/// Reads the active sheet of the workbook at `path`.
pub fn read_grid(path: &Path) -> Result<SheetGrid, AutomationError> {
    let book = umya_spreadsheet::reader::xlsx::read(path).map_err(|e| spreadsheet_err(path, e))?;
    let sheet = book.get_active_sheet();

    let mut grid = SheetGrid::new();
    let max_row = sheet.get_highest_row();
    let max_col = sheet.get_highest_column();
    for row in 1..=max_row {
        for col in 1..=max_col {
            let Some(cell) = sheet.get_cell((col, row)) else {
                continue;
            };
            let formula = cell.get_formula().to_string();
            let value = cell.get_value().to_string();
            let content = if !formula.is_empty() {
                CellContent::Formula(formula.trim_start_matches('=').to_string())
            } else if value.trim().is_empty() {
                CellContent::Empty
            } else if let Ok(n) = value.trim().parse::<f64>() {
                CellContent::Number(n)
            } else {
                CellContent::Text(value)
            };
            grid.set(col, row, content);

            if let Some(color) = cell.get_style().get_background_color() {
                let argb = color.get_argb().to_string();
                if !argb.is_empty() {
                    grid.set_fill(col, row, &argb);
                }
            }
        }
    }
    debug!(
        "read {} rows x {} columns from {}",
        max_row,
        max_col,
        path.display()
    );
    Ok(grid)
}

/// Marks row `row` as recorded in the workbook at `path` and saves it in place.
///
/// The client cell gets the recorded fill and the status column gets a value; the status
/// column is created after the last header when the sheet does not have one yet.
pub fn mark_recorded(path: &Path, row: u32, layout: &TimesheetLayout) -> Result<(), AutomationError> {
    let mut book =
        umya_spreadsheet::reader::xlsx::read(path).map_err(|e| spreadsheet_err(path, e))?;
    let sheet = book.get_active_sheet_mut();

    let header_row = layout.header_row;
    let client_name = layout.columns.client.trim().to_lowercase();
    let status_name = layout.status_column.trim().to_lowercase();
    let mut client_col = None;
    let mut status_col = None;
    let max_col = sheet.get_highest_column();
    for col in 1..=max_col {
        let name = sheet.get_value((col, header_row)).trim().to_lowercase();
        if name == client_name && client_col.is_none() {
            client_col = Some(col);
        }
        if name == status_name && status_col.is_none() {
            status_col = Some(col);
        }
    }
    let client_col = client_col.ok_or_else(|| {
        AutomationError::Spreadsheet(format!("no '{}' column in {}", layout.columns.client, path.display()))
    })?;
    let status_col = match status_col {
        Some(col) => col,
        None => {
            let col = max_col + 1;
            sheet
                .get_cell_mut((col, header_row))
                .set_value(layout.status_column.clone());
            col
        }
    };

    sheet
        .get_cell_mut((client_col, row))
        .get_style_mut()
        .set_background_color(format!("FF{}", normalize_rgb(&layout.recorded_color)));
    sheet
        .get_cell_mut((status_col, row))
        .set_value(layout.recorded_value.clone());

    umya_spreadsheet::writer::xlsx::write(&book, path).map_err(|e| spreadsheet_err(path, e))?;
    info!("Marked row {} of {} as recorded", row, path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_rgb() {
        assert_eq!(normalize_rgb("FF92D050"), "92D050");
        assert_eq!(normalize_rgb("#92d050"), "92D050");
    }

    #[test]
    fn test_headers_are_case_insensitive() {
        let mut grid = SheetGrid::new();
        grid.set(1, 1, CellContent::Text(" Date ".into()))
            .set(2, 1, CellContent::Text("CLIENT".into()));
        let headers = grid.headers(1);
        assert_eq!(headers.get("date"), Some(&1));
        assert_eq!(headers.get("client"), Some(&2));
    }

    #[test]
    fn test_number_text() {
        let cell = GridCell {
            content: CellContent::Number(1.5),
            fill: None,
        };
        assert_eq!(cell.text(), "1.5");
        let whole = GridCell {
            content: CellContent::Number(2.0),
            fill: None,
        };
        assert_eq!(whole.text(), "2");
    }
}
