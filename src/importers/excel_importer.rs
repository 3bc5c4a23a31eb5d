use calamine::{Data, Range, Reader, Xlsx};
use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use std::io::Cursor;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Failed to open workbook: {0}")]
    WorkbookOpen(String),

    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    #[error("Sheet {0} has no header row")]
    MissingHeader(String),
}

/// One cell of the source sheet, before any column semantics are applied
#[derive(Debug, Clone, PartialEq)]
pub enum RawCell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
}

/// Header row plus data rows exactly as read from the sheet
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<RawCell>>,
}

/// Reader for the single-sheet debut workbook (header row, then one row per debut)
pub struct ExcelImporter {
    sheet_name: String,
}

impl ExcelImporter {
    pub fn new(sheet_name: impl Into<String>) -> Self {
        Self {
            sheet_name: sheet_name.into(),
        }
    }

    pub fn sheet_name(&self) -> &str {
        &self.sheet_name
    }

    /// Parse the configured sheet from in-memory xlsx bytes
    ///
    /// # Expected Sheet Structure:
    /// ```text
    /// Row 1: source column names (comp_name, country, player_name, ...)
    /// Row 2+: one debut per row
    /// ```
    pub fn parse_bytes(&self, bytes: Vec<u8>) -> Result<RawTable, ImportError> {
        let mut workbook: Xlsx<Cursor<Vec<u8>>> = Xlsx::new(Cursor::new(bytes))
            .map_err(|e| ImportError::WorkbookOpen(e.to_string()))?;

        let range = match workbook.worksheet_range(&self.sheet_name) {
            Ok(range) => range,
            Err(_) => return Err(ImportError::SheetNotFound(self.sheet_name.clone())),
        };

        self.parse_range(&range)
    }

    fn parse_range(&self, range: &Range<Data>) -> Result<RawTable, ImportError> {
        let mut rows = range.rows();

        let headers: Vec<String> = match rows.next() {
            Some(header_row) => header_row.iter().map(header_text).collect(),
            None => return Err(ImportError::MissingHeader(self.sheet_name.clone())),
        };

        if headers.iter().all(|h| h.is_empty()) {
            return Err(ImportError::MissingHeader(self.sheet_name.clone()));
        }
        debug!("Found {} header columns in sheet {}", headers.len(), self.sheet_name);

        let mut table_rows = Vec::new();
        let mut blank_rows = 0;

        for row in rows {
            let cells: Vec<RawCell> = row.iter().map(convert_cell).collect();
            if cells.iter().all(|c| *c == RawCell::Empty) {
                blank_rows += 1;
                continue;
            }
            table_rows.push(cells);
        }

        if blank_rows > 0 {
            warn!("Skipped {} blank rows in sheet {}", blank_rows, self.sheet_name);
        }
        info!(
            "Parsed {} rows from sheet {}",
            table_rows.len(),
            self.sheet_name
        );

        Ok(RawTable {
            headers,
            rows: table_rows,
        })
    }
}

fn header_text(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.trim().to_string(),
        Data::Empty => String::new(),
        other => other.to_string().trim().to_string(),
    }
}

fn convert_cell(cell: &Data) -> RawCell {
    match cell {
        Data::Empty => RawCell::Empty,
        Data::String(s) if s.trim().is_empty() => RawCell::Empty,
        Data::String(s) => RawCell::Text(s.clone()),
        Data::Float(f) => RawCell::Number(*f),
        Data::Int(i) => RawCell::Number(*i as f64),
        Data::Bool(b) => RawCell::Bool(*b),
        Data::DateTime(excel_date) => match excel_date.as_datetime() {
            Some(dt) => RawCell::DateTime(dt),
            None => RawCell::Number(excel_date.as_f64()),
        },
        Data::DateTimeIso(s) => RawCell::Text(s.clone()),
        Data::DurationIso(s) => RawCell::Text(s.clone()),
        // #N/A, #VALUE! and friends carry no usable value
        Data::Error(_) => RawCell::Empty,
    }
}

/// Largest serial Excel can display: 31.12.9999
const MAX_EXCEL_SERIAL: f64 = 2_958_465.0;

/// Convert an Excel serial day number to a date (1900 date system).
/// Serials outside Excel's calendar yield `None`.
pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || !(1.0..=MAX_EXCEL_SERIAL).contains(&serial) {
        return None;
    }
    let base_date = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    base_date.checked_add_signed(TimeDelta::try_days(serial.trunc() as i64)?)
}
