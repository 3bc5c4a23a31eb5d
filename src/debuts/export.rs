use rust_xlsxwriter::{Format, Workbook, XlsxError};
use tracing::debug;

use super::presentation::{CellValue, FinalTable};

pub const EXPORT_FILE_NAME: &str = "filtered_debutants.xlsx";
pub const EXPORT_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const EXPORT_SHEET_NAME: &str = "Sheet1";

/// Serialize the final table to xlsx bytes: a bold header row with the
/// display column names, then one row per record with raw values.
pub fn export_xlsx(table: &FinalTable) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let header_fmt = Format::new().set_bold();

    let sheet = workbook.add_worksheet();
    sheet.set_name(EXPORT_SHEET_NAME)?;

    for (col, column) in table.columns.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, column.display_name(), &header_fmt)?;
    }

    for (i, row) in table.rows.iter().enumerate() {
        let row_idx = (i + 1) as u32;
        for (col, value) in row.iter().enumerate() {
            let col = col as u16;
            match value {
                CellValue::Text(s) => {
                    sheet.write_string(row_idx, col, s)?;
                }
                CellValue::Number(n) => {
                    sheet.write_number(row_idx, col, *n)?;
                }
                CellValue::Integer(n) => {
                    sheet.write_number(row_idx, col, *n as f64)?;
                }
                CellValue::Empty => {}
            }
        }
    }

    let bytes = workbook.save_to_buffer()?;
    debug!(
        "Exported {} rows x {} columns ({} bytes)",
        table.rows.len(),
        table.columns.len(),
        bytes.len()
    );
    Ok(bytes)
}
