//! Workbook acquisition: fetching the debut spreadsheet and reading its sheet

pub mod downloader;
pub mod excel_importer;

// Re-export commonly used items
pub use downloader::{DownloadError, FileFetcher, HttpFileFetcher, LocalFileFetcher};
pub use excel_importer::{ExcelImporter, ImportError, RawCell, RawTable};
