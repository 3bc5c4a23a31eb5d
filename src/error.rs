use crate::importers::downloader::DownloadError;
use crate::importers::excel_importer::ImportError;

/// Failures surfaced to the dashboard user. Each one ends the current render
/// cycle; nothing is retried automatically.
#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error("{0}")]
    Configuration(String),
    #[error("Invalid username or password")]
    Authentication,
    #[error("Error downloading file: {0}")]
    Download(#[from] DownloadError),
    #[error("Error reading Excel file: {0}")]
    Parse(#[from] ImportError),
    #[error("Session not found: {0}")]
    SessionNotFound(String),
    #[error("Please set your filters and click Run before exporting")]
    NotRun,
    #[error("Nothing to export: the filtered table is empty")]
    EmptyExport,
    #[error("Failed to build export workbook: {0}")]
    Export(String),
}

impl DashboardError {
    /// True for the two failures that mean the dataset could not be loaded.
    pub fn is_load_failure(&self) -> bool {
        matches!(self, DashboardError::Download(_) | DashboardError::Parse(_))
    }
}
