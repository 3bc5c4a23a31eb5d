// Debut table pipeline
//
// raw sheet -> normalizer (rename, derive) -> metrics (% change) -> age check
//           -> filter -> presentation (sort, format, style) -> export

pub mod export;
pub mod filter;
pub mod metrics;
pub mod normalizer;
pub mod presentation;
pub mod record;
pub mod schema;

pub use filter::{apply_filters, filter_options, FilterOptions, FilterSelection, ALL};
pub use presentation::{present, CellValue, FinalTable, Highlight, PresentedTable, StyledCell};
pub use record::{DebutRecord, DebutTable};
pub use schema::Column;

use crate::importers::excel_importer::RawTable;

/// Build the working set from a freshly read sheet
pub fn prepare(raw: &RawTable) -> DebutTable {
    let table = normalizer::normalize(raw);
    let table = metrics::with_percent_change(table);
    normalizer::exclude_invalid_ages(table)
}
