use super::record::{DebutRecord, DebutTable};
use super::schema::Column;

/// Relative change from `baseline` to `current`, in percent.
///
/// `None` unless both values are present, finite, and the baseline is nonzero.
pub fn percent_change(baseline: Option<f64>, current: Option<f64>) -> Option<f64> {
    match (baseline, current) {
        (Some(b), Some(c)) if b.is_finite() && c.is_finite() && b != 0.0 => {
            Some((c - b) / b * 100.0)
        }
        _ => None,
    }
}

/// Attach the debut-to-current market value change to every row
pub fn with_percent_change(table: DebutTable) -> DebutTable {
    let mut columns = table.columns().clone();
    columns.insert(Column::PercentChange);

    let records = table
        .into_records()
        .into_iter()
        .map(|record| DebutRecord {
            percent_change: percent_change(record.value_at_debut, record.current_market_value),
            ..record
        })
        .collect();

    DebutTable::new(records, columns)
}
