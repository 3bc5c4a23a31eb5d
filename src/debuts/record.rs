use chrono::NaiveDate;
use std::collections::BTreeSet;

use super::schema::Column;

/// One player's debut, with display-name fields and derived values
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DebutRecord {
    pub competition: Option<String>,
    pub country: Option<String>,
    pub player_name: Option<String>,
    pub position: Option<String>,
    pub nationality: Option<String>,
    pub second_nationality: Option<String>,
    pub debut_club: Option<String>,
    pub opponent: Option<String>,
    pub debut_type: Option<String>,
    pub debut_date: Option<NaiveDate>,
    pub debut_month: Option<String>,
    pub age_at_debut: Option<f64>,
    pub goals_for: Option<i64>,
    pub goals_against: Option<i64>,
    pub value_at_debut: Option<f64>,
    pub current_market_value: Option<f64>,
    pub appearances: Option<i64>,
    pub goals: Option<i64>,
    pub minutes_played: Option<i64>,
    pub player_url: Option<String>,

    // Derived on load, never set independently
    pub debut_year: Option<i32>,
    pub comp_country_key: Option<String>,
    pub comp_country_label: Option<String>,
    pub percent_change: Option<f64>,
}

/// The working set: normalized records plus the columns the source provided.
///
/// Cached and shared read-only; filtering and formatting produce new tables.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DebutTable {
    records: Vec<DebutRecord>,
    columns: BTreeSet<Column>,
}

impl DebutTable {
    pub fn new(records: Vec<DebutRecord>, columns: BTreeSet<Column>) -> Self {
        Self { records, columns }
    }

    pub fn records(&self) -> &[DebutRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<DebutRecord> {
        self.records
    }

    pub fn columns(&self) -> &BTreeSet<Column> {
        &self.columns
    }

    pub fn has_column(&self, column: Column) -> bool {
        self.columns.contains(&column)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Same columns, different rows
    pub fn with_records(&self, records: Vec<DebutRecord>) -> Self {
        Self {
            records,
            columns: self.columns.clone(),
        }
    }
}
