use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use tracing::debug;

use super::normalizer::label_to_key;
use super::record::{DebutRecord, DebutTable};
use super::schema::{Column, MONTHS};

/// Selecting this in a multi-select dimension disables that dimension
pub const ALL: &str = "All";

/// Age slider range when the table offers nothing to measure
pub const FALLBACK_AGE_BOUNDS: SliderBounds = SliderBounds {
    min: 0,
    max: 100,
    default: 100,
};

/// Minutes slider range when the table offers nothing to measure
pub const FALLBACK_MINUTES_BOUNDS: SliderBounds = SliderBounds {
    min: 0,
    max: 0,
    default: 0,
};

/// User-chosen filter values, as submitted by the dashboard form.
///
/// Empty lists and `None` thresholds leave their dimension unrestricted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSelection {
    /// Competition labels, e.g. `"1. Bundesliga (Germany)"`
    pub competitions: Vec<String>,
    pub months: Vec<String>,
    /// Year labels; non-numeric entries are ignored
    pub years: Vec<String>,
    pub max_age: Option<f64>,
    pub min_minutes: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SliderBounds {
    pub min: i64,
    pub max: i64,
    pub default: i64,
}

/// Selectable values for every filter dimension, computed from the loaded table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterOptions {
    pub competitions: Vec<String>,
    pub months: Vec<String>,
    pub years: Vec<String>,
    pub age: SliderBounds,
    pub minutes: SliderBounds,
}

/// Compiled form of a [`FilterSelection`]; `None` means "dimension off".
#[derive(Debug, Clone, Default)]
struct Criteria {
    competition_keys: Option<HashSet<String>>,
    months: Option<HashSet<String>>,
    years: Option<HashSet<i32>>,
    max_age: Option<f64>,
    min_minutes: Option<i64>,
}

impl Criteria {
    fn compile(selection: &FilterSelection, table: &DebutTable) -> Self {
        Criteria {
            competition_keys: active(&selection.competitions, table.has_column(Column::CompCountryKey))
                .map(|labels| labels.iter().map(|l| label_to_key(l)).collect()),
            months: active(&selection.months, table.has_column(Column::DebutMonth))
                .map(|months| months.iter().cloned().collect()),
            years: active(&selection.years, table.has_column(Column::DebutYear)).map(|years| {
                years
                    .iter()
                    .filter_map(|y| y.trim().parse::<i32>().ok())
                    .collect()
            }),
            max_age: selection
                .max_age
                .filter(|_| table.has_column(Column::AgeAtDebut)),
            min_minutes: selection
                .min_minutes
                .filter(|_| table.has_column(Column::MinutesPlayed)),
        }
    }

    fn matches(&self, record: &DebutRecord) -> bool {
        if let Some(keys) = &self.competition_keys {
            if !record.comp_country_key.as_ref().is_some_and(|k| keys.contains(k)) {
                return false;
            }
        }
        if let Some(months) = &self.months {
            if !record.debut_month.as_ref().is_some_and(|m| months.contains(m)) {
                return false;
            }
        }
        if let Some(years) = &self.years {
            if !record.debut_year.is_some_and(|y| years.contains(&y)) {
                return false;
            }
        }
        if let Some(max_age) = self.max_age {
            if !record.age_at_debut.is_some_and(|age| age <= max_age) {
                return false;
            }
        }
        if let Some(min_minutes) = self.min_minutes {
            if !record.minutes_played.is_some_and(|m| m >= min_minutes) {
                return false;
            }
        }
        true
    }
}

/// A multi-select dimension is active when something is selected and "All" is not
fn active(selected: &[String], column_present: bool) -> Option<&[String]> {
    if !column_present || selected.is_empty() || selected.iter().any(|s| s == ALL) {
        None
    } else {
        Some(selected)
    }
}

/// Rows satisfying every active dimension (AND across, OR within).
///
/// Returns a new table; `table` is left untouched.
pub fn apply_filters(table: &DebutTable, selection: &FilterSelection) -> DebutTable {
    let criteria = Criteria::compile(selection, table);
    let records: Vec<DebutRecord> = table
        .records()
        .iter()
        .filter(|r| criteria.matches(r))
        .cloned()
        .collect();

    debug!(
        "Filters kept {} of {} rows",
        records.len(),
        table.len()
    );
    table.with_records(records)
}

/// Build the choices offered by each filter widget
pub fn filter_options(table: &DebutTable) -> FilterOptions {
    let records = table.records();

    let labels: BTreeSet<&str> = records
        .iter()
        .filter_map(|r| r.comp_country_label.as_deref())
        .collect();

    let present_months: HashSet<&str> = records
        .iter()
        .filter_map(|r| r.debut_month.as_deref())
        .collect();
    // Calendar order, not alphabetical
    let months: Vec<&str> = MONTHS
        .iter()
        .copied()
        .filter(|m| present_months.contains(m))
        .collect();

    let years: BTreeSet<i32> = records.iter().filter_map(|r| r.debut_year).collect();

    FilterOptions {
        competitions: with_all(labels.into_iter().map(str::to_string)),
        months: with_all(months.into_iter().map(str::to_string)),
        years: with_all(years.into_iter().map(|y| y.to_string())),
        age: age_bounds(table),
        minutes: minutes_bounds(table),
    }
}

fn with_all(values: impl Iterator<Item = String>) -> Vec<String> {
    std::iter::once(ALL.to_string()).chain(values).collect()
}

fn age_bounds(table: &DebutTable) -> SliderBounds {
    let ages: Vec<f64> = table.records().iter().filter_map(|r| r.age_at_debut).collect();
    if ages.is_empty() {
        return FALLBACK_AGE_BOUNDS;
    }
    let min = ages.iter().copied().fold(f64::INFINITY, f64::min).trunc() as i64;
    let max = ages.iter().copied().fold(f64::NEG_INFINITY, f64::max).trunc() as i64;
    SliderBounds {
        min,
        max,
        default: max,
    }
}

fn minutes_bounds(table: &DebutTable) -> SliderBounds {
    match table.records().iter().filter_map(|r| r.minutes_played).max() {
        Some(max) => SliderBounds {
            min: 0,
            max: max.max(0),
            default: 0,
        },
        None => FALLBACK_MINUTES_BOUNDS,
    }
}
