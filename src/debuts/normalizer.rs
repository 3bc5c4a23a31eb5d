use chrono::{Datelike, NaiveDate};
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

use super::record::{DebutRecord, DebutTable};
use super::schema::{standardize_month, Column, KEY_SEPARATOR};
use crate::importers::excel_importer::{excel_serial_to_date, RawCell, RawTable};

/// Text date layouts seen in the source sheet, tried in order
const DATE_FORMATS: [&str; 6] = [
    "%Y-%m-%d",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%d.%m.%Y",
    "%m/%d/%Y",
    "%b %d, %Y",
];

/// Rename source columns to display columns and derive the computed ones.
///
/// Unmapped source columns are ignored. Unparseable values become `None`;
/// this never fails.
pub fn normalize(raw: &RawTable) -> DebutTable {
    let mapping: Vec<(usize, Column)> = raw
        .headers
        .iter()
        .enumerate()
        .filter_map(|(idx, header)| Column::from_source_name(header).map(|c| (idx, c)))
        .collect();

    let mut columns: BTreeSet<Column> = mapping.iter().map(|(_, c)| *c).collect();
    if columns.contains(&Column::DebutDate) {
        columns.insert(Column::DebutYear);
    }
    if columns.contains(&Column::Competition) {
        columns.insert(Column::CompCountryKey);
        columns.insert(Column::CompCountryLabel);
    }

    let unmapped = raw.headers.len() - mapping.len();
    if unmapped > 0 {
        debug!("{} source columns have no display mapping", unmapped);
    }

    let mut unparsed_dates = 0;
    let records: Vec<DebutRecord> = raw
        .rows
        .iter()
        .map(|row| {
            let record = normalize_row(row, &mapping);
            if record.debut_date.is_none() && has_value(row, &mapping, Column::DebutDate) {
                unparsed_dates += 1;
            }
            record
        })
        .collect();

    if unparsed_dates > 0 {
        warn!("{} debut dates could not be parsed and were set to null", unparsed_dates);
    }
    info!("Normalized {} debut records", records.len());

    DebutTable::new(records, columns)
}

/// Drop rows whose age at debut is negative (or missing) from the working set
pub fn exclude_invalid_ages(table: DebutTable) -> DebutTable {
    if !table.has_column(Column::AgeAtDebut) {
        return table;
    }

    let before = table.len();
    let records: Vec<DebutRecord> = table
        .records()
        .iter()
        .filter(|r| matches!(r.age_at_debut, Some(age) if age >= 0.0))
        .cloned()
        .collect();

    let dropped = before - records.len();
    if dropped > 0 {
        warn!("Excluded {} rows with invalid age at debut", dropped);
    }
    table.with_records(records)
}

fn normalize_row(row: &[RawCell], mapping: &[(usize, Column)]) -> DebutRecord {
    let mut record = DebutRecord::default();

    for (idx, column) in mapping {
        let cell = row.get(*idx).unwrap_or(&RawCell::Empty);
        match column {
            Column::Competition => record.competition = cell_text(cell),
            Column::Country => record.country = cell_text(cell),
            Column::PlayerName => record.player_name = cell_text(cell),
            Column::Position => record.position = cell_text(cell),
            Column::Nationality => record.nationality = cell_text(cell),
            Column::SecondNationality => record.second_nationality = cell_text(cell),
            Column::DebutClub => record.debut_club = cell_text(cell),
            Column::Opponent => record.opponent = cell_text(cell),
            Column::DebutType => record.debut_type = cell_text(cell),
            Column::PlayerUrl => record.player_url = cell_text(cell),
            Column::DebutDate => record.debut_date = cell_date(cell),
            Column::DebutMonth => {
                record.debut_month = cell_text(cell)
                    .as_deref()
                    .and_then(standardize_month)
                    .map(str::to_string)
            }
            Column::AgeAtDebut => record.age_at_debut = cell_number(cell),
            Column::GoalsFor => record.goals_for = cell_integer(cell),
            Column::GoalsAgainst => record.goals_against = cell_integer(cell),
            Column::ValueAtDebut => record.value_at_debut = cell_number(cell),
            Column::CurrentMarketValue => record.current_market_value = cell_number(cell),
            Column::Appearances => record.appearances = cell_integer(cell),
            Column::Goals => record.goals = cell_integer(cell),
            Column::MinutesPlayed => record.minutes_played = cell_integer(cell),
            Column::DebutYear
            | Column::CompCountryKey
            | Column::CompCountryLabel
            | Column::PercentChange => {}
        }
    }

    record.debut_year = record.debut_date.map(|d| d.year());
    record.competition = record
        .competition
        .map(|comp| canonical_competition(comp, record.country.as_deref()));

    if let Some(comp) = &record.competition {
        let country = record.country.as_deref().unwrap_or("");
        record.comp_country_key = Some(competition_key(comp, country));
        record.comp_country_label = Some(competition_label(comp, country));
    }

    record
}

fn has_value(row: &[RawCell], mapping: &[(usize, Column)], column: Column) -> bool {
    mapping
        .iter()
        .find(|(_, c)| *c == column)
        .and_then(|(idx, _)| row.get(*idx))
        .is_some_and(|cell| *cell != RawCell::Empty)
}

/// The German top flight is listed as plain "Bundesliga" in the source
pub fn canonical_competition(competition: String, country: Option<&str>) -> String {
    if competition == "Bundesliga" && country == Some("Germany") {
        "1. Bundesliga".to_string()
    } else {
        competition
    }
}

pub fn competition_key(competition: &str, country: &str) -> String {
    format!("{competition}{KEY_SEPARATOR}{country}")
}

pub fn competition_label(competition: &str, country: &str) -> String {
    format!("{competition} ({country})")
}

/// Invert [`competition_label`]: split on the last `" ("` and drop the
/// closing parenthesis. Labels without that shape are used as-is.
pub fn label_to_key(label: &str) -> String {
    match label.rfind(" (") {
        Some(pos) => {
            let competition = &label[..pos];
            let country = &label[pos + 2..];
            let country = country.strip_suffix(')').unwrap_or(country);
            competition_key(competition, country)
        }
        None => label.to_string(),
    }
}

fn cell_text(cell: &RawCell) -> Option<String> {
    match cell {
        RawCell::Empty => None,
        RawCell::Text(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        RawCell::Number(n) if n.is_finite() && n.fract() == 0.0 => Some(format!("{n:.0}")),
        RawCell::Number(n) if n.is_finite() => Some(n.to_string()),
        RawCell::Number(_) => None,
        RawCell::Bool(b) => Some(b.to_string()),
        RawCell::DateTime(dt) => Some(dt.to_string()),
    }
}

fn cell_number(cell: &RawCell) -> Option<f64> {
    let value = match cell {
        RawCell::Number(n) => Some(*n),
        RawCell::Text(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    value.filter(|v| v.is_finite())
}

fn cell_integer(cell: &RawCell) -> Option<i64> {
    cell_number(cell).map(|n| n.round() as i64)
}

fn cell_date(cell: &RawCell) -> Option<NaiveDate> {
    match cell {
        RawCell::DateTime(dt) => Some(dt.date()),
        RawCell::Number(n) => excel_serial_to_date(*n),
        RawCell::Text(s) => parse_date_text(s),
        _ => None,
    }
}

fn parse_date_text(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    DATE_FORMATS.iter().find_map(|format| {
        NaiveDate::parse_from_str(trimmed, format)
            .ok()
            .or_else(|| {
                chrono::NaiveDateTime::parse_from_str(trimmed, format)
                    .ok()
                    .map(|dt| dt.date())
            })
    })
}
