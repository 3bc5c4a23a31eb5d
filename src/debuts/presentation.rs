use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::cmp::Ordering;
use url::{Host, Url};

use super::record::{DebutRecord, DebutTable};
use super::schema::{Column, DISPLAY_COLUMNS};

const LINK_SCHEMES: [&str; 4] = ["http", "https", "ftp", "ftps"];

static HOSTNAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(localhost|(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+(?:[a-z]{2,63}|xn--[a-z0-9-]{1,59})\.?)$",
    )
    .expect("hostname pattern is valid")
});

/// Underlying value of a displayed cell, used for export
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Integer(i64),
    Empty,
}

/// Background colour applied to a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Highlight {
    None,
    Up,
    Down,
}

impl Highlight {
    pub fn css(self) -> Option<&'static str> {
        match self {
            Highlight::None => None,
            Highlight::Up => Some("background-color: #c6f6d5"),
            Highlight::Down => Some("background-color: #feb2b2"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StyledCell {
    /// Formatted plain text
    pub text: String,
    /// HTML-escaped text, or an anchor for a linked player name
    pub html: String,
    pub highlight: Highlight,
}

/// Final rows and columns with raw values, in display order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinalTable {
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<CellValue>>,
}

impl FinalTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StyledTable {
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<StyledCell>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PresentedTable {
    pub final_table: FinalTable,
    pub styled: StyledTable,
}

/// Sort, select display columns, and format a filtered table.
pub fn present(filtered: &DebutTable) -> PresentedTable {
    let mut records = filtered.records().to_vec();
    sort_by_debut_date_desc(&mut records);

    let columns: Vec<Column> = DISPLAY_COLUMNS
        .iter()
        .copied()
        .filter(|c| filtered.has_column(*c))
        .collect();

    let mut raw_rows = Vec::with_capacity(records.len());
    let mut styled_rows = Vec::with_capacity(records.len());

    for record in &records {
        raw_rows.push(columns.iter().map(|c| raw_value(record, *c)).collect());
        styled_rows.push(columns.iter().map(|c| styled_cell(record, *c)).collect());
    }

    PresentedTable {
        final_table: FinalTable {
            columns: columns.clone(),
            rows: raw_rows,
        },
        styled: StyledTable {
            columns,
            rows: styled_rows,
        },
    }
}

/// Newest debut first; undated rows last, otherwise input order is kept
pub fn sort_by_debut_date_desc(records: &mut [DebutRecord]) {
    records.sort_by(|a, b| match (a.debut_date, b.debut_date) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

fn raw_value(record: &DebutRecord, column: Column) -> CellValue {
    match column {
        Column::DebutDate => text_value(record.debut_date.map(format_date)),
        Column::AgeAtDebut => number_value(record.age_at_debut),
        Column::ValueAtDebut => number_value(record.value_at_debut),
        Column::CurrentMarketValue => number_value(record.current_market_value),
        Column::PercentChange => number_value(record.percent_change),
        Column::DebutYear => record
            .debut_year
            .map_or(CellValue::Empty, |y| CellValue::Integer(y as i64)),
        c if c.is_count() => count_of(record, c).map_or(CellValue::Empty, CellValue::Integer),
        c => text_value(text_of(record, c).map(str::to_string)),
    }
}

fn styled_cell(record: &DebutRecord, column: Column) -> StyledCell {
    let (text, highlight) = match column {
        Column::DebutDate => (record.debut_date.map(format_date).unwrap_or_default(), Highlight::None),
        Column::AgeAtDebut => (
            record.age_at_debut.map(format_age).unwrap_or_default(),
            Highlight::None,
        ),
        Column::ValueAtDebut => (format_money(record.value_at_debut), Highlight::None),
        Column::CurrentMarketValue => (
            format_money(record.current_market_value),
            value_highlight(record.value_at_debut, record.current_market_value),
        ),
        Column::PercentChange => (
            format_percent(record.percent_change),
            percent_highlight(record.percent_change),
        ),
        Column::DebutYear => (
            record.debut_year.map(|y| y.to_string()).unwrap_or_default(),
            Highlight::None,
        ),
        c if c.is_count() => (format_count(count_of(record, c)), Highlight::None),
        c => (text_of(record, c).unwrap_or_default().to_string(), Highlight::None),
    };

    let html = match column {
        Column::PlayerName => player_name_html(
            record.player_name.as_deref(),
            record.player_url.as_deref(),
        ),
        _ => escape_html(&text),
    };

    StyledCell {
        text,
        html,
        highlight,
    }
}

fn text_of(record: &DebutRecord, column: Column) -> Option<&str> {
    let value = match column {
        Column::Competition => &record.competition,
        Column::Country => &record.country,
        Column::PlayerName => &record.player_name,
        Column::Position => &record.position,
        Column::Nationality => &record.nationality,
        Column::SecondNationality => &record.second_nationality,
        Column::DebutClub => &record.debut_club,
        Column::Opponent => &record.opponent,
        Column::DebutType => &record.debut_type,
        Column::DebutMonth => &record.debut_month,
        Column::PlayerUrl => &record.player_url,
        Column::CompCountryKey => &record.comp_country_key,
        Column::CompCountryLabel => &record.comp_country_label,
        _ => return None,
    };
    value.as_deref()
}

fn count_of(record: &DebutRecord, column: Column) -> Option<i64> {
    match column {
        Column::GoalsFor => record.goals_for,
        Column::GoalsAgainst => record.goals_against,
        Column::Appearances => record.appearances,
        Column::Goals => record.goals,
        Column::MinutesPlayed => record.minutes_played,
        _ => None,
    }
}

fn text_value(value: Option<String>) -> CellValue {
    value.map_or(CellValue::Empty, CellValue::Text)
}

fn number_value(value: Option<f64>) -> CellValue {
    value.map_or(CellValue::Empty, CellValue::Number)
}

/// Current value above debut value is green, below is red
pub fn value_highlight(debut: Option<f64>, current: Option<f64>) -> Highlight {
    match (debut, current) {
        (Some(d), Some(c)) if c > d => Highlight::Up,
        (Some(d), Some(c)) if c < d => Highlight::Down,
        _ => Highlight::None,
    }
}

pub fn percent_highlight(change: Option<f64>) -> Highlight {
    match change {
        Some(p) if p > 0.0 => Highlight::Up,
        Some(p) if p < 0.0 => Highlight::Down,
        _ => Highlight::None,
    }
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%d.%m.%Y").to_string()
}

/// `€1,250,000`; missing values render as `€0`
pub fn format_money(value: Option<f64>) -> String {
    match value.filter(|v| v.is_finite()) {
        Some(v) => format!("€{}", group_thousands(v)),
        None => "€0".to_string(),
    }
}

/// Whole counts; missing values render as `0`
pub fn format_count(value: Option<i64>) -> String {
    value.unwrap_or(0).to_string()
}

/// `+12.3%`; missing values render as an empty string
pub fn format_percent(value: Option<f64>) -> String {
    match value.filter(|v| v.is_finite()) {
        Some(v) => format!("{v:+.1}%"),
        None => String::new(),
    }
}

pub fn format_age(age: f64) -> String {
    if age.fract() == 0.0 {
        format!("{age:.0}")
    } else {
        format!("{age:.1}")
    }
}

fn group_thousands(value: f64) -> String {
    let digits = format!("{:.0}", value.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if value < 0.0 && digits != "0" {
        format!("-{grouped}")
    } else {
        grouped
    }
}

/// Strict check for a clickable profile link: http(s)/ftp(s) scheme with
/// `://`, a real hostname or IP, optional port and path, no whitespace.
pub fn is_valid_url(candidate: &str) -> bool {
    if candidate.is_empty() || candidate.chars().any(char::is_whitespace) {
        return false;
    }
    let Ok(url) = Url::parse(candidate) else {
        return false;
    };
    if !LINK_SCHEMES.contains(&url.scheme()) {
        return false;
    }
    let prefix = format!("{}://", url.scheme());
    if !candidate.to_ascii_lowercase().starts_with(&prefix) {
        return false;
    }
    match url.host() {
        Some(Host::Domain(domain)) => HOSTNAME.is_match(domain),
        Some(Host::Ipv4(_)) | Some(Host::Ipv6(_)) => true,
        None => false,
    }
}

fn player_name_html(name: Option<&str>, url: Option<&str>) -> String {
    let name = name.unwrap_or_default();
    match url {
        Some(url) if !name.is_empty() && is_valid_url(url) => format!(
            r#"<a href="{}" target="_blank">{}</a>"#,
            escape_html(url),
            escape_html(name)
        ),
        _ => escape_html(name),
    }
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
