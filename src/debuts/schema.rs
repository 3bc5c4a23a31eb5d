/// Column vocabulary for the debut table
///
/// Source sheets use snake_case names (`comp_name`, `debut_for`, ...). Every
/// downstream stage works with the display names below.
use serde::{Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Column {
    Competition,
    Country,
    PlayerName,
    Position,
    Nationality,
    SecondNationality,
    DebutClub,
    DebutDate,
    AgeAtDebut,
    DebutMonth,
    GoalsFor,
    GoalsAgainst,
    ValueAtDebut,
    CurrentMarketValue,
    Appearances,
    Goals,
    MinutesPlayed,
    DebutType,
    Opponent,
    PlayerUrl,
    // Derived
    DebutYear,
    CompCountryKey,
    CompCountryLabel,
    PercentChange,
}

/// Source column name -> display column
pub const SOURCE_COLUMNS: [(&str, Column); 20] = [
    ("comp_name", Column::Competition),
    ("country", Column::Country),
    ("player_name", Column::PlayerName),
    ("position", Column::Position),
    ("nationality", Column::Nationality),
    ("second_nationality", Column::SecondNationality),
    ("debut_for", Column::DebutClub),
    ("debut_date", Column::DebutDate),
    ("age_debut", Column::AgeAtDebut),
    ("debut_month", Column::DebutMonth),
    ("goals_for", Column::GoalsFor),
    ("goals_against", Column::GoalsAgainst),
    ("value_at_debut", Column::ValueAtDebut),
    ("player_market_value", Column::CurrentMarketValue),
    ("appearances", Column::Appearances),
    ("goals", Column::Goals),
    ("minutes_played", Column::MinutesPlayed),
    ("debut_type", Column::DebutType),
    ("opponent", Column::Opponent),
    ("player_url", Column::PlayerUrl),
];

/// Output columns in display order. Absent columns are skipped, not required.
pub const DISPLAY_COLUMNS: [Column; 16] = [
    Column::Competition,
    Column::PlayerName,
    Column::Position,
    Column::Nationality,
    Column::DebutClub,
    Column::Opponent,
    Column::DebutDate,
    Column::AgeAtDebut,
    Column::GoalsFor,
    Column::GoalsAgainst,
    Column::Appearances,
    Column::Goals,
    Column::MinutesPlayed,
    Column::ValueAtDebut,
    Column::CurrentMarketValue,
    Column::PercentChange,
];

pub const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Joins competition and country in the composite key
pub const KEY_SEPARATOR: &str = "||";

impl Column {
    pub fn display_name(self) -> &'static str {
        match self {
            Column::Competition => "Competition",
            Column::Country => "Country",
            Column::PlayerName => "Player Name",
            Column::Position => "Position",
            Column::Nationality => "Nationality",
            Column::SecondNationality => "Second Nationality",
            Column::DebutClub => "Debut Club",
            Column::DebutDate => "Debut Date",
            Column::AgeAtDebut => "Age at Debut",
            Column::DebutMonth => "Debut Month",
            Column::GoalsFor => "Goals For",
            Column::GoalsAgainst => "Goals Against",
            Column::ValueAtDebut => "Value at Debut",
            Column::CurrentMarketValue => "Current Market Value",
            Column::Appearances => "Appearances",
            Column::Goals => "Goals",
            Column::MinutesPlayed => "Minutes Played",
            Column::DebutType => "Debut Type",
            Column::Opponent => "Opponent",
            Column::PlayerUrl => "Player URL",
            Column::DebutYear => "Debut Year",
            Column::CompCountryKey => "CompCountryID",
            Column::CompCountryLabel => "Competition (Country)",
            Column::PercentChange => "% Change",
        }
    }

    /// Map a raw header to its display column. Headers are matched exactly
    /// after trimming.
    pub fn from_source_name(name: &str) -> Option<Column> {
        let name = name.trim();
        SOURCE_COLUMNS
            .iter()
            .find(|(source, _)| *source == name)
            .map(|(_, column)| *column)
    }

    pub fn is_money(self) -> bool {
        matches!(self, Column::ValueAtDebut | Column::CurrentMarketValue)
    }

    pub fn is_count(self) -> bool {
        matches!(
            self,
            Column::GoalsFor
                | Column::GoalsAgainst
                | Column::Appearances
                | Column::Goals
                | Column::MinutesPlayed
        )
    }
}

impl Serialize for Column {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.display_name())
    }
}

/// Canonical `Jan`..`Dec` form of a month string: trimmed, case-folded,
/// full names shortened. Anything outside the calendar yields `None`.
pub fn standardize_month(raw: &str) -> Option<&'static str> {
    let trimmed = raw.trim();
    let prefix: String = trimmed.chars().take(3).collect::<String>().to_lowercase();
    if prefix.chars().count() < 3 {
        return None;
    }
    let month = MONTHS
        .iter()
        .find(|m| m.to_lowercase() == prefix)
        .copied()?;

    // "Janitor" must not become "Jan": the rest has to spell the full name
    let full = full_month_name(month);
    let lower = trimmed.to_lowercase();
    if lower.len() == 3 || full.starts_with(lower.trim_end_matches('.')) {
        Some(month)
    } else {
        None
    }
}

fn full_month_name(month: &str) -> &'static str {
    match month {
        "Jan" => "january",
        "Feb" => "february",
        "Mar" => "march",
        "Apr" => "april",
        "May" => "may",
        "Jun" => "june",
        "Jul" => "july",
        "Aug" => "august",
        "Sep" => "september",
        "Oct" => "october",
        "Nov" => "november",
        _ => "december",
    }
}
