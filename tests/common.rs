// Shared fixtures for integration tests: in-memory debut workbooks and a
// fetcher that serves them without touching the network.
#![allow(dead_code)]

use async_trait::async_trait;
use debut_tracker_service::importers::{DownloadError, FileFetcher};
use rust_xlsxwriter::Workbook;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub const SAMPLE_SHEET: &str = "Sheet1";

pub const SAMPLE_HEADERS: [&str; 18] = [
    "comp_name",
    "country",
    "player_name",
    "position",
    "nationality",
    "debut_for",
    "debut_date",
    "age_debut",
    "debut_month",
    "goals_for",
    "goals_against",
    "value_at_debut",
    "player_market_value",
    "appearances",
    "goals",
    "minutes_played",
    "opponent",
    "player_url",
];

#[derive(Debug, Clone)]
pub enum Cell {
    Text(&'static str),
    Number(f64),
    Blank,
}

use Cell::{Blank, Number, Text};

/// Five debuts; the last one has a negative age and never survives loading.
pub fn sample_rows() -> Vec<Vec<Cell>> {
    vec![
        vec![
            Text("Bundesliga"),
            Text("Germany"),
            Text("Jamal Musiala"),
            Text("Midfield"),
            Text("Germany"),
            Text("Bayern Munich"),
            Text("2020-06-20"),
            Number(17.3),
            Text("June"),
            Number(4.0),
            Number(0.0),
            Number(1000.0),
            Number(1500.0),
            Number(150.0),
            Number(40.0),
            Number(9000.0),
            Text("SC Freiburg"),
            Text("https://www.transfermarkt.com/jamal-musiala/profil/spieler/580195"),
        ],
        vec![
            Text("Premier League"),
            Text("England"),
            Text("Ethan Nwaneri"),
            Text("Midfield"),
            Text("England"),
            Text("Arsenal"),
            Text("2020-01-15"),
            Number(18.0),
            Text("jan"),
            Number(3.0),
            Number(1.0),
            Number(2000.0),
            Number(1000.0),
            Number(20.0),
            Number(2.0),
            Number(500.0),
            Text("Brentford"),
            Blank,
        ],
        vec![
            Text("LaLiga"),
            Text("Spain"),
            Text("Lamine Yamal"),
            Text("Attack"),
            Text("Spain"),
            Text("FC Barcelona"),
            Text("2019-01-10"),
            Number(16.5),
            Text("Jan"),
            Number(2.0),
            Number(2.0),
            Number(500.0),
            Blank,
            Number(60.0),
            Number(12.0),
            Number(100.0),
            Text("Real Betis"),
            Text("www.transfermarkt.com/lamine-yamal"),
        ],
        vec![
            Text("Bundesliga"),
            Text("Germany"),
            Text("Paul Wanner"),
            Text("Midfield"),
            Text("Austria"),
            Text("Bayern Munich"),
            Text("2020-02-02"),
            Number(19.0),
            Text("Feb"),
            Number(1.0),
            Number(1.0),
            Number(1000.0),
            Number(1000.0),
            Number(5.0),
            Number(0.0),
            Number(0.0),
            Text("Werder Bremen"),
            Blank,
        ],
        vec![
            Text("Serie A"),
            Text("Italy"),
            Text("Broken Row"),
            Text("Defence"),
            Text("Italy"),
            Text("Inter"),
            Text("2021-03-03"),
            Number(-1.0),
            Text("Mar"),
            Number(0.0),
            Number(0.0),
            Number(0.0),
            Number(0.0),
            Number(0.0),
            Number(0.0),
            Number(0.0),
            Text("Juventus"),
            Blank,
        ],
    ]
}

/// Number of sample rows left after invalid ages are dropped
pub const SAMPLE_LOADED: usize = 4;

pub fn workbook_bytes(headers: &[&str], rows: &[Vec<Cell>]) -> Vec<u8> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(SAMPLE_SHEET).expect("valid sheet name");

    for (col, header) in headers.iter().enumerate() {
        sheet
            .write_string(0, col as u16, *header)
            .expect("write header");
    }
    for (i, row) in rows.iter().enumerate() {
        let row_idx = (i + 1) as u32;
        for (col, cell) in row.iter().enumerate() {
            match cell {
                Cell::Text(s) => {
                    sheet.write_string(row_idx, col as u16, *s).expect("write text");
                }
                Cell::Number(n) => {
                    sheet.write_number(row_idx, col as u16, *n).expect("write number");
                }
                Cell::Blank => {}
            }
        }
    }

    workbook.save_to_buffer().expect("save workbook")
}

pub fn sample_workbook() -> Vec<u8> {
    workbook_bytes(&SAMPLE_HEADERS, &sample_rows())
}

/// Serves fixed bytes (or a fixed failure) and counts calls
#[derive(Clone)]
pub struct MemoryFetcher {
    bytes: Option<Vec<u8>>,
    calls: Arc<AtomicUsize>,
}

impl MemoryFetcher {
    pub fn serving(bytes: Vec<u8>) -> Self {
        Self {
            bytes: Some(bytes),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing() -> Self {
        Self {
            bytes: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FileFetcher for MemoryFetcher {
    async fn fetch(&self, source: &str) -> Result<Vec<u8>, DownloadError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.bytes {
            Some(bytes) => Ok(bytes.clone()),
            None => Err(DownloadError::NotFound(format!("{source} not found on server"))),
        }
    }
}
