use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};

use debut_tracker_service::debuts::export::{export_xlsx, EXPORT_FILE_NAME};
use debut_tracker_service::debuts::{self, apply_filters, present, FilterSelection};
use debut_tracker_service::importers::{
    ExcelImporter, FileFetcher, HttpFileFetcher, LocalFileFetcher,
};

#[derive(Parser)]
#[command(name = "export-debutants")]
#[command(about = "Filter the debut workbook and write the result to an xlsx file", long_about = None)]
struct Cli {
    /// Workbook URL (Google Drive share links are accepted)
    #[arg(long, env = "DATA_URL")]
    url: Option<String>,

    /// Path to a local copy of the workbook (takes precedence over --url)
    #[arg(long)]
    file: Option<PathBuf>,

    /// Worksheet to read
    #[arg(long, env = "DATA_SHEET", default_value = "Sheet1")]
    sheet: String,

    /// Competition label, e.g. "1. Bundesliga (Germany)" (repeatable)
    #[arg(long = "competition")]
    competitions: Vec<String>,

    /// Debut month abbreviation, e.g. "Jan" (repeatable)
    #[arg(long = "month")]
    months: Vec<String>,

    /// Debut year (repeatable)
    #[arg(long = "year")]
    years: Vec<String>,

    /// Keep players at most this old at debut
    #[arg(long)]
    max_age: Option<f64>,

    /// Keep players with at least this many minutes
    #[arg(long)]
    min_minutes: Option<i64>,

    /// Download timeout in seconds
    #[arg(long, env = "DOWNLOAD_TIMEOUT_SECS", default_value = "60")]
    timeout: u64,

    /// Output file
    #[arg(short, long, default_value = EXPORT_FILE_NAME)]
    output: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if it exists (ignore errors if not found)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let bytes = match (&cli.file, &cli.url) {
        (Some(path), _) => {
            info!("Reading workbook from {}", path.display());
            LocalFileFetcher::new()
                .fetch(&path.to_string_lossy())
                .await?
        }
        (None, Some(url)) => {
            info!("Downloading workbook from {}", url);
            HttpFileFetcher::new(Duration::from_secs(cli.timeout))?
                .fetch(url)
                .await?
        }
        (None, None) => {
            error!("No workbook source given");
            return Err("either --url (or DATA_URL) or --file is required".into());
        }
    };

    let raw = ExcelImporter::new(cli.sheet.clone()).parse_bytes(bytes)?;
    let table = debuts::prepare(&raw);
    info!("Loaded {} debut records", table.len());

    let selection = FilterSelection {
        competitions: cli.competitions,
        months: cli.months,
        years: cli.years,
        max_age: cli.max_age,
        min_minutes: cli.min_minutes,
    };
    let presented = present(&apply_filters(&table, &selection));
    let count = presented.final_table.len();
    println!("{count} Debütanten");

    if presented.final_table.is_empty() {
        info!("No rows matched; nothing written");
        return Ok(());
    }

    let bytes = export_xlsx(&presented.final_table)?;
    tokio::fs::write(&cli.output, &bytes).await?;
    info!("Wrote {} rows to {}", count, cli.output.display());

    Ok(())
}
