//! Librarius - Library Circulation Manager
//!
//! Works, physical copies, members and loans persisted to flat JSON files,
//! driven through an interactive text menu or a scripted self-test.

use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use clap::{Parser, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use librarius::clock::Clock;
use librarius::config::AppConfig;
use librarius::repository::Catalog;
use librarius::services::LibraryService;
use librarius::shell::{self, Shell};

#[derive(Parser)]
#[command(name = "librarius", about = "Library circulation manager")]
struct Cli {
    /// Interactive menu or scripted self-test.
    #[arg(long, value_enum, default_value = "interactive")]
    mode: Mode,

    /// Virtual today (YYYY-MM-DD); defaults to the calendar date.
    #[arg(long)]
    today: Option<NaiveDate>,

    /// Data directory for the persisted collections.
    #[arg(long, env = "LIBRARIUS_DATA_DIR")]
    data_dir: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    Interactive,
    Selftest,
}

fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().expect("Failed to load configuration");

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("librarius={}", config.logging.level).into());

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Librarius v{}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();

    let calendar_today = Local::now().date_naive();
    let today = cli.today.unwrap_or(calendar_today);

    let mut data_dir = cli
        .data_dir
        .unwrap_or_else(|| PathBuf::from(&config.storage.data_dir));
    if matches!(cli.mode, Mode::Selftest) {
        // The self-test never touches the live data set.
        data_dir = data_dir.join("_selftest");
    }

    let catalog = Catalog::open_with_seed(&data_dir, Path::new(&config.storage.seed_file))?;
    tracing::info!("catalog loaded from {}", data_dir.display());

    let clock = Clock::new(today);
    let (mut service, report) = LibraryService::boot(catalog, clock, &config.circulation)?;
    if !report.is_clean() {
        tracing::info!("integrity pass repaired {} record(s)", report.total());
    }

    match cli.mode {
        Mode::Interactive => Shell::new(service, config.admin.clone(), calendar_today).run()?,
        Mode::Selftest => {
            // The self-test reports problems but never changes the exit status.
            if let Err(e) = shell::run_selftest(&mut service) {
                tracing::error!("self-test failed: {e}");
            }
        }
    }

    Ok(())
}
