//! Gridsweep binary — sweep a coordinate grid against the configured web
//! tool and append extracted rows to CSV.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tracing::{error, info};

use gridsweep::config::SweepConfig;
use gridsweep::driver::chromium::ChromiumDriver;
use gridsweep::geocode::NominatimClient;
use gridsweep::sink::CsvSink;
use gridsweep::sweep::Sweeper;

/// Success.
const EXIT_OK: i32 = 0;
/// Sweep aborted mid-run (driver or sink write failure).
const EXIT_SWEEP_FAILED: i32 = 1;
/// Configuration unreadable, unparsable, or degenerate grid bounds.
const EXIT_CONFIG: i32 = 2;
/// Browser session could not be opened.
const EXIT_SESSION: i32 = 3;
/// Output sink could not be opened.
const EXIT_SINK: i32 = 4;

#[derive(Parser, Debug)]
#[command(name = "gridsweep", version, about = "Grid sweep chart extractor")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Run the browser headless regardless of the configured value.
    #[arg(long)]
    headless: bool,

    /// Override the configured CSV output path.
    #[arg(long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("gridsweep=info".parse().unwrap()),
        )
        .init();

    std::process::exit(run(cli).await);
}

async fn run(cli: Cli) -> i32 {
    let mut config = match SweepConfig::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %format!("{e:#}"), "configuration error");
            return EXIT_CONFIG;
        }
    };
    if cli.headless {
        config.browser.headless = true;
    }
    if let Some(output) = cli.output {
        config.paths.output_csv = output;
    }

    let cells = match config.grid_bounds().generate() {
        Ok(cells) => cells,
        Err(e) => {
            error!(error = %e, "invalid grid bounds");
            return EXIT_CONFIG;
        }
    };
    info!(
        cells = cells.len(),
        lat_start = config.coordinates.initial_latitude,
        lon_start = config.coordinates.initial_longitude,
        "grid generated"
    );

    let sink = match CsvSink::open(&config.paths.output_csv) {
        Ok(sink) => sink,
        Err(e) => {
            error!(error = %e, "failed to open output sink");
            return EXIT_SINK;
        }
    };

    let enricher = match NominatimClient::new(&config.geocoding) {
        Ok(client) => client,
        Err(e) => {
            error!(error = %e, "failed to build geocoding client");
            return EXIT_CONFIG;
        }
    };

    let driver = match ChromiumDriver::launch(&config).await {
        Ok(driver) => driver,
        Err(e) => {
            error!(error = %e, "failed to open browser session");
            return EXIT_SESSION;
        }
    };

    let mut sweeper = Sweeper::new(
        Box::new(driver),
        Box::new(enricher),
        sink,
        Duration::from_millis(config.delays.hover_settle_ms),
    );

    let cancel = sweeper.cancel_flag();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        info!("received shutdown signal, stopping after current cell");
        cancel.store(true, Ordering::SeqCst);
    });

    match run_sweep(&mut sweeper, &cells).await {
        Ok(()) => EXIT_OK,
        Err(e) => {
            error!(error = %format!("{e:#}"), "sweep aborted");
            EXIT_SWEEP_FAILED
        }
    }
}

async fn run_sweep(sweeper: &mut Sweeper, cells: &[gridsweep::Coordinate]) -> Result<()> {
    let stats = sweeper.run(cells).await?;
    info!(
        rows = stats.rows_written,
        no_data_cells = stats.cells_no_data,
        "done"
    );
    Ok(())
}
