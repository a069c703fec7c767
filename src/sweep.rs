//! Sweep orchestrator.
//!
//! Drives the whole run: one cell at a time through submit → classify →
//! extract → enrich → append. Per-bar and per-enrichment failures are
//! absorbed below this layer; only driver and sink failures propagate and
//! abort the sweep.

use anyhow::{Context, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::driver::{ChartResponse, FormDriver};
use crate::extract::extract_series;
use crate::geocode::Enricher;
use crate::grid::Coordinate;
use crate::sink::{CsvSink, EnrichedRow};

/// Counters reported at the end of a sweep, so silent partial results are
/// diagnosable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepStats {
    pub cells_total: usize,
    pub cells_no_data: usize,
    pub bars_seen: usize,
    pub bars_extracted: usize,
    pub enrichment_misses: usize,
    pub rows_written: usize,
}

pub struct Sweeper {
    driver: Box<dyn FormDriver>,
    enricher: Box<dyn Enricher>,
    sink: CsvSink,
    hover_settle: Duration,
    cancel: Arc<AtomicBool>,
}

impl Sweeper {
    pub fn new(
        driver: Box<dyn FormDriver>,
        enricher: Box<dyn Enricher>,
        sink: CsvSink,
        hover_settle: Duration,
    ) -> Self {
        Self {
            driver,
            enricher,
            sink,
            hover_settle,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Flag checked between cells; setting it stops the sweep cleanly after
    /// the cell in flight.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Run the sweep over the given cells. The session is closed on both
    /// the success and the error path; there is no resume checkpoint.
    pub async fn run(&mut self, cells: &[Coordinate]) -> Result<SweepStats> {
        let result = self.run_cells(cells).await;
        if let Err(e) = self.driver.close().await {
            warn!(error = %e, "failed to close browser session");
        }
        result
    }

    async fn run_cells(&mut self, cells: &[Coordinate]) -> Result<SweepStats> {
        let mut stats = SweepStats::default();
        info!(cells = cells.len(), "starting sweep");

        for &coord in cells {
            if self.cancel.load(Ordering::SeqCst) {
                info!(processed = stats.cells_total, "sweep cancelled");
                break;
            }
            stats.cells_total += 1;

            self.driver
                .submit(coord)
                .await
                .with_context(|| format!("submitting cell {coord}"))?;
            let response = self
                .driver
                .classify()
                .await
                .with_context(|| format!("classifying cell {coord}"))?;

            let bars = match response {
                ChartResponse::NoData => {
                    info!(%coord, "no data for cell");
                    stats.cells_no_data += 1;
                    continue;
                }
                ChartResponse::SeriesPresent { bars } => bars,
            };
            stats.bars_seen += bars.len();

            let samples =
                extract_series(self.driver.as_mut(), coord, &bars, self.hover_settle).await;
            stats.bars_extracted += samples.len();

            for sample in samples {
                let regions = self.enricher.enrich(sample.coord).await;
                if regions.is_absent() {
                    stats.enrichment_misses += 1;
                }
                let row = EnrichedRow {
                    coord: sample.coord,
                    tooltip_text: sample.tooltip_text,
                    regions,
                };
                self.sink
                    .append(&row)
                    .with_context(|| format!("appending row for cell {coord}"))?;
                stats.rows_written += 1;
            }
        }

        info!(
            cells = stats.cells_total,
            no_data = stats.cells_no_data,
            bars_seen = stats.bars_seen,
            bars_extracted = stats.bars_extracted,
            enrichment_misses = stats.enrichment_misses,
            rows = stats.rows_written,
            "sweep finished"
        );
        Ok(stats)
    }
}
