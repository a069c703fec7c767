//! Chart extraction engine.
//!
//! For a cell whose chart rendered, walk the bars in rendered order, hover
//! each one, and read the tooltip overlay strictly after the hover
//! completes. A failed bar is logged and skipped; it never aborts the cell
//! and never touches its siblings. Zero extracted samples is a valid,
//! empty contribution.

use std::time::Duration;
use tracing::{debug, warn};

use crate::driver::{BarHandle, FormDriver};
use crate::grid::Coordinate;

/// Raw text scraped from one bar's tooltip.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedSample {
    pub coord: Coordinate,
    pub tooltip_text: String,
}

/// Extract one sample per bar that yields a readable tooltip.
///
/// The tooltip overlay is a single element the remote UI mutates in place,
/// so after every successful read we wait `hover_settle` before the next
/// hover; a too-fast successive hover risks reading the previous bar's
/// text. Execution is strictly sequential, so the settle delay is the only
/// guard needed.
pub async fn extract_series(
    driver: &mut dyn FormDriver,
    coord: Coordinate,
    bars: &[BarHandle],
    hover_settle: Duration,
) -> Vec<ExtractedSample> {
    let mut samples = Vec::with_capacity(bars.len());

    for &bar in bars {
        if let Err(e) = driver.hover_bar(bar).await {
            warn!(%coord, bar = bar.index(), error = %e, "hover failed, skipping bar");
            continue;
        }
        let text = match driver.read_tooltip().await {
            Ok(text) => text,
            Err(e) => {
                warn!(%coord, bar = bar.index(), error = %e, "tooltip unreadable, skipping bar");
                continue;
            }
        };
        debug!(%coord, bar = bar.index(), "extracted tooltip");
        samples.push(ExtractedSample {
            coord,
            tooltip_text: text,
        });
        tokio::time::sleep(hover_settle).await;
    }

    samples
}
