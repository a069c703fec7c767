//! Remote form driver boundary.
//!
//! `FormDriver` is the trait seam between the sweep logic and the browser
//! session, so the extraction engine and the orchestrator can run against a
//! scripted mock. The chromiumoxide implementation lives in [`chromium`].

pub mod chromium;
#[cfg(test)]
pub mod mock;

use async_trait::async_trait;
use thiserror::Error;

use crate::grid::Coordinate;

/// Classified state of the remote page after a coordinate submission.
///
/// Absence of the "no data" marker is the normal path to `SeriesPresent`;
/// the classification is an explicit query result, never a thrown fault.
#[derive(Debug, Clone, PartialEq)]
pub enum ChartResponse {
    /// The tool has no series for this cell. Terminal for the cell.
    NoData,
    /// A chart rendered; `bars` are its elements in rendered order.
    SeriesPresent { bars: Vec<BarHandle> },
}

/// Opaque handle to one rendered chart bar.
///
/// Valid only until the next `submit`; carries no identity beyond its
/// position within the cell's response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarHandle(pub(crate) usize);

impl BarHandle {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("failed to launch browser: {0}")]
    Launch(String),
    #[error("browser protocol error: {0}")]
    Cdp(#[from] chromiumoxide::error::CdpError),
    #[error("script evaluation failed: {0}")]
    Script(String),
    #[error("element not found: {0}")]
    MissingElement(String),
    #[error("stale bar handle {0}; bars are valid only until the next submit")]
    StaleBar(usize),
    #[error("tooltip overlay has no text")]
    EmptyTooltip,
}

/// Driving side of the submit/inspect cycle against the remote UI.
///
/// Exclusive `&mut self` access serializes the single browser session by
/// construction; no further locking is needed.
#[async_trait]
pub trait FormDriver: Send {
    /// Fill the latitude/longitude inputs and trigger the query, waiting
    /// out the configured settle delays so the response becomes observable.
    async fn submit(&mut self, coord: Coordinate) -> Result<(), DriverError>;

    /// Inspect the post-submission page. Returns `NoData` when the marker
    /// element is present; otherwise triggers the visualize action (the
    /// chart renders on that click, not before) and collects the bars.
    async fn classify(&mut self) -> Result<ChartResponse, DriverError>;

    /// Simulate a pointer hover over one bar. Per-bar fallible; callers
    /// treat an error as a skip, never as a cell failure.
    async fn hover_bar(&mut self, bar: BarHandle) -> Result<(), DriverError>;

    /// Read the tooltip overlay's current text. Only meaningful strictly
    /// after a completed hover.
    async fn read_tooltip(&mut self) -> Result<String, DriverError>;

    /// Shut down the remote session.
    async fn close(&mut self) -> Result<(), DriverError>;
}
