//! Sweep configuration, loaded once at startup from a TOML file.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::grid::{GridBounds, DEFAULT_STEP};

#[derive(Debug, Clone, Deserialize)]
pub struct SweepConfig {
    pub coordinates: Coordinates,
    pub paths: Paths,
    #[serde(default)]
    pub browser: BrowserOptions,
    #[serde(default)]
    pub selectors: Selectors,
    #[serde(default)]
    pub delays: SettleDelays,
    #[serde(default)]
    pub geocoding: Geocoding,
}

impl SweepConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config: {}", path.display()))?;
        let cfg: SweepConfig = toml::from_str(&raw)
            .with_context(|| format!("parsing config: {}", path.display()))?;
        Ok(cfg)
    }

    pub fn grid_bounds(&self) -> GridBounds {
        GridBounds {
            lat_start: self.coordinates.initial_latitude,
            lat_end: self.coordinates.final_latitude,
            lon_start: self.coordinates.initial_longitude,
            lon_end: self.coordinates.final_longitude,
            step: self.coordinates.step,
        }
    }
}

/// Grid bounds for the sweep: inclusive start, exclusive end.
#[derive(Debug, Clone, Deserialize)]
pub struct Coordinates {
    pub initial_latitude: f64,
    pub initial_longitude: f64,
    pub final_latitude: f64,
    pub final_longitude: f64,
    #[serde(default = "default_step")]
    pub step: f64,
}

fn default_step() -> f64 {
    DEFAULT_STEP
}

#[derive(Debug, Clone, Deserialize)]
pub struct Paths {
    /// URL of the target page carrying the coordinate form and the chart.
    pub page_url: String,
    /// CSV output path; rows are appended to whatever file exists there.
    pub output_csv: PathBuf,
    /// Browser binary to launch. Empty means chromiumoxide's default lookup.
    #[serde(default)]
    pub browser_binary: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BrowserOptions {
    /// The observed tool renders the chart reliably only headful, so the
    /// default keeps the window visible.
    #[serde(default)]
    pub headless: bool,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self { headless: false }
    }
}

/// CSS selectors addressing the remote form and chart elements.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Selectors {
    pub input_lat: String,
    pub input_lon: String,
    pub submit: String,
    pub visualize: String,
    pub no_data: String,
    pub chart: String,
    pub bar: String,
    pub tooltip: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            input_lat: "#inputLat".to_string(),
            input_lon: "#inputLon".to_string(),
            submit: "#btninputLatLon".to_string(),
            visualize: "#btviewPVGridGraph".to_string(),
            no_data: "#tr_nodata".to_string(),
            chart: ".highcharts-series-group".to_string(),
            bar: "rect".to_string(),
            tooltip: ".highcharts-tooltip".to_string(),
        }
    }
}

/// Named settle delays, one per remote-UI operation.
///
/// The target UI updates asynchronously with no readiness signal, so each
/// interaction must be followed by a fixed wait before the result is
/// observable. These are a correctness requirement, not tuning knobs.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SettleDelays {
    /// After initial navigation, before the form is usable.
    pub page_load_ms: u64,
    /// After filling the two coordinate inputs, before clicking submit.
    pub input_settle_ms: u64,
    /// After clicking submit, before the response state is inspectable.
    pub submit_settle_ms: u64,
    /// After clicking visualize, before the chart bars exist.
    pub visualize_settle_ms: u64,
    /// After each successful tooltip read, before the next hover. The
    /// tooltip overlay is a single element mutated in place; hovering again
    /// too fast risks reading the previous bar's text.
    pub hover_settle_ms: u64,
}

impl Default for SettleDelays {
    fn default() -> Self {
        Self {
            page_load_ms: 4000,
            input_settle_ms: 1000,
            submit_settle_ms: 2000,
            visualize_settle_ms: 2000,
            hover_settle_ms: 200,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Geocoding {
    pub base_url: String,
    /// Sent as the User-Agent header; Nominatim requires an identifying one.
    pub user_agent: String,
    pub language: String,
}

impl Default for Geocoding {
    fn default() -> Self {
        Self {
            base_url: "https://nominatim.openstreetmap.org".to_string(),
            user_agent: "gridsweep/0.1 (contact@example.com)".to_string(),
            language: "es".to_string(),
        }
    }
}
