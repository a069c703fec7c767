//! Gridsweep — drive an interactive charting web tool over a lat/lon grid.
//!
//! The sweep visits every cell of a rectangular coordinate grid, submits the
//! coordinate to a remote form, classifies the response as "no data" or a
//! rendered bar chart, hovers each bar to read its tooltip, enriches the
//! coordinate with administrative-region names, and appends one CSV row per
//! extracted bar.

pub mod config;
pub mod driver;
pub mod extract;
pub mod geocode;
pub mod grid;
pub mod sink;
pub mod sweep;

pub use config::SweepConfig;
pub use driver::{ChartResponse, FormDriver};
pub use grid::Coordinate;
pub use sweep::{SweepStats, Sweeper};
