//! Coordinate grid generation.
//!
//! Produces the ordered sequence of grid cells for one sweep: latitude in
//! the outer loop, longitude in the inner loop, half-open on both axes,
//! every value rounded to 3 decimals before it is emitted.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default grid step in degrees, both axes.
pub const DEFAULT_STEP: f64 = 0.25;

#[derive(Debug, Error)]
pub enum GridError {
    #[error("invalid grid range: end bound must be greater than start bound ({axis}: {start} -> {end})")]
    InvalidRange {
        axis: &'static str,
        start: f64,
        end: f64,
    },
    #[error("invalid grid step: {0} (must be positive)")]
    InvalidStep(f64),
}

/// One grid cell, rounded to 3 decimal places on construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    /// Build a coordinate, rounding both components to 3 decimals.
    pub fn new(lat: f64, lon: f64) -> Self {
        Self {
            lat: round3(lat),
            lon: round3(lon),
        }
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.3}, {:.3})", self.lat, self.lon)
    }
}

/// Inclusive start / exclusive end bounds for one sweep.
#[derive(Debug, Clone)]
pub struct GridBounds {
    pub lat_start: f64,
    pub lat_end: f64,
    pub lon_start: f64,
    pub lon_end: f64,
    pub step: f64,
}

impl GridBounds {
    pub fn new(lat_start: f64, lat_end: f64, lon_start: f64, lon_end: f64) -> Self {
        Self {
            lat_start,
            lat_end,
            lon_start,
            lon_end,
            step: DEFAULT_STEP,
        }
    }

    /// Generate the full cell sequence in row-major order.
    ///
    /// Degenerate bounds (`end <= start` on either axis) are an error rather
    /// than an empty sweep, so a misconfigured run fails loudly up front.
    pub fn generate(&self) -> Result<Vec<Coordinate>, GridError> {
        if self.step <= 0.0 {
            return Err(GridError::InvalidStep(self.step));
        }
        if self.lat_end <= self.lat_start {
            return Err(GridError::InvalidRange {
                axis: "latitude",
                start: self.lat_start,
                end: self.lat_end,
            });
        }
        if self.lon_end <= self.lon_start {
            return Err(GridError::InvalidRange {
                axis: "longitude",
                start: self.lon_start,
                end: self.lon_end,
            });
        }

        let n_lat = steps_in(self.lat_start, self.lat_end, self.step);
        let n_lon = steps_in(self.lon_start, self.lon_end, self.step);

        let mut cells = Vec::with_capacity(n_lat * n_lon);
        for i in 0..n_lat {
            let lat = round3(self.lat_start + i as f64 * self.step);
            if lat >= self.lat_end {
                continue;
            }
            for j in 0..n_lon {
                let lon = round3(self.lon_start + j as f64 * self.step);
                if lon >= self.lon_end {
                    continue;
                }
                cells.push(Coordinate { lat, lon });
            }
        }
        Ok(cells)
    }
}

/// Number of half-open steps in `[start, end)`.
fn steps_in(start: f64, end: f64, step: f64) -> usize {
    ((end - start) / step).ceil() as usize
}

/// Round to 3 decimal places.
pub fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}
