//! CSV result sink — append-only, one durable write per row.

use csv::{Writer, WriterBuilder};
use std::fs::{File, OpenOptions};
use std::path::Path;
use thiserror::Error;

use crate::geocode::Regions;
use crate::grid::Coordinate;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to open output file {path}: {source}")]
    Open {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to write row: {0}")]
    Write(#[from] csv::Error),
    #[error("failed to flush row: {0}")]
    Flush(#[from] std::io::Error),
}

/// One output row: a successfully extracted (cell, bar) pair plus its
/// region enrichment. Absent regions serialize as empty fields; the
/// "not found" sentinels pass through verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedRow {
    pub coord: Coordinate,
    pub tooltip_text: String,
    pub regions: Regions,
}

/// Appends rows to the configured CSV path.
///
/// The file is opened in append mode and never truncated; no header is
/// written or expected. Each `append` flushes, so every row is an
/// independent durable write and a crash loses at most the row in flight.
pub struct CsvSink {
    writer: Writer<File>,
}

impl CsvSink {
    pub fn open(path: &Path) -> Result<Self, SinkError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|source| SinkError::Open {
                    path: path.display().to_string(),
                    source,
                })?;
            }
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| SinkError::Open {
                path: path.display().to_string(),
                source,
            })?;
        let writer = WriterBuilder::new().has_headers(false).from_writer(file);
        Ok(Self { writer })
    }

    pub fn append(&mut self, row: &EnrichedRow) -> Result<(), SinkError> {
        self.writer.write_record([
            format!("{:.3}", row.coord.lat).as_str(),
            format!("{:.3}", row.coord.lon).as_str(),
            row.tooltip_text.as_str(),
            row.regions.region.as_deref().unwrap_or(""),
            row.regions.subregion.as_deref().unwrap_or(""),
        ])?;
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geocode::{REGION_NOT_FOUND, SUBREGION_NOT_FOUND};

    fn row(lat: f64, lon: f64, text: &str, regions: Regions) -> EnrichedRow {
        EnrichedRow {
            coord: Coordinate::new(lat, lon),
            tooltip_text: text.to_string(),
            regions,
        }
    }

    #[test]
    fn test_append_writes_five_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rows.csv");
        let mut sink = CsvSink::open(&path).unwrap();
        sink.append(&row(
            40.25,
            -3.5,
            "Jan: 120 kWh",
            Regions {
                region: Some("Comunidad de Madrid".to_string()),
                subregion: Some("Madrid".to_string()),
            },
        ))
        .unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            contents.trim_end(),
            "40.250,-3.500,Jan: 120 kWh,Comunidad de Madrid,Madrid"
        );
    }

    #[test]
    fn test_absent_regions_are_empty_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rows.csv");
        let mut sink = CsvSink::open(&path).unwrap();
        sink.append(&row(0.0, 0.0, "text", Regions::default())).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.trim_end(), "0.000,0.000,text,,");
    }

    #[test]
    fn test_placeholders_pass_through_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rows.csv");
        let mut sink = CsvSink::open(&path).unwrap();
        sink.append(&row(
            1.0,
            2.0,
            "t",
            Regions {
                region: Some(REGION_NOT_FOUND.to_string()),
                subregion: Some(SUBREGION_NOT_FOUND.to_string()),
            },
        ))
        .unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            contents.trim_end(),
            "1.000,2.000,t,region not found,subregion not found"
        );
    }

    #[test]
    fn test_append_preserves_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rows.csv");
        std::fs::write(&path, "existing line\n").unwrap();

        let mut sink = CsvSink::open(&path).unwrap();
        sink.append(&row(5.0, 6.0, "new", Regions::default())).unwrap();
        drop(sink);

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("existing line\n"));
        assert!(contents.contains("5.000,6.000,new,,"));
    }

    #[test]
    fn test_open_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/rows.csv");
        let mut sink = CsvSink::open(&path).unwrap();
        sink.append(&row(0.0, 0.0, "x", Regions::default())).unwrap();
        assert!(path.exists());
    }
}
