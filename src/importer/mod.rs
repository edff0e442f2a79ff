// Logger file importers

pub mod aim;
pub mod track_addict;

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use csv::StringRecord;
use log::debug;

use crate::errors::RaceDataError;
use crate::session::{Channels, SessionInfo};

pub use aim::AimImporter;
pub use track_addict::TrackAddictImporter;

/// First-line marker of an AiM RaceStudio CSV export
pub const AIM_SIGNATURE: &str = "AiM CSV File";
/// First-line marker of a TrackAddict (RaceRender) CSV export
pub const TRACK_ADDICT_SIGNATURE: &str = "RaceRender Data: TrackAddict";

/// One row of logger data with canonical channel names
#[derive(Clone, Debug, PartialEq)]
pub struct RawSample {
    /// Seconds since the logger started recording
    pub timestamp: f64,
    pub channels: Channels,
}

/// Everything an importer read from a file, before lap detection
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawSession {
    pub info: SessionInfo,
    /// Samples in file order
    pub samples: Vec<RawSample>,
}

/// A reader for one logger export format.
///
/// Importers translate vendor column headers to the canonical channel names
/// in [`crate::session::measurement`] and vendor metadata keys to
/// [`SessionInfo`] fields. They never run lap detection; the samples they
/// return go through [`crate::ingest::ingest`].
///
/// # Errors
///
/// `read_session` fails with `ImportIOError` or `CsvError` when the file
/// cannot be read, and with `CsvFieldParse` when a data cell is not a number.
pub trait Importer: Send + Sync {
    /// Short format name for logs and the CLI
    fn format_name(&self) -> &'static str;

    fn source_path(&self) -> &Path;

    fn read_session(&self) -> Result<RawSession, RaceDataError>;
}

/// Pick an importer by looking at the file's first line
pub fn detect_importer(path: &Path) -> Result<Box<dyn Importer>, RaceDataError> {
    let file = File::open(path).map_err(|e| RaceDataError::ImportIOError { source: e })?;
    let mut first_line = String::new();
    BufReader::new(file)
        .read_line(&mut first_line)
        .map_err(|e| RaceDataError::ImportIOError { source: e })?;

    let importer: Box<dyn Importer> = if first_line.contains(AIM_SIGNATURE) {
        Box::new(AimImporter::new(path))
    } else if first_line.contains(TRACK_ADDICT_SIGNATURE) {
        Box::new(TrackAddictImporter::new(path))
    } else {
        return Err(RaceDataError::UnsupportedFormat {
            path: path.display().to_string(),
        });
    };
    debug!("{} looks like a {} file", path.display(), importer.format_name());
    Ok(importer)
}

/// Column layout of a data section: which column holds the time and the
/// canonical name of every column
pub(crate) struct ColumnMap {
    time_column: usize,
    names: Vec<String>,
}

impl ColumnMap {
    /// Map each header through `canonical`. Returns `None` when no header
    /// maps to `time_header`.
    pub(crate) fn new(
        headers: &StringRecord,
        time_header: &str,
        canonical: impl Fn(&str) -> Option<&'static str>,
    ) -> Option<Self> {
        let names: Vec<String> = headers
            .iter()
            .map(|h| {
                let h = h.trim();
                canonical(h).map_or_else(|| h.to_string(), str::to_string)
            })
            .collect();
        let time_column = headers.iter().position(|h| h.trim() == time_header)?;
        Some(Self { time_column, names })
    }

    /// Parse one data row. Empty cells are left out of the channel map.
    pub(crate) fn parse_row(
        &self,
        record: &StringRecord,
        line: u64,
    ) -> Result<Option<RawSample>, RaceDataError> {
        let mut timestamp = None;
        let mut channels = Channels::new();
        for (index, cell) in record.iter().enumerate() {
            let cell = cell.trim();
            if cell.is_empty() {
                continue;
            }
            let Some(name) = self.names.get(index) else {
                continue;
            };
            let value: f64 = cell.parse().map_err(|_| RaceDataError::CsvFieldParse {
                column: name.clone(),
                value: cell.to_string(),
                line,
            })?;
            if index == self.time_column {
                timestamp = Some(value);
            } else {
                channels.insert(name.clone(), value);
            }
        }
        // A row without a time cell is padding, not a sample
        Ok(timestamp.map(|timestamp| RawSample {
            timestamp,
            channels,
        }))
    }
}

pub(crate) fn read_to_string(path: &Path) -> Result<String, RaceDataError> {
    std::fs::read_to_string(path).map_err(|e| RaceDataError::ImportIOError { source: e })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn file_with(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_detects_format_from_first_line() {
        let aim = file_with("\"Format\",\"AiM CSV File\"\n");
        let importer = detect_importer(aim.path()).unwrap();
        assert_eq!(importer.format_name(), "AiM");
        assert_eq!(importer.source_path(), aim.path());

        let track_addict = file_with("# RaceRender Data: TrackAddict 4.6.3\n");
        assert_eq!(
            detect_importer(track_addict.path()).unwrap().format_name(),
            "TrackAddict"
        );
    }

    #[test]
    fn test_unknown_format_is_rejected() {
        let other = file_with("time,lat,lng\n0,1,2\n");
        match detect_importer(other.path()) {
            Err(RaceDataError::UnsupportedFormat { path }) => {
                assert_eq!(path, other.path().display().to_string())
            }
            Err(e) => panic!("Expected UnsupportedFormat, got {e:?}"),
            Ok(i) => panic!("Expected UnsupportedFormat, got {}", i.format_name()),
        }
    }

    #[test]
    fn test_missing_file_is_io_error() {
        assert!(matches!(
            detect_importer(Path::new("/definitely/not/here.csv")),
            Err(RaceDataError::ImportIOError { .. })
        ));
    }

    #[test]
    fn test_column_map_parses_rows() {
        let headers = StringRecord::from(vec!["Time", "Lat", "Speed", "Notes"]);
        let map = ColumnMap::new(&headers, "Time", |h| match h {
            "Lat" => Some("GPSlat"),
            _ => None,
        })
        .unwrap();

        let row = StringRecord::from(vec!["1.25", "36.5", "", "4"]);
        let sample = map.parse_row(&row, 7).unwrap().unwrap();
        assert_eq!(sample.timestamp, 1.25);
        assert_eq!(sample.channels.get("GPSlat"), Some(&36.5));
        assert!(!sample.channels.contains_key("Speed"));
        assert_eq!(sample.channels.get("Notes"), Some(&4.0));

        let bad = StringRecord::from(vec!["2.0", "north", "", ""]);
        match map.parse_row(&bad, 8) {
            Err(RaceDataError::CsvFieldParse {
                column,
                value,
                line,
            }) => {
                assert_eq!(column, "GPSlat");
                assert_eq!(value, "north");
                assert_eq!(line, 8);
            }
            other => panic!("Expected CsvFieldParse, got {other:?}"),
        }
    }

    #[test]
    fn test_column_map_needs_time_column() {
        let headers = StringRecord::from(vec!["Lat", "Lng"]);
        assert!(ColumnMap::new(&headers, "Time", |_| None).is_none());
    }
}
