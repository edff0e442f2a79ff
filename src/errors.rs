// Error types for racedata

use snafu::Snafu;
use std::io;

#[derive(Debug, Snafu)]
pub enum RaceDataError {
    // Track resolution errors
    #[snafu(display("No track definition matches \"{track_name}\""))]
    UnresolvedTrack { track_name: String },
    #[snafu(display("Track definition for {track_name} is malformed: {reason}"))]
    MalformedTrackDefinition { track_name: String, reason: String },
    #[snafu(display("Error reading track definitions"))]
    TrackRegistryIOError { source: io::Error },
    #[snafu(display("Error serializing track file for {track_name}"))]
    TrackSerializeError {
        track_name: String,
        source: serde_json::Error,
    },

    // Session state machine errors
    #[snafu(display("Malformed measurement at t={timestamp}s: {reason}"))]
    MalformedMeasurement { timestamp: f64, reason: String },
    #[snafu(display("Trimming would leave the session without usable data: {reason}"))]
    TrimExhaustion { reason: String },
    #[snafu(display("Session has been finalized and is read-only"))]
    SessionFinalized,

    // Query errors
    #[snafu(display("No qualifying data: {reason}"))]
    EmptySegmentQuery { reason: String },

    // Importer errors
    #[snafu(display("Unsupported data file format: {path}"))]
    UnsupportedFormat { path: String },
    #[snafu(display("Error reading data file"))]
    ImportIOError { source: io::Error },
    #[snafu(display("Error parsing CSV data"))]
    CsvError { source: csv::Error },
    #[snafu(display("Invalid value \"{value}\" in column {column} on line {line}"))]
    CsvFieldParse {
        column: String,
        value: String,
        line: u64,
    },

    // Errors for the session writer
    #[snafu(display("Error writing session file"))]
    WriterError { source: io::Error },

    // Config management errors
    #[snafu(display("Could not find application config directory"))]
    NoConfigDir,
    #[snafu(display("Error reading or writing config file"))]
    ConfigIOError { source: io::Error },
    #[snafu(display("Error serializing config file"))]
    ConfigSerializeError { source: serde_json::Error },
}

impl From<csv::Error> for RaceDataError {
    fn from(value: csv::Error) -> Self {
        RaceDataError::CsvError { source: value }
    }
}
