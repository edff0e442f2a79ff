// Library interface for racedata
// This allows integration tests and benches to access internal modules

pub mod config;
pub mod errors;
pub mod geodesy;
pub mod importer;
pub mod ingest;
pub mod report;
pub mod session;
pub mod track;
pub mod writer;

// Re-export commonly used types
pub use config::AnalysisConfig;
pub use errors::RaceDataError;
pub use geodesy::GeoPoint;
pub use importer::{Importer, RawSample, RawSession, detect_importer};
pub use ingest::{ingest, ingest_file, ingest_files};
pub use report::{ReportOptions, format_lap_time, render_text_report};
pub use session::{Lap, Measurement, Session, SessionInfo, TrimConfig};
pub use track::{FileBasedRegistry, InMemoryRegistry, TrackDefinition, TrackEntry, TrackRegistry};
pub use writer::write_session_jsonl;
