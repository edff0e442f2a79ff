// Import -> track resolution -> lap detection -> trim

use std::path::{Path, PathBuf};

use log::{info, warn};
use rayon::prelude::*;

use crate::config::AnalysisConfig;
use crate::errors::RaceDataError;
use crate::importer::{RawSession, detect_importer};
use crate::session::Session;
use crate::track::{TrackDefinition, TrackRegistry};

fn resolve_track(
    registry: &dyn TrackRegistry,
    track_name: Option<&str>,
) -> Result<Option<TrackDefinition>, RaceDataError> {
    let Some(track_name) = track_name else {
        warn!("Session has no track name, lap detection is disabled");
        return Ok(None);
    };
    let track = registry.resolve(track_name)?;
    if track.is_none() {
        let unresolved = RaceDataError::UnresolvedTrack {
            track_name: track_name.to_string(),
        };
        warn!("{unresolved}, lap detection is disabled");
    }
    Ok(track)
}

/// Build a finalized session from imported samples. `track_override`
/// replaces the track name the file carried, if any.
///
/// An unknown track is not an error: the session is built as a single lap.
/// A malformed sample or a trim that would leave nothing behind is.
pub fn ingest(
    raw: RawSession,
    registry: &dyn TrackRegistry,
    config: &AnalysisConfig,
    track_override: Option<&str>,
) -> Result<Session, RaceDataError> {
    let RawSession { mut info, samples } = raw;
    if let Some(name) = track_override {
        info.track_name = Some(name.to_string());
    }

    let track = resolve_track(registry, info.track_name.as_deref())?;
    if let Some(track) = &track
        && info.track_description.is_none()
    {
        info.track_description = track.description.clone();
    }

    let mut session = Session::with_crossing_gate(info, track, config.crossing_gate_ft);
    for sample in samples {
        session.add_measurement(sample.timestamp, sample.channels)?;
    }
    session.trim_ends(&config.trim)?;
    info!(
        "Session {} has {} laps",
        session.info().report_file_stem(),
        session.num_laps()
    );
    Ok(session)
}

/// Detect the format of `path`, read it and ingest it
pub fn ingest_file(
    path: &Path,
    registry: &dyn TrackRegistry,
    config: &AnalysisConfig,
    track_override: Option<&str>,
) -> Result<Session, RaceDataError> {
    let importer = detect_importer(path)?;
    info!(
        "Reading {} as {}",
        importer.source_path().display(),
        importer.format_name()
    );
    let raw = importer.read_session()?;
    ingest(raw, registry, config, track_override)
}

/// Ingest several files in parallel. Each file succeeds or fails on its own;
/// results come back in input order.
pub fn ingest_files(
    paths: &[PathBuf],
    registry: &dyn TrackRegistry,
    config: &AnalysisConfig,
    track_override: Option<&str>,
) -> Vec<(PathBuf, Result<Session, RaceDataError>)> {
    paths
        .par_iter()
        .map(|path| {
            let result = ingest_file(path, registry, config, track_override);
            (path.clone(), result)
        })
        .collect()
}
