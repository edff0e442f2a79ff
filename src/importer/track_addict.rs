// TrackAddict CSV export (RaceRender layout)

use std::path::{Path, PathBuf};

use csv::ReaderBuilder;
use log::info;

use super::{ColumnMap, Importer, RawSession, TRACK_ADDICT_SIGNATURE, read_to_string};
use crate::errors::RaceDataError;
use crate::session::SessionInfo;
use crate::session::measurement::{
    ALTITUDE, BRAKE, GPS_LAT, GPS_LNG, HEADING, INLINE_ACCEL, LATERAL_ACCEL, RPM, SPEED, THROTTLE,
};

const TIME_HEADER: &str = "Time";

fn canonical_channel(header: &str) -> Option<&'static str> {
    match header {
        "Latitude" => Some(GPS_LAT),
        "Longitude" => Some(GPS_LNG),
        "Speed (MPH)" => Some(SPEED),
        "Heading" => Some(HEADING),
        "Altitude (m)" => Some(ALTITUDE),
        "Accel X" => Some(LATERAL_ACCEL),
        "Accel Y" => Some(INLINE_ACCEL),
        "Throttle Position (%)" => Some(THROTTLE),
        "Brake (calculated)" => Some(BRAKE),
        h if h.starts_with("Engine Speed (RPM)") => Some(RPM),
        _ => None,
    }
}

/// `# Key: value` comment lines carry what little metadata the app writes
fn apply_comment(info: &mut SessionInfo, comment: &str) {
    let comment = comment.trim_start_matches('#').trim();
    if let Some(version) = comment.strip_prefix(TRACK_ADDICT_SIGNATURE) {
        info.extra
            .insert("app".to_string(), format!("TrackAddict{version}"));
        return;
    }
    let Some((key, value)) = comment.split_once(':') else {
        return;
    };
    let value = value.trim().to_string();
    match key.trim() {
        "Vehicle" => info.vehicle = Some(value),
        "Driver" => info.driver_name = Some(value),
        other => info.set(other, value),
    }
}

/// TrackAddict files do not name the track; callers pass one to
/// [`crate::ingest::ingest`] or set it on the returned info.
pub struct TrackAddictImporter {
    path: PathBuf,
}

impl TrackAddictImporter {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    pub fn parse(source: &str, content: &str) -> Result<RawSession, RaceDataError> {
        let mut info = SessionInfo::default().with_source_file(source);
        content
            .lines()
            .take_while(|l| l.starts_with('#'))
            .for_each(|l| apply_comment(&mut info, l));

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .comment(Some(b'#'))
            .from_reader(content.as_bytes());
        let headers = reader.headers()?.clone();
        let columns = ColumnMap::new(&headers, TIME_HEADER, canonical_channel).ok_or_else(|| {
            RaceDataError::UnsupportedFormat {
                path: source.to_string(),
            }
        })?;

        let mut samples = Vec::new();
        for record in reader.records() {
            let record = record?;
            let line = record.position().map_or(0, |p| p.line());
            if let Some(sample) = columns.parse_row(&record, line)? {
                samples.push(sample);
            }
        }
        info!("Read {} samples from {source}", samples.len());
        Ok(RawSession { info, samples })
    }
}

impl Importer for TrackAddictImporter {
    fn format_name(&self) -> &'static str {
        "TrackAddict"
    }

    fn source_path(&self) -> &Path {
        &self.path
    }

    fn read_session(&self) -> Result<RawSession, RaceDataError> {
        let content = read_to_string(&self.path)?;
        Self::parse(&self.path.display().to_string(), &content)
    }
}
