// AiM RaceStudio 3 CSV export

use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord};
use log::{debug, info};

use super::{ColumnMap, Importer, RawSession, read_to_string};
use crate::errors::RaceDataError;
use crate::session::SessionInfo;
use crate::session::measurement::{
    ALTITUDE, BRAKE, GPS_LAT, GPS_LNG, HEADING, INLINE_ACCEL, LATERAL_ACCEL, RPM, SPEED, THROTTLE,
};

const TIME_HEADER: &str = "Time";

fn canonical_channel(header: &str) -> Option<&'static str> {
    match header {
        "GPS Latitude" => Some(GPS_LAT),
        "GPS Longitude" => Some(GPS_LNG),
        "GPS Speed" => Some(SPEED),
        "GPS Heading" => Some(HEADING),
        "GPS LatAcc" => Some(LATERAL_ACCEL),
        "GPS LonAcc" => Some(INLINE_ACCEL),
        "GPS Altitude" => Some(ALTITUDE),
        "RPM" => Some(RPM),
        "Throttle" | "TPS" => Some(THROTTLE),
        "Brake" | "Brake Press" => Some(BRAKE),
        _ => None,
    }
}

fn apply_metadata(info: &mut SessionInfo, key: &str, value: String) {
    match key {
        "Venue" => info.track_name = Some(value),
        "Vehicle" => info.vehicle = Some(value),
        "Racer" | "User" => info.driver_name = Some(value),
        "Date" => info.session_date = Some(value),
        "Time" => info.session_time = Some(value),
        "Comment" => {
            info.extra.insert("comment".to_string(), value);
        }
        other => info.set(other, value),
    }
}

/// Reads the CSV layout RaceStudio 3 exports: a block of `"key","value"`
/// rows, a blank line, the channel header row, a units row, then samples.
pub struct AimImporter {
    path: PathBuf,
}

impl AimImporter {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    /// Parse AiM export text. `source` names the file in errors and metadata.
    pub fn parse(source: &str, content: &str) -> Result<RawSession, RaceDataError> {
        let mut info = SessionInfo::default().with_source_file(source);

        // Metadata ends at the first blank line
        let lines: Vec<&str> = content.lines().collect();
        let split = lines
            .iter()
            .position(|l| l.trim().is_empty())
            .ok_or_else(|| RaceDataError::UnsupportedFormat {
                path: source.to_string(),
            })?;

        let header_block = lines[..split].join("\n");
        let mut metadata = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(header_block.as_bytes());
        for record in metadata.records() {
            let record = record?;
            let mut cells = record.iter().map(str::trim);
            if let Some(key) = cells.next()
                && !key.is_empty()
            {
                let value = cells.filter(|c| !c.is_empty()).collect::<Vec<_>>().join(", ");
                apply_metadata(&mut info, key, value);
            }
        }

        // Blank lines between sections are skipped by the csv reader
        let body = lines[split..].join("\n");
        let mut data = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(body.as_bytes());
        let headers: StringRecord = data.headers()?.clone();
        let columns = ColumnMap::new(&headers, TIME_HEADER, canonical_channel).ok_or_else(|| {
            RaceDataError::UnsupportedFormat {
                path: source.to_string(),
            }
        })?;

        let mut records = data.records();
        if let Some(units) = records.next() {
            debug!("AiM units row: {:?}", units?);
        }

        let mut samples = Vec::new();
        for record in records {
            let record = record?;
            // 1-based line in the original file
            let line = record.position().map_or(0, |p| p.line()) + split as u64;
            if let Some(sample) = columns.parse_row(&record, line)? {
                samples.push(sample);
            }
        }
        info!("Read {} samples from {source}", samples.len());
        Ok(RawSession { info, samples })
    }
}

impl Importer for AimImporter {
    fn format_name(&self) -> &'static str {
        "AiM"
    }

    fn source_path(&self) -> &Path {
        &self.path
    }

    fn read_session(&self) -> Result<RawSession, RaceDataError> {
        let content = read_to_string(&self.path)?;
        Self::parse(&self.path.display().to_string(), &content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#""Format","AiM CSV File"
"Venue","VIR Full Course"
"Vehicle","Miata"
"User","Jane Doe"
"Data Source","AiM Data Logger"
"Comment","Dry, 18C"
"Date","Saturday, March 4, 2023"
"Time","10:22 AM"
"Sample Rate","20"
"Beacon Markers","92.1","185.3"

"Time","GPS Speed","GPS Latitude","GPS Longitude","RPM"
"s","mph","deg","deg","rpm"

0.000,12.5,36.5601,-79.2065,3200
0.050,12.7,36.5602,-79.2064,
0.100,13.1,36.5603,-79.2063,3350
"#;

    #[test]
    fn test_metadata_maps_to_session_info() {
        let raw = AimImporter::parse("vir.csv", SAMPLE).unwrap();
        assert_eq!(raw.info.track_name.as_deref(), Some("VIR Full Course"));
        assert_eq!(raw.info.vehicle.as_deref(), Some("Miata"));
        assert_eq!(raw.info.driver_name.as_deref(), Some("Jane Doe"));
        assert_eq!(raw.info.session_time.as_deref(), Some("10:22 AM"));
        assert_eq!(raw.info.formatted_date().as_deref(), Some("2023-03-04"));
        assert_eq!(raw.info.source_file.as_deref(), Some("vir.csv"));
        assert_eq!(raw.info.get("comment"), Some("Dry, 18C"));
        assert_eq!(raw.info.get("Sample Rate"), Some("20"));
        assert_eq!(raw.info.get("Beacon Markers"), Some("92.1, 185.3"));
    }

    #[test]
    fn test_samples_use_canonical_channels() {
        let raw = AimImporter::parse("vir.csv", SAMPLE).unwrap();
        assert_eq!(raw.samples.len(), 3);

        let first = &raw.samples[0];
        assert_eq!(first.timestamp, 0.0);
        assert_eq!(first.channels.get(GPS_LAT), Some(&36.5601));
        assert_eq!(first.channels.get(GPS_LNG), Some(&-79.2065));
        assert_eq!(first.channels.get(SPEED), Some(&12.5));
        assert_eq!(first.channels.get(RPM), Some(&3200.0));

        // Empty RPM cell is left out rather than read as zero
        assert!(!raw.samples[1].channels.contains_key(RPM));
        assert_eq!(raw.samples[2].timestamp, 0.1);
    }

    #[test]
    fn test_bad_cell_reports_line() {
        let broken = SAMPLE.replace("13.1", "fast");
        match AimImporter::parse("vir.csv", &broken) {
            Err(RaceDataError::CsvFieldParse { column, value, line }) => {
                assert_eq!(column, SPEED);
                assert_eq!(value, "fast");
                assert_eq!(line, 17);
            }
            other => panic!("Expected CsvFieldParse, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_data_section_is_unsupported() {
        let header_only = "\"Format\",\"AiM CSV File\"\n\"Venue\",\"VIR\"\n";
        assert!(matches!(
            AimImporter::parse("vir.csv", header_only),
            Err(RaceDataError::UnsupportedFormat { .. })
        ));
    }
}
