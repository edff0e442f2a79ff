use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Date layouts seen in logger exports, most specific first
const DATE_FORMATS: [&str; 6] = [
    "%A, %B %d, %Y",
    "%B %d, %Y",
    "%Y-%m-%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%d.%m.%Y",
];

/// Descriptive information about a recorded session
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct SessionInfo {
    pub driver_name: Option<String>,
    pub track_name: Option<String>,
    pub track_description: Option<String>,
    /// Date as written by the logger software
    pub session_date: Option<String>,
    /// Time of day as written by the logger software
    pub session_time: Option<String>,
    pub vehicle: Option<String>,
    pub source_file: Option<String>,
    /// Anything else the importer found in the file header
    #[serde(default)]
    pub extra: BTreeMap<String, String>,
}

impl SessionInfo {
    pub fn with_track_name(mut self, track_name: impl Into<String>) -> Self {
        self.track_name = Some(track_name.into());
        self
    }

    pub fn with_driver_name(mut self, driver_name: impl Into<String>) -> Self {
        self.driver_name = Some(driver_name.into());
        self
    }

    pub fn with_source_file(mut self, source_file: impl Into<String>) -> Self {
        self.source_file = Some(source_file.into());
        self
    }

    /// Look up a field by the key names used in logger headers. Known keys
    /// map to the typed fields, everything else is looked up in `extra`.
    pub fn get(&self, key: &str) -> Option<&str> {
        match key {
            "driverName" => self.driver_name.as_deref(),
            "trackName" => self.track_name.as_deref(),
            "trackDescription" => self.track_description.as_deref(),
            "sessionDate" => self.session_date.as_deref(),
            "sessionTime" => self.session_time.as_deref(),
            "vehicle" => self.vehicle.as_deref(),
            "sourcefile" => self.source_file.as_deref(),
            other => self.extra.get(other).map(String::as_str),
        }
    }

    /// Store a field under a logger header key, the inverse of [`Self::get`]
    pub fn set(&mut self, key: &str, value: String) {
        match key {
            "driverName" => self.driver_name = Some(value),
            "trackName" => self.track_name = Some(value),
            "trackDescription" => self.track_description = Some(value),
            "sessionDate" => self.session_date = Some(value),
            "sessionTime" => self.session_time = Some(value),
            "vehicle" => self.vehicle = Some(value),
            "sourcefile" => self.source_file = Some(value),
            other => {
                self.extra.insert(other.to_string(), value);
            }
        }
    }

    pub fn parsed_date(&self) -> Option<NaiveDate> {
        let raw = self.session_date.as_deref()?.trim();
        DATE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
    }

    /// Session date as `YYYY-MM-DD`, or `None` when the logger's date string
    /// is not in a recognized layout
    pub fn formatted_date(&self) -> Option<String> {
        self.parsed_date().map(|d| d.format("%Y-%m-%d").to_string())
    }

    /// `driver-track-date-time`, with placeholders for missing fields and
    /// path separators stripped
    pub fn report_file_stem(&self) -> String {
        let date = self
            .formatted_date()
            .or_else(|| self.session_date.clone())
            .unwrap_or_else(|| "unknown-date".to_string());
        [
            self.driver_name
                .clone()
                .unwrap_or_else(|| "unknown-driver".to_string()),
            self.track_name
                .clone()
                .unwrap_or_else(|| "unknown-track".to_string()),
            date,
            self.session_time
                .clone()
                .unwrap_or_else(|| "unknown-time".to_string()),
        ]
        .iter()
        .map(|part| {
            part.trim()
                .chars()
                .map(|c| match c {
                    '/' | '\\' | ':' | ' ' => '_',
                    c => c,
                })
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("-")
    }
}
