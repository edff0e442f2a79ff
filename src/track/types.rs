// Core data structures for track geometry

use serde::{Deserialize, Serialize};

use crate::errors::RaceDataError;
use crate::geodesy::GeoPoint;

/// Reference geometry used to split a session into laps and segments
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TrackDefinition {
    /// Human-readable track name (e.g., "VIR Full Course")
    pub track_name: String,
    /// Optional description shown in reports
    #[serde(default)]
    pub description: Option<String>,
    /// Start/finish line reference point
    pub start_finish: GeoPoint,
    /// Intermediate sector-end points in driving order
    #[serde(default)]
    pub waypoints: Vec<GeoPoint>,
    /// Point where cars leave pit lane and join the circuit
    pub enter_track: GeoPoint,
    /// Point where cars leave the circuit at the end of a session
    pub exit_track: GeoPoint,
}

impl TrackDefinition {
    pub fn new(
        track_name: String,
        start_finish: GeoPoint,
        waypoints: Vec<GeoPoint>,
        enter_track: GeoPoint,
        exit_track: GeoPoint,
    ) -> Self {
        Self {
            track_name,
            description: None,
            start_finish,
            waypoints,
            enter_track,
            exit_track,
        }
    }

    pub fn with_description(mut self, description: String) -> Self {
        self.description = Some(description);
        self
    }

    /// Segments per lap. The closing start/finish crossing ends the last one.
    pub fn segment_count(&self) -> usize {
        self.waypoints.len() + 1
    }

    pub fn validate(&self) -> Result<(), RaceDataError> {
        if self.track_name.trim().is_empty() {
            return Err(RaceDataError::MalformedTrackDefinition {
                track_name: self.track_name.clone(),
                reason: "track name is empty".to_string(),
            });
        }

        let named_points = [
            ("start/finish", &self.start_finish),
            ("enter track", &self.enter_track),
            ("exit track", &self.exit_track),
        ];
        for (label, point) in named_points {
            self.validate_point(label, point)?;
        }
        for (i, point) in self.waypoints.iter().enumerate() {
            self.validate_point(&format!("waypoint {}", i + 1), point)?;
        }
        Ok(())
    }

    fn validate_point(&self, label: &str, point: &GeoPoint) -> Result<(), RaceDataError> {
        let valid = point.lat.is_finite()
            && point.lng.is_finite()
            && (-90.0..=90.0).contains(&point.lat)
            && (-180.0..=180.0).contains(&point.lng);
        if valid {
            Ok(())
        } else {
            Err(RaceDataError::MalformedTrackDefinition {
                track_name: self.track_name.clone(),
                reason: format!("{label} ({}, {}) is not a valid coordinate", point.lat, point.lng),
            })
        }
    }
}
