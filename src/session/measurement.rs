use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::RaceDataError;
use crate::geodesy::GeoPoint;

// Canonical channel names. Importers translate vendor headers to these.
pub const GPS_LAT: &str = "GPSlat";
pub const GPS_LNG: &str = "GPSlng";
pub const SPEED: &str = "speed";
pub const HEADING: &str = "heading";
pub const THROTTLE: &str = "throttle";
pub const BRAKE: &str = "brake";
pub const LATERAL_ACCEL: &str = "lateralAccel";
pub const INLINE_ACCEL: &str = "inlineAccel";
pub const RPM: &str = "rpm";
pub const ALTITUDE: &str = "altitude";

pub type Channels = BTreeMap<String, f64>;

/// One timestamped logger sample, stamped with the lap and segment it was
/// detected in
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Measurement {
    /// Seconds since the logger started recording
    timestamp: f64,
    position: GeoPoint,
    channels: Channels,
    /// 0 until the car has entered the track
    lap: u32,
    /// 0 until the car has entered the track, 1-based afterwards
    segment: u32,
}

impl Measurement {
    pub(crate) fn new(
        timestamp: f64,
        channels: Channels,
        lap: u32,
        segment: u32,
    ) -> Result<Self, RaceDataError> {
        let position = position_from_channels(timestamp, &channels)?;
        Ok(Self {
            timestamp,
            position,
            channels,
            lap,
            segment,
        })
    }

    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    pub fn position(&self) -> GeoPoint {
        self.position
    }

    pub fn lap(&self) -> u32 {
        self.lap
    }

    pub fn segment(&self) -> u32 {
        self.segment
    }

    pub fn channels(&self) -> &Channels {
        &self.channels
    }

    pub fn channel(&self, name: &str) -> Option<f64> {
        self.channels.get(name).copied()
    }

    pub(crate) fn stamp(&mut self, lap: u32, segment: u32) {
        self.lap = lap;
        self.segment = segment;
    }
}

pub(crate) fn position_from_channels(
    timestamp: f64,
    channels: &Channels,
) -> Result<GeoPoint, RaceDataError> {
    let lat = gps_channel(timestamp, channels, GPS_LAT)?;
    let lng = gps_channel(timestamp, channels, GPS_LNG)?;
    Ok(GeoPoint::new(lat, lng))
}

fn gps_channel(timestamp: f64, channels: &Channels, name: &str) -> Result<f64, RaceDataError> {
    match channels.get(name) {
        Some(v) if v.is_finite() => Ok(*v),
        Some(v) => Err(RaceDataError::MalformedMeasurement {
            timestamp,
            reason: format!("{name} is not a finite number ({v})"),
        }),
        None => Err(RaceDataError::MalformedMeasurement {
            timestamp,
            reason: format!("missing {name} channel"),
        }),
    }
}
