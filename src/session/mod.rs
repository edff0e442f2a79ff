// Session state machine: splits a stream of logger samples into laps and
// segments, then trims the pit-lane portions off both ends

pub mod detector;
pub mod measurement;
pub mod metadata;
pub mod queries;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::errors::RaceDataError;
use crate::geodesy::distance_feet;
use crate::track::TrackDefinition;

pub use detector::{BoundaryDetector, Crossing, DEFAULT_CROSSING_GATE_FT, Target};
pub use measurement::{Channels, Measurement};
pub use metadata::SessionInfo;
pub use queries::{Bounds, SegmentStats, SegmentTrace, bounds_of_series, centerpoint};

/// Measurements farther than this from the enter point are cut from the start
pub const DEFAULT_ENTER_TRIM_FT: f64 = 15.0;
/// Measurements farther than this from the exit point are cut from the end
pub const DEFAULT_EXIT_TRIM_FT: f64 = 15.0;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TrimConfig {
    pub enter_threshold_ft: f64,
    /// `None` keeps the whole in lap
    pub exit_threshold_ft: Option<f64>,
}

impl Default for TrimConfig {
    fn default() -> Self {
        Self {
            enter_threshold_ft: DEFAULT_ENTER_TRIM_FT,
            exit_threshold_ft: Some(DEFAULT_EXIT_TRIM_FT),
        }
    }
}

/// Measurements sharing one lap. Never empty.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Lap {
    measurements: Vec<Measurement>,
}

impl Lap {
    fn new(first: Measurement) -> Self {
        Self {
            measurements: vec![first],
        }
    }

    fn push(&mut self, measurement: Measurement) {
        self.measurements.push(measurement);
    }

    pub fn measurements(&self) -> &[Measurement] {
        &self.measurements
    }

    pub fn len(&self) -> usize {
        self.measurements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.measurements.is_empty()
    }

    pub fn first(&self) -> &Measurement {
        &self.measurements[0]
    }

    pub fn last(&self) -> &Measurement {
        &self.measurements[self.measurements.len() - 1]
    }

    /// Lap number the state machine assigned. The first lap can begin with a
    /// few pre-entry samples stamped 0, so this reads the final sample.
    pub fn lap_number(&self) -> u32 {
        self.last().lap()
    }

    /// Seconds between the first and last sample of the lap
    pub fn lap_time(&self) -> f64 {
        self.last().timestamp() - self.first().timestamp()
    }
}

#[derive(Clone, Debug)]
pub struct Session {
    info: SessionInfo,
    laps: Vec<Lap>,
    /// `None` when the track could not be resolved; every sample then lands
    /// in a single lap
    detector: Option<BoundaryDetector>,
    last_timestamp: Option<f64>,
    finalized: bool,
}

impl Session {
    pub fn new(info: SessionInfo, track: Option<TrackDefinition>) -> Self {
        Self::with_crossing_gate(info, track, DEFAULT_CROSSING_GATE_FT)
    }

    pub fn with_crossing_gate(
        info: SessionInfo,
        track: Option<TrackDefinition>,
        crossing_gate_ft: f64,
    ) -> Self {
        Self {
            info,
            laps: Vec::new(),
            detector: track.map(|t| BoundaryDetector::with_crossing_gate(t, crossing_gate_ft)),
            last_timestamp: None,
            finalized: false,
        }
    }

    pub fn info(&self) -> &SessionInfo {
        &self.info
    }

    pub fn track(&self) -> Option<&TrackDefinition> {
        self.detector.as_ref().map(BoundaryDetector::track)
    }

    pub fn laps(&self) -> &[Lap] {
        &self.laps
    }

    pub fn num_laps(&self) -> usize {
        self.laps.len()
    }

    /// Segments per lap, 1 when no track is known
    pub fn segment_count(&self) -> usize {
        self.track().map_or(1, TrackDefinition::segment_count)
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Feed the next logger sample. Samples must arrive in recording order.
    pub fn add_measurement(
        &mut self,
        timestamp: f64,
        channels: Channels,
    ) -> Result<(), RaceDataError> {
        if self.finalized {
            return Err(RaceDataError::SessionFinalized);
        }
        if !timestamp.is_finite() {
            return Err(RaceDataError::MalformedMeasurement {
                timestamp,
                reason: "timestamp is not a finite number".to_string(),
            });
        }
        if let Some(last) = self.last_timestamp
            && timestamp < last
        {
            return Err(RaceDataError::MalformedMeasurement {
                timestamp,
                reason: format!("timestamp goes backwards from {last}s"),
            });
        }

        let mut measurement = Measurement::new(timestamp, channels, 0, 0)?;
        let (lap, segment, crossing) = match self.detector.as_mut() {
            Some(detector) => {
                let crossing = detector.advance(measurement.position());
                (detector.current_lap(), detector.current_segment(), crossing)
            }
            None => (1, 1, None),
        };
        measurement.stamp(lap, segment);

        match crossing {
            Some(Crossing::TrackEntry) => debug!("Entered track at t={timestamp}s"),
            Some(Crossing::StartFinish) => debug!("Lap {lap} started at t={timestamp}s"),
            Some(Crossing::Waypoint(i)) => {
                debug!("Passed waypoint {} at t={timestamp}s, segment {segment}", i + 1)
            }
            None => {}
        }

        match self.laps.last_mut() {
            Some(current) if crossing != Some(Crossing::StartFinish) => current.push(measurement),
            _ => self.laps.push(Lap::new(measurement)),
        }
        self.last_timestamp = Some(timestamp);
        Ok(())
    }

    /// Cut the pit-lane samples off the out lap and the in lap, then freeze
    /// the session. On error the session is left untouched.
    pub fn trim_ends(&mut self, config: &TrimConfig) -> Result<(), RaceDataError> {
        if self.finalized {
            return Err(RaceDataError::SessionFinalized);
        }
        let Some(track) = self.track().cloned() else {
            debug!("No track definition, skipping trim");
            self.finalized = true;
            return Ok(());
        };
        let Some(first_lap) = self.laps.first() else {
            return Err(RaceDataError::TrimExhaustion {
                reason: "session has no measurements".to_string(),
            });
        };

        let head_cut = first_lap
            .measurements()
            .iter()
            .position(|m| {
                distance_feet(m.position(), track.enter_track) <= config.enter_threshold_ft
            })
            .unwrap_or(first_lap.len());
        let drop_first = head_cut == first_lap.len();

        if drop_first && self.laps.len() == 1 {
            return Err(RaceDataError::TrimExhaustion {
                reason: format!(
                    "no measurement comes within {}ft of the enter point",
                    config.enter_threshold_ft
                ),
            });
        }

        // Samples of the last lap that survive the head trim
        let last_index = self.laps.len() - 1;
        let last_offset = if last_index == 0 { head_cut } else { 0 };
        let tail_keep = match config.exit_threshold_ft {
            Some(threshold) => {
                let remaining = &self.laps[last_index].measurements()[last_offset..];
                let keep = remaining
                    .iter()
                    .rposition(|m| distance_feet(m.position(), track.exit_track) <= threshold)
                    .map(|i| i + 1)
                    .ok_or_else(|| RaceDataError::TrimExhaustion {
                        reason: format!(
                            "no measurement of the in lap comes within {threshold}ft of the exit point"
                        ),
                    })?;
                Some(last_offset + keep)
            }
            None => None,
        };

        if let Some(keep) = tail_keep {
            let last = &mut self.laps[last_index];
            let removed = last.measurements.len() - keep;
            last.measurements.truncate(keep);
            info!("Trimmed {removed} trailing measurements from the in lap");
        }
        if drop_first {
            warn!(
                "Out lap never came within {}ft of the enter point, dropping it",
                config.enter_threshold_ft
            );
            self.laps.remove(0);
        } else {
            self.laps[0].measurements.drain(..head_cut);
            info!("Trimmed {head_cut} leading measurements from the out lap");
        }

        self.finalized = true;
        Ok(())
    }
}
