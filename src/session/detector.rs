//! Lap and segment boundary detection.
//!
//! The detector tracks the distance from each GPS fix to the next reference
//! point it expects the car to pass. A point counts as passed on the first
//! sample where that distance starts growing again while the car is still
//! inside the crossing gate. That makes it a local-minimum detector: GPS
//! jitter far from the point is ignored, but the logger has to sample densely
//! enough for "approach then recede" to be visible inside the gate.

use crate::geodesy::{GeoPoint, distance_feet};
use crate::track::TrackDefinition;

/// Distance below which a distance minimum is accepted as a crossing
pub const DEFAULT_CROSSING_GATE_FT: f64 = 50.0;

/// The reference point the detector is waiting for
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Target {
    EnterTrack,
    /// Index into the track's intermediate waypoints
    Waypoint(usize),
    StartFinish,
}

/// What a sample crossed, if anything
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Crossing {
    TrackEntry,
    StartFinish,
    Waypoint(usize),
}

#[derive(Clone, Debug)]
pub struct BoundaryDetector {
    track: TrackDefinition,
    crossing_gate_ft: f64,
    current_lap: u32,
    current_segment: u32,
    next_target: Target,
    last_position: Option<GeoPoint>,
}

impl BoundaryDetector {
    pub fn new(track: TrackDefinition) -> Self {
        Self::with_crossing_gate(track, DEFAULT_CROSSING_GATE_FT)
    }

    pub fn with_crossing_gate(track: TrackDefinition, crossing_gate_ft: f64) -> Self {
        Self {
            track,
            crossing_gate_ft,
            current_lap: 0,
            current_segment: 0,
            next_target: Target::EnterTrack,
            last_position: None,
        }
    }

    pub fn current_lap(&self) -> u32 {
        self.current_lap
    }

    pub fn current_segment(&self) -> u32 {
        self.current_segment
    }

    pub fn next_target(&self) -> Target {
        self.next_target
    }

    pub fn track(&self) -> &TrackDefinition {
        &self.track
    }

    fn target_point(&self, target: Target) -> GeoPoint {
        match target {
            Target::EnterTrack => self.track.enter_track,
            Target::Waypoint(i) => self.track.waypoints[i],
            Target::StartFinish => self.track.start_finish,
        }
    }

    fn first_lap_target(&self) -> Target {
        if self.track.waypoints.is_empty() {
            Target::StartFinish
        } else {
            Target::Waypoint(0)
        }
    }

    /// Feed the next GPS fix. Returns the boundary crossed on this sample;
    /// `current_lap`/`current_segment` reflect it afterwards.
    pub fn advance(&mut self, position: GeoPoint) -> Option<Crossing> {
        let target_point = self.target_point(self.next_target);
        let prev_distance = match self.last_position {
            Some(last) => distance_feet(last, target_point),
            None => f64::INFINITY,
        };
        let cur_distance = distance_feet(position, target_point);
        self.last_position = Some(position);

        if !(cur_distance > prev_distance && cur_distance < self.crossing_gate_ft) {
            return None;
        }

        let crossing = match self.next_target {
            Target::EnterTrack => {
                self.current_lap = 1;
                self.current_segment = 1;
                self.next_target = self.first_lap_target();
                Crossing::TrackEntry
            }
            Target::StartFinish => {
                self.current_lap += 1;
                self.current_segment = 1;
                self.next_target = self.first_lap_target();
                Crossing::StartFinish
            }
            Target::Waypoint(i) => {
                self.current_segment += 1;
                self.next_target = if i + 1 < self.track.waypoints.len() {
                    Target::Waypoint(i + 1)
                } else {
                    Target::StartFinish
                };
                Crossing::Waypoint(i)
            }
        };
        Some(crossing)
    }
}
