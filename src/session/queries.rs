// Read-only lap, segment and geographic queries over a session

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::errors::RaceDataError;
use crate::geodesy::GeoPoint;

use super::{Measurement, Session};

/// One lap's pass through a segment
#[derive(Clone, Debug, PartialEq)]
pub struct SegmentTrace<'a> {
    /// Index into `Session::laps()`
    pub lap_index: usize,
    /// Seconds from the first to the last sample of the run, 0 for a single
    /// sample
    pub elapsed: f64,
    pub path: Vec<&'a Measurement>,
}

impl SegmentTrace<'_> {
    /// Single-sample runs have no meaningful duration
    pub fn is_timed(&self) -> bool {
        self.path.len() > 1
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SegmentStats {
    pub count: usize,
    pub fastest: f64,
    pub mean: f64,
    /// Population standard deviation
    pub std_dev: f64,
}

/// Smallest lat/lng box containing a set of measurements
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct Bounds {
    pub southwest: GeoPoint,
    pub northeast: GeoPoint,
}

impl Bounds {
    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(
            (self.southwest.lat + self.northeast.lat) / 2.0,
            (self.southwest.lng + self.northeast.lng) / 2.0,
        )
    }
}

pub fn bounds_of_series<'a>(
    series: impl IntoIterator<Item = &'a Measurement>,
) -> Result<Bounds, RaceDataError> {
    let mut points = series.into_iter().map(Measurement::position);
    let first = points.next().ok_or_else(|| RaceDataError::EmptySegmentQuery {
        reason: "cannot bound an empty series".to_string(),
    })?;
    let (southwest, northeast) = points.fold((first, first), |(sw, ne), p| {
        (
            GeoPoint::new(sw.lat.min(p.lat), sw.lng.min(p.lng)),
            GeoPoint::new(ne.lat.max(p.lat), ne.lng.max(p.lng)),
        )
    });
    Ok(Bounds {
        southwest,
        northeast,
    })
}

/// Midpoint of the series' bounding box, not the centroid of its points
pub fn centerpoint<'a>(
    series: impl IntoIterator<Item = &'a Measurement>,
) -> Result<GeoPoint, RaceDataError> {
    bounds_of_series(series).map(|b| b.center())
}

fn empty_query(reason: String) -> RaceDataError {
    RaceDataError::EmptySegmentQuery { reason }
}

impl Session {
    pub fn lap_time(&self, lap_index: usize) -> Result<f64, RaceDataError> {
        self.laps
            .get(lap_index)
            .map(|l| l.lap_time())
            .ok_or_else(|| empty_query(format!("no lap at index {lap_index}")))
    }

    pub fn lap_times(&self) -> Vec<f64> {
        self.laps.iter().map(|l| l.lap_time()).collect()
    }

    /// Lap times without the out lap and the in lap
    pub fn hot_lap_times(&self) -> Vec<f64> {
        if self.laps.len() < 3 {
            return Vec::new();
        }
        self.laps[1..self.laps.len() - 1]
            .iter()
            .map(|l| l.lap_time())
            .collect()
    }

    /// Every channel name seen in the session, sorted
    pub fn data_channels_available(&self) -> Vec<String> {
        self.laps
            .iter()
            .flat_map(|l| l.measurements())
            .flat_map(|m| m.channels().keys())
            .unique()
            .sorted()
            .cloned()
            .collect()
    }

    /// For each lap, `segment_count()` buckets of measurements. Pre-entry
    /// samples (segment 0) go in the first bucket, so flattening a lap's
    /// buckets gives back the lap.
    pub fn segments_grouped_by_lap(&self) -> Vec<Vec<Vec<&Measurement>>> {
        let count = self.segment_count();
        self.laps
            .iter()
            .map(|lap| {
                let mut buckets = vec![Vec::new(); count];
                for m in lap.measurements() {
                    let index = (m.segment().max(1) as usize).min(count) - 1;
                    buckets[index].push(m);
                }
                buckets
            })
            .collect()
    }

    /// Each lap's run through `segment`, in lap order. Laps that never
    /// reached the segment are left out. Segments are numbered from 1;
    /// pre-entry samples (segment 0) are never a segment.
    pub fn segment_trace(&self, segment: u32) -> Vec<SegmentTrace<'_>> {
        if segment == 0 || segment as usize > self.segment_count() {
            return Vec::new();
        }
        self.laps
            .iter()
            .enumerate()
            .filter_map(|(lap_index, lap)| {
                let path: Vec<&Measurement> = lap
                    .measurements()
                    .iter()
                    .skip_while(|m| m.segment() != segment)
                    .take_while(|m| m.segment() == segment)
                    .collect();
                let (first, last) = (path.first()?, path.last()?);
                let elapsed = if path.len() > 1 {
                    last.timestamp() - first.timestamp()
                } else {
                    0.0
                };
                Some(SegmentTrace {
                    lap_index,
                    elapsed,
                    path,
                })
            })
            .collect()
    }

    fn timed_segment_times(&self, segment: u32, hot_laps_only: bool) -> Vec<f64> {
        let in_lap = self.laps.len().saturating_sub(1);
        self.segment_trace(segment)
            .into_iter()
            .filter(SegmentTrace::is_timed)
            .filter(|t| !hot_laps_only || (t.lap_index > 0 && t.lap_index < in_lap))
            .map(|t| t.elapsed)
            .collect()
    }

    pub fn fastest_segment_time(&self, segment: u32) -> Result<f64, RaceDataError> {
        self.timed_segment_times(segment, false)
            .into_iter()
            .min_by(f64::total_cmp)
            .ok_or_else(|| empty_query(format!("segment {segment} has no timed passes")))
    }

    pub fn fastest_segment_time_excluding_out_and_in_lap(
        &self,
        segment: u32,
    ) -> Result<f64, RaceDataError> {
        self.timed_segment_times(segment, true)
            .into_iter()
            .min_by(f64::total_cmp)
            .ok_or_else(|| empty_query(format!("segment {segment} has no timed passes on hot laps")))
    }

    /// How much slower the second-best pass through `segment` was than the
    /// best. Needs at least two timed passes.
    pub fn segment_time_gap_to_second_fastest(&self, segment: u32) -> Result<f64, RaceDataError> {
        let times = self
            .timed_segment_times(segment, false)
            .into_iter()
            .sorted_by(f64::total_cmp)
            .collect::<Vec<_>>();
        match times.as_slice() {
            [fastest, second, ..] => Ok(second - fastest),
            _ => Err(empty_query(format!(
                "segment {segment} has {} timed passes, need 2 for a gap",
                times.len()
            ))),
        }
    }

    /// Timed passes through `segment`, fastest first. For the final segment a
    /// fastest pass on the in lap is dropped: the in lap stops at the exit
    /// point, so it never covers the whole segment.
    pub fn segment_traces_by_time(&self, segment: u32) -> Vec<SegmentTrace<'_>> {
        let mut traces = self
            .segment_trace(segment)
            .into_iter()
            .filter(SegmentTrace::is_timed)
            .sorted_by(|a, b| a.elapsed.total_cmp(&b.elapsed))
            .collect::<Vec<_>>();
        let is_final_segment = segment as usize == self.segment_count();
        if is_final_segment
            && self.laps.len() > 1
            && traces.first().is_some_and(|t| t.lap_index == self.laps.len() - 1)
        {
            traces.remove(0);
        }
        traces
    }

    pub fn segment_time_stats(&self, segment: u32) -> Result<SegmentStats, RaceDataError> {
        let times = self.timed_segment_times(segment, false);
        let fastest = times
            .iter()
            .copied()
            .min_by(f64::total_cmp)
            .ok_or_else(|| empty_query(format!("segment {segment} has no timed passes")))?;
        let count = times.len();
        let mean = times.iter().sum::<f64>() / count as f64;
        let variance = times.iter().map(|t| (t - mean).powi(2)).sum::<f64>() / count as f64;
        Ok(SegmentStats {
            count,
            fastest,
            mean,
            std_dev: variance.sqrt(),
        })
    }

    pub fn geographic_bounds(&self) -> Result<Bounds, RaceDataError> {
        bounds_of_series(self.laps.iter().flat_map(|l| l.measurements()))
    }

    /// Where to center a map of the whole session
    pub fn map_location(&self) -> Result<GeoPoint, RaceDataError> {
        self.geographic_bounds().map(|b| b.center())
    }
}
