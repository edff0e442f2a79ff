// End-to-end run of a synthetic circuit: pit lane, three laps of a circle,
// back down the pit lane

use std::f64::consts::TAU;
use std::io::Write;

use racedata::geodesy::distance_feet;
use racedata::session::measurement::{GPS_LAT, GPS_LNG, SPEED};
use racedata::session::Channels;
use racedata::{
    AnalysisConfig, FileBasedRegistry, GeoPoint, InMemoryRegistry, ReportOptions, Session,
    SessionInfo, TrackDefinition, TrackEntry, TrackRegistry, TrimConfig, ingest_file,
    render_text_report,
};
use tempfile::{NamedTempFile, TempDir};

const SAMPLE_INTERVAL_S: f64 = 0.1;
const STEPS_PER_LAP: usize = 60;
const LAPS_DRIVEN: usize = 3;
const PIT_STEP_DEG: f64 = 0.00005;
/// Circle through start/finish (0, 0) and the waypoint (0, 0.001)
const CENTER_LNG: f64 = 0.0005;
const RADIUS_DEG: f64 = 0.0005;

fn circuit() -> TrackDefinition {
    TrackDefinition::new(
        "Circle Raceway".to_string(),
        GeoPoint::new(0.0, 0.0),
        vec![GeoPoint::new(0.0, 0.001)],
        GeoPoint::new(0.0, -0.0005),
        GeoPoint::new(0.0, -0.0005),
    )
}

/// Pit lane in from the west, laps of the circle, pit lane back out
fn driven_path() -> Vec<GeoPoint> {
    let pit_in = (0..=30).map(|i| GeoPoint::new(0.0, -0.0015 + i as f64 * PIT_STEP_DEG));
    let laps = (1..=STEPS_PER_LAP * LAPS_DRIVEN).map(|k| {
        let angle = k as f64 * TAU / STEPS_PER_LAP as f64;
        GeoPoint::new(
            RADIUS_DEG * angle.sin(),
            CENTER_LNG - RADIUS_DEG * angle.cos(),
        )
    });
    let pit_out = (1..=30).map(|i| GeoPoint::new(0.0, -(i as f64) * PIT_STEP_DEG));
    pit_in.chain(laps).chain(pit_out).collect()
}

fn channels(position: GeoPoint) -> Channels {
    Channels::from([
        (GPS_LAT.to_string(), position.lat),
        (GPS_LNG.to_string(), position.lng),
        (SPEED.to_string(), 80.0),
    ])
}

fn driven_session() -> Session {
    let mut session = Session::new(
        SessionInfo::default().with_track_name("Circle Raceway"),
        Some(circuit()),
    );
    for (i, position) in driven_path().into_iter().enumerate() {
        session
            .add_measurement(i as f64 * SAMPLE_INTERVAL_S, channels(position))
            .unwrap();
    }
    session.trim_ends(&TrimConfig::default()).unwrap();
    session
}

#[test]
fn test_out_lap_hot_laps_and_in_lap() {
    let session = driven_session();
    assert_eq!(session.num_laps(), LAPS_DRIVEN + 1);
    let numbers: Vec<u32> = session.laps().iter().map(|l| l.lap_number()).collect();
    assert_eq!(numbers, vec![1, 2, 3, 4]);

    let hot = session.hot_lap_times();
    assert_eq!(hot.len(), 2);
    let full_lap = (STEPS_PER_LAP - 1) as f64 * SAMPLE_INTERVAL_S;
    for time in hot {
        assert!((time - full_lap).abs() < 1e-6, "hot lap took {time}s");
    }
    assert!(session.lap_times().iter().all(|t| *t >= 0.0));
}

#[test]
fn test_hot_laps_have_both_segments() {
    let session = driven_session();
    let grouped = session.segments_grouped_by_lap();
    for buckets in &grouped[1..grouped.len() - 1] {
        assert_eq!(buckets.len(), 2);
        assert!(buckets.iter().all(|b| !b.is_empty()));
    }
    for segment in 1..=2 {
        let fastest = session.fastest_segment_time(segment).unwrap();
        assert!(fastest.is_finite() && fastest > 0.0);
        let hot = session
            .fastest_segment_time_excluding_out_and_in_lap(segment)
            .unwrap();
        assert!(hot >= fastest);
    }
    assert!(session.fastest_segment_time(3).is_err());
}

#[test]
fn test_trim_cuts_at_enter_and_exit_points() {
    let session = driven_session();
    let track = circuit();
    let first = session.laps()[0].first().position();
    let last = session.laps()[session.num_laps() - 1].last().position();
    assert!(distance_feet(first, track.enter_track) <= 15.0);
    assert!(distance_feet(last, track.exit_track) <= 15.0);
    // Pit lane beyond the enter and exit points is gone
    assert!(session.geographic_bounds().unwrap().southwest.lng > -0.00051);
}

#[test]
fn test_bounds_cover_the_circle() {
    let session = driven_session();
    let bounds = session.geographic_bounds().unwrap();
    assert!((bounds.southwest.lat + RADIUS_DEG).abs() < 1e-9);
    assert!((bounds.northeast.lat - RADIUS_DEG).abs() < 1e-9);
    assert!((bounds.northeast.lng - 0.001).abs() < 1e-9);
    let center = session.map_location().unwrap();
    assert!(center.lat.abs() < 1e-9);
}

fn write_aim_file(path_points: &[GeoPoint]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "\"Format\",\"AiM CSV File\"").unwrap();
    writeln!(file, "\"Venue\",\"Circle Raceway\"").unwrap();
    writeln!(file, "\"Racer\",\"Jane Doe\"").unwrap();
    writeln!(file, "\"Date\",\"03/04/2023\"").unwrap();
    writeln!(file, "\"Time\",\"10:22\"").unwrap();
    writeln!(file).unwrap();
    writeln!(file, "\"Time\",\"GPS Latitude\",\"GPS Longitude\",\"GPS Speed\"").unwrap();
    writeln!(file, "\"s\",\"deg\",\"deg\",\"mph\"").unwrap();
    writeln!(file).unwrap();
    for (i, p) in path_points.iter().enumerate() {
        writeln!(
            file,
            "{:.3},{:.10},{:.10},80.0",
            i as f64 * SAMPLE_INTERVAL_S,
            p.lat,
            p.lng
        )
        .unwrap();
    }
    file.flush().unwrap();
    file
}

#[test]
fn test_aim_file_through_file_registry() {
    let tracks_dir = TempDir::new().unwrap();
    let mut registry = FileBasedRegistry::new(tracks_dir.path().to_path_buf()).unwrap();
    registry
        .save_entry(&TrackEntry::new(vec!["circle".to_string()], circuit()))
        .unwrap();
    // Reloading picks the saved file up again
    let registry = FileBasedRegistry::new(tracks_dir.path().to_path_buf()).unwrap();
    assert!(registry.resolve("Circle Raceway").unwrap().is_some());

    let file = write_aim_file(&driven_path());
    let session = ingest_file(file.path(), &registry, &AnalysisConfig::default(), None).unwrap();
    assert_eq!(session.num_laps(), 4);
    assert_eq!(session.hot_lap_times().len(), 2);
    assert_eq!(
        session.info().report_file_stem(),
        "Jane_Doe-Circle_Raceway-2023-03-04-10_22"
    );

    let report = render_text_report(
        &session,
        &ReportOptions {
            segments: true,
            ..ReportOptions::default()
        },
    );
    assert!(report.contains("Lap 2: 00:05.900"));
    assert!(report.contains("Segment 2: fastest"));
}

#[test]
fn test_track_name_override_for_untitled_file() {
    let mut registry = InMemoryRegistry::new();
    registry.register(TrackEntry::new(vec!["circle".to_string()], circuit()));

    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "# RaceRender Data: TrackAddict 4.6.3").unwrap();
    writeln!(file, "\"Time\",\"Latitude\",\"Longitude\"").unwrap();
    for (i, p) in driven_path().iter().enumerate() {
        writeln!(file, "{:.3},{:.10},{:.10}", i as f64 * 0.1, p.lat, p.lng).unwrap();
    }
    file.flush().unwrap();

    let without = ingest_file(file.path(), &registry, &AnalysisConfig::default(), None).unwrap();
    assert_eq!(without.num_laps(), 1);

    let with = ingest_file(
        file.path(),
        &registry,
        &AnalysisConfig::default(),
        Some("Circle"),
    )
    .unwrap();
    assert_eq!(with.num_laps(), 4);
}
