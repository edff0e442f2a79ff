use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use racedata::importer::{RawSample, RawSession};
use racedata::session::Channels;
use racedata::session::measurement::{GPS_LAT, GPS_LNG, RPM, SPEED, THROTTLE};
use racedata::{
    AnalysisConfig, GeoPoint, InMemoryRegistry, Session, SessionInfo, TrackDefinition, TrackEntry,
    ingest,
};
use std::f64::consts::TAU;
use std::time::Duration;

/// 20Hz logger going round a ~1.2mi circle, about 90s a lap
const SAMPLES_PER_LAP: usize = 1800;

fn circle_track() -> TrackDefinition {
    TrackDefinition::new(
        "Bench Ring".to_string(),
        GeoPoint::new(0.0, 0.0),
        vec![
            GeoPoint::new(0.0025, 0.0025),
            GeoPoint::new(0.0, 0.005),
            GeoPoint::new(-0.0025, 0.0025),
        ],
        GeoPoint::new(0.0, -0.0005),
        GeoPoint::new(0.0, -0.0005),
    )
}

fn raw_session(laps: usize) -> RawSession {
    let pit_in = (0..=50).map(|i| (0.0, -0.001 + i as f64 * 0.00002));
    let ring = (1..=SAMPLES_PER_LAP * laps).map(|k| {
        let angle = k as f64 * TAU / SAMPLES_PER_LAP as f64;
        (0.0025 * angle.sin(), 0.0025 - 0.0025 * angle.cos())
    });
    let pit_out = (1..=50).map(|i| (0.0, -(i as f64) * 0.00002));
    let samples = pit_in
        .chain(ring)
        .chain(pit_out)
        .enumerate()
        .map(|(i, (lat, lng))| RawSample {
            timestamp: i as f64 * 0.05,
            channels: Channels::from([
                (GPS_LAT.to_string(), lat),
                (GPS_LNG.to_string(), lng),
                (SPEED.to_string(), 75.0),
                (THROTTLE.to_string(), 100.0),
                (RPM.to_string(), 6200.0),
            ]),
        })
        .collect();
    RawSession {
        info: SessionInfo::default().with_track_name("Bench Ring"),
        samples,
    }
}

fn registry() -> InMemoryRegistry {
    let mut registry = InMemoryRegistry::new();
    registry.register(TrackEntry::new(vec!["bench".to_string()], circle_track()));
    registry
}

fn bench_ingest(c: &mut Criterion) {
    let mut group = c.benchmark_group("ingest");
    group.measurement_time(Duration::from_secs(10));
    let registry = registry();
    let config = AnalysisConfig::default();

    for laps in [1, 5, 20] {
        let raw = raw_session(laps);
        group.bench_with_input(BenchmarkId::new("laps", laps), &raw, |b, raw| {
            b.iter(|| black_box(ingest(raw.clone(), &registry, &config, None).unwrap()));
        });
    }
    group.finish();
}

fn bench_segment_queries(c: &mut Criterion) {
    let mut group = c.benchmark_group("segment_queries");
    let session: Session = ingest(raw_session(20), &registry(), &AnalysisConfig::default(), None)
        .unwrap();

    group.bench_function("fastest_segment_times", |b| {
        b.iter(|| {
            for segment in 1..=session.segment_count() as u32 {
                let _ = black_box(session.fastest_segment_time(segment));
            }
        });
    });

    group.bench_function("segments_grouped_by_lap", |b| {
        b.iter(|| black_box(session.segments_grouped_by_lap()));
    });

    group.bench_function("geographic_bounds", |b| {
        b.iter(|| black_box(session.geographic_bounds()));
    });

    group.finish();
}

criterion_group!(benches, bench_ingest, bench_segment_queries);
criterion_main!(benches);
