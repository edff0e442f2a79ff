// Plain-text session report

use std::fmt::Write;
use std::path::{Path, PathBuf};

use crate::session::Session;

/// Which sections `render_text_report` includes
#[derive(Clone, Debug, PartialEq)]
pub struct ReportOptions {
    pub laps: bool,
    pub segments: bool,
    /// Per-lap delta to the fastest time in each segment
    pub delta: bool,
    /// List the data channels and skip the analysis sections
    pub list_channels: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            laps: true,
            segments: false,
            delta: false,
            list_channels: false,
        }
    }
}

/// `MM:SS.sss`. Minutes keep growing past 99 rather than rolling into hours.
pub fn format_lap_time(seconds: f64) -> String {
    let minutes = (seconds / 60.0).trunc();
    let rest = seconds - minutes * 60.0;
    format!("{:02}:{:06.3}", minutes as u64, rest)
}

pub fn render_text_report(session: &Session, options: &ReportOptions) -> String {
    // Writing to a String never fails
    let mut out = String::new();
    let info = session.info();
    let _ = writeln!(
        out,
        "Analyzing data from {}",
        info.source_file.as_deref().unwrap_or("<unknown>")
    );
    let header = [
        ("Track name", info.track_name.as_deref()),
        ("Track description", info.track_description.as_deref()),
        ("Driver", info.driver_name.as_deref()),
        ("Vehicle", info.vehicle.as_deref()),
        ("Session date", info.session_date.as_deref()),
        ("Session time", info.session_time.as_deref()),
    ];
    for (label, value) in header {
        if let Some(value) = value {
            let _ = writeln!(out, "{label}: {value}");
        }
    }
    let _ = writeln!(out);

    if options.list_channels {
        let _ = writeln!(out, "These data channels are available:");
        for channel in session.data_channels_available() {
            let _ = writeln!(out, "- {channel}");
        }
        return out;
    }

    if options.laps {
        let _ = writeln!(out, "Lap times");
        let _ = writeln!(out, "---------");
        for lap in session.laps() {
            let _ = writeln!(
                out,
                "Lap {}: {}",
                lap.lap_number(),
                format_lap_time(lap.lap_time())
            );
        }
        let hot = session.hot_lap_times();
        if let Some(best) = hot.iter().copied().min_by(f64::total_cmp) {
            let _ = writeln!(out, "Best hot lap: {}", format_lap_time(best));
        }
        let _ = writeln!(out);
    }

    if options.segments {
        let _ = writeln!(out, "Segment times");
        let _ = writeln!(out, "-------------");
        for segment in 1..=session.segment_count() as u32 {
            render_segment(&mut out, session, segment, options.delta);
        }
    }
    out
}

fn render_segment(out: &mut String, session: &Session, segment: u32, delta: bool) {
    let stats = match session.segment_time_stats(segment) {
        Ok(stats) => stats,
        Err(e) => {
            let _ = writeln!(out, "Segment {segment}: {e}");
            return;
        }
    };
    let _ = write!(
        out,
        "Segment {segment}: fastest {}, mean {}, std dev {:.3}s",
        format_lap_time(stats.fastest),
        format_lap_time(stats.mean),
        stats.std_dev
    );
    match session.segment_time_gap_to_second_fastest(segment) {
        Ok(gap) => {
            let _ = writeln!(out, ", gap to second {gap:.3}s");
        }
        Err(_) => {
            let _ = writeln!(out);
        }
    }
    if let Ok(hot) = session.fastest_segment_time_excluding_out_and_in_lap(segment) {
        let _ = writeln!(out, "  fastest on a hot lap: {}", format_lap_time(hot));
    }
    if delta {
        for trace in session.segment_trace(segment).iter().filter(|t| t.is_timed()) {
            let lap = &session.laps()[trace.lap_index];
            let _ = writeln!(
                out,
                "  Lap {}: {} (+{:.3}s)",
                lap.lap_number(),
                format_lap_time(trace.elapsed),
                trace.elapsed - stats.fastest
            );
        }
    }
}

/// `dir/stem.ext`, or `dir/stem-N.ext` with the first free N when that file
/// already exists
pub fn unique_output_path(dir: &Path, stem: &str, extension: &str) -> PathBuf {
    let candidate = dir.join(format!("{stem}.{extension}"));
    if !candidate.exists() {
        return candidate;
    }
    (1..)
        .map(|n| dir.join(format!("{stem}-{n}.{extension}")))
        .find(|p| !p.exists())
        .unwrap_or(candidate)
}
