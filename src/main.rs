use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser, Subcommand};
use log::{LevelFilter, error, info, warn};

use racedata::report::unique_output_path;
use racedata::{
    AnalysisConfig, FileBasedRegistry, RaceDataError, ReportOptions, TrackRegistry, ingest_file,
    ingest_files, render_text_report, write_session_jsonl,
};

const DEFAULT_OUTPUT_DIR: &str = "racedata-output";

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Args {
    /// Repeat for more log output
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Config file to use instead of the one in the user config directory
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Split logger files into laps and segments and write a text report
    Analyze {
        /// Data file to analyze. Can be given multiple times.
        #[arg(short, long = "file", required = true)]
        files: Vec<PathBuf>,

        /// Track name for files that don't carry one (e.g. TrackAddict)
        #[arg(short, long)]
        trackname: Option<String>,

        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the report to the terminal as well
        #[arg(long)]
        text_results: bool,

        #[arg(long)]
        no_laps: bool,

        #[arg(long)]
        segments: bool,

        /// Per-lap delta to the fastest time in each segment
        #[arg(long)]
        delta: bool,

        /// List the data channels available in the files
        #[arg(long)]
        list_datapoints: bool,
    },
    /// Write a processed session as JSON lines
    Export {
        #[arg(short, long)]
        file: PathBuf,

        #[arg(short, long)]
        trackname: Option<String>,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List the known track definitions
    Tracks,
}

fn load_config(path: Option<&Path>) -> Result<AnalysisConfig, RaceDataError> {
    match path {
        Some(path) => AnalysisConfig::from_path(path),
        None => Ok(AnalysisConfig::from_local_file()?.unwrap_or_default()),
    }
}

fn load_registry(config: &AnalysisConfig) -> Result<FileBasedRegistry, RaceDataError> {
    match &config.tracks_dir {
        Some(dir) => FileBasedRegistry::new(dir.clone()),
        None => FileBasedRegistry::new_default(),
    }
}

fn output_dir(config: &AnalysisConfig, output: Option<&PathBuf>) -> Result<PathBuf, RaceDataError> {
    let dir = output
        .cloned()
        .or_else(|| config.output_dir.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));
    std::fs::create_dir_all(&dir).map_err(|e| RaceDataError::WriterError { source: e })?;
    Ok(dir)
}

fn analyze(
    config: &AnalysisConfig,
    files: &[PathBuf],
    trackname: Option<&str>,
    output: Option<&PathBuf>,
    text_results: bool,
    options: &ReportOptions,
) -> Result<(), RaceDataError> {
    let registry = load_registry(config)?;
    let dir = output_dir(config, output)?;

    let mut first_failure = None;
    for (path, result) in ingest_files(files, &registry, config, trackname) {
        let session = match result {
            Ok(session) => session,
            Err(e) => {
                error!("Could not analyze {}: {e}", path.display());
                first_failure.get_or_insert(e);
                continue;
            }
        };
        let report = render_text_report(&session, options);
        if text_results {
            println!("{report}");
        }
        let report_path = unique_output_path(&dir, &session.info().report_file_stem(), "txt");
        std::fs::write(&report_path, report)
            .map_err(|e| RaceDataError::WriterError { source: e })?;
        info!("Wrote report to {}", report_path.display());
    }
    first_failure.map_or(Ok(()), Err)
}

fn export(
    config: &AnalysisConfig,
    file: &Path,
    trackname: Option<&str>,
    output: Option<&PathBuf>,
) -> Result<(), RaceDataError> {
    let registry = load_registry(config)?;
    let session = ingest_file(file, &registry, config, trackname)?;
    let target = match output {
        Some(path) if path.extension().is_some() => path.clone(),
        other => unique_output_path(
            &output_dir(config, other)?,
            &session.info().report_file_stem(),
            "jsonl",
        ),
    };
    write_session_jsonl(&target, &session)?;
    info!("Exported {} laps to {}", session.num_laps(), target.display());
    Ok(())
}

fn tracks(config: &AnalysisConfig) -> Result<(), RaceDataError> {
    let registry = load_registry(config)?;
    info!("User tracks are read from {}", registry.storage_path().display());
    for track in registry.list_tracks() {
        println!("{track}");
    }
    Ok(())
}

fn main() {
    let cli = Args::parse();
    let level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    colog::default_builder().filter_level(level).init();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            warn!("Could not load config, using defaults: {e}");
            AnalysisConfig::default()
        }
    };

    let result = match &cli.command {
        Commands::Analyze {
            files,
            trackname,
            output,
            text_results,
            no_laps,
            segments,
            delta,
            list_datapoints,
        } => {
            let options = ReportOptions {
                laps: !no_laps,
                segments: *segments,
                delta: *delta,
                list_channels: *list_datapoints,
            };
            analyze(
                &config,
                files,
                trackname.as_deref(),
                output.as_ref(),
                *text_results,
                &options,
            )
        }
        Commands::Export {
            file,
            trackname,
            output,
        } => export(&config, file, trackname.as_deref(), output.as_ref()),
        Commands::Tracks => tracks(&config),
    };

    if let Err(e) = result {
        error!("{e}");
        std::process::exit(1);
    }
}
