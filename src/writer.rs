use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use serde::{Deserialize, Serialize};
use serde_jsonlines::JsonLinesWriter;

use crate::errors::RaceDataError;
use crate::session::{Measurement, Session, SessionInfo};

/// One line of a session export, borrowed from the session being written
#[derive(Serialize)]
enum SessionLineRef<'a> {
    Info(&'a SessionInfo),
    Measurement(&'a Measurement),
}

/// One line of a session export as read back
#[derive(Deserialize, Debug, PartialEq)]
pub enum SessionLine {
    Info(SessionInfo),
    Measurement(Box<Measurement>),
}

/// Write `session` as JSON lines: the session info first, then every
/// measurement in recording order with its lap and segment
pub fn write_session_jsonl(file: &Path, session: &Session) -> Result<(), RaceDataError> {
    let output = File::create(file).map_err(|e| RaceDataError::WriterError { source: e })?;
    let mut writer = JsonLinesWriter::new(BufWriter::new(output));
    writer
        .write(&SessionLineRef::Info(session.info()))
        .map_err(|e| RaceDataError::WriterError { source: e })?;
    for measurement in session.laps().iter().flat_map(|l| l.measurements()) {
        writer
            .write(&SessionLineRef::Measurement(measurement))
            .map_err(|e| RaceDataError::WriterError { source: e })?;
    }
    writer
        .into_inner()
        .flush()
        .map_err(|e| RaceDataError::WriterError { source: e })
}

/// Read an export written by `write_session_jsonl`
pub fn read_session_jsonl(file: &Path) -> Result<Vec<SessionLine>, RaceDataError> {
    serde_jsonlines::json_lines(file)
        .map_err(|e| RaceDataError::ImportIOError { source: e })?
        .collect::<Result<Vec<SessionLine>, std::io::Error>>()
        .map_err(|e| RaceDataError::ImportIOError { source: e })
}
