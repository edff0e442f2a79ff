use std::fs::File;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::RaceDataError;
use crate::session::{DEFAULT_CROSSING_GATE_FT, TrimConfig};

const CONFIG_DIR_NAME: &str = "racedata";
const CONFIG_FILE_NAME: &str = "config.json";

/// User-tunable analysis settings
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnalysisConfig {
    /// A distance minimum closer than this to a reference point is a crossing
    pub crossing_gate_ft: f64,
    pub trim: TrimConfig,
    /// Where reports and exports go when the CLI isn't given `--output`
    pub output_dir: Option<PathBuf>,
    /// Extra track definitions, searched before the built-in ones
    pub tracks_dir: Option<PathBuf>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            crossing_gate_ft: DEFAULT_CROSSING_GATE_FT,
            trim: TrimConfig::default(),
            output_dir: None,
            tracks_dir: None,
        }
    }
}

impl AnalysisConfig {
    pub fn default_path() -> Result<PathBuf, RaceDataError> {
        Ok(dirs::config_dir()
            .ok_or(RaceDataError::NoConfigDir)?
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME))
    }

    /// Load the user's config file. `Ok(None)` when there isn't one yet.
    pub fn from_local_file() -> Result<Option<Self>, RaceDataError> {
        let config_path = Self::default_path()?;
        if config_path.exists() {
            Self::from_path(&config_path).map(Some)
        } else {
            Ok(None)
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, RaceDataError> {
        let file = File::open(path).map_err(|e| RaceDataError::ConfigIOError { source: e })?;
        serde_json::from_reader(file).map_err(|e| RaceDataError::ConfigSerializeError { source: e })
    }

    pub fn save(&self) -> Result<(), RaceDataError> {
        self.save_to(&Self::default_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), RaceDataError> {
        if let Some(parent) = path.parent()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)
                .map_err(|e| RaceDataError::ConfigIOError { source: e })?;
        }

        let file = File::create(path).map_err(|e| RaceDataError::ConfigIOError { source: e })?;
        serde_json::to_writer_pretty(file, self)
            .map_err(|e| RaceDataError::ConfigSerializeError { source: e })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE_NAME);
        let config = AnalysisConfig {
            crossing_gate_ft: 40.0,
            trim: TrimConfig {
                enter_threshold_ft: 20.0,
                exit_threshold_ft: None,
            },
            output_dir: Some(PathBuf::from("/tmp/reports")),
            tracks_dir: None,
        };
        config.save_to(&path).unwrap();
        assert_eq!(AnalysisConfig::from_path(&path).unwrap(), config);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, r#"{"crossing_gate_ft": 35.0}"#).unwrap();

        let config = AnalysisConfig::from_path(&path).unwrap();
        assert_eq!(config.crossing_gate_ft, 35.0);
        assert_eq!(config.trim, TrimConfig::default());
        assert_eq!(config.output_dir, None);
    }

    #[test]
    fn test_invalid_json_is_serialize_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(
            AnalysisConfig::from_path(&path),
            Err(RaceDataError::ConfigSerializeError { .. })
        ));
    }
}
