// Track definition lookup by session track name

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::errors::RaceDataError;
use crate::track::types::TrackDefinition;

const BUILTIN_TRACKS: [(&str, &str); 3] = [
    ("vir_full", include_str!("../../tracks/vir_full.json")),
    ("sebring", include_str!("../../tracks/sebring.json")),
    ("roebling_road", include_str!("../../tracks/roebling_road.json")),
];

/// Trait defining the interface for resolving a track name to its geometry
pub trait TrackRegistry: Sync {
    /// Resolve a session track name. `Ok(None)` means no known track matches,
    /// an error means a matching definition exists but is unusable.
    fn resolve(&self, track_name: &str) -> Result<Option<TrackDefinition>, RaceDataError>;

    /// List the names of all known tracks
    fn list_tracks(&self) -> Vec<String>;
}

/// A track definition together with the keywords that select it
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TrackEntry {
    /// Every keyword must appear in the session's track name, ignoring case
    pub keywords: Vec<String>,
    #[serde(flatten)]
    pub definition: TrackDefinition,
}

impl TrackEntry {
    pub fn new(keywords: Vec<String>, definition: TrackDefinition) -> Self {
        Self {
            keywords,
            definition,
        }
    }

    pub fn matches(&self, track_name: &str) -> bool {
        let haystack = track_name.to_lowercase();
        !self.keywords.is_empty()
            && self
                .keywords
                .iter()
                .all(|k| haystack.contains(&k.to_lowercase()))
    }

    fn from_json(source: &str, content: &str) -> Result<Self, RaceDataError> {
        serde_json::from_str(content).map_err(|e| RaceDataError::MalformedTrackDefinition {
            track_name: source.to_string(),
            reason: format!("Failed to parse JSON: {}", e),
        })
    }
}

fn resolve_in(
    entries: &[TrackEntry],
    track_name: &str,
) -> Result<Option<TrackDefinition>, RaceDataError> {
    match entries.iter().find(|e| e.matches(track_name)) {
        Some(entry) => {
            entry.definition.validate()?;
            debug!(
                "Resolved \"{}\" to track {}",
                track_name, entry.definition.track_name
            );
            Ok(Some(entry.definition.clone()))
        }
        None => {
            debug!("No track definition matches \"{}\"", track_name);
            Ok(None)
        }
    }
}

/// Registry held entirely in memory, checked in registration order
#[derive(Default, Clone, Debug)]
pub struct InMemoryRegistry {
    entries: Vec<TrackEntry>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the tracks shipped with racedata
    pub fn builtin() -> Result<Self, RaceDataError> {
        let mut registry = Self::new();
        for entry in builtin_entries()? {
            registry.register(entry);
        }
        Ok(registry)
    }

    pub fn register(&mut self, entry: TrackEntry) {
        self.entries.push(entry);
    }
}

impl TrackRegistry for InMemoryRegistry {
    fn resolve(&self, track_name: &str) -> Result<Option<TrackDefinition>, RaceDataError> {
        resolve_in(&self.entries, track_name)
    }

    fn list_tracks(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|e| e.definition.track_name.clone())
            .collect()
    }
}

fn builtin_entries() -> Result<Vec<TrackEntry>, RaceDataError> {
    BUILTIN_TRACKS
        .iter()
        .map(|(source, content)| TrackEntry::from_json(source, content))
        .collect()
}

/// Registry backed by a directory of JSON track files. User files take
/// precedence over the built-in tracks.
pub struct FileBasedRegistry {
    /// Directory the track files were read from
    storage_path: PathBuf,
    /// Loaded entries, user files first
    entries: Vec<TrackEntry>,
}

impl FileBasedRegistry {
    /// Load every `*.json` file in `storage_path`. A missing directory is not
    /// an error, only the built-in tracks are available then.
    pub fn new(storage_path: PathBuf) -> Result<Self, RaceDataError> {
        let mut entries = Vec::new();

        if storage_path.is_dir() {
            let mut files = fs::read_dir(&storage_path)
                .map_err(|e| RaceDataError::TrackRegistryIOError { source: e })?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
                .collect::<Vec<_>>();
            // read_dir order is platform dependent
            files.sort();

            for path in files {
                entries.push(Self::load_from_file(&path)?);
            }
            info!(
                "Loaded {} track definitions from {:?}",
                entries.len(),
                storage_path
            );
        } else {
            warn!(
                "Track directory {:?} does not exist, using built-in tracks only",
                storage_path
            );
        }

        entries.extend(builtin_entries()?);

        Ok(Self {
            storage_path,
            entries,
        })
    }

    /// Create the registry from the default application data directory
    pub fn new_default() -> Result<Self, RaceDataError> {
        Self::new(Self::default_storage_path()?)
    }

    /// Get the default storage path for track definitions
    pub fn default_storage_path() -> Result<PathBuf, RaceDataError> {
        let app_data_dir = dirs::data_dir().ok_or(RaceDataError::NoConfigDir)?;
        Ok(app_data_dir.join("racedata").join("tracks"))
    }

    /// Save a track definition into the storage directory
    pub fn save_entry(&mut self, entry: &TrackEntry) -> Result<PathBuf, RaceDataError> {
        entry.definition.validate()?;
        if !self.storage_path.exists() {
            fs::create_dir_all(&self.storage_path)
                .map_err(|e| RaceDataError::TrackRegistryIOError { source: e })?;
        }

        let file_path = self.file_path_for_track(&entry.definition.track_name);
        let content = serde_json::to_string_pretty(entry).map_err(|e| {
            RaceDataError::TrackSerializeError {
                track_name: entry.definition.track_name.clone(),
                source: e,
            }
        })?;
        fs::write(&file_path, content)
            .map_err(|e| RaceDataError::TrackRegistryIOError { source: e })?;

        self.entries.insert(0, entry.clone());
        Ok(file_path)
    }

    /// Get the storage directory path
    pub fn storage_path(&self) -> &Path {
        &self.storage_path
    }

    fn load_from_file(path: &Path) -> Result<TrackEntry, RaceDataError> {
        let content = fs::read_to_string(path)
            .map_err(|e| RaceDataError::TrackRegistryIOError { source: e })?;
        let source = path.file_stem().and_then(|s| s.to_str()).unwrap_or("unknown");
        TrackEntry::from_json(source, &content)
    }

    /// Generate a filesystem-safe file name for a track
    fn file_path_for_track(&self, track_name: &str) -> PathBuf {
        let normalized: String = track_name
            .to_lowercase()
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { '_' })
            .collect();
        self.storage_path.join(format!("{}.json", normalized))
    }
}

impl TrackRegistry for FileBasedRegistry {
    fn resolve(&self, track_name: &str) -> Result<Option<TrackDefinition>, RaceDataError> {
        resolve_in(&self.entries, track_name)
    }

    fn list_tracks(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|e| e.definition.track_name.clone())
            .collect()
    }
}
