use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
    sync::Mutex,
};

use log::{debug, error, info, trace, warn};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::{Note, PinError, Result};

/// Where the note collection is loaded from and saved to.
pub trait NoteStore: Send + Sync {
    /// Returns the stored notes and the next id to allocate.
    fn load(&self) -> Result<(Vec<Note>, u64)>;

    /// Replaces the stored collection.
    fn save(&self, notes: &[Note], next_id: u64) -> Result<()>;
}

/// On-disk layout of a note file.
#[derive(Debug, Serialize, Deserialize)]
struct NoteFile {
    #[serde(default)]
    notes: Vec<Note>,
    #[serde(default = "first_id")]
    next_id: u64,
}

fn first_id() -> u64 {
    1
}

/// A single YAML note file.
#[derive(Debug, Clone)]
pub struct YamlStorage {
    path: PathBuf,
}

impl YamlStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn validate(notes: &[Note], path: &Path) -> Result<()> {
        let mut seen = std::collections::HashSet::with_capacity(notes.len());
        for note in notes {
            if note.id == 0 || note.id == u64::MAX {
                let message = format!("{} contains a note with id {}", path.display(), note.id);
                error!("{}", message);
                return Err(PinError::InvalidFormat { message });
            }
            if !seen.insert(note.id) {
                let message = format!("{} contains duplicate note id {}", path.display(), note.id);
                error!("{}", message);
                return Err(PinError::InvalidFormat { message });
            }
        }
        Ok(())
    }
}

impl NoteStore for YamlStorage {
    fn load(&self) -> Result<(Vec<Note>, u64)> {
        if !self.path.exists() {
            info!("{} does not exist yet, starting empty", self.path.display());
            return Ok((Vec::new(), 1));
        }

        debug!("Loading notes from {}", self.path.display());
        let content = fs::read_to_string(&self.path).map_err(|e| {
            error!("Failed to read note file {}: {}", self.path.display(), e);
            PinError::Io(e)
        })?;

        if content.trim().is_empty() {
            debug!("{} is empty", self.path.display());
            return Ok((Vec::new(), 1));
        }

        let file: NoteFile = serde_yaml::from_str(&content).map_err(|e| {
            error!("Failed to parse note file {}: {}", self.path.display(), e);
            PinError::Yaml(e)
        })?;
        Self::validate(&file.notes, &self.path)?;

        info!("Loaded {} notes from {}", file.notes.len(), self.path.display());
        Ok((file.notes, file.next_id))
    }

    /// Writes the file atomically via a temporary file in the same directory.
    fn save(&self, notes: &[Note], next_id: u64) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        if !dir.exists() {
            debug!("Creating parent directory: {}", dir.display());
            fs::create_dir_all(&dir).map_err(|e| {
                error!("Failed to create directory {}: {}", dir.display(), e);
                PinError::DirectoryError { path: dir.clone() }
            })?;
        }

        let mut sorted = notes.to_vec();
        sorted.sort_by_key(|note| note.id);
        let file = NoteFile {
            notes: sorted,
            next_id,
        };

        trace!("Serializing {} notes to YAML", file.notes.len());
        let yaml = serde_yaml::to_string(&file).map_err(|e| {
            error!("Failed to serialize notes: {}", e);
            PinError::Yaml(e)
        })?;

        let mut temp_file = NamedTempFile::new_in(&dir).map_err(|e| {
            error!("Failed to create temporary file: {}", e);
            PinError::Io(e)
        })?;
        temp_file.write_all(yaml.as_bytes()).map_err(|e| {
            error!("Failed to write to temporary file: {}", e);
            PinError::Io(e)
        })?;
        temp_file.flush()?;

        temp_file.persist(&self.path).map_err(|e| {
            error!("Failed to persist file {}: {}", self.path.display(), e.error);
            PinError::Io(e.error)
        })?;

        debug!("Saved {} notes to {}", file.notes.len(), self.path.display());
        Ok(())
    }
}

/// Keeps the collection in memory and counts saves.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

#[derive(Debug, Default, Clone)]
struct MemoryState {
    notes: Vec<Note>,
    next_id: u64,
    saves: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_notes(notes: Vec<Note>, next_id: u64) -> Self {
        Self {
            state: Mutex::new(MemoryState {
                notes,
                next_id,
                saves: 0,
            }),
        }
    }

    /// Number of `save` calls so far.
    pub fn save_count(&self) -> usize {
        self.lock().saves
    }

    /// The collection as of the last save.
    pub fn saved(&self) -> (Vec<Note>, u64) {
        let state = self.lock();
        (state.notes.clone(), state.next_id)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        // A panic while holding the lock leaves plain data behind; keep using it
        self.state.lock().unwrap_or_else(|poisoned| {
            warn!("Memory store lock was poisoned");
            poisoned.into_inner()
        })
    }
}

impl NoteStore for MemoryStore {
    fn load(&self) -> Result<(Vec<Note>, u64)> {
        let state = self.lock();
        Ok((state.notes.clone(), state.next_id.max(1)))
    }

    fn save(&self, notes: &[Note], next_id: u64) -> Result<()> {
        let mut state = self.lock();
        state.notes = notes.to_vec();
        state.next_id = next_id;
        state.saves += 1;
        Ok(())
    }
}
