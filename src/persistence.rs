//! Snapshot files and the named profile store
//!
//! A snapshot is written as a pretty-printed JSON [`SnapshotDocument`].
//! Profiles are plain snapshot files named `<profile>.json` inside one
//! directory.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::constants::config;
use crate::topology::{DocumentError, SnapshotDocument, TopologySnapshot};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("no snapshot at {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to access {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{} is not a valid snapshot document", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{} holds an inconsistent snapshot", .path.display())]
    Document {
        path: PathBuf,
        #[source]
        source: DocumentError,
    },

    #[error("failed to encode snapshot")]
    Encode(#[source] serde_json::Error),

    #[error("invalid profile name {0:?}")]
    InvalidProfileName(String),
}

impl StorageError {
    fn io(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            Self::NotFound(path.to_path_buf())
        } else {
            Self::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }
}

/// Write `snapshot` to `path`, creating parent directories.
/// A snapshot that could not be loaded back is refused.
pub fn save_snapshot(path: &Path, snapshot: &TopologySnapshot) -> Result<(), StorageError> {
    snapshot
        .check_identities()
        .map_err(|source| StorageError::Document {
            path: path.to_path_buf(),
            source,
        })?;

    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
    }

    let document = SnapshotDocument::from(snapshot);
    let json = serde_json::to_string_pretty(&document).map_err(StorageError::Encode)?;
    fs::write(path, json).map_err(|e| StorageError::io(path, e))?;

    info!(
        path = %path.display(),
        paths = snapshot.paths.len(),
        modes = snapshot.modes.len(),
        "saved display snapshot"
    );
    Ok(())
}

/// Read a snapshot back
pub fn load_snapshot(path: &Path) -> Result<TopologySnapshot, StorageError> {
    let contents = fs::read_to_string(path).map_err(|e| StorageError::io(path, e))?;

    let document: SnapshotDocument =
        serde_json::from_str(&contents).map_err(|source| StorageError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    let snapshot = TopologySnapshot::try_from(document).map_err(|source| StorageError::Document {
        path: path.to_path_buf(),
        source,
    })?;

    debug!(
        path = %path.display(),
        paths = snapshot.paths.len(),
        modes = snapshot.modes.len(),
        "loaded display snapshot"
    );
    Ok(snapshot)
}

/// Directory of named snapshots
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileStore {
    dir: PathBuf,
}

impl ProfileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `<config dir>/monitor-switcher/Profiles`
    pub fn default_dir() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(config::APP_DIR);
        path.push(config::PROFILES_DIR);
        path
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing profile `name`
    pub fn path_for(&self, name: &str) -> Result<PathBuf, StorageError> {
        let valid = !name.is_empty()
            && name != "."
            && name != ".."
            && !name.contains(['/', '\\'])
            && !name.contains('\0');
        if !valid {
            return Err(StorageError::InvalidProfileName(name.to_string()));
        }
        Ok(self
            .dir
            .join(format!("{name}.{}", config::PROFILE_EXTENSION)))
    }

    /// Profile names, sorted. A missing directory holds no profiles.
    pub fn list(&self) -> Result<Vec<String>, StorageError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StorageError::io(&self.dir, e)),
        };

        let mut names = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| StorageError::io(&self.dir, e))?.path();
            if !path.is_file()
                || path.extension().and_then(|ext| ext.to_str()) != Some(config::PROFILE_EXTENSION)
            {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }
}

/// Remove a stored snapshot
pub fn delete_snapshot(path: &Path) -> Result<(), StorageError> {
    fs::remove_file(path).map_err(|e| StorageError::io(path, e))?;
    info!(path = %path.display(), "deleted display snapshot");
    Ok(())
}
