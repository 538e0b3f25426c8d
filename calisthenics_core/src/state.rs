//! Profile and workout persistence with file locking.
//!
//! The engine itself never touches the filesystem. This module is the
//! export/import side: plain JSON written atomically, read under a shared
//! lock.

use crate::profile::UserProfile;
use crate::workout::Workout;
use crate::{Error, Result};
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Read and parse a JSON file; `Ok(None)` when it is missing or unusable
fn read_locked<T: DeserializeOwned>(path: &Path, what: &str) -> Result<Option<T>> {
    if !path.exists() {
        tracing::info!("No {} file found at {:?}", what, path);
        return Ok(None);
    }

    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            tracing::warn!("Unable to open {} file {:?}: {}", what, path, e);
            return Ok(None);
        }
    };

    if let Err(e) = file.lock_shared() {
        tracing::warn!("Unable to lock {} file {:?}: {}", what, path, e);
        return Ok(None);
    }

    let mut contents = String::new();
    let mut reader = std::io::BufReader::new(&file);
    if let Err(e) = reader.read_to_string(&mut contents) {
        let _ = file.unlock();
        tracing::warn!("Failed to read {} file {:?}: {}", what, path, e);
        return Ok(None);
    }

    file.unlock()?;

    match serde_json::from_str::<T>(&contents) {
        Ok(value) => {
            tracing::debug!("Loaded {} from {:?}", what, path);
            Ok(Some(value))
        }
        Err(e) => {
            tracing::warn!("Failed to parse {} file {:?}: {}", what, path, e);
            Ok(None)
        }
    }
}

/// Write JSON through a locked temp file renamed over `path`
fn write_atomic<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| Error::Profile(format!("{:?} has no parent directory", path)))?;
    std::fs::create_dir_all(parent)?;

    let temp = NamedTempFile::new_in(parent)?;
    temp.as_file().lock_exclusive()?;

    {
        let mut writer = std::io::BufWriter::new(temp.as_file());
        let contents = serde_json::to_string_pretty(value)?;
        writer.write_all(contents.as_bytes())?;
        writer.flush()?;
    }

    temp.as_file().sync_all()?;
    temp.as_file().unlock()?;
    temp.persist(path).map_err(|e| Error::Io(e.error))?;
    Ok(())
}

impl UserProfile {
    /// Load a profile, falling back to a fresh default one
    ///
    /// A missing, unreadable or corrupt file is logged and replaced by
    /// `UserProfile::default()`.
    pub fn load(path: &Path) -> Result<Self> {
        Ok(read_locked(path, "profile")?.unwrap_or_default())
    }

    /// Save atomically: temp file, fsync, rename
    pub fn save(&self, path: &Path) -> Result<()> {
        write_atomic(self, path)?;
        tracing::debug!("Saved profile to {:?}", path);
        Ok(())
    }

    /// Load, modify and save the profile in one step
    pub fn update<F>(path: &Path, f: F) -> Result<Self>
    where
        F: FnOnce(&mut UserProfile) -> Result<()>,
    {
        let mut profile = Self::load(path)?;
        f(&mut profile)?;
        profile.save(path)?;
        Ok(profile)
    }
}

/// The last generated workout, if one was saved and still parses
pub fn load_workout(path: &Path) -> Result<Option<Workout>> {
    read_locked(path, "workout")
}

pub fn save_workout(workout: &Workout, path: &Path) -> Result<()> {
    write_atomic(workout, path)?;
    tracing::debug!("Saved workout {} to {:?}", workout.id(), path);
    Ok(())
}
