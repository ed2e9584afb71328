//! Snapshot persistence with file locking.
//!
//! The core exposes the session, ledger, and catalog overrides as one
//! serializable snapshot; the host decides when to load and save it. Saves
//! are atomic (temp file, fsync, rename) and loads degrade to the default
//! Idle snapshot on a missing or corrupt file.

use crate::types::{ConsumptionRecord, DrinkDefinition, Session};
use crate::{Error, Result};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// The serializable state of a tracker
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub session: Session,

    /// Most-recent-first, matching ledger order
    #[serde(default)]
    pub records: Vec<ConsumptionRecord>,

    /// Custom drink definitions active when the snapshot was taken
    #[serde(default)]
    pub catalog_overrides: Vec<DrinkDefinition>,
}

impl Snapshot {
    /// Load a snapshot from a file with shared locking.
    ///
    /// Returns the default snapshot if the file doesn't exist.
    /// If the file is corrupted, logs a warning and returns the default.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("No snapshot file found, starting idle");
            return Ok(Self::default());
        }

        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!(
                    "Unable to open snapshot file {:?}: {}. Starting idle.",
                    path,
                    e
                );
                return Ok(Self::default());
            }
        };

        // Acquire shared lock for reading
        if let Err(e) = file.lock_shared() {
            tracing::warn!(
                "Unable to lock snapshot file {:?}: {}. Starting idle.",
                path,
                e
            );
            return Ok(Self::default());
        }

        let mut contents = String::new();
        let mut reader = std::io::BufReader::new(&file);
        if let Err(e) = reader.read_to_string(&mut contents) {
            let _ = file.unlock();
            tracing::warn!(
                "Failed to read snapshot file {:?}: {}. Starting idle.",
                path,
                e
            );
            return Ok(Self::default());
        }

        file.unlock()?;

        match serde_json::from_str::<Snapshot>(&contents) {
            Ok(snapshot) => {
                tracing::debug!("Loaded snapshot from {:?}", path);
                Ok(snapshot)
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to parse snapshot file {:?}: {}. Starting idle.",
                    path,
                    e
                );
                Ok(Self::default())
            }
        }
    }

    /// Save the snapshot to a file with exclusive locking.
    ///
    /// Atomically writes by:
    /// 1. Writing to a temp file
    /// 2. Syncing to disk
    /// 3. Renaming over the original
    pub fn save(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // Create unique temp file in the same directory for atomic rename
        let temp = NamedTempFile::new_in(path.parent().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::Other, "snapshot path missing parent")
        })?)?;

        // Acquire exclusive lock on the temp file to serialize concurrent writers
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string(self)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        // Atomically replace old snapshot file
        temp.persist(path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved snapshot to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SessionStatus;
    use chrono::{Duration, TimeZone, Utc};
    use uuid::Uuid;

    fn sample_snapshot() -> Snapshot {
        let t0 = Utc.with_ymd_and_hms(2025, 6, 14, 20, 0, 0).unwrap();
        Snapshot {
            session: Session {
                id: Some(Uuid::new_v4()),
                status: SessionStatus::Active,
                started_at: Some(t0),
                ended_at: None,
                expert_mode: false,
            },
            records: vec![
                ConsumptionRecord {
                    id: 1,
                    drink_id: "sake".into(),
                    portion: 1.0,
                    recorded_at: t0 + Duration::minutes(20),
                },
                ConsumptionRecord {
                    id: 0,
                    drink_id: "wine".into(),
                    portion: 0.5,
                    recorded_at: t0,
                },
            ],
            catalog_overrides: vec![],
        }
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("session.json");

        let snapshot = sample_snapshot();
        snapshot.save(&path).unwrap();

        let loaded = Snapshot::load(&path).unwrap();
        assert_eq!(loaded, snapshot);
    }

    #[test]
    fn test_load_nonexistent_returns_default() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("nonexistent.json");

        let snapshot = Snapshot::load(&path).unwrap();
        assert_eq!(snapshot.session.status, SessionStatus::Idle);
        assert!(snapshot.records.is_empty());
        assert!(snapshot.catalog_overrides.is_empty());
    }

    #[test]
    fn test_corrupted_snapshot_returns_default() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("corrupted.json");

        std::fs::write(&path, "{ invalid json }").unwrap();

        let snapshot = Snapshot::load(&path).unwrap();
        assert_eq!(snapshot.session.status, SessionStatus::Idle);
        assert!(snapshot.records.is_empty());
    }

    #[test]
    fn test_atomic_save_leaves_no_litter() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("session.json");

        sample_snapshot().save(&path).unwrap();

        assert!(path.exists());
        let extras: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name() != "session.json")
            .collect();
        assert!(
            extras.is_empty(),
            "Expected only session.json, found extras: {:?}",
            extras
        );
    }

    #[test]
    fn test_save_overwrites_previous() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("session.json");

        sample_snapshot().save(&path).unwrap();
        Snapshot::default().save(&path).unwrap();

        let loaded = Snapshot::load(&path).unwrap();
        assert_eq!(loaded, Snapshot::default());
    }
}
