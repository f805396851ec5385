//! Emulator data directory.
//!
//! ```text
//! <dir>/
//! ├─ LOCK              # Advisory lock, one process per directory
//! ├─ <project>.cbor    # Snapshot of every document of the project
//! └─ <project>.cbor.tmp
//! ```
//!
//! The snapshot is rewritten after each commit through a temporary file
//! and a rename, so a reader never sees a half-written snapshot.

use crate::document::Fields;
use crate::error::{StoreError, StoreResult};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

const LOCK_FILE: &str = "LOCK";
const SNAPSHOT_EXT: &str = "cbor";
const TEMP_EXT: &str = "cbor.tmp";

/// Current snapshot format version.
pub(crate) const FORMAT_VERSION: u16 = 1;

/// One stored document in a snapshot.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct SnapshotEntry {
    pub path: String,
    pub version: u64,
    pub fields: Fields,
}

/// Persisted form of a project's documents.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct Snapshot {
    pub format_version: u16,
    pub project_id: String,
    pub next_version: u64,
    pub documents: Vec<SnapshotEntry>,
}

/// Locked emulator directory for one project.
#[derive(Debug)]
pub(crate) struct LocalDir {
    path: PathBuf,
    project_id: String,
    _lock_file: File,
}

impl LocalDir {
    /// Opens an existing directory and takes its lock.
    ///
    /// The directory is not created: a missing directory means the
    /// endpoint is wrong, which is reported as a connection error.
    pub fn open(path: &Path, project_id: &str) -> StoreResult<Self> {
        if !path.is_dir() {
            return Err(StoreError::connection(format!(
                "emulator directory does not exist: {}",
                path.display()
            )));
        }

        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path.join(LOCK_FILE))?;

        if lock_file.try_lock_exclusive().is_err() {
            return Err(StoreError::connection(format!(
                "emulator directory {} is in use by another process",
                path.display()
            )));
        }

        Ok(Self {
            path: path.to_path_buf(),
            project_id: project_id.to_string(),
            _lock_file: lock_file,
        })
    }

    /// Path of the project's snapshot file.
    pub fn snapshot_path(&self) -> PathBuf {
        self.path
            .join(format!("{}.{SNAPSHOT_EXT}", self.project_id))
    }

    fn temp_path(&self) -> PathBuf {
        self.path.join(format!("{}.{TEMP_EXT}", self.project_id))
    }

    /// Loads the snapshot, or `None` for a fresh project.
    pub fn load(&self) -> StoreResult<Option<Snapshot>> {
        let path = self.snapshot_path();
        if !path.exists() {
            return Ok(None);
        }

        let reader = BufReader::new(File::open(&path)?);
        let snapshot: Snapshot = ciborium::from_reader(reader).map_err(|e| {
            StoreError::connection(format!("unreadable snapshot {}: {e}", path.display()))
        })?;

        if snapshot.format_version != FORMAT_VERSION {
            return Err(StoreError::connection(format!(
                "snapshot {} has format v{}, expected v{FORMAT_VERSION}",
                path.display(),
                snapshot.format_version
            )));
        }
        if snapshot.project_id != self.project_id {
            return Err(StoreError::connection(format!(
                "snapshot {} belongs to project {:?}",
                path.display(),
                snapshot.project_id
            )));
        }

        Ok(Some(snapshot))
    }

    /// Writes the snapshot atomically.
    pub fn save(&self, snapshot: &Snapshot) -> StoreResult<()> {
        let temp = self.temp_path();
        {
            let file = File::create(&temp)?;
            let mut writer = BufWriter::new(file);
            ciborium::into_writer(snapshot, &mut writer).map_err(StoreError::codec)?;
            writer.flush()?;
            writer.get_ref().sync_all()?;
        }
        fs::rename(&temp, self.snapshot_path())?;
        Ok(())
    }
}
