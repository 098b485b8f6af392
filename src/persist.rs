//! Disk I/O: recovering the map at startup and writing snapshots.
//!
//! Writes overwrite the snapshot file in place unless atomic writes are
//! turned on. A crash mid-overwrite leaves a truncated file, which the next
//! startup treats like a corrupt one and starts empty. With atomic writes
//! the bytes go to `<file>.tmp` first and get renamed over the snapshot.
//! That rename is close to atomic on most local file systems. FAT32 and
//! network shares make no such promise.

use crate::backend::MapBackend;
use crate::error::PersistError;
use crate::record::Record;
use crate::serializer::{Serializer, Snapshot};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Reads and decodes the snapshot at `path`. A missing or empty file gives
/// an empty map (not an error).
pub fn load<S: Serializer>(
    path: &Path,
    serializer: &S,
) -> Result<HashMap<String, Record>, PersistError> {
    let bytes = match std::fs::read(path) {
        Ok(b) => b,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(HashMap::new()),
        Err(e) => return Err(e.into()),
    };
    if bytes.is_empty() {
        return Ok(HashMap::new());
    }
    let snapshot = serializer.deserialize(&bytes)?;
    Ok(snapshot.records.into_iter().collect())
}

/// Startup recovery. Like [`load`], but any failure is logged and turned
/// into an empty map so the store can still open.
///
/// Records come back exactly as stored, expired ones included.
pub fn recover<S: Serializer>(path: &Path, serializer: &S) -> HashMap<String, Record> {
    match load(path, serializer) {
        Ok(records) if records.is_empty() => {
            tracing::info!(path = %path.display(), "no snapshot data found, starting empty");
            records
        }
        Ok(records) => {
            tracing::info!(
                path = %path.display(),
                records = records.len(),
                "recovered snapshot"
            );
            records
        }
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "snapshot unreadable, starting empty"
            );
            HashMap::new()
        }
    }
}

/// Overwrite `path` with `bytes`.
pub fn overwrite(path: &Path, bytes: &[u8]) -> Result<(), PersistError> {
    std::fs::write(path, bytes)?;
    Ok(())
}

/// Write `bytes` to `<path>.tmp` and then rename over `path`. This avoids
/// leaving a half-written file if the process crashes mid-write.
pub fn atomic_write(path: &Path, bytes: &[u8]) -> Result<(), PersistError> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("db");
    let tmp = path.with_extension(format!("{ext}.tmp"));
    std::fs::write(&tmp, bytes)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

/// Knows where and how to write snapshots. Cheap to clone; clones share the
/// write lock so the background worker and a manual flush never interleave.
#[derive(Debug, Clone)]
pub struct SnapshotWriter<S> {
    path: PathBuf,
    serializer: S,
    atomic: bool,
    lock: Arc<Mutex<()>>,
}

impl<S: Serializer> SnapshotWriter<S> {
    /// Writer targeting `path`.
    pub fn new(path: PathBuf, serializer: S, atomic: bool) -> Self {
        Self {
            path,
            serializer,
            atomic,
            lock: Arc::new(Mutex::new(())),
        }
    }

    /// Snapshot file location.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Serialize the whole map and replace the file's contents with it.
    pub fn write<M>(&self, map: &M) -> Result<(), PersistError>
    where
        M: MapBackend<String, Record> + ?Sized,
    {
        let _guard = self.lock.lock();
        let snapshot = Snapshot::new(map.iter_snapshot());
        let bytes = self.serializer.serialize(&snapshot)?;
        if self.atomic {
            atomic_write(&self.path, &bytes)?;
        } else {
            overwrite(&self.path, &bytes)?;
        }
        tracing::debug!(
            path = %self.path.display(),
            records = snapshot.records.len(),
            bytes = bytes.len(),
            "snapshot written"
        );
        Ok(())
    }
}
