//! Store configuration and the builder that opens a [`Store`].

use crate::backend::MapBackend;
use crate::error::{Error, Result};
use crate::flush::Persister;
use crate::persist::{recover, SnapshotWriter};
use crate::record::Record;
use crate::serializer::JsonSerializer;
use crate::store::Store;
use crate::DefaultBackend;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Snapshot file name used when none is given.
pub const DEFAULT_FILE_NAME: &str = "datastore.db";

/// Persister period used when none is given.
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(1);

/// Everything [`StoreBuilder::build`] needs to open a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Directory holding the snapshot file. Created on open if missing.
    pub path: PathBuf,
    /// Snapshot file name inside `path`.
    pub file_name: String,
    /// How often the persister checks for changes.
    pub flush_interval: Duration,
    /// Write indented JSON instead of a single line.
    pub pretty: bool,
    /// Write through a temp file and rename instead of overwriting in place.
    pub atomic_writes: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("."),
            file_name: DEFAULT_FILE_NAME.to_string(),
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            pretty: false,
            atomic_writes: false,
        }
    }
}

impl StoreConfig {
    /// Full path of the snapshot file.
    pub fn snapshot_path(&self) -> PathBuf {
        self.path.join(&self.file_name)
    }

    /// Reject settings the store can't run with.
    pub fn validate(&self) -> Result<()> {
        let name = Path::new(&self.file_name);
        let plain = name.file_name().is_some_and(|n| n == name.as_os_str());
        if self.file_name.is_empty() || !plain {
            return Err(Error::Config(format!(
                "file name must be a plain file name, got {:?}",
                self.file_name
            )));
        }
        if self.flush_interval.is_zero() {
            return Err(Error::Config("flush interval must be non-zero".into()));
        }
        Ok(())
    }
}

/// Configures and opens a [`Store`].
///
/// ```rust,no_run
/// use local_store::Store;
/// use std::time::Duration;
///
/// let store = Store::builder()
///     .path("./data")
///     .file_name("users.db")
///     .flush_interval(Duration::from_millis(500))
///     .pretty(true)
///     .build()
///     .unwrap();
/// ```
pub struct StoreBuilder<M = DefaultBackend> {
    config: StoreConfig,
    _marker: PhantomData<M>,
}

impl<M> StoreBuilder<M>
where
    M: MapBackend<String, Record> + Default + 'static,
{
    /// Builder with default settings.
    pub fn new() -> Self {
        Self::from_config(StoreConfig::default())
    }

    /// Builder starting from an existing config.
    pub fn from_config(config: StoreConfig) -> Self {
        Self {
            config,
            _marker: PhantomData,
        }
    }

    /// Directory for the snapshot file (default: current directory).
    pub fn path(mut self, dir: impl AsRef<Path>) -> Self {
        self.config.path = dir.as_ref().to_path_buf();
        self
    }

    /// Snapshot file name (default: `datastore.db`).
    pub fn file_name(mut self, name: impl Into<String>) -> Self {
        self.config.file_name = name.into();
        self
    }

    /// How often the persister runs (default: 1 second).
    pub fn flush_interval(mut self, interval: Duration) -> Self {
        self.config.flush_interval = interval;
        self
    }

    /// Write human-readable JSON with indentation (default: compact).
    pub fn pretty(mut self, yes: bool) -> Self {
        self.config.pretty = yes;
        self
    }

    /// Write snapshots via temp file + rename (default: overwrite in place).
    pub fn atomic_writes(mut self, yes: bool) -> Self {
        self.config.atomic_writes = yes;
        self
    }

    /// The config as it stands.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Recover the snapshot (or start empty), start the persister, and hand
    /// back the store.
    pub fn build(self) -> Result<Store<M>> {
        self.config.validate()?;
        std::fs::create_dir_all(&self.config.path)?;

        let snapshot_path = self.config.snapshot_path();
        let serializer = if self.config.pretty {
            JsonSerializer::pretty()
        } else {
            JsonSerializer::new()
        };

        let map = Arc::new(M::default());
        for (k, v) in recover(&snapshot_path, &serializer) {
            map.insert(k, v);
        }

        let writer = SnapshotWriter::new(snapshot_path, serializer, self.config.atomic_writes);
        let persister = {
            let map = Arc::clone(&map);
            let writer = writer.clone();
            Persister::start(self.config.flush_interval, move || {
                writer.write(map.as_ref())
            })
        };

        tracing::info!(
            path = %writer.path().display(),
            records = map.map_len(),
            "store opened"
        );
        Ok(Store::from_parts(map, writer, persister))
    }
}

impl<M> Default for StoreBuilder<M>
where
    M: MapBackend<String, Record> + Default + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<M> std::fmt::Debug for StoreBuilder<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreBuilder")
            .field("config", &self.config)
            .finish()
    }
}
