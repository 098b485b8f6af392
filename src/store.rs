//! The store: validated create/read/delete over a concurrent map, with lazy
//! TTL eviction and background snapshots.

use crate::backend::MapBackend;
use crate::config::StoreBuilder;
use crate::error::{Error, Result};
use crate::flush::{PersistStats, Persister};
use crate::persist::SnapshotWriter;
use crate::record::{now_millis, Record};
use crate::serializer::JsonSerializer;
use crate::validation::{parse_object, validate_create};
use crate::{DefaultBackend, JsonObject};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;

/// Persistent JSON-object store with per-key TTL.
///
/// Generic over the map backend `M`. [`Store::open`] and [`Store::builder`]
/// use [`DefaultBackend`]; pick another one with
/// [`StoreBuilder::<M>::new()`](StoreBuilder::new).
///
/// All operations are thread-safe and never touch the disk, except
/// [`flush`](Self::flush). Wrap the store in an `Arc` to share it.
///
/// Dropping the store stops the persister and waits for its last cycle, so
/// pending changes are written unless the write fails.
pub struct Store<M = DefaultBackend> {
    map: Arc<M>,
    writer: SnapshotWriter<JsonSerializer>,
    persister: Persister,
}

impl Store<DefaultBackend> {
    /// Open (or create) `<dir>/datastore.db` with default settings.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        Self::builder().path(dir).build()
    }

    /// Open (or create) `./datastore.db`.
    pub fn open_default() -> Result<Self> {
        Self::builder().build()
    }

    /// Start configuring a new store. Call [`.build()`](StoreBuilder::build)
    /// when ready.
    pub fn builder() -> StoreBuilder<DefaultBackend> {
        StoreBuilder::new()
    }
}

impl<M> Store<M>
where
    M: MapBackend<String, Record> + 'static,
{
    pub(crate) fn from_parts(
        map: Arc<M>,
        writer: SnapshotWriter<JsonSerializer>,
        persister: Persister,
    ) -> Self {
        Self {
            map,
            writer,
            persister,
        }
    }

    // ---- writes ----

    /// Store `payload` under `key` with no expiry.
    ///
    /// Fails with [`Error::KeyExists`] if an unexpired record already holds
    /// the key. An expired one is silently replaced.
    pub fn create(&self, key: &str, payload: &str) -> Result<()> {
        self.create_with_ttl(key, payload, -1)
    }

    /// Store `payload` under `key`, readable for `ttl_seconds`. A negative TTL
    /// means no expiry.
    ///
    /// Checks run in this order: JSON `null` payload
    /// ([`Error::NullArgument`]), key length ([`Error::InvalidKeyLength`]),
    /// payload is an object ([`Error::InvalidJson`]).
    pub fn create_with_ttl(&self, key: &str, payload: &str, ttl_seconds: i64) -> Result<()> {
        validate_create(key, payload)?;
        self.insert_record(key, Record::new(payload, ttl_seconds))
    }

    /// Like [`create_with_ttl`](Self::create_with_ttl) for an already-built
    /// JSON value. `Value::Null` fails with [`Error::NullArgument`].
    pub fn create_value(&self, key: &str, value: &Value, ttl_seconds: i64) -> Result<()> {
        if value.is_null() {
            return Err(Error::NullArgument {
                key: key.to_owned(),
                argument: "value",
            });
        }
        self.create_with_ttl(key, &value.to_string(), ttl_seconds)
    }

    fn insert_record(&self, key: &str, record: Record) -> Result<()> {
        let now = now_millis();
        let inserted = self
            .map
            .insert_unless(key.to_owned(), record, |existing| {
                !existing.is_expired_at(now)
            });
        if !inserted {
            return Err(Error::KeyExists {
                key: key.to_owned(),
            });
        }
        self.persister.notify();
        Ok(())
    }

    /// Remove `key`. A missing key is fine as long as the store isn't empty.
    pub fn delete(&self, key: &str) -> Result<()> {
        if self.map.map_len() == 0 {
            return Err(Error::EmptyStore {
                key: key.to_owned(),
            });
        }
        self.map.remove(&key.to_owned());
        self.persister.notify();
        Ok(())
    }

    // ---- reads ----

    /// Fetch the object stored under `key`.
    ///
    /// An expired record is removed by this call and reported as
    /// [`Error::Expired`]; the next read of the key gets
    /// [`Error::KeyNotFound`].
    pub fn read(&self, key: &str) -> Result<JsonObject> {
        let record = self.live_record(key)?;
        parse_object(key, record.payload())
    }

    /// Like [`read`](Self::read) but returns the payload text as stored.
    pub fn read_raw(&self, key: &str) -> Result<String> {
        self.live_record(key).map(|r| r.payload().to_owned())
    }

    fn live_record(&self, key: &str) -> Result<Record> {
        let records = self.map.map_len();
        if records == 0 {
            return Err(Error::EmptyStore {
                key: key.to_owned(),
            });
        }
        let owned = key.to_owned();
        let record = self.map.get(&owned).ok_or_else(|| Error::KeyNotFound {
            key: key.to_owned(),
            records,
        })?;

        let now = now_millis();
        if record.is_expired_at(now) {
            // Only evict if nobody re-created the key in the meantime.
            if self
                .map
                .remove_if(&owned, |current| current.is_expired_at(now))
                .is_some()
            {
                tracing::debug!(key, "evicted expired record");
                self.persister.notify();
            }
            return Err(Error::Expired { key: owned });
        }
        Ok(record)
    }

    /// Number of records, expired-but-unread ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.map_len()
    }

    /// `true` when the store has no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Path to the snapshot file.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.writer.path()
    }

    // ---- persistence ----

    /// Write the current map to disk now, on the calling thread.
    ///
    /// Unlike a background write, a failure here is returned and the store
    /// stays dirty so the persister tries again.
    pub fn flush(&self) -> Result<()> {
        self.persister.take_dirty();
        if let Err(e) = self.writer.write(self.map.as_ref()) {
            self.persister.notify();
            return Err(e.into());
        }
        Ok(())
    }

    /// Ask the persister to stop after one more cycle. Returns immediately
    /// and doesn't wait for that cycle's write. Safe to call more than once.
    ///
    /// The store keeps working in memory afterwards, but later changes are
    /// not persisted.
    pub fn close(&self) {
        self.persister.request_shutdown();
    }

    /// Like [`close`](Self::close), but waits until the persister's final
    /// cycle is done, so everything changed before the call is on disk (or
    /// the write failed and was logged).
    pub fn close_blocking(&self) {
        self.persister.shutdown_and_join();
    }

    /// Background write counters.
    #[must_use]
    pub fn persist_stats(&self) -> PersistStats {
        self.persister.stats()
    }
}

impl<M> std::fmt::Debug for Store<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("path", &self.writer.path())
            .field("persister", &self.persister)
            .finish_non_exhaustive()
    }
}
