//! Snapshot document and serialization layer. Defaults to JSON via serde_json.
//!
//! Implement [`Serializer`] if you need a different on-disk format.

use crate::error::PersistError;
use crate::record::Record;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Format version written into every snapshot.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Everything that goes into the snapshot file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Format version, see [`SNAPSHOT_VERSION`].
    pub version: u32,
    /// Full record map. Sorted so identical state gives identical bytes.
    pub records: BTreeMap<String, Record>,
}

impl Snapshot {
    /// Current-version snapshot of the given entries.
    pub fn new(records: impl IntoIterator<Item = (String, Record)>) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            records: records.into_iter().collect(),
        }
    }
}

/// Converts snapshots to/from bytes for persistence.
pub trait Serializer: Send + Sync {
    /// Encode a snapshot to bytes.
    fn serialize(&self, snapshot: &Snapshot) -> Result<Vec<u8>, PersistError>;

    /// Decode bytes back into a snapshot. Implementations must reject
    /// versions they don't understand.
    fn deserialize(&self, bytes: &[u8]) -> Result<Snapshot, PersistError>;
}

/// JSON serializer with optional pretty-printing.
#[derive(Debug, Clone, Default)]
pub struct JsonSerializer {
    pretty: bool,
}

impl JsonSerializer {
    /// Compact JSON (single line, no extra whitespace).
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretty-printed JSON with indentation, easier to read by hand.
    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl Serializer for JsonSerializer {
    fn serialize(&self, snapshot: &Snapshot) -> Result<Vec<u8>, PersistError> {
        let bytes = if self.pretty {
            serde_json::to_vec_pretty(snapshot)
        } else {
            serde_json::to_vec(snapshot)
        };
        bytes.map_err(|e| PersistError::Serialize(e.to_string()))
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<Snapshot, PersistError> {
        // Peek at the version first so a future format with a different
        // record shape reports the version, not a field error.
        #[derive(Deserialize)]
        struct Header {
            version: u32,
        }

        let header: Header = serde_json::from_slice(bytes)?;
        if header.version != SNAPSHOT_VERSION {
            return Err(PersistError::UnsupportedVersion {
                found: header.version,
                expected: SNAPSHOT_VERSION,
            });
        }
        Ok(serde_json::from_slice(bytes)?)
    }
}
