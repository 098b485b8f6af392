//! Unified error type for all store operations.

use thiserror::Error;

/// Things that can go wrong when using the store.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A required argument was null. Only a JSON `null` payload can trigger
    /// this from Rust.
    #[error("{argument} for key '{key}' must not be null")]
    NullArgument {
        /// Key the argument was meant for.
        key: String,
        /// Which argument was null.
        argument: &'static str,
    },

    /// Key is empty or longer than [`MAX_KEY_LEN`](crate::validation::MAX_KEY_LEN).
    #[error(
        "Key size must be greater than 0 and less than or equal to 32. Provided key length: {length} (key '{key}')"
    )]
    InvalidKeyLength {
        /// The rejected key.
        key: String,
        /// Its length in characters.
        length: usize,
    },

    /// Payload is not JSON object text.
    #[error("value for key '{key}' is not a valid JSON object: {reason}")]
    InvalidJson {
        /// Key the payload was meant for.
        key: String,
        /// What the parser complained about.
        reason: String,
    },

    /// An unexpired record already holds this key.
    #[error("Key '{key}' already exists")]
    KeyExists {
        /// The duplicate key.
        key: String,
    },

    /// The store holds zero records.
    #[error("'{key}' key not found in database. Available records: 0")]
    EmptyStore {
        /// The key that was asked for.
        key: String,
    },

    /// The key is absent.
    #[error("'{key}' key not found in database. Available records: {records}")]
    KeyNotFound {
        /// The key that was asked for.
        key: String,
        /// Record count at the time of the lookup.
        records: usize,
    },

    /// The record's TTL ran out. It was removed by this lookup.
    #[error("Key '{key}' exceeded its time to live limit and was deleted")]
    Expired {
        /// The evicted key.
        key: String,
    },

    /// Snapshot I/O or (de)serialization problem.
    #[error(transparent)]
    Persistence(#[from] PersistError),

    /// Bad configuration (invalid file name, zero interval, etc.).
    #[error("config error: {0}")]
    Config(String),
}

/// Failures while reading or writing the snapshot file.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PersistError {
    /// File system problem (read, write, rename).
    #[error("i/o error: {0}")]
    Io(String),
    /// Failed to serialize the map to bytes.
    #[error("serialization error: {0}")]
    Serialize(String),
    /// Failed to deserialize bytes back into the map.
    #[error("deserialization error: {0}")]
    Deserialize(String),
    /// Snapshot was written by an incompatible format version.
    #[error("unsupported snapshot version {found} (expected {expected})")]
    UnsupportedVersion {
        /// Version found in the file.
        found: u32,
        /// Version this build reads.
        expected: u32,
    },
}

impl From<std::io::Error> for PersistError {
    fn from(err: std::io::Error) -> Self {
        PersistError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for PersistError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_io() {
            PersistError::Io(err.to_string())
        } else if err.is_syntax() || err.is_eof() || err.is_data() {
            PersistError::Deserialize(err.to_string())
        } else {
            PersistError::Serialize(err.to_string())
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Persistence(err.into())
    }
}

/// Result alias using our [`Error`] type.
pub type Result<T> = std::result::Result<T, Error>;
