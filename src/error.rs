use thiserror::Error;

/// Low-level cause behind a [`IngestError::StorageUnavailable`].
#[derive(Debug, Error)]
pub enum StorageFault {
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum IngestError {
    /// The input is not a recognizable feed document.
    #[error("not a recognizable feed: {0}")]
    FeedParse(String),

    /// The database cannot be created, opened or written.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(#[from] StorageFault),

    /// Rows already stored in `table` repeat under the requested identity,
    /// so its unique index cannot be built.
    #[error("table '{table}' already holds entries that repeat under identity ({identity})")]
    IdentityConflict { table: String, identity: String },

    /// A single entry carries none of the identity fields. Recovered per entry.
    #[error("entry #{index} has no value for any of the identity fields ({fields})")]
    EntryDecode { index: usize, fields: String },
}

impl From<rusqlite::Error> for IngestError {
    fn from(e: rusqlite::Error) -> Self {
        IngestError::StorageUnavailable(StorageFault::Sqlite(e))
    }
}

impl From<std::io::Error> for IngestError {
    fn from(e: std::io::Error) -> Self {
        IngestError::StorageUnavailable(StorageFault::Io(e))
    }
}

pub type Result<T> = std::result::Result<T, IngestError>;
