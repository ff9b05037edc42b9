use std::io;

use crate::domain::RecordId;

/// A failure reported by a persistence backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The remote store could not be reached, or the connection failed
    /// mid-request.
    #[error("remote store unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    /// The remote store answered with an error status.
    #[error("remote store rejected the request ({status}): {message}")]
    Remote {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the response body.
        message: String,
    },

    /// The remote endpoint is not a usable URL.
    #[error("invalid remote endpoint '{0}'")]
    Endpoint(String),

    /// The remote store answered with a payload that is not a record.
    #[error("unexpected response from remote store: {0}")]
    Decode(String),

    /// Local storage could not be read or written.
    #[error("local storage I/O failed: {0}")]
    Io(#[from] io::Error),

    /// A local collection document exists but is not a list of records.
    #[error("local document '{key}' is malformed: {source}")]
    Corrupt {
        /// The storage key of the document.
        key: String,
        /// The parse failure.
        #[source]
        source: serde_json::Error,
    },

    /// No record with the given identifier exists in the store.
    #[error("no {collection} record with id {id}")]
    NotFound {
        /// The collection that was searched.
        collection: &'static str,
        /// The missing identifier.
        id: RecordId,
    },
}
