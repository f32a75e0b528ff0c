use gatehouse_protocol::{ProtocolError, Username};

/// Errors that can occur in the store layer.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Reading a record failed.
    #[error("load failed for {key}: {source}")]
    LoadFailed {
        key: Username,
        #[source]
        source: std::io::Error,
    },

    /// Writing a record failed. The previous record, if any, is intact.
    #[error("commit failed for {key}: {source}")]
    CommitFailed {
        key: Username,
        #[source]
        source: std::io::Error,
    },

    /// A stored record could not be decoded.
    #[error("record for {key} is unreadable: {source}")]
    Corrupt {
        key: Username,
        #[source]
        source: ProtocolError,
    },

    /// A record could not be encoded for writing. Nothing was written.
    #[error("record for {key} could not be encoded: {source}")]
    Encode {
        key: Username,
        #[source]
        source: ProtocolError,
    },

    /// The file found for `key` holds another username's record.
    #[error("record stored for {key} belongs to {found}")]
    KeyMismatch { key: Username, found: Username },

    /// The backend refused the operation (e.g. it is read-only or offline).
    #[error("store unavailable: {0}")]
    Unavailable(String),
}
