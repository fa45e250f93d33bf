//! Main Crate Error

#[derive(thiserror::Error, Debug)]
/// Kad server crate error enum.
pub enum Error {
    /// Request is missing a field, or carries one that doesn't fit the request type.
    #[error("Malformed request: {0}")]
    RequestMalformed(&'static str),

    /// Request key is not a valid content id.
    #[error("Invalid content id: {0}")]
    InvalidKey(String),

    #[error("Record failed validation: {0}")]
    /// The record was rejected by the [crate::collaborators::Validator].
    ValidationFailed(#[from] ValidationError),

    /// The record lost conflict resolution against the locally stored one.
    #[error("Record is older than the existing record")]
    StaleRecord,

    /// Genuine I/O failure from the storage collaborator.
    #[error("Storage failure: {0}")]
    StorageFailure(#[source] StorageError),

    /// The request [crate::Context] was cancelled or its deadline passed.
    #[error("Operation cancelled")]
    Cancelled,

    /// Message type tag that doesn't correspond to any known request type.
    #[error("Unknown message type: {0}")]
    UnknownMessageType(i32),

    #[error("Failed to parse packet bytes: {0}")]
    BencodeError(#[from] serde_bencode::Error),

    /// Indicates that the server you're trying to build requires more information.
    #[error("{0} is required")]
    BuilderMissingField(&'static str),
}

impl Error {
    /// Returns `true` for errors caused by the shape of the request itself.
    pub fn is_malformed(&self) -> bool {
        matches!(self, Error::RequestMalformed(_) | Error::InvalidKey(_))
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
/// Returned by collaborators when the request [crate::Context] is cancelled.
#[error("Operation cancelled")]
pub struct Cancelled;

#[derive(thiserror::Error, Debug)]
/// Errors returned by a [crate::collaborators::Datastore].
pub enum StorageError {
    #[error("Key not found")]
    NotFound,

    #[error("Operation cancelled")]
    Cancelled,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(thiserror::Error, Debug)]
/// Errors returned by a [crate::collaborators::Validator].
pub enum ValidationError {
    #[error("No validator registered for namespace {0:?}")]
    UnknownNamespace(String),

    #[error("Invalid record key")]
    InvalidKey,

    #[error("Invalid record public key")]
    InvalidPublicKey,

    #[error("Invalid record signature")]
    InvalidSignature,

    #[error("Malformed record value: {0}")]
    MalformedValue(String),

    #[error("No values to select from")]
    NoCandidates,
}

impl From<Cancelled> for Error {
    fn from(_: Cancelled) -> Self {
        Error::Cancelled
    }
}

impl From<Cancelled> for StorageError {
    fn from(_: Cancelled) -> Self {
        StorageError::Cancelled
    }
}

impl From<StorageError> for Error {
    fn from(error: StorageError) -> Self {
        match error {
            StorageError::Cancelled => Error::Cancelled,
            error => Error::StorageFailure(error),
        }
    }
}
