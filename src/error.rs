//! Courier error types

use std::fmt;

/// Transport-level failure classes.
///
/// Every [`CourierError`] belongs to exactly one kind, and the kind alone
/// decides the `tonic::Code` a failed call terminates with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed or out-of-domain input.
    InvalidArgument,
    /// Store lookup miss.
    NotFound,
    /// Caller deadline passed or caller cancelled before/during work.
    DeadlineExceeded,
    /// Upload size ceiling breached.
    ResourceExhausted,
    /// Store or filesystem failure not attributable to caller input.
    Internal,
    /// Unclassified transport failure while reading a stream.
    Unknown,
}

impl ErrorKind {
    /// Short label used in logs and metrics.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::InvalidArgument => "invalid_argument",
            ErrorKind::NotFound => "not_found",
            ErrorKind::DeadlineExceeded => "deadline_exceeded",
            ErrorKind::ResourceExhausted => "resource_exhausted",
            ErrorKind::Internal => "internal",
            ErrorKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Courier error types
#[derive(Debug, thiserror::Error)]
pub enum CourierError {
    // Caller input
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("malformed identifier: {0:?}")]
    MalformedId(String),

    #[error("upload exceeds {limit} bytes (received {received})")]
    UploadTooLarge { limit: usize, received: usize },

    #[error("upload protocol violation: {0}")]
    UploadProtocol(String),

    // Lookups
    #[error("{collection} record not found: {id}")]
    NotFound { collection: String, id: String },

    // Cancellation
    #[error("deadline exceeded: {0}")]
    DeadlineExceeded(String),

    #[error("call cancelled by peer")]
    Cancelled,

    // Backends
    #[error("store error: {0}")]
    Store(String),

    #[error("blob storage error: {0}")]
    Blob(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Transport
    #[error("stream error: {0}")]
    Stream(String),

    #[error("transport error: {0}")]
    Transport(String),

    /// A status received from a remote peer, preserved as-is.
    #[error("{kind}: {message}")]
    Remote { kind: ErrorKind, message: String },

    // Configuration errors
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl CourierError {
    /// Classify this error into the transport taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CourierError::InvalidArgument(_)
            | CourierError::MalformedId(_)
            | CourierError::UploadProtocol(_) => ErrorKind::InvalidArgument,
            CourierError::UploadTooLarge { .. } => ErrorKind::ResourceExhausted,
            CourierError::NotFound { .. } => ErrorKind::NotFound,
            CourierError::DeadlineExceeded(_) | CourierError::Cancelled => {
                ErrorKind::DeadlineExceeded
            }
            CourierError::Store(_)
            | CourierError::Blob(_)
            | CourierError::Serialization(_)
            | CourierError::Configuration(_) => ErrorKind::Internal,
            CourierError::Stream(_) | CourierError::Transport(_) => ErrorKind::Unknown,
            CourierError::Remote { kind, .. } => *kind,
        }
    }

    pub(crate) fn not_found(collection: &str, id: impl Into<String>) -> Self {
        CourierError::NotFound {
            collection: collection.to_string(),
            id: id.into(),
        }
    }
}

impl From<CourierError> for tonic::Status {
    fn from(err: CourierError) -> Self {
        let message = match &err {
            CourierError::Remote { message, .. } => message.clone(),
            other => other.to_string(),
        };
        match err.kind() {
            ErrorKind::InvalidArgument => tonic::Status::invalid_argument(message),
            ErrorKind::NotFound => tonic::Status::not_found(message),
            ErrorKind::DeadlineExceeded => tonic::Status::deadline_exceeded(message),
            ErrorKind::ResourceExhausted => tonic::Status::resource_exhausted(message),
            ErrorKind::Internal => tonic::Status::internal(message),
            ErrorKind::Unknown => tonic::Status::unknown(message),
        }
    }
}

impl From<tonic::Status> for CourierError {
    fn from(status: tonic::Status) -> Self {
        let kind = match status.code() {
            tonic::Code::InvalidArgument | tonic::Code::OutOfRange => ErrorKind::InvalidArgument,
            tonic::Code::NotFound => ErrorKind::NotFound,
            tonic::Code::DeadlineExceeded | tonic::Code::Cancelled => ErrorKind::DeadlineExceeded,
            tonic::Code::ResourceExhausted => ErrorKind::ResourceExhausted,
            tonic::Code::Internal | tonic::Code::DataLoss => ErrorKind::Internal,
            _ => ErrorKind::Unknown,
        };
        CourierError::Remote {
            kind,
            message: status.message().to_string(),
        }
    }
}

/// Result type alias for Courier operations
pub type Result<T> = std::result::Result<T, CourierError>;
