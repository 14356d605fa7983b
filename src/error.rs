//! Error handling for the bridge layer.
//!
//! Engine failures arrive as [`EngineError`] values from the [`Engine`](crate::Engine)
//! entry points and are converted into the crate-wide [`Error`]. Contract
//! violations (use after dispose, double dispose, re-entrant engine calls) are
//! not represented here: they panic.

use thiserror::Error;

/// Result type for bridge operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Result type returned by fallible engine entry points.
pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// Failure category reported by the foreign engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineErrorKind {
    /// Unrecoverable for this request (malformed input, unsupported format, ...).
    Generic,
    /// The requested data has not arrived yet; re-issue the call later.
    TryLater,
}

/// An error raised by the foreign engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineError {
    pub kind: EngineErrorKind,
    pub message: String,
}

impl EngineError {
    pub fn generic(message: impl Into<String>) -> Self {
        Self {
            kind: EngineErrorKind::Generic,
            message: message.into(),
        }
    }

    pub fn try_later(message: impl Into<String>) -> Self {
        Self {
            kind: EngineErrorKind::TryLater,
            message: message.into(),
        }
    }
}

/// Stable error codes.
///
/// Codes 1-9 are engine failures, 10-19 lifecycle, 20+ marshaling and
/// argument errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Generic engine failure
    Engine = 1,
    /// Data not yet available, retry later
    TryLater = 2,

    /// Engine module not instantiated yet
    NotReady = 10,
    /// Engine module failed to instantiate
    Init = 11,

    /// Foreign allocator exhausted
    OutOfMemory = 20,
    /// Invalid UTF-8 in foreign string
    InvalidUtf8 = 21,
    /// Host string contains an interior NUL
    InteriorNul = 22,
    /// Page numbers start at 1
    InvalidPageNumber = 23,
    /// JSON parse error
    JsonParse = 24,
}

/// Errors surfaced by the bridge.
#[derive(Error, Debug)]
pub enum Error {
    /// The engine reported an unrecoverable failure for this operation.
    #[error("engine error: {0}")]
    Engine(String),

    /// The engine needs data that has not arrived yet.
    #[error("data not yet available: {0}")]
    TryLater(String),

    /// A bridge operation was attempted before the module became ready.
    #[error("engine module is not ready")]
    NotReady,

    /// Instantiating the engine module failed.
    #[error("failed to instantiate engine module: {0}")]
    Init(String),

    /// The foreign allocator could not satisfy a request.
    #[error("foreign allocation of {size} bytes failed")]
    OutOfMemory { size: usize },

    /// Bytes read back from foreign memory are not valid UTF-8.
    #[error("invalid UTF-8 in {context}")]
    InvalidUtf8 { context: &'static str },

    /// A host string cannot be NUL-terminated because it contains a NUL.
    #[error("interior NUL byte in {context}")]
    InteriorNul { context: &'static str },

    /// Page numbers are 1-based.
    #[error("invalid page number {number} (page numbers start at 1)")]
    InvalidPageNumber { number: usize },

    /// Engine-produced JSON could not be parsed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::Engine(_) => ErrorCode::Engine,
            Error::TryLater(_) => ErrorCode::TryLater,
            Error::NotReady => ErrorCode::NotReady,
            Error::Init(_) => ErrorCode::Init,
            Error::OutOfMemory { .. } => ErrorCode::OutOfMemory,
            Error::InvalidUtf8 { .. } => ErrorCode::InvalidUtf8,
            Error::InteriorNul { .. } => ErrorCode::InteriorNul,
            Error::InvalidPageNumber { .. } => ErrorCode::InvalidPageNumber,
            Error::Json(_) => ErrorCode::JsonParse,
        }
    }

    /// True when the same operation may succeed if re-issued later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::TryLater(_))
    }
}

impl From<EngineError> for Error {
    fn from(e: EngineError) -> Self {
        match e.kind {
            EngineErrorKind::Generic => Error::Engine(e.message),
            EngineErrorKind::TryLater => Error::TryLater(e.message),
        }
    }
}
