//! Error types for the lexer, interpreter and loader.
//!
//! Uses [`thiserror`] for error derivation. [`BackendError`] covers both the
//! recoverable per-operator conditions (which the interpreter turns into
//! warnings) and loader failures, and converts to [`PdfError`].

use pdfpage_core::{ExtractWarningCode, PdfError};
use thiserror::Error;

/// Error type for content stream processing and PDF loading.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Lexer-level syntax error at a byte offset of the content stream.
    #[error("malformed content stream at byte {offset}: {reason}")]
    MalformedStream { offset: usize, reason: String },

    /// An operator keyword the interpreter does not know.
    #[error("unknown operator '{0}'")]
    UnknownOperator(String),

    /// A named resource missing from the resource tables in scope.
    #[error("{kind} resource /{name} not found")]
    ResourceNotFound { kind: &'static str, name: String },

    /// Form XObjects nested deeper than allowed.
    #[error("form XObject nesting depth {depth} exceeds limit {limit}")]
    RecursionLimitExceeded { depth: usize, limit: usize },

    /// The content stream is empty or yielded no token at all.
    #[error("unreadable content stream: {0}")]
    UnreadableStream(String),

    /// Error from PDF parsing (structure, syntax, object resolution).
    #[error("PDF parse error: {0}")]
    Parse(String),

    /// A core library error.
    #[error(transparent)]
    Core(#[from] PdfError),
}

impl BackendError {
    /// Warning code for errors the interpreter recovers from.
    pub fn warning_code(&self) -> ExtractWarningCode {
        match self {
            BackendError::MalformedStream { .. } => ExtractWarningCode::MalformedStream,
            BackendError::UnknownOperator(_) => ExtractWarningCode::UnknownOperator,
            BackendError::ResourceNotFound { .. } => ExtractWarningCode::ResourceNotFound,
            BackendError::RecursionLimitExceeded { .. } => {
                ExtractWarningCode::RecursionLimitExceeded
            }
            other => ExtractWarningCode::Other(other.to_string()),
        }
    }
}

impl From<BackendError> for PdfError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::UnreadableStream(msg) => PdfError::UnreadableContentStream(msg),
            BackendError::Parse(msg) => PdfError::ParseError(msg),
            BackendError::Core(e) => e,
            other @ (BackendError::MalformedStream { .. }
            | BackendError::UnknownOperator(_)
            | BackendError::ResourceNotFound { .. }
            | BackendError::RecursionLimitExceeded { .. }) => {
                PdfError::InterpreterError(other.to_string())
            }
        }
    }
}

impl From<lopdf::Error> for BackendError {
    fn from(err: lopdf::Error) -> Self {
        BackendError::Parse(err.to_string())
    }
}
