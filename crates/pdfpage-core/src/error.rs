//! Error and warning types for pdfpage.
//!
//! Provides [`PdfError`] for failures that stop a page or an API call,
//! [`ExtractWarning`] for recoverable anomalies met while interpreting a
//! content stream, and [`ExtractOptions`] for limits and warning behavior.

use std::fmt;

use crate::unicode_norm::UnicodeNorm;

/// Fatal error types.
///
/// A page-level error means the page produced no output at all; per-operator
/// problems never surface here, they become [`ExtractWarning`]s.
#[derive(Debug, Clone, PartialEq)]
pub enum PdfError {
    /// Error parsing PDF structure or syntax.
    ParseError(String),
    /// I/O error reading PDF data.
    IoError(String),
    /// Error during content stream interpretation.
    InterpreterError(String),
    /// The page content stream is empty or not a single token could be read.
    UnreadableContentStream(String),
    /// A single-use accumulator was finalized twice.
    AlreadyFinalized,
    /// The page backing an image placement has been closed.
    PageClosed,
    /// Image samples could not be decoded.
    ImageDecode(String),
    /// Requested page index does not exist.
    PageIndexOutOfRange {
        /// The requested 0-based index.
        index: usize,
        /// Number of pages in the document.
        count: usize,
    },
    /// A configured resource limit was exceeded.
    ResourceLimitExceeded {
        /// Name of the limit that was exceeded (e.g., "max_stream_bytes").
        limit_name: String,
        /// The configured limit value.
        limit_value: usize,
        /// The actual value that exceeded the limit.
        actual_value: usize,
    },
    /// Any other error not covered by specific variants.
    Other(String),
}

impl fmt::Display for PdfError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PdfError::ParseError(msg) => write!(f, "parse error: {msg}"),
            PdfError::IoError(msg) => write!(f, "I/O error: {msg}"),
            PdfError::InterpreterError(msg) => write!(f, "interpreter error: {msg}"),
            PdfError::UnreadableContentStream(msg) => {
                write!(f, "unreadable content stream: {msg}")
            }
            PdfError::AlreadyFinalized => write!(f, "accumulator already finalized"),
            PdfError::PageClosed => write!(f, "page has been closed"),
            PdfError::ImageDecode(msg) => write!(f, "image decode error: {msg}"),
            PdfError::PageIndexOutOfRange { index, count } => {
                write!(f, "page index {index} out of range (document has {count} pages)")
            }
            PdfError::ResourceLimitExceeded {
                limit_name,
                limit_value,
                actual_value,
            } => write!(
                f,
                "resource limit exceeded: {limit_name} (limit: {limit_value}, actual: {actual_value})"
            ),
            PdfError::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for PdfError {}

impl From<std::io::Error> for PdfError {
    fn from(err: std::io::Error) -> Self {
        PdfError::IoError(err.to_string())
    }
}

/// Machine-readable warning code for categorizing extraction issues.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(tag = "type", content = "detail")
)]
pub enum ExtractWarningCode {
    /// Lexer-level syntax error; the lexer resynchronized and continued.
    MalformedStream,
    /// An operator the interpreter does not know; its operands were dropped.
    UnknownOperator,
    /// A font, XObject or color space name missing from the resources.
    ResourceNotFound,
    /// Form XObjects nested deeper than the configured limit.
    RecursionLimitExceeded,
    /// A configured resource limit was reached during extraction.
    ResourceLimitReached,
    /// `Q` with nothing left to restore.
    UnbalancedRestore,
    /// Character codes decoded through the Latin-1 fallback.
    EncodingFallback,
    /// Any other warning not covered by specific variants.
    Other(String),
}

impl ExtractWarningCode {
    /// Returns the string tag for this warning code.
    pub fn as_str(&self) -> &str {
        match self {
            ExtractWarningCode::MalformedStream => "MALFORMED_STREAM",
            ExtractWarningCode::UnknownOperator => "UNKNOWN_OPERATOR",
            ExtractWarningCode::ResourceNotFound => "RESOURCE_NOT_FOUND",
            ExtractWarningCode::RecursionLimitExceeded => "RECURSION_LIMIT_EXCEEDED",
            ExtractWarningCode::ResourceLimitReached => "RESOURCE_LIMIT_REACHED",
            ExtractWarningCode::UnbalancedRestore => "UNBALANCED_RESTORE",
            ExtractWarningCode::EncodingFallback => "ENCODING_FALLBACK",
            ExtractWarningCode::Other(_) => "OTHER",
        }
    }
}

impl fmt::Display for ExtractWarningCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A non-fatal warning encountered during extraction.
///
/// Carries a structured [`code`](ExtractWarning::code), a human-readable
/// description and optional source location context.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExtractWarning {
    /// Machine-readable warning code.
    pub code: ExtractWarningCode,
    /// Human-readable description of the warning.
    pub description: String,
    /// Page index where the warning occurred, if known.
    pub page: Option<usize>,
    /// Index of the operator in the content stream, if applicable.
    pub operator_index: Option<usize>,
    /// Resource name involved (font, XObject, color space), if applicable.
    pub resource: Option<String>,
}

impl ExtractWarning {
    /// Create a warning with just a description.
    ///
    /// Uses [`ExtractWarningCode::Other`] as the code.
    pub fn new(description: impl Into<String>) -> Self {
        let desc = description.into();
        Self::with_code(ExtractWarningCode::Other(desc.clone()), desc)
    }

    /// Create a warning with a specific code and description.
    pub fn with_code(code: ExtractWarningCode, description: impl Into<String>) -> Self {
        Self {
            code,
            description: description.into(),
            page: None,
            operator_index: None,
            resource: None,
        }
    }

    /// Attach the operator index (builder pattern).
    pub fn at_operator(mut self, index: usize) -> Self {
        self.operator_index = Some(index);
        self
    }

    /// Attach the resource name (builder pattern).
    pub fn for_resource(mut self, name: impl Into<String>) -> Self {
        self.resource = Some(name.into());
        self
    }

    /// Attach the page index (builder pattern).
    pub fn on_page(mut self, page: usize) -> Self {
        self.page = Some(page);
        self
    }

    /// Convert this warning into a [`PdfError`].
    ///
    /// Used by strict mode to escalate warnings to errors.
    pub fn to_error(&self) -> PdfError {
        PdfError::Other(self.to_string())
    }
}

impl fmt::Display for ExtractWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.description)?;
        if let Some(page) = self.page {
            write!(f, " (page {page})")?;
        }
        if let Some(ref resource) = self.resource {
            write!(f, " [resource /{resource}]")?;
        }
        if let Some(index) = self.operator_index {
            write!(f, " [operator #{index}]")?;
        }
        Ok(())
    }
}

/// Options controlling extraction behavior and resource limits.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Maximum nesting of Form XObjects (default: 16).
    pub max_recursion_depth: usize,
    /// Maximum tokens read per page, nested forms included (default: 1,000,000).
    pub max_tokens: usize,
    /// Maximum content stream bytes to process (default: 100 MB).
    pub max_stream_bytes: usize,
    /// Whether to collect warnings during extraction (default: true).
    pub collect_warnings: bool,
    /// When true, the first warning fails the page (default: false).
    pub strict_mode: bool,
    /// Unicode normalization applied to each glyph's text (default: None).
    pub unicode_norm: UnicodeNorm,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            max_recursion_depth: 16,
            max_tokens: 1_000_000,
            max_stream_bytes: 100 * 1024 * 1024,
            collect_warnings: true,
            strict_mode: false,
            unicode_norm: UnicodeNorm::None,
        }
    }
}
