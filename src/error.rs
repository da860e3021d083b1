//! Error types for pdfmeta.
//!
//! Every failure carries one of a small set of stable [`ErrorCode`] kinds.
//! The kind drives both the process exit code and the `"code"` field of JSON
//! error output, so the names and numbers here must never change.

use serde::Serialize;
use std::fmt;

/// Result type alias for pdfmeta operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed underlying cause attached to an [`Error`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Stable failure kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Unclassified failure (also used for aggregate batch failures)
    Unknown,
    /// Command line misuse
    Usage,
    /// Input shape rejected before work begins
    Validation,
    /// File or template missing
    NotFound,
    /// Template save would overwrite without force
    Conflict,
    /// Write attempted on a PDF whose trailer names /Encrypt
    PdfEncrypted,
    /// Envelope probes failed
    PdfMalformed,
    /// Any other file system failure
    Io,
    /// Encode failures, cancellation, corrupt template store
    Internal,
}

impl ErrorCode {
    /// Wire name used in JSON output and `error[...]` text prefixes.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::Unknown => "unknown",
            ErrorCode::Usage => "usage",
            ErrorCode::Validation => "validation",
            ErrorCode::NotFound => "not_found",
            ErrorCode::Conflict => "conflict",
            ErrorCode::PdfEncrypted => "pdf_encrypted",
            ErrorCode::PdfMalformed => "pdf_malformed",
            ErrorCode::Io => "io",
            ErrorCode::Internal => "internal",
        }
    }

    /// Process exit status for this kind. Zero is reserved for success.
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorCode::Unknown => 1,
            ErrorCode::Usage => 2,
            ErrorCode::Validation => 3,
            ErrorCode::NotFound => 4,
            ErrorCode::Conflict => 5,
            ErrorCode::PdfEncrypted => 6,
            ErrorCode::PdfMalformed => 7,
            ErrorCode::Io => 8,
            ErrorCode::Internal => 9,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed failure with an optional wrapped cause.
#[derive(Debug, thiserror::Error)]
#[error("{}", render(.code, .message, .cause))]
pub struct Error {
    /// Failure kind
    pub code: ErrorCode,
    /// Human readable message
    pub message: String,
    /// Underlying error, if any
    #[source]
    pub cause: Option<BoxError>,
}

fn render(code: &ErrorCode, message: &str, cause: &Option<BoxError>) -> String {
    match (message.is_empty(), cause) {
        (false, Some(cause)) => format!("{}: {}", message, cause),
        (false, None) => message.to_string(),
        (true, Some(cause)) => cause.to_string(),
        (true, None) => code.as_str().to_string(),
    }
}

impl Error {
    /// Create an error without a cause.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            cause: None,
        }
    }

    /// Create an error wrapping an underlying cause.
    pub fn with_cause(
        code: ErrorCode,
        message: impl Into<String>,
        cause: impl Into<BoxError>,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            cause: Some(cause.into()),
        }
    }

    /// Shorthand for a `validation` failure.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Validation, message)
    }

    /// Shorthand for a `pdf_malformed` failure.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::PdfMalformed, message)
    }

    /// Shorthand for an `internal` failure.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, message)
    }

    /// Map a file system failure on `path` to `not_found` or `io`.
    pub fn from_io(message: impl Into<String>, err: std::io::Error) -> Self {
        let code = if err.kind() == std::io::ErrorKind::NotFound {
            ErrorCode::NotFound
        } else {
            ErrorCode::Io
        };
        Self::with_cause(code, message, err)
    }
}

/// Exit status for a failure.
pub fn exit_code(err: &Error) -> i32 {
    err.code.exit_code()
}
