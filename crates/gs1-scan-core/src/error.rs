//! Error types for GS1 scan interpretation
//!
//! All fallible operations return `Result<T, Error>`.
//! Toolkit messages are carried verbatim so they can be shown to a human;
//! [`ErrorKind`] gives programmatic callers a stable category.

use std::fmt;

use thiserror::Error;

/// GS1 scan interpretation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Input matches none of the accepted syntaxes
    #[error("{0}")]
    InvalidFormat(String),

    /// Element string or Digital Link conversion rejected the input
    #[error("{0}")]
    ConversionFailed(String),

    /// A plausible Digital Link URI failed detailed parsing
    #[error("{0}")]
    ExtractionFailed(String),

    /// An AI code has no entry in the metadata table
    #[error("Unknown Application Identifier ({0})")]
    UnknownAi(String),

    /// No licensing record matches the primary identifier
    #[error("No licensing GS1 Member Organisation matches {ai} value {value}")]
    LicensingUnmatched { ai: String, value: String },

    /// The licensing prefix list could not be obtained
    #[error("Licensing lookup failed: {0}")]
    LicensingFetch(String),

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Stable error category for programmatic callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidFormat,
    ConversionFailed,
    ExtractionFailed,
    UnknownAi,
    LicensingUnmatched,
    LicensingFetch,
    Config,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            ErrorKind::InvalidFormat => "invalid_format",
            ErrorKind::ConversionFailed => "conversion_failed",
            ErrorKind::ExtractionFailed => "extraction_failed",
            ErrorKind::UnknownAi => "unknown_ai",
            ErrorKind::LicensingUnmatched => "licensing_unmatched",
            ErrorKind::LicensingFetch => "licensing_fetch",
            ErrorKind::Config => "config",
        };
        f.write_str(name)
    }
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidFormat(_) => ErrorKind::InvalidFormat,
            Error::ConversionFailed(_) => ErrorKind::ConversionFailed,
            Error::ExtractionFailed(_) => ErrorKind::ExtractionFailed,
            Error::UnknownAi(_) => ErrorKind::UnknownAi,
            Error::LicensingUnmatched { .. } => ErrorKind::LicensingUnmatched,
            Error::LicensingFetch(_) => ErrorKind::LicensingFetch,
            Error::Config(_) => ErrorKind::Config,
        }
    }

    /// Re-tag a toolkit error as a conversion failure, keeping the message.
    ///
    /// `InvalidFormat` and `UnknownAi` already say more than the stage does
    /// and are left alone.
    pub(crate) fn into_conversion(self) -> Self {
        match self {
            Error::InvalidFormat(_) | Error::UnknownAi(_) | Error::ConversionFailed(_) => self,
            other => Error::ConversionFailed(other.to_string()),
        }
    }

    /// Re-tag a toolkit error as an extraction failure, keeping the message.
    pub(crate) fn into_extraction(self) -> Self {
        match self {
            Error::UnknownAi(_) | Error::ExtractionFailed(_) => self,
            other => Error::ExtractionFailed(other.to_string()),
        }
    }
}

/// Result type alias for GS1 scan operations
pub type Result<T> = std::result::Result<T, Error>;
