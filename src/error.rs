//! Error types for document parsing.

use thiserror::Error;

/// Terminal failures of a single parse call.
///
/// Every parser either returns a complete [`StructuredDocument`](crate::StructuredDocument)
/// or exactly one of these. Nothing is retried internally.
#[derive(Error, Debug)]
pub enum ParseError {
    /// The input could not be opened as the container its format requires
    /// (corrupt ZIP, unreadable PDF, missing `container.xml`, ...).
    #[error("Invalid container: {0}")]
    InvalidContainer(String),

    /// The container does not point at a readable package document.
    #[error("Missing package document: {0}")]
    MissingPackageDocument(String),

    /// Content is encrypted with something other than font obfuscation.
    #[error("DRM protected: {0}")]
    DrmProtected(String),

    /// The package document lists no readable items in its spine.
    #[error("Reading order is empty")]
    EmptyReadingOrder,

    /// Parsing succeeded but produced no visible text.
    #[error("Document contains no text")]
    EmptyContent,

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<zip::result::ZipError> for ParseError {
    fn from(e: zip::result::ZipError) -> Self {
        ParseError::InvalidContainer(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ParseError>;
