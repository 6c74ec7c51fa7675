//! Error types for the DOCX font probe library

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the DOCX font probe library
#[derive(Error, Debug)]
pub enum Error {
    /// PDF writing or reading error
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// DOCX container error
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// XML parsing error inside a DOCX part
    #[error("XML error in {part}: {message}")]
    Xml { part: String, message: String },

    /// Invalid glob pattern
    #[error("Invalid glob pattern: {0}")]
    Glob(#[from] glob::PatternError),

    /// File not found
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// The archive is readable but is not a usable word-processing document
    #[error("Invalid DOCX: {0}")]
    InvalidDocument(String),

    /// Font error
    #[error("Font error: {0}")]
    Font(String),

    /// Export was requested before any document was loaded
    #[error("No document loaded")]
    NoDocumentLoaded,

    /// General error
    #[error("{0}")]
    General(String),
}

impl Error {
    pub(crate) fn xml(part: &str, err: impl std::fmt::Display) -> Self {
        Error::Xml {
            part: part.to_string(),
            message: err.to_string(),
        }
    }
}
