//! Unified error type for epubtool.
//!
//! Every failure surfaced by the library maps onto one variant here, so callers
//! can tell a missing archive from a malformed package document or a rejected
//! edit without inspecting message strings.
use thiserror::Error;

/// Main error type for epubtool operations.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The archive path does not exist
    #[error("File '{0}' not found")]
    PackageNotFound(String),

    /// ZIP archive error
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// XML parsing error
    #[error("XML error: {0}")]
    XmlError(String),

    /// Invalid file format
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// Archive entry not found
    #[error("Component not found: {0}")]
    ComponentNotFound(String),

    /// Container index missing, or it lists no root file
    #[error("Container index not found: {0}")]
    ContainerNotFound(String),

    /// The package document has no metadata element
    #[error("Can't find metadata object")]
    MetadataNotFound,

    /// No creator element to anchor an author rewrite against
    #[error("Can't find authors in metadata")]
    AuthorsNotFound,

    /// Series input that cannot be written
    #[error("Invalid series info: {0}")]
    InvalidSeries(String),
}

/// Result type for epubtool operations.
pub type Result<T> = std::result::Result<T, Error>;
