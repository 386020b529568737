//! Error types for vaultpress.
//!
//! All errors in the system are represented by the [`Error`] enum.
//! Some variants are fatal to the current export, others are recovered
//! locally by the component that raised them; see [`Error::is_recoverable`].

use std::io;
use std::path::PathBuf;
use thiserror::Error as ThisError;

/// The core error type for all vaultpress operations.
#[derive(ThisError, Debug)]
pub enum Error {
    /// File system error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// File not found
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Path traversal attempt detected
    #[error("Path traversal detected: {path}")]
    PathTraversalAttempt { path: PathBuf },

    /// No active target folder is configured
    #[error("No active target folder set")]
    NoTargetConfigured,

    /// The active target folder does not exist or is not a directory
    #[error("Active target folder does not exist: {path}")]
    TargetUnreachable { path: PathBuf },

    /// Invalid configuration
    #[error("Configuration error: {reason}")]
    ConfigError { reason: String },

    /// Front matter block could not be parsed
    #[error("Malformed front matter: {reason}")]
    MalformedFrontMatter { reason: String },

    /// Embedded asset could not be located or copied
    #[error("Could not resolve asset '{asset}': {reason}")]
    AssetResolution { asset: String, reason: String },

    /// Tag service call or reply parsing failed
    #[error("Tag service error: {reason}")]
    TagService { reason: String },

    /// More than one exported file matches the note title
    #[error("Ambiguous conflict for '{title}': {} existing files match", candidates.len())]
    AmbiguousConflict {
        title: String,
        candidates: Vec<PathBuf>,
    },

    /// Generic unclassified error
    #[error("Error: {0}")]
    Other(String),
}

/// Convenient Result type alias
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an IO error
    pub fn io(err: io::Error) -> Self {
        Error::Io(err)
    }

    /// Create a file not found error
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Error::FileNotFound { path: path.into() }
    }

    /// Create a path traversal error
    pub fn path_traversal(path: impl Into<PathBuf>) -> Self {
        Error::PathTraversalAttempt { path: path.into() }
    }

    /// Create a target unreachable error
    pub fn target_unreachable(path: impl Into<PathBuf>) -> Self {
        Error::TargetUnreachable { path: path.into() }
    }

    /// Create a configuration error
    pub fn config_error(reason: impl Into<String>) -> Self {
        Error::ConfigError {
            reason: reason.into(),
        }
    }

    /// Create a malformed front matter error
    pub fn malformed_front_matter(reason: impl Into<String>) -> Self {
        Error::MalformedFrontMatter {
            reason: reason.into(),
        }
    }

    /// Create an asset resolution error
    pub fn asset_resolution(asset: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::AssetResolution {
            asset: asset.into(),
            reason: reason.into(),
        }
    }

    /// Create a tag service error
    pub fn tag_service(reason: impl Into<String>) -> Self {
        Error::TagService {
            reason: reason.into(),
        }
    }

    /// Create an ambiguous conflict error
    pub fn ambiguous_conflict(title: impl Into<String>, candidates: Vec<PathBuf>) -> Self {
        Error::AmbiguousConflict {
            title: title.into(),
            candidates,
        }
    }

    /// Create a generic error
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Whether the export continues after this error.
    ///
    /// Asset and tag service failures degrade the output (line left verbatim,
    /// no tags) instead of aborting the run.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::AssetResolution { .. } | Error::TagService { .. })
    }
}
