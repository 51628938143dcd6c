//! Error types returned by the library.
//!
//! Each operation family gets its own enum so callers can match on exactly the
//! failures that operation can produce. Presentation (wording, exit codes) is
//! left to the caller.

use std::{io, path::PathBuf};

use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("'{0}' is not a valid YouTube video ID")]
    InvalidIdentifier(String),
    #[error("'{0}' is not a valid YouTube video URL")]
    InvalidUrl(String),
}

#[derive(Debug, Error)]
#[error("Invalid thumbnail size: {0}")]
pub struct SizeError(pub String);

/// Network-layer failure while talking to the thumbnail host.
///
/// These are never folded into [`FetchError::NotFound`]: an unreachable server
/// says nothing about whether the thumbnail exists.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request to {url} timed out")]
    Timeout {
        url: String,
        #[source]
        source: BoxError,
    },
    #[error("TLS failure while requesting {url}")]
    Tls {
        url: String,
        #[source]
        source: BoxError,
    },
    #[error("failed to establish connection to {url}")]
    Connection {
        url: String,
        #[source]
        source: BoxError,
    },
    #[error("request to {url} failed")]
    Other {
        url: String,
        #[source]
        source: BoxError,
    },
}

impl TransportError {
    pub fn url(&self) -> &str {
        match self {
            Self::Timeout { url, .. }
            | Self::Tls { url, .. }
            | Self::Connection { url, .. }
            | Self::Other { url, .. } => url,
        }
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Failed to find thumbnail for video ID '{id}' with size '{size}'")]
    NotFound { id: String, size: String },
    #[error(transparent)]
    Transport(#[from] TransportError),
}

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("Must fetch before saving")]
    NotFetched,
    #[error("Invalid path: {}", .0.display())]
    NotADirectory(PathBuf),
    #[error("File already exists: {}", .0.display())]
    FileExists(PathBuf),
    #[error("Specified path does not exist: {}", .0.display())]
    PathNotFound(PathBuf),
    #[error("Permission denied: {}", .0.display())]
    PermissionDenied(PathBuf),
    #[error("Failed to write image")]
    Write(#[source] io::Error),
    #[error("Failed to write {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl SaveError {
    /// Maps an I/O failure on `path` to the matching variant.
    pub(crate) fn from_io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            io::ErrorKind::NotFound => Self::PathNotFound(path),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path),
            io::ErrorKind::AlreadyExists => Self::FileExists(path),
            io::ErrorKind::NotADirectory => Self::NotADirectory(path),
            _ => Self::Io { path, source },
        }
    }
}
