// src/error.rs
//! Error types for packaging runs

use crate::archive::ArchiveError;
use crate::manifest::ManifestError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for packaging operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can end a packaging run
#[derive(Error, Debug)]
pub enum Error {
    /// manifest.json missing, unreadable or malformed
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// A package with the same id and version was already built
    #[error("Output file already exists: {}", .0.display())]
    OutputExists(PathBuf),

    #[error("Failed to create output directory {}: {source}", path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Streaming the tree into the zip container failed
    #[error("Failed to build archive {}: {source}", path.display())]
    Archive {
        path: PathBuf,
        #[source]
        source: ArchiveError,
    },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl Error {
    /// Process exit code for this error
    ///
    /// A collision is an expected outcome and exits with 1; everything else
    /// is a hard failure and exits with 2.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::OutputExists(_) => 1,
            _ => 2,
        }
    }
}
