// src/manifest.rs
//! uni-app manifest (manifest.json) loading
//!
//! The build step that produces `dist/build/app` writes a `manifest.json`
//! describing the application. Only the application id and the version
//! label are needed to name the package; every other field is ignored.

use serde::Deserialize;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default manifest file name inside the source directory
pub const MANIFEST_FILE: &str = "manifest.json";

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("Manifest not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read manifest {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse manifest {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Missing required field: {0}")]
    MissingField(&'static str),
}

/// The subset of manifest.json used for packaging
#[derive(Debug, Clone, Deserialize)]
pub struct AppManifest {
    /// Application id (e.g. `__UNI__1234567`)
    pub id: String,

    #[serde(default)]
    pub name: Option<String>,

    pub version: ManifestVersion,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ManifestVersion {
    /// Human readable version label, used in the package file name
    pub name: String,

    /// Build number. uni-app writes this as either a string or a number.
    #[serde(default)]
    pub code: Option<serde_json::Value>,
}

impl AppManifest {
    /// Load manifest from a file path
    pub fn from_file(path: &Path) -> Result<Self, ManifestError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ManifestError::NotFound(path.to_path_buf()));
            }
            Err(source) => {
                return Err(ManifestError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        Self::parse(&content).map_err(|e| match e {
            ManifestError::Parse { source, .. } => ManifestError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    /// Parse manifest from a JSON string
    ///
    /// A leading UTF-8 byte order mark is tolerated; some editors on Windows
    /// save manifest.json with one.
    pub fn parse(content: &str) -> Result<Self, ManifestError> {
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);
        let manifest: AppManifest =
            serde_json::from_str(content).map_err(|source| ManifestError::Parse {
                path: PathBuf::new(),
                source,
            })?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Both name components must be present to build a file name
    pub fn validate(&self) -> Result<(), ManifestError> {
        if self.id.is_empty() {
            return Err(ManifestError::MissingField("id"));
        }
        if self.version.name.is_empty() {
            return Err(ManifestError::MissingField("version.name"));
        }
        Ok(())
    }

    /// Package stem: `{id}-{version.name}`
    pub fn package_stem(&self) -> String {
        format!("{}-{}", self.id, self.version.name)
    }
}
