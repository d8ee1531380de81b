// src/lib.rs

//! wgtpack
//!
//! Packs the output of a uni-app `app` build (`dist/build/app`) into a
//! `.wgt` resource package named after the application id and version
//! found in its `manifest.json`.
//!
//! # Overview
//!
//! - `manifest`: reads `manifest.json` (id, version.name)
//! - `archive`: streams a directory tree into a deflated zip container
//! - `packager`: output path, collision check, staged no-clobber write
//!
//! An existing package is never overwritten: building the same id and
//! version twice fails with [`Error::OutputExists`].

pub mod archive;
mod error;
pub mod manifest;
pub mod packager;

pub use archive::{ArchiveError, ArchiveStats, WgtWriter, MAX_COMPRESSION_LEVEL};
pub use error::{Error, Result};
pub use manifest::{AppManifest, ManifestError, ManifestVersion, MANIFEST_FILE};
pub use packager::{
    format_mib, output_path_for, PackConfig, PackPlan, PackResult, Packager, DEFAULT_EXTENSION,
    DEFAULT_OUTPUT_DIR, DEFAULT_SOURCE_DIR,
};
