// src/packager.rs
//! Packaging run: manifest -> output path -> collision check -> archive
//!
//! A run never overwrites an existing package. The archive is staged in a
//! temporary file next to the output and moved into place with a no-clobber
//! rename once the zip is finished and synced, so a failed run leaves no
//! partial `.wgt` behind.

use crate::archive::{ArchiveStats, MAX_COMPRESSION_LEVEL, WgtWriter};
use crate::error::{Error, Result};
use crate::manifest::{AppManifest, MANIFEST_FILE};
use std::fs;
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Build output of `uni build -p app`
pub const DEFAULT_SOURCE_DIR: &str = "./dist/build/app";

/// Where packages are written
pub const DEFAULT_OUTPUT_DIR: &str = "./dist/build/wgt";

/// Package file extension
pub const DEFAULT_EXTENSION: &str = "wgt";

/// Packaging configuration
#[derive(Debug, Clone)]
pub struct PackConfig {
    /// Directory whose contents become the archive root
    pub source_dir: PathBuf,
    /// Directory the package is written to (created if missing)
    pub output_dir: PathBuf,
    /// Manifest file name, relative to `source_dir`
    pub manifest_name: String,
    /// Package file extension, without the dot
    pub extension: String,
    /// Deflate level 1-9, or 0 to store files uncompressed
    pub compression_level: i64,
}

impl Default for PackConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from(DEFAULT_SOURCE_DIR),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            manifest_name: MANIFEST_FILE.to_string(),
            extension: DEFAULT_EXTENSION.to_string(),
            compression_level: MAX_COMPRESSION_LEVEL,
        }
    }
}

impl PackConfig {
    pub fn with_source_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.source_dir = dir.into();
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_manifest_name(mut self, name: impl Into<String>) -> Self {
        self.manifest_name = name.into();
        self
    }

    /// Set the extension; a leading dot is dropped
    pub fn with_extension(mut self, ext: &str) -> Self {
        self.extension = ext.trim_start_matches('.').to_string();
        self
    }

    pub fn with_compression_level(mut self, level: i64) -> Self {
        self.compression_level = level;
        self
    }

    /// Path of the manifest inside the source directory
    pub fn manifest_path(&self) -> PathBuf {
        self.source_dir.join(&self.manifest_name)
    }
}

/// Output path for a manifest: `{output_dir}/{id}-{version.name}.{ext}`
pub fn output_path_for(output_dir: &Path, manifest: &AppManifest, extension: &str) -> PathBuf {
    output_dir.join(format!("{}.{}", manifest.package_stem(), extension))
}

/// Size in MiB, one decimal, as printed in the build report
pub fn format_mib(bytes: u64) -> String {
    format!("{:.1}MB", bytes as f64 / 1024.0 / 1024.0)
}

/// Everything known before any archive bytes are written
#[derive(Debug, Clone)]
pub struct PackPlan {
    pub manifest: AppManifest,
    pub output_path: PathBuf,
    /// A file already exists at `output_path`
    pub collision: bool,
}

/// A finished package
#[derive(Debug, Clone)]
pub struct PackResult {
    pub manifest: AppManifest,
    pub output_path: PathBuf,
    /// Size of the package on disk
    pub size_bytes: u64,
    pub stats: ArchiveStats,
}

impl PackResult {
    pub fn display_size(&self) -> String {
        format_mib(self.size_bytes)
    }
}

/// Packs a source directory into a .wgt package
pub struct Packager {
    config: PackConfig,
}

impl Packager {
    pub fn new(config: PackConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PackConfig {
        &self.config
    }

    /// Create the output directory, load the manifest and check for a collision
    ///
    /// The output directory is created before the manifest is read, so it
    /// exists afterwards even when the manifest turns out to be missing.
    pub fn plan(&self) -> Result<PackPlan> {
        let output_dir = &self.config.output_dir;
        fs::create_dir_all(output_dir).map_err(|source| Error::OutputDir {
            path: output_dir.clone(),
            source,
        })?;

        let manifest_path = self.config.manifest_path();
        debug!("Reading manifest: {}", manifest_path.display());
        let manifest = AppManifest::from_file(&manifest_path)?;

        let output_path = output_path_for(output_dir, &manifest, &self.config.extension);
        let collision = output_path.exists();
        debug!(
            "Output path: {} (exists: {})",
            output_path.display(),
            collision
        );

        Ok(PackPlan {
            manifest,
            output_path,
            collision,
        })
    }

    /// Run every step and return the finished package
    pub fn run(&self) -> Result<PackResult> {
        let plan = self.plan()?;
        if plan.collision {
            return Err(Error::OutputExists(plan.output_path));
        }

        info!(
            "Packing {} v{} from {}",
            plan.manifest.id,
            plan.manifest.version.name,
            self.config.source_dir.display()
        );
        self.build(plan)
    }

    fn build(&self, plan: PackPlan) -> Result<PackResult> {
        let output_path = &plan.output_path;
        let archive_err = |source| Error::Archive {
            path: output_path.clone(),
            source,
        };
        let io_err = |source| Error::Io {
            path: output_path.clone(),
            source,
        };

        // Dropped (and deleted) on every early return below
        let mut staging = tempfile::Builder::new()
            .prefix(".wgtpack-")
            .suffix(".tmp")
            .permissions(fs::Permissions::from_mode(0o644))
            .tempfile_in(&self.config.output_dir)
            .map_err(|source| Error::Io {
                path: self.config.output_dir.clone(),
                source,
            })?;
        let staging_path = staging.path().to_path_buf();

        let mut writer =
            WgtWriter::new(staging.as_file_mut(), self.config.compression_level)
                .map_err(archive_err)?;
        writer.skip(&staging_path);
        writer
            .append_dir_all(&self.config.source_dir)
            .map_err(archive_err)?;
        let (file, stats) = writer.finish().map_err(archive_err)?;
        file.sync_all().map_err(io_err)?;

        let file = staging.persist_noclobber(output_path).map_err(|e| {
            if e.error.kind() == io::ErrorKind::AlreadyExists {
                Error::OutputExists(output_path.clone())
            } else {
                Error::Io {
                    path: output_path.clone(),
                    source: e.error,
                }
            }
        })?;
        let size_bytes = file.metadata().map_err(io_err)?.len();

        info!(
            "Wrote {} ({} entries, {} bytes)",
            output_path.display(),
            stats.entries(),
            size_bytes
        );

        Ok(PackResult {
            manifest: plan.manifest,
            output_path: plan.output_path,
            size_bytes,
            stats,
        })
    }
}
