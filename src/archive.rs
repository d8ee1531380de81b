// src/archive.rs
//! .wgt archive writer
//!
//! A .wgt package is a plain zip container. The writer streams a directory
//! tree into it with the directory's contents at the archive root, so
//! `dist/build/app/manifest.json` becomes the entry `manifest.json`.

use chrono::{DateTime, Datelike, Local, Timelike};
use std::collections::HashSet;
use std::fs;
use std::io::{self, Seek, Write};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use thiserror::Error;
use tracing::{debug, trace};
use walkdir::WalkDir;
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Highest deflate level
pub const MAX_COMPRESSION_LEVEL: i64 = 9;

/// Entries at or above this size need zip64 headers
const ZIP64_THRESHOLD: u64 = u32::MAX as u64;

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("Source is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("Failed to walk {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Zip error on entry {entry}: {source}")]
    Zip {
        entry: String,
        #[source]
        source: ZipError,
    },

    #[error("Failed to finalize archive: {0}")]
    Finish(#[source] ZipError),

    #[error("Invalid compression level {0} (expected 0-9)")]
    InvalidLevel(i64),
}

/// Counters for what went into an archive
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveStats {
    pub files: usize,
    pub directories: usize,
    pub symlinks: usize,
    /// Sum of regular file sizes before compression
    pub uncompressed_bytes: u64,
}

impl ArchiveStats {
    /// Total number of entries written
    pub fn entries(&self) -> usize {
        self.files + self.directories + self.symlinks
    }
}

/// Streams directory trees into a zip container
pub struct WgtWriter<W: Write + Seek> {
    zip: ZipWriter<W>,
    level: i64,
    skip: HashSet<PathBuf>,
    stats: ArchiveStats,
}

impl<W: Write + Seek> WgtWriter<W> {
    /// Create a writer using deflate at `level` (0 stores without compression)
    pub fn new(inner: W, level: i64) -> Result<Self, ArchiveError> {
        if !(0..=MAX_COMPRESSION_LEVEL).contains(&level) {
            return Err(ArchiveError::InvalidLevel(level));
        }

        Ok(Self {
            zip: ZipWriter::new(inner),
            level,
            skip: HashSet::new(),
            stats: ArchiveStats::default(),
        })
    }

    /// Exclude a path from directory walks
    ///
    /// Used for the archive's own staging file when the output directory
    /// lives inside the source tree.
    pub fn skip(&mut self, path: &Path) {
        let path = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        self.skip.insert(path);
    }

    /// Append the full contents of `source_dir` at the archive root
    pub fn append_dir_all(&mut self, source_dir: &Path) -> Result<(), ArchiveError> {
        if !source_dir.is_dir() {
            return Err(ArchiveError::NotADirectory(source_dir.to_path_buf()));
        }

        debug!("Archiving {}", source_dir.display());

        let skip = self.skip.clone();
        for entry in WalkDir::new(source_dir)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !is_skipped(&skip, e.path()))
        {
            let entry = entry.map_err(|source| ArchiveError::Walk {
                path: source_dir.to_path_buf(),
                source,
            })?;
            let path = entry.path();
            let relative = path
                .strip_prefix(source_dir)
                .map_err(|_| ArchiveError::NotADirectory(source_dir.to_path_buf()))?;
            let name = entry_name(relative);

            let metadata = path
                .symlink_metadata()
                .map_err(|source| ArchiveError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
            let file_type = metadata.file_type();

            if file_type.is_dir() {
                self.add_directory(&name, &metadata)?;
            } else if file_type.is_symlink() {
                self.add_symlink(path, &name, &metadata)?;
            } else if file_type.is_file() {
                self.add_file(path, &name, &metadata)?;
            } else {
                debug!("Skipping special file {}", path.display());
            }
        }

        Ok(())
    }

    /// Write the central directory and hand back the inner writer
    pub fn finish(self) -> Result<(W, ArchiveStats), ArchiveError> {
        let inner = self.zip.finish().map_err(ArchiveError::Finish)?;
        Ok((inner, self.stats))
    }

    /// Directories and symlinks carry no data and are always stored
    fn stored_options(&self, metadata: &fs::Metadata) -> SimpleFileOptions {
        SimpleFileOptions::default()
            .compression_method(CompressionMethod::Stored)
            .unix_permissions(metadata.permissions().mode() & 0o7777)
            .last_modified_time(dos_time(metadata.modified().ok()))
    }

    /// Level 0 stores file data as is; deflate only takes levels 1-9
    fn file_options(&self, metadata: &fs::Metadata) -> SimpleFileOptions {
        let options = self
            .stored_options(metadata)
            .large_file(metadata.len() >= ZIP64_THRESHOLD);
        if self.level == 0 {
            return options;
        }
        options
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(self.level))
    }

    fn add_directory(&mut self, name: &str, metadata: &fs::Metadata) -> Result<(), ArchiveError> {
        trace!("dir  {}/", name);
        let options = self.stored_options(metadata);
        self.zip
            .add_directory(format!("{}/", name), options)
            .map_err(|source| ArchiveError::Zip {
                entry: name.to_string(),
                source,
            })?;
        self.stats.directories += 1;
        Ok(())
    }

    fn add_symlink(
        &mut self,
        path: &Path,
        name: &str,
        metadata: &fs::Metadata,
    ) -> Result<(), ArchiveError> {
        let target = fs::read_link(path).map_err(|source| ArchiveError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let target = target.to_string_lossy().to_string();
        trace!("link {} -> {}", name, target);

        let options = self.stored_options(metadata);
        self.zip
            .add_symlink(name.to_string(), target, options)
            .map_err(|source| ArchiveError::Zip {
                entry: name.to_string(),
                source,
            })?;
        self.stats.symlinks += 1;
        Ok(())
    }

    fn add_file(
        &mut self,
        path: &Path,
        name: &str,
        metadata: &fs::Metadata,
    ) -> Result<(), ArchiveError> {
        trace!("file {} ({} bytes)", name, metadata.len());
        let read_err = |source| ArchiveError::Read {
            path: path.to_path_buf(),
            source,
        };

        let mut source_file = fs::File::open(path).map_err(read_err)?;
        let options = self.file_options(metadata);

        self.zip
            .start_file(name.to_string(), options)
            .map_err(|source| ArchiveError::Zip {
                entry: name.to_string(),
                source,
            })?;
        let copied = io::copy(&mut source_file, &mut self.zip).map_err(|source| {
            ArchiveError::Zip {
                entry: name.to_string(),
                source: ZipError::Io(source),
            }
        })?;

        self.stats.files += 1;
        self.stats.uncompressed_bytes += copied;
        Ok(())
    }
}

fn is_skipped(skip: &HashSet<PathBuf>, path: &Path) -> bool {
    if skip.is_empty() {
        return false;
    }
    let Some(file_name) = path.file_name() else {
        return false;
    };
    // Only pay for canonicalize when the file name could match
    if !skip.iter().any(|s| s.file_name() == Some(file_name)) {
        return false;
    }
    fs::canonicalize(path)
        .map(|p| skip.contains(&p))
        .unwrap_or(false)
}

/// Zip entry names always use `/`, whatever the host separator
fn entry_name(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Convert a modification time to a zip (DOS, local time) timestamp
///
/// DOS timestamps cover 1980-2107 with two second resolution; anything
/// outside that range is stored as 1980-01-01 00:00:00.
fn dos_time(modified: Option<SystemTime>) -> zip::DateTime {
    let Some(modified) = modified else {
        return zip::DateTime::default();
    };
    let local: DateTime<Local> = modified.into();

    let Ok(year) = u16::try_from(local.year()) else {
        return zip::DateTime::default();
    };

    zip::DateTime::from_date_and_time(
        year,
        local.month() as u8,
        local.day() as u8,
        local.hour() as u8,
        local.minute() as u8,
        local.second() as u8,
    )
    .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Read};
    use tempfile::TempDir;
    use zip::ZipArchive;

    fn build(source: &Path) -> (Vec<u8>, ArchiveStats) {
        let mut writer = WgtWriter::new(Cursor::new(Vec::new()), MAX_COMPRESSION_LEVEL).unwrap();
        writer.append_dir_all(source).unwrap();
        let (cursor, stats) = writer.finish().unwrap();
        (cursor.into_inner(), stats)
    }

    fn names(bytes: &[u8]) -> Vec<String> {
        let archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut names: Vec<String> = archive.file_names().map(String::from).collect();
        names.sort();
        names
    }

    #[test]
    fn test_empty_dir() {
        let temp_dir = TempDir::new().unwrap();
        let (bytes, stats) = build(temp_dir.path());

        assert_eq!(stats.entries(), 0);
        assert!(names(&bytes).is_empty());
    }

    #[test]
    fn test_contents_at_root() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("manifest.json"), b"{}").unwrap();
        fs::create_dir_all(root.join("static/img")).unwrap();
        fs::write(root.join("static/img/logo.png"), b"png").unwrap();
        fs::create_dir_all(root.join("empty")).unwrap();

        let (bytes, stats) = build(root);

        assert_eq!(
            names(&bytes),
            vec![
                "empty/",
                "manifest.json",
                "static/",
                "static/img/",
                "static/img/logo.png",
            ]
        );
        assert_eq!(stats.files, 2);
        assert_eq!(stats.directories, 3);
        assert_eq!(stats.uncompressed_bytes, 5);
    }

    #[test]
    fn test_file_content_and_compression() {
        let temp_dir = TempDir::new().unwrap();
        let content = "console.log('hello');\n".repeat(500);
        fs::write(temp_dir.path().join("app-service.js"), &content).unwrap();

        let (bytes, _) = build(temp_dir.path());
        assert!(bytes.len() < content.len());

        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut entry = archive.by_name("app-service.js").unwrap();
        assert_eq!(entry.compression(), CompressionMethod::Deflated);

        let mut extracted = String::new();
        entry.read_to_string(&mut extracted).unwrap();
        assert_eq!(extracted, content);
    }

    #[test]
    fn test_permissions_preserved() {
        let temp_dir = TempDir::new().unwrap();
        let script = temp_dir.path().join("run.sh");
        fs::write(&script, b"#!/bin/sh\n").unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

        let (bytes, _) = build(temp_dir.path());
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let entry = archive.by_name("run.sh").unwrap();
        assert_eq!(entry.unix_mode().map(|m| m & 0o777), Some(0o755));
    }

    #[test]
    fn test_symlink_stored_not_followed() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("index.html"), b"<html></html>").unwrap();
        std::os::unix::fs::symlink("index.html", root.join("default.html")).unwrap();

        let (bytes, stats) = build(root);

        assert_eq!(stats.files, 1);
        assert_eq!(stats.symlinks, 1);
        assert_eq!(names(&bytes), vec!["default.html", "index.html"]);
    }

    #[test]
    fn test_skip_path() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("keep.txt"), b"keep").unwrap();
        fs::write(root.join("staging.tmp"), b"skip").unwrap();

        let mut writer = WgtWriter::new(Cursor::new(Vec::new()), MAX_COMPRESSION_LEVEL).unwrap();
        writer.skip(&root.join("staging.tmp"));
        writer.append_dir_all(root).unwrap();
        let (cursor, _) = writer.finish().unwrap();

        assert_eq!(names(cursor.get_ref()), vec!["keep.txt"]);
    }

    #[test]
    fn test_not_a_directory() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("file.txt");
        fs::write(&file, b"x").unwrap();

        let mut writer = WgtWriter::new(Cursor::new(Vec::new()), MAX_COMPRESSION_LEVEL).unwrap();
        let result = writer.append_dir_all(&file);
        assert!(matches!(result, Err(ArchiveError::NotADirectory(_))));
    }

    #[test]
    fn test_level_zero_stores_files() {
        let temp_dir = TempDir::new().unwrap();
        let content = "console.log('hello');\n".repeat(500);
        fs::write(temp_dir.path().join("app-service.js"), &content).unwrap();
        fs::create_dir_all(temp_dir.path().join("static")).unwrap();

        let mut writer = WgtWriter::new(Cursor::new(Vec::new()), 0).unwrap();
        writer.append_dir_all(temp_dir.path()).unwrap();
        let (cursor, stats) = writer.finish().unwrap();
        assert_eq!(stats.files, 1);
        assert_eq!(stats.directories, 1);

        let mut archive = ZipArchive::new(cursor).unwrap();
        let mut entry = archive.by_name("app-service.js").unwrap();
        assert_eq!(entry.compression(), CompressionMethod::Stored);

        let mut extracted = String::new();
        entry.read_to_string(&mut extracted).unwrap();
        assert_eq!(extracted, content);
    }

    #[test]
    fn test_lowest_deflate_level() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("index.html"), "<p></p>".repeat(100)).unwrap();

        let mut writer = WgtWriter::new(Cursor::new(Vec::new()), 1).unwrap();
        writer.append_dir_all(temp_dir.path()).unwrap();
        let (cursor, _) = writer.finish().unwrap();

        let mut archive = ZipArchive::new(cursor).unwrap();
        let entry = archive.by_name("index.html").unwrap();
        assert_eq!(entry.compression(), CompressionMethod::Deflated);
    }

    #[test]
    fn test_invalid_level() {
        assert!(matches!(
            WgtWriter::new(Cursor::new(Vec::new()), 10),
            Err(ArchiveError::InvalidLevel(10))
        ));
    }

    #[test]
    fn test_entry_name_uses_forward_slash() {
        assert_eq!(entry_name(Path::new("a/b/c.txt")), "a/b/c.txt");
        assert_eq!(entry_name(Path::new("top")), "top");
    }

    #[test]
    fn test_dos_time_out_of_range() {
        let before_dos = SystemTime::UNIX_EPOCH;
        assert_eq!(dos_time(Some(before_dos)), zip::DateTime::default());
        assert_eq!(dos_time(None), zip::DateTime::default());
    }
}
