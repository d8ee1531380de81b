// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A fake uni-app project with `dist/build/app` already built.
///
/// Keep the value alive for the duration of the test; the directory is
/// removed on drop.
pub struct AppProject {
    pub temp_dir: TempDir,
}

impl AppProject {
    /// Project whose manifest has the given id and version name
    pub fn new(id: &str, version: &str) -> Self {
        let project = Self::without_manifest();
        project.write_manifest(&format!(
            r#"{{
    "name": "demo",
    "id": "{}",
    "version": {{ "name": "{}", "code": "100" }},
    "description": ""
}}"#,
            id, version
        ));
        project
    }

    /// Project with a build tree but no manifest.json
    pub fn without_manifest() -> Self {
        let temp_dir = tempfile::tempdir().unwrap();
        let app = temp_dir.path().join("dist/build/app");

        fs::create_dir_all(app.join("static/img")).unwrap();
        fs::create_dir_all(app.join("pages/index")).unwrap();
        fs::create_dir_all(app.join("uni_modules")).unwrap();
        fs::write(app.join("app-service.js"), "console.log('service');\n".repeat(200)).unwrap();
        fs::write(app.join("app-view.js"), "console.log('view');\n".repeat(200)).unwrap();
        fs::write(app.join("static/img/logo.png"), [0x89, b'P', b'N', b'G', 0, 1, 2, 3]).unwrap();
        fs::write(app.join("pages/index/index.css"), "body { margin: 0; }\n").unwrap();

        Self { temp_dir }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn app_dir(&self) -> PathBuf {
        self.root().join("dist/build/app")
    }

    pub fn wgt_dir(&self) -> PathBuf {
        self.root().join("dist/build/wgt")
    }

    pub fn write_manifest(&self, content: &str) {
        fs::write(self.app_dir().join("manifest.json"), content).unwrap();
    }

    /// Entry names the archive must contain, sorted
    pub fn expected_entries(&self) -> Vec<String> {
        let mut entries = Vec::new();
        for entry in walkdir::WalkDir::new(self.app_dir()).min_depth(1) {
            let entry = entry.unwrap();
            let rel = entry.path().strip_prefix(self.app_dir()).unwrap();
            let mut name = rel.to_string_lossy().replace('\\', "/");
            if entry.file_type().is_dir() {
                name.push('/');
            }
            entries.push(name);
        }
        entries.sort();
        entries
    }
}

/// Sorted entry names of a zip file on disk
pub fn archive_entries(path: &Path) -> Vec<String> {
    let file = fs::File::open(path).unwrap();
    let archive = zip::ZipArchive::new(file).unwrap();
    let mut names: Vec<String> = archive.file_names().map(String::from).collect();
    names.sort();
    names
}
