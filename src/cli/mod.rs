// src/cli/mod.rs
//! CLI definitions for wgtpack
//!
//! Invoked without arguments the tool packs `./dist/build/app` into
//! `./dist/build/wgt`, which is what a `"build:wgt": "uni build -p app && wgtpack"`
//! script expects. Every path can be overridden by flag or environment variable.

use clap::Parser;
use wgtpack::PackConfig;

#[derive(Parser, Debug)]
#[command(name = "wgtpack")]
#[command(author = "wgtpack Contributors")]
#[command(version)]
#[command(about = "Pack a uni-app build directory into a .wgt resource package", long_about = None)]
pub struct Cli {
    /// Directory to pack (its contents become the archive root)
    #[arg(short, long, env = "WGTPACK_SOURCE_DIR", default_value = wgtpack::DEFAULT_SOURCE_DIR)]
    pub source_dir: String,

    /// Directory the package is written to
    #[arg(short, long, env = "WGTPACK_OUTPUT_DIR", default_value = wgtpack::DEFAULT_OUTPUT_DIR)]
    pub output_dir: String,

    /// Manifest file name inside the source directory
    #[arg(long, env = "WGTPACK_MANIFEST", default_value = wgtpack::MANIFEST_FILE)]
    pub manifest: String,

    /// Package file extension
    #[arg(long, env = "WGTPACK_EXT", default_value = wgtpack::DEFAULT_EXTENSION)]
    pub ext: String,

    /// Compression level: 1-9 deflate, 0 stores files uncompressed
    #[arg(long, default_value_t = wgtpack::MAX_COMPRESSION_LEVEL,
          value_parser = clap::value_parser!(i64).range(0..=9))]
    pub level: i64,

    /// Show the package path and whether it already exists, without packing
    #[arg(long)]
    pub dry_run: bool,

    /// Don't print the build report
    #[arg(short, long)]
    pub quiet: bool,

    /// Verbose logging (repeat for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Packaging configuration from the parsed flags
    pub fn pack_config(&self) -> PackConfig {
        PackConfig::default()
            .with_source_dir(&self.source_dir)
            .with_output_dir(&self.output_dir)
            .with_manifest_name(&self.manifest)
            .with_extension(&self.ext)
            .with_compression_level(self.level)
    }
}
