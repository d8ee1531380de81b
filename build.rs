// build.rs

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

/// Mirror of `src/cli/mod.rs` for man page rendering
fn build_cli() -> Command {
    Command::new("wgtpack")
        .version(env!("CARGO_PKG_VERSION"))
        .author("wgtpack Contributors")
        .about("Pack a uni-app build directory into a .wgt resource package")
        .arg(
            Arg::new("source_dir")
                .short('s')
                .long("source-dir")
                .value_name("DIR")
                .env("WGTPACK_SOURCE_DIR")
                .default_value("./dist/build/app")
                .help("Directory to pack (its contents become the archive root)"),
        )
        .arg(
            Arg::new("output_dir")
                .short('o')
                .long("output-dir")
                .value_name("DIR")
                .env("WGTPACK_OUTPUT_DIR")
                .default_value("./dist/build/wgt")
                .help("Directory the package is written to"),
        )
        .arg(
            Arg::new("manifest")
                .long("manifest")
                .value_name("FILE")
                .env("WGTPACK_MANIFEST")
                .default_value("manifest.json")
                .help("Manifest file name inside the source directory"),
        )
        .arg(
            Arg::new("ext")
                .long("ext")
                .env("WGTPACK_EXT")
                .default_value("wgt")
                .help("Package file extension"),
        )
        .arg(
            Arg::new("level")
                .long("level")
                .default_value("9")
                .help("Compression level: 1-9 deflate, 0 stores files uncompressed"),
        )
        .arg(
            Arg::new("dry_run")
                .long("dry-run")
                .action(ArgAction::SetTrue)
                .help("Show the package path and whether it already exists, without packing"),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .action(ArgAction::SetTrue)
                .help("Don't print the build report"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::Count)
                .help("Verbose logging (repeat for trace)"),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let out_dir = match env::var("OUT_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(e) => {
            println!("cargo:warning=OUT_DIR not set: {}", e);
            return;
        }
    };
    let man_dir = out_dir.join("man");

    if let Err(e) = fs::create_dir_all(&man_dir) {
        println!("cargo:warning=Failed to create man directory: {}", e);
        return;
    }

    let man = Man::new(build_cli());
    let mut buffer = Vec::new();

    if let Err(e) = man.render(&mut buffer) {
        println!("cargo:warning=Failed to render man page: {}", e);
        return;
    }

    let man_path = man_dir.join("wgtpack.1");
    if let Err(e) = fs::write(&man_path, buffer) {
        println!("cargo:warning=Failed to write man page: {}", e);
    }
}
