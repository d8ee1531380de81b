// src/commands/pack.rs

//! Pack command - build a .wgt package from the app build output

use anyhow::{Context, Result};
use std::io::{IsTerminal, Write};
use std::path::Path;
use tracing::info;
use wgtpack::{Error, PackConfig, PackResult, Packager};

const RED: &str = "\x1b[31m";
const RESET: &str = "\x1b[0m";

/// Pack the source directory described by `config`
///
/// # Arguments
/// * `config` - Source/output directories, manifest name, extension, level
/// * `dry_run` - Only resolve the package path and check for a collision
/// * `quiet` - Don't print the build report on success
pub fn cmd_pack(config: PackConfig, dry_run: bool, quiet: bool) -> Result<()> {
    let packager = Packager::new(config);

    if dry_run {
        let plan = packager
            .plan()
            .context("Failed to resolve package path")?;

        println!("[DRY RUN] Would pack:");
        println!("  Source: {}", packager.config().source_dir.display());
        println!("  Package: {}", plan.output_path.display());
        if plan.collision {
            return Err(Error::OutputExists(plan.output_path).into());
        }
        println!("  Status: ready");
        return Ok(());
    }

    let result = packager.run().context("Failed to pack wgt package")?;

    info!(
        "Packed {} {} into {}",
        result.manifest.id,
        result.manifest.version.name,
        result.output_path.display()
    );

    if !quiet {
        print_report(&result);
    }

    Ok(())
}

/// Print the success report to stdout
fn print_report(result: &PackResult) {
    println!("wgt package built");
    println!("Path: {}", result.output_path.display());
    println!("Size: {}", result.display_size());
}

/// Tell the user the package already exists
///
/// Written to stderr. The message is only red when stderr is a terminal;
/// redirected output (CI logs, pipes) gets the plain text without escape codes.
pub fn report_collision(path: &Path) {
    let message = format!(
        "Target file {} already exists, delete the old package or bump the version and build again!",
        path.display()
    );

    let mut stderr = std::io::stderr().lock();
    let _ = if stderr.is_terminal() {
        writeln!(stderr, "{}{}{}", RED, message, RESET)
    } else {
        writeln!(stderr, "{}", message)
    };
}
