//! Dump directory checker
//!
//! Walks the given directories (not recursively) and reports cache files
//! whose header does not match the shape encoded in their name.
//!
//! Usage: dump_check <dir>...

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use disk_texture_storage::container::{dds, png, ImageParameters};
use disk_texture_storage::persistence::{parse_file_name, ParsedFileName};
use disk_texture_storage::texture::mip_extent;

#[derive(Debug, Default)]
struct Summary {
    valid: usize,
    invalid: usize,
    skipped: usize,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let directories: Vec<PathBuf> = std::env::args().skip(1).map(PathBuf::from).collect();

    match run(&directories) {
        Ok(summary) if summary.invalid == 0 => {
            log::info!(
                "{} valid file(s), {} other file(s) skipped",
                summary.valid,
                summary.skipped
            );
        }
        Ok(summary) => {
            log::error!("{} invalid file(s), {} valid", summary.invalid, summary.valid);
            std::process::exit(1);
        }
        Err(e) => {
            log::error!("dump_check failed: {:#}", e);
            std::process::exit(2);
        }
    }
}

fn run(directories: &[PathBuf]) -> Result<Summary> {
    if directories.is_empty() {
        bail!("usage: dump_check <dir>...");
    }

    let mut summary = Summary::default();

    for directory in directories {
        let entries = fs::read_dir(directory)
            .with_context(|| format!("failed to list {}", directory.display()))?;

        for entry in entries {
            let path = entry
                .with_context(|| format!("failed to list {}", directory.display()))?
                .path();

            if !path.is_file() {
                continue;
            }

            let Some(parsed) = path
                .file_name()
                .and_then(|name| name.to_str())
                .and_then(parse_file_name)
            else {
                log::debug!("Skipping {}", path.display());
                summary.skipped += 1;
                continue;
            };

            match check_file(&path, &parsed) {
                Ok(()) => summary.valid += 1,
                Err(e) => {
                    log::warn!("{}: {:#}", path.display(), e);
                    summary.invalid += 1;
                }
            }
        }
    }

    Ok(summary)
}

fn check_file(path: &Path, parsed: &ParsedFileName) -> Result<()> {
    let file = fs::read(path).context("failed to read file")?;

    let header: ImageParameters = match parsed.extension.as_str() {
        "dds" => dds::load_header(&file).map_err(|e| anyhow::anyhow!(e.reason()))?,
        _ => png::load_header(&file).map_err(|e| anyhow::anyhow!(e.reason()))?,
    };

    let (width, height, depth_or_layers) = match parsed.slice {
        Some((level, _)) => (mip_extent(parsed.width, level), mip_extent(parsed.height, level), 1),
        None => (parsed.width, parsed.height, parsed.depth_or_layers),
    };

    if header.width != width || header.height != height {
        bail!(
            "image is {}x{}, name says {}x{}",
            header.width,
            header.height,
            width,
            height
        );
    }

    if header.depth_or_layers != depth_or_layers {
        bail!(
            "image has {} slice(s), name says {}",
            header.depth_or_layers,
            depth_or_layers
        );
    }

    Ok(())
}
