//! Merges CLI flags, the config file and built-in defaults.
//!
//! Precedence: CLI flag, then config file, then the library default.

use std::path::{Path, PathBuf};
use std::time::Duration;

use product_images::PipelineOptions;
use product_images::background::DEFAULT_PROGRAM;

use crate::app_config::FileConfig;
use crate::cli::Args;

/// Output directory used when neither the CLI nor the config sets one.
pub(crate) const DEFAULT_OUTPUT_DIR: &str = "output";

/// Everything `main` needs to build and run a pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RunSettings {
    pub(crate) output_dir: PathBuf,
    pub(crate) rembg: PathBuf,
    pub(crate) log_file: Option<PathBuf>,
    pub(crate) options: PipelineOptions,
}

pub(crate) fn resolve_settings(args: &Args, file_config: Option<&FileConfig>) -> RunSettings {
    let empty = FileConfig::default();
    let file = file_config.unwrap_or(&empty);
    let defaults = PipelineOptions::default();

    let options = PipelineOptions {
        download_timeout: args
            .timeout
            .or(file.download_timeout_secs)
            .map_or(defaults.download_timeout, Duration::from_secs),
        metadata_timeout: file
            .metadata_timeout_secs
            .map_or(defaults.metadata_timeout, Duration::from_secs),
        max_retries: args
            .max_retries
            .map(u32::from)
            .or(file.max_retries)
            .unwrap_or(defaults.max_retries),
        min_width: file.min_width.unwrap_or(defaults.min_width),
        min_height: file.min_height.unwrap_or(defaults.min_height),
        ..defaults
    };

    RunSettings {
        output_dir: pick(&args.output, &file.output_dir)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
        rembg: pick(&args.rembg, &file.rembg).unwrap_or_else(|| PathBuf::from(DEFAULT_PROGRAM)),
        log_file: pick(&args.log_file, &file.log_file),
        options,
    }
}

fn pick(cli: &Option<PathBuf>, file: &Option<PathBuf>) -> Option<PathBuf> {
    cli.as_ref().or(file.as_ref()).cloned()
}

/// Default tracing level when `RUST_LOG` is unset.
pub(crate) fn default_log_level(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        return "error";
    }
    match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

/// Applies 1-based `indices` to `images`; out-of-range indices are dropped and
/// an empty selection keeps everything.
pub(crate) fn select_images<'a>(images: &'a [PathBuf], indices: &[u32]) -> Vec<&'a Path> {
    if indices.is_empty() {
        return images.iter().map(PathBuf::as_path).collect();
    }
    indices
        .iter()
        .filter_map(|&index| {
            let position = usize::try_from(index).ok()?.checked_sub(1)?;
            images.get(position).map(PathBuf::as_path)
        })
        .collect()
}
