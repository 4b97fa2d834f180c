//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

/// Extract a product from share text, download its images and remove their
/// backgrounds.
///
/// Prints `{"product_id": ..., "processed_images": [...]}` as JSON on stdout.
/// Logs go to stderr.
#[derive(Parser, Debug)]
#[command(name = "product-images")]
#[command(author, version, about)]
pub struct Args {
    /// Raw share link or share text
    #[arg(short, long)]
    pub input: String,

    /// Directory for downloaded and processed images [default: output]
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// 1-based indices of processed images to print (default: all)
    #[arg(short, long, num_args = 1.., value_parser = clap::value_parser!(u32).range(1..))]
    pub select: Vec<u32>,

    /// Maximum retry attempts per image for transient failures (0-10)
    #[arg(short = 'r', long, value_parser = clap::value_parser!(u8).range(0..=10))]
    pub max_retries: Option<u8>,

    /// Per-image download timeout in seconds (1-3600)
    #[arg(short, long, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub timeout: Option<u64>,

    /// Path or name of the rembg executable
    #[arg(long)]
    pub rembg: Option<PathBuf>,

    /// Append logs to this file in addition to stderr
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}
