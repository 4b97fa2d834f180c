//! Background removal for downloaded images.
//!
//! The actual segmentation is done by an external tool behind the
//! [`BackgroundRemover`] trait; [`RembgCommand`] drives the `rembg` CLI.
//! [`process_batch`] runs a remover over a list of images and tolerates
//! per-image failures: a broken image is logged and skipped, the rest of the
//! batch still runs.

mod error;
mod rembg;

pub use error::BackgroundError;
pub use rembg::{DEFAULT_PROGRAM, RembgCommand};

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{info, instrument, warn};

/// Suffix appended to the input stem for processed files.
pub const OUTPUT_SUFFIX: &str = "_transparent";

/// Something that can cut the background out of an image file.
#[async_trait]
pub trait BackgroundRemover: Send + Sync {
    /// Checks that the remover can run at all.
    ///
    /// # Errors
    ///
    /// Returns [`BackgroundError::Unavailable`] when the backing tool is missing.
    async fn ensure_available(&self) -> Result<(), BackgroundError>;

    /// Writes `input` with its background removed to `output` as PNG.
    ///
    /// # Errors
    ///
    /// Returns a [`BackgroundError`] describing why this image failed.
    async fn remove_background(&self, input: &Path, output: &Path) -> Result<(), BackgroundError>;
}

/// Output path for `input` inside `output_dir`: `<stem>_transparent.png`.
#[must_use]
pub fn processed_path(input: &Path, output_dir: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map_or_else(|| "image".into(), |stem| stem.to_string_lossy());
    output_dir.join(format!("{stem}{OUTPUT_SUFFIX}.png"))
}

/// Removes backgrounds from `paths` into `output_dir`.
///
/// Returns the outputs that were written, in input order. Images that fail
/// are logged and left out.
///
/// # Errors
///
/// Returns [`BackgroundError::Io`] only when `output_dir` cannot be created.
#[instrument(skip(remover, paths), fields(count = paths.len(), output_dir = %output_dir.display()))]
pub async fn process_batch(
    remover: &dyn BackgroundRemover,
    paths: &[PathBuf],
    output_dir: &Path,
) -> Result<Vec<PathBuf>, BackgroundError> {
    tokio::fs::create_dir_all(output_dir)
        .await
        .map_err(|e| BackgroundError::io(output_dir, e))?;

    let mut processed = Vec::with_capacity(paths.len());
    for input in paths {
        let output = processed_path(input, output_dir);
        match remover.remove_background(input, &output).await {
            Ok(()) => processed.push(output),
            Err(error) => {
                warn!(input = %input.display(), error = %error, "background removal failed, skipping");
            }
        }
    }

    info!(
        processed = processed.len(),
        skipped = paths.len() - processed.len(),
        "background removal finished"
    );
    Ok(processed)
}
