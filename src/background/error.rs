//! Error types for background removal.

use std::path::PathBuf;

use thiserror::Error;

/// Maximum number of stderr characters kept in [`BackgroundError::Command`].
const STDERR_PREVIEW_CHARS: usize = 400;

/// Errors that can occur while removing backgrounds.
#[derive(Debug, Error)]
pub enum BackgroundError {
    /// The background removal tool is not installed or not executable.
    #[error(
        "background removal unavailable: `{program}` not found\n  Suggestion: install it with `pip install \"rembg[cli]\"` or pass --rembg <path>"
    )]
    Unavailable {
        /// Program name or path that was looked up.
        program: String,
    },

    /// File system error.
    #[error("IO error at {path}: {source}")]
    Io {
        /// Path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The tool ran but exited unsuccessfully.
    #[error("background removal failed for {input} ({status}): {stderr}")]
    Command {
        /// Input image.
        input: PathBuf,
        /// Exit status description.
        status: String,
        /// Trimmed stderr output.
        stderr: String,
    },

    /// The tool's output could not be decoded or re-encoded.
    #[error("cannot convert {path} to PNG: {source}")]
    Image {
        /// File being converted.
        path: PathBuf,
        /// The image error.
        #[source]
        source: image::ImageError,
    },
}

impl BackgroundError {
    /// Creates an unavailable-tool error.
    pub fn unavailable(program: impl Into<String>) -> Self {
        Self::Unavailable {
            program: program.into(),
        }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates a command failure error, truncating long stderr output.
    pub fn command(input: impl Into<PathBuf>, status: impl Into<String>, stderr: &str) -> Self {
        let trimmed = stderr.trim();
        let stderr = if trimmed.chars().count() > STDERR_PREVIEW_CHARS {
            let head: String = trimmed.chars().take(STDERR_PREVIEW_CHARS).collect();
            format!("{head}...")
        } else {
            trimmed.to_string()
        };
        Self::Command {
            input: input.into(),
            status: status.into(),
            stderr,
        }
    }

    /// Creates an image conversion error.
    pub fn image(path: impl Into<PathBuf>, source: image::ImageError) -> Self {
        Self::Image {
            path: path.into(),
            source,
        }
    }
}
