//! Image acquisition: streaming downloads, retry and the resolution gate.
//!
//! # Features
//!
//! - Streaming downloads straight to the destination file
//! - Retry with exponential backoff on HTTP 500/502/503/504, timeouts and
//!   connection errors
//! - Deterministic `image_NN<ext>` filenames
//! - A minimum-resolution gate with one quality-upgrade re-download
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::time::Duration;
//!
//! use product_images::download::{HttpClient, ImageAcquirer, ResolutionGate};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpClient::new(Duration::from_secs(10))?;
//! let acquirer = ImageAcquirer::new(client, ResolutionGate::default());
//! let urls = vec!["https://cdn.example.com/a.jpg?ratio=1".to_string()];
//! for image in acquirer.download(&urls, Path::new("./output/1/original")).await? {
//!     println!("{} ({}x{})", image.path.display(), image.width, image.height);
//! }
//! # Ok(())
//! # }
//! ```

mod acquirer;
mod client;
mod error;
mod filename;
mod resolution;
mod retry;

pub use acquirer::{DownloadedImage, ImageAcquirer};
pub use client::{DEFAULT_DOWNLOAD_TIMEOUT_SECS, HttpClient};
pub use error::DownloadError;
pub use filename::{DEFAULT_EXTENSION, image_filename};
pub use resolution::{DEFAULT_MIN_DIMENSION, ResolutionGate, image_dimensions};
pub use retry::{
    DEFAULT_BASE_DELAY, DEFAULT_MAX_RETRIES, FailureType, MAX_RETRIES_LIMIT, RETRYABLE_STATUSES,
    RetryDecision, RetryPolicy, classify_error,
};
