//! Error types for the download module.
//!
//! Every per-image variant carries the URL being downloaded so a failed batch
//! can report which image broke it.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while acquiring images.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error downloading {url}: {source}")]
    Network {
        /// The URL that failed to download.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout downloading {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// Non-2xx response, after any retries.
    #[error("HTTP {status} downloading {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// File system error while writing the image.
    #[error("IO error writing {url} to {path}: {source}")]
    Io {
        /// The URL being written.
        url: String,
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The destination directory could not be created.
    #[error("cannot create download directory {path}: {source}")]
    Directory {
        /// The directory that could not be created.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The provided URL is malformed or invalid.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },

    /// The downloaded file is not a decodable image.
    #[error("unreadable image from {url}: {source}")]
    UnreadableImage {
        /// The URL the file came from.
        url: String,
        /// The decoder error.
        #[source]
        source: image::ImageError,
    },

    /// The image stayed below the minimum resolution after the quality upgrade.
    #[error(
        "image from {url} below minimum resolution: {width}x{height} < {min_width}x{min_height}"
    )]
    BelowResolution {
        /// The original URL.
        url: String,
        /// Width of the last download.
        width: u32,
        /// Height of the last download.
        height: u32,
        /// Required width.
        min_width: u32,
        /// Required height.
        min_height: u32,
    },
}

impl DownloadError {
    /// Creates a network error from a reqwest error, promoting timeouts.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            return Self::timeout(url);
        }
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates an IO error.
    pub fn io(url: impl Into<String>, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            url: url.into(),
            path: path.into(),
            source,
        }
    }

    /// Creates a directory creation error.
    pub fn directory(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Directory {
            path: path.into(),
            source,
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates an unreadable image error.
    pub fn unreadable_image(url: impl Into<String>, source: image::ImageError) -> Self {
        Self::UnreadableImage {
            url: url.into(),
            source,
        }
    }

    /// Creates a below-resolution error.
    pub fn below_resolution(
        url: impl Into<String>,
        (width, height): (u32, u32),
        (min_width, min_height): (u32, u32),
    ) -> Self {
        Self::BelowResolution {
            url: url.into(),
            width,
            height,
            min_width,
            min_height,
        }
    }

    /// Returns the URL the error is about, if it concerns a single image.
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Network { url, .. }
            | Self::Timeout { url }
            | Self::HttpStatus { url, .. }
            | Self::Io { url, .. }
            | Self::InvalidUrl { url }
            | Self::UnreadableImage { url, .. }
            | Self::BelowResolution { url, .. } => Some(url),
            Self::Directory { .. } => None,
        }
    }
}
