//! Batch image acquisition with a resolution gate.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use super::client::HttpClient;
use super::error::DownloadError;
use super::filename::image_filename;
use super::resolution::{ResolutionGate, image_dimensions};
use crate::quality::ensure_quality_param;

/// An image on disk that passed the resolution gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadedImage {
    /// Local file path.
    pub path: PathBuf,
    /// URL whose bytes ended up in the file (the upgraded URL when the
    /// quality upgrade was used).
    pub source_url: String,
    /// Pixel width.
    pub width: u32,
    /// Pixel height.
    pub height: u32,
}

/// Downloads image batches into a directory.
///
/// Images are fetched one at a time in input order. An image below the
/// resolution gate is fetched once more with the quality parameter; if it
/// still fails the whole batch fails. Files from earlier images in the batch
/// stay on disk.
#[derive(Debug, Clone)]
pub struct ImageAcquirer {
    client: HttpClient,
    gate: ResolutionGate,
}

impl ImageAcquirer {
    /// Creates an acquirer.
    #[must_use]
    pub fn new(client: HttpClient, gate: ResolutionGate) -> Self {
        Self { client, gate }
    }

    /// Returns the resolution gate in use.
    #[must_use]
    pub fn gate(&self) -> ResolutionGate {
        self.gate
    }

    /// Downloads every URL into `dest_dir` as `image_NN<ext>`.
    ///
    /// # Errors
    ///
    /// Returns the first [`DownloadError`]; no file is left at the failing
    /// image's destination path.
    #[instrument(skip(self, urls), fields(count = urls.len(), dest_dir = %dest_dir.display()))]
    pub async fn download(
        &self,
        urls: &[String],
        dest_dir: &Path,
    ) -> Result<Vec<DownloadedImage>, DownloadError> {
        tokio::fs::create_dir_all(dest_dir)
            .await
            .map_err(|e| DownloadError::directory(dest_dir, e))?;

        let mut images = Vec::with_capacity(urls.len());
        for (index, url) in urls.iter().enumerate() {
            let path = dest_dir.join(image_filename(url, index + 1));
            match self.acquire_one(url, &path).await {
                Ok(image) => images.push(image),
                Err(error) => {
                    warn!(url = %url, error = %error, "image acquisition failed");
                    if tokio::fs::try_exists(&path).await.unwrap_or(false) {
                        let _ = tokio::fs::remove_file(&path).await;
                    }
                    return Err(error);
                }
            }
        }

        info!(count = images.len(), "images acquired");
        Ok(images)
    }

    async fn acquire_one(&self, url: &str, path: &Path) -> Result<DownloadedImage, DownloadError> {
        self.client.download_to_path(url, path).await?;
        let mut source_url = url.to_string();
        let mut measured = image_dimensions(path);

        // Unreadable data counts as failing the gate.
        if !measured.as_ref().is_ok_and(|&dims| self.gate.accepts(dims)) {
            let upgraded = ensure_quality_param(url);
            if upgraded == url {
                debug!(url = %url, "quality parameter already present; no upgrade possible");
            } else {
                match &measured {
                    Ok((width, height)) => info!(
                        url = %url,
                        width,
                        height,
                        "below minimum resolution, retrying with quality parameter"
                    ),
                    Err(error) => info!(
                        url = %url,
                        error = %error,
                        "unreadable image, retrying with quality parameter"
                    ),
                }
                self.client.download_to_path(&upgraded, path).await?;
                measured = image_dimensions(path);
                source_url = upgraded;
            }
        }

        let dimensions = measured.map_err(|e| DownloadError::unreadable_image(url, e))?;
        if !self.gate.accepts(dimensions) {
            return Err(DownloadError::below_resolution(
                url,
                dimensions,
                self.gate.minimum(),
            ));
        }

        let (width, height) = dimensions;
        debug!(path = %path.display(), width, height, "image accepted");
        Ok(DownloadedImage {
            path: path.to_path_buf(),
            source_url,
            width,
            height,
        })
    }
}
