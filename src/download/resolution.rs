//! Minimum-resolution check for downloaded images.

use std::path::Path;

use image::{ImageError, ImageReader};

/// Default minimum width and height, in pixels.
pub const DEFAULT_MIN_DIMENSION: u32 = 1080;

/// Accepts images whose width and height both meet a threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolutionGate {
    min_width: u32,
    min_height: u32,
}

impl Default for ResolutionGate {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_DIMENSION, DEFAULT_MIN_DIMENSION)
    }
}

impl ResolutionGate {
    /// Creates a gate with explicit thresholds.
    #[must_use]
    pub fn new(min_width: u32, min_height: u32) -> Self {
        Self {
            min_width,
            min_height,
        }
    }

    /// Required `(width, height)`.
    #[must_use]
    pub fn minimum(&self) -> (u32, u32) {
        (self.min_width, self.min_height)
    }

    /// Whether `(width, height)` passes.
    #[must_use]
    pub fn accepts(&self, (width, height): (u32, u32)) -> bool {
        width >= self.min_width && height >= self.min_height
    }
}

/// Reads the pixel dimensions of the image at `path`.
///
/// The format is sniffed from the file contents, not the extension, and only
/// the header is decoded.
///
/// # Errors
///
/// Returns an [`ImageError`] if the file cannot be read or is not a
/// recognized image.
pub fn image_dimensions(path: &Path) -> Result<(u32, u32), ImageError> {
    ImageReader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(ImageError::IoError)?
        .into_dimensions()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_support::images;
    use tempfile::TempDir;

    #[test]
    fn test_default_threshold_is_1080_square() {
        assert_eq!(ResolutionGate::default().minimum(), (1080, 1080));
    }

    #[test]
    fn test_both_dimensions_must_pass() {
        let gate = ResolutionGate::default();
        assert!(gate.accepts((1080, 1080)));
        assert!(gate.accepts((2000, 1500)));
        assert!(!gate.accepts((1079, 4000)));
        assert!(!gate.accepts((4000, 1079)));
    }

    #[test]
    fn test_image_dimensions_sniffs_format() {
        let temp_dir = TempDir::new().unwrap();
        // PNG bytes under a .jpg name.
        let path = temp_dir.path().join("image_01.jpg");
        std::fs::write(&path, images::png(12, 34)).unwrap();
        assert_eq!(image_dimensions(&path).unwrap(), (12, 34));
    }

    #[test]
    fn test_image_dimensions_rejects_non_image() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("image_01.jpg");
        std::fs::write(&path, b"<html>not an image</html>").unwrap();
        assert!(image_dimensions(&path).is_err());
    }

    #[test]
    fn test_image_dimensions_missing_file() {
        let err = image_dimensions(Path::new("/nonexistent/image_01.jpg")).unwrap_err();
        assert!(matches!(err, ImageError::IoError(_)));
    }
}
