//! Local filenames for downloaded images.
//!
//! Names are deterministic: `image_NN<ext>` where `NN` is the 1-based position
//! in the batch, so re-running a product overwrites the same files.

use url::Url;

/// Extensions taken from the URL path as is (lowercased).
const PREFERRED_EXTENSIONS: [&str; 3] = [".jpg", ".jpeg", ".png"];

/// Extension used when nothing better can be inferred.
pub const DEFAULT_EXTENSION: &str = ".jpg";

/// Builds the filename for the `index`-th (1-based) image of a batch.
#[must_use]
pub fn image_filename(url: &str, index: usize) -> String {
    format!("image_{index:02}{}", extension_for(url))
}

/// Infers the file extension for an image URL.
///
/// A `.jpg`, `.jpeg` or `.png` path suffix is kept, lowercased. Any other
/// suffix is mapped through its image MIME type to the canonical extension.
/// Everything else falls back to [`DEFAULT_EXTENSION`].
fn extension_for(url: &str) -> String {
    let Some(ext) = extension_from_url(url) else {
        return DEFAULT_EXTENSION.to_string();
    };
    let lower = ext.to_lowercase();
    if PREFERRED_EXTENSIONS.contains(&lower.as_str()) {
        return lower;
    }
    canonical_image_extension(&lower)
        .unwrap_or(DEFAULT_EXTENSION)
        .to_string()
}

/// The last path segment's extension, dot included.
fn extension_from_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let last_segment = parsed.path_segments()?.next_back()?;
    let dot_index = last_segment.rfind('.')?;
    let ext = &last_segment[dot_index..];
    if ext.len() <= 1 || ext.len() > 12 {
        return None;
    }
    Some(ext.to_string())
}

/// Maps a lowercase extension to the canonical one of its image MIME type.
fn canonical_image_extension(ext: &str) -> Option<&'static str> {
    let mime = match ext {
        ".jpe" | ".jfif" | ".pjpeg" => "image/jpeg",
        ".gif" => "image/gif",
        ".webp" => "image/webp",
        ".bmp" => "image/bmp",
        ".tif" | ".tiff" => "image/tiff",
        ".ico" => "image/x-icon",
        ".avif" => "image/avif",
        ".heic" => "image/heic",
        _ => return None,
    };
    Some(match mime {
        "image/gif" => ".gif",
        "image/webp" => ".webp",
        "image/bmp" => ".bmp",
        "image/tiff" => ".tiff",
        "image/x-icon" => ".ico",
        "image/avif" => ".avif",
        "image/heic" => ".heic",
        _ => ".jpg",
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_filename_zero_pads_index() {
        assert_eq!(
            image_filename("https://cdn.example.com/a.png?ratio=1", 1),
            "image_01.png"
        );
        assert_eq!(
            image_filename("https://cdn.example.com/a.jpeg", 12),
            "image_12.jpeg"
        );
    }

    #[test]
    fn test_preferred_extension_is_lowercased() {
        assert_eq!(image_filename("https://cdn.example.com/A.JPG", 3), "image_03.jpg");
    }

    #[test]
    fn test_other_image_types_use_canonical_extension() {
        assert_eq!(image_filename("https://cdn.example.com/a.webp", 1), "image_01.webp");
        assert_eq!(image_filename("https://cdn.example.com/a.TIF", 1), "image_01.tiff");
        assert_eq!(image_filename("https://cdn.example.com/a.jfif", 1), "image_01.jpg");
    }

    #[test]
    fn test_unknown_or_missing_extension_defaults_to_jpg() {
        assert_eq!(
            image_filename("https://p3.example.com/obj/abc~tplv-resize.image?ratio=1", 2),
            "image_02.jpg"
        );
        assert_eq!(image_filename("https://cdn.example.com/abc", 1), "image_01.jpg");
        assert_eq!(image_filename("not a url", 1), "image_01.jpg");
    }

    #[test]
    fn test_host_dots_are_not_extensions() {
        assert_eq!(image_filename("https://cdn.example.com/", 4), "image_04.jpg");
    }
}
