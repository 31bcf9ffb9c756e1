//! Local persistence of a selected image: shrink, transcode, write.
//!
//! Oversized images are scaled down so their larger edge lands on the
//! configured bound, with a high-quality Lanczos filter. The on-disk
//! format follows the pixels: anything with an alpha channel becomes a
//! losslessly compressed PNG, everything else a quality-capped JPEG.
//! Encoding happens in memory; the file write is a single call, and an
//! existing file at the same path is overwritten.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::imageops::FilterType;
use image::{DynamicImage, ExtendedColorType, ImageEncoder};
use miette::Diagnostic;
use thiserror::Error;

/// Knobs for [`persist_image`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveOptions {
    /// Upper bound for the larger image edge; anything bigger is scaled
    /// down to hit it exactly, preserving aspect ratio.
    pub max_dimension: u32,
    /// JPEG quality for the non-alpha path. Ignored for PNG output.
    pub jpeg_quality: u8,
}

impl Default for SaveOptions {
    /// 1080 pixels, quality 85.
    fn default() -> Self {
        Self {
            max_dimension: 1080,
            jpeg_quality: 85,
        }
    }
}

/// Why an image could not be persisted.
#[derive(Debug, Error, Diagnostic)]
pub enum PersistError {
    #[error("failed to encode image as {format}")]
    #[diagnostic(code(slidesmith::persistence::encode))]
    Encode {
        format: &'static str,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to write image at {path}: {source}")]
    #[diagnostic(
        code(slidesmith::persistence::io),
        help("check that the output directory exists and is writable")
    )]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Writes `image` under `dir` as `{base_name}.{jpeg|png}` and returns the
/// final path.
///
/// The extension is chosen here, by pixel format, so callers pass a base
/// name without one. `dir` is created if missing; re-persisting the same
/// image with the same options produces a byte-identical file.
pub async fn persist_image(
    image: &DynamicImage,
    dir: &Path,
    base_name: &str,
    opts: &SaveOptions,
) -> Result<PathBuf, PersistError> {
    let scaled = shrink_to_fit(image, opts.max_dimension);
    let image = scaled.as_ref().unwrap_or(image);

    let (bytes, extension) = encode(image, opts)?;

    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|source| PersistError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    let path = dir.join(format!("{base_name}.{extension}"));
    tokio::fs::write(&path, &bytes)
        .await
        .map_err(|source| PersistError::Io {
            path: path.clone(),
            source,
        })?;

    tracing::debug!(
        path = %path.display(),
        bytes = bytes.len(),
        width = image.width(),
        height = image.height(),
        "image persisted"
    );
    Ok(path)
}

/// Returns a scaled-down copy when the larger edge exceeds
/// `max_dimension`, `None` when the image already fits.
fn shrink_to_fit(image: &DynamicImage, max_dimension: u32) -> Option<DynamicImage> {
    if image.width().max(image.height()) <= max_dimension {
        return None;
    }
    Some(image.resize(max_dimension, max_dimension, FilterType::Lanczos3))
}

fn encode(
    image: &DynamicImage,
    opts: &SaveOptions,
) -> Result<(Vec<u8>, &'static str), PersistError> {
    let mut bytes = Vec::new();
    if image.color().has_alpha() {
        let rgba = image.to_rgba8();
        PngEncoder::new_with_quality(
            Cursor::new(&mut bytes),
            CompressionType::Best,
            PngFilter::Adaptive,
        )
        .write_image(
            rgba.as_raw(),
            rgba.width(),
            rgba.height(),
            ExtendedColorType::Rgba8,
        )
        .map_err(|source| PersistError::Encode {
            format: "png",
            source,
        })?;
        Ok((bytes, "png"))
    } else {
        let rgb = image.to_rgb8();
        let mut encoder = JpegEncoder::new_with_quality(Cursor::new(&mut bytes), opts.jpeg_quality);
        encoder
            .encode_image(&rgb)
            .map_err(|source| PersistError::Encode {
                format: "jpeg",
                source,
            })?;
        Ok((bytes, "jpeg"))
    }
}

/// Section title reduced to a filesystem-safe file-name stem.
///
/// Anything outside ASCII alphanumerics, `-`, `_` and `.` becomes `_`, so
/// a title can never smuggle separators into the output directory path.
/// A title with no characters at all falls back to `"section"`.
pub fn slug(title: &str) -> String {
    let cleaned: String = title
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "section".to_owned()
    } else {
        cleaned
    }
}
