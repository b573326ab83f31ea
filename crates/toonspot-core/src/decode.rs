//! Upload decoding with content-based format detection and size limits.

use std::fs::File;
use std::io::{BufReader, Cursor, Read};
use std::path::Path;

use image::{DynamicImage, GenericImageView, ImageFormat};

use crate::config::LimitsConfig;
use crate::error::ClassifyError;

/// Image decoder with configurable limits.
#[derive(Debug, Clone)]
pub struct ImageDecoder {
    limits: LimitsConfig,
}

/// Result of decoding an upload.
pub struct DecodedImage {
    /// The decoded image data
    pub image: DynamicImage,
    /// Detected image format
    pub format: ImageFormat,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Upload size in bytes
    pub file_size: u64,
}

impl ImageDecoder {
    /// Create a new decoder with the given limits.
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    /// Decode an upload held in memory.
    ///
    /// The format is sniffed from the content, not from `name`, so a PNG
    /// uploaded as `photo.jpg` still decodes.
    pub fn decode_bytes(&self, bytes: &[u8], name: &str) -> Result<DecodedImage, ClassifyError> {
        let file_size = bytes.len() as u64;
        if file_size > self.limits.max_file_size_bytes() {
            return Err(ClassifyError::FileTooLarge {
                name: name.to_string(),
                size_mb: file_size / (1024 * 1024),
                max_mb: self.limits.max_file_size_mb,
            });
        }
        if bytes.is_empty() {
            return Err(ClassifyError::InvalidImage {
                name: name.to_string(),
                message: "file is empty".to_string(),
            });
        }

        let reader = image::ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| ClassifyError::InvalidImage {
                name: name.to_string(),
                message: format!("Cannot detect image format: {e}"),
            })?;

        let format = reader
            .format()
            .ok_or_else(|| ClassifyError::UnsupportedFormat {
                name: name.to_string(),
                format: Path::new(name)
                    .extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or("unknown")
                    .to_string(),
            })?;

        let image = reader.decode().map_err(|e| ClassifyError::InvalidImage {
            name: name.to_string(),
            message: e.to_string(),
        })?;

        let (width, height) = image.dimensions();
        if width > self.limits.max_image_dimension || height > self.limits.max_image_dimension {
            return Err(ClassifyError::ImageTooLarge {
                name: name.to_string(),
                width,
                height,
                max_dim: self.limits.max_image_dimension,
            });
        }

        tracing::trace!(
            "Decoded {} as {} ({}x{})",
            name,
            format_to_string(format),
            width,
            height
        );

        Ok(DecodedImage {
            image,
            format,
            width,
            height,
            file_size,
        })
    }
}

/// Convert an ImageFormat to a string representation.
pub fn format_to_string(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Jpeg => "jpeg",
        ImageFormat::Png => "png",
        ImageFormat::WebP => "webp",
        ImageFormat::Gif => "gif",
        ImageFormat::Tiff => "tiff",
        ImageFormat::Bmp => "bmp",
        ImageFormat::Ico => "ico",
        ImageFormat::Pnm => "pnm",
        ImageFormat::Avif => "avif",
        _ => "unknown",
    }
}

/// BLAKE3 hex digest of an in-memory upload.
pub fn content_hash(data: &[u8]) -> String {
    blake3::hash(data).to_hex().to_string()
}

/// BLAKE3 hex digest of a file, streamed in 64KB chunks.
pub fn file_hash(path: &Path) -> std::io::Result<String> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut hasher = blake3::Hasher::new();
    let mut buffer = [0u8; 65536];
    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }
    Ok(hasher.finalize().to_hex().to_string())
}
