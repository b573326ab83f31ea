//! Downscaled previews of uploads, echoed back on the result page.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;

/// Renders small WebP previews as data URIs.
#[derive(Debug, Clone, Copy)]
pub struct Preview {
    size: u32,
}

impl Preview {
    /// Create a preview renderer; `size` is the longest edge in pixels.
    pub fn new(size: u32) -> Self {
        Self { size }
    }

    /// Render a `data:image/webp;base64,...` URI.
    ///
    /// Returns `None` if encoding fails.
    pub fn render(&self, image: &DynamicImage) -> Option<String> {
        let thumbnail = image.thumbnail(self.size, self.size);
        // The WebP encoder only takes 8-bit RGB(A).
        let thumbnail = DynamicImage::ImageRgba8(thumbnail.to_rgba8());

        let mut buffer = Cursor::new(Vec::new());
        thumbnail.write_to(&mut buffer, ImageFormat::WebP).ok()?;

        Some(format!(
            "data:image/webp;base64,{}",
            BASE64.encode(buffer.into_inner())
        ))
    }
}
