//! Image preprocessing for the CLIP vision encoder.
//!
//! CLIP ViT-B/32 expects:
//! - Shortest edge resized to 224 (bicubic), then a 224×224 center crop
//!
//! The crop is located in source coordinates and only that region is
//! resized, so a 1×10000 upload never becomes a 224×2240000 buffer.
//! - Channel order: RGB
//! - Normalization: (pixel/255 - mean) / std with CLIP's per-channel statistics
//! - Tensor layout: NCHW [batch, channels, height, width]

use image::imageops::FilterType;
use image::DynamicImage;
use ndarray::Array4;

/// Number of color channels (RGB).
const CHANNELS: usize = 3;

/// CLIP normalization mean (per-channel).
const NORM_MEAN: [f32; CHANNELS] = [0.481_454_66, 0.457_827_5, 0.408_210_73];

/// CLIP normalization std (per-channel).
const NORM_STD: [f32; CHANNELS] = [0.268_629_54, 0.261_302_6, 0.275_777_1];

/// Dimensions after scaling the shorter edge to `image_size`.
///
/// The longer edge is truncated, not rounded.
fn resized_dims(width: u32, height: u32, image_size: u32) -> (u32, u32) {
    let scale_long = |long: u32, short: u32| {
        let scaled = u64::from(long) * u64::from(image_size) / u64::from(short);
        u32::try_from(scaled).unwrap_or(u32::MAX).max(image_size)
    };
    if width <= height {
        (image_size, scale_long(height, width))
    } else {
        (scale_long(width, height), image_size)
    }
}

/// Region of the source image (x, y, width, height) that ends up in the
/// `image_size`×`image_size` center crop of the resized image.
fn crop_box(width: u32, height: u32, image_size: u32) -> (u32, u32, u32, u32) {
    let (resized_w, resized_h) = resized_dims(width, height, image_size);
    let axis = |source: u32, resized: u32| {
        let (source, resized, size) = (u64::from(source), u64::from(resized), u64::from(image_size));
        let offset = (resized - size) / 2;
        let start = (offset * source / resized).min(source - 1);
        let extent = ((size * source + resized / 2) / resized).clamp(1, source - start);
        (start as u32, extent as u32)
    };
    let (x, crop_w) = axis(width, resized_w);
    let (y, crop_h) = axis(height, resized_h);
    (x, y, crop_w, crop_h)
}

/// Preprocess an image for CLIP inference.
///
/// The caller must pass an image with non-zero width and height.
pub fn preprocess(image: &DynamicImage, image_size: u32) -> Array4<f32> {
    let (width, height) = (image.width().max(1), image.height().max(1));
    let (x, y, crop_w, crop_h) = crop_box(width, height, image_size);

    let rgb = image
        .crop_imm(x, y, crop_w, crop_h)
        .resize_exact(image_size, image_size, FilterType::CatmullRom)
        .to_rgb8();

    let size = image_size as usize;
    let mut tensor = Array4::<f32>::zeros((1, CHANNELS, size, size));
    for (x, y, pixel) in rgb.enumerate_pixels() {
        for c in 0..CHANNELS {
            tensor[[0, c, y as usize, x as usize]] =
                (pixel[c] as f32 / 255.0 - NORM_MEAN[c]) / NORM_STD[c];
        }
    }

    tensor
}
