//! End-to-end batch behavior with a scripted model.

use std::io::Cursor;
use std::sync::Arc;

use image::{DynamicImage, ImageFormat, RgbImage};
use toonspot_core::config::LimitsConfig;
use toonspot_core::{
    BatchRunner, BatchSummary, ClassifyError, Classifier, ImageDecoder, ItemOutcome,
    SimilarityModel, Upload,
};

/// Scores by the image's red channel: red images look like "A", others like "B".
struct ByColor;

impl SimilarityModel for ByColor {
    fn name(&self) -> &str {
        "by-color"
    }

    fn score(&self, image: &DynamicImage, labels: &[&str]) -> Result<Vec<f32>, ClassifyError> {
        let red = image.to_rgb8().get_pixel(0, 0)[0] > 127;
        let mut scores = vec![0.0; labels.len()];
        if red {
            scores[0] = 0.9;
            scores[1] = 0.1;
        } else {
            scores[0] = 0.4;
            scores[1] = 0.6;
        }
        Ok(scores)
    }
}

fn png(rgb: [u8; 3]) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(24, 24, image::Rgb(rgb)));
    let mut buffer = Cursor::new(Vec::new());
    img.write_to(&mut buffer, ImageFormat::Png).unwrap();
    buffer.into_inner()
}

fn runner() -> BatchRunner {
    BatchRunner::new(
        Classifier::new(Arc::new(ByColor)),
        ImageDecoder::new(LimitsConfig::default()),
    )
}

const LABELS: &[&str] = &["A", "B"];

#[test]
fn undecodable_file_between_valid_images() {
    let uploads = vec![
        Upload::new("red.png", png([255, 0, 0])),
        Upload::new("garbage.png", vec![0x89, b'P', b'N', b'G', 0, 0, 0, 0]),
        Upload::new("blue.png", png([0, 0, 255])),
    ];

    let items = runner().run(&uploads, LABELS, 0.5);

    assert_eq!(items.len(), 3);
    assert_eq!(items[0].detection().unwrap().label, "A");
    assert!(items[1].error.as_ref().unwrap().is_invalid_image());
    assert_eq!(items[2].detection().unwrap().label, "B");
    assert_eq!(BatchSummary::of(&items).failed, 1);
}

#[test]
fn threshold_applies_per_item() {
    let uploads = vec![
        Upload::new("red.png", png([255, 0, 0])),
        Upload::new("blue.png", png([0, 0, 255])),
    ];

    let items = runner().run(&uploads, LABELS, 0.7);

    assert_eq!(items[0].detection().unwrap().confidence, 0.9);
    assert_eq!(items[1].outcome, ItemOutcome::NoMatch);
}

#[test]
fn identical_bytes_give_identical_results() {
    let bytes = png([255, 0, 0]);
    let runner = runner();
    let first = runner.run_one(&Upload::new("a.png", bytes.clone()), LABELS, 0.5);
    let second = runner.run_one(&Upload::new("a.png", bytes), LABELS, 0.5);

    assert_eq!(first.outcome, second.outcome);
    assert_eq!(first.content_hash, second.content_hash);
}
