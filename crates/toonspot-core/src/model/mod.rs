//! CLIP similarity scoring.
//!
//! The model provider embeds an image and a list of text labels into CLIP's
//! shared space and turns their cosine similarities into a probability
//! distribution over the labels.
//!
//! # Usage
//!
//! ```rust,ignore
//! use toonspot_core::model::{ClipModel, SimilarityModel};
//! use toonspot_core::Config;
//!
//! let config = Config::default();
//! let model = ClipModel::load(&config.model, &config.model_path())?;
//! let scores = model.score(&image, &["Pikachu ⚡", "Shrek 🐸"])?;
//! // scores sum to 1
//! ```

pub(crate) mod label_bank;
pub(crate) mod preprocess;
pub(crate) mod text;
pub(crate) mod vision;

use std::path::{Path, PathBuf};

use image::DynamicImage;

use crate::config::ModelConfig;
use crate::error::{ClassifyError, LoadError};

pub use self::label_bank::LabelBank;
use self::preprocess::preprocess;
use self::text::TextEncoder;
use self::vision::VisionEncoder;

/// A file that makes up the CLIP model on disk.
#[derive(Debug, Clone, Copy)]
pub struct ModelFile {
    /// Human-readable role of the file
    pub label: &'static str,
    /// Path inside the Hugging Face repository
    pub remote_path: &'static str,
    /// Filename inside the local model directory
    pub local_name: &'static str,
}

/// Vision encoder ONNX export.
pub const VISION_MODEL: ModelFile = ModelFile {
    label: "vision encoder",
    remote_path: "onnx/vision_model.onnx",
    local_name: "vision_model.onnx",
};

/// Text encoder ONNX export.
pub const TEXT_MODEL: ModelFile = ModelFile {
    label: "text encoder",
    remote_path: "onnx/text_model.onnx",
    local_name: "text_model.onnx",
};

/// BPE tokenizer definition.
pub const TOKENIZER: ModelFile = ModelFile {
    label: "tokenizer",
    remote_path: "tokenizer.json",
    local_name: "tokenizer.json",
};

/// Every file required to load a [`ClipModel`].
pub const MODEL_FILES: &[ModelFile] = &[VISION_MODEL, TEXT_MODEL, TOKENIZER];

/// Scores an image against text labels.
///
/// Implementations must return exactly one score per label, each in [0, 1],
/// summing to 1.
pub trait SimilarityModel: Send + Sync {
    /// Identifier shown in logs and API responses.
    fn name(&self) -> &str;

    /// Score `image` against every label, in label order.
    fn score(&self, image: &DynamicImage, labels: &[&str]) -> Result<Vec<f32>, ClassifyError>;
}

/// CLIP model running locally through ONNX Runtime.
pub struct ClipModel {
    name: String,
    vision: VisionEncoder,
    text: TextEncoder,
    image_size: u32,
    logit_scale: f32,
    label_bank: Option<LabelBank>,
}

impl ClipModel {
    /// Load the vision encoder, text encoder and tokenizer from `model_dir`.
    pub fn load(config: &ModelConfig, model_dir: &Path) -> Result<Self, LoadError> {
        tracing::info!("Loading {} from {:?}", config.name, model_dir);

        let vision = VisionEncoder::load(&model_dir.join(VISION_MODEL.local_name))?;
        let text = TextEncoder::load(
            &model_dir.join(TEXT_MODEL.local_name),
            &model_dir.join(TOKENIZER.local_name),
            config.max_text_length,
        )?;

        tracing::info!("{} loaded successfully", config.name);

        Ok(Self {
            name: config.name.clone(),
            vision,
            text,
            image_size: config.image_size,
            logit_scale: config.logit_scale,
            label_bank: None,
        })
    }

    /// Pre-encode a fixed label list so scoring it skips the text encoder.
    pub fn with_label_bank(mut self, labels: &[&str]) -> Result<Self, LoadError> {
        let bank =
            LabelBank::encode(labels, &self.text).map_err(|e| LoadError::LabelBank(e.to_string()))?;
        self.label_bank = Some(bank);
        Ok(self)
    }

    /// Check whether every model file exists in `model_dir`.
    pub fn model_exists(model_dir: &Path) -> bool {
        MODEL_FILES
            .iter()
            .all(|file| model_dir.join(file.local_name).exists())
    }

    /// Local paths of every model file.
    pub fn model_paths(model_dir: &Path) -> Vec<(ModelFile, PathBuf)> {
        MODEL_FILES
            .iter()
            .map(|file| (*file, model_dir.join(file.local_name)))
            .collect()
    }
}

impl SimilarityModel for ClipModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn score(&self, image: &DynamicImage, labels: &[&str]) -> Result<Vec<f32>, ClassifyError> {
        if labels.is_empty() {
            return Err(ClassifyError::EmptyLabels);
        }
        if image.width() == 0 || image.height() == 0 {
            return Err(ClassifyError::inference("Image has zero width or height"));
        }

        let tensor = preprocess(image, self.image_size);
        let image_embedding = self.vision.embed(&tensor)?;

        match self.label_bank.as_ref().filter(|bank| bank.covers(labels)) {
            Some(bank) => similarity_scores(&image_embedding, bank.rows(), self.logit_scale),
            None => {
                let label_embeddings = self.text.encode_batch(labels)?;
                similarity_scores(
                    &image_embedding,
                    label_embeddings.iter().map(Vec::as_slice),
                    self.logit_scale,
                )
            }
        }
    }
}

/// Softmax over scaled cosine similarities.
///
/// Both sides are L2-normalized, so the dot product is the cosine. Every
/// label embedding must have the image embedding's dimension.
pub(crate) fn similarity_scores<'a>(
    image_embedding: &[f32],
    label_embeddings: impl Iterator<Item = &'a [f32]>,
    logit_scale: f32,
) -> Result<Vec<f32>, ClassifyError> {
    if image_embedding.is_empty() {
        return Err(ClassifyError::inference("Image embedding is empty"));
    }

    let logits = label_embeddings
        .map(|label| {
            if label.len() != image_embedding.len() {
                return Err(ClassifyError::inference(format!(
                    "Embedding dimension mismatch: image has {}, label has {}",
                    image_embedding.len(),
                    label.len()
                )));
            }
            Ok(logit_scale * crate::math::dot(image_embedding, label))
        })
        .collect::<Result<Vec<f32>, _>>()?;

    Ok(crate::math::softmax(&logits))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_similarity_scores_is_distribution() {
        let image = crate::math::l2_normalize(&[1.0, 0.2, 0.0]);
        let labels = [
            crate::math::l2_normalize(&[1.0, 0.0, 0.0]),
            crate::math::l2_normalize(&[0.0, 1.0, 0.0]),
            crate::math::l2_normalize(&[0.0, 0.0, 1.0]),
        ];
        let scores = similarity_scores(&image, labels.iter().map(Vec::as_slice), 100.0).unwrap();

        assert_eq!(scores.len(), 3);
        let sum: f32 = scores.iter().sum();
        assert!((sum - 1.0).abs() < 1e-4);
        assert!(scores.iter().all(|s| (0.0..=1.0).contains(s)));
        assert_eq!(crate::math::argmax(&scores), Some(0));
    }

    #[test]
    fn test_similarity_scores_identical_labels_tie() {
        let image = [0.6, 0.8];
        let label = [0.6, 0.8];
        let scores =
            similarity_scores(&image, [&label[..], &label[..]].into_iter(), 100.0).unwrap();
        assert!((scores[0] - 0.5).abs() < 1e-6);
        assert!((scores[1] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_similarity_scores_rejects_dimension_mismatch() {
        let image = [0.6, 0.8];
        let short = [1.0];
        let err = similarity_scores(&image, [&image[..], &short[..]].into_iter(), 100.0)
            .unwrap_err();
        assert_eq!(err.kind(), "inference");
        assert!(err.to_string().contains("dimension mismatch"));

        let empty: [f32; 0] = [];
        assert!(similarity_scores(&empty, [&empty[..]].into_iter(), 100.0).is_err());
    }

    #[test]
    fn test_model_exists_requires_all_files() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!ClipModel::model_exists(dir.path()));

        for file in MODEL_FILES {
            std::fs::write(dir.path().join(file.local_name), b"x").unwrap();
        }
        assert!(ClipModel::model_exists(dir.path()));
        assert_eq!(ClipModel::model_paths(dir.path()).len(), 3);
    }

    #[test]
    fn test_load_reports_missing_vision_encoder() {
        let dir = tempfile::tempdir().unwrap();
        let err = ClipModel::load(&ModelConfig::default(), dir.path())
            .err()
            .unwrap();
        assert!(matches!(
            err,
            LoadError::Missing {
                what: "vision encoder",
                ..
            }
        ));
    }
}
