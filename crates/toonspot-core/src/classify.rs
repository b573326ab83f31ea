//! Thresholded arg-max classification over model scores.

use std::sync::Arc;

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::error::ClassifyError;
use crate::math::argmax;
use crate::model::SimilarityModel;

/// The best-scoring label, when it clears the threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Selected label
    pub label: String,
    /// Position of the label in the label list
    pub index: usize,
    /// Normalized score of the label, the maximum of the score vector
    pub confidence: f32,
}

/// Classifies images with an injected, shared model handle.
#[derive(Clone)]
pub struct Classifier {
    model: Arc<dyn SimilarityModel>,
}

impl Classifier {
    /// Create a classifier around an already-loaded model.
    pub fn new(model: Arc<dyn SimilarityModel>) -> Self {
        Self { model }
    }

    /// Name of the underlying model.
    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// Classify one image against `labels`.
    ///
    /// Returns `Ok(None)` when the best label scores below `threshold`.
    /// A score equal to the threshold is a match.
    pub fn classify(
        &self,
        image: &DynamicImage,
        labels: &[&str],
        threshold: f32,
    ) -> Result<Option<Detection>, ClassifyError> {
        check_threshold(threshold)?;
        if labels.is_empty() {
            return Err(ClassifyError::EmptyLabels);
        }

        let scores = self.model.score(image, labels)?;
        let detection = select(&scores, labels, threshold)?;

        match &detection {
            Some(d) => tracing::debug!("Best label {:?} ({:.4})", d.label, d.confidence),
            None => tracing::debug!("No label reached threshold {:.2}", threshold),
        }

        Ok(detection)
    }
}

/// Reject NaN and values outside [0, 1].
pub fn check_threshold(threshold: f32) -> Result<(), ClassifyError> {
    if (0.0..=1.0).contains(&threshold) {
        Ok(())
    } else {
        Err(ClassifyError::InvalidThreshold(threshold))
    }
}

/// Pick the arg-max of `scores` and compare it against `threshold`.
pub fn select(
    scores: &[f32],
    labels: &[&str],
    threshold: f32,
) -> Result<Option<Detection>, ClassifyError> {
    if scores.len() != labels.len() {
        return Err(ClassifyError::inference(format!(
            "Model returned {} scores for {} labels",
            scores.len(),
            labels.len()
        )));
    }

    let index = argmax(scores).ok_or_else(|| ClassifyError::inference("No valid scores"))?;
    let confidence = scores[index];

    if confidence >= threshold {
        Ok(Some(Detection {
            label: labels[index].to_string(),
            index,
            confidence,
        }))
    } else {
        Ok(None)
    }
}
