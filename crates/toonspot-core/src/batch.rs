//! Per-item classification of a batch of uploads.
//!
//! Every upload is decoded and classified inside its own error boundary.
//! A failing item is recorded as [`ItemOutcome::Failed`] and the batch moves
//! on to the next upload.

use serde::Serialize;

use crate::classify::{Classifier, Detection};
use crate::decode::{content_hash, ImageDecoder};
use crate::error::ClassifyError;
use crate::preview::Preview;

/// One uploaded file.
#[derive(Debug, Clone)]
pub struct Upload {
    /// Client-supplied file name
    pub name: String,
    /// Raw file contents
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }
}

/// What happened to a single upload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ItemOutcome {
    /// The best label reached the threshold
    Detected(Detection),
    /// The image was classified but nothing reached the threshold
    NoMatch,
    /// Decoding or classification failed
    Failed { kind: String, message: String },
}

/// Result for one upload.
#[derive(Debug, Clone, Serialize)]
pub struct BatchItem {
    /// Client-supplied file name
    pub name: String,
    /// BLAKE3 digest of the upload
    pub content_hash: String,
    /// Decoded dimensions, when decoding succeeded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<(u32, u32)>,
    #[serde(flatten)]
    pub outcome: ItemOutcome,
    /// Data URI of a downscaled copy of the upload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
    /// Original error, kept for callers that want to match on it
    #[serde(skip)]
    pub error: Option<ClassifyError>,
}

impl BatchItem {
    /// A failed item that never reached the decoder.
    pub fn failed(name: impl Into<String>, content_hash: String, error: ClassifyError) -> Self {
        Self {
            name: name.into(),
            content_hash,
            dimensions: None,
            outcome: failed_outcome(&error),
            preview: None,
            error: Some(error),
        }
    }

    /// The detection, if the item matched.
    pub fn detection(&self) -> Option<&Detection> {
        match &self.outcome {
            ItemOutcome::Detected(d) => Some(d),
            _ => None,
        }
    }

    /// Whether this item failed.
    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, ItemOutcome::Failed { .. })
    }
}

fn failed_outcome(error: &ClassifyError) -> ItemOutcome {
    ItemOutcome::Failed {
        kind: error.kind().to_string(),
        message: error.to_string(),
    }
}

/// Decodes and classifies uploads one at a time.
#[derive(Clone)]
pub struct BatchRunner {
    classifier: Classifier,
    decoder: ImageDecoder,
    preview: Option<Preview>,
}

impl BatchRunner {
    /// Create a runner from a classifier and decoder.
    pub fn new(classifier: Classifier, decoder: ImageDecoder) -> Self {
        Self {
            classifier,
            decoder,
            preview: None,
        }
    }

    /// Attach a preview renderer; each decoded upload then carries a preview.
    pub fn with_preview(mut self, preview: Preview) -> Self {
        self.preview = Some(preview);
        self
    }

    /// The classifier used for every item.
    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Classify a single upload. Never fails; errors become a failed item.
    pub fn run_one(&self, upload: &Upload, labels: &[&str], threshold: f32) -> BatchItem {
        let hash = content_hash(&upload.bytes);
        let start = std::time::Instant::now();

        let decoded = match self.decoder.decode_bytes(&upload.bytes, &upload.name) {
            Ok(decoded) => decoded,
            Err(e) => {
                tracing::warn!("Skipping {}: {}", upload.name, e);
                return BatchItem::failed(upload.name.clone(), hash, e);
            }
        };

        let preview = self.preview.and_then(|p| p.render(&decoded.image));
        let result = self.classifier.classify(&decoded.image, labels, threshold);

        let (outcome, error) = match result {
            Ok(Some(detection)) => (ItemOutcome::Detected(detection), None),
            Ok(None) => (ItemOutcome::NoMatch, None),
            Err(e) => {
                tracing::warn!("Classification failed for {}: {}", upload.name, e);
                (failed_outcome(&e), Some(e))
            }
        };

        tracing::debug!(
            "Classified {:?} in {:?} ({}x{})",
            upload.name,
            start.elapsed(),
            decoded.width,
            decoded.height
        );

        BatchItem {
            name: upload.name.clone(),
            content_hash: hash,
            dimensions: Some((decoded.width, decoded.height)),
            outcome,
            preview,
            error,
        }
    }

    /// Classify every upload in order, continuing past failures.
    pub fn run(&self, uploads: &[Upload], labels: &[&str], threshold: f32) -> Vec<BatchItem> {
        uploads
            .iter()
            .map(|upload| self.run_one(upload, labels, threshold))
            .collect()
    }
}

/// Counts for a finished batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub detected: usize,
    pub no_match: usize,
    pub failed: usize,
}

impl BatchSummary {
    /// Tally outcomes.
    pub fn of(items: &[BatchItem]) -> Self {
        items
            .iter()
            .fold(Self::default(), |mut summary, item| {
                match item.outcome {
                    ItemOutcome::Detected(_) => summary.detected += 1,
                    ItemOutcome::NoMatch => summary.no_match += 1,
                    ItemOutcome::Failed { .. } => summary.failed += 1,
                }
                summary
            })
    }
}
