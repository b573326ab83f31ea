//! Command handlers.

pub mod classify;
pub mod config;
pub mod labels;
pub mod models;
pub mod serve;

use std::sync::Arc;

use toonspot_core::labels::ANIMATED_CHARACTERS;
use toonspot_core::{ClipModel, Config};

/// Load the CLIP model once, with the character list pre-encoded.
///
/// Any failure here is fatal: nothing can be classified without the model.
pub fn load_model(config: &Config) -> anyhow::Result<Arc<ClipModel>> {
    let model_dir = config.model_path();
    let model = ClipModel::load(&config.model, &model_dir)?.with_label_bank(ANIMATED_CHARACTERS)?;
    Ok(Arc::new(model))
}

/// Reject thresholds outside [0, 1] before any work starts.
pub fn check_threshold(threshold: f32) -> anyhow::Result<f32> {
    if !(0.0..=1.0).contains(&threshold) {
        anyhow::bail!("--threshold must be between 0.0 and 1.0, got {threshold}");
    }
    Ok(threshold)
}
