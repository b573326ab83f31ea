//! CLIP vision encoder session.
//!
//! Loads the vision tower (with projection) exported to ONNX and turns a
//! preprocessed image tensor into an L2-normalized `image_embeds` vector.

use std::path::Path;
use std::sync::Mutex;

use ndarray::Array4;
use ort::session::Session;
use ort::value::Value;

use crate::error::{ClassifyError, LoadError};

/// Projected image embedding output of the exported vision model.
const OUTPUT_NAME: &str = "image_embeds";

/// Wraps an ONNX Runtime session for CLIP image embedding.
///
/// Uses a `Mutex` because `Session::run` requires `&mut self`.
pub struct VisionEncoder {
    session: Mutex<Session>,
    /// Name of the input tensor (detected from model metadata).
    input_name: String,
}

impl VisionEncoder {
    /// Load the vision encoder from an ONNX file.
    pub fn load(model_path: &Path) -> Result<Self, LoadError> {
        if !model_path.exists() {
            return Err(LoadError::Missing {
                what: "vision encoder",
                path: model_path.to_path_buf(),
            });
        }

        let session = Session::builder()
            .map_err(|e| LoadError::Session {
                what: "vision encoder",
                path: model_path.to_path_buf(),
                message: format!("Failed to create ONNX session builder: {e}"),
            })?
            .commit_from_file(model_path)
            .map_err(|e| LoadError::Session {
                what: "vision encoder",
                path: model_path.to_path_buf(),
                message: e.to_string(),
            })?;

        let input_name = session
            .inputs()
            .first()
            .map(|i| i.name().to_string())
            .unwrap_or_else(|| "pixel_values".to_string());

        let outputs: Vec<String> = session
            .outputs()
            .iter()
            .map(|o| o.name().to_string())
            .collect();
        if !outputs.iter().any(|name| name == OUTPUT_NAME) {
            return Err(LoadError::Incompatible {
                what: "vision encoder",
                path: model_path.to_path_buf(),
                message: format!("expected an `{OUTPUT_NAME}` output, found {outputs:?}"),
            });
        }

        tracing::debug!(
            "Loaded vision encoder from {:?} (input: {:?}, outputs: {:?})",
            model_path,
            input_name,
            outputs
        );

        Ok(Self {
            session: Mutex::new(session),
            input_name,
        })
    }

    /// Run inference on a preprocessed image tensor and return its embedding.
    ///
    /// Input shape: \[1, 3, image_size, image_size\] (NCHW, CLIP-normalized).
    pub fn embed(&self, preprocessed: &Array4<f32>) -> Result<Vec<f32>, ClassifyError> {
        let shape: Vec<i64> = preprocessed.shape().iter().map(|&d| d as i64).collect();
        let flat_data: Vec<f32> = preprocessed.iter().copied().collect();

        let input_value = Value::from_array((shape, flat_data)).map_err(|e| {
            ClassifyError::inference(format!("Failed to create image tensor: {e}"))
        })?;

        let inputs = ort::inputs![self.input_name.as_str() => input_value];

        let mut session = self
            .session
            .lock()
            .map_err(|e| ClassifyError::inference(format!("Vision session lock poisoned: {e}")))?;

        let outputs = session
            .run(inputs)
            .map_err(|e| ClassifyError::inference(format!("Vision encoder failed: {e}")))?;

        let image_embeds = outputs
            .iter()
            .find(|(name, _)| *name == OUTPUT_NAME)
            .ok_or_else(|| ClassifyError::inference("Vision encoder did not produce image_embeds"))?;

        let (shape, data) = image_embeds.1.try_extract_tensor::<f32>().map_err(|e| {
            ClassifyError::inference(format!("Failed to extract image_embeds: {e}"))
        })?;

        // image_embeds is [1, 512]
        let mut embedding = match shape.len() {
            1 => data.to_vec(),
            2 => data[..shape[1] as usize].to_vec(),
            _ => {
                return Err(ClassifyError::inference(format!(
                    "Unexpected image_embeds shape: {:?}",
                    shape
                )));
            }
        };

        crate::math::l2_normalize_in_place(&mut embedding);
        Ok(embedding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_missing_model() {
        let dir = tempfile::tempdir().unwrap();
        let err = VisionEncoder::load(&dir.path().join("vision_model.onnx"))
            .err()
            .unwrap();
        assert!(matches!(err, LoadError::Missing { .. }));
    }
}
