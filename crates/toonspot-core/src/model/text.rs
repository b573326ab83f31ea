//! CLIP text encoder for label embeddings.
//!
//! Loads the text tower (with projection) and its BPE tokenizer, and encodes
//! label strings into vectors aligned with the vision encoder's space.

use std::path::Path;
use std::sync::Mutex;

use ort::session::Session;
use ort::value::Value;

use crate::error::{ClassifyError, LoadError};

/// Projected text embedding output of the exported text model.
const OUTPUT_NAME: &str = "text_embeds";

/// CLIP pads with its end-of-text token.
const PAD_TOKEN: &str = "<|endoftext|>";

/// CLIP text encoder wrapper.
///
/// Uses the same `Mutex<Session>` pattern as the vision encoder.
pub struct TextEncoder {
    session: Mutex<Session>,
    tokenizer: tokenizers::Tokenizer,
    max_length: usize,
    pad_id: u32,
    /// Some exports take an attention mask next to the token ids.
    wants_attention_mask: bool,
}

impl TextEncoder {
    /// Load the text encoder and tokenizer.
    pub fn load(
        model_path: &Path,
        tokenizer_path: &Path,
        max_length: usize,
    ) -> Result<Self, LoadError> {
        if !model_path.exists() {
            return Err(LoadError::Missing {
                what: "text encoder",
                path: model_path.to_path_buf(),
            });
        }
        if !tokenizer_path.exists() {
            return Err(LoadError::Missing {
                what: "tokenizer",
                path: tokenizer_path.to_path_buf(),
            });
        }

        let session = Session::builder()
            .map_err(|e| LoadError::Session {
                what: "text encoder",
                path: model_path.to_path_buf(),
                message: format!("Failed to create ONNX session builder: {e}"),
            })?
            .commit_from_file(model_path)
            .map_err(|e| LoadError::Session {
                what: "text encoder",
                path: model_path.to_path_buf(),
                message: e.to_string(),
            })?;

        let tokenizer =
            tokenizers::Tokenizer::from_file(tokenizer_path).map_err(|e| LoadError::Tokenizer {
                path: tokenizer_path.to_path_buf(),
                message: e.to_string(),
            })?;

        let inputs: Vec<String> = session
            .inputs()
            .iter()
            .map(|i| i.name().to_string())
            .collect();
        let outputs: Vec<String> = session
            .outputs()
            .iter()
            .map(|o| o.name().to_string())
            .collect();

        if !inputs.iter().any(|name| name == "input_ids")
            || !outputs.iter().any(|name| name == OUTPUT_NAME)
        {
            return Err(LoadError::Incompatible {
                what: "text encoder",
                path: model_path.to_path_buf(),
                message: format!(
                    "expected `input_ids` -> `{OUTPUT_NAME}`, found inputs {inputs:?}, outputs {outputs:?}"
                ),
            });
        }

        let wants_attention_mask = inputs.iter().any(|name| name == "attention_mask");
        let pad_id = tokenizer.token_to_id(PAD_TOKEN).unwrap_or(0);

        tracing::debug!(
            "Loaded text encoder (inputs: {:?}, outputs: {:?}, pad_id: {})",
            inputs,
            outputs,
            pad_id
        );

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
            max_length,
            pad_id,
            wants_attention_mask,
        })
    }

    /// Encode a batch of labels to normalized embeddings, one per label.
    pub fn encode_batch(&self, labels: &[&str]) -> Result<Vec<Vec<f32>>, ClassifyError> {
        if labels.is_empty() {
            return Ok(vec![]);
        }

        let encodings = self
            .tokenizer
            .encode_batch(labels.to_vec(), true)
            .map_err(|e| ClassifyError::inference(format!("Tokenization failed: {e}")))?;

        let ids: Vec<&[u32]> = encodings.iter().map(|e| e.get_ids()).collect();
        let (input_ids, attention_mask, seq_len) = pad_batch(&ids, self.max_length, self.pad_id);
        let batch_size = labels.len();
        let shape = vec![batch_size as i64, seq_len as i64];

        let input_ids_value = Value::from_array((shape.clone(), input_ids))
            .map_err(|e| ClassifyError::inference(format!("Failed to create input_ids: {e}")))?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| ClassifyError::inference(format!("Text session lock poisoned: {e}")))?;

        let outputs = if self.wants_attention_mask {
            let mask_value = Value::from_array((shape, attention_mask)).map_err(|e| {
                ClassifyError::inference(format!("Failed to create attention_mask: {e}"))
            })?;
            session.run(ort::inputs![
                "input_ids" => input_ids_value,
                "attention_mask" => mask_value
            ])
        } else {
            session.run(ort::inputs!["input_ids" => input_ids_value])
        }
        .map_err(|e| ClassifyError::inference(format!("Text encoder failed: {e}")))?;

        let text_embeds = outputs
            .iter()
            .find(|(name, _)| *name == OUTPUT_NAME)
            .ok_or_else(|| ClassifyError::inference("Text encoder did not produce text_embeds"))?;

        let (shape, data) = text_embeds.1.try_extract_tensor::<f32>().map_err(|e| {
            ClassifyError::inference(format!("Failed to extract text_embeds: {e}"))
        })?;

        split_embeddings(&shape, data, batch_size)
    }
}

/// Split a `[batch, dim]` output into one normalized embedding per row.
fn split_embeddings(
    shape: &[i64],
    data: &[f32],
    batch_size: usize,
) -> Result<Vec<Vec<f32>>, ClassifyError> {
    let dim = match shape {
        [rows, dim] if *rows as usize == batch_size && *dim > 0 => *dim as usize,
        _ => {
            return Err(ClassifyError::inference(format!(
                "Unexpected text_embeds shape {:?} for {} labels",
                shape, batch_size
            )));
        }
    };
    if data.len() != batch_size * dim {
        return Err(ClassifyError::inference(format!(
            "text_embeds holds {} values, expected {}",
            data.len(),
            batch_size * dim
        )));
    }

    Ok(data.chunks(dim).map(crate::math::l2_normalize).collect())
}

/// Right-pad token id sequences to the longest one (capped at `max_length`).
///
/// Sequences longer than `max_length` are cut and keep their final token
/// (end-of-text) in the last slot. Returns flat ids, the attention mask, and
/// the padded sequence length.
fn pad_batch(ids: &[&[u32]], max_length: usize, pad_id: u32) -> (Vec<i64>, Vec<i64>, usize) {
    let seq_len = ids
        .iter()
        .map(|s| s.len())
        .max()
        .unwrap_or(0)
        .clamp(1, max_length);

    let mut input_ids = vec![pad_id as i64; ids.len() * seq_len];
    let mut attention_mask = vec![0i64; ids.len() * seq_len];

    for (row, seq) in ids.iter().enumerate() {
        let offset = row * seq_len;
        let take = seq.len().min(seq_len);
        for (j, &id) in seq.iter().take(take).enumerate() {
            input_ids[offset + j] = id as i64;
            attention_mask[offset + j] = 1;
        }
        if seq.len() > seq_len {
            if let Some(&last) = seq.last() {
                input_ids[offset + seq_len - 1] = last as i64;
            }
        }
    }

    (input_ids, attention_mask, seq_len)
}
