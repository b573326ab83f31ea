//! Sub-configuration structs with their defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Directory where models are stored
    pub model_dir: PathBuf,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("~/.toonspot/models"),
        }
    }
}

/// CLIP model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Local model name; files live under `{model_dir}/{name}/`
    pub name: String,

    /// Hugging Face repository the ONNX export is fetched from
    pub repo: String,

    /// Square input size of the vision encoder
    pub image_size: u32,

    /// Maximum tokens per label (CLIP's context length)
    pub max_text_length: usize,

    /// Multiplier applied to cosine similarities before softmax
    pub logit_scale: f32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: "clip-vit-base-patch32".to_string(),
            repo: "Xenova/clip-vit-base-patch32".to_string(),
            image_size: 224,
            max_text_length: 77,
            logit_scale: 100.0,
        }
    }
}

/// Classification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifyConfig {
    /// Default confidence threshold (the slider's initial value)
    pub threshold: f32,

    /// File extensions picked up when classifying directories
    pub supported_formats: Vec<String>,
}

impl Default for ClassifyConfig {
    fn default() -> Self {
        Self {
            threshold: 0.5,
            supported_formats: vec!["jpg".to_string(), "jpeg".to_string(), "png".to_string()],
        }
    }
}

/// Resource limits to protect against problematic uploads.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum upload size in megabytes
    pub max_file_size_mb: u64,

    /// Maximum image dimension (width or height)
    pub max_image_dimension: u32,

    /// Per-image classification timeout in milliseconds
    pub item_timeout_ms: u64,

    /// Maximum number of files accepted in one upload
    pub max_files_per_request: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: 20,
            max_image_dimension: 10000,
            item_timeout_ms: 30000,
            max_files_per_request: 32,
        }
    }
}

impl LimitsConfig {
    /// Maximum upload size in bytes.
    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb.saturating_mul(1024 * 1024)
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind
    pub host: String,

    /// Port to bind
    pub port: u16,

    /// Longest edge of the preview echoed back on the result page
    pub preview_size: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8501,
            preview_size: 320,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,

    /// Log format ("pretty" or "json")
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
