//! Error types for Toonspot.
//!
//! Startup failures ([`LoadError`], [`ConfigError`]) are fatal to the process.
//! Per-image failures ([`ClassifyError`]) are reported for the single upload
//! they belong to and never abort the rest of a batch.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for Toonspot operations.
#[derive(Error, Debug)]
pub enum ToonError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Model could not be loaded at startup
    #[error("Model load error: {0}")]
    Load(#[from] LoadError),

    /// Classification of a single image failed
    #[error("Classification error: {0}")]
    Classify(#[from] ClassifyError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// The CLIP model or its tokenizer could not be materialized.
#[derive(Error, Debug)]
pub enum LoadError {
    /// A model file is not on disk
    #[error("{what} not found at {path}. Run `toonspot models download` first.")]
    Missing { what: &'static str, path: PathBuf },

    /// ONNX Runtime rejected the model file
    #[error("Failed to load {what} from {path}: {message}")]
    Session {
        what: &'static str,
        path: PathBuf,
        message: String,
    },

    /// The tokenizer file could not be parsed
    #[error("Failed to load tokenizer from {path}: {message}")]
    Tokenizer { path: PathBuf, message: String },

    /// The model loaded but does not expose the expected inputs/outputs
    #[error("Incompatible {what} at {path}: {message}")]
    Incompatible {
        what: &'static str,
        path: PathBuf,
        message: String,
    },

    /// Pre-encoding the label list failed
    #[error("Failed to encode label list: {0}")]
    LabelBank(String),
}

/// Errors for one classification request.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClassifyError {
    /// The uploaded data is not a decodable image
    #[error("{name} is not a valid image: {message}")]
    InvalidImage { name: String, message: String },

    /// The image format could not be detected
    #[error("Unsupported format for {name}: {format}")]
    UnsupportedFormat { name: String, format: String },

    /// The upload could not be read
    #[error("Cannot read {name}: {message}")]
    Unreadable { name: String, message: String },

    /// Upload exceeds the byte size limit
    #[error("File too large: {name} ({size_mb}MB > {max_mb}MB)")]
    FileTooLarge {
        name: String,
        size_mb: u64,
        max_mb: u64,
    },

    /// Decoded image exceeds the dimension limit
    #[error("Image too large: {name} ({width}x{height} > {max_dim})")]
    ImageTooLarge {
        name: String,
        width: u32,
        height: u32,
        max_dim: u32,
    },

    /// Classification did not finish in time
    #[error("Timed out classifying {name} after {timeout_ms}ms")]
    Timeout { name: String, timeout_ms: u64 },

    /// Preprocessing or the model call failed
    #[error("Inference failed: {message}")]
    Inference { message: String },

    /// There is nothing to pick an arg-max from
    #[error("Label list is empty")]
    EmptyLabels,

    /// Threshold is NaN or outside [0, 1]
    #[error("Confidence threshold must be between 0.0 and 1.0, got {0}")]
    InvalidThreshold(f32),
}

impl ClassifyError {
    /// Shorthand for an [`ClassifyError::Inference`] error.
    pub fn inference(message: impl Into<String>) -> Self {
        Self::Inference {
            message: message.into(),
        }
    }

    /// Stable machine-readable kind, used in JSON output.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidImage { .. } | Self::UnsupportedFormat { .. } => "invalid_image",
            Self::Unreadable { .. } => "unreadable",
            Self::FileTooLarge { .. } | Self::ImageTooLarge { .. } => "too_large",
            Self::Timeout { .. } => "timeout",
            Self::Inference { .. } | Self::EmptyLabels => "inference",
            Self::InvalidThreshold(_) => "invalid_threshold",
        }
    }

    /// Whether the upload itself was not an image.
    pub fn is_invalid_image(&self) -> bool {
        self.kind() == "invalid_image"
    }
}

/// Convenience type alias for Toonspot results.
pub type Result<T> = std::result::Result<T, ToonError>;
