//! Toonspot Core - zero-shot animated character detection.
//!
//! An uploaded image is scored against a fixed list of character labels with
//! a CLIP model; the best label is reported when its confidence reaches a
//! threshold.
//!
//! ```text
//! Upload → Decode → CLIP scores (softmax over labels) → arg-max ≥ threshold?
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use toonspot_core::{labels::ANIMATED_CHARACTERS, ClipModel, Classifier, Config};
//!
//! let config = Config::load()?;
//! let model = ClipModel::load(&config.model, &config.model_path())?
//!     .with_label_bank(ANIMATED_CHARACTERS)?;
//! let classifier = Classifier::new(Arc::new(model));
//!
//! let image = image::open("./pikachu.png")?;
//! if let Some(hit) = classifier.classify(&image, ANIMATED_CHARACTERS, 0.5)? {
//!     println!("{} ({:.2})", hit.label, hit.confidence);
//! }
//! ```

pub mod batch;
pub mod classify;
pub mod config;
pub mod decode;
pub mod discovery;
pub mod error;
pub mod labels;
pub mod math;
pub mod model;
pub mod preview;

// Re-exports for convenient access
pub use batch::{BatchItem, BatchRunner, BatchSummary, ItemOutcome, Upload};
pub use classify::{Classifier, Detection};
pub use config::Config;
pub use decode::{DecodedImage, ImageDecoder};
pub use discovery::FileDiscovery;
pub use error::{ClassifyError, ConfigError, LoadError, Result, ToonError};
pub use image;
pub use model::{ClipModel, SimilarityModel};
pub use preview::Preview;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
