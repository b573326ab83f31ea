//! The `toonspot classify` command: the terminal batch driver.

use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{Args, ValueEnum};
use toonspot_core::error::ClassifyError;
use toonspot_core::labels::ANIMATED_CHARACTERS;
use toonspot_core::{
    BatchItem, BatchRunner, BatchSummary, Classifier, Config, FileDiscovery, ImageDecoder, Upload,
};

use crate::server::page::outcome_message;

/// Arguments for the `classify` command.
#[derive(Args, Debug)]
pub struct ClassifyArgs {
    /// Image files or directories to classify
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Minimum confidence to report a character [default: from config]
    #[arg(short, long)]
    pub threshold: Option<f32>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Pretty)]
    pub format: OutputFormat,
}

/// How results are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One human-readable line per image
    Pretty,
    /// One JSON object per line
    Json,
}

/// Execute the classify command.
pub async fn execute(args: ClassifyArgs, config: Config) -> anyhow::Result<()> {
    let threshold = super::check_threshold(args.threshold.unwrap_or(config.classify.threshold))?;

    let discovery = FileDiscovery::new(&config.classify);
    let files: Vec<PathBuf> = args
        .paths
        .iter()
        .flat_map(|p| discovery.discover(p))
        .collect();
    if files.is_empty() {
        anyhow::bail!("No images found");
    }

    let model = super::load_model(&config)?;
    let runner = BatchRunner::new(
        Classifier::new(model),
        ImageDecoder::new(config.limits.clone()),
    );
    let format = args.format;

    let summary = tokio::task::spawn_blocking(move || -> anyhow::Result<BatchSummary> {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        let mut items = Vec::with_capacity(files.len());

        for path in &files {
            let item = classify_path(&runner, path, threshold);
            match format {
                OutputFormat::Pretty => writeln!(out, "{}", render_line(&item))?,
                OutputFormat::Json => writeln!(out, "{}", serde_json::to_string(&item)?)?,
            }
            items.push(item);
        }

        Ok(BatchSummary::of(&items))
    })
    .await??;

    tracing::info!(
        "Done: {} detected, {} below threshold, {} failed",
        summary.detected,
        summary.no_match,
        summary.failed
    );

    Ok(())
}

/// Read one file and classify it; read errors become a failed item.
fn classify_path(runner: &BatchRunner, path: &Path, threshold: f32) -> BatchItem {
    let name = path.display().to_string();
    match std::fs::read(path) {
        Ok(bytes) => runner.run_one(&Upload::new(name, bytes), ANIMATED_CHARACTERS, threshold),
        Err(e) => {
            tracing::warn!("Cannot read {}: {}", name, e);
            let error = ClassifyError::Unreadable {
                name: name.clone(),
                message: e.to_string(),
            };
            BatchItem::failed(name, String::new(), error)
        }
    }
}

/// Human-readable line for one item.
fn render_line(item: &BatchItem) -> String {
    format!("{}: {}", item.name, outcome_message(item))
}
