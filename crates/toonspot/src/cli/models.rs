//! The `toonspot models` command for managing the CLIP model files.

use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use toonspot_core::decode::file_hash;
use toonspot_core::model::{ModelFile, MODEL_FILES};
use toonspot_core::{ClipModel, Config};

/// Arguments for the `models` command.
#[derive(Args, Debug)]
pub struct ModelsArgs {
    #[command(subcommand)]
    pub command: ModelsCommand,
}

/// Subcommands for model management.
#[derive(Subcommand, Debug)]
pub enum ModelsCommand {
    /// Download the CLIP vision encoder, text encoder and tokenizer
    Download {
        /// Re-download files that already exist
        #[arg(long)]
        force: bool,
    },

    /// List model files and whether they are installed
    List,

    /// Show model directory path
    Path,
}

/// Execute the models command.
pub async fn execute(args: ModelsArgs, config: &Config) -> anyhow::Result<()> {
    let model_dir = config.model_path();

    match args.command {
        ModelsCommand::Download { force } => {
            std::fs::create_dir_all(&model_dir)?;
            let client = reqwest::Client::new();

            for file in MODEL_FILES {
                let dest = model_dir.join(file.local_name);
                if dest.exists() && !force {
                    tracing::info!("{} already exists at {:?}", file.label, dest);
                    continue;
                }

                let url = hf_url(&config.model.repo, file);
                tracing::info!("Downloading {}...", file.label);
                tracing::info!("  Source: {}", url);
                tracing::info!("  Destination: {:?}", dest);

                download_file(&client, &url, &dest).await?;

                let file_size = std::fs::metadata(&dest)?.len();
                let digest = file_hash(&dest)?;
                tracing::info!(
                    "  {} complete ({:.1} MB, blake3 {}…)",
                    file.label,
                    file_size as f64 / (1024.0 * 1024.0),
                    &digest[..16]
                );
            }

            tracing::info!("All downloads complete.");
        }

        ModelsCommand::List => {
            println!("Model: {} ({})", config.model.name, config.model.repo);
            println!("  Directory: {}\n", model_dir.display());

            for (file, path) in ClipModel::model_paths(&model_dir) {
                let status = if path.exists() {
                    "ready"
                } else {
                    "not installed"
                };
                println!("    - {:20} {:20} {}", file.label, file.local_name, status);
            }

            if !ClipModel::model_exists(&model_dir) {
                println!("\nRun `toonspot models download` to download missing files.");
            }
        }

        ModelsCommand::Path => {
            println!("{}", model_dir.display());
        }
    }

    Ok(())
}

/// Hugging Face download URL for a model file.
fn hf_url(repo: &str, file: &ModelFile) -> String {
    format!(
        "https://huggingface.co/{}/resolve/main/{}",
        repo, file.remote_path
    )
}

/// Temporary path used while a download is in flight.
fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    dest.with_file_name(name)
}

/// Stream a URL to disk.
///
/// Data goes to `{dest}.part` first and is renamed once complete, so an
/// interrupted download never leaves a truncated model behind.
async fn download_file(client: &reqwest::Client, url: &str, dest: &Path) -> anyhow::Result<()> {
    use futures_util::StreamExt;
    use tokio::io::AsyncWriteExt;

    let response = client
        .get(url)
        .send()
        .await?
        .error_for_status()
        .map_err(|e| anyhow::anyhow!("Download failed: {e}"))?;

    let progress = match response.content_length() {
        Some(total) => {
            let bar = ProgressBar::new(total);
            bar.set_style(
                ProgressStyle::with_template(
                    "  [{elapsed_precise}] {bar:40.cyan/blue} {bytes}/{total_bytes} ({eta})",
                )?
                .progress_chars("=> "),
            );
            bar
        }
        None => ProgressBar::new_spinner(),
    };

    let part = partial_path(dest);
    let mut file = tokio::fs::File::create(&part).await?;
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        progress.inc(chunk.len() as u64);
    }

    file.flush().await?;
    drop(file);
    progress.finish_and_clear();

    tokio::fs::rename(&part, dest).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use toonspot_core::model::VISION_MODEL;

    #[test]
    fn hf_url_points_at_resolve_endpoint() {
        let url = hf_url("Xenova/clip-vit-base-patch32", &VISION_MODEL);
        assert_eq!(
            url,
            "https://huggingface.co/Xenova/clip-vit-base-patch32/resolve/main/onnx/vision_model.onnx"
        );
    }

    #[test]
    fn partial_path_appends_suffix() {
        let dest = Path::new("/models/clip/text_model.onnx");
        assert_eq!(
            partial_path(dest),
            PathBuf::from("/models/clip/text_model.onnx.part")
        );
    }
}
