//! The `toonspot serve` command.

use std::net::SocketAddr;

use anyhow::Context;
use clap::Args;
use toonspot_core::labels::ANIMATED_CHARACTERS;
use toonspot_core::{BatchRunner, Classifier, Config, ImageDecoder, Preview, SimilarityModel};

use crate::server::{self, AppState};

/// Arguments for the `serve` command.
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to bind [default: from config]
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind [default: from config]
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Initial value of the threshold slider [default: from config]
    #[arg(short, long)]
    pub threshold: Option<f32>,
}

/// Execute the serve command.
pub async fn execute(args: ServeArgs, config: Config) -> anyhow::Result<()> {
    let threshold = super::check_threshold(args.threshold.unwrap_or(config.classify.threshold))?;
    let host = args.host.unwrap_or_else(|| config.server.host.clone());
    let port = args.port.unwrap_or(config.server.port);
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .with_context(|| format!("Invalid listen address {host}:{port}"))?;

    // Loaded before binding so a missing model never serves a broken page.
    let model = super::load_model(&config)?;
    tracing::info!(
        "Loaded {} with {} labels",
        model.name(),
        ANIMATED_CHARACTERS.len()
    );

    let runner = BatchRunner::new(
        Classifier::new(model),
        ImageDecoder::new(config.limits.clone()),
    )
    .with_preview(Preview::new(config.server.preview_size));
    let state = AppState::new(runner, ANIMATED_CHARACTERS, threshold, &config.limits)?;
    let app = server::router(state, server::body_limit(&config.limits));

    server::serve(addr, app).await
}
