// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{Context, Result};
use clap::Parser;
use form_field_detector::{
    acquisition::ImageAcquirer,
    api::{start_server, AppState},
    cli::Cli,
    pipeline::Pipeline,
    vision::{DetectionInvoker, VisionModelManager},
};
use std::{env, sync::Arc};
use tokio::signal;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Initialize tracing subscriber for logging
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    tracing::info!(
        "🚀 Starting {}",
        form_field_detector::version::get_version_string()
    );
    tracing::info!("📦 BUILD VERSION: {}", form_field_detector::version::VERSION);

    let config = Cli::parse()
        .into_config()
        .context("Invalid configuration")?;
    tracing::debug!("Effective configuration: {:?}", config);

    // Load the detector once, shared by every request
    let model_manager = VisionModelManager::new(&config.model_config()).await?;

    let staging = config.staging_store();
    tracing::info!("📁 Staging detector inputs in {}", staging.dir().display());

    let acquirer = ImageAcquirer::new(config.max_image_bytes, config.fetch_timeout())
        .context("Failed to create image acquirer")?;
    let invoker = DetectionInvoker::new(model_manager.get_model(), config.detection);

    let state = Arc::new(AppState::new(
        Pipeline::new(acquirer, staging, invoker),
        model_manager,
    ));

    start_server(config.listen_addr, state, async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
        tracing::info!("⏹️  Shutting down...");
    })
    .await?;

    tracing::info!("👋 Goodbye!");
    Ok(())
}
