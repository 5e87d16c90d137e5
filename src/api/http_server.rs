// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! HTTP server: shared state, routes and the serve loop

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::crop::crop_handler;
use super::health::health_handler;
use super::predict::{predict_upload_handler, predict_url_handler};
use crate::pipeline::Pipeline;
use crate::vision::model_manager::VisionModelManager;

/// Room for multipart framing around the image itself
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Shared, read-only request state
#[derive(Debug, Clone)]
pub struct AppState {
    pub pipeline: Pipeline,
    pub model_manager: VisionModelManager,
}

impl AppState {
    pub fn new(pipeline: Pipeline, model_manager: VisionModelManager) -> Self {
        Self {
            pipeline,
            model_manager,
        }
    }
}

pub fn create_app(state: Arc<AppState>) -> Router {
    let body_limit = state.pipeline.acquirer().max_bytes() + MULTIPART_OVERHEAD;

    Router::new()
        .route("/predict/", post(predict_upload_handler))
        .route("/predict", get(predict_url_handler))
        .route("/crop/", post(crop_handler))
        .route("/health", get(health_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until `shutdown` resolves
pub async fn start_server<F>(addr: SocketAddr, state: Arc<AppState>, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("🚀 Form field detector listening on {}", listener.local_addr()?);

    let app = create_app(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("HTTP server error")?;

    tracing::info!("HTTP server stopped");
    Ok(())
}
