//! HTTP server: router, shared state and the serve loop.

use std::sync::Arc;

use axum::Router;
use axum::http::HeaderMap;
use axum::routing::{get, post};
use color_eyre::eyre::{Result, WrapErr};
use tokio::net::TcpListener;
use tracing::info;

use contentflow_core::Pipeline;
use contentflow_shared::ContentFlowError;

use crate::api;

/// Header carrying the service key.
pub(crate) const API_KEY_HEADER: &str = "x-api-key";

/// State shared by every handler.
#[derive(Clone)]
pub(crate) struct AppState {
    pub pipeline: Pipeline,
    /// Expected service key. `None` rejects every keyed request.
    api_key: Option<Arc<str>>,
}

impl AppState {
    pub(crate) fn new(pipeline: Pipeline, api_key: Option<String>) -> Self {
        Self {
            pipeline,
            api_key: api_key.map(Arc::from),
        }
    }

    /// Check the `x-api-key` header against the configured key.
    pub(crate) fn authorize(&self, headers: &HeaderMap) -> Result<(), ContentFlowError> {
        let provided = headers
            .get(API_KEY_HEADER)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();

        match &self.api_key {
            Some(expected) if provided == expected.as_ref() => Ok(()),
            _ => Err(ContentFlowError::Unauthorized),
        }
    }
}

/// Build the service router.
pub(crate) fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(api::health))
        .route("/run", post(api::run_pipeline))
        .route("/prd", post(api::create_prd).get(api::list_prds))
        .route("/prd/{id}/versions", get(api::list_versions))
        .with_state(state)
}

/// Bind `bind` and serve until Ctrl-C.
pub(crate) async fn serve(bind: &str, state: AppState) -> Result<()> {
    let listener = TcpListener::bind(bind)
        .await
        .wrap_err_with(|| format!("failed to bind {bind}"))?;
    let addr = listener.local_addr()?;
    info!(%addr, "contentflow service listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .wrap_err("server error")?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
    }
}
