//! REST API over the document repository.
//!
//! Status codes: 200/201 on success, 404 for unknown documents, 400 for
//! validation failures and 409 for edits of immutable RFPs.

mod error;
mod handlers;

pub use error::ApiError;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::error::{Result, VellumError};
use crate::generation::OutlineGenerator;
use crate::repository::Repository;

/// Application state shared by all handlers
pub struct AppState {
    pub repo: Mutex<Repository>,
    pub generator: OutlineGenerator,
}

impl AppState {
    pub fn new(repo: Repository) -> Self {
        Self {
            repo: Mutex::new(repo),
            generator: OutlineGenerator::new(),
        }
    }
}

/// Build the router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/projects", get(handlers::list_projects))
        .route("/api/projects/{name}", get(handlers::project_documents))
        .route(
            "/api/rfps",
            get(handlers::list_rfps).post(handlers::create_rfp),
        )
        .route(
            "/api/rfps/{id}",
            get(handlers::get_rfp)
                .patch(handlers::edit_rfp)
                .delete(handlers::delete_rfp),
        )
        .route("/api/rfps/{id}/generate", post(handlers::generate_from_rfp))
        .route(
            "/api/documents",
            get(handlers::list_documents).post(handlers::create_document),
        )
        .route(
            "/api/documents/{id}",
            get(handlers::get_document)
                .patch(handlers::edit_document)
                .delete(handlers::delete_document),
        )
        .route("/api/documents/{id}/history", get(handlers::document_history))
        .route("/api/search", get(handlers::search))
        .with_state(state)
}

/// Serve the API until `shutdown` is cancelled.
pub async fn serve_http(repo: Repository, bind: &str, shutdown: CancellationToken) -> Result<()> {
    let addr: SocketAddr = bind.parse().map_err(|_| VellumError::InvalidValue {
        field: "http.bind".to_string(),
        value: bind.to_string(),
    })?;

    let app = router(Arc::new(AppState::new(repo)));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Serving document API on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    info!("Document API stopped");
    Ok(())
}
