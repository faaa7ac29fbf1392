//! HTTP surface of the QA agent: ingestion, retrieval diagnostics, generation and test-data routes.

mod core;
mod error_handler;
mod middleware_layer;
mod routes;

use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post},
};
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

pub use crate::core::app_state::{AppConfig, AppState};
pub use crate::error_handler::{AppError, AppResult};

use crate::{
    middleware_layer::json_extractor::json_error_mapper,
    routes::{
        agent::{
            explain_route::explain_route, generate_all_route::generate_all_route,
            generate_test_cases_route::generate_test_cases_route, selenium_route::selenium_route,
        },
        documents::documents_route::{delete_document_route, list_documents_route},
        ingestion::{
            ingest_directory_route::ingest_directory_route, ingest_text_route::ingest_text_route,
            maintenance_route::{clear_route, rebuild_route},
            search_route::search_route,
            stats_route::stats_route,
            upload_route::upload_route,
        },
        system::{
            config_route::config_route,
            health_route::{health_llm_route, health_route},
            root_route::root_route,
        },
        test_data::{
            extract_fields_route::extract_fields_route,
            generate_from_cases_route::generate_from_cases_route,
            generate_test_data_route::generate_test_data_route,
            supported_types_route::supported_types_route,
        },
    },
};

/// Multipart uploads may carry several files of `max_upload_bytes` each.
const UPLOAD_FILES_PER_REQUEST: u64 = 5;
const BODY_OVERHEAD_BYTES: u64 = 1024 * 1024;

/// Builds the router over shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let limit = state
        .store
        .config()
        .max_upload_bytes
        .saturating_mul(UPLOAD_FILES_PER_REQUEST)
        .saturating_add(BODY_OVERHEAD_BYTES);
    let limit = usize::try_from(limit).unwrap_or(usize::MAX);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root_route))
        .route("/health", get(health_route))
        .route("/health/llm", get(health_llm_route))
        .route("/config", get(config_route))
        .route("/ingestion/upload", post(upload_route))
        .route("/ingestion/ingest-text", post(ingest_text_route))
        .route("/ingestion/ingest-directory", post(ingest_directory_route))
        .route("/ingestion/search", post(search_route))
        .route("/ingestion/stats", get(stats_route))
        .route("/ingestion/rebuild", post(rebuild_route))
        .route("/ingestion/clear", post(clear_route))
        .route("/documents", get(list_documents_route))
        .route("/documents/{id}", delete(delete_document_route))
        .route("/agent/generate-test-cases", post(generate_test_cases_route))
        .route("/agent/generate-all-test-cases", post(generate_all_route))
        .route("/agent/generate-selenium-script", post(selenium_route))
        .route("/agent/explain-test-case", post(explain_route))
        .route("/test-data/generate", post(generate_test_data_route))
        .route("/test-data/generate-from-test-cases", post(generate_from_cases_route))
        .route("/test-data/extract-fields", post(extract_fields_route))
        .route("/test-data/supported-types", get(supported_types_route))
        .layer(DefaultBodyLimit::max(limit))
        .layer(middleware::from_fn(json_error_mapper))
        .layer(cors)
        .with_state(state)
}

/// Builds the state from the environment, serves until Ctrl+C / SIGTERM, then persists the index.
///
/// # Errors
/// Missing required configuration (e.g. the hosted LLM API key), bind failures,
/// and a failed final save.
pub async fn start() -> AppResult<()> {
    let state = Arc::new(AppState::from_env().await?);
    let app = router(Arc::clone(&state));

    let listener = tokio::net::TcpListener::bind(&state.config.api_address)
        .await
        .map_err(AppError::Bind)?;
    info!(address = %state.config.api_address, "QA agent API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::Server)?;

    state.store.save().await?;
    info!("index persisted; shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
