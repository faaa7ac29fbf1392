use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    response::Response,
};
use doc_store::Document;
use serde::Serialize;
use tracing::{info, instrument};

use crate::{
    core::{
        app_state::AppState,
        http::{request_id::request_id, response_envelope::ok},
    },
    error_handler::AppResult,
};

#[derive(Serialize)]
pub struct DocumentList {
    pub total: usize,
    pub documents: Vec<Document>,
}

/// GET /documents
pub async fn list_documents_route(State(state): State<Arc<AppState>>) -> Response {
    let documents = state.store.documents().await;
    ok(DocumentList {
        total: documents.len(),
        documents,
    })
}

/// DELETE /documents/{id}
#[instrument(name = "delete_document_route", skip(state, headers))]
pub async fn delete_document_route(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let removed = state.store.delete_document(&id).await?;
    info!(
        request_id = %request_id(&headers),
        filename = %removed.filename,
        chunks = removed.chunk_count,
        "document removed"
    );
    Ok(ok(removed))
}
