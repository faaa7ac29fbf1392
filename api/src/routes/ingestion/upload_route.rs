//! POST /ingestion/upload: multipart, one or more files.

use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    http::HeaderMap,
    response::Response,
};
use doc_store::{IngestRejection, StoreError};
use tracing::{info, instrument, warn};

use crate::{
    core::{
        app_state::AppState,
        http::{request_id::request_id, response_envelope::ok},
    },
    error_handler::{AppError, AppResult},
    routes::ingestion::ingestion_response::UploadResponse,
};

/// Every multipart part with a file name is ingested independently.
///
/// Per-file problems (unsupported format, too large, no text) are reported in `rejected`.
/// When no file could be ingested, the first file's error decides the status code.
/// Embedding, index and I/O failures abort the request.
///
/// # Example
/// ```bash
/// curl -F 'files=@product_specs.md' -F 'files=@faq.pdf' http://127.0.0.1:8000/ingestion/upload
/// ```
#[instrument(name = "upload_route", skip_all)]
pub async fn upload_route(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> AppResult<Response> {
    let request_id = request_id(&headers);

    let mut ingested = Vec::new();
    let mut rejected = Vec::new();
    let mut first_error: Option<StoreError> = None;

    while let Some(field) = multipart.next_field().await? {
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };
        let bytes = field.bytes().await?;

        match state.store.ingest_bytes(&filename, bytes.to_vec()).await {
            Ok(report) => ingested.push(report),
            Err(e) if e.is_file_rejection() => {
                warn!(request_id = %request_id, file = %filename, error = %e, "upload rejected");
                rejected.push(IngestRejection::from_error(&filename, &e));
                first_error.get_or_insert(e);
            }
            Err(e) => return Err(e.into()),
        }
    }

    if ingested.is_empty() {
        return Err(match first_error {
            Some(e) => e.into(),
            None => AppError::Validation("no files in multipart request".into()),
        });
    }

    info!(
        request_id = %request_id,
        ingested = ingested.len(),
        rejected = rejected.len(),
        "upload processed"
    );
    Ok(ok(UploadResponse {
        message: format!("{} file(s) ingested", ingested.len()),
        ingested,
        rejected,
    }))
}
