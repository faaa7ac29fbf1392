use doc_store::{IngestRejection, IngestReport, RetrievedChunk};
use serde::Serialize;

#[derive(Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub ingested: Vec<IngestReport>,
    pub rejected: Vec<IngestRejection>,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub results: Vec<RetrievedChunk>,
}

#[derive(Serialize)]
pub struct ClearResponse {
    pub removed_documents: usize,
}
