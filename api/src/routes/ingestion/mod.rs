pub mod ingest_directory_route;
pub mod ingest_text_route;
pub mod ingestion_request;
pub mod ingestion_response;
pub mod maintenance_route;
pub mod search_route;
pub mod stats_route;
pub mod upload_route;
