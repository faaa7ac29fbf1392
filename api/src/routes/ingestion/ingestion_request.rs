use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct IngestTextRequest {
    pub text: String,
    /// Document name; `.txt` is appended when it has no supported extension.
    #[serde(default)]
    pub source_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct IngestDirectoryRequest {
    /// Server-side directory.
    pub path: String,
    #[serde(default)]
    pub recursive: bool,
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default)]
    pub top_k: Option<usize>,
    #[serde(default)]
    pub document_ids: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ClearRequest {
    #[serde(default)]
    pub confirm: bool,
}
