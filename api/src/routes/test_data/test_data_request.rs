use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ExtractFieldsRequest {
    /// Test case as free text or JSON.
    pub test_case: String,
}
