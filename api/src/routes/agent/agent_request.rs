use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct GenerateAllRequest {
    pub feature_name: String,
}

#[derive(Debug, Deserialize)]
pub struct ExplainRequest {
    /// Test case as free text (or its JSON rendering).
    pub test_case: String,
}
