pub mod agent;
pub mod documents;
pub mod ingestion;
pub mod system;
pub mod test_data;
