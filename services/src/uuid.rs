use uuid::Uuid;

/// Deterministic UUIDv5 from an arbitrary string id.
pub fn stable_uuid(id: &str) -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_URL, id.as_bytes())
}

/// Document id derived from its name and content hash, so re-uploading the
/// same bytes under the same name maps to the same document.
pub fn document_id(filename: &str, content_hash: &str) -> String {
    stable_uuid(&format!("doc:{filename}:{content_hash}")).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_stable_and_content_sensitive() {
        assert_eq!(document_id("a.md", "h1"), document_id("a.md", "h1"));
        assert_ne!(document_id("a.md", "h1"), document_id("a.md", "h2"));
        assert_ne!(document_id("a.md", "h1"), document_id("b.md", "h1"));
    }
}
