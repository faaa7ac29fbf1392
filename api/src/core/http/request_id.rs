use axum::http::HeaderMap;

/// Value of the `X-Request-Id` header, or "-".
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get("X-Request-Id")
        .and_then(|h| h.to_str().ok())
        .filter(|v| !v.trim().is_empty())
        .unwrap_or("-")
}
