use ai_llm_service::AiLlmError;
use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use doc_store::StoreError;
use qa_agent::AgentError;
use thiserror::Error;
use tracing::{error, warn};

use crate::core::http::response_envelope::ApiResponse;

/// Public application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // --- Boot / config ---
    #[error("configuration error: {0}")]
    Config(String),

    // --- IO / network / server ---
    #[error("failed to bind listener")]
    Bind(#[source] std::io::Error),

    #[error("server error")]
    Server(#[source] std::io::Error),

    // --- Request ---
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("{0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// Error mapped from lower layers with a specific status & code.
    #[error("{message}")]
    Http {
        status: StatusCode,
        code: &'static str,
        message: String,
    },
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Http { status, .. } => *status,
            AppError::Config(_) | AppError::Bind(_) | AppError::Server(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::Bind(_) => "BIND_ERROR",
            AppError::Server(_) => "SERVER_ERROR",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Http { code, .. } => code,
        }
    }

    fn http(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        AppError::Http {
            status,
            code,
            message: message.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();
        let message = self.to_string();
        if status.is_server_error() {
            error!(status = status.as_u16(), code, error = %message, "request failed");
        } else {
            warn!(status = status.as_u16(), code, error = %message, "request rejected");
        }
        ApiResponse::<()>::error(code, message, Vec::new()).into_response_with_status(status)
    }
}

/// Handy result alias used across handlers.
pub type AppResult<T> = Result<T, AppError>;

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        let msg = err.to_string();
        match err {
            StoreError::UnsupportedFormat(_) => {
                AppError::http(StatusCode::UNSUPPORTED_MEDIA_TYPE, "UNSUPPORTED_FORMAT", msg)
            }
            StoreError::FileTooLarge { .. } => {
                AppError::http(StatusCode::PAYLOAD_TOO_LARGE, "FILE_TOO_LARGE", msg)
            }
            StoreError::Extraction { .. } | StoreError::EmptyDocument(_) | StoreError::InvalidInput(_) => {
                AppError::Validation(msg)
            }
            StoreError::Embedding(_) | StoreError::VectorSizeMismatch { .. } => {
                AppError::http(StatusCode::BAD_GATEWAY, "EMBEDDING_FAILURE", msg)
            }
            StoreError::IndexUnavailable(_) => {
                AppError::http(StatusCode::SERVICE_UNAVAILABLE, "INDEX_UNAVAILABLE", msg)
            }
            StoreError::NotFound(what) => AppError::NotFound(what),
            StoreError::Config(reason) => AppError::Config(reason),
            StoreError::Io(_) | StoreError::Json(_) | StoreError::Task(_) => {
                AppError::http(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg)
            }
        }
    }
}

impl From<AiLlmError> for AppError {
    fn from(err: AiLlmError) -> Self {
        if err.is_unavailable() {
            return AppError::http(StatusCode::SERVICE_UNAVAILABLE, "LLM_UNAVAILABLE", err.to_string());
        }
        match err {
            AiLlmError::Config(e) => AppError::Config(e.to_string()),
            other => AppError::http(StatusCode::BAD_GATEWAY, "LLM_ERROR", other.to_string()),
        }
    }
}

impl From<AgentError> for AppError {
    fn from(err: AgentError) -> Self {
        match err {
            AgentError::Validation(msg) => AppError::Validation(msg),
            AgentError::Config(reason) => AppError::Config(reason),
            AgentError::NotFound(what) => AppError::NotFound(what),
            AgentError::Store(e) => e.into(),
            AgentError::Llm(e) => e.into(),
            e @ (AgentError::Json(_) | AgentError::Io(_)) => {
                AppError::http(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", e.to_string())
            }
        }
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        let status = err.status();
        let code = if status == StatusCode::PAYLOAD_TOO_LARGE {
            "FILE_TOO_LARGE"
        } else {
            "BAD_REQUEST"
        };
        AppError::http(status, code, err.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(e: AppError) -> (u16, &'static str) {
        (e.status_code().as_u16(), e.error_code())
    }

    #[test]
    fn store_errors_map_to_distinct_statuses() {
        assert_eq!(pair(StoreError::UnsupportedFormat(".png".into()).into()), (415, "UNSUPPORTED_FORMAT"));
        assert_eq!(pair(StoreError::FileTooLarge { size: 2, limit: 1 }.into()), (413, "FILE_TOO_LARGE"));
        assert_eq!(pair(StoreError::EmptyDocument("a.txt".into()).into()), (422, "VALIDATION_ERROR"));
        assert_eq!(pair(StoreError::Embedding("down".into()).into()), (502, "EMBEDDING_FAILURE"));
        assert_eq!(
            pair(StoreError::VectorSizeMismatch { got: 3, want: 4 }.into()),
            (502, "EMBEDDING_FAILURE")
        );
        assert_eq!(pair(StoreError::IndexUnavailable("corrupt".into()).into()), (503, "INDEX_UNAVAILABLE"));
        assert_eq!(pair(StoreError::NotFound("document x".into()).into()), (404, "NOT_FOUND"));
        let io = std::io::Error::other("disk");
        assert_eq!(pair(StoreError::Io(io).into()), (500, "INTERNAL_ERROR"));
    }

    #[test]
    fn llm_errors_split_unavailable_from_provider_failures() {
        let down = AiLlmError::Unavailable {
            attempts: 3,
            reason: "connection refused".into(),
        };
        assert_eq!(pair(down.into()), (503, "LLM_UNAVAILABLE"));
        assert_eq!(
            pair(AiLlmError::Timeout(std::time::Duration::from_secs(60)).into()),
            (503, "LLM_UNAVAILABLE")
        );
    }

    #[test]
    fn agent_errors_unwrap_their_source() {
        assert_eq!(pair(AgentError::Validation("too short".into()).into()), (422, "VALIDATION_ERROR"));
        assert_eq!(pair(AgentError::NotFound("page.html".into()).into()), (404, "NOT_FOUND"));
        assert_eq!(pair(AgentError::Config("AGENT_TOP_K".into()).into()), (500, "CONFIG_ERROR"));
        assert_eq!(
            pair(AgentError::Store(StoreError::IndexUnavailable("x".into())).into()),
            (503, "INDEX_UNAVAILABLE")
        );
    }
}
