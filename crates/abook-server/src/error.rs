use abook_registry::RegistryError;
use abook_service::ServiceError;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Service(ServiceError::Registry(err)) => match err {
                RegistryError::NotFound { .. } => StatusCode::NOT_FOUND,
                RegistryError::Duplicate { .. } => StatusCode::CONFLICT,
                RegistryError::Validation(_) => StatusCode::BAD_REQUEST,
                RegistryError::InternalInconsistency(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<RegistryError> for ServerError {
    fn from(err: RegistryError) -> Self {
        Self::Service(ServiceError::Registry(err))
    }
}

/// A body that fails to deserialize is bad input like any other.
impl From<JsonRejection> for ServerError {
    fn from(rejection: JsonRejection) -> Self {
        RegistryError::validation(rejection.body_text()).into()
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, %status, "request rejected");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub type ServerResult<T> = Result<T, ServerError>;
