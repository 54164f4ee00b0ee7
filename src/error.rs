use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("invalid request: {0}")]
    BadRequest(String),
    #[error("failed to call inference service: {0}")]
    Transport(String),
    #[error("inference service returned {status}: {body}")]
    UpstreamStatus { status: u16, body: String },
    #[error("inference service reported an error: {0}")]
    Upstream(String),
    #[error("failed to decode response: {0}")]
    Decode(String),
    #[error("inference request timed out")]
    Timeout,
    #[error("failed to generate insights: {0}")]
    Generation(#[source] Box<ServiceError>),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServiceError {
    pub fn generation(inner: ServiceError) -> Self {
        ServiceError::Generation(Box::new(inner))
    }

    fn status(&self) -> StatusCode {
        match self {
            ServiceError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServiceError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            ServiceError::Generation(inner) => match inner.as_ref() {
                ServiceError::Timeout => StatusCode::GATEWAY_TIMEOUT,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ServiceError::Transport(_)
            | ServiceError::UpstreamStatus { .. }
            | ServiceError::Upstream(_)
            | ServiceError::Decode(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServiceError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ServiceError::Timeout
        } else if err.is_decode() {
            ServiceError::Decode(err.to_string())
        } else {
            ServiceError::Transport(err.to_string())
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = serde_json::json!({
            "error": self.to_string(),
        });

        (status, axum::Json(body)).into_response()
    }
}
