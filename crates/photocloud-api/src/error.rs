use axum::{
    Json,
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::{error, warn};

use photocloud_media::MediaError;
use photocloud_types::api::MessageResponse;

/// Every way a request can fail. Rendered as `{ "msg": ... }`; the causes of
/// upstream and internal failures are logged but never sent to the client.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Invalid upload: {0}")]
    Multipart(#[from] MultipartError),

    /// Media service failure; the message names the operation that failed.
    #[error("{0}")]
    Upstream(&'static str, #[source] MediaError),

    #[error("Server error")]
    Internal(#[source] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Multipart(e) => e.status(),
            ApiError::Upstream(..) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Upstream(op, e) => error!("{}: {}", op, e),
            ApiError::Internal(e) => error!("Internal error: {:#}", e),
            ApiError::Multipart(e) => warn!("Multipart parsing error: {}", e),
            _ => {}
        }

        (self.status(), Json(MessageResponse::new(self.to_string()))).into_response()
    }
}
