//! Error type shared by all handlers.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use charimachi_directions::DirectionsError;
use charimachi_server_models::{ApiErrorBody, ApiErrorDetail};
use charimachi_upstream::UpstreamError;
use thiserror::Error;

/// A failed API request. Rendered as
/// `{"error": {"code": <status>, "message": ...}}`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request parameters are missing or malformed.
    #[error("{0}")]
    Validation(String),

    /// A third-party provider failed.
    #[error("upstream service error: {0}")]
    Upstream(#[from] UpstreamError),

    /// The provider had nothing to return.
    #[error("{0}")]
    NotFound(String),

    /// The server is missing configuration needed for this request.
    #[error("server misconfigured: {0}")]
    Config(String),
}

impl From<DirectionsError> for ApiError {
    fn from(e: DirectionsError) -> Self {
        match e {
            DirectionsError::Upstream(e) => Self::Upstream(e),
            DirectionsError::EmptyRoute => Self::NotFound(e.to_string()),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            log::error!("{self}");
        } else {
            log::debug!("{self}");
        }
        HttpResponse::build(status).json(ApiErrorBody {
            error: ApiErrorDetail {
                code: status.as_u16(),
                message: self.to_string(),
            },
        })
    }
}
