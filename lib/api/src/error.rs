use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use compsift_core::Error;
use serde::Serialize;
use std::fmt;

/// Error body understood by the client: `{"detail": "..."}`
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub detail: String,
}

/// HTTP mapping of engine errors
#[derive(Debug)]
pub struct ApiError(pub Error);

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        ApiError(e)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match &self.0 {
            Error::BadRequest(_) | Error::InvalidConfig(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::UpstreamUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Error::InvalidCoordinates { .. } | Error::InsufficientData(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Error::Io(_) | Error::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let detail = match &self.0 {
            Error::BadRequest(msg) | Error::NotFound(msg) => msg.clone(),
            other => other.to_string(),
        };
        HttpResponse::build(self.status_code()).json(ErrorBody { detail })
    }
}
