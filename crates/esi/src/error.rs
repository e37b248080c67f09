//! HTTP error responses.

use axum::Json;
use axum::extract::rejection::BytesRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use esi_core::Error;
use serde::Serialize;
use thiserror::Error;

/// Errors a request can end with.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Account store or account protocol error.
    #[error(transparent)]
    Account(#[from] Error),

    /// The request body could not be understood.
    #[error("{0}")]
    InvalidContent(String),

    /// The request body could not be received.
    #[error(transparent)]
    Body(#[from] BytesRejection),

    /// The route only takes JSON bodies.
    #[error("content type must be application/json")]
    UnsupportedMediaType,

    /// The client is over its request rate.
    #[error("You have exceeded your request rate of {rate} r/s.")]
    Throttled {
        /// Sustained requests per second allowed.
        rate: u32,
    },
}

/// JSON body of an error response.
#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

impl ApiError {
    /// HTTP status of the response.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Account(err) => match err {
                Error::MissingName | Error::AccountExists(_) => StatusCode::CONFLICT,
                Error::AccountNotFound(_) => StatusCode::NOT_FOUND,
                Error::InvalidName { .. } => StatusCode::BAD_REQUEST,
                Error::StoreUnavailable { .. }
                | Error::NotReadable { .. }
                | Error::Malformed { .. }
                | Error::NotWritable { .. }
                | Error::PurgeIncomplete { .. }
                | Error::Serde(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::InvalidContent(_) => StatusCode::BAD_REQUEST,
            Self::Body(rejection) => rejection.status(),
            Self::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::Throttled { .. } => StatusCode::TOO_MANY_REQUESTS,
        }
    }

    /// REST code carried in the response body.
    #[must_use]
    pub fn rest_code(&self) -> &'static str {
        match self {
            Self::Account(err) => err.rest_code(),
            Self::Body(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                "PayloadTooLarge"
            }
            Self::InvalidContent(_) | Self::Body(_) => "InvalidContent",
            Self::UnsupportedMediaType => "UnsupportedMediaType",
            Self::Throttled { .. } => "RequestThrottled",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            code: self.rest_code(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
