use axum::{
    response::{IntoResponse, Response},
    http::StatusCode,
    Json
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Too many requests: {0}")]
    TooManyRequests(String),
    /// Password accepted, but the account needs a TOTP code to finish logging in
    #[error("Second factor required")]
    SecondFactorRequired { tmp_token: String },
    /// Error rendered in the `{"status": "error", "message": ...}` envelope
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },
}

impl ApiError {
    /// Shorthand for a [`ApiError::Rejected`] error
    pub fn rejected(status: StatusCode, message: impl Into<String>) -> Self {
        ApiError::Rejected { status, message: message.into() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Database(err) => {
                error!("Request failed: {:#}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": "Internal server error" }))
            }
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, json!({ "error": msg })),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, json!({ "error": msg })),
            ApiError::TooManyRequests(msg) => (StatusCode::TOO_MANY_REQUESTS, json!({ "error": msg })),
            ApiError::SecondFactorRequired { tmp_token } => (
                StatusCode::UNAUTHORIZED,
                json!({ "status": "totp_token_required", "data": { "tmpToken": tmp_token } }),
            ),
            ApiError::Rejected { status, message } => {
                (status, json!({ "status": "error", "message": message }))
            }
        };

        (status, Json(body)).into_response()
    }
}
