use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::db::is_unique_violation;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    MalformedInput(String),

    #[error("invalid authorization header")]
    MalformedCredential,

    /// Unknown and expired tokens share this variant on purpose.
    #[error("invalid or expired token")]
    InvalidCredential,

    /// Wrong username and wrong password share this variant on purpose.
    #[error("invalid username or password")]
    LoginFailed,

    #[error("you must be logged in to access this resource")]
    Unauthenticated,

    #[error("you are not allowed to modify this resource")]
    Forbidden,

    #[error("resource not found")]
    NotFound,

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MalformedInput(_) => StatusCode::BAD_REQUEST,
            AppError::MalformedCredential
            | AppError::InvalidCredential
            | AppError::LoginFailed
            | AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        if is_unique_violation(&err) {
            return AppError::Conflict("resource already exists".into());
        }
        AppError::Internal(anyhow::Error::new(err))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::Internal(e) => {
                error!(error = ?e, "internal error");
                "internal server error".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
