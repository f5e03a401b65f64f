use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::remote::RemoteError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Rejected locally before any remote call was made.
    #[error("{0}")]
    PreconditionNotMet(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Remote operation failed: {0}")]
    RemoteOperationFailed(#[from] RemoteError),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::PreconditionNotMet(_) | AppError::Validation(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::RemoteOperationFailed(RemoteError::Rejected(_)) => StatusCode::BAD_REQUEST,
            AppError::RemoteOperationFailed(_) => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::PreconditionNotMet(msg) | AppError::Validation(msg) => msg.clone(),
            // Rejections (bad credentials, duplicate sign-up) are worded for the user.
            AppError::RemoteOperationFailed(RemoteError::Rejected(msg)) => msg.clone(),
            AppError::RemoteOperationFailed(e) => {
                tracing::error!(error = %e, "Remote operation failed");
                "Something went wrong talking to the server. Please try again.".into()
            }
            AppError::Internal(e) => {
                tracing::error!(error = %e, "Internal error");
                "Internal server error".into()
            }
            _ => self.to_string(),
        };

        let body = json!({
            "error": {
                "message": message,
                "code": status.as_u16(),
            }
        });

        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
