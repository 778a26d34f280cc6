//! Error types shared by all components.
//!
//! Every failure a handler can produce is an [`AppError`]; its
//! [`IntoResponse`] impl renders the uniform `{success:false, message}` body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::response::ApiResponse;

/// Result alias used across the workspace.
pub type AppResult<T> = Result<T, AppError>;

/// Application error taxonomy.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Malformed input detected before any driver call.
    #[error("{0}")]
    Validation(String),

    /// The session has no registered connection.
    #[error("No active connection")]
    NoActiveConnection,

    /// The connected engine has no equivalent of the requested operation.
    #[error("{0}")]
    UnsupportedOperation(String),

    /// The requested database type is unknown.
    #[error("{0}")]
    UnsupportedDatabaseType(String),

    /// The driver failed to open a connection.
    #[error("Connection failed: {0}")]
    DatabaseConnection(String),

    /// The driver reported an error while running a statement.
    #[error("{0}")]
    DatabaseQuery(String),

    /// Unexpected server-side fault.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_)
            | AppError::NoActiveConnection
            | AppError::UnsupportedOperation(_)
            | AppError::UnsupportedDatabaseType(_) => StatusCode::BAD_REQUEST,
            AppError::DatabaseConnection(_)
            | AppError::DatabaseQuery(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code, used in logs.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::NoActiveConnection => "NO_ACTIVE_CONNECTION",
            AppError::UnsupportedOperation(_) => "UNSUPPORTED_OPERATION",
            AppError::UnsupportedDatabaseType(_) => "UNSUPPORTED_DATABASE_TYPE",
            AppError::DatabaseConnection(_) => "DATABASE_CONNECTION_ERROR",
            AppError::DatabaseQuery(_) => "DATABASE_QUERY_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.to_string();

        if status.is_server_error() {
            tracing::error!(code = self.code(), error = %message, "请求处理失败");
        } else {
            tracing::debug!(code = self.code(), error = %message, "请求被拒绝");
        }

        (status, Json(ApiResponse::failure(message))).into_response()
    }
}
