use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use anyhow::Error;
use redis::RedisError;
use serde::Serialize;
use std::fmt::{Display, Formatter};

#[derive(Debug, PartialEq)]
pub enum AppErrorType {
    NotFoundError,
    DbError,
    AuthError,
    JsonParseError,
    PayloadValidationError,
    ConflictError,
    ApiError { service: String },
    CacheError,
    InternalServerError,
    ForbiddenError,
    HashingFailed,
    StorageError,
}

#[derive(Debug, PartialEq)]
pub struct AppError {
    pub error_type: AppErrorType,
    pub message: Option<String>,
    pub cause: Option<String>,
}

#[derive(Serialize)]
pub struct AppErrorResponse {
    pub success: bool,
    pub message: String,
}

impl AppError {
    pub fn message(&self) -> String {
        match self {
            AppError {
                message: Some(message),
                ..
            } => message.clone(),

            AppError {
                message: None,
                error_type: AppErrorType::NotFoundError,
                ..
            } => "The requested item was not found".to_string(),
            _ => "An unexpected error has occurred".to_string(),
        }
    }

    pub fn db_error(error: impl ToString) -> AppError {
        AppError {
            cause: Some(error.to_string()),
            error_type: AppErrorType::DbError,
            message: Some("A database error has occurred".to_string()),
        }
    }

    pub fn not_found(message: impl ToString) -> AppError {
        AppError {
            cause: None,
            error_type: AppErrorType::NotFoundError,
            message: Some(message.to_string()),
        }
    }

    pub fn validation_error(message: impl ToString) -> AppError {
        AppError {
            cause: None,
            error_type: AppErrorType::PayloadValidationError,
            message: Some(message.to_string()),
        }
    }

    pub fn conflict(message: impl ToString) -> AppError {
        AppError {
            cause: None,
            error_type: AppErrorType::ConflictError,
            message: Some(message.to_string()),
        }
    }

    pub fn forbidden_error(error: impl ToString) -> AppError {
        AppError {
            cause: Some(error.to_string()),
            error_type: AppErrorType::ForbiddenError,
            message: Some(error.to_string()),
        }
    }

    pub fn unauthorized(error: impl ToString) -> AppError {
        AppError {
            cause: Some(error.to_string()),
            error_type: AppErrorType::AuthError,
            message: Some(error.to_string()),
        }
    }

    pub fn upstream_error(service: &str, message: impl ToString, cause: impl ToString) -> AppError {
        AppError {
            cause: Some(cause.to_string()),
            error_type: AppErrorType::ApiError {
                service: service.to_string(),
            },
            message: Some(message.to_string()),
        }
    }

    pub fn storage_error(message: impl ToString, cause: impl ToString) -> AppError {
        AppError {
            cause: Some(cause.to_string()),
            error_type: AppErrorType::StorageError,
            message: Some(message.to_string()),
        }
    }

    pub fn internal_error(error: impl ToString) -> AppError {
        AppError {
            cause: Some(error.to_string()),
            error_type: AppErrorType::InternalServerError,
            message: Some(error.to_string()),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: Error) -> Self {
        AppError {
            message: None,
            cause: Some(error.to_string()),
            error_type: AppErrorType::InternalServerError,
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> Self {
        match error {
            sqlx::Error::RowNotFound => AppError {
                cause: Some(error.to_string()),
                error_type: AppErrorType::NotFoundError,
                message: None,
            },
            other => AppError::db_error(other),
        }
    }
}

impl From<RedisError> for AppError {
    fn from(error: RedisError) -> Self {
        AppError {
            cause: Some(error.to_string()),
            message: Some("Internal Caching Error".to_string()),
            error_type: AppErrorType::CacheError,
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        // Report the first field message the way the forms display it.
        let message = errors
            .field_errors()
            .values()
            .flat_map(|errs| errs.iter())
            .find_map(|err| err.message.as_ref().map(|m| m.to_string()))
            .unwrap_or_else(|| errors.to_string());

        AppError {
            cause: Some(errors.to_string()),
            error_type: AppErrorType::PayloadValidationError,
            message: Some(message),
        }
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(error: bcrypt::BcryptError) -> Self {
        AppError {
            error_type: AppErrorType::HashingFailed,
            message: Some(format!("Hashing failed: {}", error)),
            cause: None,
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self.error_type {
            AppErrorType::AuthError => StatusCode::UNAUTHORIZED,
            AppErrorType::DbError
            | AppErrorType::JsonParseError
            | AppErrorType::CacheError
            | AppErrorType::StorageError
            | AppErrorType::HashingFailed
            | AppErrorType::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
            AppErrorType::NotFoundError => StatusCode::NOT_FOUND,
            AppErrorType::PayloadValidationError => StatusCode::BAD_REQUEST,
            AppErrorType::ConflictError => StatusCode::CONFLICT,
            AppErrorType::ApiError { .. } => StatusCode::BAD_GATEWAY,
            AppErrorType::ForbiddenError => StatusCode::FORBIDDEN,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.status_code().is_server_error() {
            tracing::error!(
                error.cause = ?self.cause,
                error.kind = ?self.error_type,
                "request failed"
            );
        }
        HttpResponse::build(self.status_code()).json(AppErrorResponse {
            success: false,
            message: self.message(),
        })
    }
}

#[derive(Serialize)]
pub struct AppSuccessResponse<T> {
    pub success: bool,
    pub data: T,
    pub message: String,
}

impl<T: Serialize> AppSuccessResponse<T> {
    pub fn new(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_not_found_maps_to_404() {
        let error = AppError::from(sqlx::Error::RowNotFound);
        assert_eq!(error.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(error.message(), "The requested item was not found");
    }

    #[test]
    fn upstream_failures_are_bad_gateway() {
        let error = AppError::upstream_error("gemini", "Failed to generate response", "timeout");
        assert_eq!(error.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(error.message(), "Failed to generate response");
    }

    #[test]
    fn db_errors_do_not_leak_driver_text() {
        let error = AppError::db_error("Duplicate entry 'a@b.c' for key 'email'");
        assert_eq!(error.message(), "A database error has occurred");
        assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
