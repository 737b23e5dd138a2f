use actix_web::{
    error::{JsonPayloadError, PathError, QueryPayloadError},
    http::StatusCode,
    HttpRequest, HttpResponse, ResponseError,
};
use log::{error, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
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
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("{0}")]
    Internal(String),
}

// JSON envelope shared by every error response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ApiError {
    pub fn title(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "Validation Error",
            ApiError::BadRequest(_) => "Bad Request",
            ApiError::Unauthorized(_) => "Authentication Error",
            ApiError::Forbidden(_) => "Forbidden",
            ApiError::NotFound(_) => "Not Found",
            ApiError::Conflict(_) => "Conflict",
            ApiError::Database(_) => "Database Error",
            ApiError::Internal(_) => "Internal Server Error",
        }
    }

    fn public_message(&self) -> String {
        match self {
            ApiError::Database(_) => "A database error occurred".to_string(),
            ApiError::Internal(_) => "An internal server error occurred".to_string(),
            other => other.to_string(),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            ApiError::Database(e) => error!("Database error: {}", e),
            ApiError::Internal(e) => error!("Internal server error: {}", e),
            ApiError::Validation(e) => warn!("Validation error: {}", e),
            ApiError::Unauthorized(e) => warn!("JWT error: {}", e),
            _ => {}
        }

        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: self.title().to_string(),
            message: self.public_message(),
        })
    }
}

impl From<bcrypt::BcryptError> for ApiError {
    fn from(err: bcrypt::BcryptError) -> Self {
        ApiError::Internal(format!("password hashing failed: {err}"))
    }
}

impl From<jsonwebtoken::errors::Error> for ApiError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        ApiError::Internal(format!("token encoding failed: {err}"))
    }
}

// Extractor error handlers so malformed input keeps the JSON envelope.
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    ApiError::Validation(format!("Validation error: {err}")).into()
}

pub fn query_error_handler(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    ApiError::Validation(format!("Validation error: {err}")).into()
}

pub fn path_error_handler(err: PathError, _req: &HttpRequest) -> actix_web::Error {
    ApiError::NotFound(format!("Invalid resource path: {err}")).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;
    use rstest::rstest;

    #[rstest]
    #[case(ApiError::Validation("bad".into()), StatusCode::BAD_REQUEST, "Validation Error")]
    #[case(ApiError::Unauthorized("no token".into()), StatusCode::UNAUTHORIZED, "Authentication Error")]
    #[case(ApiError::Forbidden("Access denied".into()), StatusCode::FORBIDDEN, "Forbidden")]
    #[case(ApiError::NotFound("Task not found".into()), StatusCode::NOT_FOUND, "Not Found")]
    #[case(ApiError::Conflict("Username already exists".into()), StatusCode::CONFLICT, "Conflict")]
    fn maps_variants_to_status(
        #[case] err: ApiError,
        #[case] status: StatusCode,
        #[case] title: &str,
    ) {
        assert_eq!(err.status_code(), status);
        assert_eq!(err.title(), title);
    }

    #[actix_rt::test]
    async fn hides_database_details() {
        let err = ApiError::Database(sqlx::Error::RowNotFound);
        let response = err.error_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(response.into_body()).await.expect("body");
        let payload: ErrorResponse = serde_json::from_slice(&body).expect("json");
        assert_eq!(payload.error, "Database Error");
        assert_eq!(payload.message, "A database error occurred");
    }

    #[actix_rt::test]
    async fn keeps_client_messages() {
        let response = ApiError::Forbidden("Access denied".into()).error_response();
        let body = to_bytes(response.into_body()).await.expect("body");
        let payload: ErrorResponse = serde_json::from_slice(&body).expect("json");
        assert_eq!(payload.message, "Access denied");
    }
}
