use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;
use storage::{error::StorageError, services::error::ServiceError};
use validator::ValidationErrors;

/// errno reported for storage failures.
pub const DATABASE_ERRNO: u16 = 1500;

/// errno of a request for a record that does not exist.
pub const NOT_FOUND_ERRNO: u16 = 1404;

/// errno of a write refused by a store constraint.
pub const CONFLICT_ERRNO: u16 = 1409;

/// Web layer errors
#[derive(Debug)]
pub enum WebError {
    Service(ServiceError),
    Storage(StorageError),
    Validation(ValidationErrors),
    BadRequest(String),
}

/// Storage failure text attached to 500 responses, surfaced only in debug mode.
#[derive(Debug, Clone)]
pub struct ErrorDetail(pub String);

impl fmt::Display for WebError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Service(e) => write!(f, "Service error: {}", e),
            Self::Storage(e) => write!(f, "Storage error: {}", e),
            Self::Validation(e) => write!(f, "Validation error: {}", e),
            Self::BadRequest(msg) => write!(f, "Bad request: {}", msg),
        }
    }
}

/// HTTP status for each service failure.
pub fn service_status(error: &ServiceError) -> StatusCode {
    match error {
        ServiceError::NoCurrentEvent => StatusCode::PRECONDITION_FAILED,
        ServiceError::TeamNotFound
        | ServiceError::TestNotFound
        | ServiceError::ObstacleNotFound => StatusCode::NOT_FOUND,
        ServiceError::TestNotInEvent
        | ServiceError::ObstacleNotInTest
        | ServiceError::EventDateOverlap => StatusCode::UNPROCESSABLE_ENTITY,
        ServiceError::TeamHasNotPaidToday => StatusCode::PAYMENT_REQUIRED,
        ServiceError::TeamMaxAttemptsReached => StatusCode::FORBIDDEN,
        ServiceError::InvalidFields
        | ServiceError::InvalidObstacle
        | ServiceError::InvalidObstacleScore
        | ServiceError::MissingScoreParam
        | ServiceError::ObstacleIdExpectedForRace
        | ServiceError::MissingEventParam => StatusCode::BAD_REQUEST,
        ServiceError::RaceAlreadyStarted
        | ServiceError::RaceNotStarted
        | ServiceError::ObstacleAlreadyPassed => StatusCode::CONFLICT,
        ServiceError::Database(StorageError::NotFound) => StatusCode::NOT_FOUND,
        ServiceError::Database(
            StorageError::ConstraintViolation(_) | StorageError::ExclusionViolation(_),
        ) => StatusCode::CONFLICT,
        ServiceError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn storage_failure(error: &StorageError) -> Response {
    tracing::error!("Storage error: {:?}", error);

    let body = json!({
        "errno": DATABASE_ERRNO,
        "error": "Database error"
    });
    let mut response = (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response();
    response
        .extensions_mut()
        .insert(ErrorDetail(error.to_string()));
    response
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        match self {
            Self::Service(ServiceError::Database(StorageError::NotFound))
            | Self::Storage(StorageError::NotFound) => (
                StatusCode::NOT_FOUND,
                Json(json!({
                    "errno": NOT_FOUND_ERRNO,
                    "error": "Resource not found"
                })),
            )
                .into_response(),
            Self::Service(ServiceError::Database(
                StorageError::ConstraintViolation(msg) | StorageError::ExclusionViolation(msg),
            ))
            | Self::Storage(
                StorageError::ConstraintViolation(msg) | StorageError::ExclusionViolation(msg),
            ) => (
                StatusCode::CONFLICT,
                Json(json!({
                    "errno": CONFLICT_ERRNO,
                    "error": msg
                })),
            )
                .into_response(),
            Self::Service(ServiceError::Database(e)) | Self::Storage(e) => storage_failure(&e),
            Self::Service(e) => (
                service_status(&e),
                Json(json!({
                    "errno": e.errno(),
                    "error": e.to_string()
                })),
            )
                .into_response(),
            Self::Validation(errors) => {
                let field_errors: Vec<String> = errors
                    .field_errors()
                    .iter()
                    .flat_map(|(field, errors)| {
                        errors.iter().map(move |e| {
                            format!(
                                "{}: {}",
                                field,
                                e.message
                                    .as_ref()
                                    .map(|m| m.to_string())
                                    .unwrap_or_else(|| e.code.to_string())
                            )
                        })
                    })
                    .collect();

                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "errno": ServiceError::InvalidFields.errno(),
                        "error": "Validation failed",
                        "details": field_errors
                    })),
                )
                    .into_response()
            }
            Self::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "errno": ServiceError::InvalidFields.errno(),
                    "error": msg
                })),
            )
                .into_response(),
        }
    }
}

impl From<ServiceError> for WebError {
    fn from(error: ServiceError) -> Self {
        Self::Service(error)
    }
}

impl From<StorageError> for WebError {
    fn from(error: StorageError) -> Self {
        Self::Storage(error)
    }
}

impl From<ValidationErrors> for WebError {
    fn from(error: ValidationErrors) -> Self {
        Self::Validation(error)
    }
}

pub type WebResult<T> = Result<T, WebError>;
