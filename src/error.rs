//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("cannot do operation: {field} '{value}' is already in use")]
    Duplicate { field: &'static str, value: String },
    #[error("invalid chain state: {0}")]
    InvalidChain(String),
    #[error("validation: {0}")]
    Validation(String),
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
    #[error("bad request: {0}")]
    BadRequest(String),
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::Duplicate { .. } => (StatusCode::CONFLICT, "duplicate_entity"),
            AppError::InvalidChain(_) => (StatusCode::UNPROCESSABLE_ENTITY, "invalid_chain_state"),
            AppError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "validation_error"),
            AppError::Db(e) => {
                if let sqlx::Error::RowNotFound = e {
                    (StatusCode::NOT_FOUND, "not_found")
                } else {
                    (StatusCode::INTERNAL_SERVER_ERROR, "database_error")
                }
            }
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
        };
        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
                details: None,
            },
        };
        (status, Json(body)).into_response()
    }
}

/// Which unique field a Postgres constraint name belongs to. The partial
/// unique indexes on account are the authoritative duplicate signal; the
/// in-service pre-checks only produce the friendlier fast-path error.
pub fn duplicate_field_for_constraint(constraint: &str) -> Option<&'static str> {
    if constraint.contains("email") {
        Some("email")
    } else if constraint.contains("username") {
        Some("username")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constraint_names_map_to_fields() {
        assert_eq!(
            duplicate_field_for_constraint("account_email_active_idx"),
            Some("email")
        );
        assert_eq!(
            duplicate_field_for_constraint("account_username_active_idx"),
            Some("username")
        );
        assert_eq!(duplicate_field_for_constraint("post_pkey"), None);
    }

    #[test]
    fn duplicate_message_names_the_field() {
        let err = AppError::Duplicate {
            field: "email",
            value: "a@x.com".into(),
        };
        assert_eq!(
            err.to_string(),
            "cannot do operation: email 'a@x.com' is already in use"
        );
    }
}
