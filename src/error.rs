//! Typed errors and HTTP mapping.

use axum::{
    extract::rejection::BytesRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("unknown entity referenced by {entity}.{column}: {target}")]
    MissingReference {
        entity: String,
        column: String,
        target: String,
    },
    #[error("invalid primary key on {entity}: {reason}")]
    InvalidPrimaryKey { entity: String, reason: String },
    #[error("duplicate entity: {0}")]
    DuplicateEntity(String),
    #[error("duplicate column {column} on {entity}")]
    DuplicateColumn { entity: String, column: String },
    #[error("invalid default for {entity}.{column}: {reason}")]
    InvalidDefault {
        entity: String,
        column: String,
        reason: String,
    },
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),
    #[error("reserved name: {0}")]
    ReservedName(String),
    #[error("config load: {0}")]
    Load(String),
    #[error("settings: {0}")]
    Settings(String),
    #[error("schema patch: {0}")]
    Patch(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("bad value for {column}: {message}")]
    BadValue { column: String, message: String },
    #[error("unknown operator: {0}")]
    BadOperator(String),
    #[error("unknown field: {0}")]
    BadField(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("expected exactly one matching row, found {0}")]
    AmbiguousMatch(u64),
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
    /// Errors raised by the HTTP layer (routing, body limits, extractor rejections).
    #[error("{message}")]
    Http { status: StatusCode, message: String },
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Config(_) | AppError::Db(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadValue { .. }
            | AppError::BadOperator(_)
            | AppError::BadField(_)
            | AppError::BadRequest(_)
            | AppError::AmbiguousMatch(_) => StatusCode::BAD_REQUEST,
            AppError::Http { status, .. } => *status,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Config(_) => "config_error",
            AppError::NotFound(_) => "not_found",
            AppError::BadValue { .. } => "bad_value",
            AppError::BadOperator(_) => "bad_operator",
            AppError::BadField(_) => "bad_field",
            AppError::BadRequest(_) => "bad_request",
            AppError::AmbiguousMatch(_) => "ambiguous_match",
            AppError::Db(_) => "database_error",
            AppError::Http { status, .. } => match *status {
                StatusCode::NOT_FOUND => "not_found",
                StatusCode::METHOD_NOT_ALLOWED => "method_not_allowed",
                StatusCode::PAYLOAD_TOO_LARGE => "payload_too_large",
                StatusCode::UNSUPPORTED_MEDIA_TYPE => "unsupported_media_type",
                s if s.is_server_error() => "internal_error",
                _ => "bad_request",
            },
        }
    }

    /// Wrap a bare status and message from the HTTP layer. An empty message uses the reason phrase.
    pub fn http(status: StatusCode, message: impl Into<String>) -> Self {
        let message = message.into();
        let message = if message.is_empty() {
            status.canonical_reason().unwrap_or("request failed").to_string()
        } else {
            message
        };
        AppError::Http { status, message }
    }

    pub(crate) fn bad_value(column: &str, message: impl Into<String>) -> Self {
        AppError::BadValue {
            column: column.to_string(),
            message: message.into(),
        }
    }
}

impl From<BytesRejection> for AppError {
    fn from(rejection: BytesRejection) -> Self {
        AppError::http(rejection.status(), rejection.body_text())
    }
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message: self.to_string(),
            },
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_errors_map_to_400() {
        let errors = [
            AppError::bad_value("i", "not an integer"),
            AppError::BadOperator("ne".into()),
            AppError::BadField("nope".into()),
            AppError::BadRequest("body must be a JSON object".into()),
            AppError::AmbiguousMatch(2),
        ];
        for err in errors {
            assert_eq!(err.status_code(), StatusCode::BAD_REQUEST, "{}", err);
        }
    }

    #[test]
    fn not_found_maps_to_404() {
        let err = AppError::NotFound("t".into());
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.error_code(), "not_found");
    }

    #[test]
    fn storage_and_config_faults_map_to_500() {
        let err = AppError::Db(sqlx::Error::PoolClosed);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        let err = AppError::from(ConfigError::Patch("bad yaml".into()));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.error_code(), "config_error");
    }

    #[test]
    fn http_errors_keep_their_status() {
        let err = AppError::http(StatusCode::PAYLOAD_TOO_LARGE, "length limit exceeded");
        assert_eq!(err.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(err.error_code(), "payload_too_large");
        assert_eq!(err.to_string(), "length limit exceeded");

        let err = AppError::http(StatusCode::METHOD_NOT_ALLOWED, "");
        assert_eq!(err.error_code(), "method_not_allowed");
        assert_eq!(err.to_string(), "Method Not Allowed");

        assert_eq!(AppError::http(StatusCode::UNPROCESSABLE_ENTITY, "x").error_code(), "bad_request");
        assert_eq!(AppError::http(StatusCode::BAD_GATEWAY, "x").error_code(), "internal_error");
    }

    #[test]
    fn ambiguous_match_message_names_the_count() {
        assert_eq!(
            AppError::AmbiguousMatch(0).to_string(),
            "expected exactly one matching row, found 0"
        );
    }
}
