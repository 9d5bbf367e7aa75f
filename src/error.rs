use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use sqlx::Error as SqlxError;
use std::collections::BTreeMap;
use thiserror::Error as ThisError;

/// Field name -> list of messages, as rendered back to the settings form.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(Debug, ThisError)]
pub enum SyncError {
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("HTTP request error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(#[from] Box<figment::Error>),

    #[error("Database error: {0}")]
    DatabaseError(#[from] SqlxError),

    #[error("Dataset not found: {0}")]
    DatasetNotFound(String),

    #[error("Organization not found: {0}")]
    OrganizationNotFound(String),

    #[error("Host catalog error with status: {0}")]
    HostStatus(StatusCode),

    #[error("Validation failed: {0:?}")]
    Validation(FieldErrors),

    #[error("Unknown option: {0}")]
    UnknownOption(String),

    #[error("Invalid sync state: {0}")]
    InvalidState(String),

    #[error("Task queue closed")]
    QueueClosed,
}

impl From<figment::Error> for SyncError {
    fn from(e: figment::Error) -> Self {
        SyncError::Config(Box::new(e))
    }
}

impl SyncError {
    /// Single-field validation error.
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.into(), vec![message.into()]);
        SyncError::Validation(errors)
    }
}

impl IntoResponse for SyncError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_body) = match self {
            SyncError::Validation(errors) => {
                let status = StatusCode::BAD_REQUEST;
                let body = ApiErrorBody {
                    code: "VALIDATION_ERROR".to_string(),
                    message: "Some fields are missing or invalid.".to_string(),
                    fields: Some(errors),
                };
                (status, body)
            }
            SyncError::UnknownOption(key) => {
                let status = StatusCode::BAD_REQUEST;
                let body = ApiErrorBody {
                    code: "UNKNOWN_OPTION".to_string(),
                    message: format!("Unrecognized option `{key}`."),
                    fields: None,
                };
                (status, body)
            }
            SyncError::InvalidState(state) => {
                let status = StatusCode::NOT_FOUND;
                let body = ApiErrorBody {
                    code: "NOT_FOUND".to_string(),
                    message: format!("Unknown sync state `{state}`."),
                    fields: None,
                };
                (status, body)
            }
            SyncError::DatasetNotFound(id) => {
                let status = StatusCode::NOT_FOUND;
                let body = ApiErrorBody {
                    code: "NOT_FOUND".to_string(),
                    message: format!("Dataset `{id}` not found."),
                    fields: None,
                };
                (status, body)
            }
            SyncError::OrganizationNotFound(id) => {
                let status = StatusCode::NOT_FOUND;
                let body = ApiErrorBody {
                    code: "NOT_FOUND".to_string(),
                    message: format!("Organization `{id}` not found."),
                    fields: None,
                };
                (status, body)
            }
            SyncError::QueueClosed => {
                let status = StatusCode::SERVICE_UNAVAILABLE;
                let body = ApiErrorBody {
                    code: "QUEUE_UNAVAILABLE".to_string(),
                    message: "Sync worker is not accepting tasks.".to_string(),
                    fields: None,
                };
                (status, body)
            }
            SyncError::Reqwest(_) | SyncError::UrlParse(_) | SyncError::HostStatus(_) => {
                let status = StatusCode::BAD_GATEWAY;
                let body = ApiErrorBody {
                    code: "BAD_GATEWAY".to_string(),
                    message: "Upstream service is unavailable.".to_string(),
                    fields: None,
                };
                (status, body)
            }
            SyncError::Json(_)
            | SyncError::Io(_)
            | SyncError::Config(_)
            | SyncError::DatabaseError(_) => {
                let status = StatusCode::INTERNAL_SERVER_ERROR;
                let body = ApiErrorBody {
                    code: "INTERNAL_ERROR".to_string(),
                    message: "An internal server error occurred.".to_string(),
                    fields: None,
                };
                (status, body)
            }
        };
        (status, Json(ApiErrorResponse { error: error_body })).into_response()
    }
}

/// Standardized API error response body
#[derive(Serialize)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<FieldErrors>,
}

#[derive(Serialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}
