//! Typed errors and HTTP mapping.

use crate::response::{json_response, Envelope};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing reference: {kind} '{id}'")]
    MissingReference { kind: &'static str, id: String },
    #[error("invalid primary key: entity {entity} column {column}")]
    InvalidPrimaryKey { entity: String, column: String },
    #[error("duplicate entity name: {0}")]
    DuplicateEntity(String),
    #[error("entity name collides with a utility route: {0}")]
    ReservedEntityName(String),
    #[error("config load: {0}")]
    Load(String),
    #[error("validation: {0}")]
    Validation(String),
}

/// Request-time failures. Every variant except `MethodNotAllowed` renders as the envelope.
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("route not found")]
    RouteNotFound,
    #[error("not found: {0}")]
    ResourceNotFound(String),
    #[error("method not allowed")]
    MethodNotAllowed,
    #[error("no results found")]
    EmptyResult,
    #[error("{0}")]
    BadRequest(String),
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::RouteNotFound | AppError::ResourceNotFound(_) => StatusCode::NOT_FOUND,
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::EmptyResult | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Config(_) | AppError::Db(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if let AppError::MethodNotAllowed = self {
            return status.into_response();
        }
        // Internal detail stays in the log; clients see a generic message.
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "request failed");
            "server error".to_string()
        } else {
            self.to_string()
        };
        json_response(status, &Envelope::<serde_json::Value>::failure(message))
    }
}
