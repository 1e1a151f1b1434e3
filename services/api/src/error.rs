//! services/api/src/error.rs
//!
//! Defines the primary error type for the entire API service, and its
//! mapping onto HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::config::ConfigError;
use training_plan_core::orchestrator::EngineError;
use training_plan_core::ports::PortError;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents a typed failure from the plan engine.
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// Represents an error related to the WebSocket connection.
    #[error("WebSocket Error: {0}")]
    Websocket(#[from] axum::Error),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

impl ApiError {
    /// HTTP status for this error. Recoverable engine signals keep their
    /// distinct codes so the client can react (relax filters, stop
    /// offering a destructive regenerate).
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Engine(EngineError::NoCandidateExercises) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Engine(EngineError::PlanHasProgress) => StatusCode::CONFLICT,
            Self::Engine(EngineError::NotFound(_)) | Self::Port(PortError::NotFound(_)) => {
                StatusCode::NOT_FOUND
            }
            Self::Engine(EngineError::Forbidden) | Self::Port(PortError::Forbidden) => {
                StatusCode::FORBIDDEN
            }
            Self::Engine(EngineError::Transient(_))
            | Self::Port(PortError::Transient(_))
            | Self::Database(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
