// Copyright (c), BioPredict Contributors
// SPDX-License-Identifier: Apache-2.0

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use serde_json::json;
use std::fmt;
use std::sync::Arc;
use tracing::error;

pub mod apps {
    #[path = "biomarker-risk/mod.rs"]
    pub mod biomarker_risk;
}

pub mod app {
    pub use crate::apps::biomarker_risk::*;
}

pub mod auth;
pub mod config;
pub mod store;

use config::ServerConfig;
use store::RecordStore;

/// App state shared by every handler.
pub struct AppState {
    /// Effective configuration after file and environment overrides
    pub config: ServerConfig,
    /// Prediction history and API token storage
    pub store: RecordStore,
}

/// Run a blocking store call on tokio's blocking pool.
pub async fn with_store<T, F>(state: &Arc<AppState>, f: F) -> Result<T, ServiceError>
where
    F: FnOnce(&RecordStore) -> T + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.store))
        .await
        .map_err(|e| ServiceError::InternalError(format!("Store task failed: {e}")))
}

/// Implement IntoResponse for ServiceError.
impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ServiceError::ValidationError(e) => {
                (StatusCode::BAD_REQUEST, json!({ "error": e }))
            }
            ServiceError::AuthError(e) => (StatusCode::UNAUTHORIZED, json!({ "error": e })),
            ServiceError::PredictionError { details } => {
                let mut body = json!({ "error": "Prediction failed" });
                if let Some(details) = details {
                    body["details"] = json!(details);
                }
                (StatusCode::INTERNAL_SERVER_ERROR, body)
            }
            ServiceError::InternalError(e) => {
                error!("Internal error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal server error" }),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

/// Service errors enum.
#[derive(Debug)]
pub enum ServiceError {
    /// Malformed payload or missing required fields, passed through to the client
    ValidationError(String),
    /// Missing or unknown bearer token
    AuthError(String),
    /// A scoring function failed; `details` is only set in development
    PredictionError { details: Option<String> },
    /// Anything else; the message is logged but never sent to the client
    InternalError(String),
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::ValidationError(e) => write!(f, "Validation error: {e}"),
            ServiceError::AuthError(e) => write!(f, "Authentication error: {e}"),
            ServiceError::PredictionError { details: Some(d) } => {
                write!(f, "Prediction failed: {d}")
            }
            ServiceError::PredictionError { details: None } => write!(f, "Prediction failed"),
            ServiceError::InternalError(e) => write!(f, "Internal error: {e}"),
        }
    }
}

impl std::error::Error for ServiceError {}
