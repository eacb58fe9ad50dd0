// Copyright (c), BioPredict Contributors
// SPDX-License-Identifier: Apache-2.0

use super::*;
use crate::auth::{require_user, AuthenticatedUser};
use crate::config::MAX_HISTORY_LIMIT;
use crate::store::StoredRecord;
use axum::extract::rejection::QueryRejection;
use axum::extract::Query;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use axum::routing::{get, post};
use axum::{middleware, Extension, Router};
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// Public API: predictions, history, catalog and health.
pub fn api_router(state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .route("/api/predictions/history", get(prediction_history))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_user));

    Router::new()
        .route("/api/predict/blood", post(predict_blood))
        .route("/api/predict/saliva", post(predict_saliva))
        .route("/api/predict/urine", post(predict_urine))
        .route("/api/predict/csf", post(predict_csf))
        .route("/api/diseases", get(disease_catalog))
        .route("/health", get(health))
        .merge(protected)
        .layer(cors_layer(&state.config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION]);
    if config.allows_any_origin() {
        return layer.allow_origin(Any);
    }
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {origin:?}");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

/// The caller's stored predictions, newest first.
pub async fn prediction_history(
    State(state): State<Arc<AppState>>,
    Extension(AuthenticatedUser(user_id)): Extension<AuthenticatedUser>,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> Result<Json<Vec<StoredRecord>>, ServiceError> {
    let Query(query) = query.map_err(|e| {
        ServiceError::ValidationError(format!("Invalid query string: {}", e.body_text()))
    })?;
    let limit = query
        .limit
        .unwrap_or(state.config.history_limit)
        .clamp(1, MAX_HISTORY_LIMIT);
    let owner = user_id.clone();
    let records = with_store(&state, move |store| store.history(&owner, limit))
        .await?
        .map_err(|e| ServiceError::InternalError(format!("Failed to load history: {e}")))?;
    info!("Returning {} history records for {user_id}", records.len());
    Ok(Json(records))
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BiomarkerInfo {
    pub key: String,
    pub name: String,
    pub unit: String,
    pub normal_range: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiseaseInfo {
    pub key: DiseaseKey,
    pub response_key: String,
    pub name: String,
    pub fluid_type: FluidType,
    pub description: String,
    pub key_biomarkers: Vec<BiomarkerInfo>,
}

/// Every disease model with the biomarkers it reads.
pub async fn disease_catalog() -> Json<Vec<DiseaseInfo>> {
    let catalog = all_models()
        .iter()
        .map(|model| DiseaseInfo {
            key: model.key,
            response_key: model.response_key.to_string(),
            name: model.name.to_string(),
            fluid_type: model.fluid,
            description: model.description.to_string(),
            key_biomarkers: model
                .rules
                .iter()
                .map(|rule| BiomarkerInfo {
                    key: rule.key.to_string(),
                    name: rule.label.to_string(),
                    unit: rule.unit.to_string(),
                    normal_range: rule.normal_range(),
                })
                .collect(),
        })
        .collect();
    Json(catalog)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Response for the ping endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct PingResponse {
    pub message: String,
}

/// Simple ping handler for host-only access
pub async fn ping() -> Json<PingResponse> {
    info!("Admin ping received");
    Json(PingResponse {
        message: "pong".to_string(),
    })
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRequest {
    pub user_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub user_id: String,
    pub token: String,
}

/// Issue a bearer token for a user. Only reachable on the admin listener.
pub async fn issue_token(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TokenRequest>,
) -> Result<Json<TokenResponse>, ServiceError> {
    let user_id = request.user_id.trim();
    if user_id.is_empty() {
        return Err(ServiceError::ValidationError(
            "userId must not be empty".to_string(),
        ));
    }
    let user_id = user_id.to_string();
    let owner = user_id.clone();
    let token = with_store(&state, move |store| store.issue_token(&owner))
        .await?
        .map_err(|e| ServiceError::InternalError(format!("Failed to issue token: {e}")))?;
    info!("Issued API token for {user_id}");
    Ok(Json(TokenResponse {
        user_id,
        token,
    }))
}

pub fn admin_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/ping", get(ping))
        .route("/admin/tokens", post(issue_token))
        .with_state(state)
}

/// Bind the admin router on `config.admin_addr` and serve it in the background.
pub async fn spawn_admin_server(state: Arc<AppState>) -> Result<(), ServiceError> {
    let addr = state.config.admin_addr;
    if !addr.ip().is_loopback() {
        warn!("Admin server bound to non-loopback address {addr}");
    }
    let admin_app = admin_router(state);

    let admin_listener = TcpListener::bind(addr)
        .await
        .map_err(|e| ServiceError::InternalError(format!("Failed to bind admin server: {e}")))?;

    match admin_listener.local_addr() {
        Ok(local) => info!("Host-only admin server listening on {local}"),
        Err(e) => warn!("Admin server address unavailable: {e}"),
    }

    tokio::spawn(async move {
        if let Err(e) = axum::serve(admin_listener, admin_app.into_make_service()).await {
            error!("Admin server failed: {e}");
        }
    });

    Ok(())
}
