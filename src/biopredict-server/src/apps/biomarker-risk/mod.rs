// Copyright (c), BioPredict Contributors
// SPDX-License-Identifier: Apache-2.0

pub mod endpoints;
pub mod guidance;
pub mod models;
pub mod thresholds;
pub mod types;

pub use endpoints::{admin_router, api_router, spawn_admin_server};
pub use guidance::RiskLevel;
pub use models::{all_models, DiseaseKey, DiseaseModel, ScoringError};
pub use types::*;

use crate::auth::resolve_user;
use crate::config::ServerConfig;
use crate::AppState;
use crate::ServiceError;
use crate::with_store;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use models::{
    ALZHEIMER, BLOOD_DIABETES, BRAIN_TUMOR, CARDIOVASCULAR, KIDNEY, METABOLIC, ORAL_CANCER,
    URINE_DIABETES,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Run one model, turning a scoring defect into a 500.
fn score(
    state: &AppState,
    model: &DiseaseModel,
    panel: &dyn BiomarkerPanel,
) -> Result<DiseasePrediction, ServiceError> {
    model.predict(panel).map_err(|e| {
        error!("Prediction failed for {}: {e}", model.name);
        ServiceError::PredictionError {
            details: state.config.expose_error_details.then(|| e.to_string()),
        }
    })
}

/// Store the request and its result when the caller is authenticated. A
/// failure here never fails the request.
async fn persist_best_effort<B, P>(
    state: &Arc<AppState>,
    headers: &HeaderMap,
    fluid: FluidType,
    biomarkers: &B,
    predictions: &P,
) where
    B: Serialize,
    P: Serialize,
{
    let Some(user_id) = resolve_user(state, headers).await else {
        return;
    };
    let (biomarkers, predictions) =
        match (serde_json::to_value(biomarkers), serde_json::to_value(predictions)) {
            (Ok(b), Ok(p)) => (b, p),
            (Err(e), _) | (_, Err(e)) => {
                warn!("Failed to encode {fluid} prediction for {user_id}: {e}");
                return;
            }
        };

    let owner = user_id.clone();
    let stored = with_store(state, move |store| {
        store.insert_record(&owner, fluid, &biomarkers, &predictions)
    })
    .await;
    match stored {
        Ok(Ok(record)) => info!("Stored {fluid} prediction {} for {user_id}", record.id),
        Ok(Err(e)) => warn!("Failed to store {fluid} prediction for {user_id}: {e}"),
        Err(e) => warn!("Failed to store {fluid} prediction for {user_id}: {e}"),
    }
}

pub async fn predict_blood(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<BloodPredictions>, ServiceError> {
    let panel: BloodPanel = parse_payload(&body)?;
    let with_metabolic = panel
        .metabolic_panel_supplied()
        .map_err(ServiceError::ValidationError)?;

    let metabolic = if with_metabolic {
        Some(score(&state, &METABOLIC, &panel)?)
    } else {
        None
    };
    let predictions = BloodPredictions {
        diabetes: score(&state, &BLOOD_DIABETES, &panel)?,
        cardiovascular: score(&state, &CARDIOVASCULAR, &panel)?,
        metabolic,
    };

    persist_best_effort(&state, &headers, FluidType::Blood, &panel, &predictions).await;
    Ok(Json(predictions))
}

pub async fn predict_saliva(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<SalivaPredictions>, ServiceError> {
    let panel: SalivaPanel = parse_payload(&body)?;
    let predictions = SalivaPredictions {
        oral_cancer: score(&state, &ORAL_CANCER, &panel)?,
    };

    persist_best_effort(&state, &headers, FluidType::Saliva, &panel, &predictions).await;
    Ok(Json(predictions))
}

pub async fn predict_urine(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<UrinePredictions>, ServiceError> {
    let panel: UrinePanel = parse_payload(&body)?;
    let predictions = UrinePredictions {
        kidney: score(&state, &KIDNEY, &panel)?,
        diabetes: score(&state, &URINE_DIABETES, &panel)?,
    };

    persist_best_effort(&state, &headers, FluidType::Urine, &panel, &predictions).await;
    Ok(Json(predictions))
}

pub async fn predict_csf(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<CsfPredictions>, ServiceError> {
    let panel: CsfPanel = parse_payload(&body)?;
    let predictions = CsfPredictions {
        alzheimer: score(&state, &ALZHEIMER, &panel)?,
        brain_tumor: score(&state, &BRAIN_TUMOR, &panel)?,
    };

    persist_best_effort(&state, &headers, FluidType::Csf, &panel, &predictions).await;
    Ok(Json(predictions))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::store::RecordStore;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn test_state() -> Arc<AppState> {
        Arc::new(AppState {
            config: ServerConfig::default(),
            store: RecordStore::open_in_memory().unwrap(),
        })
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), 1 << 20).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    fn post(uri: &str, body: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json");
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn get(uri: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn empty_saliva_body_is_minimal() {
        let (status, json) = send(
            api_router(test_state()),
            post("/api/predict/saliva", "", None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let oral = &json["oralCancer"];
        assert_eq!(oral["riskValue"], 0);
        assert_eq!(oral["riskLevel"], "Minimal");
        assert_eq!(oral["factors"], json!([]));
        assert_eq!(oral["potentialDiseases"], json!([]));
        assert!(oral["recommendation"].as_str().unwrap().len() > 10);
    }

    #[tokio::test]
    async fn blood_worked_example() {
        let body = json!({
            "glucose": 115, "hba1c": 5.9, "totalCholesterol": 215, "hdl": 52, "crp": 1.2
        })
        .to_string();
        let (status, json) = send(
            api_router(test_state()),
            post("/api/predict/blood", &body, None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["diabetes"]["riskValue"], 42);
        assert_eq!(json["diabetes"]["riskLevel"], "Moderate");
        assert_eq!(json["cardiovascular"]["riskValue"], 24);
        assert_eq!(json["cardiovascular"]["riskLevel"], "Low");
        assert_eq!(json["diabetes"]["factors"][0]["type"], "warning");
        assert!(json.get("metabolic").is_none());
    }

    #[tokio::test]
    async fn full_metabolic_panel_adds_metabolic_prediction() {
        let body = json!({
            "BMI": 32, "Chol": 5.5, "TG": 2.2, "HDL": 0.9, "LDL": 3.6, "Cr": 110, "BUN": 7.5
        })
        .to_string();
        let (status, json) = send(
            api_router(test_state()),
            post("/api/predict/blood", &body, None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        // 25 + 12 + 12 + 15 + 10 + 10 + 10, plus the compounding bonus
        assert_eq!(json["metabolic"]["riskValue"], 100);
        assert_eq!(json["metabolic"]["riskLevel"], "Very High");
        assert_eq!(json["metabolic"]["factors"].as_array().unwrap().len(), 7);
    }

    #[tokio::test]
    async fn partial_metabolic_panel_is_rejected() {
        let (status, json) = send(
            api_router(test_state()),
            post("/api/predict/blood", r#"{"BMI": 27, "TG": 1.5}"#, None),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let error = json["error"].as_str().unwrap();
        assert!(error.contains("Chol"));
        assert!(error.contains("BUN"));
    }

    #[tokio::test]
    async fn implausible_metabolic_panel_is_rejected() {
        let body = r#"{"BMI": 500, "Chol": 99, "TG": 0, "HDL": 0, "LDL": 0, "Cr": 0, "BUN": 0}"#;
        let state = test_state();
        let token = state.store.issue_token("alice").unwrap();
        let (status, json) = send(
            api_router(state.clone()),
            post("/api/predict/blood", body, Some(token.as_str())),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "BMI must be between 10 and 50, got 500");
        assert!(state.store.history("alice", 10).unwrap().is_empty());
    }

    #[tokio::test]
    async fn invalid_payloads_are_400() {
        for body in [r#"[1]"#, r#"{"abeta42": "low"}"#, r#"{"abeta42": -1}"#, "{"] {
            let (status, json) = send(
                api_router(test_state()),
                post("/api/predict/csf", body, None),
            )
            .await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "body {body}");
            assert!(json["error"].is_string());
        }
    }

    #[tokio::test]
    async fn csf_worked_example() {
        let body = r#"{"abeta42": 420, "totalTau": 580, "pTau": 68}"#;
        let (status, json) = send(
            api_router(test_state()),
            post("/api/predict/csf", body, None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["alzheimer"]["riskLevel"], "High");
        let factors = json["alzheimer"]["factors"].as_array().unwrap();
        assert_eq!(factors.len(), 3);
        assert!(factors.iter().all(|f| f["type"] == "negative"));
        assert_eq!(json["brainTumor"]["riskValue"], 0);
    }

    #[tokio::test]
    async fn urine_returns_both_models() {
        let body = r#"{"albumin": 45, "urineGlucose": 0, "specificGravity": 1.02}"#;
        let (status, json) = send(
            api_router(test_state()),
            post("/api/predict/urine", body, None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["kidney"]["riskValue"], 30);
        assert_eq!(json["kidney"]["riskLevel"], "Low");
        assert_eq!(json["diabetes"]["riskValue"], 0);
        assert_eq!(json["diabetes"]["factors"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn history_requires_a_valid_token() {
        let state = test_state();
        let (status, json) = send(
            api_router(state.clone()),
            get("/api/predictions/history", None),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["error"], "No token provided");

        let (status, _) = send(
            api_router(state),
            get("/api/predictions/history", Some("bogus")),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn bad_history_limit_is_a_json_400() {
        let state = test_state();
        let token = state.store.issue_token("alice").unwrap();
        let (status, json) = send(
            api_router(state),
            get("/api/predictions/history?limit=-3", Some(token.as_str())),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"]
            .as_str()
            .unwrap()
            .starts_with("Invalid query string"));
    }

    #[tokio::test]
    async fn token_store_outage_on_history_is_500() {
        let state = test_state();
        let token = state.store.issue_token("alice").unwrap();
        state.store.drop_tokens_table().unwrap();
        let (status, json) = send(
            api_router(state),
            get("/api/predictions/history", Some(token.as_str())),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"], "Internal server error");
    }

    #[tokio::test]
    async fn authenticated_predictions_show_up_in_history() {
        let state = test_state();
        let alice = state.store.issue_token("alice").unwrap();
        let bob = state.store.issue_token("bob").unwrap();

        for (uri, body, token) in [
            ("/api/predict/saliva", r#"{"il6": 7}"#, Some(alice.as_str())),
            ("/api/predict/csf", r#"{"nfl": 1200}"#, Some(alice.as_str())),
            ("/api/predict/blood", r#"{"glucose": 90}"#, Some(bob.as_str())),
            ("/api/predict/urine", r#"{"acr": 10}"#, None),
        ] {
            let (status, _) = send(api_router(state.clone()), post(uri, body, token)).await;
            assert_eq!(status, StatusCode::OK);
        }

        let (status, json) = send(
            api_router(state.clone()),
            get("/api/predictions/history", Some(alice.as_str())),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let records = json.as_array().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["fluidType"], "csf");
        assert_eq!(records[0]["userId"], "alice");
        assert_eq!(records[0]["biomarkers"], json!({ "nfl": 1200.0 }));
        assert_eq!(records[0]["predictions"]["alzheimer"]["riskValue"], 15);
        assert_eq!(records[1]["fluidType"], "saliva");

        let (_, json) = send(
            api_router(state),
            get("/api/predictions/history?limit=1", Some(alice.as_str())),
        )
        .await;
        assert_eq!(json.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unknown_token_on_predict_skips_persistence() {
        let state = test_state();
        let (status, _) = send(
            api_router(state.clone()),
            post("/api/predict/saliva", "{}", Some("bogus")),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(state.store.history("bogus", 10).unwrap().is_empty());
    }

    #[tokio::test]
    async fn storage_failure_still_returns_predictions() {
        let state = test_state();
        let token = state.store.issue_token("alice").unwrap();
        state.store.drop_records_table().unwrap();

        let (status, json) = send(
            api_router(state),
            post("/api/predict/csf", r#"{"abeta42": 420}"#, Some(token.as_str())),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["alzheimer"]["riskValue"], 28);
    }

    #[test]
    fn scoring_failure_hides_details_by_default() {
        let state = test_state();
        let err = score(&state, &ALZHEIMER, &BloodPanel::default()).unwrap_err();
        assert!(matches!(err, ServiceError::PredictionError { details: None }));

        let mut config = ServerConfig::default();
        config.expose_error_details = true;
        let state = AppState {
            config,
            store: RecordStore::open_in_memory().unwrap(),
        };
        match score(&state, &ALZHEIMER, &BloodPanel::default()).unwrap_err() {
            ServiceError::PredictionError { details: Some(d) } => {
                assert!(d.contains("Alzheimer's Disease"))
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn catalog_lists_every_model() {
        let (status, json) = send(api_router(test_state()), get("/api/diseases", None)).await;
        assert_eq!(status, StatusCode::OK);
        let models = json.as_array().unwrap();
        assert_eq!(models.len(), 8);
        assert_eq!(models[0]["key"], "bloodDiabetes");
        assert_eq!(models[0]["fluidType"], "blood");
        assert_eq!(models[0]["keyBiomarkers"][0]["normalRange"], "< 100 mg/dL");
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let (status, json) = send(api_router(test_state()), get("/health", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn admin_issues_working_tokens() {
        let state = test_state();
        let (status, json) = send(admin_router(state.clone()), get("/ping", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["message"], "pong");

        let (status, json) = send(
            admin_router(state.clone()),
            post("/admin/tokens", r#"{"userId": "carol"}"#, None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["userId"], "carol");
        let token = json["token"].as_str().unwrap();
        assert_eq!(
            state.store.resolve_token(token).unwrap().as_deref(),
            Some("carol")
        );

        let (status, _) = send(
            admin_router(state),
            post("/admin/tokens", r#"{"userId": "  "}"#, None),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
