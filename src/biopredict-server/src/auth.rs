// Copyright (c), BioPredict Contributors
// SPDX-License-Identifier: Apache-2.0

//! Bearer token resolution.

use crate::{with_store, AppState, ServiceError};
use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use std::sync::Arc;
use tracing::warn;

/// User id resolved from a valid bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser(pub String);

/// Token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Resolve the caller for best-effort work. Store failures are logged and the
/// caller is treated as anonymous.
pub async fn resolve_user(state: &Arc<AppState>, headers: &HeaderMap) -> Option<String> {
    let token = bearer_token(headers)?.to_string();
    match with_store(state, move |store| store.resolve_token(&token)).await {
        Ok(Ok(user)) => user,
        Ok(Err(e)) => {
            warn!("Token lookup failed: {e}");
            None
        }
        Err(e) => {
            warn!("Token lookup failed: {e}");
            None
        }
    }
}

/// Middleware for routes that need a user. Injects [`AuthenticatedUser`].
/// A store failure is a 500, never a 401.
pub async fn require_user(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServiceError> {
    let token = bearer_token(request.headers())
        .ok_or_else(|| ServiceError::AuthError("No token provided".to_string()))?
        .to_string();
    let user = with_store(&state, move |store| store.resolve_token(&token))
        .await?
        .map_err(|e| ServiceError::InternalError(format!("Token lookup failed: {e}")))?
        .ok_or_else(|| ServiceError::AuthError("Invalid token".to_string()))?;
    request.extensions_mut().insert(AuthenticatedUser(user));
    Ok(next.run(request).await)
}
