//! User API endpoints
//!
//! Endpoints:
//! - api_user_create: Register a user (JSON)
//! - api_user_detail: Get a single user (JSON)
//! - api_user_stats: Per-user template/survey counts (JSON)
//! - api_user_templates: Templates designed by a user (JSON)
//! - api_user_surveys: Surveys conducted by a user (JSON)

use crate::error::ApiError;
use crate::AppState;
use axum::http::StatusCode;
use carbonweb_core::{NewUser, SurveysResponse, TemplatesResponse, UserResponse};
use chrono::Utc;

use super::parse_id;

/// Register a user (JSON API)
pub async fn api_user_create(
    state: axum::extract::State<AppState>,
    body: axum::Json<NewUser>,
) -> Result<(StatusCode, String), ApiError> {
    let registry = state.registry.write().await;
    let user = registry.create_user(body.0, Utc::now()).await?;
    Ok((StatusCode::CREATED, serde_json::to_string(&user).unwrap_or_default()))
}

/// Get single user detail (JSON API)
pub async fn api_user_detail(
    state: axum::extract::State<AppState>,
    path: axum::extract::Path<String>,
) -> Result<String, ApiError> {
    let id = parse_id(&path.0, "user")?;
    let registry = state.registry.read().await;

    match registry.user(id) {
        Some(user) => {
            let stats = registry.user_stats(user.id)?;
            let response = UserResponse { user, stats };
            Ok(serde_json::to_string(&response).unwrap_or_default())
        }
        None => Err(ApiError::NotFound { resource: format!("user {}", id) }),
    }
}

/// Get per-user activity counts (JSON API)
pub async fn api_user_stats(
    state: axum::extract::State<AppState>,
    path: axum::extract::Path<String>,
) -> Result<String, ApiError> {
    let id = parse_id(&path.0, "user")?;
    let registry = state.registry.read().await;
    let stats = registry.user_stats(id)?;
    Ok(serde_json::to_string(&stats).unwrap_or_default())
}

/// Get templates designed by a user, newest first (JSON API)
pub async fn api_user_templates(
    state: axum::extract::State<AppState>,
    path: axum::extract::Path<String>,
) -> Result<String, ApiError> {
    let id = parse_id(&path.0, "user")?;
    let registry = state.registry.read().await;

    let templates = registry.templates_by_user(id);
    let response = TemplatesResponse { total_count: templates.len(), templates };
    Ok(serde_json::to_string(&response).unwrap_or_default())
}

/// Get surveys conducted by a user, newest first (JSON API)
pub async fn api_user_surveys(
    state: axum::extract::State<AppState>,
    path: axum::extract::Path<String>,
) -> Result<String, ApiError> {
    let id = parse_id(&path.0, "user")?;
    let registry = state.registry.read().await;

    let surveys = registry.surveys_by_user(id);
    let response = SurveysResponse { total_count: surveys.len(), surveys };
    Ok(serde_json::to_string(&response).unwrap_or_default())
}
