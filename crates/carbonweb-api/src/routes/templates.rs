//! Survey template API endpoints
//!
//! Endpoints:
//! - api_template_create: Create a template with a generated code (JSON)
//! - api_templates: List all templates (JSON)
//! - api_template_detail: Get a single template (JSON)
//! - api_template_by_code: Look a template up by collector code (JSON)
//! - api_template_update: Partial update (JSON)
//! - api_template_delete: Delete a template (JSON)
//! - api_template_surveys: Surveys conducted against a template (JSON)

use crate::error::ApiError;
use crate::AppState;
use axum::http::StatusCode;
use axum::extract::Query;
use carbonweb_core::{NewTemplate, SurveysResponse, TemplateUpdate, TemplatesResponse};
use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashMap;

use super::parse_id;

/// Create a survey template (JSON API)
///
/// The lookup code is generated server-side; on a code collision the
/// registry retries with a fresh draw up to the configured bound.
pub async fn api_template_create(
    state: axum::extract::State<AppState>,
    body: axum::Json<NewTemplate>,
) -> Result<(StatusCode, String), ApiError> {
    let registry = state.registry.write().await;
    let mut rng = StdRng::from_os_rng();
    let template = registry.create_template(body.0, Utc::now(), &mut rng).await?;
    Ok((StatusCode::CREATED, serde_json::to_string(&template).unwrap_or_default()))
}

/// List templates with pagination (JSON API)
pub async fn api_templates(
    state: axum::extract::State<AppState>,
    params: Query<HashMap<String, String>>,
) -> String {
    let registry = state.registry.read().await;
    let limit = params
        .get("limit")
        .and_then(|s| s.parse().ok())
        .unwrap_or(state.config.pagination.records_per_page);
    let offset = params.get("offset").and_then(|s| s.parse().ok()).unwrap_or(0);

    let all = registry.all_templates();
    let total_count = all.len();
    let templates = all.into_iter().skip(offset).take(limit).collect();

    let response = TemplatesResponse { templates, total_count };
    serde_json::to_string(&response).unwrap_or_default()
}

/// Get single template detail (JSON API)
pub async fn api_template_detail(
    state: axum::extract::State<AppState>,
    path: axum::extract::Path<String>,
) -> Result<String, ApiError> {
    let id = parse_id(&path.0, "template")?;
    let registry = state.registry.read().await;

    match registry.template(id) {
        Some(template) => Ok(serde_json::to_string(&template).unwrap_or_default()),
        None => Err(ApiError::NotFound { resource: format!("survey template {}", id) }),
    }
}

/// Look a template up by its collector code (JSON API)
pub async fn api_template_by_code(
    state: axum::extract::State<AppState>,
    path: axum::extract::Path<String>,
) -> Result<String, ApiError> {
    let code = path.0;
    let registry = state.registry.read().await;

    match registry.template_by_code(&code) {
        Some(template) => Ok(serde_json::to_string(&template).unwrap_or_default()),
        None => Err(ApiError::NotFound { resource: format!("survey template with code {}", code) }),
    }
}

/// Apply a partial template update (JSON API)
pub async fn api_template_update(
    state: axum::extract::State<AppState>,
    path: axum::extract::Path<String>,
    body: axum::Json<TemplateUpdate>,
) -> Result<String, ApiError> {
    let id = parse_id(&path.0, "template")?;
    let registry = state.registry.write().await;
    let template = registry.update_template(id, body.0, Utc::now()).await?;
    Ok(serde_json::to_string(&template).unwrap_or_default())
}

/// Delete a template (JSON API)
pub async fn api_template_delete(
    state: axum::extract::State<AppState>,
    path: axum::extract::Path<String>,
) -> Result<String, ApiError> {
    let id = parse_id(&path.0, "template")?;
    let registry = state.registry.write().await;

    if registry.delete_template(id).await? {
        Ok(r#"{"message": "Survey template deleted successfully"}"#.to_string())
    } else {
        Err(ApiError::NotFound { resource: format!("survey template {}", id) })
    }
}

/// Get surveys conducted against a template, newest first (JSON API)
pub async fn api_template_surveys(
    state: axum::extract::State<AppState>,
    path: axum::extract::Path<String>,
) -> Result<String, ApiError> {
    let id = parse_id(&path.0, "template")?;
    let registry = state.registry.read().await;

    let surveys = registry.surveys_by_template(id);
    let response = SurveysResponse { total_count: surveys.len(), surveys };
    Ok(serde_json::to_string(&response).unwrap_or_default())
}
