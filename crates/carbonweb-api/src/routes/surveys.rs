//! Survey API endpoints
//!
//! Endpoints:
//! - api_survey_create: Record a completed collection session (JSON)
//! - api_survey_detail: Get a single survey (JSON)
//! - api_survey_delete: Delete a survey (JSON)
//!
//! Surveys are immutable after save; there is no update endpoint.

use crate::error::ApiError;
use crate::AppState;
use axum::http::StatusCode;
use carbonweb_core::NewSurvey;
use chrono::Utc;

use super::parse_id;

/// Record a completed survey (JSON API)
///
/// The body carries raw `{question_id, value}` answers; carbon equivalents
/// and the persisted total are derived here from the template coefficients.
pub async fn api_survey_create(
    state: axum::extract::State<AppState>,
    body: axum::Json<NewSurvey>,
) -> Result<(StatusCode, String), ApiError> {
    let registry = state.registry.write().await;
    let survey = registry.create_survey(body.0, Utc::now()).await?;
    Ok((StatusCode::CREATED, serde_json::to_string(&survey).unwrap_or_default()))
}

/// Get single survey detail (JSON API)
pub async fn api_survey_detail(
    state: axum::extract::State<AppState>,
    path: axum::extract::Path<String>,
) -> Result<String, ApiError> {
    let id = parse_id(&path.0, "survey")?;
    let registry = state.registry.read().await;

    match registry.survey(id) {
        Some(survey) => Ok(serde_json::to_string(&survey).unwrap_or_default()),
        None => Err(ApiError::NotFound { resource: format!("survey {}", id) }),
    }
}

/// Delete a survey (JSON API)
pub async fn api_survey_delete(
    state: axum::extract::State<AppState>,
    path: axum::extract::Path<String>,
) -> Result<String, ApiError> {
    let id = parse_id(&path.0, "survey")?;
    let registry = state.registry.write().await;

    if registry.delete_survey(id).await? {
        Ok(r#"{"message": "Survey deleted successfully"}"#.to_string())
    } else {
        Err(ApiError::NotFound { resource: format!("survey {}", id) })
    }
}
