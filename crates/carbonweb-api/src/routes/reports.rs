//! Report API endpoints
//!
//! Endpoints:
//! - api_survey_report: Row data for one conducted survey (JSON)
//! - api_template_report: Aggregates across a template's surveys (JSON)
//!
//! Amounts in report payloads are pre-formatted to the configured decimal
//! places; clients render them as-is (the PDF export in the reference UI
//! consumes exactly this data).

use crate::error::ApiError;
use crate::AppState;

use super::parse_id;

/// Get report data for a single survey (JSON API)
pub async fn api_survey_report(
    state: axum::extract::State<AppState>,
    path: axum::extract::Path<String>,
) -> Result<String, ApiError> {
    let id = parse_id(&path.0, "survey")?;
    let registry = state.registry.read().await;
    let report = registry.survey_report(id)?;
    Ok(serde_json::to_string(&report).unwrap_or_default())
}

/// Get aggregate report data for a template (JSON API)
pub async fn api_template_report(
    state: axum::extract::State<AppState>,
    path: axum::extract::Path<String>,
) -> Result<String, ApiError> {
    let id = parse_id(&path.0, "template")?;
    let registry = state.registry.read().await;
    let report = registry.template_report(id)?;
    Ok(serde_json::to_string(&report).unwrap_or_default())
}
