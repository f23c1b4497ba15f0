//! Report and response structures for the API
//!
//! Carbon amounts in reports are formatted strings (display rounding only);
//! the stored totals stay unrounded f64.

use serde::{Deserialize, Serialize};

use super::models::{Survey, SurveyTemplate, User};

/// Registry summary for the /api/summary endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct RegistrySummary {
    pub total_users: usize,
    pub total_templates: usize,
    pub total_surveys: usize,
}

/// Per-user activity counts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserStats {
    pub templates_count: usize,
    pub surveys_count: usize,
}

/// Templates list response
#[derive(Debug, Serialize, Deserialize)]
pub struct TemplatesResponse {
    pub templates: Vec<SurveyTemplate>,
    pub total_count: usize,
}

/// Surveys list response
#[derive(Debug, Serialize, Deserialize)]
pub struct SurveysResponse {
    pub surveys: Vec<Survey>,
    pub total_count: usize,
}

/// User detail response
#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub user: User,
    pub stats: UserStats,
}

/// One row of a survey report: a question joined with its response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurveyReportRow {
    pub question_id: String,
    pub question: String,
    pub unit: String,
    pub value: f64,
    /// Formatted carbon equivalent (display.decimal_places)
    pub carbon_equivalent: String,
}

/// Report data for a single conducted survey
#[derive(Debug, Serialize, Deserialize)]
pub struct SurveyReport {
    pub survey_id: u64,
    pub template_id: u64,
    pub template_name: String,
    pub template_code: String,
    pub household_id: String,
    pub household_address: String,
    pub occupants: u32,
    pub area: Option<f64>,
    pub conducted_by: u64,
    pub conducted_at: String,
    pub rows: Vec<SurveyReportRow>,
    /// Formatted total (display.decimal_places)
    pub total_carbon_footprint: String,
    pub unit_label: String,
}

/// Per-question aggregate across all surveys of a template
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionAggregate {
    pub question_id: String,
    pub question: String,
    pub unit: String,
    pub response_count: usize,
    pub average_value: String,
    pub total_equivalent: String,
}

/// Aggregate report across all surveys conducted against a template
#[derive(Debug, Serialize, Deserialize)]
pub struct TemplateReport {
    pub template_id: u64,
    pub name: String,
    pub code: String,
    pub survey_count: usize,
    pub total_footprint: String,
    pub average_footprint: String,
    pub questions: Vec<QuestionAggregate>,
    pub unit_label: String,
}
