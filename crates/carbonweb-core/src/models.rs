//! Core data models for the survey registry

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Format a timestamp the way the registry stores it (UTC, RFC 3339)
pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Registered user (survey designer or data collector)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique user identifier
    pub id: u64,
    /// Login name, unique across the registry
    pub username: String,
    /// Display name
    pub name: String,
    /// Contact email (optional)
    pub email: Option<String>,
    /// Creation timestamp (RFC 3339)
    pub created_at: String,
}

/// One question of a survey template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyQuestion {
    /// Question identifier, unique within its template
    pub id: String,
    /// Question prompt shown to the collector
    pub text: String,
    /// Display unit of the raw answer (e.g., "kWh", "km")
    pub unit: String,
    /// Emission factor: kg CO2 per unit of raw input
    pub coefficient: f64,
}

impl SurveyQuestion {
    /// Validate a single question definition
    pub fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("Question id must not be empty".to_string());
        }
        if self.text.trim().is_empty() {
            return Err(format!("Question '{}' has an empty prompt", self.id));
        }
        if !self.coefficient.is_finite() {
            return Err(format!("Question '{}' has a non-finite coefficient", self.id));
        }
        if self.coefficient < 0.0 {
            return Err(format!("Question '{}' has a negative coefficient", self.id));
        }
        Ok(())
    }
}

/// Validate a template's question list: each question valid, ids unique
pub fn validate_questions(questions: &[SurveyQuestion]) -> Result<(), String> {
    let mut seen: std::collections::HashSet<&str> = std::collections::HashSet::new();
    for question in questions {
        question.validate()?;
        if !seen.insert(question.id.as_str()) {
            return Err(format!("Duplicate question id '{}'", question.id));
        }
    }
    Ok(())
}

/// One answered question of a conducted survey
///
/// `carbon_equivalent` is derived from the raw value and the matching
/// question's coefficient at save time; it is never taken from the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyResponse {
    /// References a SurveyQuestion.id of the survey's template
    pub question_id: String,
    /// Raw numeric answer in the question's unit
    pub value: f64,
    /// Derived kg CO2: value * coefficient
    pub carbon_equivalent: f64,
}

/// Reusable survey definition, identified by a generated code
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurveyTemplate {
    /// Unique template identifier
    pub id: u64,
    /// Template name
    pub name: String,
    /// Optional description
    pub description: Option<String>,
    /// Generated lookup code (unique, immutable after creation)
    pub code: String,
    /// Ordered question list
    pub questions: Vec<SurveyQuestion>,
    /// Designer user id
    pub created_by: u64,
    /// Creation timestamp (RFC 3339)
    pub created_at: String,
    /// Last update timestamp (RFC 3339)
    pub updated_at: String,
}

impl SurveyTemplate {
    /// Look up a question by id
    pub fn question(&self, question_id: &str) -> Option<&SurveyQuestion> {
        self.questions.iter().find(|q| q.id == question_id)
    }

    /// Number of questions
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }
}

/// One completed data-collection session against a template
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Survey {
    /// Unique survey identifier
    pub id: u64,
    /// References a SurveyTemplate.id
    pub template_id: u64,
    /// Household identifier assigned by the collector
    pub household_id: String,
    /// Household address
    pub household_address: String,
    /// Number of occupants
    pub occupants: u32,
    /// Living area in square meters (optional)
    pub area: Option<f64>,
    /// Ordered responses, at most one per question id
    pub responses: Vec<SurveyResponse>,
    /// Derived total: sum of response carbon equivalents, persisted for reporting
    pub total_carbon_footprint: f64,
    /// Collector user id
    pub conducted_by: u64,
    /// Creation timestamp (RFC 3339)
    pub created_at: String,
}

impl Survey {
    /// Get the creation date as NaiveDate
    pub fn created_date(&self) -> Option<NaiveDate> {
        DateTime::parse_from_rfc3339(&self.created_at)
            .ok()
            .map(|dt| dt.date_naive())
    }

    /// Number of answered questions
    pub fn response_count(&self) -> usize {
        self.responses.len()
    }

    /// Look up a response by question id
    pub fn response(&self, question_id: &str) -> Option<&SurveyResponse> {
        self.responses.iter().find(|r| r.question_id == question_id)
    }
}

// ==================== Typed Insert / Update Inputs ====================

/// Input for user creation
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Input for template creation; the code is generated server-side
#[derive(Debug, Clone, Deserialize)]
pub struct NewTemplate {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub questions: Vec<SurveyQuestion>,
    pub created_by: u64,
}

/// Partial template update; code and creator are immutable
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TemplateUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub questions: Option<Vec<SurveyQuestion>>,
}

/// One raw answer as submitted by a collector
#[derive(Debug, Clone, Deserialize)]
pub struct ResponseInput {
    pub question_id: String,
    pub value: f64,
}

/// Input for survey creation; equivalents and the total are derived
#[derive(Debug, Clone, Deserialize)]
pub struct NewSurvey {
    pub template_id: u64,
    pub household_id: String,
    pub household_address: String,
    pub occupants: u32,
    #[serde(default)]
    pub area: Option<f64>,
    pub responses: Vec<ResponseInput>,
    pub conducted_by: u64,
}

// ==================== Tests ====================
