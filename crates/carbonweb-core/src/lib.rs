//! Core survey registry and carbon accounting logic

pub mod carbon;
pub mod code;
pub mod error;
pub mod models;
pub mod reports;

use carbonweb_config::Config;
use carbonweb_store::StoreRef;
use chrono::{DateTime, Datelike, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::RwLock;

pub use error::{CoreError, CoreResult, ErrorCode, ErrorSeverity};
pub use models::{
    format_timestamp, validate_questions, NewSurvey, NewTemplate, NewUser, ResponseInput, Survey,
    SurveyQuestion, SurveyResponse, SurveyTemplate, TemplateUpdate, User,
};
pub use reports::{
    QuestionAggregate, RegistrySummary, SurveyReport, SurveyReportRow, SurveysResponse,
    TemplateReport, TemplatesResponse, UserResponse, UserStats,
};

/// Main registry structure
///
/// Holds the whole data set in memory behind an `RwLock` and snapshots it
/// through the store backend. Uniqueness of template codes is enforced here
/// at insert time; creation retries with a fresh random draw on conflict.
pub struct Registry {
    config: Config,
    store: StoreRef,
    data: RwLock<RegistryData>,
}

/// In-memory registry data
#[derive(Debug, Serialize, Deserialize)]
pub struct RegistryData {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub templates: Vec<SurveyTemplate>,
    #[serde(default)]
    pub surveys: Vec<Survey>,
    #[serde(default = "first_id")]
    next_user_id: u64,
    #[serde(default = "first_id")]
    next_template_id: u64,
    #[serde(default = "first_id")]
    next_survey_id: u64,
}

fn first_id() -> u64 {
    1
}

impl Default for RegistryData {
    fn default() -> Self {
        Self {
            users: Vec::new(),
            templates: Vec::new(),
            surveys: Vec::new(),
            next_user_id: first_id(),
            next_template_id: first_id(),
            next_survey_id: first_id(),
        }
    }
}

impl RegistryData {
    /// Ensure id counters are past every stored id
    ///
    /// Older snapshots may predate the persisted counters.
    fn fix_counters(&mut self) {
        let max_user = self.users.iter().map(|u| u.id).max().unwrap_or(0);
        let max_template = self.templates.iter().map(|t| t.id).max().unwrap_or(0);
        let max_survey = self.surveys.iter().map(|s| s.id).max().unwrap_or(0);
        self.next_user_id = self.next_user_id.max(max_user + 1);
        self.next_template_id = self.next_template_id.max(max_template + 1);
        self.next_survey_id = self.next_survey_id.max(max_survey + 1);
    }
}

/// Trait for registry operations exposed to the API layer
pub trait RegistryOperations {
    /// Get registry summary
    fn summary(&self) -> RegistrySummary;
}

impl RegistryOperations for Registry {
    fn summary(&self) -> RegistrySummary {
        let data = self.data.read().unwrap();
        RegistrySummary {
            total_users: data.users.len(),
            total_templates: data.templates.len(),
            total_surveys: data.surveys.len(),
        }
    }
}

impl Registry {
    /// Create a new registry with config and store backend
    pub fn new(config: Config, store: StoreRef) -> Self {
        Self {
            config,
            store,
            data: RwLock::new(RegistryData::default()),
        }
    }

    /// Load the registry from the store backend
    pub async fn load(&mut self) -> CoreResult<()> {
        let snapshot = self.store.load().await?;
        let mut loaded: RegistryData = serde_json::from_value(snapshot)?;
        loaded.fix_counters();

        let (users, templates, surveys) =
            (loaded.users.len(), loaded.templates.len(), loaded.surveys.len());
        *self.data.write().unwrap() = loaded;

        log::info!(
            target: "carbonweb::registry",
            "Registry loaded from {}: {} users, {} templates, {} surveys",
            self.store.location(), users, templates, surveys
        );
        Ok(())
    }

    /// Reload the registry from the store backend
    pub async fn reload(&mut self) -> CoreResult<()> {
        self.load().await
    }

    /// Snapshot the current data through the store backend
    pub async fn persist(&self) -> CoreResult<()> {
        let snapshot = {
            let data = self.data.read().unwrap();
            serde_json::to_value(&*data)?
        };
        self.store.save(&snapshot).await?;
        Ok(())
    }

    /// Persist if autosave is enabled
    async fn autosave(&self) -> CoreResult<()> {
        if self.config.data.autosave {
            self.persist().await
        } else {
            Ok(())
        }
    }

    // ==================== User Operations ====================

    /// Create a user
    pub async fn create_user(&self, input: NewUser, now: DateTime<Utc>) -> CoreResult<User> {
        let username = input.username.trim().to_string();
        if username.is_empty() {
            return Err(CoreError::ValidationError {
                message: "Username must not be empty".to_string(),
            });
        }
        if input.name.trim().is_empty() {
            return Err(CoreError::ValidationError {
                message: "Name must not be empty".to_string(),
            });
        }

        let user = {
            let mut data = self.data.write().unwrap();
            if data.users.iter().any(|u| u.username == username) {
                return Err(CoreError::DuplicateUsername { username });
            }

            let id = data.next_user_id;
            data.next_user_id += 1;
            let user = User {
                id,
                username,
                name: input.name.trim().to_string(),
                email: input.email,
                created_at: format_timestamp(&now),
            };
            data.users.push(user.clone());
            user
        };

        self.autosave().await?;
        Ok(user)
    }

    /// Get user by id
    pub fn user(&self, id: u64) -> Option<User> {
        let data = self.data.read().unwrap();
        data.users.iter().find(|u| u.id == id).cloned()
    }

    /// Get user by username
    pub fn user_by_username(&self, username: &str) -> Option<User> {
        let data = self.data.read().unwrap();
        data.users.iter().find(|u| u.username == username).cloned()
    }

    /// Get per-user activity counts
    pub fn user_stats(&self, user_id: u64) -> CoreResult<UserStats> {
        let data = self.data.read().unwrap();
        if !data.users.iter().any(|u| u.id == user_id) {
            return Err(CoreError::UserNotFound { id: user_id });
        }
        Ok(UserStats {
            templates_count: data.templates.iter().filter(|t| t.created_by == user_id).count(),
            surveys_count: data.surveys.iter().filter(|s| s.conducted_by == user_id).count(),
        })
    }

    // ==================== Template Operations ====================

    /// Create a survey template with a freshly generated code
    ///
    /// Generation loops generate -> insert -> on conflict regenerate, bounded
    /// by codes.max_attempts; the clock and RNG are supplied by the caller.
    pub async fn create_template<R: Rng>(
        &self,
        input: NewTemplate,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> CoreResult<SurveyTemplate> {
        if input.name.trim().is_empty() {
            return Err(CoreError::ValidationError {
                message: "Template name must not be empty".to_string(),
            });
        }
        validate_questions(&input.questions)
            .map_err(|message| CoreError::ValidationError { message })?;

        let template = {
            let mut data = self.data.write().unwrap();
            if !data.users.iter().any(|u| u.id == input.created_by) {
                return Err(CoreError::UserNotFound { id: input.created_by });
            }

            let mut code = None;
            for attempt in 1..=self.config.codes.max_attempts {
                let candidate = code::generate_code(rng, now.year(), &self.config.codes);
                if data.templates.iter().any(|t| t.code == candidate) {
                    log::warn!(
                        target: "carbonweb::registry",
                        "Template code collision on attempt {}: {}",
                        attempt, candidate
                    );
                    continue;
                }
                code = Some(candidate);
                break;
            }
            let code = code.ok_or(CoreError::CodeExhausted {
                attempts: self.config.codes.max_attempts,
            })?;

            let id = data.next_template_id;
            data.next_template_id += 1;
            let timestamp = format_timestamp(&now);
            let template = SurveyTemplate {
                id,
                name: input.name.trim().to_string(),
                description: input.description,
                code,
                questions: input.questions,
                created_by: input.created_by,
                created_at: timestamp.clone(),
                updated_at: timestamp,
            };
            data.templates.push(template.clone());
            log::info!(
                target: "carbonweb::registry",
                "Template {} created with code {}",
                template.id, template.code
            );
            template
        };

        self.autosave().await?;
        Ok(template)
    }

    /// Get template by id
    pub fn template(&self, id: u64) -> Option<SurveyTemplate> {
        let data = self.data.read().unwrap();
        data.templates.iter().find(|t| t.id == id).cloned()
    }

    /// Get template by collector code
    ///
    /// Malformed codes short-circuit to None without scanning.
    pub fn template_by_code(&self, code: &str) -> Option<SurveyTemplate> {
        if !code::is_valid_code(code, &self.config.codes) {
            return None;
        }
        let data = self.data.read().unwrap();
        data.templates.iter().find(|t| t.code == code).cloned()
    }

    /// Get all templates
    pub fn all_templates(&self) -> Vec<SurveyTemplate> {
        self.data.read().unwrap().templates.clone()
    }

    /// Get templates created by a user, newest first
    pub fn templates_by_user(&self, user_id: u64) -> Vec<SurveyTemplate> {
        let data = self.data.read().unwrap();
        let mut templates: Vec<SurveyTemplate> = data
            .templates
            .iter()
            .filter(|t| t.created_by == user_id)
            .cloned()
            .collect();
        templates.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        templates
    }

    /// Apply a partial update to a template
    ///
    /// Code and creator are immutable; the update timestamp is bumped.
    pub async fn update_template(
        &self,
        id: u64,
        updates: TemplateUpdate,
        now: DateTime<Utc>,
    ) -> CoreResult<SurveyTemplate> {
        if let Some(ref name) = updates.name {
            if name.trim().is_empty() {
                return Err(CoreError::ValidationError {
                    message: "Template name must not be empty".to_string(),
                });
            }
        }
        if let Some(ref questions) = updates.questions {
            validate_questions(questions)
                .map_err(|message| CoreError::ValidationError { message })?;
        }

        let template = {
            let mut data = self.data.write().unwrap();
            let template = data
                .templates
                .iter_mut()
                .find(|t| t.id == id)
                .ok_or(CoreError::TemplateNotFound { id })?;

            if let Some(name) = updates.name {
                template.name = name.trim().to_string();
            }
            if let Some(description) = updates.description {
                template.description = Some(description);
            }
            if let Some(questions) = updates.questions {
                template.questions = questions;
            }
            template.updated_at = format_timestamp(&now);
            template.clone()
        };

        self.autosave().await?;
        Ok(template)
    }

    /// Delete a template; returns false when it does not exist
    pub async fn delete_template(&self, id: u64) -> CoreResult<bool> {
        let removed = {
            let mut data = self.data.write().unwrap();
            let before = data.templates.len();
            data.templates.retain(|t| t.id != id);
            data.templates.len() != before
        };

        if removed {
            self.autosave().await?;
        }
        Ok(removed)
    }

    // ==================== Survey Operations ====================

    /// Record a completed data-collection session
    ///
    /// Raw answers are validated against the template's questions, carbon
    /// equivalents are derived per response, and the total is persisted
    /// alongside. A repeated question id replaces the earlier answer.
    pub async fn create_survey(&self, input: NewSurvey, now: DateTime<Utc>) -> CoreResult<Survey> {
        if input.household_id.trim().is_empty() {
            return Err(CoreError::ValidationError {
                message: "Household id must not be empty".to_string(),
            });
        }
        if input.household_address.trim().is_empty() {
            return Err(CoreError::ValidationError {
                message: "Household address must not be empty".to_string(),
            });
        }
        if input.occupants == 0 {
            return Err(CoreError::ValidationError {
                message: "Occupants must be at least 1".to_string(),
            });
        }
        if let Some(area) = input.area {
            if !area.is_finite() || area <= 0.0 {
                return Err(CoreError::ValidationError {
                    message: "Area must be a positive number".to_string(),
                });
            }
        }

        let survey = {
            let mut data = self.data.write().unwrap();
            let template = data
                .templates
                .iter()
                .find(|t| t.id == input.template_id)
                .ok_or(CoreError::TemplateNotFound { id: input.template_id })?
                .clone();
            if !data.users.iter().any(|u| u.id == input.conducted_by) {
                return Err(CoreError::UserNotFound { id: input.conducted_by });
            }

            let mut responses: Vec<SurveyResponse> = Vec::new();
            for raw in &input.responses {
                let question = template.question(&raw.question_id).ok_or_else(|| {
                    CoreError::ValidationError {
                        message: format!(
                            "Unknown question id '{}' for template {}",
                            raw.question_id, template.id
                        ),
                    }
                })?;
                if !raw.value.is_finite() {
                    return Err(CoreError::ValidationError {
                        message: format!("Non-finite value for question '{}'", raw.question_id),
                    });
                }
                if raw.value < 0.0 {
                    return Err(CoreError::ValidationError {
                        message: format!("Negative value for question '{}'", raw.question_id),
                    });
                }

                let response = SurveyResponse {
                    question_id: raw.question_id.clone(),
                    value: raw.value,
                    carbon_equivalent: carbon::carbon_equivalent(raw.value, question.coefficient),
                };
                // Later answers for the same question replace earlier ones
                match responses.iter_mut().find(|r| r.question_id == raw.question_id) {
                    Some(existing) => *existing = response,
                    None => responses.push(response),
                }
            }

            let total = carbon::total_footprint(responses.iter().map(|r| {
                let coefficient = template
                    .question(&r.question_id)
                    .map(|q| q.coefficient)
                    .unwrap_or_default();
                (r.value, coefficient)
            }));

            let id = data.next_survey_id;
            data.next_survey_id += 1;
            let survey = Survey {
                id,
                template_id: input.template_id,
                household_id: input.household_id.trim().to_string(),
                household_address: input.household_address.trim().to_string(),
                occupants: input.occupants,
                area: input.area,
                responses,
                total_carbon_footprint: total,
                conducted_by: input.conducted_by,
                created_at: format_timestamp(&now),
            };
            data.surveys.push(survey.clone());
            log::info!(
                target: "carbonweb::registry",
                "Survey {} recorded against template {} ({} responses, total {})",
                survey.id, survey.template_id, survey.response_count(),
                survey.total_carbon_footprint
            );
            survey
        };

        self.autosave().await?;
        Ok(survey)
    }

    /// Get survey by id
    pub fn survey(&self, id: u64) -> Option<Survey> {
        let data = self.data.read().unwrap();
        data.surveys.iter().find(|s| s.id == id).cloned()
    }

    /// Get surveys conducted by a user, newest first
    pub fn surveys_by_user(&self, user_id: u64) -> Vec<Survey> {
        let data = self.data.read().unwrap();
        let mut surveys: Vec<Survey> = data
            .surveys
            .iter()
            .filter(|s| s.conducted_by == user_id)
            .cloned()
            .collect();
        surveys.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        surveys
    }

    /// Get surveys conducted against a template, newest first
    pub fn surveys_by_template(&self, template_id: u64) -> Vec<Survey> {
        let data = self.data.read().unwrap();
        let mut surveys: Vec<Survey> = data
            .surveys
            .iter()
            .filter(|s| s.template_id == template_id)
            .cloned()
            .collect();
        surveys.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        surveys
    }

    /// Delete a survey; returns false when it does not exist
    pub async fn delete_survey(&self, id: u64) -> CoreResult<bool> {
        let removed = {
            let mut data = self.data.write().unwrap();
            let before = data.surveys.len();
            data.surveys.retain(|s| s.id != id);
            data.surveys.len() != before
        };

        if removed {
            self.autosave().await?;
        }
        Ok(removed)
    }

    // ==================== Reports ====================

    /// Build the report rows for a single survey
    pub fn survey_report(&self, survey_id: u64) -> CoreResult<SurveyReport> {
        let decimals = self.config.display.decimal_places;
        let data = self.data.read().unwrap();
        let survey = data
            .surveys
            .iter()
            .find(|s| s.id == survey_id)
            .ok_or(CoreError::SurveyNotFound { id: survey_id })?;
        let template = data
            .templates
            .iter()
            .find(|t| t.id == survey.template_id)
            .ok_or(CoreError::TemplateNotFound { id: survey.template_id })?;

        let rows = survey
            .responses
            .iter()
            .map(|response| {
                // The template may have been edited since collection; fall
                // back to the bare question id rather than dropping the row
                let (question, unit) = match template.question(&response.question_id) {
                    Some(q) => (q.text.clone(), q.unit.clone()),
                    None => (response.question_id.clone(), String::new()),
                };
                SurveyReportRow {
                    question_id: response.question_id.clone(),
                    question,
                    unit,
                    value: response.value,
                    carbon_equivalent: carbonweb_utils::format_amount(
                        response.carbon_equivalent,
                        decimals,
                    ),
                }
            })
            .collect();

        Ok(SurveyReport {
            survey_id: survey.id,
            template_id: template.id,
            template_name: template.name.clone(),
            template_code: template.code.clone(),
            household_id: survey.household_id.clone(),
            household_address: survey.household_address.clone(),
            occupants: survey.occupants,
            area: survey.area,
            conducted_by: survey.conducted_by,
            conducted_at: survey.created_at.clone(),
            rows,
            total_carbon_footprint: carbonweb_utils::format_amount(
                survey.total_carbon_footprint,
                decimals,
            ),
            unit_label: self.config.display.unit_label.clone(),
        })
    }

    /// Aggregate all surveys conducted against a template
    pub fn template_report(&self, template_id: u64) -> CoreResult<TemplateReport> {
        let decimals = self.config.display.decimal_places;
        let data = self.data.read().unwrap();
        let template = data
            .templates
            .iter()
            .find(|t| t.id == template_id)
            .ok_or(CoreError::TemplateNotFound { id: template_id })?;

        let surveys: Vec<&Survey> = data
            .surveys
            .iter()
            .filter(|s| s.template_id == template_id)
            .collect();

        let survey_count = surveys.len();
        let total: f64 = surveys.iter().map(|s| s.total_carbon_footprint).sum();
        let average = if survey_count > 0 {
            total / survey_count as f64
        } else {
            0.0
        };

        let questions = template
            .questions
            .iter()
            .map(|question| {
                let answers: Vec<&SurveyResponse> = surveys
                    .iter()
                    .filter_map(|s| s.response(&question.id))
                    .collect();
                let response_count = answers.len();
                let value_sum: f64 = answers.iter().map(|r| r.value).sum();
                let equivalent_sum: f64 = answers.iter().map(|r| r.carbon_equivalent).sum();
                let average_value = if response_count > 0 {
                    value_sum / response_count as f64
                } else {
                    0.0
                };
                QuestionAggregate {
                    question_id: question.id.clone(),
                    question: question.text.clone(),
                    unit: question.unit.clone(),
                    response_count,
                    average_value: carbonweb_utils::format_amount(average_value, decimals),
                    total_equivalent: carbonweb_utils::format_amount(equivalent_sum, decimals),
                }
            })
            .collect();

        Ok(TemplateReport {
            template_id: template.id,
            name: template.name.clone(),
            code: template.code.clone(),
            survey_count,
            total_footprint: carbonweb_utils::format_amount(total, decimals),
            average_footprint: carbonweb_utils::format_amount(average, decimals),
            questions,
            unit_label: self.config.display.unit_label.clone(),
        })
    }
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;
    use carbonweb_store::MemoryStore;
    use chrono::TimeZone;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Arc;

    /// RNG that always yields the same draw, to force code collisions
    struct ZeroRng;

    impl rand::RngCore for ZeroRng {
        fn next_u32(&mut self) -> u32 {
            0
        }
        fn next_u64(&mut self) -> u64 {
            0
        }
        fn fill_bytes(&mut self, dest: &mut [u8]) {
            dest.fill(0);
        }
    }

    fn registry() -> Registry {
        Registry::new(carbonweb_config::Config::default(), Arc::new(MemoryStore::new()))
    }

    fn june_first() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn question(id: &str, coefficient: f64) -> SurveyQuestion {
        SurveyQuestion {
            id: id.to_string(),
            text: format!("Monthly {} consumption", id),
            unit: "kWh".to_string(),
            coefficient,
        }
    }

    async fn seed_user(registry: &Registry, username: &str) -> User {
        registry
            .create_user(
                NewUser {
                    username: username.to_string(),
                    name: "Ana Collector".to_string(),
                    email: None,
                },
                june_first(),
            )
            .await
            .unwrap()
    }

    async fn seed_template(registry: &Registry, created_by: u64) -> SurveyTemplate {
        registry
            .create_template(
                NewTemplate {
                    name: "Household energy".to_string(),
                    description: Some("Electricity and gas usage".to_string()),
                    questions: vec![question("electricity", 0.45), question("gas", 1.2)],
                    created_by,
                },
                june_first(),
                &mut StdRng::seed_from_u64(7),
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_user_and_duplicate_username() {
        let registry = registry();
        let user = seed_user(&registry, "ana").await;
        assert_eq!(user.id, 1);
        assert_eq!(registry.user_by_username("ana").unwrap().id, user.id);

        let err = registry
            .create_user(
                NewUser {
                    username: "ana".to_string(),
                    name: "Another Ana".to_string(),
                    email: None,
                },
                june_first(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::DuplicateEntry);
    }

    #[tokio::test]
    async fn test_create_template_code_shape() {
        let registry = registry();
        let user = seed_user(&registry, "ana").await;
        let template = seed_template(&registry, user.id).await;

        assert!(template.code.starts_with("CS-2024-"));
        let suffix = template.code.rsplit('-').next().unwrap();
        assert_eq!(suffix.len(), 6);
        assert!(suffix.bytes().all(|b| b.is_ascii_uppercase() || b.is_ascii_digit()));

        assert_eq!(registry.template(template.id).unwrap().code, template.code);
        assert_eq!(
            registry.template_by_code(&template.code).unwrap().id,
            template.id
        );
    }

    #[tokio::test]
    async fn test_template_by_code_rejects_malformed_codes() {
        let registry = registry();
        let user = seed_user(&registry, "ana").await;
        seed_template(&registry, user.id).await;

        assert!(registry.template_by_code("not-a-code").is_none());
        assert!(registry.template_by_code("CS-2024-toolow").is_none());
    }

    #[tokio::test]
    async fn test_create_template_retries_on_code_collision() {
        let registry = registry();
        let user = seed_user(&registry, "ana").await;

        // Same seed twice: the second creation's first draw collides with
        // the first template's code and must be regenerated.
        let input = || NewTemplate {
            name: "Household energy".to_string(),
            description: None,
            questions: vec![question("electricity", 0.45)],
            created_by: user.id,
        };
        let first = registry
            .create_template(input(), june_first(), &mut StdRng::seed_from_u64(99))
            .await
            .unwrap();
        let second = registry
            .create_template(input(), june_first(), &mut StdRng::seed_from_u64(99))
            .await
            .unwrap();

        assert_ne!(first.code, second.code);
        assert!(registry.template_by_code(&first.code).is_some());
        assert!(registry.template_by_code(&second.code).is_some());
    }

    #[tokio::test]
    async fn test_create_template_code_exhaustion() {
        let registry = registry();
        let user = seed_user(&registry, "ana").await;

        let input = || NewTemplate {
            name: "Household energy".to_string(),
            description: None,
            questions: vec![],
            created_by: user.id,
        };
        // A constant RNG generates the same code on every attempt
        registry
            .create_template(input(), june_first(), &mut ZeroRng)
            .await
            .unwrap();
        let err = registry
            .create_template(input(), june_first(), &mut ZeroRng)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::CodeExhausted { attempts: 5 }));
    }

    #[tokio::test]
    async fn test_create_template_validation() {
        let registry = registry();
        let user = seed_user(&registry, "ana").await;
        let mut rng = StdRng::seed_from_u64(1);

        let err = registry
            .create_template(
                NewTemplate {
                    name: "  ".to_string(),
                    description: None,
                    questions: vec![],
                    created_by: user.id,
                },
                june_first(),
                &mut rng,
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);

        let err = registry
            .create_template(
                NewTemplate {
                    name: "Bad coefficients".to_string(),
                    description: None,
                    questions: vec![question("electricity", -0.5)],
                    created_by: user.id,
                },
                june_first(),
                &mut rng,
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);

        let err = registry
            .create_template(
                NewTemplate {
                    name: "Duplicate ids".to_string(),
                    description: None,
                    questions: vec![question("a", 1.0), question("a", 2.0)],
                    created_by: user.id,
                },
                june_first(),
                &mut rng,
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);

        let err = registry
            .create_template(
                NewTemplate {
                    name: "Unknown designer".to_string(),
                    description: None,
                    questions: vec![],
                    created_by: 404,
                },
                june_first(),
                &mut rng,
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::UserNotFound);
    }

    #[tokio::test]
    async fn test_update_template_keeps_code() {
        let registry = registry();
        let user = seed_user(&registry, "ana").await;
        let template = seed_template(&registry, user.id).await;

        let later = Utc.with_ymd_and_hms(2024, 7, 1, 9, 0, 0).unwrap();
        let updated = registry
            .update_template(
                template.id,
                TemplateUpdate {
                    name: Some("Household energy v2".to_string()),
                    questions: Some(vec![question("electricity", 0.4)]),
                    ..Default::default()
                },
                later,
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "Household energy v2");
        assert_eq!(updated.code, template.code);
        assert_eq!(updated.created_at, template.created_at);
        assert!(updated.updated_at > template.updated_at);
        assert_eq!(updated.question_count(), 1);

        let err = registry
            .update_template(404, TemplateUpdate::default(), later)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::TemplateNotFound);
    }

    #[tokio::test]
    async fn test_delete_template() {
        let registry = registry();
        let user = seed_user(&registry, "ana").await;
        let template = seed_template(&registry, user.id).await;

        assert!(registry.delete_template(template.id).await.unwrap());
        assert!(!registry.delete_template(template.id).await.unwrap());
        assert!(registry.template(template.id).is_none());
    }

    #[tokio::test]
    async fn test_create_survey_derives_equivalents_and_total() {
        let registry = registry();
        let user = seed_user(&registry, "ana").await;
        let template = seed_template(&registry, user.id).await;

        let survey = registry
            .create_survey(
                NewSurvey {
                    template_id: template.id,
                    household_id: "HH-001".to_string(),
                    household_address: "12 Elm Street".to_string(),
                    occupants: 3,
                    area: Some(84.5),
                    responses: vec![
                        ResponseInput { question_id: "electricity".to_string(), value: 100.0 },
                        ResponseInput { question_id: "gas".to_string(), value: 20.0 },
                    ],
                    conducted_by: user.id,
                },
                june_first(),
            )
            .await
            .unwrap();

        assert_eq!(survey.response("electricity").unwrap().carbon_equivalent, 45.0);
        assert_eq!(survey.response("gas").unwrap().carbon_equivalent, 24.0);
        assert!((survey.total_carbon_footprint - 69.0).abs() < 1e-9);

        // The persisted total always equals the sum of the equivalents
        let sum: f64 = survey.responses.iter().map(|r| r.carbon_equivalent).sum();
        assert!((survey.total_carbon_footprint - sum).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_create_survey_empty_responses() {
        let registry = registry();
        let user = seed_user(&registry, "ana").await;
        let template = seed_template(&registry, user.id).await;

        let survey = registry
            .create_survey(
                NewSurvey {
                    template_id: template.id,
                    household_id: "HH-002".to_string(),
                    household_address: "3 Oak Avenue".to_string(),
                    occupants: 1,
                    area: None,
                    responses: vec![],
                    conducted_by: user.id,
                },
                june_first(),
            )
            .await
            .unwrap();

        assert_eq!(survey.total_carbon_footprint, 0.0);
        assert_eq!(survey.response_count(), 0);
    }

    #[tokio::test]
    async fn test_create_survey_last_write_wins_per_question() {
        let registry = registry();
        let user = seed_user(&registry, "ana").await;
        let template = seed_template(&registry, user.id).await;

        let survey = registry
            .create_survey(
                NewSurvey {
                    template_id: template.id,
                    household_id: "HH-003".to_string(),
                    household_address: "7 Birch Lane".to_string(),
                    occupants: 2,
                    area: None,
                    responses: vec![
                        ResponseInput { question_id: "electricity".to_string(), value: 100.0 },
                        ResponseInput { question_id: "gas".to_string(), value: 20.0 },
                        ResponseInput { question_id: "electricity".to_string(), value: 50.0 },
                    ],
                    conducted_by: user.id,
                },
                june_first(),
            )
            .await
            .unwrap();

        assert_eq!(survey.response_count(), 2);
        let electricity = survey.response("electricity").unwrap();
        assert_eq!(electricity.value, 50.0);
        assert_eq!(electricity.carbon_equivalent, 22.5);
        assert!((survey.total_carbon_footprint - (22.5 + 24.0)).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_create_survey_validation() {
        let registry = registry();
        let user = seed_user(&registry, "ana").await;
        let template = seed_template(&registry, user.id).await;

        let base = NewSurvey {
            template_id: template.id,
            household_id: "HH-004".to_string(),
            household_address: "9 Pine Road".to_string(),
            occupants: 2,
            area: None,
            responses: vec![],
            conducted_by: user.id,
        };

        let err = registry
            .create_survey(NewSurvey { template_id: 404, ..base.clone() }, june_first())
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::TemplateNotFound);

        let err = registry
            .create_survey(
                NewSurvey {
                    responses: vec![ResponseInput {
                        question_id: "water".to_string(),
                        value: 1.0,
                    }],
                    ..base.clone()
                },
                june_first(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);

        let err = registry
            .create_survey(
                NewSurvey {
                    responses: vec![ResponseInput {
                        question_id: "gas".to_string(),
                        value: f64::NAN,
                    }],
                    ..base.clone()
                },
                june_first(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);

        let err = registry
            .create_survey(
                NewSurvey {
                    responses: vec![ResponseInput {
                        question_id: "gas".to_string(),
                        value: -4.0,
                    }],
                    ..base.clone()
                },
                june_first(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);

        let err = registry
            .create_survey(NewSurvey { occupants: 0, ..base.clone() }, june_first())
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);

        let err = registry
            .create_survey(NewSurvey { conducted_by: 404, ..base }, june_first())
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::UserNotFound);
    }

    #[tokio::test]
    async fn test_survey_listings_newest_first() {
        let registry = registry();
        let user = seed_user(&registry, "ana").await;
        let template = seed_template(&registry, user.id).await;

        let base = NewSurvey {
            template_id: template.id,
            household_id: "HH-005".to_string(),
            household_address: "1 Maple Court".to_string(),
            occupants: 2,
            area: None,
            responses: vec![],
            conducted_by: user.id,
        };
        let earlier = Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap();
        let later = Utc.with_ymd_and_hms(2024, 6, 2, 8, 0, 0).unwrap();
        let first = registry.create_survey(base.clone(), earlier).await.unwrap();
        let second = registry.create_survey(base, later).await.unwrap();

        let by_template = registry.surveys_by_template(template.id);
        assert_eq!(by_template.len(), 2);
        assert_eq!(by_template[0].id, second.id);
        assert_eq!(by_template[1].id, first.id);

        let by_user = registry.surveys_by_user(user.id);
        assert_eq!(by_user[0].id, second.id);

        let stats = registry.user_stats(user.id).unwrap();
        assert_eq!(stats.templates_count, 1);
        assert_eq!(stats.surveys_count, 2);
    }

    #[tokio::test]
    async fn test_survey_report_formats_amounts() {
        let registry = registry();
        let user = seed_user(&registry, "ana").await;
        let template = seed_template(&registry, user.id).await;

        let survey = registry
            .create_survey(
                NewSurvey {
                    template_id: template.id,
                    household_id: "HH-006".to_string(),
                    household_address: "22 Cedar Way".to_string(),
                    occupants: 4,
                    area: Some(120.0),
                    responses: vec![
                        ResponseInput { question_id: "electricity".to_string(), value: 100.0 },
                        ResponseInput { question_id: "gas".to_string(), value: 20.0 },
                    ],
                    conducted_by: user.id,
                },
                june_first(),
            )
            .await
            .unwrap();

        let report = registry.survey_report(survey.id).unwrap();
        assert_eq!(report.template_code, template.code);
        assert_eq!(report.rows.len(), 2);
        assert_eq!(report.rows[0].carbon_equivalent, "45.00");
        assert_eq!(report.rows[1].carbon_equivalent, "24.00");
        assert_eq!(report.total_carbon_footprint, "69.00");
        assert_eq!(report.unit_label, "kg CO2");

        let err = registry.survey_report(404).unwrap_err();
        assert_eq!(err.code(), ErrorCode::SurveyNotFound);
    }

    #[tokio::test]
    async fn test_template_report_aggregates() {
        let registry = registry();
        let user = seed_user(&registry, "ana").await;
        let template = seed_template(&registry, user.id).await;

        let base = NewSurvey {
            template_id: template.id,
            household_id: "HH-007".to_string(),
            household_address: "5 Willow Close".to_string(),
            occupants: 2,
            area: None,
            responses: vec![ResponseInput {
                question_id: "electricity".to_string(),
                value: 100.0,
            }],
            conducted_by: user.id,
        };
        registry.create_survey(base.clone(), june_first()).await.unwrap();
        registry
            .create_survey(
                NewSurvey {
                    responses: vec![ResponseInput {
                        question_id: "electricity".to_string(),
                        value: 200.0,
                    }],
                    ..base
                },
                june_first(),
            )
            .await
            .unwrap();

        let report = registry.template_report(template.id).unwrap();
        assert_eq!(report.survey_count, 2);
        // Totals: 45 + 90
        assert_eq!(report.total_footprint, "135.00");
        assert_eq!(report.average_footprint, "67.50");

        let electricity = &report.questions[0];
        assert_eq!(electricity.question_id, "electricity");
        assert_eq!(electricity.response_count, 2);
        assert_eq!(electricity.average_value, "150.00");
        assert_eq!(electricity.total_equivalent, "135.00");

        let gas = &report.questions[1];
        assert_eq!(gas.response_count, 0);
        assert_eq!(gas.total_equivalent, "0.00");
    }

    #[tokio::test]
    async fn test_persist_and_reload_round_trip() {
        let store = Arc::new(MemoryStore::new());
        let registry = Registry::new(carbonweb_config::Config::default(), store.clone());
        let user = seed_user(&registry, "ana").await;
        let template = seed_template(&registry, user.id).await;

        let mut restored = Registry::new(carbonweb_config::Config::default(), store);
        restored.load().await.unwrap();

        assert_eq!(restored.summary().total_users, 1);
        assert_eq!(restored.template(template.id).unwrap().code, template.code);

        // Counters continue past the loaded ids
        let next = seed_user(&restored, "ben").await;
        assert_eq!(next.id, user.id + 1);
    }
}
