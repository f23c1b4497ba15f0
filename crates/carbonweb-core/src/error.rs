//! Error types for carbonweb-core
//!
//! This module provides error handling for the survey registry, including
//! error codes, detailed messages, and suggestions.

use thiserror::Error;
use serde::{Deserialize, Serialize};

/// Error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// User not found
    UserNotFound,
    /// Survey template not found
    TemplateNotFound,
    /// Survey not found
    SurveyNotFound,
    /// Validation error
    ValidationError,
    /// Duplicate entry
    DuplicateEntry,
    /// Code generation exhausted
    CodeExhausted,
    /// Persistence error
    StoreError,
    /// Internal error
    InternalError,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCode::UserNotFound => write!(f, "USER_NOT_FOUND"),
            ErrorCode::TemplateNotFound => write!(f, "TEMPLATE_NOT_FOUND"),
            ErrorCode::SurveyNotFound => write!(f, "SURVEY_NOT_FOUND"),
            ErrorCode::ValidationError => write!(f, "VALIDATION_ERROR"),
            ErrorCode::DuplicateEntry => write!(f, "DUPLICATE_ENTRY"),
            ErrorCode::CodeExhausted => write!(f, "CODE_EXHAUSTED"),
            ErrorCode::StoreError => write!(f, "STORE_ERROR"),
            ErrorCode::InternalError => write!(f, "INTERNAL_ERROR"),
        }
    }
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetails {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    /// Suggestions for resolution
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

impl ErrorDetails {
    /// Create a new error detail
    pub fn new(code: ErrorCode, message: String) -> Self {
        Self {
            code,
            message,
            details: None,
            suggestions: vec![],
        }
    }

    /// Add detail information
    pub fn with_detail(mut self, detail: serde_json::Value) -> Self {
        self.details = Some(detail);
        self
    }

    /// Add a suggestion
    pub fn with_suggestion(mut self, suggestion: String) -> Self {
        self.suggestions.push(suggestion);
        self
    }
}

impl std::fmt::Display for ErrorDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(ref details) = self.details {
            write!(f, "\nDetails: {}", details)?;
        }
        if !self.suggestions.is_empty() {
            write!(f, "\nSuggestions:")?;
            for suggestion in &self.suggestions {
                write!(f, "\n  - {}", suggestion)?;
            }
        }
        Ok(())
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSeverity {
    /// Debug information
    Debug,
    /// Informational
    Info,
    /// Warning - operation may be affected
    Warning,
    /// Error - operation failed
    Error,
    /// Critical - application may be unstable
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Debug => write!(f, "debug"),
            ErrorSeverity::Info => write!(f, "info"),
            ErrorSeverity::Warning => write!(f, "warning"),
            ErrorSeverity::Error => write!(f, "error"),
            ErrorSeverity::Critical => write!(f, "critical"),
        }
    }
}

/// Main error type for carbonweb-core
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("User not found: {id}")]
    UserNotFound { id: u64 },

    #[error("Survey template not found: {id}")]
    TemplateNotFound { id: u64 },

    #[error("Survey not found: {id}")]
    SurveyNotFound { id: u64 },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Username already taken: {username}")]
    DuplicateUsername { username: String },

    #[error("Code generation exhausted after {attempts} attempts")]
    CodeExhausted { attempts: usize },

    #[error("Store error: {message}")]
    StoreError { message: String },

    #[error("Internal error: {message}")]
    InternalError { message: String },
}

impl CoreError {
    /// Get the error code
    pub fn code(&self) -> ErrorCode {
        match self {
            CoreError::UserNotFound { .. } => ErrorCode::UserNotFound,
            CoreError::TemplateNotFound { .. } => ErrorCode::TemplateNotFound,
            CoreError::SurveyNotFound { .. } => ErrorCode::SurveyNotFound,
            CoreError::ValidationError { .. } => ErrorCode::ValidationError,
            CoreError::DuplicateUsername { .. } => ErrorCode::DuplicateEntry,
            CoreError::CodeExhausted { .. } => ErrorCode::CodeExhausted,
            CoreError::StoreError { .. } => ErrorCode::StoreError,
            CoreError::InternalError { .. } => ErrorCode::InternalError,
        }
    }

    /// Get the severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            CoreError::UserNotFound { .. } => ErrorSeverity::Info,
            CoreError::TemplateNotFound { .. } => ErrorSeverity::Info,
            CoreError::SurveyNotFound { .. } => ErrorSeverity::Info,
            CoreError::ValidationError { .. } => ErrorSeverity::Warning,
            CoreError::DuplicateUsername { .. } => ErrorSeverity::Warning,
            CoreError::CodeExhausted { .. } => ErrorSeverity::Error,
            CoreError::StoreError { .. } => ErrorSeverity::Error,
            CoreError::InternalError { .. } => ErrorSeverity::Critical,
        }
    }

    /// Convert to detailed error info
    pub fn to_details(&self) -> ErrorDetails {
        let mut details = ErrorDetails::new(self.code(), self.to_string());

        match self {
            CoreError::TemplateNotFound { .. } => {
                details = details.with_suggestion(
                    "Use the /api/survey-templates endpoint to list all templates.".to_string(),
                );
            }
            CoreError::ValidationError { message } => {
                details = details.with_detail(serde_json::json!({ "validation_message": message }));
                details = details.with_suggestion(
                    "Review the validation message for specific requirements.".to_string(),
                );
            }
            CoreError::DuplicateUsername { .. } => {
                details = details.with_suggestion("Pick a different username.".to_string());
            }
            CoreError::CodeExhausted { attempts } => {
                details = details.with_detail(serde_json::json!({ "attempts": attempts }));
                details = details.with_suggestion(
                    "Retry the request; a fresh random draw usually succeeds.".to_string(),
                );
                details = details.with_suggestion(
                    "Increase codes.random_length if the code space is saturated.".to_string(),
                );
            }
            _ => {}
        }

        details
    }
}

/// Result type with CoreError
pub type CoreResult<T> = Result<T, CoreError>;

impl From<carbonweb_store::StoreError> for CoreError {
    fn from(error: carbonweb_store::StoreError) -> Self {
        CoreError::StoreError { message: error.to_string() }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(error: serde_json::Error) -> Self {
        CoreError::InternalError { message: error.to_string() }
    }
}

// ==================== Tests ====================
