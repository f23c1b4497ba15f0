//! Route modules for the API server
//!
//! All routes are organized into modules:
//! - users: User creation, lookup, activity stats
//! - templates: Survey template CRUD and lookup by code
//! - surveys: Survey collection and lookup
//! - reports: Per-survey and per-template report data
//!
//! Handlers take typed `Json` bodies, so request validation happens once at
//! this boundary and the registry only ever sees well-formed inputs.

pub mod reports;
pub mod surveys;
pub mod templates;
pub mod users;

use crate::ApiError;

/// Parse a numeric id path segment
pub(crate) fn parse_id(raw: &str, what: &str) -> Result<u64, ApiError> {
    raw.parse().map_err(|_| ApiError::BadRequest {
        message: format!("Invalid {} ID", what),
    })
}
