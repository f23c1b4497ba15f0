//! HTTP JSON API server for the survey registry
//!
//! Routes are organized into modules:
//! - routes::users: User creation, lookup, activity stats
//! - routes::templates: Survey template CRUD and lookup by code
//! - routes::surveys: Survey collection and lookup
//! - routes::reports: Per-survey and per-template report data

pub mod error;
pub mod routes;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use carbonweb_config::Config;
use carbonweb_core::{Registry, RegistryOperations};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;

pub use error::ApiError;

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<RwLock<Registry>>,
    pub config: Config,
}

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    use routes::reports::{api_survey_report, api_template_report};
    use routes::surveys::{api_survey_create, api_survey_delete, api_survey_detail};
    use routes::templates::{
        api_template_by_code, api_template_create, api_template_delete, api_template_detail,
        api_template_surveys, api_template_update, api_templates,
    };
    use routes::users::{
        api_user_create, api_user_detail, api_user_stats, api_user_surveys, api_user_templates,
    };

    Router::new()
        // API endpoints
        .route("/api/health", get(health_check))
        .route("/api/summary", get(api_summary))
        .route("/api/users", post(api_user_create))
        .route("/api/users/:id", get(api_user_detail))
        .route("/api/users/:id/stats", get(api_user_stats))
        .route("/api/users/:id/survey-templates", get(api_user_templates))
        .route("/api/users/:id/surveys", get(api_user_surveys))
        .route("/api/survey-templates", post(api_template_create))
        .route("/api/survey-templates", get(api_templates))
        .route("/api/survey-templates/:id", get(api_template_detail))
        .route("/api/survey-templates/:id", put(api_template_update))
        .route("/api/survey-templates/:id", delete(api_template_delete))
        .route("/api/survey-templates/code/:code", get(api_template_by_code))
        .route("/api/survey-templates/:id/surveys", get(api_template_surveys))
        .route("/api/surveys", post(api_survey_create))
        .route("/api/surveys/:id", get(api_survey_detail))
        .route("/api/surveys/:id", delete(api_survey_delete))
        .route("/api/reports/surveys/:id", get(api_survey_report))
        .route("/api/reports/templates/:id", get(api_template_report))
        .route("/api/reload", post(api_reload))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

/// Get registry summary (JSON API)
async fn api_summary(state: axum::extract::State<AppState>) -> String {
    let registry = state.registry.read().await;
    let summary = registry.summary();
    serde_json::to_string(&summary).unwrap_or_default()
}

/// Reload registry API endpoint
async fn api_reload(state: axum::extract::State<AppState>) -> String {
    let mut registry = state.registry.write().await;
    match registry.reload().await {
        Ok(_) => r#"{"success": true, "message": "Registry reloaded"}"#.to_string(),
        Err(e) => format!(r#"{{"success": false, "message": "{}"}}"#, e),
    }
}

/// Start the HTTP server
///
/// This is the main entry point for the carbonweb server.
/// It creates the router, binds to the address, and starts listening for requests.
///
/// # Arguments
///
/// * `config` - The application configuration
/// * `registry` - The shared registry state
pub async fn start_server(config: Config, registry: Arc<RwLock<Registry>>) {
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState { registry, config };

    let router = create_router(state);

    let listener = TcpListener::bind(&addr).await.unwrap();
    eprintln!("[INFO] Starting carbonweb server on http://{}", addr);
    eprintln!("[INFO] Available routes:");
    eprintln!("[INFO]   - /api/users (User management)");
    eprintln!("[INFO]   - /api/survey-templates (Template design and lookup)");
    eprintln!("[INFO]   - /api/surveys (Data collection)");
    eprintln!("[INFO]   - /api/reports/* (Report data)");
    eprintln!("[INFO]   - /api/summary (Registry summary)");

    match axum::serve(listener, router).await {
        Ok(_) => eprintln!("[INFO] Server stopped gracefully"),
        Err(e) => eprintln!("[ERROR] Server error: {}", e),
    }
}
