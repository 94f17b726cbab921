// Axum API server module
//
// JSON endpoints over the recommendation engine. The engine is built once at
// startup and shared read-only; classification + explanation run on the
// blocking pool because the forest batch prediction uses Rayon.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::config::AdvisorConfig;
use crate::engine::{RecommendationEngine, RecommendationResult};
use crate::error::AdvisorError;
use crate::explanation::{Language, MarkdownFormatter};
use crate::features::{Feature, FeatureVector};
use crate::rules::{PlantLookup, PlantRule};

// ============================================================================
// Application State
// ============================================================================

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<RecommendationEngine>,
}

impl AppState {
    pub fn new(config: &AdvisorConfig) -> anyhow::Result<Self> {
        tracing::info!("Training classifier and loading plant rules...");
        let engine = RecommendationEngine::from_config(config)?;
        Ok(Self::from_engine(engine))
    }

    pub fn from_engine(engine: RecommendationEngine) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }
}

// ============================================================================
// Router
// ============================================================================

pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))

        // Core entry points
        .route("/api/recommend", post(recommend))
        .route("/api/compatibility", post(check_compatibility))

        // Rule database
        .route("/api/plants", get(list_plants))
        .route("/api/plants/:name", get(get_plant))

        // Simulated sensor reading (same shape as manual input)
        .route("/api/sensor-preset", get(sensor_preset))

        // Middleware (applied in reverse order)
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct LanguageQuery {
    pub lang: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RecommendRequest {
    /// Feature values keyed by code ("N", "P", ..., "rainfall")
    pub features: serde_json::Value,
    pub language: Option<String>,
    /// Explainer seed override
    pub seed: Option<u64>,
    /// Also return the Markdown rendering
    #[serde(default)]
    pub markdown: bool,
}

#[derive(Debug, Deserialize)]
pub struct CompatibilityRequest {
    pub plants: Vec<String>,
    pub language: Option<String>,
    #[serde(default)]
    pub markdown: bool,
}

fn parse_language(raw: Option<&str>, default: Language) -> Result<Language, AppError> {
    match raw {
        Some(s) => s.parse().map_err(|e: AdvisorError| AppError::BadRequest(e.to_string())),
        None => Ok(default),
    }
}

fn with_markdown(result: RecommendationResult, markdown: bool) -> Result<serde_json::Value, AppError> {
    let rendered = markdown.then(|| MarkdownFormatter::format(&result));
    let mut body = serde_json::to_value(&result)
        .map_err(|e| AppError::Internal(format!("Serialization error: {}", e)))?;
    if let (Some(md), Some(obj)) = (rendered, body.as_object_mut()) {
        obj.insert("markdown".to_string(), serde_json::Value::String(md));
    }
    Ok(body)
}

// ============================================================================
// Endpoint Handlers
// ============================================================================

async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "crops": state.engine.classifier().n_classes(),
        "plants": state.engine.rules().len(),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// POST /api/recommend
async fn recommend(
    State(state): State<AppState>,
    Json(payload): Json<RecommendRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let language = parse_language(payload.language.as_deref(), state.engine.language())?;
    let features = FeatureVector::from_json(&payload.features)?;
    let engine = state.engine.clone();
    let seed = payload.seed.or(engine.explainer_seed());

    // CPU-bound work: run in blocking thread pool
    let result = tokio::task::spawn_blocking(move || engine.recommend_seeded(&features, seed, language))
        .await
        .map_err(|e| AppError::Internal(format!("Task join error: {}", e)))??;

    tracing::info!("Recommended '{}'", result.crop().unwrap_or_default());
    Ok(Json(with_markdown(result, payload.markdown)?))
}

/// POST /api/compatibility
async fn check_compatibility(
    State(state): State<AppState>,
    Json(payload): Json<CompatibilityRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let language = parse_language(payload.language.as_deref(), state.engine.language())?;
    let result = state.engine.check_compatibility_in(&payload.plants, language);
    Ok(Json(with_markdown(result, payload.markdown)?))
}

/// GET /api/plants
async fn list_plants(State(state): State<AppState>) -> impl IntoResponse {
    let rules = state.engine.rules();
    Json(serde_json::json!({
        "count": rules.len(),
        "plants": rules.plant_names(),
        "display_names": rules.display_names(),
    }))
}

/// GET /api/plants/:name?lang=French
async fn get_plant(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<LanguageQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let language = parse_language(query.lang.as_deref(), state.engine.language())?;
    match state.engine.lookup_plant(&name) {
        PlantLookup::Found(rule) => Ok(Json(plant_json(rule, language))),
        PlantLookup::NotFound => Err(AppError::NotFound(format!("Plant {} not found", name.trim()))),
    }
}

fn plant_json(rule: &PlantRule, language: Language) -> serde_json::Value {
    serde_json::json!({
        "plant": rule.plant,
        "display_name": rule.display_name(),
        "companions": rule.companions,
        "avoid": rule.avoid,
        "sensors": rule.sensors,
        "notes": rule.notes_in(language),
    })
}

/// GET /api/sensor-preset
async fn sensor_preset() -> impl IntoResponse {
    let preset = FeatureVector::sensor_preset();
    let ranges: serde_json::Map<String, serde_json::Value> = Feature::ALL
        .iter()
        .map(|f| {
            let (min, max) = f.declared_range();
            (
                f.code().to_string(),
                serde_json::json!({ "min": min, "max": max, "unit": f.unit() }),
            )
        })
        .collect();
    Json(serde_json::json!({
        "features": preset,
        "ranges": ranges,
    }))
}

// ============================================================================
// Error Handling
// ============================================================================

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    NotFound(String),
    Internal(String),
}

impl From<AdvisorError> for AppError {
    fn from(err: AdvisorError) -> Self {
        match err {
            AdvisorError::Validation(_) => AppError::BadRequest(err.to_string()),
            AdvisorError::NotFound(name) => AppError::NotFound(format!("Plant {} not found", name)),
            AdvisorError::Configuration(_) => AppError::Internal(err.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(serde_json::json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
