//! API routes for storytimed

use crate::server::AppState;
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use storytime_common::{
    CharacterEntry, ErrorBody, GenerateRequest, HealthResponse, NewStory, ParentalSettings,
    SettingsUpdate, Story, StoryError, StoryTypeEntry, CHARACTERS, STORY_TYPES, VERSION,
};
use tracing::{error, info, warn};

type AppStateArc = Arc<AppState>;

/// Error returned by every handler, rendered as `{"message": ...}`.
#[derive(Debug)]
pub struct ApiError(pub StoryError);

impl From<StoryError> for ApiError {
    fn from(err: StoryError) -> Self {
        ApiError(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError(StoryError::InvalidInput(format!(
            "Invalid request body: {}",
            rejection.body_text()
        )))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError(StoryError::InvalidInput(format!(
            "Invalid story id: {}",
            rejection.body_text()
        )))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError(StoryError::InvalidInput(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            error!("[API] {}", self.0);
        }
        (status, Json(ErrorBody::new(self.0.public_message()))).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

// ============================================================================
// Story Routes
// ============================================================================

pub fn story_routes() -> Router<AppStateArc> {
    Router::new()
        .route("/stories", get(list_stories))
        .route("/stories/generate", post(generate_story))
        .route("/stories/:id", get(get_story))
        .route("/stories/:id/save", patch(toggle_saved))
}

/// Trimmed value, or None when absent or blank.
fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Untouched value, or None when absent or blank.
fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

async fn generate_story(
    State(state): State<AppStateArc>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> ApiResult<Story> {
    let Json(req) = payload.map_err(|rejection| {
        warn!("[API] Rejected generate body: {}", rejection.body_text());
        ApiError::from(rejection)
    })?;
    info!(
        "[API] Generate request: character={:?} storyType={:?} userPrompt={:?}",
        req.character, req.story_type, req.user_prompt
    );

    let (character, story_type) = match (present(req.character), present(req.story_type)) {
        (Some(c), Some(t)) => (c, t),
        _ => {
            warn!("[API] Missing required fields");
            return Err(StoryError::InvalidInput(
                "Character and story type are required".to_string(),
            )
            .into());
        }
    };
    let user_prompt = non_blank(req.user_prompt);

    // No lock is held while the provider is working
    let generated = state
        .generator
        .generate(&character, &story_type, user_prompt.as_deref())
        .await;

    let draft = NewStory::new(generated.title, generated.content, character, story_type)
        .with_user_prompt(user_prompt)
        .with_image_url(Some(generated.image_url));

    let story = state.store.write().await.create_story(draft);
    info!("[API] Story {} saved: \"{}\"", story.id, story.title);
    Ok(Json(story))
}

#[derive(Debug, Default, Deserialize)]
struct ListQuery {
    #[serde(default)]
    saved: Option<bool>,
}

async fn list_stories(
    State(state): State<AppStateArc>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> ApiResult<Vec<Story>> {
    let Query(query) = query?;
    let store = state.store.read().await;

    let stories = match query.saved {
        Some(true) => store.list_saved_stories(),
        Some(false) => store
            .list_stories()
            .into_iter()
            .filter(|s| !s.is_saved)
            .collect(),
        None => store.list_stories(),
    };
    Ok(Json(stories))
}

async fn get_story(
    State(state): State<AppStateArc>,
    id: Result<Path<u64>, PathRejection>,
) -> ApiResult<Story> {
    let Path(id) = id?;
    let store = state.store.read().await;
    store
        .get_story(id)
        .cloned()
        .map(Json)
        .ok_or_else(|| StoryError::NotFound(id).into())
}

/// The request body, if any, is ignored.
async fn toggle_saved(
    State(state): State<AppStateArc>,
    id: Result<Path<u64>, PathRejection>,
) -> ApiResult<Story> {
    let Path(id) = id?;
    let story = state.store.write().await.toggle_saved(id).map_err(|e| {
        warn!("[API] Toggle save failed for story {}: {}", id, e);
        e
    })?;
    info!("[API] Story {} saved={}", story.id, story.is_saved);
    Ok(Json(story))
}

// ============================================================================
// Parental Settings Routes
// ============================================================================

pub fn settings_routes() -> Router<AppStateArc> {
    Router::new().route(
        "/parental-settings",
        get(get_settings).post(update_settings),
    )
}

async fn get_settings(State(state): State<AppStateArc>) -> Json<ParentalSettings> {
    Json(state.store.read().await.settings().clone())
}

async fn update_settings(
    State(state): State<AppStateArc>,
    payload: Result<Json<SettingsUpdate>, JsonRejection>,
) -> ApiResult<ParentalSettings> {
    let Json(update) = payload.map_err(|rejection| {
        warn!("[API] Rejected settings body: {}", rejection.body_text());
        ApiError::from(rejection)
    })?;

    let settings = state.store.write().await.update_settings(update);
    info!(
        "[API] Parental settings updated: ageGroup={} dailyTimeLimit={} storiesPerDay={}",
        settings.age_group, settings.daily_time_limit, settings.stories_per_day
    );
    Ok(Json(settings))
}

// ============================================================================
// Catalog Routes
// ============================================================================

pub fn catalog_routes() -> Router<AppStateArc> {
    Router::new()
        .route("/characters", get(list_characters))
        .route("/story-types", get(list_story_types))
}

async fn list_characters() -> Json<&'static [CharacterEntry]> {
    Json(&CHARACTERS[..])
}

async fn list_story_types() -> Json<&'static [StoryTypeEntry]> {
    Json(&STORY_TYPES[..])
}

// ============================================================================
// Health Routes
// ============================================================================

pub fn health_routes() -> Router<AppStateArc> {
    Router::new().route("/health", get(health_check))
}

async fn health_check(State(state): State<AppStateArc>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: VERSION.to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        story_count: state.store.read().await.story_count(),
    })
}
