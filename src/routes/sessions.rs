use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;

use crate::extractors::{JsonBody, SessionId};
use crate::response::{created, ok, AppError};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_session).get(list_sessions))
        .route("/:id", get(get_session).delete(delete_session))
        .route("/:id/samples", post(observe_sample))
        .route("/:id/landmarks", post(observe_landmarks))
        .route("/:id/reset", post(reset_session))
        .route("/:id/tick", post(tick_session))
        .route("/:id/windows", get(list_windows))
}

/// `value: null` (or omitted) means the frame had no detectable face.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleRequest {
    #[serde(default)]
    pub value: Option<f64>,
}

/// Flat `[x0, y0, x1, y1, ...]` face-mesh landmarks; `null` when no face was found.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LandmarksRequest {
    #[serde(default)]
    pub landmarks: Option<Vec<f64>>,
}

async fn create_session(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let view = state.monitor().create_session().await?;
    Ok(created(view))
}

async fn list_sessions(State(state): State<AppState>) -> impl IntoResponse {
    ok(state.monitor().list().await)
}

async fn get_session(
    State(state): State<AppState>,
    SessionId(id): SessionId,
) -> Result<impl IntoResponse, AppError> {
    Ok(ok(state.monitor().snapshot(id).await?))
}

async fn delete_session(
    State(state): State<AppState>,
    SessionId(id): SessionId,
) -> Result<StatusCode, AppError> {
    state.monitor().remove(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn observe_sample(
    State(state): State<AppState>,
    SessionId(id): SessionId,
    JsonBody(req): JsonBody<SampleRequest>,
) -> Result<impl IntoResponse, AppError> {
    let observation = state.monitor().observe(id, req.value).await?;
    Ok(ok(observation))
}

async fn observe_landmarks(
    State(state): State<AppState>,
    SessionId(id): SessionId,
    JsonBody(req): JsonBody<LandmarksRequest>,
) -> Result<impl IntoResponse, AppError> {
    let observation = state
        .monitor()
        .observe_landmarks(id, req.landmarks.as_deref())
        .await?;
    Ok(ok(observation))
}

async fn reset_session(
    State(state): State<AppState>,
    SessionId(id): SessionId,
) -> Result<impl IntoResponse, AppError> {
    Ok(ok(state.monitor().reset(id).await?))
}

async fn tick_session(
    State(state): State<AppState>,
    SessionId(id): SessionId,
) -> Result<impl IntoResponse, AppError> {
    Ok(ok(state.monitor().tick(id).await?))
}

async fn list_windows(
    State(state): State<AppState>,
    SessionId(id): SessionId,
) -> Result<impl IntoResponse, AppError> {
    Ok(ok(state.monitor().windows(id).await?))
}
