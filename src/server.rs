//! The high-score service the game syncs with.
//!
//! `GET /api/highscore` reports the best score; `POST /api/highscore` with
//! `{"score": n}` offers a new one and answers with the best after the
//! offer.

use crate::persist::{HighScoreBody, PersistError, ScoreStore};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::Mutex;

pub type SharedState = Arc<AppState>;

/// Server side state: the score store, one request at a time
pub struct AppState {
    store: Mutex<Box<dyn ScoreStore + Send>>,
}

impl AppState {
    pub fn new(store: Box<dyn ScoreStore + Send>) -> SharedState {
        Arc::new(Self {
            store: Mutex::new(store),
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid score")]
    InvalidScore,
    #[error("Failed to get high score")]
    Read(#[source] PersistError),
    #[error("Failed to update high score")]
    Write(#[source] PersistError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidScore => StatusCode::BAD_REQUEST,
            ApiError::Read(_) | ApiError::Write(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Read(e) | ApiError::Write(e) => log::error!("{self}: {e}"),
            ApiError::InvalidScore => log::debug!("rejected score submission"),
        }
        (self.status(), Json(json!({ "message": self.to_string() }))).into_response()
    }
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/api/highscore", get(get_high_score).post(post_high_score))
        .with_state(state)
}

/// Scores at or above 2^63 do not fit the sqlite INTEGER column
const SCORE_LIMIT: f64 = 9_223_372_036_854_775_808.0;

/// A usable score is a finite, non-negative JSON number below 2^63.
/// Fractions are truncated.
pub fn parse_score(payload: &Value) -> Option<u64> {
    let score = payload.get("score")?.as_f64()?;
    if score.is_finite() && (0.0..SCORE_LIMIT).contains(&score) {
        Some(score.trunc() as u64)
    } else {
        None
    }
}

pub async fn get_high_score(
    State(state): State<SharedState>,
) -> Result<Json<HighScoreBody>, ApiError> {
    let store = state.store.lock().await;
    let high_score = store.high_score().map_err(ApiError::Read)?;

    Ok(Json(HighScoreBody { high_score }))
}

pub async fn post_high_score(
    State(state): State<SharedState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<HighScoreBody>, ApiError> {
    let Json(payload) = payload.map_err(|_| ApiError::InvalidScore)?;
    let score = parse_score(&payload).ok_or(ApiError::InvalidScore)?;

    let store = state.store.lock().await;
    let high_score = store.record(score).map_err(ApiError::Write)?;
    log::info!("score {score} offered, high score is {high_score}");

    Ok(Json(HighScoreBody { high_score }))
}
