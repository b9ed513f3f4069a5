//! HTTP surface of the step counter: each route renders one screen.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::debug_handler;
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, put},
};
use chrono::Utc;
use serde::Deserialize;
use step_counter_core::Sample;
use step_counter_core::calendar::parse_date;
use step_counter_core::fetch::{FetchState, ScreenFetch, activate_day, activate_week};
use step_counter_core::goal::save_goal_input;
use tower_http::timeout::TimeoutLayer;

pub mod error;
pub mod screens;
pub mod state;

use error::{AppError, AppResult};
use screens::{DetailScreen, GoalInput, HomeScreen, SettingsScreen, ViewMode};
pub use state::{AppState, DEFAULT_SCREEN_WAIT, LoadStatus};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_ADDRESS: ([u8; 4], u16) = ([127, 0, 0, 1], 3000);

/// Log filter from `STEP_COUNTER_LOG_LEVEL`, then `RUST_LOG`, then `info`.
pub fn log_filter<F>(mut get: F) -> String
where
    F: FnMut(&str) -> Option<String>,
{
    get("STEP_COUNTER_LOG_LEVEL")
        .or_else(|| get("RUST_LOG"))
        .unwrap_or_else(|| "info".to_string())
}

/// Parsed filter, falling back to `info` when the directives are invalid.
pub fn env_filter(directives: &str) -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::try_new(directives)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
}

/// Listen address from `ADDRESS`, default `127.0.0.1:3000`.
pub fn bind_addr<F>(mut get: F) -> SocketAddr
where
    F: FnMut(&str) -> Option<String>,
{
    get("ADDRESS")
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or_else(|| SocketAddr::from(DEFAULT_ADDRESS))
}

/// Wait up to `wait` for a screen's data; a slower request renders as pending.
async fn settle(mut fetch: ScreenFetch<Vec<Sample>>, wait: Duration) -> FetchState<Vec<Sample>> {
    let settled = tokio::time::timeout(wait, fetch.settled()).await;
    match settled {
        Ok(state) => state,
        Err(_) => {
            tracing::debug!(?wait, "screen data still loading");
            fetch.state()
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct HomeQuery {
    #[serde(default)]
    pub mode: ViewMode,
}

#[debug_handler]
async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

#[debug_handler]
async fn metrics_endpoint(State(state): State<Arc<AppState>>) -> Response {
    match &state.metrics {
        Some(handle) => ([("content-type", "text/plain; version=0.0.4")], handle.render()).into_response(),
        None => (StatusCode::NOT_FOUND, "metrics disabled").into_response(),
    }
}

#[debug_handler]
async fn home(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HomeQuery>,
) -> AppResult<Json<HomeScreen>> {
    let fetch = activate_week(state.source.clone(), state.days_back);
    let loaded = settle(fetch, state.screen_wait).await;
    let screen = screens::home_screen(
        &loaded,
        state.current_goal().await,
        &state.calendar,
        Utc::now(),
        query.mode,
    )?;
    Ok(Json(screen))
}

#[debug_handler]
async fn day_detail(
    State(state): State<Arc<AppState>>,
    Path(date): Path<String>,
) -> AppResult<Json<DetailScreen>> {
    let date = parse_date(&date).ok_or(AppError::InvalidDate(date))?;
    let fetch = activate_day(state.source.clone(), date);
    let loaded = settle(fetch, state.screen_wait).await;
    Ok(Json(screens::detail_screen(
        date,
        &loaded,
        state.current_goal().await,
        &state.calendar,
    )))
}

#[debug_handler]
async fn settings(State(state): State<Arc<AppState>>) -> Json<SettingsScreen> {
    Json(SettingsScreen {
        goal: state.current_goal().await.get(),
    })
}

#[debug_handler]
async fn save_goal(
    State(state): State<Arc<AppState>>,
    Json(input): Json<GoalInput>,
) -> AppResult<Json<SettingsScreen>> {
    let goals = state.goals.clone();
    let goal = tokio::task::spawn_blocking(move || save_goal_input(goals.as_ref(), &input.goal))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;
    Ok(Json(SettingsScreen { goal: goal.get() }))
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics_endpoint))
        .route("/home", get(home))
        .route("/days/{date}", get(day_detail))
        .route("/settings", get(settings))
        .route("/settings/goal", put(save_goal))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            REQUEST_TIMEOUT,
        ))
        .with_state(state)
}
