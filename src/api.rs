use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::debuts::export::{EXPORT_CONTENT_TYPE, EXPORT_FILE_NAME};
use crate::debuts::{DebutTable, FilterSelection};
use crate::error::DashboardError;
use crate::services::dashboard_service::{self, DashboardAction, DashboardView};
use crate::services::{AuthService, DatasetKey, DatasetService, SessionState, SessionStore};

#[derive(Clone)]
pub struct AppState {
    pub dataset_service: DatasetService,
    pub auth_service: AuthService,
    pub sessions: SessionStore,
    pub dataset_key: DatasetKey,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub session_id: Uuid,
    pub message: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health))
        .route("/sessions", post(login))
        .route("/sessions/{session_id}", delete(logout))
        .route("/sessions/{session_id}/dashboard", get(show_dashboard))
        .route("/sessions/{session_id}/filters", post(select_filters))
        .route("/sessions/{session_id}/run", post(run_filters))
        .route("/sessions/{session_id}/clear", post(clear_filters))
        .route("/sessions/{session_id}/reload", post(reload_dataset))
        .route("/sessions/{session_id}/export", get(export_table))
        .with_state(state);

    Router::new().nest("/api/v1", api_routes)
}

fn status_for(err: &DashboardError) -> StatusCode {
    match err {
        DashboardError::Configuration(_) | DashboardError::Export(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        DashboardError::Authentication => StatusCode::UNAUTHORIZED,
        DashboardError::Download(_) | DashboardError::Parse(_) => StatusCode::BAD_GATEWAY,
        DashboardError::SessionNotFound(_) => StatusCode::NOT_FOUND,
        DashboardError::NotRun => StatusCode::CONFLICT,
        DashboardError::EmptyExport => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

fn api_error(err: DashboardError) -> ApiError {
    let status = status_for(&err);
    let message = if err.is_load_failure() {
        format!("Failed to load data. {err}")
    } else {
        err.to_string()
    };
    (status, Json(ErrorResponse { error: message }))
}

#[instrument(skip(_state))]
async fn health(State(_state): State<AppState>) -> impl IntoResponse {
    debug!("Health check requested");
    let response = HealthResponse {
        status: "healthy".to_string(),
    };
    (StatusCode::OK, Json(response))
}

#[instrument(skip(state, request), fields(username = %request.username))]
async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<(StatusCode, Json<LoginResponse>), ApiError> {
    let authenticated = state
        .auth_service
        .authenticate(&request.username, &request.password)
        .map_err(|e| api_error(DashboardError::Configuration(e.to_string())))?;

    if !authenticated {
        return Err(api_error(DashboardError::Authentication));
    }

    let session_id = state
        .sessions
        .create(SessionState::authenticated(request.username));
    info!("Opened session {}", session_id);

    Ok((
        StatusCode::CREATED,
        Json(LoginResponse {
            session_id,
            message: "Login successful!".to_string(),
        }),
    ))
}

#[instrument(skip(state))]
async fn logout(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    match state.sessions.remove(&session_id) {
        Some(_) => {
            info!("Closed session {}", session_id);
            Ok(StatusCode::NO_CONTENT)
        }
        None => Err(api_error(DashboardError::SessionNotFound(
            session_id.to_string(),
        ))),
    }
}

#[instrument(skip(state))]
async fn show_dashboard(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<DashboardView>, ApiError> {
    apply_action(&state, session_id, DashboardAction::Show).await
}

#[instrument(skip(state, selection))]
async fn select_filters(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(selection): Json<FilterSelection>,
) -> Result<Json<DashboardView>, ApiError> {
    apply_action(&state, session_id, DashboardAction::Select(selection)).await
}

#[instrument(skip(state, selection))]
async fn run_filters(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(selection): Json<FilterSelection>,
) -> Result<Json<DashboardView>, ApiError> {
    debug!("Running filters: {:?}", selection);
    apply_action(&state, session_id, DashboardAction::Run(selection)).await
}

#[instrument(skip(state))]
async fn clear_filters(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<DashboardView>, ApiError> {
    apply_action(&state, session_id, DashboardAction::Clear).await
}

/// Drop the cached workbook and load it again
#[instrument(skip(state))]
async fn reload_dataset(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<DashboardView>, ApiError> {
    session_for(&state, &session_id)?;
    state.dataset_service.invalidate(&state.dataset_key).await;
    apply_action(&state, session_id, DashboardAction::Show).await
}

#[instrument(skip(state))]
async fn export_table(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let session = session_for(&state, &session_id)?;
    let table = load_table(&state).await?;

    let bytes = dashboard_service::export(&session, &table).map_err(|e| {
        warn!("Export refused for session {}: {}", session_id, e);
        api_error(e)
    })?;
    info!("Exported {} bytes for session {}", bytes.len(), session_id);

    let headers = [
        (header::CONTENT_TYPE, EXPORT_CONTENT_TYPE.to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{EXPORT_FILE_NAME}\""),
        ),
    ];
    Ok((headers, bytes))
}

async fn apply_action(
    state: &AppState,
    session_id: Uuid,
    action: DashboardAction,
) -> Result<Json<DashboardView>, ApiError> {
    session_for(state, &session_id)?;
    let table = load_table(state).await?;

    // Render against the state as it is now, not as it was before the load
    let view = state
        .sessions
        .update(&session_id, |session| {
            dashboard_service::render(session, action, &table)
        })
        .ok_or_else(|| {
            warn!("Session {} ended while loading", session_id);
            api_error(DashboardError::SessionNotFound(session_id.to_string()))
        })?;
    Ok(Json(view))
}

fn session_for(state: &AppState, session_id: &Uuid) -> Result<SessionState, ApiError> {
    let session = state.sessions.get(session_id).ok_or_else(|| {
        warn!("Session {} not found", session_id);
        api_error(DashboardError::SessionNotFound(session_id.to_string()))
    })?;

    if !session.authenticated {
        return Err(api_error(DashboardError::Authentication));
    }
    Ok(session)
}

async fn load_table(state: &AppState) -> Result<Arc<DebutTable>, ApiError> {
    state
        .dataset_service
        .load(&state.dataset_key)
        .await
        .map_err(|e| {
            error!("Failed to load data: {}", e);
            api_error(e)
        })
}
