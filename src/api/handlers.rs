//! HTTP request handlers

use super::sse::sse_stream;
use super::types::{
    CommitTagRequest, ContentResponse, ErrorResponse, PromptRequest, QueryRequest,
    ReportResponse, SelectNodeRequest, SelectStageRequest, SelectStepRequest, SessionResponse,
    SuccessResponse,
};
use super::AppState;
use crate::runtime::SessionError;
use crate::state_machine::TransitionError;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Read models
        .route("/api/content", get(get_content))
        .route("/api/report", get(get_report))
        .route("/api/session", get(get_session))
        .route("/api/session/stream", get(stream_session))
        // Selection hierarchy
        .route("/api/selection/stage", post(select_stage))
        .route("/api/selection/step", post(select_step))
        .route("/api/selection/node", post(select_node))
        .route("/api/selection/node/close", post(deselect_node))
        // Tag editing
        .route("/api/tags/:tag_id/edit", post(toggle_tag_edit))
        .route("/api/tags/:tag_id/commit", post(commit_tag_edit))
        // Report conversation
        .route("/api/query/input", post(set_query_input))
        .route("/api/query", post(submit_query))
        .route("/api/query/cancel", post(cancel_query))
        // Tag generation
        .route("/api/nodes/:node_id/prompt", post(submit_prompt))
        .route("/api/nodes/:node_id/prompt/cancel", post(cancel_prompt))
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Read models
// ============================================================

async fn get_content(State(state): State<AppState>) -> Json<ContentResponse> {
    Json(ContentResponse {
        stages: state.session.snapshot().tree.clone(),
    })
}

async fn get_report(State(state): State<AppState>) -> Json<ReportResponse> {
    let report = state.report.as_ref().clone();
    let highlights = report.highlights();
    Json(ReportResponse { report, highlights })
}

async fn get_session(State(state): State<AppState>) -> Json<SessionResponse> {
    Json(SessionResponse::from(state.session.snapshot().as_ref()))
}

async fn stream_session(State(state): State<AppState>) -> impl IntoResponse {
    // Subscribe first; the stream drops updates the snapshot already holds
    let broadcast_rx = state.session.subscribe();
    let init = SessionResponse::from(state.session.snapshot().as_ref());
    sse_stream(init, broadcast_rx)
}

// ============================================================
// Selection
// ============================================================

async fn select_stage(
    State(state): State<AppState>,
    Json(req): Json<SelectStageRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    state.session.select_stage(req.stage_id).await?;
    Ok(session_response(&state))
}

async fn select_step(
    State(state): State<AppState>,
    Json(req): Json<SelectStepRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    state.session.select_step(req.step_id).await?;
    Ok(session_response(&state))
}

async fn select_node(
    State(state): State<AppState>,
    Json(req): Json<SelectNodeRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    state.session.select_node(req.node_id).await?;
    Ok(session_response(&state))
}

async fn deselect_node(State(state): State<AppState>) -> Result<Json<SessionResponse>, AppError> {
    state.session.deselect_node().await?;
    Ok(session_response(&state))
}

// ============================================================
// Tag editing
// ============================================================

async fn toggle_tag_edit(
    State(state): State<AppState>,
    Path(tag_id): Path<String>,
) -> Result<Json<SessionResponse>, AppError> {
    state.session.begin_edit_tag(tag_id).await?;
    Ok(session_response(&state))
}

async fn commit_tag_edit(
    State(state): State<AppState>,
    Path(tag_id): Path<String>,
    Json(req): Json<CommitTagRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    state.session.commit_tag_edit(tag_id, req.description).await?;
    Ok(session_response(&state))
}

// ============================================================
// Report conversation
// ============================================================

async fn set_query_input(
    State(state): State<AppState>,
    Json(req): Json<QueryRequest>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.session.set_query_input(req.text).await?;
    Ok(Json(SuccessResponse::ok()))
}

/// Accepts the query; the reply arrives over the SSE stream
async fn submit_query(
    State(state): State<AppState>,
    Json(req): Json<QueryRequest>,
) -> Result<(StatusCode, Json<SuccessResponse>), AppError> {
    state.session.submit_query(req.text).await?;
    Ok((StatusCode::ACCEPTED, Json(SuccessResponse::ok())))
}

async fn cancel_query(State(state): State<AppState>) -> Result<Json<SuccessResponse>, AppError> {
    state.session.cancel_reveal().await?;
    Ok(Json(SuccessResponse::ok()))
}

// ============================================================
// Tag generation
// ============================================================

async fn submit_prompt(
    State(state): State<AppState>,
    Path(node_id): Path<String>,
    Json(req): Json<PromptRequest>,
) -> Result<(StatusCode, Json<SuccessResponse>), AppError> {
    state.session.submit_prompt(req.prompt, node_id).await?;
    Ok((StatusCode::ACCEPTED, Json(SuccessResponse::ok())))
}

async fn cancel_prompt(
    State(state): State<AppState>,
    Path(node_id): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.session.cancel_tag_generation(node_id).await?;
    Ok(Json(SuccessResponse::ok()))
}

async fn get_version() -> &'static str {
    concat!("review-pulse ", env!("CARGO_PKG_VERSION"))
}

fn session_response(state: &AppState) -> Json<SessionResponse> {
    Json(SessionResponse::from(state.session.snapshot().as_ref()))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    Unprocessable(String),
    Unavailable(String),
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        let message = err.to_string();
        match err {
            SessionError::Rejected(e) => match e {
                TransitionError::InvalidSelection(_) => AppError::BadRequest(message),
                TransitionError::NotFound(_) => AppError::NotFound(message),
                TransitionError::Busy(_) | TransitionError::InvalidTransition(_) => {
                    AppError::Conflict(message)
                }
                TransitionError::EmptyInput => AppError::Unprocessable(message),
            },
            SessionError::Closed => AppError::Unavailable(message),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Unprocessable(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            AppError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
