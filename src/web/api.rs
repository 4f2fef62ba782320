//! REST API endpoints

use axum::{extract::State, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::sse;
use crate::animation::{ClipRef, SequencerStatus, TaskName};
use crate::AppState;

/// API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }

    pub fn error(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            success: false,
            data: None,
            error: Some(message.into()),
        })
    }
}

/// Status response
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    #[serde(flatten)]
    pub status: SequencerStatus,
    /// Actions currently held by the mixer, including ones fading out
    pub actions: usize,
    pub version: String,
}

/// Get current sequencer status
pub async fn get_status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let status = state.sequencer.status().await;
    let actions = state.sequencer.mixer().lock().await.len();

    ApiResponse::success(StatusResponse {
        status,
        actions,
        version: crate::VERSION.to_string(),
    })
}

/// One entry of the task catalog
#[derive(Debug, Serialize)]
pub struct TaskInfo {
    pub task: TaskName,
    pub clips: Vec<ClipRef>,
    pub loop_last: bool,
}

/// List the task catalog
pub async fn list_tasks(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let tasks: Vec<TaskInfo> = state
        .sequencer
        .catalog()
        .iter()
        .map(|(task, plan)| TaskInfo {
            task,
            clips: plan.clips.clone(),
            loop_last: plan.loop_last,
        })
        .collect();

    ApiResponse::success(tasks)
}

/// Animation change request
#[derive(Debug, Deserialize)]
pub struct AnimationRequest {
    pub task: String,
}

/// Accepted task
#[derive(Debug, Serialize)]
pub struct AnimationAccepted {
    pub task: TaskName,
}

/// Request a task; playback continues in the background
pub async fn change_animation(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AnimationRequest>,
) -> impl IntoResponse {
    match state.change_animation(&request.task) {
        Ok(task) => ApiResponse::success(AnimationAccepted { task }),
        Err(e) => ApiResponse::error(e.to_string()),
    }
}

/// Advance the click cycle
pub async fn click(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.click() {
        Some(task) => ApiResponse::success(AnimationAccepted { task }),
        None => ApiResponse::error("Click cycle is empty"),
    }
}

/// SSE stream endpoint
pub async fn status_stream(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    sse::create_status_stream(state)
}
