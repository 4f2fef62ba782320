//! Route definitions for the control API

use axum::{
    routing::{get, post},
    Router,
};
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::HttpConfig;
use crate::AppState;

use super::api;

/// Create the main router with all routes
pub fn create_router(app_state: Arc<AppState>, config: &HttpConfig, assets_dir: &Path) -> Router {
    let cors = if config.cors_enabled {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        CorsLayer::new()
    };

    Router::new()
        // API endpoints (JSON)
        .route("/api/status", get(api::get_status))
        .route("/api/tasks", get(api::list_tasks))
        .route("/api/animation", post(api::change_animation))
        .route("/api/click", post(api::click))
        // SSE stream for the viewer
        .route("/api/stream", get(api::status_stream))
        // Mesh and clips for the browser viewer
        .nest_service("/assets", ServeDir::new(assets_dir))
        // Static files
        .nest_service("/static", ServeDir::new(&config.static_dir))
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::config_with_assets;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn router(dir: &TempDir) -> (Arc<AppState>, Router) {
        let config = config_with_assets(dir.path());
        let http = config.http.clone();
        let assets_dir = config.animation.assets_dir.clone();
        let state = AppState::new(config);
        let router = create_router(Arc::clone(&state), &http, &assets_dir);
        (state, router)
    }

    async fn send(router: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_status_endpoint() {
        let dir = TempDir::new().unwrap();
        let (_state, router) = router(&dir);

        let (status, json) =
            send(router, Request::get("/api/status").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["phase"], "idle");
        assert_eq!(json["data"]["actions"], 0);
        assert_eq!(json["data"]["version"], crate::VERSION);
    }

    #[tokio::test]
    async fn test_tasks_endpoint_lists_catalog() {
        let dir = TempDir::new().unwrap();
        let (_state, router) = router(&dir);

        let (_, json) =
            send(router, Request::get("/api/tasks").body(Body::empty()).unwrap()).await;
        let tasks = json["data"].as_array().unwrap();
        assert_eq!(tasks.len(), 5);
        assert_eq!(tasks[3]["task"], "task");
        assert_eq!(tasks[3]["clips"][2], "typing.glb");
        assert_eq!(tasks[3]["loop_last"], true);
        assert_eq!(tasks[4]["task"], "stop-task");
        assert_eq!(tasks[4]["loop_last"], false);
    }

    #[tokio::test]
    async fn test_change_animation_plays_task() {
        let dir = TempDir::new().unwrap();
        let (state, router) = router(&dir);
        let mut status_rx = state.sequencer.subscribe();

        let (_, json) = send(router, post_json("/api/animation", r#"{"task":"Laugh"}"#)).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["task"], "laugh");

        let status = status_rx.recv().await.unwrap();
        assert_eq!(status.task, Some(crate::animation::TaskName::Laugh));
        assert_eq!(status.clip.unwrap().as_str(), "laugh.gltf");
    }

    #[tokio::test]
    async fn test_unknown_animation_rejected() {
        let dir = TempDir::new().unwrap();
        let (state, router) = router(&dir);

        let (status, json) = send(router, post_json("/api/animation", r#"{"task":"dance"}"#)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["success"], false);
        assert!(json["error"].as_str().unwrap().contains("dance"));
        assert_eq!(state.sequencer.status().await.generation, 0);
    }

    #[tokio::test]
    async fn test_click_advances_cycle() {
        let dir = TempDir::new().unwrap();
        let (_state, router) = router(&dir);

        let (_, first) = send(router.clone(), post_json("/api/click", "")).await;
        let (_, second) = send(router, post_json("/api/click", "")).await;
        assert_eq!(first["data"]["task"], "angry");
        assert_eq!(second["data"]["task"], "laugh");
    }

    #[tokio::test]
    async fn test_assets_served() {
        let dir = TempDir::new().unwrap();
        let (_state, router) = router(&dir);

        let response = router
            .oneshot(Request::get("/assets/talk.gltf").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(bytes, crate::test_utils::ANIMATED_GLTF.as_bytes());
    }
}
