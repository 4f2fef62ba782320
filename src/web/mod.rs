//! Web control module
//!
//! JSON API, SSE status stream and static serving for the browser viewer.

pub mod api;
pub mod routes;
pub mod sse;

use axum::Router;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{Config, HttpConfig};
use crate::AppState;

/// Web server for the control API and viewer assets
pub struct WebServer {
    app_state: Arc<AppState>,
    config: HttpConfig,
    assets_dir: PathBuf,
}

impl WebServer {
    /// Create a new web server
    pub fn new(app_state: Arc<AppState>, config: &Config) -> Self {
        Self {
            app_state,
            config: config.http.clone(),
            assets_dir: config.animation.assets_dir.clone(),
        }
    }

    /// Build the router
    pub fn router(&self) -> Router {
        routes::create_router(Arc::clone(&self.app_state), &self.config, &self.assets_dir)
    }
}
