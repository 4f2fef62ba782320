//! Motiontuber - Headless Avatar Motion Service
//!
//! Drives the skeletal animations of a browser-rendered 3D avatar:
//! - Loads animation clips from glTF/GLB assets on demand
//! - Cross-fades between clips in a per-frame mixer
//! - Chains clips into composite gestures (sit, type, stand up)
//! - Exposes an HTTP control API with an SSE status stream

pub mod animation;
pub mod config;
pub mod error;
pub mod web;

#[cfg(test)]
pub(crate) mod test_utils;

pub use config::Config;
pub use error::{MotiontuberError, Result};

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex, RwLock};

use animation::{GltfClipSource, Mixer, Sequencer, TaskCatalog, TaskName};
use error::AnimationError;

/// Sequencer backed by glTF assets on disk
pub type AvatarSequencer = Sequencer<GltfClipSource>;

/// Application state shared across all components
pub struct AppState {
    /// Current configuration
    pub config: RwLock<Config>,
    /// The one sequencer of this avatar
    pub sequencer: Arc<AvatarSequencer>,
    /// Shutdown signal
    pub shutdown_tx: broadcast::Sender<()>,
    /// Tasks cycled through by clicks
    click_cycle: Vec<TaskName>,
    /// Position in the click cycle
    click_index: AtomicUsize,
}

impl AppState {
    /// Create a new application state with the given configuration
    pub fn new(config: Config) -> Arc<Self> {
        let (shutdown_tx, _) = broadcast::channel(1);

        let mixer = Arc::new(Mutex::new(Mixer::new()));
        let source = GltfClipSource::from_config(&config.animation);
        let catalog = TaskCatalog::from_config(&config.tasks);
        let sequencer = Sequencer::new(source, catalog, mixer, &config.animation);
        let click_cycle = config.animation.click_cycle.clone();

        Arc::new(Self {
            config: RwLock::new(config),
            sequencer: Arc::new(sequencer),
            shutdown_tx,
            click_cycle,
            click_index: AtomicUsize::new(0),
        })
    }

    /// Request a task in the background and return immediately.
    ///
    /// Unknown names are rejected before anything is spawned. The generation
    /// is claimed before returning, so a later call always wins.
    pub fn change_animation(&self, name: &str) -> std::result::Result<TaskName, AnimationError> {
        let (task, _) = self.sequencer.catalog().resolve(name).inspect_err(|e| {
            tracing::warn!("Ignoring animation request: {}", e);
        })?;

        let generation = self.sequencer.claim();
        let sequencer = Arc::clone(&self.sequencer);
        tokio::spawn(async move {
            match sequencer.run_task(generation, task).await {
                Ok(outcome) => tracing::debug!("Task {} ended: {:?}", task, outcome),
                Err(e) => tracing::debug!("Task {} failed: {}", task, e),
            }
        });

        Ok(task)
    }

    /// Advance the click cycle and request the task it lands on
    pub fn click(&self) -> Option<TaskName> {
        if self.click_cycle.is_empty() {
            return None;
        }

        let len = self.click_cycle.len();
        let previous = self
            .click_index
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |i| Some((i + 1) % len))
            .unwrap_or_default();
        let task = self.click_cycle[(previous + 1) % len];

        self.change_animation(task.as_str()).ok()
    }

    /// Subscribe to shutdown signal
    pub fn subscribe_shutdown(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Signal shutdown
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;
    use animation::Phase;

    #[tokio::test]
    async fn test_click_cycles_tasks() {
        let state = AppState::new(Config::default());

        assert_eq!(state.click(), Some(TaskName::Angry));
        assert_eq!(state.click(), Some(TaskName::Laugh));
        assert_eq!(state.click(), Some(TaskName::Talk));
        assert_eq!(state.click(), Some(TaskName::Angry));
    }

    #[tokio::test]
    async fn test_change_animation_rejects_unknown() {
        let state = AppState::new(Config::default());

        assert!(state.change_animation("dance").is_err());
        assert_eq!(state.sequencer.status().await.generation, 0);
        assert_eq!(state.change_animation("stop-task").unwrap(), TaskName::StopTask);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_latest_request_wins() {
        for _ in 0..50 {
            let dir = tempfile::TempDir::new().unwrap();
            let state = AppState::new(test_utils::config_with_assets(dir.path()));

            state.change_animation("angry").unwrap();
            state.change_animation("laugh").unwrap();

            let mut settled = false;
            for _ in 0..1000 {
                let status = state.sequencer.status().await;
                if status.task == Some(TaskName::Laugh) && status.phase == Phase::PlayingLoop {
                    settled = true;
                    break;
                }
                tokio::time::sleep(std::time::Duration::from_millis(1)).await;
            }
            assert!(settled, "laugh never started");

            // Give the earlier request time to finish its load
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            let status = state.sequencer.status().await;
            assert_eq!(status.task, Some(TaskName::Laugh));
            assert_eq!(status.generation, 2);
            assert_eq!(status.clip.unwrap().as_str(), "laugh.gltf");
        }
    }
}
