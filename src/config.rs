//! Configuration parsing and management for Motiontuber

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::animation::TaskName;
use crate::error::{ConfigError, MotiontuberError};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub animation: AnimationConfig,
    pub tasks: TasksConfig,
    pub http: HttpConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, MotiontuberError> {
        let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ConfigError::ReadFile(format!("{}: {}", path.as_ref().display(), e))
        })?;

        Self::from_str(&contents)
    }

    /// Parse configuration from a TOML string
    pub fn from_str(s: &str) -> Result<Self, MotiontuberError> {
        toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()).into())
    }

    /// Load configuration from default paths
    pub fn load() -> Result<Self, MotiontuberError> {
        let paths = [
            PathBuf::from("config.toml"),
            PathBuf::from("config/default.toml"),
            dirs_path().join("config.toml"),
        ];

        for path in &paths {
            if path.exists() {
                tracing::info!("Loading config from: {}", path.display());
                return Self::from_file(path);
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), MotiontuberError> {
        if !(self.animation.crossfade_secs >= 0.0) {
            return Err(invalid(
                "animation.crossfade_secs",
                "Cross-fade duration must not be negative",
            ));
        }

        if !(MIN_FRAME_DELTA..=MAX_FRAME_DELTA).contains(&self.animation.frame_delta_secs) {
            return Err(invalid(
                "animation.frame_delta_secs",
                &format!(
                    "Frame delta must be between {} and {} seconds",
                    MIN_FRAME_DELTA, MAX_FRAME_DELTA
                ),
            ));
        }

        if self.animation.click_cycle.is_empty() {
            return Err(invalid(
                "animation.click_cycle",
                "Click cycle needs at least one task",
            ));
        }

        // Categories must be non-empty and must not share clips
        let mut owners: HashMap<&str, TaskName> = HashMap::new();
        for name in TaskName::ALL {
            let task = self.tasks.get(name);
            if task.clips.is_empty() {
                return Err(invalid(
                    &format!("tasks.{}.clips", name),
                    "Task must list at least one clip",
                ));
            }
            for clip in &task.clips {
                if let Some(other) = owners.insert(clip.as_str(), name) {
                    if other != name {
                        return Err(invalid(
                            &format!("tasks.{}.clips", name),
                            &format!("Clip '{}' is already used by task '{}'", clip, other),
                        ));
                    }
                }
            }
        }

        if let Some(fallback) = self.animation.fallback_task {
            if !self.tasks.get(fallback).loop_last {
                return Err(invalid(
                    "animation.fallback_task",
                    &format!("Fallback task '{}' must end in a looped clip", fallback),
                ));
            }
        }

        if self.http.port == 0 {
            return Err(invalid("http.port", "Port must be greater than 0"));
        }

        Ok(())
    }
}

/// Bounds of the frame loop step, in seconds
const MIN_FRAME_DELTA: f32 = 1e-4;
const MAX_FRAME_DELTA: f32 = 1.0;

fn invalid(field: &str, message: &str) -> MotiontuberError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        message: message.to_string(),
    }
    .into()
}

/// Animation playback configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// Directory containing the character and clip files
    pub assets_dir: PathBuf,
    /// Skeletal mesh file (relative to assets_dir)
    pub character: String,
    /// Cross-fade duration in seconds
    pub crossfade_secs: f32,
    /// Fixed mixer step per frame in seconds
    pub frame_delta_secs: f32,
    /// Keep loaded clips in memory
    pub cache_clips: bool,
    /// Task requested on startup
    pub initial_task: Option<TaskName>,
    /// Looped task started after a chain ends on a one-shot clip
    pub fallback_task: Option<TaskName>,
    /// Tasks cycled through by viewer clicks
    pub click_cycle: Vec<TaskName>,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            assets_dir: PathBuf::from("./assets"),
            character: "character.glb".to_string(),
            crossfade_secs: 0.5,
            frame_delta_secs: 0.016,
            cache_clips: false,
            initial_task: Some(TaskName::Talk),
            fallback_task: Some(TaskName::Talk),
            click_cycle: vec![TaskName::Talk, TaskName::Angry, TaskName::Laugh],
        }
    }
}

/// One task category: an ordered clip list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskConfig {
    /// Clip files, played in order
    pub clips: Vec<String>,
    /// Whether the final clip loops (earlier clips always play once)
    #[serde(default)]
    pub loop_last: bool,
}

impl TaskConfig {
    fn new(clips: &[&str], loop_last: bool) -> Self {
        Self {
            clips: clips.iter().map(|c| c.to_string()).collect(),
            loop_last,
        }
    }
}

/// Clip lists for every known task
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TasksConfig {
    pub talk: TaskConfig,
    pub laugh: TaskConfig,
    pub angry: TaskConfig,
    pub task: TaskConfig,
    #[serde(rename = "stop-task")]
    pub stop_task: TaskConfig,
}

impl TasksConfig {
    /// Get the clip list for a task
    pub fn get(&self, name: TaskName) -> &TaskConfig {
        match name {
            TaskName::Talk => &self.talk,
            TaskName::Laugh => &self.laugh,
            TaskName::Angry => &self.angry,
            TaskName::Task => &self.task,
            TaskName::StopTask => &self.stop_task,
        }
    }
}

impl Default for TasksConfig {
    fn default() -> Self {
        Self {
            talk: TaskConfig::new(&["scene-talk.glb"], true),
            laugh: TaskConfig::new(&["scene-laugh.glb"], true),
            angry: TaskConfig::new(&["scene-angry.glb"], true),
            task: TaskConfig::new(&["sit-down.glb", "sit-to-type.glb", "typing.glb"], true),
            stop_task: TaskConfig::new(&["type-to-sit.glb", "stand-up.glb"], false),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Enable HTTP server
    pub enabled: bool,
    /// HTTP server host
    pub host: String,
    /// HTTP server port
    pub port: u16,
    /// Enable CORS
    pub cors_enabled: bool,
    /// Directory with the browser viewer's static files
    pub static_dir: PathBuf,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: "127.0.0.1".to_string(),
            port: 8080,
            cors_enabled: true,
            static_dir: PathBuf::from("static"),
        }
    }
}

/// Get the platform-specific configuration directory
fn dirs_path() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        if let Some(config_dir) = std::env::var_os("XDG_CONFIG_HOME") {
            return PathBuf::from(config_dir).join("motiontuber");
        }
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(".config/motiontuber");
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join("Library/Application Support/motiontuber");
        }
    }

    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("motiontuber");
        }
    }

    PathBuf::from(".")
}
