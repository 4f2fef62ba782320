//! Clip references and loaded clip data

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of an animation asset (path relative to the assets directory)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClipRef(String);

impl ClipRef {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClipRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClipRef {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// The first animation found in a loaded asset
#[derive(Debug, Clone, PartialEq)]
pub struct Clip {
    /// Asset the clip came from
    pub source: ClipRef,
    /// Animation name stored in the asset, if any
    pub name: Option<String>,
    /// Length in seconds (last keyframe time over all channels)
    pub duration: f32,
    /// Number of animated channels
    pub channels: usize,
}

impl Clip {
    pub fn new(source: ClipRef, duration: f32) -> Self {
        Self {
            source,
            name: None,
            duration: duration.max(0.0),
            channels: 0,
        }
    }

    /// Display name, falling back to the asset path
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(self.source.as_str())
    }
}
