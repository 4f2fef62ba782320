//! Clip and character loading from glTF/GLB assets

use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use super::clip::{Clip, ClipRef};
use crate::config::AnimationConfig;
use crate::error::AnimationError;

/// Something that can turn a clip reference into clip data
pub trait ClipSource: Send + Sync + 'static {
    fn load(
        &self,
        clip: &ClipRef,
    ) -> impl Future<Output = Result<Arc<Clip>, AnimationError>> + Send;
}

/// Loads clips from `.glb`/`.gltf` files under an assets directory
#[derive(Debug)]
pub struct GltfClipSource {
    assets_dir: PathBuf,
    cache: Option<Mutex<HashMap<ClipRef, Arc<Clip>>>>,
}

impl GltfClipSource {
    pub fn new(assets_dir: impl Into<PathBuf>, cache_clips: bool) -> Self {
        Self {
            assets_dir: assets_dir.into(),
            cache: cache_clips.then(|| Mutex::new(HashMap::new())),
        }
    }

    pub fn from_config(config: &AnimationConfig) -> Self {
        Self::new(config.assets_dir.clone(), config.cache_clips)
    }

    pub fn assets_dir(&self) -> &Path {
        &self.assets_dir
    }

    fn cached(&self, clip: &ClipRef) -> Option<Arc<Clip>> {
        let cache = self.cache.as_ref()?;
        let cache = cache.lock().ok()?;
        cache.get(clip).cloned()
    }

    fn store(&self, clip: &Arc<Clip>) {
        if let Some(cache) = &self.cache {
            if let Ok(mut cache) = cache.lock() {
                cache.insert(clip.source.clone(), Arc::clone(clip));
            }
        }
    }
}

impl ClipSource for GltfClipSource {
    async fn load(&self, clip: &ClipRef) -> Result<Arc<Clip>, AnimationError> {
        if let Some(hit) = self.cached(clip) {
            tracing::debug!("Clip cache hit: {}", clip);
            return Ok(hit);
        }

        let path = self.assets_dir.join(clip.as_str());
        let clip_ref = clip.clone();
        let loaded = tokio::task::spawn_blocking(move || read_clip(&path, clip_ref))
            .await
            .map_err(|e| AnimationError::LoadFailure {
                clip: clip.to_string(),
                cause: e.to_string(),
            })??;

        let loaded = Arc::new(loaded);
        self.store(&loaded);
        Ok(loaded)
    }
}

/// Read the first animation of a glTF asset
pub fn read_clip(path: &Path, clip: ClipRef) -> Result<Clip, AnimationError> {
    let (document, buffers, _images) =
        gltf::import(path).map_err(|e| AnimationError::LoadFailure {
            clip: clip.to_string(),
            cause: e.to_string(),
        })?;

    let Some(animation) = document.animations().next() else {
        return Err(AnimationError::MissingAnimationData(clip.to_string()));
    };

    let buf = &buffers;
    let mut duration = 0.0f32;
    let mut channels = 0;
    for channel in animation.channels() {
        channels += 1;
        let reader = channel.reader(|buffer| Some(&buf[buffer.index()]));
        if let Some(inputs) = reader.read_inputs() {
            duration = inputs.fold(duration, f32::max);
        }
    }

    Ok(Clip {
        source: clip,
        name: animation.name().map(str::to_string),
        duration,
        channels,
    })
}

/// Summary of the loaded skeletal mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharacterInfo {
    pub nodes: usize,
    pub meshes: usize,
    pub skins: usize,
    pub joints: usize,
    pub animations: usize,
}

/// Load the character mesh and report what it contains
pub async fn load_character(path: PathBuf) -> Result<CharacterInfo, AnimationError> {
    let name = path.display().to_string();
    tokio::task::spawn_blocking(move || -> Result<CharacterInfo, AnimationError> {
        let (document, _buffers, _images) =
            gltf::import(&path).map_err(|e| AnimationError::LoadFailure {
                clip: path.display().to_string(),
                cause: e.to_string(),
            })?;

        Ok(CharacterInfo {
            nodes: document.nodes().count(),
            meshes: document.meshes().count(),
            skins: document.skins().count(),
            joints: document.skins().map(|s| s.joints().count()).sum(),
            animations: document.animations().count(),
        })
    })
    .await
    .map_err(|e| AnimationError::LoadFailure {
        clip: name,
        cause: e.to_string(),
    })?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{ANIMATED_GLTF, STATIC_GLTF};
    use tempfile::TempDir;

    fn assets() -> TempDir {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("wave.gltf"), ANIMATED_GLTF).unwrap();
        std::fs::write(dir.path().join("static.gltf"), STATIC_GLTF).unwrap();
        dir
    }

    #[tokio::test]
    async fn test_load_first_animation() {
        let dir = assets();
        let source = GltfClipSource::new(dir.path(), false);

        let clip = source.load(&ClipRef::from("wave.gltf")).await.unwrap();
        assert_eq!(clip.name.as_deref(), Some("Wave"));
        assert_eq!(clip.channels, 1);
        assert!((clip.duration - 1.5).abs() < 1e-6);
        assert_eq!(clip.source.as_str(), "wave.gltf");
    }

    #[tokio::test]
    async fn test_missing_animation_data() {
        let dir = assets();
        let source = GltfClipSource::new(dir.path(), false);

        let err = source.load(&ClipRef::from("static.gltf")).await.unwrap_err();
        assert_eq!(
            err,
            AnimationError::MissingAnimationData("static.gltf".to_string())
        );
    }

    #[tokio::test]
    async fn test_missing_file_is_load_failure() {
        let dir = assets();
        let source = GltfClipSource::new(dir.path(), false);

        let err = source.load(&ClipRef::from("nope.glb")).await.unwrap_err();
        assert!(matches!(err, AnimationError::LoadFailure { ref clip, .. } if clip == "nope.glb"));
    }

    #[tokio::test]
    async fn test_cache_serves_deleted_file() {
        let dir = assets();
        let source = GltfClipSource::new(dir.path(), true);
        let clip_ref = ClipRef::from("wave.gltf");

        let first = source.load(&clip_ref).await.unwrap();
        std::fs::remove_file(dir.path().join("wave.gltf")).unwrap();
        let second = source.load(&clip_ref).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        let uncached = GltfClipSource::new(dir.path(), false);
        assert!(uncached.load(&clip_ref).await.is_err());
    }

    #[tokio::test]
    async fn test_load_character() {
        let dir = assets();
        let info = load_character(dir.path().join("static.gltf")).await.unwrap();
        assert_eq!(info.nodes, 2);
        assert_eq!(info.meshes, 0);
        assert_eq!(info.animations, 0);

        assert!(load_character(dir.path().join("missing.glb")).await.is_err());
    }
}
