//! Shared fixtures for tests

use std::path::Path;

use crate::config::{Config, TaskConfig};

/// One node, one 1.5s rotation animation, buffer embedded as a data URI
pub const ANIMATED_GLTF: &str = r#"{
    "asset": { "version": "2.0" },
    "nodes": [ { "name": "hips" } ],
    "buffers": [ {
        "byteLength": 40,
        "uri": "data:application/octet-stream;base64,AAAAAAAAwD8AAAAAAAAAAAAAAAAAAIA/AAAAAAAAAAAAAAAAAACAPw=="
    } ],
    "bufferViews": [
        { "buffer": 0, "byteOffset": 0, "byteLength": 8 },
        { "buffer": 0, "byteOffset": 8, "byteLength": 32 }
    ],
    "accessors": [
        { "bufferView": 0, "componentType": 5126, "count": 2, "type": "SCALAR", "min": [0.0], "max": [1.5] },
        { "bufferView": 1, "componentType": 5126, "count": 2, "type": "VEC4" }
    ],
    "animations": [ {
        "name": "Wave",
        "samplers": [ { "input": 0, "output": 1, "interpolation": "LINEAR" } ],
        "channels": [ { "sampler": 0, "target": { "node": 0, "path": "rotation" } } ]
    } ]
}"#;

/// Two nodes, no animations
pub const STATIC_GLTF: &str = r#"{
    "asset": { "version": "2.0" },
    "nodes": [ { "name": "root" }, { "name": "spine" } ]
}"#;

/// Write an animated clip for every name
pub fn write_clips(dir: &Path, names: &[&str]) {
    for name in names {
        std::fs::write(dir.join(name), ANIMATED_GLTF).unwrap();
    }
}

/// Config whose tasks point at `.gltf` clips written into `dir`
pub fn config_with_assets(dir: &Path) -> Config {
    let mut config = Config::default();
    config.animation.assets_dir = dir.to_path_buf();
    config.animation.character = "character.gltf".to_string();
    config.tasks.talk = TaskConfig {
        clips: vec!["talk.gltf".to_string()],
        loop_last: true,
    };
    config.tasks.laugh = TaskConfig {
        clips: vec!["laugh.gltf".to_string()],
        loop_last: true,
    };
    config.tasks.angry = TaskConfig {
        clips: vec!["angry.gltf".to_string()],
        loop_last: true,
    };

    write_clips(dir, &["talk.gltf", "laugh.gltf", "angry.gltf"]);
    std::fs::write(dir.join("character.gltf"), STATIC_GLTF).unwrap();
    config
}
