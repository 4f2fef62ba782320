//! Per-frame mixer driver

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex};

use super::mixer::Mixer;

/// Advance the mixer by a fixed step every frame until shutdown.
///
/// Returns the number of frames ticked.
pub async fn run_frame_loop(
    mixer: Arc<Mutex<Mixer>>,
    frame_delta: f32,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> u64 {
    let mut interval = tokio::time::interval(Duration::from_secs_f32(frame_delta));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let mut frames = 0u64;

    tracing::info!("Frame loop started ({:.0} fps)", 1.0 / frame_delta);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                mixer.lock().await.update(frame_delta);
                frames += 1;
            }
            _ = shutdown_rx.recv() => {
                tracing::info!("Frame loop shutting down after {} frames", frames);
                return frames;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{Clip, ClipRef, LoopMode, PlayState};

    #[tokio::test(start_paused = true)]
    async fn test_frame_loop_advances_mixer() {
        let mixer = Arc::new(Mutex::new(Mixer::new()));
        let clip = Arc::new(Clip::new(ClipRef::from("sit-down.glb"), 0.5));
        let (id, finished) = mixer.lock().await.play(clip, LoopMode::Once, 0.0);

        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let frame_loop = tokio::spawn(run_frame_loop(Arc::clone(&mixer), 0.016, shutdown_rx));

        // 0.5s of clip needs 32 frames at 0.016
        finished.await.unwrap();
        assert_eq!(mixer.lock().await.action(id).unwrap().state, PlayState::Finished);

        shutdown_tx.send(()).unwrap();
        let frames = frame_loop.await.unwrap();
        assert!(frames >= 32);
    }
}
