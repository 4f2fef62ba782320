//! Animation mixer
//!
//! Holds the active actions, advances their local time and blend weights
//! each frame, and signals completion of one-shot actions.

use slotmap::{new_key_type, SlotMap};
use std::sync::Arc;
use tokio::sync::oneshot;

use super::clip::Clip;

new_key_type! {
    /// Handle to an action owned by the mixer
    pub struct ActionId;
}

/// Receiver side of an action's finish notification.
///
/// Resolves `Ok(())` when the action finishes, `Err` if the action was faded
/// out or dropped before finishing.
pub type FinishSignal = oneshot::Receiver<()>;

/// Loop policy of an action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopMode {
    /// Wrap around at the end of the clip
    Repeat,
    /// Play once and hold the final frame
    Once,
}

/// Play state of an action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayState {
    Playing,
    FadingOut,
    Finished,
}

#[derive(Debug, Clone, Copy)]
struct Fade {
    from: f32,
    to: f32,
    duration: f32,
    elapsed: f32,
}

impl Fade {
    fn step(&mut self, dt: f32) -> f32 {
        self.elapsed = (self.elapsed + dt).min(self.duration);
        let t = if self.duration > 0.0 {
            self.elapsed / self.duration
        } else {
            1.0
        };
        self.from + (self.to - self.from) * t
    }

    fn done(&self) -> bool {
        self.elapsed >= self.duration
    }
}

#[derive(Debug)]
struct Action {
    clip: Arc<Clip>,
    loop_mode: LoopMode,
    state: PlayState,
    time: f32,
    weight: f32,
    fade: Option<Fade>,
    on_finish: Option<oneshot::Sender<()>>,
}

/// Read-only view of an action
#[derive(Debug, Clone, PartialEq)]
pub struct ActionSnapshot {
    pub clip: Arc<Clip>,
    pub loop_mode: LoopMode,
    pub state: PlayState,
    pub time: f32,
    pub weight: f32,
}

/// Blends the actions of a single skeleton
#[derive(Debug, Default)]
pub struct Mixer {
    actions: SlotMap<ActionId, Action>,
}

impl Mixer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a clip from its first frame, fading its weight in from zero.
    pub fn play(
        &mut self,
        clip: Arc<Clip>,
        loop_mode: LoopMode,
        fade_in: f32,
    ) -> (ActionId, FinishSignal) {
        let (tx, rx) = oneshot::channel();
        let (weight, fade) = if fade_in > 0.0 {
            (
                0.0,
                Some(Fade {
                    from: 0.0,
                    to: 1.0,
                    duration: fade_in,
                    elapsed: 0.0,
                }),
            )
        } else {
            (1.0, None)
        };

        let id = self.actions.insert(Action {
            clip,
            loop_mode,
            state: PlayState::Playing,
            time: 0.0,
            weight,
            fade,
            on_finish: Some(tx),
        });

        (id, rx)
    }

    /// Fade an action out and release it once its weight reaches zero.
    ///
    /// The action's finish listener is dropped here, so it never fires.
    /// Returns false if the action no longer exists.
    pub fn fade_out(&mut self, id: ActionId, duration: f32) -> bool {
        let Some(action) = self.actions.get_mut(id) else {
            return false;
        };

        action.on_finish = None;
        action.state = PlayState::FadingOut;
        if duration > 0.0 {
            action.fade = Some(Fade {
                from: action.weight,
                to: 0.0,
                duration,
                elapsed: 0.0,
            });
        } else {
            self.actions.remove(id);
        }
        true
    }

    /// Advance all actions by `dt` seconds
    pub fn update(&mut self, dt: f32) {
        let dt = dt.max(0.0);
        let mut released = Vec::new();

        for (id, action) in self.actions.iter_mut() {
            if let Some(fade) = action.fade.as_mut() {
                action.weight = fade.step(dt);
                if fade.done() {
                    action.fade = None;
                    if action.state == PlayState::FadingOut {
                        released.push(id);
                        continue;
                    }
                }
            }

            if action.state == PlayState::Finished {
                continue;
            }

            action.time += dt;
            let duration = action.clip.duration;
            match action.loop_mode {
                LoopMode::Repeat => {
                    if duration > 0.0 {
                        action.time %= duration;
                    } else {
                        action.time = 0.0;
                    }
                }
                LoopMode::Once => {
                    if action.time >= duration {
                        action.time = duration;
                        if action.state == PlayState::Playing {
                            action.state = PlayState::Finished;
                            if let Some(tx) = action.on_finish.take() {
                                let _ = tx.send(());
                            }
                        }
                    }
                }
            }
        }

        for id in released {
            if let Some(action) = self.actions.remove(id) {
                tracing::trace!("Released faded action: {}", action.clip.display_name());
            }
        }
    }

    pub fn action(&self, id: ActionId) -> Option<ActionSnapshot> {
        self.actions.get(id).map(|a| ActionSnapshot {
            clip: Arc::clone(&a.clip),
            loop_mode: a.loop_mode,
            state: a.state,
            time: a.time,
            weight: a.weight,
        })
    }

    pub fn contains(&self, id: ActionId) -> bool {
        self.actions.contains_key(id)
    }

    /// Number of live actions (including ones still fading out)
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Sum of all action weights
    pub fn total_weight(&self) -> f32 {
        self.actions.values().map(|a| a.weight).sum()
    }
}
