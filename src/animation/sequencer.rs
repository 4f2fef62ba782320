//! Animation sequencer
//!
//! Owns the current playback handle and chain progress. Every accepted
//! request bumps a generation counter; a chain step that wakes up under a
//! stale generation stops without touching the mixer, so the most recent
//! request always wins.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, error, info, warn};

use super::clip::ClipRef;
use super::loader::ClipSource;
use super::mixer::{ActionId, LoopMode, Mixer};
use super::task::{TaskCatalog, TaskName, TaskPlan};
use crate::config::AnimationConfig;
use crate::error::AnimationError;

/// How a request ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The last one-shot clip finished
    Completed,
    /// A looped clip started; it never finishes on its own
    Looping,
    /// A newer request took over
    Interrupted,
}

/// Sequencer phase
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    /// No chain active
    #[default]
    Idle,
    /// The current clip loops until the next request
    PlayingLoop,
    /// Stepping through one-shot clips
    PlayingChain,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Idle => write!(f, "idle"),
            Phase::PlayingLoop => write!(f, "playing-loop"),
            Phase::PlayingChain => write!(f, "playing-chain"),
        }
    }
}

/// Snapshot of the sequencer, broadcast on every change
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SequencerStatus {
    pub phase: Phase,
    /// Task being played, if the clip came from one
    pub task: Option<TaskName>,
    /// Position of the current clip within the task
    pub index: usize,
    /// Clip of the current handle
    pub clip: Option<ClipRef>,
    /// Number of accepted requests so far
    pub generation: u64,
}

#[derive(Debug, Default)]
struct SequencerState {
    status: SequencerStatus,
    current: Option<ActionId>,
}

/// One clip of a chain
#[derive(Debug, Clone, PartialEq)]
pub struct ChainStep {
    pub clip: ClipRef,
    pub looping: bool,
}

impl ChainStep {
    pub fn once(clip: impl Into<String>) -> Self {
        Self {
            clip: ClipRef::new(clip),
            looping: false,
        }
    }

    pub fn looped(clip: impl Into<String>) -> Self {
        Self {
            clip: ClipRef::new(clip),
            looping: true,
        }
    }

    fn from_plan(plan: &TaskPlan) -> Vec<Self> {
        plan.clips
            .iter()
            .enumerate()
            .map(|(i, clip)| Self {
                clip: clip.clone(),
                looping: plan.loops_at(i),
            })
            .collect()
    }
}

/// Drives the mixer through tasks, clips and chains
pub struct Sequencer<S: ClipSource> {
    source: S,
    catalog: TaskCatalog,
    mixer: Arc<Mutex<Mixer>>,
    state: Mutex<SequencerState>,
    /// Latest claimed generation
    generation: AtomicU64,
    status_tx: broadcast::Sender<SequencerStatus>,
    crossfade: f32,
    fallback: Option<TaskName>,
}

impl<S: ClipSource> Sequencer<S> {
    pub fn new(
        source: S,
        catalog: TaskCatalog,
        mixer: Arc<Mutex<Mixer>>,
        config: &AnimationConfig,
    ) -> Self {
        let (status_tx, _) = broadcast::channel(64);

        Self {
            source,
            catalog,
            mixer,
            state: Mutex::new(SequencerState::default()),
            generation: AtomicU64::new(0),
            status_tx,
            crossfade: config.crossfade_secs,
            fallback: config.fallback_task,
        }
    }

    pub fn catalog(&self) -> &TaskCatalog {
        &self.catalog
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// The mixer shared with the frame driver
    pub fn mixer(&self) -> Arc<Mutex<Mixer>> {
        Arc::clone(&self.mixer)
    }

    pub async fn status(&self) -> SequencerStatus {
        let mut status = self.state.lock().await.status.clone();
        status.generation = self.generation.load(Ordering::SeqCst);
        status
    }

    /// Handle of the current action
    pub async fn current_action(&self) -> Option<ActionId> {
        self.state.lock().await.current
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SequencerStatus> {
        self.status_tx.subscribe()
    }

    /// Claim a new generation, superseding every request in flight.
    ///
    /// Requests are ordered by claim, not by when their task starts running.
    pub fn claim(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Play the clip sequence of a named task.
    ///
    /// Unknown names leave the sequencer untouched.
    pub async fn request_task(&self, name: &str) -> Result<Outcome, AnimationError> {
        let (task, _) = match self.catalog.resolve(name) {
            Ok(resolved) => resolved,
            Err(e) => {
                warn!("Ignoring animation request: {}", e);
                return Err(e);
            }
        };

        let generation = self.claim();
        self.run_task(generation, task).await
    }

    /// Play a task under a generation obtained from [`Sequencer::claim`].
    ///
    /// When the task ends on a one-shot clip and a fallback is configured,
    /// the fallback loop starts and the result is still `Completed`; it is
    /// `Interrupted` if a newer request took over before the fallback started.
    pub async fn run_task(
        &self,
        generation: u64,
        task: TaskName,
    ) -> Result<Outcome, AnimationError> {
        let plan = self
            .catalog
            .get(task)
            .ok_or_else(|| AnimationError::UnknownTask(task.to_string()))?;

        info!("Animation task requested: {}", task);
        let steps = ChainStep::from_plan(plan);

        let outcome = match self.run_chain(generation, Some(task), &steps).await {
            Ok(outcome) => outcome,
            Err(e) => return Err(self.abort(generation, e).await),
        };

        if outcome != Outcome::Completed {
            return Ok(outcome);
        }

        let fallback = self
            .fallback
            .filter(|&fallback| fallback != task)
            .and_then(|fallback| self.catalog.get(fallback).map(|plan| (fallback, plan)));

        let Some((fallback, plan)) = fallback else {
            self.finish(generation).await;
            return Ok(Outcome::Completed);
        };

        info!("Task {} finished, falling back to {}", task, fallback);
        let steps = ChainStep::from_plan(plan);
        match self.run_chain(generation, Some(fallback), &steps).await {
            Ok(Outcome::Interrupted) => Ok(Outcome::Interrupted),
            Ok(Outcome::Looping) => Ok(Outcome::Completed),
            Ok(Outcome::Completed) => {
                self.finish(generation).await;
                Ok(Outcome::Completed)
            }
            Err(e) => Err(self.abort(generation, e).await),
        }
    }

    /// Load a single clip and cross-fade to it
    pub async fn load_and_play(
        &self,
        clip: &ClipRef,
        looping: bool,
    ) -> Result<Outcome, AnimationError> {
        let step = ChainStep {
            clip: clip.clone(),
            looping,
        };
        self.play_chain(&[step]).await
    }

    /// Play clips back to back, each waiting for the previous one to finish
    pub async fn play_chain(&self, steps: &[ChainStep]) -> Result<Outcome, AnimationError> {
        let generation = self.claim();

        match self.run_chain(generation, None, steps).await {
            Ok(Outcome::Completed) => {
                self.finish(generation).await;
                Ok(Outcome::Completed)
            }
            Ok(outcome) => Ok(outcome),
            Err(e) => Err(self.abort(generation, e).await),
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    async fn run_chain(
        &self,
        generation: u64,
        task: Option<TaskName>,
        steps: &[ChainStep],
    ) -> Result<Outcome, AnimationError> {
        let mut outcome = Outcome::Completed;

        for (index, step) in steps.iter().enumerate() {
            outcome = self.play_step(generation, task, index, step).await?;
            match outcome {
                Outcome::Completed => continue,
                Outcome::Looping | Outcome::Interrupted => break,
            }
        }

        Ok(outcome)
    }

    async fn play_step(
        &self,
        generation: u64,
        task: Option<TaskName>,
        index: usize,
        step: &ChainStep,
    ) -> Result<Outcome, AnimationError> {
        if !self.is_current(generation) {
            return Ok(Outcome::Interrupted);
        }

        debug!("Loading clip {}", step.clip);
        let clip = match self.source.load(&step.clip).await {
            Ok(clip) => clip,
            Err(AnimationError::MissingAnimationData(path)) => {
                warn!("No animation found in {}, skipping", path);
                return Ok(Outcome::Completed);
            }
            Err(e) => return Err(e),
        };

        let finished = {
            let mut state = self.state.lock().await;
            if !self.is_current(generation) {
                debug!("Dropping stale clip {}", step.clip);
                return Ok(Outcome::Interrupted);
            }

            let mode = if step.looping {
                LoopMode::Repeat
            } else {
                LoopMode::Once
            };

            let mut mixer = self.mixer.lock().await;
            if let Some(previous) = state.current.take() {
                mixer.fade_out(previous, self.crossfade);
            }
            let (id, finished) = mixer.play(clip, mode, self.crossfade);
            drop(mixer);

            state.current = Some(id);
            state.status.phase = if step.looping {
                Phase::PlayingLoop
            } else {
                Phase::PlayingChain
            };
            state.status.task = task;
            state.status.index = index;
            state.status.clip = Some(step.clip.clone());
            state.status.generation = generation;
            let _ = self.status_tx.send(state.status.clone());

            finished
        };

        info!("Playing clip {} ({})", step.clip, mode_name(step.looping));

        if step.looping {
            return Ok(Outcome::Looping);
        }

        // Err means a newer cross-fade released the listener
        let finished = finished.await.is_ok();
        if finished && self.is_current(generation) {
            Ok(Outcome::Completed)
        } else {
            debug!("Chain step {} abandoned", step.clip);
            Ok(Outcome::Interrupted)
        }
    }

    /// Return to idle after the last one-shot clip, holding its final pose
    async fn finish(&self, generation: u64) {
        let mut state = self.state.lock().await;
        if self.is_current(generation) {
            state.status.phase = Phase::Idle;
            state.status.generation = generation;
            state.status.task = None;
            let _ = self.status_tx.send(state.status.clone());
        }
    }

    /// Log a failed request and return to idle; the current action keeps playing
    async fn abort(&self, generation: u64, err: AnimationError) -> AnimationError {
        if self.is_current(generation) {
            error!("Animation request aborted: {}", err);
            self.finish(generation).await;
        } else {
            debug!("Superseded request failed: {}", err);
        }
        err
    }
}

fn mode_name(looping: bool) -> &'static str {
    if looping {
        "loop"
    } else {
        "once"
    }
}
