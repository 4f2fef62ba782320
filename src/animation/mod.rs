//! Animation sequencing module
//!
//! Loads skeletal clips, cross-fades between them in the mixer and chains
//! several clips into composite gestures.

pub mod clip;
pub mod driver;
pub mod loader;
pub mod mixer;
pub mod sequencer;
pub mod task;

pub use clip::{Clip, ClipRef};
pub use loader::{CharacterInfo, ClipSource, GltfClipSource};
pub use mixer::{ActionId, FinishSignal, LoopMode, Mixer, PlayState};
pub use sequencer::{ChainStep, Outcome, Phase, Sequencer, SequencerStatus};
pub use task::{TaskCatalog, TaskName, TaskPlan};
