//! Deferred Multipass - a pass orchestrator for a deferred renderer
//!
//! Builds a five-attachment G-buffer render target, runs the geometry,
//! lighting and post-processing passes over it a configurable number of
//! times per frame and keeps frame cadence at a selectable target rate.
//!
//! Two backends implement the collaborator traits:
//! - **Vulkan**: command recording via ash, allocation via gpu-allocator (native only)
//! - **Dummy**: records commands without a GPU, for tests and headless benchmarks
//!
//! # Features
//! - Tile-budget checked G-buffer construction with depth format fallback
//! - Validated pass definitions with input/output attachment contracts
//! - Layout-tracking barrier scheduler between passes and repetitions
//! - Frame pacing with an interruptible sleep
//! - egui options window for the repeat tiers and target rate

pub mod backend;
pub mod config;
pub mod engine;
pub mod error;
pub mod pacing;
pub mod pipeline;
pub mod render_graph;
pub mod resources;
pub mod scene;
pub mod ui;

pub use config::{MultipassConfig, OptionGroup, RepeatTier, RuntimeState, TargetRate};
pub use engine::{FrameStats, MultipassSample, Sample};
pub use error::{MultipassError, MultipassResult};
pub use pacing::{FramePacer, Sleeper, ThreadSleeper};
pub use pipeline::DeferredPipeline;
pub use resources::{RenderTarget, RenderTargetBuilder};
pub use scene::SceneProvider;
