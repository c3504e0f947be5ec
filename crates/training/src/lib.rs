#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
//! # Training Runs
//!
//! Drives a training-and-evaluation run for a registered task.
//!
//! ## Key Components
//!
//! -   **[`orchestrator`]:** resolves configuration, builds environments,
//!     wires checkpoints, randomization, progress sinks and hooks, and calls
//!     a [`Trainer`].
//! -   **[`checkpoint`]:** picks the latest numbered checkpoint directory.
//! -   **[`progress`]:** fans progress reports out to console, dashboard and
//!     tracker sinks.
//! -   **[`rollout`]:** lockstep evaluation rollouts rendered to video.
//! -   **[`search`]:** a gradient-free reference trainer.

pub mod agent;
pub mod checkpoint;
pub mod error;
pub mod hooks;
pub mod orchestrator;
pub mod params;
pub mod progress;
pub mod rollout;
pub mod search;
pub mod trainer;

pub use agent::Agent;
pub use error::{CheckpointError, TrainingError};
pub use hooks::{NoopHook, PolicyParamsHook, RewardSummary, RolloutCaptureHook};
pub use orchestrator::{prepare, run, train, RunOptions, RunSummary, TrainOutcome, TrainingRun};
pub use params::{NetworkFactory, TrainingParams};
pub use progress::{ConsoleSink, DashboardSink, ProgressFanout, ProgressSink, Timings, TrackerSink};
pub use rollout::{RolloutRecorder, Trajectory, RENDER_EVERY};
pub use search::{LinearPolicy, RandomSearchTrainer};
pub use trainer::{Metrics, Policy, TrainRequest, Trainer};
