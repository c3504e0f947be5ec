#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
//! # Playground
//!
//! Command-line driver that trains a policy on a registered task and records
//! evaluation rollouts.
//!
//! ## The Crates
//!
//! -   **[`config_tree`]:** nested configuration values and the presence-aware
//!     override merge.
//! -   **[`envs`]:** the task registry and the locomotion suite.
//! -   **[`training`]:** checkpoints, progress sinks, the trainer contract and
//!     the run driver.
//! -   **[`render`]:** trajectory frames and video output.
//!
//! ## Getting Started
//!
//! ```text
//! playground --env-name G1JoystickRoughTerrain --num-timesteps 200000 --use-dashboard
//! playground --play-only --load-checkpoint-path logs/<experiment>/checkpoints
//! ```

pub mod app;
pub mod cli;

pub use config_tree;
pub use envs;
pub use render;
pub use training;
