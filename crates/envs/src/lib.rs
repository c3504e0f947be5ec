#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
//! # Task Environments
//!
//! Environment interface, task registry and the shipped locomotion suite.
//!
//! ## Key Components
//!
//! -   **[`Environment`]:** reset/step over explicit [`State`] values, so many
//!     instances advance in lockstep through [`step_batch`].
//! -   **[`Registry`]:** resolves a task name to its factory, default
//!     configuration and optional domain randomizer.
//! -   **[`locomotion`]:** the G1 joystick tasks on flat and rough terrain.
//!
//! ## Usage
//!
//! ```rust
//! use envs::Registry;
//!
//! let registry = Registry::with_default_suites();
//! let env = registry.load("G1JoystickFlatTerrain", None, None).unwrap();
//! let state = env.reset(0);
//! let next = env.step(&state, &vec![0.0; env.action_size()]);
//! assert!(next.data.time > state.data.time);
//! ```

pub mod assets;
pub mod env;
pub mod error;
pub mod locomotion;
pub mod model;
pub mod registry;
pub mod state;

pub use assets::{AssetBundle, DirectoryAssets, NoAssets};
pub use env::{reset_batch, step_batch, Environment};
pub use error::EnvError;
pub use model::{DomainRandomizer, Model};
pub use registry::{ConfigFactory, EnvFactory, EnvironmentDescriptor, Registry, Suite};
pub use state::{Observation, SimData, Snapshot, State};
