#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
//! # Configuration Trees
//!
//! Typed, ordered, nested configuration for tasks and training runs.
//!
//! A [`ConfigTree`] holds the defaults produced by an environment or agent.
//! Command-line flags are collected into an [`OverrideSet`] in which every flag
//! carries its value *and* whether the caller actually supplied it. The
//! [`ConfigTree::merge`] operation then writes only the supplied flags, leaf by
//! leaf, so a flag left at its default never disturbs the base configuration.
//!
//! ## Key Components
//!
//! -   **[`ConfigValue`]:** a scalar, list or nested tree.
//! -   **[`ConfigTree`]:** insertion-ordered mapping with JSON persistence.
//! -   **[`OverrideSet`] / [`MergeReport`]:** presence-aware overrides and the
//!     record of which of them were applied or dropped.
//!
//! ```rust
//! use config_tree::{ConfigTree, OverrideSet};
//!
//! let base = ConfigTree::new()
//!     .with("learning_rate", 3e-4)
//!     .with("batch_size", 256);
//!
//! let mut overrides = OverrideSet::new();
//! overrides.root("learning_rate", 1e-3, true);
//! overrides.root("batch_size", 256, false);
//!
//! let (resolved, report) = base.merged(&overrides);
//! assert_eq!(resolved.get_f64("learning_rate"), Some(1e-3));
//! assert_eq!(report.applied, vec!["learning_rate".to_string()]);
//! ```

pub mod error;
pub mod overrides;
pub mod tree;
pub mod value;

pub use error::ConfigError;
pub use overrides::{
    Flag, MergeReport, OverrideSet, Target, NETWORK_FACTORY, NETWORK_FACTORY_KEYS,
};
pub use tree::ConfigTree;
pub use value::ConfigValue;
