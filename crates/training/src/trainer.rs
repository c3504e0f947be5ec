//! # Trainer Contract
//!
//! The learning algorithm is a collaborator: the orchestrator assembles a
//! [`TrainRequest`] and a [`Trainer`] turns it into a [`Policy`]. Trainers
//! report progress through the request's callback, call the policy-parameter
//! hook whenever they have fresh parameters, write checkpoints under
//! `save_checkpoint_path/<step>/`, and restore from `restore_checkpoint_path`
//! when one is given. A `num_timesteps` of zero means restore-and-return.

use crate::hooks::PolicyParamsHook;
use crate::params::TrainingParams;
use envs::{DomainRandomizer, Environment, Observation};
use std::collections::BTreeMap;
use std::path::Path;

/// Named scalar metrics, e.g. `eval/episode_reward`.
pub type Metrics = BTreeMap<String, f64>;

/// A trained policy.
pub trait Policy {
    /// Action for `observation`. With `exploration` the trainer's sampling
    /// noise is applied; without it the action is deterministic.
    fn act(&self, observation: &Observation, exploration: Option<&mut fastrand::Rng>) -> Vec<f32>;
}

/// Everything a trainer needs for one run.
pub struct TrainRequest<'a> {
    pub environment: &'a dyn Environment,
    pub eval_env: &'a dyn Environment,
    pub params: &'a TrainingParams,
    pub seed: u64,
    pub randomization_fn: Option<DomainRandomizer>,
    pub restore_checkpoint_path: Option<&'a Path>,
    pub save_checkpoint_path: &'a Path,
    pub progress: &'a mut dyn FnMut(u64, &Metrics),
    pub policy_params: &'a mut dyn PolicyParamsHook,
}

pub trait Trainer {
    /// Trains (or only restores) and returns the resulting policy.
    fn train(&mut self, request: TrainRequest<'_>) -> anyhow::Result<Box<dyn Policy>>;
}
