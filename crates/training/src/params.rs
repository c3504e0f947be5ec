//! # Training Parameters
//!
//! Per-agent default hyperparameters for each environment suite, and the
//! split of a resolved parameter tree into what the trainer receives: flat
//! hyperparameters, the evaluation batch size, and a [`NetworkFactory`].

use crate::agent::Agent;
use crate::error::TrainingError;
use config_tree::{ConfigTree, ConfigValue, NETWORK_FACTORY};
use envs::locomotion;
use envs::{EnvError, Registry};

pub const DEFAULT_NUM_EVAL_ENVS: usize = 128;
const NUM_EVAL_ENVS: &str = "num_eval_envs";

/// Default hyperparameters for running `agent` on `env_name`.
pub fn rl_config(registry: &Registry, env_name: &str, agent: Agent) -> Result<ConfigTree, TrainingError> {
    match registry.suite_of(env_name) {
        Some(locomotion::SUITE_NAME) => Ok(match agent {
            Agent::Ppo => locomotion_ppo_config(),
            Agent::Fql => locomotion_fql_config(),
        }),
        Some(suite) => Err(TrainingError::NoTrainingConfig {
            env: env_name.to_string(),
            suite: suite.to_string(),
        }),
        None => Err(EnvError::UnknownEnvironment {
            name: env_name.to_string(),
            available: registry.names(),
        }
        .into()),
    }
}

fn with_run_flags(tree: ConfigTree) -> ConfigTree {
    tree.with("run_evals", true)
        .with("log_training_metrics", false)
        .with("training_metrics_steps", 1_000_000)
}

#[must_use]
pub fn locomotion_ppo_config() -> ConfigTree {
    with_run_flags(
        ConfigTree::new()
            .with("num_timesteps", 200_000_000)
            .with("num_evals", 10)
            .with("reward_scaling", 1.0)
            .with("episode_length", 1000)
            .with("normalize_observations", true)
            .with("action_repeat", 1)
            .with("unroll_length", 20)
            .with("num_minibatches", 32)
            .with("num_updates_per_batch", 4)
            .with("discounting", 0.97)
            .with("learning_rate", 3e-4)
            .with("entropy_cost", 1e-2)
            .with("num_envs", 8192)
            .with("batch_size", 256)
            .with("max_grad_norm", 1.0)
            .with("clipping_epsilon", 0.2)
            .with(NUM_EVAL_ENVS, 128),
    )
    .with(
        NETWORK_FACTORY,
        ConfigTree::new()
            .with("policy_hidden_layer_sizes", [512, 256, 128])
            .with("value_hidden_layer_sizes", [512, 256, 128])
            .with("policy_obs_key", "state")
            .with("value_obs_key", "privileged_state"),
    )
}

#[must_use]
pub fn locomotion_fql_config() -> ConfigTree {
    with_run_flags(
        ConfigTree::new()
            .with("num_timesteps", 50_000_000)
            .with("num_evals", 10)
            .with("reward_scaling", 1.0)
            .with("episode_length", 1000)
            .with("normalize_observations", true)
            .with("action_repeat", 1)
            .with("discounting", 0.99)
            .with("learning_rate", 3e-4)
            .with("num_envs", 1024)
            .with("batch_size", 256)
            .with("max_grad_norm", 1.0)
            .with("grad_updates_per_step", 8)
            .with("min_replay_size", 8192)
            .with("max_replay_size", 1_048_576)
            .with("tau", 0.005)
            .with("alpha", 10.0)
            .with(NUM_EVAL_ENVS, 128),
    )
    .with(
        NETWORK_FACTORY,
        ConfigTree::new()
            .with("q_hidden_layer_sizes", [256, 256, 256])
            .with("policy_hidden_layer_sizes", [256, 256, 256])
            .with("policy_obs_key", "state")
            .with("value_obs_key", "privileged_state"),
    )
}

/// Network architecture parameters, bound from a `network_factory` sub-tree.
///
/// Unbound parameters fall back to the library defaults: a `[32; 4]` policy
/// MLP, a `[256; 5]` value MLP, both reading the `state` observation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NetworkFactory {
    bound: ConfigTree,
}

impl NetworkFactory {
    /// The default factory with nothing bound.
    #[must_use]
    pub fn unbound() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn bind(params: ConfigTree) -> Self {
        Self { bound: params }
    }

    #[must_use]
    pub fn bound(&self) -> &ConfigTree {
        &self.bound
    }

    pub fn policy_hidden_layer_sizes(&self) -> Result<Vec<usize>, TrainingError> {
        self.layer_sizes("policy_hidden_layer_sizes", &[32; 4])
    }

    pub fn value_hidden_layer_sizes(&self) -> Result<Vec<usize>, TrainingError> {
        self.layer_sizes("value_hidden_layer_sizes", &[256; 5])
    }

    #[must_use]
    pub fn policy_obs_key(&self) -> &str {
        self.bound.get_str("policy_obs_key").unwrap_or("state")
    }

    #[must_use]
    pub fn value_obs_key(&self) -> &str {
        self.bound.get_str("value_obs_key").unwrap_or("state")
    }

    fn layer_sizes(&self, key: &str, default: &[usize]) -> Result<Vec<usize>, TrainingError> {
        match self.bound.get(key) {
            None => Ok(default.to_vec()),
            Some(value) => value.as_usize_list().ok_or_else(|| TrainingError::InvalidParameter {
                key: format!("{NETWORK_FACTORY}.{key}"),
                reason: "must be a list of positive integers".to_string(),
            }),
        }
    }
}

/// Resolved hyperparameters as handed to a trainer.
#[derive(Clone, Debug, PartialEq)]
pub struct TrainingParams {
    /// Flat hyperparameters; `network_factory` and `num_eval_envs` removed.
    pub values: ConfigTree,
    pub num_eval_envs: usize,
    pub network_factory: NetworkFactory,
}

impl TrainingParams {
    /// Splits a resolved parameter tree.
    pub fn from_config(rl_params: &ConfigTree) -> Result<Self, TrainingError> {
        let mut values = rl_params.clone();
        let network_factory = match values.remove(NETWORK_FACTORY) {
            Some(ConfigValue::Tree(tree)) => NetworkFactory::bind(tree),
            Some(_) => {
                return Err(TrainingError::InvalidParameter {
                    key: NETWORK_FACTORY.to_string(),
                    reason: "must be a table".to_string(),
                })
            }
            None => NetworkFactory::unbound(),
        };
        let num_eval_envs = match values.remove(NUM_EVAL_ENVS) {
            Some(value) => to_usize(NUM_EVAL_ENVS, &value)?,
            None => DEFAULT_NUM_EVAL_ENVS,
        };
        Ok(Self { values, num_eval_envs, network_factory })
    }

    /// Reassembles the full parameter tree, `num_eval_envs` and any bound
    /// `network_factory` included.
    #[must_use]
    pub fn to_config(&self) -> ConfigTree {
        let tree = self.values.clone().with(NUM_EVAL_ENVS, self.num_eval_envs);
        if self.network_factory.bound().is_empty() {
            tree
        } else {
            tree.with(NETWORK_FACTORY, self.network_factory.bound().clone())
        }
    }

    pub fn u64(&self, key: &str) -> Result<u64, TrainingError> {
        let value = self.values.get(key).ok_or_else(|| missing(key))?;
        value
            .as_i64()
            .and_then(|v| u64::try_from(v).ok())
            .ok_or_else(|| invalid(key, "must be a non-negative integer"))
    }

    pub fn usize(&self, key: &str) -> Result<usize, TrainingError> {
        let value = self.values.get(key).ok_or_else(|| missing(key))?;
        to_usize(key, value)
    }

    pub fn f64(&self, key: &str) -> Result<f64, TrainingError> {
        self.values
            .get(key)
            .ok_or_else(|| missing(key))?
            .as_f64()
            .ok_or_else(|| invalid(key, "must be a number"))
    }

    /// `key` as a bool, `default` when absent.
    pub fn flag(&self, key: &str, default: bool) -> Result<bool, TrainingError> {
        match self.values.get(key) {
            None => Ok(default),
            Some(value) => value.as_bool().ok_or_else(|| invalid(key, "must be a bool")),
        }
    }

    pub fn num_timesteps(&self) -> Result<u64, TrainingError> {
        self.u64("num_timesteps")
    }

    pub fn episode_length(&self) -> Result<usize, TrainingError> {
        self.usize("episode_length")
    }
}

fn to_usize(key: &str, value: &ConfigValue) -> Result<usize, TrainingError> {
    value
        .as_i64()
        .and_then(|v| usize::try_from(v).ok())
        .ok_or_else(|| invalid(key, "must be a non-negative integer"))
}

fn missing(key: &str) -> TrainingError {
    invalid(key, "is missing")
}

fn invalid(key: &str, reason: &str) -> TrainingError {
    TrainingError::InvalidParameter { key: key.to_string(), reason: reason.to_string() }
}
