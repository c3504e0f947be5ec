//! # Random-Search Trainer
//!
//! A gradient-free reference [`Trainer`]: hill climbing over a linear `tanh`
//! policy. Each iteration perturbs the current weights, scores the candidate
//! on a batch of training rollouts and keeps it if it scores higher.
//! Evaluation, checkpointing, progress reporting and the policy-parameter hook
//! follow the trainer contract, which makes it a stand-in for a real learner
//! when exercising the driver end to end.
//!
//! Hyperparameters read: `num_timesteps`, `num_evals`, `episode_length`,
//! `action_repeat`, `num_envs`, `learning_rate` (perturbation scale is
//! `sqrt(learning_rate)`), `reward_scaling`, `run_evals`,
//! `log_training_metrics` and `training_metrics_steps`.

use crate::checkpoint::step_dir_name;
use crate::hooks::{episode_returns, RewardSummary};
use crate::progress::{EVAL_REWARD, TRAIN_REWARD};
use crate::trainer::{Metrics, Policy, TrainRequest, Trainer};
use anyhow::{bail, Context};
use envs::{reset_batch, DomainRandomizer, Environment, Model, Observation};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Instant;

pub const POLICY_FILE: &str = "policy.json";
const EXPLORATION_STD: f32 = 0.1;
const MAX_TRAIN_ROLLOUTS: usize = 64;

/// `action = tanh(W · obs[obs_key] + b)`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinearPolicy {
    pub obs_key: String,
    pub obs_size: usize,
    pub action_size: usize,
    /// Row-major `action_size x obs_size`.
    pub weights: Vec<f32>,
    pub bias: Vec<f32>,
}

impl LinearPolicy {
    #[must_use]
    pub fn zeros(obs_key: impl Into<String>, obs_size: usize, action_size: usize) -> Self {
        Self {
            obs_key: obs_key.into(),
            obs_size,
            action_size,
            weights: vec![0.0; obs_size * action_size],
            bias: vec![0.0; action_size],
        }
    }

    /// Copy with every parameter shifted by `N(0, scale)`-ish noise.
    #[must_use]
    pub fn perturbed(&self, scale: f32, rng: &mut fastrand::Rng) -> Self {
        let mut out = self.clone();
        for w in out.weights.iter_mut().chain(out.bias.iter_mut()) {
            *w += scale * gaussian(rng);
        }
        out
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        fs::write(path, serde_json::to_string(self)?)
            .with_context(|| format!("writing policy to {}", path.display()))
    }

    /// Loads from a `policy.json` file or a step directory holding one.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let file = if path.is_dir() { path.join(POLICY_FILE) } else { path.to_path_buf() };
        let text = fs::read_to_string(&file)
            .with_context(|| format!("reading policy from {}", file.display()))?;
        let policy: Self = serde_json::from_str(&text)
            .with_context(|| format!("parsing policy in {}", file.display()))?;
        if policy.weights.len() != policy.obs_size * policy.action_size
            || policy.bias.len() != policy.action_size
        {
            bail!("policy in {} has inconsistent shapes", file.display());
        }
        Ok(policy)
    }
}

impl Policy for LinearPolicy {
    fn act(&self, observation: &Observation, exploration: Option<&mut fastrand::Rng>) -> Vec<f32> {
        let obs = observation.get(&self.obs_key).map_or(&[][..], Vec::as_slice);
        let mut action: Vec<f32> = self
            .weights
            .chunks(self.obs_size.max(1))
            .zip(&self.bias)
            .map(|(row, b)| row.iter().zip(obs).map(|(w, x)| w * x).sum::<f32>() + b)
            .collect();
        if let Some(rng) = exploration {
            for a in &mut action {
                *a += EXPLORATION_STD * gaussian(rng);
            }
        }
        action.iter().map(|a| a.tanh()).collect()
    }
}

/// Box-Muller standard normal sample.
fn gaussian(rng: &mut fastrand::Rng) -> f32 {
    let u1 = rng.f32().max(f32::MIN_POSITIVE);
    let u2 = rng.f32();
    (-2.0 * u1.ln()).sqrt() * (std::f32::consts::TAU * u2).cos()
}

struct Settings {
    num_timesteps: u64,
    num_evals: u64,
    episode_length: usize,
    action_repeat: usize,
    num_envs: usize,
    num_eval_envs: usize,
    step_scale: f32,
    reward_scaling: f64,
    run_evals: bool,
    log_training_metrics: bool,
    training_metrics_steps: u64,
}

impl Settings {
    #[allow(clippy::cast_possible_truncation)]
    fn read(request: &TrainRequest<'_>) -> anyhow::Result<Self> {
        let p = request.params;
        Ok(Self {
            num_timesteps: p.num_timesteps()?,
            num_evals: p.u64("num_evals")?,
            episode_length: p.episode_length()?.max(1),
            action_repeat: p.usize("action_repeat")?.max(1),
            num_envs: p.usize("num_envs")?.clamp(1, MAX_TRAIN_ROLLOUTS),
            num_eval_envs: p.num_eval_envs.max(1),
            step_scale: p.f64("learning_rate")?.abs().sqrt() as f32,
            reward_scaling: p.f64("reward_scaling")?,
            run_evals: p.flag("run_evals", true)?,
            log_training_metrics: p.flag("log_training_metrics", false)?,
            training_metrics_steps: p.u64("training_metrics_steps").unwrap_or(1_000_000).max(1),
        })
    }

    /// Environment steps consumed by one batch of rollouts.
    fn steps_per_batch(&self) -> u64 {
        let steps = self.num_envs.saturating_mul(self.episode_length).saturating_mul(self.action_repeat);
        u64::try_from(steps).unwrap_or(u64::MAX)
    }

    fn eval_points(&self) -> Vec<u64> {
        eval_points(self.num_timesteps, self.num_evals)
    }
}

/// Steps at which evaluations (and checkpoints) happen.
///
/// With two or more evaluations the first is at step 0 and the rest are
/// evenly spaced up to `num_timesteps`; a single evaluation runs at the end.
#[must_use]
pub fn eval_points(num_timesteps: u64, num_evals: u64) -> Vec<u64> {
    let mut points: Vec<u64> = match num_evals {
        0 => Vec::new(),
        1 => vec![num_timesteps],
        n => (0..n)
            .map(|i| {
                let point = u128::from(num_timesteps) * u128::from(i) / u128::from(n - 1);
                u64::try_from(point).unwrap_or(num_timesteps)
            })
            .collect(),
    };
    points.dedup();
    points
}

/// Runs `policy` on `seeds.len()` lockstep rollouts and returns the return of
/// each, counted until its first done flag.
fn rollout_returns(
    env: &dyn Environment,
    models: &[Model],
    policy: &LinearPolicy,
    seeds: &[u64],
    episode_length: usize,
    action_repeat: usize,
) -> Vec<f64> {
    let mut states = reset_batch(env, seeds);
    let mut rewards = Vec::with_capacity(episode_length);
    let mut dones = Vec::with_capacity(episode_length);
    for _ in 0..episode_length {
        states = states
            .iter()
            .zip(models)
            .map(|(state, model)| {
                let action = policy.act(&state.obs, None);
                let mut next = env.step_with(model, state, &action);
                let mut reward = next.reward;
                for _ in 1..action_repeat {
                    if next.done {
                        break;
                    }
                    next = env.step_with(model, &next, &action);
                    reward += next.reward;
                }
                next.reward = reward;
                next
            })
            .collect();
        rewards.push(states.iter().map(|s| s.reward).collect());
        dones.push(states.iter().map(|s| s.done).collect());
    }
    episode_returns(&rewards, &dones)
}

fn batch_models(
    nominal: &Model,
    randomizer: Option<&DomainRandomizer>,
    seeds: &[u64],
    rng: &mut fastrand::Rng,
) -> Vec<Model> {
    seeds
        .iter()
        .map(|&seed| match randomizer {
            Some(randomize) => {
                let (lo, hi) = randomize(nominal, seed);
                Model::sample_between(&lo, &hi, rng)
            }
            None => nominal.clone(),
        })
        .collect()
}

/// Hill-climbing trainer over [`LinearPolicy`].
#[derive(Debug, Default)]
pub struct RandomSearchTrainer;

impl RandomSearchTrainer {
    fn initial_policy(request: &TrainRequest<'_>) -> anyhow::Result<LinearPolicy> {
        let obs_key = request.params.network_factory.policy_obs_key().to_string();
        let obs_size = *request
            .environment
            .observation_size()
            .get(&obs_key)
            .with_context(|| format!("environment has no '{obs_key}' observation"))?;
        let action_size = request.environment.action_size();

        let Some(path) = request.restore_checkpoint_path else {
            return Ok(LinearPolicy::zeros(obs_key, obs_size, action_size));
        };
        let policy = LinearPolicy::load(path)?;
        if policy.obs_size != obs_size || policy.action_size != action_size || policy.obs_key != obs_key {
            bail!(
                "checkpoint {} expects {} '{}' observations and {} actions; environment provides {obs_size} '{obs_key}' and {action_size}",
                path.display(),
                policy.obs_size,
                policy.obs_key,
                policy.action_size,
            );
        }
        tracing::info!("restored policy from {}", path.display());
        Ok(policy)
    }

    fn evaluate(
        request: &TrainRequest<'_>,
        settings: &Settings,
        policy: &LinearPolicy,
        rng: &mut fastrand::Rng,
    ) -> Metrics {
        let started = Instant::now();
        let seeds: Vec<u64> = (0..settings.num_eval_envs).map(|_| rng.u64(..)).collect();
        let models = vec![request.eval_env.model().clone(); seeds.len()];
        let returns = rollout_returns(
            request.eval_env,
            &models,
            policy,
            &seeds,
            settings.episode_length,
            settings.action_repeat,
        );
        let summary = RewardSummary::of(&returns);
        Metrics::from([
            (EVAL_REWARD.to_string(), summary.mean),
            ("eval/episode_reward_std".to_string(), summary.std),
            ("eval/epoch_eval_time".to_string(), started.elapsed().as_secs_f64()),
        ])
    }

    fn checkpoint(save_dir: &Path, step: u64, policy: &LinearPolicy) -> anyhow::Result<()> {
        let dir = save_dir.join(step_dir_name(step));
        fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
        policy.save(&dir.join(POLICY_FILE))
    }
}

impl Trainer for RandomSearchTrainer {
    fn train(&mut self, mut request: TrainRequest<'_>) -> anyhow::Result<Box<dyn Policy>> {
        let settings = Settings::read(&request)?;
        let mut rng = fastrand::Rng::with_seed(request.seed);
        let mut policy = Self::initial_policy(&request)?;
        let nominal = request.environment.model().clone();

        let mut eval_points = settings.eval_points().into_iter().peekable();
        let mut step = 0u64;
        let mut next_train_log = settings.training_metrics_steps;
        let per_batch = settings.steps_per_batch();

        loop {
            while eval_points.peek().is_some_and(|&p| p <= step) {
                eval_points.next();
                if settings.run_evals {
                    let metrics = Self::evaluate(&request, &settings, &policy, &mut rng);
                    (request.progress)(step, &metrics);
                }
                if step > 0 {
                    Self::checkpoint(request.save_checkpoint_path, step, &policy)?;
                }
                request.policy_params.on_policy_params(step, &policy);
            }
            if step >= settings.num_timesteps {
                break;
            }

            let seeds: Vec<u64> = (0..settings.num_envs).map(|_| rng.u64(..)).collect();
            let models = batch_models(&nominal, request.randomization_fn.as_ref(), &seeds, &mut rng);
            let score = |p: &LinearPolicy| {
                let returns = rollout_returns(
                    request.environment,
                    &models,
                    p,
                    &seeds,
                    settings.episode_length,
                    settings.action_repeat,
                );
                RewardSummary::of(&returns).mean * settings.reward_scaling
            };
            let candidate = policy.perturbed(settings.step_scale, &mut rng);
            let candidate_score = score(&candidate);
            // Both are scored on the same seeds and models.
            let incumbent_score = score(&policy);
            let batch_score = candidate_score.max(incumbent_score);
            if candidate_score > incumbent_score {
                policy = candidate;
            }

            step = step.saturating_add(per_batch).min(settings.num_timesteps);
            if settings.log_training_metrics && step >= next_train_log {
                next_train_log = step.saturating_add(settings.training_metrics_steps);
                (request.progress)(step, &Metrics::from([(TRAIN_REWARD.to_string(), batch_score)]));
            }
        }

        Ok(Box::new(policy))
    }
}
