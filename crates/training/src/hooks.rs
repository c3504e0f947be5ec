use crate::trainer::Policy;
use envs::{reset_batch, DomainRandomizer, Environment, Model};

/// Called by trainers each time fresh policy parameters are available.
pub trait PolicyParamsHook {
    fn on_policy_params(&mut self, step: u64, policy: &dyn Policy);
}

/// Does nothing; used when no inspector is attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHook;

impl PolicyParamsHook for NoopHook {
    fn on_policy_params(&mut self, _step: u64, _policy: &dyn Policy) {}
}

/// Mean and standard deviation of per-rollout returns.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RewardSummary {
    pub mean: f64,
    pub std: f64,
}

impl RewardSummary {
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn of(returns: &[f64]) -> Self {
        if returns.is_empty() {
            return Self { mean: 0.0, std: 0.0 };
        }
        let n = returns.len() as f64;
        let mean = returns.iter().sum::<f64>() / n;
        let var = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
        Self { mean, std: var.sqrt() }
    }
}

/// Per-rollout return counting rewards only until the first done flag.
///
/// `rewards[t][i]` and `dones[t][i]` are step `t` of rollout `i`. The reward of
/// the step that raises `done` is excluded, as is everything after it.
#[must_use]
pub fn episode_returns(rewards: &[Vec<f64>], dones: &[Vec<bool>]) -> Vec<f64> {
    let width = rewards.first().map_or(0, Vec::len);
    let mut returns = vec![0.0; width];
    let mut finished = vec![false; width];
    for (step_rewards, step_dones) in rewards.iter().zip(dones) {
        for i in 0..width {
            finished[i] |= step_dones[i];
            if !finished[i] {
                returns[i] += step_rewards[i];
            }
        }
    }
    returns
}

/// Runs a batch of rollouts with each new set of parameters and logs the
/// reward they collect, for inspecting policies while they train.
pub struct RolloutCaptureHook {
    env: Box<dyn Environment>,
    num_envs: usize,
    episode_length: usize,
    deterministic: bool,
    seed: u64,
    randomizer: Option<DomainRandomizer>,
    last: Option<RewardSummary>,
}

impl RolloutCaptureHook {
    #[must_use]
    pub fn new(env: Box<dyn Environment>, num_envs: usize, episode_length: usize, seed: u64) -> Self {
        Self {
            env,
            num_envs,
            episode_length,
            deterministic: true,
            seed,
            randomizer: None,
            last: None,
        }
    }

    #[must_use]
    pub fn deterministic(mut self, deterministic: bool) -> Self {
        self.deterministic = deterministic;
        self
    }

    #[must_use]
    pub fn with_randomizer(mut self, randomizer: Option<DomainRandomizer>) -> Self {
        self.randomizer = randomizer;
        self
    }

    /// Summary from the most recent capture.
    #[must_use]
    pub fn last_summary(&self) -> Option<RewardSummary> {
        self.last
    }

    /// Runs `num_envs` rollouts in lockstep and returns their summary.
    pub fn capture(&mut self, policy: &dyn Policy) -> RewardSummary {
        let mut rng = fastrand::Rng::with_seed(self.seed);
        let seeds: Vec<u64> = (0..self.num_envs).map(|_| rng.u64(..)).collect();
        let nominal = self.env.model().clone();
        let models: Vec<Model> = seeds
            .iter()
            .map(|&s| match &self.randomizer {
                Some(randomize) => {
                    let (lo, hi) = randomize(&nominal, s);
                    Model::sample_between(&lo, &hi, &mut rng)
                }
                None => nominal.clone(),
            })
            .collect();

        let mut states = reset_batch(self.env.as_ref(), &seeds);
        let mut rewards = Vec::with_capacity(self.episode_length);
        let mut dones = Vec::with_capacity(self.episode_length);
        for _ in 0..self.episode_length {
            states = states
                .iter()
                .zip(&models)
                .map(|(state, model)| {
                    let exploration = (!self.deterministic).then_some(&mut rng);
                    let action = policy.act(&state.obs, exploration);
                    self.env.step_with(model, state, &action)
                })
                .collect();
            rewards.push(states.iter().map(|s| s.reward).collect());
            dones.push(states.iter().map(|s| s.done).collect());
        }
        let summary = RewardSummary::of(&episode_returns(&rewards, &dones));
        self.last = Some(summary);
        summary
    }
}

impl PolicyParamsHook for RolloutCaptureHook {
    fn on_policy_params(&mut self, step: u64, policy: &dyn Policy) {
        let summary = self.capture(policy);
        tracing::info!(
            "Collected rollouts at step {step} with reward {:.3} +- {:.3}",
            summary.mean,
            summary.std
        );
    }
}
