use crate::model::Model;
use crate::state::State;
use config_tree::ConfigTree;
use std::collections::BTreeMap;

/// A batched-state control task.
///
/// Stepping is a function of `(model, state, action)`: the environment itself
/// holds no per-episode mutable state, so one instance can advance many
/// states, and a trainer can swap in randomized models per episode.
pub trait Environment: Send + Sync {
    /// Builds the initial state for one instance from `seed`.
    fn reset(&self, seed: u64) -> State;

    /// Advances `state` by one control step using `model`.
    fn step_with(&self, model: &Model, state: &State, action: &[f32]) -> State;

    /// Advances `state` using the nominal model.
    fn step(&self, state: &State, action: &[f32]) -> State {
        self.step_with(self.model(), state, action)
    }

    fn model(&self) -> &Model;

    /// The resolved configuration this instance was built from.
    fn config(&self) -> &ConfigTree;

    /// Control timestep in seconds.
    fn dt(&self) -> f64;

    fn action_size(&self) -> usize;

    fn observation_size(&self) -> BTreeMap<String, usize>;
}

/// Resets one instance per seed.
#[must_use]
pub fn reset_batch(env: &dyn Environment, seeds: &[u64]) -> Vec<State> {
    seeds.iter().map(|&s| env.reset(s)).collect()
}

/// Advances every instance by exactly one step.
///
/// All states finish step *t* before this returns, so callers looping over
/// `step_batch` keep the batch in lockstep.
///
/// # Panics
///
/// Panics if `states` and `actions` differ in length.
#[must_use]
pub fn step_batch(env: &dyn Environment, states: &[State], actions: &[Vec<f32>]) -> Vec<State> {
    assert_eq!(states.len(), actions.len(), "one action per state");
    states
        .iter()
        .zip(actions)
        .map(|(state, action)| env.step(state, action))
        .collect()
}
