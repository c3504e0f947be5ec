//! # Evaluation Rollouts
//!
//! Runs a trained policy on a batch of freshly reset environments in
//! lockstep, keeps the fixed [`Snapshot`] schema for each step, and renders
//! every rollout to `rollout<i>.mp4`.

use crate::trainer::Policy;
use envs::{reset_batch, step_batch, Environment, Snapshot};
use render::{RenderSettings, Renderer, VideoWriter};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Default frame stride: render every second control step.
pub const RENDER_EVERY: usize = 2;

/// One rollout's snapshots, one per control step.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Trajectory {
    pub snapshots: Vec<Snapshot>,
}

impl Trajectory {
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Every `every`-th snapshot starting with the first.
    #[must_use]
    pub fn downsample(&self, every: usize) -> Vec<Snapshot> {
        self.snapshots.iter().step_by(every.max(1)).cloned().collect()
    }
}

/// Video frame rate for a control timestep `dt` rendered every `every` steps.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn frame_rate(dt: f64, every: usize) -> f64 {
    1.0 / dt / every.max(1) as f64
}

/// `count` distinct reset seeds derived from the run seed.
#[must_use]
pub fn rollout_seeds(seed: u64, count: usize) -> Vec<u64> {
    let mut rng = fastrand::Rng::with_seed(seed);
    let mut seen = BTreeSet::new();
    let mut seeds = Vec::with_capacity(count);
    while seeds.len() < count {
        let s = rng.u64(..);
        if seen.insert(s) {
            seeds.push(s);
        }
    }
    seeds
}

/// Records one trajectory per seed with deterministic policy actions.
///
/// All instances finish step `t` before any starts `t + 1`.
#[must_use]
pub fn record(env: &dyn Environment, policy: &dyn Policy, seeds: &[u64], episode_length: usize) -> Vec<Trajectory> {
    let mut trajectories = vec![Trajectory { snapshots: Vec::with_capacity(episode_length) }; seeds.len()];
    let mut states = reset_batch(env, seeds);
    for _ in 0..episode_length {
        let actions: Vec<Vec<f32>> = states.iter().map(|s| policy.act(&s.obs, None)).collect();
        states = step_batch(env, &states, &actions);
        for (trajectory, state) in trajectories.iter_mut().zip(&states) {
            trajectory.snapshots.push(state.data.snapshot());
        }
    }
    trajectories
}

/// Renders trajectories and writes one video per rollout.
pub struct RolloutRecorder<'a> {
    renderer: &'a mut dyn Renderer,
    writer: &'a mut dyn VideoWriter,
    settings: RenderSettings,
    render_every: usize,
    output_dir: PathBuf,
}

impl<'a> RolloutRecorder<'a> {
    pub fn new(renderer: &'a mut dyn Renderer, writer: &'a mut dyn VideoWriter) -> Self {
        Self {
            renderer,
            writer,
            settings: RenderSettings::default(),
            render_every: RENDER_EVERY,
            output_dir: PathBuf::from("."),
        }
    }

    #[must_use]
    pub fn render_every(mut self, every: usize) -> Self {
        self.render_every = every.max(1);
        self
    }

    #[must_use]
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    #[must_use]
    pub fn settings(mut self, settings: RenderSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Path the `index`-th rollout is written to.
    #[must_use]
    pub fn video_path(&self, index: usize) -> PathBuf {
        self.output_dir.join(format!("rollout{index}.mp4"))
    }

    /// Renders and writes each trajectory independently. A failing rollout is
    /// logged and the rest still get written; the result holds one entry per
    /// trajectory.
    pub fn render_all(&mut self, trajectories: &[Trajectory], dt: f64) -> Vec<anyhow::Result<PathBuf>> {
        let fps = frame_rate(dt, self.render_every);
        tracing::info!("FPS for rendering: {fps}");
        trajectories
            .iter()
            .enumerate()
            .map(|(i, trajectory)| {
                let path = self.video_path(i);
                let result = self.render_one(trajectory, &path, fps);
                match &result {
                    Ok(written) => tracing::info!("Rollout video saved as '{}'.", written.display()),
                    Err(err) => tracing::warn!("rollout {i} failed: {err:#}"),
                }
                result
            })
            .collect()
    }

    fn render_one(&mut self, trajectory: &Trajectory, path: &Path, fps: f64) -> anyhow::Result<PathBuf> {
        let frames = self.renderer.render(&trajectory.downsample(self.render_every), &self.settings)?;
        Ok(self.writer.write(path, &frames, fps)?)
    }
}
