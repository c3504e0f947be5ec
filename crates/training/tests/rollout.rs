use envs::{Environment, Registry, Snapshot};
use image::RgbImage;
use render::{RenderError, RenderSettings, Renderer, VideoWriter};
use std::path::{Path, PathBuf};
use training::hooks::episode_returns;
use training::rollout::{frame_rate, record, rollout_seeds};
use training::{LinearPolicy, PolicyParamsHook, RewardSummary, RolloutCaptureHook, RolloutRecorder, Trajectory};

fn flat_env() -> Box<dyn Environment> {
    Registry::with_default_suites().load("G1JoystickFlatTerrain", None, None).unwrap()
}

fn zero_policy(env: &dyn Environment) -> LinearPolicy {
    LinearPolicy::zeros("state", env.observation_size()["state"], env.action_size())
}

#[test]
fn one_snapshot_per_step_per_rollout() {
    let env = flat_env();
    let policy = zero_policy(env.as_ref());
    let trajectories = record(env.as_ref(), &policy, &rollout_seeds(7, 3), 50);

    assert_eq!(trajectories.len(), 3);
    for trajectory in &trajectories {
        assert_eq!(trajectory.len(), 50);
        let times: Vec<f64> = trajectory.snapshots.iter().map(|s| s.time).collect();
        assert!(times.windows(2).all(|w| w[1] > w[0]));
    }
}

#[test]
fn rollout_seeds_are_distinct_and_repeatable() {
    let seeds = rollout_seeds(1, 16);
    let mut unique = seeds.clone();
    unique.sort_unstable();
    unique.dedup();
    assert_eq!(unique.len(), 16);
    assert_eq!(seeds, rollout_seeds(1, 16));
    assert_ne!(seeds, rollout_seeds(2, 16));
}

#[test]
fn downsample_keeps_the_first_frame() {
    let env = flat_env();
    let policy = zero_policy(env.as_ref());
    let trajectory = record(env.as_ref(), &policy, &[3], 5).remove(0);
    let frames = trajectory.downsample(2);
    assert_eq!(frames.len(), 3);
    assert_eq!(frames[0], trajectory.snapshots[0]);
    assert_eq!(frames[2], trajectory.snapshots[4]);
}

#[test]
fn frame_rate_follows_control_step() {
    assert!((frame_rate(0.02, 2) - 25.0).abs() < 1e-9);
    assert!((frame_rate(0.02, 1) - 50.0).abs() < 1e-9);
}

#[test]
fn returns_stop_at_first_done() {
    let rewards = vec![vec![1.0, 1.0], vec![2.0, 2.0], vec![4.0, 4.0]];
    let dones = vec![vec![false, false], vec![true, false], vec![false, false]];
    assert_eq!(episode_returns(&rewards, &dones), vec![1.0, 7.0]);
    assert!(episode_returns(&[], &[]).is_empty());
}

#[test]
fn reward_summary_uses_population_std() {
    let summary = RewardSummary::of(&[1.0, 3.0]);
    assert!((summary.mean - 2.0).abs() < 1e-12);
    assert!((summary.std - 1.0).abs() < 1e-12);
}

#[test]
fn capture_hook_is_repeatable() {
    let env = flat_env();
    let policy = zero_policy(env.as_ref());
    let mut hook = RolloutCaptureHook::new(flat_env(), 4, 20, 11);
    assert!(hook.last_summary().is_none());

    let first = hook.capture(&policy);
    hook.on_policy_params(100, &policy);
    assert_eq!(hook.last_summary(), Some(first));
    assert!(first.mean.is_finite());
}

struct BlankRenderer;

impl Renderer for BlankRenderer {
    fn render(&mut self, trajectory: &[Snapshot], settings: &RenderSettings) -> Result<Vec<RgbImage>, RenderError> {
        Ok(vec![RgbImage::new(settings.width, settings.height); trajectory.len()])
    }
}

/// Fails the second rollout and records the rest.
#[derive(Default)]
struct FlakyWriter {
    calls: usize,
    written: Vec<(PathBuf, usize, f64)>,
}

impl VideoWriter for FlakyWriter {
    fn write(&mut self, path: &Path, frames: &[RgbImage], fps: f64) -> Result<PathBuf, RenderError> {
        self.calls += 1;
        if self.calls == 2 {
            return Err(RenderError::Encoder("encoder crashed".to_string()));
        }
        self.written.push((path.to_path_buf(), frames.len(), fps));
        Ok(path.to_path_buf())
    }
}

#[test]
fn one_failed_video_leaves_the_rest() {
    let env = flat_env();
    let policy = zero_policy(env.as_ref());
    let trajectories: Vec<Trajectory> = record(env.as_ref(), &policy, &rollout_seeds(5, 3), 10);

    let mut renderer = BlankRenderer;
    let mut writer = FlakyWriter::default();
    let results = RolloutRecorder::new(&mut renderer, &mut writer)
        .output_dir("videos")
        .settings(RenderSettings { width: 8, height: 6, ..RenderSettings::default() })
        .render_all(&trajectories, 0.02);

    assert_eq!(results.len(), 3);
    assert!(results[0].is_ok() && results[1].is_err() && results[2].is_ok());
    assert_eq!(writer.written[0].0, Path::new("videos").join("rollout0.mp4"));
    assert_eq!(writer.written[1].0, Path::new("videos").join("rollout2.mp4"));
    assert_eq!(writer.written[0].1, 5);
    assert!((writer.written[0].2 - 25.0).abs() < 1e-9);
}
