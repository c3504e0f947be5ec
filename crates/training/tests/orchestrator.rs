use chrono::NaiveDate;
use config_tree::{ConfigTree, ConfigValue, OverrideSet, NETWORK_FACTORY};
use envs::locomotion::joystick::{default_config, Joystick, Terrain};
use envs::locomotion::SUITE_NAME;
use envs::{EnvError, Environment, EnvironmentDescriptor, Registry, Snapshot};
use image::RgbImage;
use render::{RenderError, RenderSettings, Renderer, VideoWriter};
use std::fs;
use std::path::{Path, PathBuf};
use training::checkpoint::list_checkpoints;
use training::orchestrator::experiment_name;
use training::progress::EVAL_REWARD;
use training::params::locomotion_ppo_config;
use training::search::POLICY_FILE;
use training::{
    prepare, run, train, LinearPolicy, Metrics, Policy, RandomSearchTrainer, RunOptions, TrainRequest, Trainer,
    TrainingError,
};

fn now() -> chrono::NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 3, 4).unwrap().and_hms_opt(5, 6, 7).unwrap()
}

fn options(logdir: &Path) -> RunOptions {
    RunOptions { logdir: logdir.to_path_buf(), video_dir: logdir.join("videos"), ..RunOptions::default() }
}

#[derive(Default)]
struct Seen {
    num_timesteps: u64,
    restore: Option<PathBuf>,
    save: PathBuf,
    randomized: bool,
    policy_obs_key: String,
}

/// Reports out-of-order progress and returns a zero policy.
#[derive(Default)]
struct ScriptedTrainer {
    seen: Seen,
}

impl Trainer for ScriptedTrainer {
    fn train(&mut self, request: TrainRequest<'_>) -> anyhow::Result<Box<dyn Policy>> {
        self.seen = Seen {
            num_timesteps: request.params.num_timesteps()?,
            restore: request.restore_checkpoint_path.map(Path::to_path_buf),
            save: request.save_checkpoint_path.to_path_buf(),
            randomized: request.randomization_fn.is_some(),
            policy_obs_key: request.params.network_factory.policy_obs_key().to_string(),
        };
        for (step, reward) in [(0, 0.0), (10, 1.0), (5, 9.0), (20, 2.0)] {
            (request.progress)(step, &Metrics::from([(EVAL_REWARD.to_string(), reward)]));
        }
        let env = request.environment;
        let policy = LinearPolicy::zeros("state", env.observation_size()["state"], env.action_size());
        request.policy_params.on_policy_params(20, &policy);
        Ok(Box::new(policy))
    }
}

#[test]
fn experiment_name_has_timestamp_and_suffix() {
    assert_eq!(experiment_name("G1JoystickFlatTerrain", &now(), None), "G1JoystickFlatTerrain-20250304-050607");
    assert_eq!(experiment_name("Go", &now(), Some("try2")), "Go-20250304-050607-try2");
}

#[test]
fn unknown_environment_touches_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let logs = dir.path().join("logs");
    let opts = RunOptions { env_name: "Humanoid".to_string(), ..options(&logs) };

    let err = prepare(&Registry::with_default_suites(), &opts, &now()).err().unwrap();

    match err {
        TrainingError::Env(EnvError::UnknownEnvironment { name, available }) => {
            assert_eq!(name, "Humanoid");
            assert!(available.contains(&"G1JoystickFlatTerrain".to_string()));
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert!(!logs.exists());
}

#[test]
fn unknown_agent_touches_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let logs = dir.path().join("logs");
    let opts = RunOptions { agent: "sac".to_string(), ..options(&logs) };

    let err = prepare(&Registry::with_default_suites(), &opts, &now()).err().unwrap();

    assert!(matches!(err, TrainingError::UnknownAgent { .. }));
    assert!(!logs.exists());
}

#[test]
fn configs_are_persisted_next_to_checkpoints() {
    let dir = tempfile::tempdir().unwrap();
    let mut overrides = OverrideSet::new();
    overrides.root("learning_rate", 1e-3, true);
    overrides.root("num_envs", 4, false);
    overrides.network("policy_obs_key", "privileged_state", true);
    overrides.network("policy_hidden_layer_sizes", vec![7_usize, 7], true);
    let opts = RunOptions { suffix: Some("lr".to_string()), overrides, ..options(dir.path()) };

    let prepared = prepare(&Registry::with_default_suites(), &opts, &now()).unwrap();

    assert_eq!(prepared.experiment_name, "G1JoystickFlatTerrain-20250304-050607-lr");
    assert_eq!(prepared.logdir, dir.path().join(&prepared.experiment_name));
    assert_eq!(prepared.checkpoint_write_dir, prepared.logdir.join("checkpoints"));
    assert!(prepared.checkpoint_write_dir.is_dir());
    assert!(prepared.checkpoint_restore_path.is_none());

    let env_config = ConfigTree::load_json(&prepared.checkpoint_write_dir.join("config.json")).unwrap();
    assert_eq!(env_config.get_str("impl"), Some("jax"));
    assert_eq!(env_config, prepared.env_config);

    let params = ConfigTree::load_json(&prepared.checkpoint_write_dir.join("training_params.json")).unwrap();
    assert_eq!(params, prepared.rl_params);
    assert_eq!(params.get_i64("num_eval_envs"), Some(128));
    assert_eq!(
        params.get_path("network_factory.policy_hidden_layer_sizes").and_then(ConfigValue::as_usize_list),
        Some(vec![7, 7])
    );
    assert_eq!(params.get_path("network_factory.policy_obs_key").and_then(ConfigValue::as_str), Some("privileged_state"));
    let defaults = locomotion_ppo_config();
    let network = params.subtree(NETWORK_FACTORY).unwrap();
    assert_eq!(network.get("value_hidden_layer_sizes"), defaults.get_path("network_factory.value_hidden_layer_sizes"));
    assert_eq!(network.get("value_obs_key"), defaults.get_path("network_factory.value_obs_key"));
    assert_eq!(params.get_f64("learning_rate"), Some(1e-3));
    assert_eq!(params.get_i64("num_envs"), Some(8192));

    assert_eq!(prepared.params.network_factory.policy_obs_key(), "privileged_state");
    assert_eq!(prepared.params.network_factory.value_obs_key(), "privileged_state");
}

#[test]
fn flags_without_a_field_are_dropped() {
    let dir = tempfile::tempdir().unwrap();
    let mut overrides = OverrideSet::new();
    overrides.root("clipping_epsilon", 0.3, true);
    let opts = RunOptions { agent: "fql".to_string(), overrides, ..options(dir.path()) };

    let prepared = prepare(&Registry::with_default_suites(), &opts, &now()).unwrap();

    assert_eq!(prepared.merge_report.dropped, vec!["clipping_epsilon".to_string()]);
    assert!(!prepared.rl_params.contains_key("clipping_epsilon"));
}

#[test]
fn requested_sinks_are_attached() {
    let dir = tempfile::tempdir().unwrap();
    let opts = RunOptions { use_tracker: true, use_dashboard: true, ..options(dir.path()) };

    let prepared = prepare(&Registry::with_default_suites(), &opts, &now()).unwrap();

    assert_eq!(prepared.progress.sink_names(), vec!["console", "tracker", "dashboard"]);
    assert!(prepared.logdir.join("tracker").join("config.json").is_file());
}

#[test]
fn play_only_skips_training_and_remote_sinks() {
    let dir = tempfile::tempdir().unwrap();
    let opts = RunOptions { play_only: true, use_tracker: true, use_dashboard: true, ..options(dir.path()) };

    let mut prepared = prepare(&Registry::with_default_suites(), &opts, &now()).unwrap();
    assert_eq!(prepared.progress.sink_names(), vec!["console"]);
    assert!(prepared.checkpoint_write_dir.is_dir());

    let mut trainer = ScriptedTrainer::default();
    train(&mut prepared, &mut trainer).unwrap();
    assert_eq!(trainer.seen.num_timesteps, 0);
}

#[test]
fn latest_checkpoint_is_restored() {
    let dir = tempfile::tempdir().unwrap();
    let saved = dir.path().join("saved");
    for step in ["1", "20", "3"] {
        fs::create_dir_all(saved.join(step)).unwrap();
    }
    let opts = RunOptions { load_checkpoint_path: Some(saved.clone()), ..options(&dir.path().join("logs")) };

    let mut prepared = prepare(&Registry::with_default_suites(), &opts, &now()).unwrap();
    let mut trainer = ScriptedTrainer::default();
    train(&mut prepared, &mut trainer).unwrap();

    let restored = trainer.seen.restore.unwrap();
    assert_eq!(restored, fs::canonicalize(saved.join("20")).unwrap());
    assert_eq!(trainer.seen.save, prepared.checkpoint_write_dir);
}

#[test]
fn empty_restore_directory_fails_before_training() {
    let dir = tempfile::tempdir().unwrap();
    let saved = dir.path().join("saved");
    fs::create_dir_all(&saved).unwrap();
    let opts = RunOptions { load_checkpoint_path: Some(saved), ..options(&dir.path().join("logs")) };

    let err = prepare(&Registry::with_default_suites(), &opts, &now()).err().unwrap();
    assert!(matches!(err, TrainingError::Checkpoint(_)));
}

#[test]
fn randomizer_reaches_the_trainer() {
    let dir = tempfile::tempdir().unwrap();
    let opts = RunOptions { domain_randomization: true, ..options(dir.path()) };

    let mut prepared = prepare(&Registry::with_default_suites(), &opts, &now()).unwrap();
    let mut trainer = ScriptedTrainer::default();
    train(&mut prepared, &mut trainer).unwrap();

    assert!(trainer.seen.randomized);
    assert_eq!(trainer.seen.policy_obs_key, "state");
}

#[test]
fn missing_randomizer_trains_without_one() {
    let dir = tempfile::tempdir().unwrap();
    let mut registry = Registry::with_default_suites();
    registry.register(
        SUITE_NAME,
        EnvironmentDescriptor::new(
            "PlainJoystick",
            |config, overrides| Ok(Box::new(Joystick::new(Terrain::Flat, config, overrides)?) as Box<dyn Environment>),
            default_config,
        ),
    );
    let opts = RunOptions {
        env_name: "PlainJoystick".to_string(),
        domain_randomization: true,
        ..options(dir.path())
    };

    let mut prepared = prepare(&registry, &opts, &now()).unwrap();
    assert!(prepared.randomizer.is_none());

    let mut trainer = ScriptedTrainer::default();
    train(&mut prepared, &mut trainer).unwrap();
    assert!(!trainer.seen.randomized);
}

#[test]
fn out_of_order_progress_is_dropped() {
    let dir = tempfile::tempdir().unwrap();
    let opts = RunOptions { use_dashboard: true, rscope_envs: Some(2), ..options(dir.path()) };

    let mut prepared = prepare(&Registry::with_default_suites(), &opts, &now()).unwrap();
    let outcome = train(&mut prepared, &mut ScriptedTrainer::default()).unwrap();
    assert!(outcome.timings.is_some());

    let events = fs::read_to_string(prepared.logdir.join("scalars.jsonl")).unwrap();
    let steps: Vec<u64> = events
        .lines()
        .map(|l| serde_json::from_str::<serde_json::Value>(l).unwrap()["step"].as_u64().unwrap())
        .collect();
    assert_eq!(steps, vec![0, 10, 20]);
}

struct BlankRenderer;

impl Renderer for BlankRenderer {
    fn render(&mut self, trajectory: &[Snapshot], _settings: &RenderSettings) -> Result<Vec<RgbImage>, RenderError> {
        Ok(vec![RgbImage::new(4, 4); trajectory.len()])
    }
}

#[derive(Default)]
struct CountingWriter {
    frames: Vec<usize>,
}

impl VideoWriter for CountingWriter {
    fn write(&mut self, path: &Path, frames: &[RgbImage], _fps: f64) -> Result<PathBuf, RenderError> {
        self.frames.push(frames.len());
        Ok(path.to_path_buf())
    }
}

fn tiny_overrides() -> OverrideSet {
    let mut overrides = OverrideSet::new();
    overrides
        .root("num_timesteps", 20, true)
        .root("num_evals", 2, true)
        .root("episode_length", 5, true)
        .root("num_envs", 2, true)
        .root("num_eval_envs", 2, true);
    overrides
}

#[test]
fn train_then_play_from_checkpoint() {
    let dir = tempfile::tempdir().unwrap();
    let registry = Registry::with_default_suites();

    let train_opts = RunOptions {
        suffix: Some("train".to_string()),
        num_videos: 2,
        overrides: tiny_overrides(),
        ..options(dir.path())
    };
    let mut writer = CountingWriter::default();
    let summary = run(&registry, &train_opts, &mut RandomSearchTrainer, &mut BlankRenderer, &mut writer).unwrap();

    assert_eq!(summary.videos.len(), 2);
    assert_eq!(summary.failed_videos, 0);
    assert_eq!(writer.frames, vec![3, 3]);
    let checkpoints = list_checkpoints(&summary.checkpoint_dir).unwrap();
    assert_eq!(checkpoints.iter().map(|(s, _)| *s).collect::<Vec<_>>(), vec![20]);
    assert!(checkpoints[0].1.join(POLICY_FILE).is_file());

    let play_opts = RunOptions {
        suffix: Some("play".to_string()),
        play_only: true,
        load_checkpoint_path: Some(summary.checkpoint_dir.clone()),
        overrides: tiny_overrides(),
        ..options(dir.path())
    };
    let replay = run(&registry, &play_opts, &mut RandomSearchTrainer, &mut BlankRenderer, &mut writer).unwrap();

    assert_eq!(replay.videos, vec![dir.path().join("videos").join("rollout0.mp4")]);
    assert!(list_checkpoints(&replay.checkpoint_dir).unwrap().is_empty());
}
