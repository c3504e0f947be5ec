//! # Training Run Driver
//!
//! Resolves configuration once, builds the train and eval environments,
//! wires checkpoints, randomization, progress sinks and the policy-parameter
//! hook, calls the trainer, then records and renders evaluation rollouts.
//!
//! Everything that can fail on bad input (unknown environment or agent,
//! malformed parameters) is checked in [`prepare`] before anything touches
//! the filesystem.

use crate::agent::Agent;
use crate::checkpoint;
use crate::error::TrainingError;
use crate::hooks::{NoopHook, PolicyParamsHook, RolloutCaptureHook};
use crate::params::{rl_config, TrainingParams};
use crate::progress::{ConsoleSink, DashboardSink, ProgressFanout, Timings, TrackerSink};
use crate::rollout::{record, rollout_seeds, RolloutRecorder};
use crate::trainer::{Metrics, Policy, TrainRequest, Trainer};
use chrono::NaiveDateTime;
use config_tree::{ConfigTree, MergeReport, OverrideSet};
use envs::{DomainRandomizer, Environment, Registry};
use render::{Renderer, VideoWriter};
use std::fs;
use std::path::{Path, PathBuf};

/// What the caller asked for. `overrides` carries the hyperparameter flags.
#[derive(Clone, Debug)]
pub struct RunOptions {
    pub env_name: String,
    pub agent: String,
    /// Simulation backend recorded in the environment config under `impl`.
    pub backend: String,
    pub suffix: Option<String>,
    pub play_only: bool,
    pub use_tracker: bool,
    pub use_dashboard: bool,
    pub load_checkpoint_path: Option<PathBuf>,
    pub domain_randomization: bool,
    pub seed: u64,
    pub rscope_envs: Option<usize>,
    pub deterministic_rscope: bool,
    pub num_videos: usize,
    /// Parent of every experiment directory.
    pub logdir: PathBuf,
    /// Where `rollout<i>.mp4` files go.
    pub video_dir: PathBuf,
    pub overrides: OverrideSet,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            env_name: "G1JoystickFlatTerrain".to_string(),
            agent: Agent::Ppo.name().to_string(),
            backend: "jax".to_string(),
            suffix: None,
            play_only: false,
            use_tracker: false,
            use_dashboard: false,
            load_checkpoint_path: None,
            domain_randomization: false,
            seed: 1,
            rscope_envs: None,
            deterministic_rscope: true,
            num_videos: 1,
            logdir: PathBuf::from("logs"),
            video_dir: PathBuf::from("."),
            overrides: OverrideSet::new(),
        }
    }
}

/// `<env>-<YYYYmmdd-HHMMSS>[-<suffix>]`.
#[must_use]
pub fn experiment_name(env_name: &str, now: &NaiveDateTime, suffix: Option<&str>) -> String {
    let mut name = format!("{env_name}-{}", now.format("%Y%m%d-%H%M%S"));
    if let Some(suffix) = suffix {
        name.push('-');
        name.push_str(suffix);
    }
    name
}

/// A fully prepared run: resolved configuration, environments and wiring.
pub struct TrainingRun {
    pub env_name: String,
    pub agent: Agent,
    pub seed: u64,
    pub experiment_name: String,
    pub logdir: PathBuf,
    pub env_config: ConfigTree,
    /// Hyperparameters after overrides, including `network_factory`.
    pub rl_params: ConfigTree,
    pub params: TrainingParams,
    pub merge_report: MergeReport,
    pub train_env: Box<dyn Environment>,
    pub eval_env: Box<dyn Environment>,
    pub checkpoint_write_dir: PathBuf,
    pub checkpoint_restore_path: Option<PathBuf>,
    pub randomizer: Option<DomainRandomizer>,
    pub progress: ProgressFanout,
    pub policy_params: Box<dyn PolicyParamsHook>,
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> TrainingError + '_ {
    move |source| TrainingError::Io { path: path.to_path_buf(), source }
}

/// Resolves configuration and builds everything the trainer needs.
pub fn prepare(registry: &Registry, options: &RunOptions, now: &NaiveDateTime) -> Result<TrainingRun, TrainingError> {
    let agent: Agent = options.agent.parse()?;
    let env_name = options.env_name.as_str();

    let mut env_config = registry.get_default_config(env_name)?;
    env_config.insert("impl", options.backend.as_str());

    let mut rl_params = rl_config(registry, env_name, agent)?;
    let merge_report = rl_params.merge(&options.overrides);
    for dropped in &merge_report.dropped {
        tracing::warn!("{agent} has no parameter '{dropped}'; flag ignored");
    }
    if options.play_only {
        rl_params.insert("num_timesteps", 0);
    }
    let params = TrainingParams::from_config(&rl_params)?;

    let train_env = registry.load(env_name, Some(env_config.clone()), None)?;
    let eval_env = registry.load(env_name, Some(env_config.clone()), None)?;
    let rscope_env = match options.rscope_envs {
        Some(n) if n > 0 => Some((n, registry.load(env_name, Some(env_config.clone()), None)?)),
        _ => None,
    };

    let randomizer = if options.domain_randomization {
        let randomizer = registry.get_domain_randomizer(env_name);
        if randomizer.is_none() {
            tracing::warn!("domain randomization requested but '{env_name}' has no randomizer; training without it");
        }
        randomizer
    } else {
        None
    };

    let episode_length = params.episode_length()?;
    let policy_params: Box<dyn PolicyParamsHook> = match rscope_env {
        Some((n, env)) => Box::new(
            RolloutCaptureHook::new(env, n, episode_length, options.seed)
                .deterministic(options.deterministic_rscope)
                .with_randomizer(randomizer.clone()),
        ),
        None => Box::new(NoopHook),
    };

    let console = ConsoleSink::new(params.flag("run_evals", true)?, params.flag("log_training_metrics", false)?);

    tracing::info!("Environment Config ({env_name}):\n{env_config}");
    tracing::info!("{agent} Training Parameters:\n{rl_params}");

    let exp_name = experiment_name(env_name, now, options.suffix.as_deref());
    tracing::info!("Experiment name: {exp_name}");
    let logdir = if options.logdir.is_absolute() {
        options.logdir.join(&exp_name)
    } else {
        std::env::current_dir()
            .map_err(io_error(&options.logdir))?
            .join(&options.logdir)
            .join(&exp_name)
    };
    fs::create_dir_all(&logdir).map_err(io_error(&logdir))?;
    tracing::info!("Logs are being stored in: {}", logdir.display());

    let checkpoint_write_dir = logdir.join("checkpoints");
    fs::create_dir_all(&checkpoint_write_dir).map_err(io_error(&checkpoint_write_dir))?;
    tracing::info!("Checkpoint path: {}", checkpoint_write_dir.display());
    let checkpoint_restore_path = checkpoint::resolve_restore_path(options.load_checkpoint_path.as_deref())?;

    env_config.save_json(&checkpoint_write_dir.join("config.json"))?;
    rl_params.save_json(&checkpoint_write_dir.join("training_params.json"))?;

    let progress = progress_sinks(options, console, &logdir, &exp_name, &env_config);

    Ok(TrainingRun {
        env_name: env_name.to_string(),
        agent,
        seed: options.seed,
        experiment_name: exp_name,
        logdir,
        env_config,
        rl_params,
        params,
        merge_report,
        train_env,
        eval_env,
        checkpoint_write_dir,
        checkpoint_restore_path,
        randomizer,
        progress,
        policy_params,
    })
}

/// Console always; tracker and dashboard when requested and not play-only.
/// A sink that cannot start is logged and left out.
fn progress_sinks(
    options: &RunOptions,
    console: ConsoleSink,
    logdir: &Path,
    experiment_name: &str,
    env_config: &ConfigTree,
) -> ProgressFanout {
    let mut fanout = ProgressFanout::new().with_sink(Box::new(console));
    if options.play_only {
        return fanout;
    }
    if options.use_tracker {
        match TrackerSink::init(logdir, experiment_name, &options.env_name, env_config) {
            Ok(sink) => fanout.push(Box::new(sink)),
            Err(err) => tracing::warn!("tracker disabled: {err:#}"),
        }
    }
    if options.use_dashboard {
        match DashboardSink::create(logdir) {
            Ok(sink) => fanout.push(Box::new(sink)),
            Err(err) => tracing::warn!("dashboard disabled: {err:#}"),
        }
    }
    fanout
}

/// Trainer output plus wall-clock timings.
pub struct TrainOutcome {
    pub policy: Box<dyn Policy>,
    pub timings: Option<Timings>,
}

/// Hands the prepared run to `trainer`.
pub fn train(run: &mut TrainingRun, trainer: &mut dyn Trainer) -> anyhow::Result<TrainOutcome> {
    let TrainingRun {
        train_env,
        eval_env,
        params,
        seed,
        randomizer,
        checkpoint_restore_path,
        checkpoint_write_dir,
        progress,
        policy_params,
        ..
    } = run;

    let mut report = |step: u64, metrics: &Metrics| progress.report(step, metrics);
    let policy = trainer.train(TrainRequest {
        environment: &**train_env,
        eval_env: &**eval_env,
        params: &*params,
        seed: *seed,
        randomization_fn: randomizer.clone(),
        restore_checkpoint_path: checkpoint_restore_path.as_deref(),
        save_checkpoint_path: checkpoint_write_dir.as_path(),
        progress: &mut report,
        policy_params: &mut **policy_params,
    })?;
    progress.finish();

    tracing::info!("Done training.");
    let timings = progress.timings();
    if let Some(t) = timings {
        tracing::info!("Time to first progress: {:.3}s", t.to_first_progress.as_secs_f64());
        tracing::info!("Time to train: {:.3}s", t.training.as_secs_f64());
    }
    Ok(TrainOutcome { policy, timings })
}

/// Result of a complete run.
#[derive(Debug)]
pub struct RunSummary {
    pub experiment_name: String,
    pub logdir: PathBuf,
    pub checkpoint_dir: PathBuf,
    pub videos: Vec<PathBuf>,
    pub failed_videos: usize,
    pub timings: Option<Timings>,
}

/// Prepares, trains, records `num_videos` evaluation rollouts and renders them.
pub fn run(
    registry: &Registry,
    options: &RunOptions,
    trainer: &mut dyn Trainer,
    renderer: &mut dyn Renderer,
    writer: &mut dyn VideoWriter,
) -> anyhow::Result<RunSummary> {
    let now = chrono::Local::now().naive_local();
    let mut prepared = prepare(registry, options, &now)?;
    let outcome = train(&mut prepared, trainer)?;

    tracing::info!("Starting inference...");
    let seeds = rollout_seeds(prepared.seed, options.num_videos);
    let episode_length = prepared.params.episode_length()?;
    let trajectories = record(&*prepared.eval_env, &*outcome.policy, &seeds, episode_length);

    let mut recorder = RolloutRecorder::new(renderer, writer).output_dir(&options.video_dir);
    let results = recorder.render_all(&trajectories, prepared.eval_env.dt());
    let failed_videos = results.iter().filter(|r| r.is_err()).count();
    let videos = results.into_iter().filter_map(Result::ok).collect();

    Ok(RunSummary {
        experiment_name: prepared.experiment_name,
        logdir: prepared.logdir,
        checkpoint_dir: prepared.checkpoint_write_dir,
        videos,
        failed_videos,
        timings: outcome.timings,
    })
}
