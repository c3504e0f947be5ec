//! # Command Line
//!
//! Every hyperparameter flag shows its default in `--help`, but only flags
//! whose value came from the command line end up in the [`OverrideSet`];
//! everything else keeps the task's own defaults.

use clap::parser::ValueSource;
use clap::{ArgAction, ArgMatches, Args, CommandFactory, FromArgMatches, Parser, ValueEnum};
use config_tree::OverrideSet;
use std::ffi::OsString;
use std::path::PathBuf;
use training::RunOptions;

/// Simulation backend recorded in the environment config.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    #[default]
    Jax,
    Warp,
}

impl Backend {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Backend::Jax => "jax",
            Backend::Warp => "warp",
        }
    }
}

#[derive(Parser, Debug, Clone)]
#[command(name = "playground", version, about = "Train and evaluate policies on registered locomotion tasks")]
pub struct Cli {
    /// Registered environment to train on.
    #[arg(long, default_value = "G1JoystickFlatTerrain")]
    pub env_name: String,

    /// Training agent (ppo or fql).
    #[arg(long, default_value = "ppo")]
    pub agent: String,

    #[arg(long = "impl", value_enum, default_value_t = Backend::Jax)]
    pub backend: Backend,

    /// Appended to the experiment name.
    #[arg(long)]
    pub suffix: Option<String>,

    /// Only restore a policy and record rollouts; no training.
    #[arg(long)]
    pub play_only: bool,

    /// Record an offline experiment-tracker run (ignored with --play-only).
    #[arg(long)]
    pub use_tracker: bool,

    /// Write dashboard scalar events (ignored with --play-only).
    #[arg(long)]
    pub use_dashboard: bool,

    /// Checkpoint file, or a directory of numbered checkpoints to take the latest from.
    #[arg(long)]
    pub load_checkpoint_path: Option<PathBuf>,

    #[arg(long)]
    pub domain_randomization: bool,

    #[arg(long, default_value_t = 1)]
    pub seed: u64,

    /// Rollouts to run each time the trainer publishes new policy parameters.
    #[arg(long)]
    pub rscope_envs: Option<usize>,

    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub deterministic_rscope: bool,

    /// Rollout videos to record after training.
    #[arg(long, default_value_t = 1)]
    pub num_videos: usize,

    /// Parent directory for experiment logs and checkpoints.
    #[arg(long, default_value = "logs")]
    pub logdir: PathBuf,

    /// Where rollout videos are written.
    #[arg(long, default_value = ".")]
    pub video_dir: PathBuf,

    /// Directory holding model assets; checked before an environment is built.
    #[arg(long)]
    pub assets_dir: Option<PathBuf>,

    #[command(flatten)]
    pub hyperparameters: Hyperparameters,
}

#[derive(Args, Debug, Clone)]
#[command(next_help_heading = "Training hyperparameters")]
pub struct Hyperparameters {
    #[arg(long, default_value_t = 1_000_000)]
    pub num_timesteps: u64,
    #[arg(long, default_value_t = 5)]
    pub num_evals: u64,
    #[arg(long, default_value_t = 0.1)]
    pub reward_scaling: f64,
    #[arg(long, default_value_t = 1000)]
    pub episode_length: u64,
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub normalize_observations: bool,
    #[arg(long, default_value_t = 1)]
    pub action_repeat: u64,
    #[arg(long, default_value_t = 10)]
    pub unroll_length: u64,
    #[arg(long, default_value_t = 8)]
    pub num_minibatches: u64,
    #[arg(long, default_value_t = 8)]
    pub num_updates_per_batch: u64,
    #[arg(long, default_value_t = 0.97)]
    pub discounting: f64,
    #[arg(long, default_value_t = 5e-4)]
    pub learning_rate: f64,
    #[arg(long, default_value_t = 5e-3)]
    pub entropy_cost: f64,
    #[arg(long, default_value_t = 1024)]
    pub num_envs: u64,
    #[arg(long, default_value_t = 128)]
    pub num_eval_envs: u64,
    #[arg(long, default_value_t = 256)]
    pub batch_size: u64,
    #[arg(long, default_value_t = 1.0)]
    pub max_grad_norm: f64,
    #[arg(long, default_value_t = 0.2)]
    pub clipping_epsilon: f64,
    #[arg(long, value_delimiter = ',', default_values_t = [64, 64, 64])]
    pub policy_hidden_layer_sizes: Vec<usize>,
    #[arg(long, value_delimiter = ',', default_values_t = [64, 64, 64])]
    pub value_hidden_layer_sizes: Vec<usize>,
    #[arg(long, default_value = "state")]
    pub policy_obs_key: String,
    #[arg(long, default_value = "state")]
    pub value_obs_key: String,
    /// Run periodic evaluations.
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub run_evals: bool,
    /// Log mean training episode reward.
    #[arg(long, default_value_t = false, action = ArgAction::Set)]
    pub log_training_metrics: bool,
    /// Steps between training-metric logs.
    #[arg(long, default_value_t = 1_000_000)]
    pub training_metrics_steps: u64,
}

fn from_command_line(matches: &ArgMatches, id: &str) -> bool {
    matches.value_source(id) == Some(ValueSource::CommandLine)
}

impl Hyperparameters {
    /// Every hyperparameter flag, marked present only when typed on the
    /// command line.
    #[must_use]
    pub fn overrides(&self, matches: &ArgMatches) -> OverrideSet {
        let present = |id: &str| from_command_line(matches, id);
        let mut set = OverrideSet::new();
        set.root("num_timesteps", self.num_timesteps, present("num_timesteps"))
            .root("num_evals", self.num_evals, present("num_evals"))
            .root("reward_scaling", self.reward_scaling, present("reward_scaling"))
            .root("episode_length", self.episode_length, present("episode_length"))
            .root("normalize_observations", self.normalize_observations, present("normalize_observations"))
            .root("action_repeat", self.action_repeat, present("action_repeat"))
            .root("unroll_length", self.unroll_length, present("unroll_length"))
            .root("num_minibatches", self.num_minibatches, present("num_minibatches"))
            .root("num_updates_per_batch", self.num_updates_per_batch, present("num_updates_per_batch"))
            .root("discounting", self.discounting, present("discounting"))
            .root("learning_rate", self.learning_rate, present("learning_rate"))
            .root("entropy_cost", self.entropy_cost, present("entropy_cost"))
            .root("num_envs", self.num_envs, present("num_envs"))
            .root("num_eval_envs", self.num_eval_envs, present("num_eval_envs"))
            .root("batch_size", self.batch_size, present("batch_size"))
            .root("max_grad_norm", self.max_grad_norm, present("max_grad_norm"))
            .root("clipping_epsilon", self.clipping_epsilon, present("clipping_epsilon"))
            .root("run_evals", self.run_evals, present("run_evals"))
            .root("log_training_metrics", self.log_training_metrics, present("log_training_metrics"))
            .root("training_metrics_steps", self.training_metrics_steps, present("training_metrics_steps"));
        set.network(
            "policy_hidden_layer_sizes",
            self.policy_hidden_layer_sizes.clone(),
            present("policy_hidden_layer_sizes"),
        )
        .network(
            "value_hidden_layer_sizes",
            self.value_hidden_layer_sizes.clone(),
            present("value_hidden_layer_sizes"),
        )
        .network("policy_obs_key", self.policy_obs_key.clone(), present("policy_obs_key"))
        .network("value_obs_key", self.value_obs_key.clone(), present("value_obs_key"));
        set
    }
}

/// Parsed arguments plus the overrides that were explicitly supplied.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub cli: Cli,
    pub overrides: OverrideSet,
}

impl Invocation {
    /// Parses `args` (program name first).
    pub fn try_parse_from<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = Cli::command().try_get_matches_from(args)?;
        let cli = Cli::from_arg_matches(&matches)?;
        let overrides = cli.hyperparameters.overrides(&matches);
        Ok(Self { cli, overrides })
    }

    /// Parses the process arguments, exiting with usage on error.
    #[must_use]
    pub fn parse() -> Self {
        Self::try_parse_from(std::env::args_os()).unwrap_or_else(|err| err.exit())
    }

    #[must_use]
    pub fn run_options(&self) -> RunOptions {
        let cli = &self.cli;
        RunOptions {
            env_name: cli.env_name.clone(),
            agent: cli.agent.clone(),
            backend: cli.backend.name().to_string(),
            suffix: cli.suffix.clone(),
            play_only: cli.play_only,
            use_tracker: cli.use_tracker,
            use_dashboard: cli.use_dashboard,
            load_checkpoint_path: cli.load_checkpoint_path.clone(),
            domain_randomization: cli.domain_randomization,
            seed: cli.seed,
            rscope_envs: cli.rscope_envs,
            deterministic_rscope: cli.deterministic_rscope,
            num_videos: cli.num_videos,
            logdir: cli.logdir.clone(),
            video_dir: cli.video_dir.clone(),
            overrides: self.overrides.clone(),
        }
    }
}
