use config_tree::ConfigError;
use envs::EnvError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CheckpointError {
    #[error("no checkpoint found in {0}")]
    NoCheckpointFound(PathBuf),
    #[error("checkpoint directory {dir} contains non-numeric entry '{name}'")]
    MalformedCheckpointName { dir: PathBuf, name: String },
    #[error("cannot read checkpoint path {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum TrainingError {
    #[error("agent '{name}' not found; available agents: [{}]", .available.join(", "))]
    UnknownAgent { name: String, available: Vec<String> },
    #[error("no training parameters for environment '{env}' in suite '{suite}'")]
    NoTrainingConfig { env: String, suite: String },
    #[error("training parameter '{key}' {reason}")]
    InvalidParameter { key: String, reason: String },
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Env(#[from] EnvError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),
}
