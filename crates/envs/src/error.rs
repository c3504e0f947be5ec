use config_tree::ConfigError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EnvError {
    #[error("environment '{name}' not found; available environments: [{}]", .available.join(", "))]
    UnknownEnvironment { name: String, available: Vec<String> },
    #[error("required asset bundle missing at {0}")]
    MissingAssets(PathBuf),
    #[error("invalid environment config: {0}")]
    Config(#[from] ConfigError),
}
