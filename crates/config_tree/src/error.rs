use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config key '{0}' does not exist")]
    UnknownKey(String),
    #[error("config key '{key}' expected {expected}")]
    TypeMismatch { key: String, expected: &'static str },
    #[error("config root must be a JSON object")]
    NotAnObject,
    #[error("failed to (de)serialize config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),
}
