use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("nothing to render: trajectory is empty")]
    EmptyTrajectory,
    #[error("snapshot {index} has {len} qpos entries, expected at least {expected}")]
    ShortState { index: usize, len: usize, expected: usize },
    #[error("frame size {width}x{height} is invalid")]
    InvalidFrameSize { width: u32, height: u32 },
    #[error("frame {index} is {got:?}, expected {expected:?}")]
    FrameSizeMismatch { index: usize, got: (u32, u32), expected: (u32, u32) },
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Image(#[from] image::ImageError),
    #[error("encoder exited with {0}")]
    Encoder(String),
}
