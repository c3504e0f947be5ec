#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
//! # Rollout Rendering
//!
//! Turns recorded trajectory snapshots into frames and frames into video.
//!
//! -   **[`Renderer`]:** snapshot sequence to RGB frames. [`SkeletonRenderer`]
//!     draws the base and limbs as lines from a tracking [`Camera`].
//! -   **[`VideoWriter`]:** frames to a file. [`FfmpegWriter`] pipes raw RGB
//!     into `ffmpeg`; [`PngSequenceWriter`] is the encoder-free fallback.

pub mod camera;
pub mod error;
pub mod scene;
pub mod skeleton;
pub mod video;

pub use camera::Camera;
pub use error::RenderError;
pub use scene::{Chain, RenderSettings, SceneOptions, Skeleton};
pub use skeleton::SkeletonRenderer;
pub use video::{default_writer, FfmpegWriter, PngSequenceWriter, VideoWriter};

use envs::Snapshot;
use image::RgbImage;

/// Renders one frame per snapshot.
pub trait Renderer {
    fn render(
        &mut self,
        trajectory: &[Snapshot],
        settings: &RenderSettings,
    ) -> Result<Vec<RgbImage>, RenderError>;
}
