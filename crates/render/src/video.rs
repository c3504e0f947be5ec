//! Video sinks for rendered frames.

use crate::error::RenderError;
use image::RgbImage;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Encodes a frame sequence at a fixed frame rate.
pub trait VideoWriter {
    /// Writes `frames` to `path` and returns the location actually written.
    fn write(&mut self, path: &Path, frames: &[RgbImage], fps: f64) -> Result<PathBuf, RenderError>;
}

fn check_frames(frames: &[RgbImage]) -> Result<(u32, u32), RenderError> {
    let first = frames.first().ok_or(RenderError::EmptyTrajectory)?;
    let expected = first.dimensions();
    if let Some((index, frame)) = frames.iter().enumerate().find(|(_, f)| f.dimensions() != expected) {
        return Err(RenderError::FrameSizeMismatch { index, got: frame.dimensions(), expected });
    }
    Ok(expected)
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> RenderError + '_ {
    move |source| RenderError::Io { path: path.to_path_buf(), source }
}

/// H.264 mp4 through an external `ffmpeg` process fed raw RGB on stdin.
pub struct FfmpegWriter {
    program: PathBuf,
}

impl Default for FfmpegWriter {
    fn default() -> Self {
        Self { program: PathBuf::from("ffmpeg") }
    }
}

impl FfmpegWriter {
    #[must_use]
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self { program: program.into() }
    }

    /// True when the encoder binary can be launched.
    #[must_use]
    pub fn is_available(&self) -> bool {
        Command::new(&self.program)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok_and(|s| s.success())
    }
}

impl VideoWriter for FfmpegWriter {
    fn write(&mut self, path: &Path, frames: &[RgbImage], fps: f64) -> Result<PathBuf, RenderError> {
        let (width, height) = check_frames(frames)?;
        let mut child = Command::new(&self.program)
            .args(["-y", "-loglevel", "error", "-f", "rawvideo", "-pix_fmt", "rgb24"])
            .args(["-s", &format!("{width}x{height}"), "-r", &format!("{fps}")])
            .args(["-i", "-", "-an", "-vcodec", "libx264", "-pix_fmt", "yuv420p"])
            .arg(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(io_error(&self.program))?;

        // stdin is dropped before waiting so the encoder sees end of input.
        let fed = child.stdin.take().map_or(Ok(()), |mut stdin| {
            frames.iter().try_for_each(|frame| stdin.write_all(frame.as_raw()))
        });
        let output = child.wait_with_output().map_err(io_error(&self.program))?;
        if !output.status.success() {
            let message = String::from_utf8_lossy(&output.stderr).trim().to_string();
            if !message.is_empty() {
                return Err(RenderError::Encoder(message));
            }
            fed.map_err(io_error(path))?;
            return Err(RenderError::Encoder(output.status.to_string()));
        }
        fed.map_err(io_error(path))?;
        tracing::debug!("encoded {} frames at {fps:.1} fps into {}", frames.len(), path.display());
        Ok(path.to_path_buf())
    }
}

/// Writes `<stem>_frames/frame_00000.png, ...` next to the requested path.
///
/// Used where no encoder is installed; `fps.txt` records the playback rate.
#[derive(Default)]
pub struct PngSequenceWriter;

impl VideoWriter for PngSequenceWriter {
    fn write(&mut self, path: &Path, frames: &[RgbImage], fps: f64) -> Result<PathBuf, RenderError> {
        check_frames(frames)?;
        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("video");
        let dir = path.with_file_name(format!("{stem}_frames"));
        fs::create_dir_all(&dir).map_err(io_error(&dir))?;
        for (i, frame) in frames.iter().enumerate() {
            frame.save(dir.join(format!("frame_{i:05}.png")))?;
        }
        let fps_file = dir.join("fps.txt");
        fs::write(&fps_file, format!("{fps}\n")).map_err(io_error(&fps_file))?;
        Ok(dir)
    }
}

/// ffmpeg when it is installed, PNG frames otherwise.
#[must_use]
pub fn default_writer() -> Box<dyn VideoWriter> {
    let ffmpeg = FfmpegWriter::default();
    if ffmpeg.is_available() {
        Box::new(ffmpeg)
    } else {
        tracing::warn!("ffmpeg not found on PATH; rollouts will be written as PNG frames");
        Box::new(PngSequenceWriter)
    }
}
