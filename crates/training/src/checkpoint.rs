//! # Checkpoint Resolution
//!
//! A checkpoint directory holds one subdirectory per saved step, named by the
//! decimal step count (`0000001000`, `2000`, ...). Restoring from a directory
//! means restoring from its highest-numbered subdirectory; restoring from a
//! file means using that file as-is. Loose files such as `config.json` sit
//! alongside the step directories and are ignored.

use crate::error::CheckpointError;
use std::fs;
use std::path::{Path, PathBuf};

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> CheckpointError + '_ {
    move |source| CheckpointError::Io { path: path.to_path_buf(), source }
}

fn parse_step(name: &str) -> Option<u64> {
    if name.is_empty() || !name.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    name.parse().ok()
}

/// Every step subdirectory of `dir` as `(step, path)`, ascending by step.
///
/// A subdirectory whose name is not a decimal integer is an error, not skipped.
pub fn list_checkpoints(dir: &Path) -> Result<Vec<(u64, PathBuf)>, CheckpointError> {
    let mut found = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_error(dir))? {
        let entry = entry.map_err(io_error(dir))?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        let step = parse_step(&name).ok_or_else(|| CheckpointError::MalformedCheckpointName {
            dir: dir.to_path_buf(),
            name: name.clone(),
        })?;
        found.push((step, path));
    }
    found.sort_by_key(|(step, _)| *step);
    Ok(found)
}

/// The highest-numbered step subdirectory of `dir`.
pub fn latest_checkpoint(dir: &Path) -> Result<PathBuf, CheckpointError> {
    list_checkpoints(dir)?
        .pop()
        .map(|(_, path)| path)
        .ok_or_else(|| CheckpointError::NoCheckpointFound(dir.to_path_buf()))
}

/// Resolves a user-supplied restore location to a concrete checkpoint.
///
/// `None` means training from scratch. The path is made absolute; a path that
/// does not exist is an I/O error.
pub fn resolve_restore_path(path: Option<&Path>) -> Result<Option<PathBuf>, CheckpointError> {
    let Some(path) = path else {
        tracing::info!("No checkpoint path provided, not restoring from checkpoint");
        return Ok(None);
    };
    let path = fs::canonicalize(path).map_err(io_error(path))?;
    if path.is_dir() {
        let latest = latest_checkpoint(&path)?;
        tracing::info!("Restoring from: {}", latest.display());
        Ok(Some(latest))
    } else {
        tracing::info!("Restoring from checkpoint: {}", path.display());
        Ok(Some(path))
    }
}

/// Directory name for a step, zero-padded so listings sort naturally.
#[must_use]
pub fn step_dir_name(step: u64) -> String {
    format!("{step:012}")
}
