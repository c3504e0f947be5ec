//! # Playground Application
//!
//! Builds the task registry, hands the parsed options to the training-run
//! driver with the reference trainer, the skeleton renderer and the best
//! available video writer, and reports where everything went.

use crate::cli::Invocation;
use anyhow::Result;
use envs::{DirectoryAssets, Registry};
use render::SkeletonRenderer;
use std::sync::Arc;
use training::{RandomSearchTrainer, RunSummary};

/// The registry the binary trains against; assets are checked under
/// `assets_dir` when one is given.
#[must_use]
pub fn registry(invocation: &Invocation) -> Registry {
    let registry = Registry::with_default_suites();
    match &invocation.cli.assets_dir {
        Some(dir) => registry.with_assets(Arc::new(DirectoryAssets::new(dir.clone()))),
        None => registry,
    }
}

/// Runs one training-and-evaluation pass.
///
/// # Errors
///
/// Returns configuration, checkpoint and trainer errors. Unknown environments
/// and agents fail before any log directory is created.
pub fn run(invocation: &Invocation) -> Result<RunSummary> {
    let registry = registry(invocation);
    let options = invocation.run_options();
    for flag in invocation.overrides.present() {
        tracing::debug!("command-line override: {} = {:?}", flag.name, flag.value);
    }

    let mut trainer = RandomSearchTrainer;
    let mut renderer = SkeletonRenderer::default();
    let mut writer = render::default_writer();
    let summary = training::run(&registry, &options, &mut trainer, &mut renderer, writer.as_mut())?;

    tracing::info!("Experiment {} finished; logs in {}", summary.experiment_name, summary.logdir.display());
    if summary.failed_videos > 0 {
        tracing::warn!("{} of {} rollout videos failed", summary.failed_videos, options.num_videos);
    }
    Ok(summary)
}
