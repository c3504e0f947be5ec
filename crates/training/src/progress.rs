//! # Progress Reporting
//!
//! Trainers emit `(step, metrics)` through one callback; [`ProgressFanout`]
//! forwards each report to every configured [`ProgressSink`].
//!
//! -   **[`ConsoleSink`]:** evaluation and training rewards via `tracing`.
//! -   **[`DashboardSink`]:** one JSON scalar event per metric in
//!     `scalars.jsonl`, for plotting dashboards.
//! -   **[`TrackerSink`]:** an offline experiment-tracker run directory with
//!     the run configuration and a per-step metric history.
//!
//! A failing sink is logged and skipped. Reports whose step is lower than one
//! already delivered are dropped, so sinks see a nondecreasing step sequence.

use crate::trainer::Metrics;
use config_tree::ConfigTree;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

pub const EVAL_REWARD: &str = "eval/episode_reward";
pub const TRAIN_REWARD: &str = "episode/sum_reward";

pub trait ProgressSink {
    fn name(&self) -> &str;

    fn log(&mut self, step: u64, metrics: &Metrics) -> anyhow::Result<()>;

    fn flush(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Prints headline rewards.
pub struct ConsoleSink {
    run_evals: bool,
    log_training_metrics: bool,
}

impl ConsoleSink {
    #[must_use]
    pub fn new(run_evals: bool, log_training_metrics: bool) -> Self {
        Self { run_evals, log_training_metrics }
    }
}

impl ProgressSink for ConsoleSink {
    fn name(&self) -> &str {
        "console"
    }

    fn log(&mut self, step: u64, metrics: &Metrics) -> anyhow::Result<()> {
        if self.run_evals {
            if let Some(reward) = metrics.get(EVAL_REWARD) {
                tracing::info!("{step}: reward={reward:.3}");
            }
        }
        if self.log_training_metrics {
            if let Some(reward) = metrics.get(TRAIN_REWARD) {
                tracing::info!("{step}: mean episode reward={reward:.3}");
            }
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct ScalarEvent<'a> {
    step: u64,
    tag: &'a str,
    value: f64,
    wall_time: f64,
}

/// Scalar event log at `<logdir>/scalars.jsonl`.
pub struct DashboardSink {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl DashboardSink {
    pub const FILE_NAME: &'static str = "scalars.jsonl";

    pub fn create(logdir: &Path) -> anyhow::Result<Self> {
        let path = logdir.join(Self::FILE_NAME);
        let file = File::options().create(true).append(true).open(&path)?;
        Ok(Self { path, writer: BufWriter::new(file) })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ProgressSink for DashboardSink {
    fn name(&self) -> &str {
        "dashboard"
    }

    #[allow(clippy::cast_precision_loss)]
    fn log(&mut self, step: u64, metrics: &Metrics) -> anyhow::Result<()> {
        let wall_time = chrono::Utc::now().timestamp_millis() as f64 / 1000.0;
        for (tag, &value) in metrics {
            serde_json::to_writer(&mut self.writer, &ScalarEvent { step, tag, value, wall_time })?;
            self.writer.write_all(b"\n")?;
        }
        self.flush()
    }

    fn flush(&mut self) -> anyhow::Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Offline tracker run at `<logdir>/tracker/`.
///
/// `config.json` holds the project, run name and configuration;
/// `history.jsonl` gets one object per report with the step under `_step`.
pub struct TrackerSink {
    dir: PathBuf,
    history: BufWriter<File>,
}

impl TrackerSink {
    pub const PROJECT: &'static str = "mjxrl";

    /// Starts a run named `run_name` recording `config` plus `env_name`.
    pub fn init(logdir: &Path, run_name: &str, env_name: &str, config: &ConfigTree) -> anyhow::Result<Self> {
        let dir = logdir.join("tracker");
        fs::create_dir_all(&dir)?;
        let run_config = config.clone().with("env_name", env_name);
        let header = serde_json::json!({
            "project": Self::PROJECT,
            "name": run_name,
            "config": run_config,
        });
        fs::write(dir.join("config.json"), serde_json::to_string_pretty(&header)?)?;
        let history = File::options().create(true).append(true).open(dir.join("history.jsonl"))?;
        Ok(Self { dir, history: BufWriter::new(history) })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ProgressSink for TrackerSink {
    fn name(&self) -> &str {
        "tracker"
    }

    fn log(&mut self, step: u64, metrics: &Metrics) -> anyhow::Result<()> {
        let mut row = serde_json::Map::new();
        row.insert("_step".to_string(), step.into());
        for (key, &value) in metrics {
            row.insert(key.clone(), value.into());
        }
        serde_json::to_writer(&mut self.history, &row)?;
        self.history.write_all(b"\n")?;
        self.flush()
    }

    fn flush(&mut self) -> anyhow::Result<()> {
        self.history.flush()?;
        Ok(())
    }
}

/// Wall-clock split of a run, measured from fanout creation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timings {
    /// Until the first progress report (setup and compilation).
    pub to_first_progress: Duration,
    /// From the first to the last progress report.
    pub training: Duration,
}

/// Delivers each progress report to every sink.
pub struct ProgressFanout {
    sinks: Vec<Box<dyn ProgressSink>>,
    last_step: Option<u64>,
    started: Instant,
    first_report: Option<Instant>,
    last_report: Option<Instant>,
}

impl Default for ProgressFanout {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressFanout {
    #[must_use]
    pub fn new() -> Self {
        Self {
            sinks: Vec::new(),
            last_step: None,
            started: Instant::now(),
            first_report: None,
            last_report: None,
        }
    }

    #[must_use]
    pub fn with_sink(mut self, sink: Box<dyn ProgressSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn push(&mut self, sink: Box<dyn ProgressSink>) {
        self.sinks.push(sink);
    }

    #[must_use]
    pub fn sink_names(&self) -> Vec<&str> {
        self.sinks.iter().map(|s| s.name()).collect()
    }

    pub fn report(&mut self, step: u64, metrics: &Metrics) {
        let now = Instant::now();
        self.first_report.get_or_insert(now);
        self.last_report = Some(now);
        if let Some(last) = self.last_step {
            if step < last {
                tracing::warn!("dropping progress for step {step}: already reported step {last}");
                return;
            }
        }
        self.last_step = Some(step);
        for sink in &mut self.sinks {
            if let Err(err) = sink.log(step, metrics) {
                tracing::warn!("progress sink '{}' failed at step {step}: {err:#}", sink.name());
            }
        }
    }

    /// `None` until at least one report has arrived.
    #[must_use]
    pub fn timings(&self) -> Option<Timings> {
        let first = self.first_report?;
        let last = self.last_report?;
        Some(Timings { to_first_progress: first - self.started, training: last - first })
    }

    /// Flushes every sink, logging failures.
    pub fn finish(&mut self) {
        for sink in &mut self.sinks {
            if let Err(err) = sink.flush() {
                tracing::warn!("progress sink '{}' failed to flush: {err:#}", sink.name());
            }
        }
    }
}
