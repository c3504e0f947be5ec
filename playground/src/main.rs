//! # Playground Binary
//!
//! Installs logging, parses flags and runs one experiment.

use anyhow::Result;
use playground::cli::Invocation;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    init_logging();
    let invocation = Invocation::parse();
    playground::app::run(&invocation)?;
    Ok(())
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}
