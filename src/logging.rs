// src/logging.rs
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub const LOG_FILE: &str = "blog_repurposing_agent.log";

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// stderr + daily rolling file under `log_dir`. `RUST_LOG` overrides the `info` default.
/// Repeated calls are no-ops.
pub fn init(log_dir: &Path) -> anyhow::Result<PathBuf> {
    let path = log_dir.join(LOG_FILE);
    if LOG_GUARD.get().is_some() {
        return Ok(path);
    }

    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("failed to create log directory: {}", log_dir.display()))?;

    let (writer, guard) = tracing_appender::non_blocking(rolling::daily(log_dir, LOG_FILE));
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .map_err(|e| anyhow::anyhow!("tracing setup failed: {e}"))?;

    let _ = LOG_GUARD.set(guard);
    Ok(path)
}
