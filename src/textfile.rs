//! Textfile Output
//!
//! Writes the metrics to a file for the node exporter textfile collector. Each
//! write goes to a temporary sibling first and is renamed into place, so the
//! node exporter never reads a half-written file.

use crate::error::Result;
use crate::metrics;
use crate::server::{run_pass, SharedCollector};
use anyhow::Context;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info, warn};

/// Atomically replace `path` with `contents`
pub fn write_textfile(path: &Path, contents: &str) -> Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(format!(".{}.tmp", std::process::id()));
    let tmp = PathBuf::from(tmp);

    std::fs::write(&tmp, contents)?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        std::fs::remove_file(&tmp).ok();
        return Err(e.into());
    }
    Ok(())
}

/// Collect and write until stopped, or once when `oneshot` is set
pub async fn run(
    collector: SharedCollector,
    path: PathBuf,
    every: Duration,
    oneshot: bool,
) -> anyhow::Result<()> {
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        match write_pass(&collector, &path).await {
            Ok(()) => info!("Wrote metrics to {}", path.display()),
            Err(e) if oneshot => return Err(e),
            Err(e) => error!("Failed to update {}: {:#}", path.display(), e),
        }

        if oneshot {
            return Ok(());
        }
    }
}

async fn write_pass(collector: &SharedCollector, path: &Path) -> anyhow::Result<()> {
    let pass = run_pass(collector).await?;
    if !pass.faults.is_empty() {
        warn!("{} disks were skipped in this pass", pass.faults.len());
    }

    let body = metrics::render(&pass.families)?;
    let target = path.to_path_buf();
    tokio::task::spawn_blocking(move || write_textfile(&target, &body))
        .await
        .context("Textfile write task panicked")?
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
