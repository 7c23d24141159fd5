use std::path::Path;
use std::sync::mpsc;

use anyhow::Context;
use chrono::Utc;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use wcsm_core::Msg;
use wcsm_logging::{wcsm_trace, wcsm_warn};

/// Watch `dir` recursively and forward every touched path as [`Msg::PathChanged`].
///
/// Events stop when the returned watcher is dropped.
pub fn start(dir: &Path, msg_tx: mpsc::Sender<Msg>) -> anyhow::Result<RecommendedWatcher> {
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
        Ok(event) => {
            if matches!(event.kind, EventKind::Access(_)) {
                return;
            }
            let at_ms = now_ms();
            for path in event.paths {
                wcsm_trace!("{:?} {:?}", event.kind, path);
                let _ = msg_tx.send(Msg::PathChanged { path, at_ms });
            }
        }
        Err(err) => wcsm_warn!("watch error: {err}"),
    })
    .context("creating file watcher")?;

    watcher
        .watch(dir, RecursiveMode::Recursive)
        .with_context(|| format!("watching {}", dir.display()))?;
    Ok(watcher)
}

/// Forward Ctrl-C as [`Msg::Shutdown`].
pub fn install_interrupt_handler(msg_tx: mpsc::Sender<Msg>) -> anyhow::Result<()> {
    ctrlc::set_handler(move || {
        let _ = msg_tx.send(Msg::Shutdown);
    })
    .context("installing Ctrl-C handler")
}

fn now_ms() -> u64 {
    u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0)
}
