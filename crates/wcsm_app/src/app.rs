use std::sync::mpsc;

use anyhow::Context;
use wcsm_core::{update, Msg, WatchState};
use wcsm_engine::Orchestrator;
use wcsm_logging::wcsm_info;

use crate::cli::Cli;
use crate::effects::EffectRunner;
use crate::watch;

/// Validate, prepare the output tree, check every target once, then watch
/// until Ctrl-C.
pub fn run(cli: &Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir().context("reading current directory")?;
    let watch_config = cli.watch_config(&cwd);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("building async runtime")?;
    let orchestrator = Orchestrator::new(cli.engine_config(&cwd), &cli.fetch)?;
    // After the output tree exists, so the filter can resolve its real path.
    let state = WatchState::new(&watch_config, &cwd)?;
    runtime.block_on(orchestrator.check_reachability())?;

    let (msg_tx, msg_rx) = mpsc::channel();
    watch::install_interrupt_handler(msg_tx.clone())?;
    let watcher = watch::start(&watch_config.watch_dir, msg_tx)?;
    wcsm_info!(
        "Ready to watch {} for {} target(s). Ctrl-C to stop.",
        watch_config.watch_dir.display(),
        orchestrator.targets().len()
    );

    let runner = EffectRunner::new(runtime, orchestrator);
    let state = run_loop(state, &msg_rx, &runner);
    drop(watcher);

    let stats = state.stats();
    wcsm_info!(
        "Stopped. events={} ignored_pattern={} ignored_output={} debounced={} grabs={}",
        stats.events_seen,
        stats.ignored_by_pattern,
        stats.ignored_own_output,
        stats.debounced,
        stats.grabs_triggered
    );
    Ok(())
}

/// Feed messages through `update` and execute the resulting effects until a
/// stop effect or until every sender is gone.
pub fn run_loop(
    mut state: WatchState,
    msg_rx: &mpsc::Receiver<Msg>,
    runner: &EffectRunner,
) -> WatchState {
    while let Ok(msg) = msg_rx.recv() {
        let (next, effects) = update(state, msg);
        state = next;
        if runner.run(effects).is_break() {
            break;
        }
    }
    state
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    use tempfile::TempDir;
    use wcsm_core::WatchConfig;
    use wcsm_engine::{
        EngineConfig, FailureKind, FetchError, FetchMetadata, FetchOutput, Fetcher,
    };

    use super::*;

    const SITE: &str = "http://site.test/";

    /// Serves one page whose body only changes when `revision` does.
    struct OnePageSite {
        revision: AtomicU64,
    }

    #[async_trait::async_trait]
    impl Fetcher for OnePageSite {
        async fn fetch(&self, url: &str) -> Result<FetchOutput, FetchError> {
            if url != SITE {
                return Err(FetchError {
                    url: url.to_string(),
                    kind: FailureKind::HttpStatus(404),
                    message: "404 Not Found".to_string(),
                });
            }
            let body = format!(
                "<html><body><p>revision {}</p></body></html>",
                self.revision.load(Ordering::SeqCst)
            );
            Ok(FetchOutput {
                metadata: FetchMetadata {
                    url: url.to_string(),
                    final_url: url.to_string(),
                    status: 200,
                    content_type: Some("text/html; charset=utf-8".to_string()),
                    byte_len: body.len() as u64,
                },
                bytes: body.into_bytes(),
            })
        }
    }

    fn changed(base: &TempDir, rel: &str, at_ms: u64) -> Msg {
        Msg::PathChanged {
            path: base.path().join(rel),
            at_ms,
        }
    }

    fn snapshots(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn loop_grabs_once_per_real_change_and_stops_on_shutdown() {
        let base = TempDir::new().unwrap();
        let watch_config = WatchConfig::default_for(base.path());
        let state = WatchState::new(&watch_config, base.path()).unwrap();

        let mut engine_config = EngineConfig::default_with_output(watch_config.output_dir.clone());
        engine_config.now_secs = Arc::new(|| 1_700_000_000);

        let site = Arc::new(OnePageSite {
            revision: AtomicU64::new(1),
        });
        let orchestrator = Orchestrator::with_fetcher(engine_config, [SITE], site).unwrap();
        let target_dir = orchestrator.store().target_dir(&orchestrator.targets()[0]);
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let runner = EffectRunner::new(runtime, orchestrator);

        let (msg_tx, msg_rx) = mpsc::channel();
        msg_tx.send(changed(&base, "index.html", 0)).unwrap();
        msg_tx.send(changed(&base, "style.css", 500)).unwrap();
        msg_tx.send(changed(&base, "wcsm/site.test/1.html", 2_000)).unwrap();
        msg_tx.send(changed(&base, "notes.txt", 2_500)).unwrap();
        msg_tx.send(changed(&base, "app.js", 3_000)).unwrap();
        msg_tx.send(Msg::Shutdown).unwrap();
        msg_tx.send(changed(&base, "late.html", 9_000)).unwrap();

        let state = run_loop(state, &msg_rx, &runner);

        let stats = state.stats();
        assert!(state.is_stopping());
        assert_eq!(stats.events_seen, 5);
        assert_eq!(stats.debounced, 1);
        assert_eq!(stats.ignored_own_output, 1);
        assert_eq!(stats.ignored_by_pattern, 1);
        assert_eq!(stats.grabs_triggered, 2);
        // second grab saw identical content
        assert_eq!(snapshots(&target_dir), vec!["1700000000.html".to_string()]);
    }

    #[test]
    fn loop_ends_when_all_senders_are_gone() {
        let base = TempDir::new().unwrap();
        let watch_config = WatchConfig::default_for(base.path());
        let state = WatchState::new(&watch_config, base.path()).unwrap();
        let orchestrator = Orchestrator::with_fetcher(
            EngineConfig::default_with_output(watch_config.output_dir.clone()),
            [SITE],
            Arc::new(OnePageSite {
                revision: AtomicU64::new(1),
            }),
        )
        .unwrap();
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let runner = EffectRunner::new(runtime, orchestrator);

        let (msg_tx, msg_rx) = mpsc::channel::<Msg>();
        drop(msg_tx);

        let state = run_loop(state, &msg_rx, &runner);
        assert!(!state.is_stopping());
        assert_eq!(state.stats().grabs_triggered, 0);
    }
}
