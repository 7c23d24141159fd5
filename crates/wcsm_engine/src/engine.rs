use std::path::PathBuf;
use std::sync::Arc;

use wcsm_core::{validate_targets, Target, TargetError};
use wcsm_logging::{wcsm_info, wcsm_warn};

use crate::fetch::{FetchSettings, Fetcher, ReqwestFetcher};
use crate::inline::{InlineError, ResourceInliner};
use crate::snapshot::{system_clock, Clock, SnapshotError, SnapshotStore, StoreOutcome};
use crate::{CycleReport, FetchError, TargetOutcome, TargetReport};

#[derive(Clone)]
pub struct EngineConfig {
    pub output_dir: PathBuf,
    pub fetch: FetchSettings,
    /// Names snapshot files; swap it out for a deterministic clock in tests.
    pub now_secs: Clock,
}

impl EngineConfig {
    pub fn default_with_output(output_dir: PathBuf) -> Self {
        Self {
            output_dir,
            fetch: FetchSettings::default(),
            now_secs: system_clock(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("invalid targets: {0}")]
    Targets(#[from] TargetError),
    #[error("cannot prepare output directory: {0}")]
    OutputDir(#[from] SnapshotError),
    #[error("target {locator} is unreachable: {source}")]
    Unreachable {
        locator: String,
        #[source]
        source: FetchError,
    },
}

#[derive(Debug, thiserror::Error)]
enum GrabError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Inline(#[from] InlineError),
    #[error(transparent)]
    Store(#[from] SnapshotError),
}

/// Owns the target list and runs fetch -> inline -> store for each of them.
pub struct Orchestrator {
    targets: Vec<Target>,
    fetcher: Arc<dyn Fetcher>,
    inliner: ResourceInliner,
    store: SnapshotStore,
}

impl Orchestrator {
    /// Validate and dedupe `locators`, then create one output directory per target.
    pub fn new<I, S>(config: EngineConfig, locators: I) -> Result<Self, StartupError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let fetcher = Arc::new(ReqwestFetcher::new(config.fetch.clone()));
        Self::with_fetcher(config, locators, fetcher)
    }

    pub fn with_fetcher<I, S>(
        config: EngineConfig,
        locators: I,
        fetcher: Arc<dyn Fetcher>,
    ) -> Result<Self, StartupError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let targets = validate_targets(locators)?;
        let store = SnapshotStore::new(config.output_dir, config.now_secs);
        for target in &targets {
            let dir = store.prepare(target)?;
            wcsm_info!("{} -> {:?}", target.locator(), dir);
        }

        Ok(Self {
            targets,
            inliner: ResourceInliner::new(fetcher.clone()),
            fetcher,
            store,
        })
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    /// Fetch every target once; the first failure aborts startup.
    pub async fn check_reachability(&self) -> Result<(), StartupError> {
        for target in &self.targets {
            self.fetcher
                .fetch(target.locator())
                .await
                .map_err(|source| StartupError::Unreachable {
                    locator: target.locator().to_string(),
                    source,
                })?;
        }
        Ok(())
    }

    /// One capture cycle over all targets. A failing target is logged and
    /// skipped; the others still run.
    pub async fn grab(&self) -> CycleReport {
        let mut report = CycleReport::default();
        for target in &self.targets {
            let outcome = match self.grab_target(target).await {
                Ok(StoreOutcome::Stored(path)) => {
                    wcsm_info!("{}: stored {:?}", target.locator(), path);
                    TargetOutcome::Stored(path)
                }
                Ok(StoreOutcome::Skipped) => TargetOutcome::Skipped,
                Err(err) => {
                    wcsm_warn!("{}: skipped this cycle: {err}", target.locator());
                    TargetOutcome::Failed(err.to_string())
                }
            };
            report.targets.push(TargetReport {
                locator: target.locator().to_string(),
                outcome,
            });
        }
        report
    }

    async fn grab_target(&self, target: &Target) -> Result<StoreOutcome, GrabError> {
        let page = self.fetcher.fetch(target.locator()).await?;
        let document = self
            .inliner
            .inline(
                &page.bytes,
                page.metadata.content_type.as_deref(),
                &page.metadata.final_url,
            )
            .await?;
        Ok(self.store.consider(target, &document.html)?)
    }
}
