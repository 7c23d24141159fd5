use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::debounce::{Debouncer, DEFAULT_DEBOUNCE};
use crate::filter::ChangeFilter;
use crate::patterns::{PatternError, WatchPatterns, DEFAULT_WATCH_PATTERN};

pub const DEFAULT_OUTPUT_DIR_NAME: &str = "wcsm";

/// Watch-side settings; the fetch side lives in the engine's config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchConfig {
    pub watch_dir: PathBuf,
    pub output_dir: PathBuf,
    pub patterns: Vec<String>,
    pub debounce: Duration,
}

impl WatchConfig {
    /// Watch `cwd`, write to `cwd/wcsm`, default patterns and debounce.
    pub fn default_for(cwd: &Path) -> Self {
        Self {
            watch_dir: cwd.to_path_buf(),
            output_dir: cwd.join(DEFAULT_OUTPUT_DIR_NAME),
            patterns: vec![DEFAULT_WATCH_PATTERN.to_string()],
            debounce: DEFAULT_DEBOUNCE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WatchStats {
    pub events_seen: u64,
    pub ignored_by_pattern: u64,
    pub ignored_own_output: u64,
    pub debounced: u64,
    pub grabs_triggered: u64,
}

#[derive(Debug, Clone)]
pub struct WatchState {
    patterns: WatchPatterns,
    filter: ChangeFilter,
    debouncer: Debouncer,
    stats: WatchStats,
    stopping: bool,
}

impl WatchState {
    /// `base_dir` resolves relative paths (see [`ChangeFilter::new`]).
    pub fn new(config: &WatchConfig, base_dir: &Path) -> Result<Self, PatternError> {
        Ok(Self {
            patterns: WatchPatterns::new(&config.patterns)?,
            filter: ChangeFilter::new(&config.output_dir, base_dir),
            debouncer: Debouncer::new(config.debounce),
            stats: WatchStats::default(),
            stopping: false,
        })
    }

    pub fn stats(&self) -> WatchStats {
        self.stats
    }

    pub fn is_stopping(&self) -> bool {
        self.stopping
    }

    pub fn filter(&self) -> &ChangeFilter {
        &self.filter
    }

    pub(crate) fn consider_change(&mut self, path: &Path, at_ms: u64) -> bool {
        self.stats.events_seen += 1;
        if !self.patterns.matches(path) {
            self.stats.ignored_by_pattern += 1;
            return false;
        }
        if !self.filter.should_trigger(path) {
            self.stats.ignored_own_output += 1;
            return false;
        }
        if !self.debouncer.accept_at(at_ms) {
            self.stats.debounced += 1;
            return false;
        }
        self.stats.grabs_triggered += 1;
        true
    }

    pub(crate) fn stop(&mut self) {
        self.stopping = true;
    }
}
