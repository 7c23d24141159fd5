use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{ArgAction, Parser};
use wcsm_core::{normalize_lexically, WatchConfig};
use wcsm_engine::EngineConfig;

/// Capture updates to a web site as you edit the files.
///
/// Every time a watched file changes, each URI is fetched, its images,
/// stylesheets and same-origin scripts are embedded, and the result is saved
/// as `<output>/<uri-dir>/<unix-seconds>.html` unless nothing changed.
#[derive(Debug, Parser)]
#[command(name = "wcsm", author, version, about, long_about = None)]
pub struct Cli {
    /// Directory to watch for file changes [default: current directory]
    #[arg(short, long, value_name = "DIR")]
    pub input: Option<PathBuf>,

    /// Output directory for snapshots [default: ./wcsm]
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Regex a changed path must match to count; repeat for several
    #[arg(short, long = "regex", value_name = "REGEX", action = ArgAction::Append)]
    pub regex: Vec<String>,

    /// Minimum time between two grabs, in milliseconds
    #[arg(long, value_name = "MS", default_value_t = 1000)]
    pub debounce_ms: u64,

    /// Also write the log to this file
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long)]
    pub verbose: bool,

    /// URIs to snapshot on every change
    #[arg(value_name = "URI", required = true)]
    pub fetch: Vec<String>,
}

impl Cli {
    pub fn watch_config(&self, cwd: &Path) -> WatchConfig {
        let mut config = WatchConfig::default_for(cwd);
        if let Some(input) = &self.input {
            config.watch_dir = absolute(input, cwd);
        }
        config.output_dir = self.output_dir(cwd);
        if !self.regex.is_empty() {
            config.patterns = self.regex.clone();
        }
        config.debounce = Duration::from_millis(self.debounce_ms);
        config
    }

    pub fn engine_config(&self, cwd: &Path) -> EngineConfig {
        let mut config = EngineConfig::default_with_output(self.output_dir(cwd));
        config.now_secs = std::sync::Arc::new(|| {
            u64::try_from(chrono::Utc::now().timestamp()).unwrap_or(0)
        });
        config
    }

    fn output_dir(&self, cwd: &Path) -> PathBuf {
        match &self.output {
            Some(output) => absolute(output, cwd),
            None => WatchConfig::default_for(cwd).output_dir,
        }
    }
}

fn absolute(path: &Path, cwd: &Path) -> PathBuf {
    normalize_lexically(&cwd.join(path))
}
