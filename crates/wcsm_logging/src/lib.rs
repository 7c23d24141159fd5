#![deny(missing_docs)]
//! Shared logging utilities for the wcsm workspace.
//!
//! This crate provides the `wcsm_*` logging macros used across the codebase,
//! the simplelog setup used by the binary, and a minimal test initializer.

use std::fs::File;
use std::path::{Path, PathBuf};

#[doc(hidden)]
pub use log;
pub use log::LevelFilter;

use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};

/// `trace!` through the re-exported facade.
/// Per-event detail, such as every raw watcher notification.
#[macro_export]
macro_rules! wcsm_trace {
    ($($arg:tt)*) => {{
        $crate::log::trace!($($arg)*);
    }};
}

/// `debug!` through the re-exported facade.
/// Decisions worth seeing with `--verbose`.
#[macro_export]
macro_rules! wcsm_debug {
    ($($arg:tt)*) => {{
        $crate::log::debug!($($arg)*);
    }};
}

/// `info!` through the re-exported facade.
/// Startup, stored snapshots and shutdown.
#[macro_export]
macro_rules! wcsm_info {
    ($($arg:tt)*) => {{
        $crate::log::info!($($arg)*);
    }};
}

/// `warn!` through the re-exported facade.
/// A target or resource that failed this cycle.
#[macro_export]
macro_rules! wcsm_warn {
    ($($arg:tt)*) => {{
        $crate::log::warn!($($arg)*);
    }};
}

/// `error!` through the re-exported facade.
/// Failures that end the process.
#[macro_export]
macro_rules! wcsm_error {
    ($($arg:tt)*) => {{
        $crate::log::error!($($arg)*);
    }};
}

/// Where log output goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogDestination {
    /// Terminal only (stderr for warnings and errors, stdout otherwise).
    Terminal,
    /// Terminal plus a log file at the given path.
    TerminalAndFile(PathBuf),
}

/// Initialize the global logger.
///
/// A log file that cannot be created is reported on stderr and skipped;
/// terminal logging still goes ahead.
pub fn initialize(destination: LogDestination, level: LevelFilter) {
    let config = build_config();

    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        level,
        config.clone(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )];
    if let LogDestination::TerminalAndFile(path) = destination {
        if let Some(file_logger) = create_file_logger(&path, level, config) {
            loggers.push(file_logger);
        }
    }

    let _ = CombinedLogger::init(loggers);
}

fn build_config() -> Config {
    ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Error)
        .build()
}

fn create_file_logger(
    path: &Path,
    level: LevelFilter,
    config: Config,
) -> Option<Box<WriteLogger<File>>> {
    match File::create(path) {
        Ok(file) => Some(WriteLogger::new(level, config, file)),
        Err(err) => {
            eprintln!("Warning: Could not create log file at {:?}: {}", path, err);
            None
        }
    }
}

/// Terminal logger for test binaries, at debug level in debug builds.
///
/// Calling it again, or after another logger is installed, does nothing.
pub fn initialize_for_tests() {
    let level = if cfg!(debug_assertions) { LevelFilter::Debug } else { LevelFilter::Info };
    let logger = TermLogger::new(level, build_config(), TerminalMode::Mixed, ColorChoice::Auto);
    let _ = CombinedLogger::init(vec![logger]);
}
