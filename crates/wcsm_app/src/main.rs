mod app;
mod cli;
mod effects;
mod watch;

use std::process::ExitCode;

use clap::Parser;
use wcsm_logging::{wcsm_error, LevelFilter, LogDestination};

fn main() -> ExitCode {
    let cli = cli::Cli::parse();

    let destination = match &cli.log_file {
        Some(path) => LogDestination::TerminalAndFile(path.clone()),
        None => LogDestination::Terminal,
    };
    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    wcsm_logging::initialize(destination, level);

    match app::run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            wcsm_error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
