use std::ops::ControlFlow;

use tokio::runtime::Runtime;
use wcsm_core::Effect;
use wcsm_engine::{CycleReport, Orchestrator};
use wcsm_logging::{wcsm_debug, wcsm_info};

/// Executes the effects `update` asks for. Grabs run to completion on the
/// loop thread, so changes arriving meanwhile queue up behind them.
pub struct EffectRunner {
    runtime: Runtime,
    orchestrator: Orchestrator,
}

impl EffectRunner {
    pub fn new(runtime: Runtime, orchestrator: Orchestrator) -> Self {
        Self {
            runtime,
            orchestrator,
        }
    }

    pub fn run(&self, effects: Vec<Effect>) -> ControlFlow<()> {
        for effect in effects {
            match effect {
                Effect::Grab { trigger } => {
                    wcsm_info!("Change detected: {}", trigger.display());
                    let report = self.runtime.block_on(self.orchestrator.grab());
                    log_cycle(&report);
                }
                Effect::Stop => return ControlFlow::Break(()),
            }
        }
        ControlFlow::Continue(())
    }
}

fn log_cycle(report: &CycleReport) {
    wcsm_debug!(
        "cycle done: stored={} unchanged={} failed={}",
        report.stored(),
        report.skipped(),
        report.failed()
    );
}
