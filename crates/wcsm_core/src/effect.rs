use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Run one fetch/inline/store cycle over every target.
    Grab { trigger: PathBuf },
    /// Tear down the watcher and leave the event loop.
    Stop,
}
