use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// The watcher reported a change at `path`, observed at `at_ms` (unix millis).
    PathChanged { path: PathBuf, at_ms: u64 },
    /// Interrupt requested; stop watching.
    Shutdown,
    /// Fallback for events that carry nothing actionable.
    NoOp,
}
