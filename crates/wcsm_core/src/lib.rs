//! wcsm core: pure decisions about targets, watched paths and when to grab.
mod debounce;
mod effect;
mod filter;
mod msg;
mod path;
mod patterns;
mod state;
mod target;
mod update;

pub use debounce::{Debouncer, DEFAULT_DEBOUNCE};
pub use effect::Effect;
pub use filter::{normalize_lexically, ChangeFilter};
pub use msg::Msg;
pub use path::normalize_target;
pub use patterns::{PatternError, WatchPatterns, DEFAULT_WATCH_PATTERN};
pub use state::{WatchConfig, WatchState, WatchStats, DEFAULT_OUTPUT_DIR_NAME};
pub use target::{dedupe_targets, find_collision, validate_targets, Target, TargetError};
pub use update::update;
