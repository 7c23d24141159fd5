//! wcsm engine: fetch pages, embed their resources and keep changed snapshots.
mod decode;
mod engine;
mod fetch;
mod inline;
mod persist;
mod snapshot;
mod types;

pub use decode::{decode_text, decode_text_lossy, DecodeError, DecodedText};
pub use engine::{EngineConfig, Orchestrator, StartupError};
pub use fetch::{is_success_status, FetchSettings, Fetcher, ReqwestFetcher};
pub use inline::{
    image_data_url, sniff_image_mime, InlineError, InlineStats, ResourceInliner,
    SelfContainedDocument,
};
pub use persist::{ensure_dir, AtomicFileWriter, PersistError};
pub use snapshot::{
    content_hash, latest_snapshot, snapshot_timestamp, system_clock, Clock, SnapshotError,
    SnapshotStore, StoreOutcome, SNAPSHOT_EXTENSION,
};
pub use types::{
    CycleReport, FailureKind, FetchError, FetchMetadata, FetchOutput, TargetOutcome,
    TargetReport,
};
