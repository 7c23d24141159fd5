use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use sha2::{Digest, Sha256};
use wcsm_core::Target;
use wcsm_logging::wcsm_debug;

use crate::persist::{ensure_dir, AtomicFileWriter, PersistError};

pub const SNAPSHOT_EXTENSION: &str = "html";

/// Current time in whole unix seconds; names new snapshot files.
pub type Clock = Arc<dyn Fn() -> u64 + Send + Sync>;

pub fn system_clock() -> Clock {
    Arc::new(|| {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOutcome {
    Stored(PathBuf),
    /// Identical to the most recent snapshot; nothing written.
    Skipped,
}

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error(transparent)]
    Persist(#[from] PersistError),
    #[error("reading snapshots at {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Per-target sequences of `<timestamp>.html` files under one output root.
#[derive(Clone)]
pub struct SnapshotStore {
    root: PathBuf,
    clock: Clock,
}

impl SnapshotStore {
    pub fn new(root: PathBuf, clock: Clock) -> Self {
        Self { root, clock }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn target_dir(&self, target: &Target) -> PathBuf {
        self.root.join(target.dir_name())
    }

    /// Create the target's directory if needed.
    pub fn prepare(&self, target: &Target) -> Result<PathBuf, SnapshotError> {
        let dir = self.target_dir(target);
        ensure_dir(&dir)?;
        Ok(dir)
    }

    /// Store `content` unless it hashes the same as the target's most recent snapshot.
    ///
    /// Two stores within the same second share a filename; the later one wins.
    pub fn consider(&self, target: &Target, content: &str) -> Result<StoreOutcome, SnapshotError> {
        let dir = self.target_dir(target);
        let new_hash = content_hash(content.as_bytes());

        if let Some(latest) = latest_snapshot(&dir)? {
            let previous = fs::read(&latest).map_err(|source| SnapshotError::Read {
                path: latest.clone(),
                source,
            })?;
            if content_hash(&previous) == new_hash {
                wcsm_debug!("{}: unchanged since {:?}", target.locator(), latest);
                return Ok(StoreOutcome::Skipped);
            }
        }

        let filename = format!("{}.{SNAPSHOT_EXTENSION}", (self.clock)());
        let path = AtomicFileWriter::new(dir).write(&filename, content.as_bytes())?;
        Ok(StoreOutcome::Stored(path))
    }
}

pub fn content_hash(bytes: &[u8]) -> [u8; 32] {
    let digest = Sha256::digest(bytes);
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    out
}

/// `Some(ts)` for `<decimal digits>.html`, `None` for anything else in the directory.
pub fn snapshot_timestamp(file_name: &str) -> Option<u64> {
    let stem = file_name.strip_suffix(SNAPSHOT_EXTENSION)?.strip_suffix('.')?;
    if stem.is_empty() || !stem.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    stem.parse().ok()
}

/// Most recent snapshot in `dir` by numeric timestamp. A missing directory has none.
pub fn latest_snapshot(dir: &Path) -> Result<Option<PathBuf>, SnapshotError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(SnapshotError::Read {
                path: dir.to_path_buf(),
                source,
            })
        }
    };

    let mut latest: Option<(u64, PathBuf)> = None;
    for entry in entries {
        let entry = entry.map_err(|source| SnapshotError::Read {
            path: dir.to_path_buf(),
            source,
        })?;
        let name = entry.file_name();
        let Some(ts) = name.to_str().and_then(snapshot_timestamp) else {
            continue;
        };
        if latest.as_ref().map_or(true, |(best, _)| ts > *best) {
            latest = Some((ts, entry.path()));
        }
    }
    Ok(latest.map(|(_, path)| path))
}
