use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutput {
    pub bytes: Vec<u8>,
    pub metadata: FetchMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchMetadata {
    pub url: String,
    pub final_url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub byte_len: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("fetch {url} failed: {kind} ({message})")]
pub struct FetchError {
    pub url: String,
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub(crate) fn new(url: impl Into<String>, kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            kind,
            message: message.into(),
        }
    }
}

/// Why a retrieval produced no usable body.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FailureKind {
    #[error("not an absolute url")]
    InvalidUrl,
    /// Anything but 200 or 304.
    #[error("unexpected status {0}")]
    HttpStatus(u16),
    #[error("timed out")]
    Timeout,
    #[error("too many redirects")]
    RedirectLimitExceeded,
    #[error("body over {max_bytes} bytes (got {actual:?})")]
    TooLarge { max_bytes: u64, actual: Option<u64> },
    #[error("connection failed")]
    Network,
}

/// What happened to one target during a grab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetOutcome {
    Stored(PathBuf),
    Skipped,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetReport {
    pub locator: String,
    pub outcome: TargetOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CycleReport {
    pub targets: Vec<TargetReport>,
}

impl CycleReport {
    pub fn stored(&self) -> usize {
        self.count(|o| matches!(o, TargetOutcome::Stored(_)))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, TargetOutcome::Skipped))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, TargetOutcome::Failed(_)))
    }

    fn count(&self, pred: impl Fn(&TargetOutcome) -> bool) -> usize {
        self.targets.iter().filter(|t| pred(&t.outcome)).count()
    }
}
