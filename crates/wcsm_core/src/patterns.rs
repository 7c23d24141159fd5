use std::path::Path;

use regex::Regex;

pub const DEFAULT_WATCH_PATTERN: &str = r".*\.(css|js|html|rb|php)$";

#[derive(Debug, thiserror::Error)]
#[error("invalid watch pattern {pattern:?}: {source}")]
pub struct PatternError {
    pub pattern: String,
    #[source]
    pub source: regex::Error,
}

/// Filename patterns gating which changed paths are considered at all.
///
/// A path passes when any pattern matches its full string form.
#[derive(Debug, Clone)]
pub struct WatchPatterns {
    patterns: Vec<Regex>,
}

impl WatchPatterns {
    pub fn new<I, S>(patterns: I) -> Result<Self, PatternError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|raw| {
                let raw = raw.as_ref();
                Regex::new(raw).map_err(|source| PatternError {
                    pattern: raw.to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    pub fn matches(&self, path: &Path) -> bool {
        let text = path.to_string_lossy();
        self.patterns.iter().any(|re| re.is_match(&text))
    }
}
