use std::collections::{HashMap, HashSet};

use url::Url;

use crate::path::normalize_target;

/// A page that gets snapshotted on every accepted change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    locator: String,
    dir_name: String,
}

impl Target {
    pub fn new(locator: impl Into<String>) -> Self {
        let locator = locator.into();
        let dir_name = normalize_target(&locator);
        Self { locator, dir_name }
    }

    pub fn locator(&self) -> &str {
        &self.locator
    }

    /// Directory name under the output root, see [`normalize_target`].
    pub fn dir_name(&self) -> &str {
        &self.dir_name
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TargetError {
    #[error("no targets configured")]
    Empty,
    #[error("target {locator:?} is not an absolute http(s) url")]
    InvalidLocator { locator: String },
    #[error("targets {first:?} and {second:?} both map to directory {dir_name:?}")]
    Collision {
        first: String,
        second: String,
        dir_name: String,
    },
}

/// Deduplicate locators by exact string equality, keeping first-seen order.
pub fn dedupe_targets<I, S>(locators: I) -> Vec<Target>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    locators
        .into_iter()
        .filter_map(|raw| {
            let locator = raw.as_ref();
            if locator.is_empty() || !seen.insert(locator.to_string()) {
                return None;
            }
            Some(Target::new(locator))
        })
        .collect()
}

/// Return the first pair of distinct targets sharing a directory name.
pub fn find_collision(targets: &[Target]) -> Option<(&Target, &Target)> {
    let mut by_dir: HashMap<&str, &Target> = HashMap::new();
    for target in targets {
        if let Some(first) = by_dir.insert(target.dir_name(), target) {
            if first.locator() != target.locator() {
                return Some((first, target));
            }
        }
    }
    None
}

/// Dedupe, then reject empty lists, non-http(s) locators and directory collisions.
pub fn validate_targets<I, S>(locators: I) -> Result<Vec<Target>, TargetError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let targets = dedupe_targets(locators);
    if targets.is_empty() {
        return Err(TargetError::Empty);
    }

    for target in &targets {
        let valid = Url::parse(target.locator())
            .map(|url| matches!(url.scheme(), "http" | "https") && url.has_host())
            .unwrap_or(false);
        if !valid {
            return Err(TargetError::InvalidLocator {
                locator: target.locator().to_string(),
            });
        }
    }

    if let Some((first, second)) = find_collision(&targets) {
        return Err(TargetError::Collision {
            first: first.locator().to_string(),
            second: second.locator().to_string(),
            dir_name: first.dir_name().to_string(),
        });
    }

    Ok(targets)
}
