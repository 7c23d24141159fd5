use url::{Position, Url};

/// Turn a target locator into the directory name its snapshots live under.
///
/// `host[:port]`, then the path with `/` replaced by `_`, then `+` and the
/// query with `&` replaced by `-`. A bare root path contributes nothing, so
/// `http://example.com/` maps to `example.com`. Nothing else is escaped, so two
/// distinct locators can collide; see [`crate::find_collision`].
pub fn normalize_target(locator: &str) -> String {
    let Ok(url) = Url::parse(locator.trim()) else {
        return locator.replace('/', "_");
    };

    let mut base = url[Position::BeforeHost..Position::AfterPort].to_string();

    let path = url.path();
    if !path.is_empty() && path != "/" {
        base.push_str(&path.replace('/', "_"));
    }

    if let Some(query) = url.query().filter(|q| !q.is_empty()) {
        base.push('+');
        base.push_str(&query.replace('&', "-"));
    }

    base
}
