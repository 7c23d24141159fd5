use std::fmt;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use ego_tree::NodeId;
use futures_util::future::join_all;
use scraper::node::{Element, Text};
use scraper::{ElementRef, Html, Node, StrTendril};
use url::Url;
use wcsm_logging::{wcsm_debug, wcsm_warn};

use crate::decode::{decode_text, decode_text_lossy};
use crate::fetch::Fetcher;
use crate::FetchOutput;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum InlineError {
    #[error("page url {url:?} is not absolute: {message}")]
    InvalidPageUrl { url: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InlineStats {
    pub images: usize,
    pub stylesheets: usize,
    pub scripts: usize,
    /// Resources that were attempted but left as external references.
    pub left_external: usize,
}

/// A page with its images, stylesheets and same-origin scripts embedded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelfContainedDocument {
    pub html: String,
    pub stats: InlineStats,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResourceKind {
    Image,
    Stylesheet,
    Script,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ResourceKind::Image => "image",
            ResourceKind::Stylesheet => "stylesheet",
            ResourceKind::Script => "script",
        })
    }
}

/// What to do to one planned element once its resource arrived.
enum Rewrite {
    ImageSource(String),
    Stylesheet(String),
    Script(String),
}

#[derive(Debug)]
struct PlannedResource {
    node: NodeId,
    kind: ResourceKind,
    url: Url,
}

/// Rewrites a page so it renders without going back to the network for its
/// own resources. Cross-origin scripts stay external.
#[derive(Clone)]
pub struct ResourceInliner {
    fetcher: Arc<dyn Fetcher>,
}

impl ResourceInliner {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self { fetcher }
    }

    pub async fn inline(
        &self,
        html_bytes: &[u8],
        content_type: Option<&str>,
        page_url: &str,
    ) -> Result<SelfContainedDocument, InlineError> {
        let base = Url::parse(page_url).map_err(|err| InlineError::InvalidPageUrl {
            url: page_url.to_string(),
            message: err.to_string(),
        })?;
        let text = match decode_text(html_bytes, content_type) {
            Ok(decoded) => decoded.text,
            Err(err) => {
                wcsm_warn!("{page_url}: {err}, replacing malformed bytes");
                decode_text_lossy(html_bytes, content_type)
            }
        };

        let mut document = Html::parse_document(&text);
        let planned = plan_resources(&document, &base);
        wcsm_debug!("{page_url}: {} resources to inline", planned.len());

        // Completion order is irrelevant: results line up with `planned`.
        let fetched = join_all(
            planned
                .iter()
                .map(|resource| self.fetcher.fetch(resource.url.as_str())),
        )
        .await;

        let mut stats = InlineStats::default();
        for (resource, result) in planned.iter().zip(fetched) {
            let output = match result {
                Ok(output) => output,
                Err(err) => {
                    wcsm_warn!("{page_url}: leaving {} external: {err}", resource.kind);
                    stats.left_external += 1;
                    continue;
                }
            };
            match build_rewrite(resource, &output) {
                Some(rewrite) => {
                    match resource.kind {
                        ResourceKind::Image => stats.images += 1,
                        ResourceKind::Stylesheet => stats.stylesheets += 1,
                        ResourceKind::Script => stats.scripts += 1,
                    }
                    apply_rewrite(&mut document, resource.node, rewrite);
                }
                None => {
                    wcsm_warn!(
                        "{page_url}: unrecognised image format at {}, leaving external",
                        resource.url
                    );
                    stats.left_external += 1;
                }
            }
        }

        Ok(SelfContainedDocument {
            html: document.html(),
            stats,
        })
    }
}

/// Walk the document in order and pick every reference worth embedding.
fn plan_resources(document: &Html, base: &Url) -> Vec<PlannedResource> {
    let mut planned = Vec::new();
    for node in document.tree.root().descendants() {
        let Some(element) = ElementRef::wrap(node) else {
            continue;
        };
        let el = element.value();
        let (kind, reference) = match el.name() {
            "img" => match el.attr("src") {
                Some(src) => (ResourceKind::Image, src),
                None => continue,
            },
            "link" if is_stylesheet(el.attr("rel")) => match el.attr("href") {
                Some(href) => (ResourceKind::Stylesheet, href),
                None => continue,
            },
            "script" => match el.attr("src") {
                Some(src) => (ResourceKind::Script, src),
                None => continue,
            },
            _ => continue,
        };

        let Some(url) = resolve_reference(reference, base) else {
            wcsm_debug!("unresolvable {kind} reference {reference:?}, left as-is");
            continue;
        };
        if url.scheme() == "data" {
            continue;
        }
        if kind == ResourceKind::Script && !same_origin(&url, base) {
            continue;
        }
        planned.push(PlannedResource {
            node: node.id(),
            kind,
            url,
        });
    }
    planned
}

fn is_stylesheet(rel: Option<&str>) -> bool {
    rel.is_some_and(|rel| {
        rel.split_ascii_whitespace()
            .any(|token| token.eq_ignore_ascii_case("stylesheet"))
    })
}

fn resolve_reference(reference: &str, base: &Url) -> Option<Url> {
    let trimmed = reference.trim();
    if trimmed.is_empty() {
        return None;
    }
    base.join(trimmed).ok()
}

/// Host plus any explicitly written port; the scheme and its default port
/// play no part. Relative references resolve onto the page's own host.
fn same_origin(resource: &Url, page: &Url) -> bool {
    resource.host_str().is_some()
        && resource.host_str() == page.host_str()
        && resource.port() == page.port()
}

fn build_rewrite(resource: &PlannedResource, output: &FetchOutput) -> Option<Rewrite> {
    let content_type = output.metadata.content_type.as_deref();
    match resource.kind {
        ResourceKind::Image => {
            let mime = sniff_image_mime(&output.bytes, content_type)?;
            Some(Rewrite::ImageSource(image_data_url(&mime, &output.bytes)))
        }
        ResourceKind::Stylesheet => Some(Rewrite::Stylesheet(decode_text_lossy(
            &output.bytes,
            content_type,
        ))),
        ResourceKind::Script => Some(Rewrite::Script(decode_text_lossy(&output.bytes, content_type))),
    }
}

fn apply_rewrite(document: &mut Html, id: NodeId, rewrite: Rewrite) {
    let Some(mut node) = document.tree.get_mut(id) else {
        return;
    };
    let Node::Element(element) = node.value() else {
        return;
    };
    let body = match rewrite {
        Rewrite::ImageSource(data_url) => {
            let src = element
                .attrs
                .iter_mut()
                .find_map(|(name, value)| (&*name.local == "src").then_some(value));
            if let Some(src) = src {
                *src = StrTendril::from(data_url);
            }
            return;
        }
        Rewrite::Stylesheet(css) => {
            into_style(element);
            guard_raw_text("style", &css)
        }
        Rewrite::Script(code) => {
            element.attrs.retain(|name, _| &*name.local != "src");
            guard_raw_text("script", &code)
        }
    };

    while let Some(mut child) = node.first_child() {
        child.detach();
    }
    node.append(Node::Text(Text {
        text: StrTendril::from(body),
    }));
}

/// `<link rel=stylesheet href=..>` becomes `<style type="text/css">`, other
/// attributes such as `media` stay where they were.
fn into_style(element: &mut Element) {
    element.name.local = "style".into();
    let mut type_name = None;
    element.attrs.retain(|name, _| match &*name.local {
        "rel" => {
            type_name = Some(name.clone());
            false
        }
        "href" | "type" => false,
        _ => true,
    });
    if let Some(mut name) = type_name {
        name.local = "type".into();
        element.attrs.insert(name, StrTendril::from("text/css"));
    }
}

/// Inlined text must not contain the element's own closing tag.
fn guard_raw_text(element: &str, body: &str) -> String {
    let needle = format!("</{element}");
    let lower = body.to_ascii_lowercase();
    let mut guarded = String::with_capacity(body.len());
    let mut last = 0;
    for (idx, _) in lower.match_indices(&needle) {
        guarded.push_str(&body[last..idx]);
        guarded.push_str("<\\/");
        last = idx + 2;
    }
    guarded.push_str(&body[last..]);
    guarded
}

/// Decide the image MIME type from the bytes; the declared type is only a
/// fallback for formats without a recognisable signature (e.g. SVG).
pub fn sniff_image_mime(bytes: &[u8], content_type: Option<&str>) -> Option<String> {
    if let Ok(format) = image::guess_format(bytes) {
        return Some(format.to_mime_type().to_string());
    }
    content_type
        .and_then(|ct| ct.split(';').next())
        .map(|ct| ct.trim().to_ascii_lowercase())
        .filter(|ct| ct.starts_with("image/"))
}

pub fn image_data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}
