use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use pretty_assertions::assert_eq;
use scraper::{Html, Selector};
use wcsm_engine::{
    FailureKind, FetchError, FetchMetadata, FetchOutput, Fetcher, ResourceInliner,
};

const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDRfake-png-payload";
const GIF_BYTES: &[u8] = b"GIF89a\x01\x00\x01\x00fake";

#[derive(Default)]
struct StubFetcher {
    responses: HashMap<String, (Vec<u8>, Option<String>)>,
    calls: Mutex<Vec<String>>,
}

impl StubFetcher {
    fn with(mut self, url: &str, body: &[u8], content_type: Option<&str>) -> Self {
        self.responses.insert(
            url.to_string(),
            (body.to_vec(), content_type.map(str::to_string)),
        );
        self
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Fetcher for StubFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchOutput, FetchError> {
        self.calls.lock().unwrap().push(url.to_string());
        match self.responses.get(url) {
            Some((bytes, content_type)) => Ok(FetchOutput {
                bytes: bytes.clone(),
                metadata: FetchMetadata {
                    url: url.to_string(),
                    final_url: url.to_string(),
                    status: 200,
                    content_type: content_type.clone(),
                    byte_len: bytes.len() as u64,
                },
            }),
            None => Err(FetchError {
                url: url.to_string(),
                kind: FailureKind::HttpStatus(404),
                message: "404 Not Found".to_string(),
            }),
        }
    }
}

async fn inline_with(fetcher: Arc<StubFetcher>, html: &str) -> String {
    ResourceInliner::new(fetcher)
        .inline(html.as_bytes(), Some("text/html; charset=utf-8"), "http://site.test/blog/")
        .await
        .expect("inline ok")
        .html
}

fn attr_of(html: &str, css: &str, attr: &str) -> Option<String> {
    let doc = Html::parse_document(html);
    let selector = Selector::parse(css).unwrap();
    doc.select(&selector)
        .next()
        .and_then(|el| el.value().attr(attr).map(str::to_string))
}

#[tokio::test]
async fn external_png_becomes_data_url_with_identical_bytes() {
    // Extension lies: the bytes decide the type.
    let fetcher = Arc::new(StubFetcher::default().with(
        "http://site.test/img/logo.jpg",
        PNG_BYTES,
        Some("image/jpeg"),
    ));
    let html = inline_with(fetcher, r#"<img src="../img/logo.jpg" alt="logo">"#).await;

    let src = attr_of(&html, "img", "src").unwrap();
    let payload = src
        .strip_prefix("data:image/png;base64,")
        .expect("png data url");
    assert_eq!(STANDARD.decode(payload).unwrap(), PNG_BYTES);
    assert_eq!(attr_of(&html, "img", "alt").as_deref(), Some("logo"));
}

#[tokio::test]
async fn data_images_are_not_fetched() {
    let fetcher = Arc::new(StubFetcher::default());
    let html = inline_with(
        fetcher.clone(),
        r#"<img src="data:image/gif;base64,R0lGODlhAQABAAAAACw=">"#,
    )
    .await;

    assert!(fetcher.calls().is_empty());
    assert_eq!(
        attr_of(&html, "img", "src").as_deref(),
        Some("data:image/gif;base64,R0lGODlhAQABAAAAACw=")
    );
}

#[tokio::test]
async fn svg_falls_back_to_declared_image_type() {
    let svg = br#"<svg xmlns="http://www.w3.org/2000/svg"/>"#;
    let fetcher = Arc::new(StubFetcher::default().with(
        "http://site.test/icon.svg",
        svg,
        Some("image/svg+xml"),
    ));
    let html = inline_with(fetcher, r#"<img src="/icon.svg">"#).await;
    let src = attr_of(&html, "img", "src").unwrap();
    assert!(src.starts_with("data:image/svg+xml;base64,"));
}

#[tokio::test]
async fn stylesheet_link_becomes_inline_style() {
    let fetcher = Arc::new(StubFetcher::default().with(
        "http://site.test/css/main.css",
        b"body { color: red; }",
        Some("text/css"),
    ));
    let html = inline_with(
        fetcher,
        r#"<html><head><link rel="stylesheet" href="/css/main.css" media="screen"></head><body></body></html>"#,
    )
    .await;

    assert!(!html.contains("<link"));
    assert!(html.contains(
        r#"<style media="screen" type="text/css">body { color: red; }</style>"#
    ));
}

#[tokio::test]
async fn non_stylesheet_links_are_left_alone() {
    let fetcher = Arc::new(StubFetcher::default());
    let html = inline_with(fetcher.clone(), r#"<link rel="icon" href="/favicon.ico">"#).await;
    assert!(fetcher.calls().is_empty());
    assert!(html.contains(r#"<link rel="icon" href="/favicon.ico">"#));
}

#[tokio::test]
async fn same_origin_scripts_are_inlined_and_cross_origin_kept() {
    let fetcher = Arc::new(
        StubFetcher::default()
            .with("http://site.test/blog/app.js", b"console.log(1 < 2);", None)
            .with("http://site.test/js/abs.js", b"var abs = true;", None),
    );
    let html = inline_with(
        fetcher.clone(),
        r#"<script src="app.js"></script><script src="http://site.test/js/abs.js"></script><script src="https://cdn.example.org/lib.js"></script><script src="//cdn.example.org/other.js"></script>"#,
    )
    .await;

    assert!(html.contains("<script>console.log(1 < 2);</script>"));
    assert!(html.contains("<script>var abs = true;</script>"));
    assert!(html.contains(r#"<script src="https://cdn.example.org/lib.js"></script>"#));
    assert!(html.contains(r#"<script src="//cdn.example.org/other.js"></script>"#));
    assert!(!fetcher.calls().iter().any(|url| url.contains("cdn.example.org")));
}

#[tokio::test]
async fn failed_resources_stay_external_and_the_rest_is_inlined() {
    let fetcher = Arc::new(StubFetcher::default().with(
        "http://site.test/ok.gif",
        GIF_BYTES,
        Some("image/gif"),
    ));
    let result = ResourceInliner::new(fetcher)
        .inline(
            br#"<img src="/missing.png"><img src="/ok.gif"><link rel="stylesheet" href="/gone.css">"#,
            None,
            "http://site.test/",
        )
        .await
        .unwrap();

    assert!(result.html.contains(r#"<img src="/missing.png">"#));
    assert!(result.html.contains("data:image/gif;base64,"));
    assert!(result.html.contains(r#"<link rel="stylesheet" href="/gone.css">"#));
    assert_eq!(result.stats.images, 1);
    assert_eq!(result.stats.left_external, 2);
}

#[tokio::test]
async fn inlined_script_cannot_close_its_element_early() {
    let fetcher = Arc::new(StubFetcher::default().with(
        "http://site.test/blog/tricky.js",
        b"document.write('</script>');",
        None,
    ));
    let html = inline_with(fetcher, r#"<script src="tricky.js"></script>"#).await;
    assert!(html.contains(r"<script>document.write('<\/script>');</script>"));
}

#[tokio::test]
async fn malformed_page_bytes_are_replaced_not_fatal() {
    let fetcher = Arc::new(StubFetcher::default());
    let doc = ResourceInliner::new(fetcher)
        .inline(b"<p>caf\xe9</p>", Some("text/html; charset=utf-8"), "http://site.test/")
        .await
        .expect("lossy decode keeps the page");
    assert!(doc.html.contains("<p>caf\u{FFFD}</p>"));
}

#[tokio::test]
async fn same_host_script_over_another_scheme_is_inlined() {
    let fetcher = Arc::new(
        StubFetcher::default()
            .with("https://site.test/app.js", b"var tls = 1;", None)
            .with("http://site.test:8080/dev.js", b"var dev = 1;", None),
    );
    let html = inline_with(
        fetcher.clone(),
        r#"<script src="https://site.test/app.js"></script><script src="http://site.test:8080/dev.js"></script>"#,
    )
    .await;

    assert!(html.contains("<script>var tls = 1;</script>"));
    assert!(html.contains(r#"<script src="http://site.test:8080/dev.js"></script>"#));
    assert_eq!(fetcher.calls(), vec!["https://site.test/app.js".to_string()]);
}

#[tokio::test]
async fn namespaced_svg_attributes_survive_serialization() {
    let fetcher = Arc::new(StubFetcher::default());
    let html = inline_with(
        fetcher,
        r##"<svg xmlns:xlink="http://www.w3.org/1999/xlink"><use xlink:href="#icon"></use></svg>"##,
    )
    .await;

    assert!(html.contains(r#"xmlns:xlink="http://www.w3.org/1999/xlink""#));
    assert!(html.contains(r##"<use xlink:href="#icon">"##));
}
