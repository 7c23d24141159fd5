use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::{HeaderName, CONTENT_TYPE};
use reqwest::redirect::Policy;
use reqwest::{Client, Response, StatusCode};

use crate::{FailureKind, FetchError, FetchMetadata, FetchOutput};

const MAX_BODY_BYTES: u64 = 20 * 1024 * 1024;

/// Limits applied to every retrieval, page or sub-resource alike.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchSettings {
    pub connect_timeout: Duration,
    /// Whole exchange, body included.
    pub request_timeout: Duration,
    pub redirect_limit: usize,
    /// Checked against the declared length and again while streaming.
    pub max_bytes: u64,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            redirect_limit: 5,
            max_bytes: MAX_BODY_BYTES,
        }
    }
}

/// Retrieves one locator. Pages and their sub-resources go through the same seam.
#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchOutput, FetchError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    settings: FetchSettings,
}

impl ReqwestFetcher {
    pub fn new(settings: FetchSettings) -> Self {
        Self { settings }
    }

    fn client_for(&self, url: &str) -> Result<Client, FetchError> {
        let FetchSettings {
            connect_timeout,
            request_timeout,
            redirect_limit,
            ..
        } = self.settings;
        Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .redirect(Policy::limited(redirect_limit))
            .build()
            .map_err(|err| FetchError::new(url, FailureKind::Network, err.to_string()))
    }
}

impl Default for ReqwestFetcher {
    fn default() -> Self {
        Self::new(FetchSettings::default())
    }
}

/// 200 and 304 count as success; everything else is a failed fetch.
pub fn is_success_status(status: StatusCode) -> bool {
    status == StatusCode::OK || status == StatusCode::NOT_MODIFIED
}

#[async_trait::async_trait]
impl Fetcher for ReqwestFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchOutput, FetchError> {
        let target = reqwest::Url::parse(url)
            .map_err(|err| FetchError::new(url, FailureKind::InvalidUrl, err.to_string()))?;
        let response = self
            .client_for(url)?
            .get(target)
            .send()
            .await
            .map_err(|err| classify(url, &err))?;

        let status = response.status();
        if !is_success_status(status) {
            let kind = FailureKind::HttpStatus(status.as_u16());
            return Err(FetchError::new(url, kind, status.to_string()));
        }

        let limit = BodyLimit {
            url,
            max_bytes: self.settings.max_bytes,
        };
        if let Some(declared) = response.content_length() {
            limit.check(declared)?;
        }

        let final_url = response.url().to_string();
        let content_type = header_text(&response, CONTENT_TYPE);
        let bytes = read_body(response, &limit).await?;

        Ok(FetchOutput {
            metadata: FetchMetadata {
                url: url.to_owned(),
                final_url,
                status: status.as_u16(),
                content_type,
                byte_len: bytes.len() as u64,
            },
            bytes,
        })
    }
}

struct BodyLimit<'a> {
    url: &'a str,
    max_bytes: u64,
}

impl BodyLimit<'_> {
    fn check(&self, len: u64) -> Result<(), FetchError> {
        if len <= self.max_bytes {
            return Ok(());
        }
        Err(FetchError::new(
            self.url,
            FailureKind::TooLarge {
                max_bytes: self.max_bytes,
                actual: Some(len),
            },
            format!("body of {len} bytes is over the limit"),
        ))
    }
}

/// Collect the body, giving up as soon as it passes the limit.
async fn read_body(response: Response, limit: &BodyLimit<'_>) -> Result<Vec<u8>, FetchError> {
    let mut body = Vec::new();
    let mut chunks = response.bytes_stream();
    while let Some(chunk) = chunks.next().await {
        let chunk = chunk.map_err(|err| classify(limit.url, &err))?;
        limit.check((body.len() + chunk.len()) as u64)?;
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

fn header_text(response: &Response, name: HeaderName) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
}

fn classify(url: &str, err: &reqwest::Error) -> FetchError {
    let kind = if err.is_timeout() {
        FailureKind::Timeout
    } else if err.is_redirect() {
        FailureKind::RedirectLimitExceeded
    } else {
        FailureKind::Network
    };
    FetchError::new(url, kind, err.to_string())
}
