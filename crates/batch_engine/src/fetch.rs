use std::time::Duration;

use async_trait::async_trait;
use batch_core::{
    Canonicalizer, ItemError, RejectList, RejectRecord, SkipSignal, UrlCanonicalizer, WorkItem,
};
use batch_logging::batch_debug;
use futures_util::StreamExt;
use reqwest::header::CONTENT_TYPE;
use scraper::{Html, Selector};

use crate::{AsyncItemOperation, FailureKind, FetchError};

/// Icon shown next to items skipped because they are on the reject list.
pub const REJECTED_ICON: &str = "rotate-right.png";
/// Status set on items whose metadata was fetched.
pub const STATUS_FETCHED: &str = "Fetched";

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub redirect_limit: usize,
    pub max_bytes: u64,
    pub allowed_content_types: Vec<String>,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            redirect_limit: 5,
            max_bytes: 5 * 1024 * 1024,
            allowed_content_types: vec![
                "text/html".to_string(),
                "application/xhtml+xml".to_string(),
            ],
        }
    }
}

/// Caller side of a metadata work item.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StoryRequest {
    pub url: String,
    pub title: Option<String>,
    pub final_url: Option<String>,
    pub content_type: Option<String>,
    pub byte_len: Option<u64>,
}

impl StoryRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    pub final_url: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Fetches story pages, skipping anything on the reject list.
pub struct MetadataFetcher {
    client: reqwest::Client,
    settings: FetchSettings,
    rejects: RejectList,
    canonicalizer: Box<dyn Canonicalizer + Send + Sync>,
}

impl MetadataFetcher {
    pub fn new(settings: FetchSettings, rejects: RejectList) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .redirect(reqwest::redirect::Policy::limited(settings.redirect_limit))
            .build()
            .map_err(|err| FetchError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self {
            client,
            settings,
            rejects,
            canonicalizer: Box::new(UrlCanonicalizer),
        })
    }

    /// Replaces [`UrlCanonicalizer`]. Use the canonicalizer the reject list
    /// was loaded with, or lookups will miss.
    pub fn with_canonicalizer(
        mut self,
        canonicalizer: impl Canonicalizer + Send + Sync + 'static,
    ) -> Self {
        self.canonicalizer = Box::new(canonicalizer);
        self
    }

    pub fn rejects(&self) -> &RejectList {
        &self.rejects
    }

    /// GETs `url` within the configured size and content type limits.
    pub async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let parsed = reqwest::Url::parse(url)
            .map_err(|err| FetchError::new(FailureKind::InvalidUrl, err.to_string()))?;
        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        if let Some(content_len) = response.content_length() {
            if content_len > self.settings.max_bytes {
                return Err(self.too_large(Some(content_len)));
            }
        }

        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        if let Some(ct) = content_type.as_deref() {
            if !self.is_content_type_allowed(ct) {
                return Err(FetchError::new(
                    FailureKind::UnsupportedContentType {
                        content_type: ct.to_string(),
                    },
                    "unsupported content type",
                ));
            }
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > self.settings.max_bytes {
                return Err(self.too_large(Some(next_len)));
            }
            bytes.extend_from_slice(&chunk);
        }
        batch_debug!("Fetched {} ({} bytes)", final_url, bytes.len());

        Ok(FetchedPage {
            final_url,
            content_type,
            bytes,
        })
    }

    fn too_large(&self, actual: Option<u64>) -> FetchError {
        FetchError::new(
            FailureKind::TooLarge {
                max_bytes: self.settings.max_bytes,
                actual,
            },
            "response too large",
        )
    }

    fn is_content_type_allowed(&self, content_type: &str) -> bool {
        let ct = content_type.split(';').next().unwrap_or(content_type).trim();
        self.settings
            .allowed_content_types
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(ct))
    }
}

#[async_trait]
impl AsyncItemOperation<StoryRequest> for MetadataFetcher {
    async fn process(&self, item: &mut WorkItem<StoryRequest>) -> Result<(), ItemError> {
        let url = self
            .canonicalizer
            .normalize(&item.data.url)
            .ok_or_else(|| FetchError::new(FailureKind::InvalidUrl, item.data.url.clone()))
            .map_err(anyhow::Error::from)?;

        if let Some(record) = self.rejects.find(&url) {
            return Err(SkipSignal::new(rejected_message(record), REJECTED_ICON, true).into());
        }

        let page = self.fetch(&url).await.map_err(anyhow::Error::from)?;
        let html = String::from_utf8_lossy(&page.bytes);

        let story = &mut item.data;
        story.url = url;
        story.title = extract_title(&html);
        story.byte_len = Some(page.bytes.len() as u64);
        story.final_url = Some(page.final_url);
        story.content_type = page.content_type;
        item.mark_good(STATUS_FETCHED);
        Ok(())
    }
}

fn rejected_message(record: &RejectRecord) -> String {
    let note = record.full_note();
    if note.is_empty() {
        "URL is on the reject list".to_string()
    } else {
        format!("URL is on the reject list: {note}")
    }
}

/// Text of the first `<title>` element, trimmed.
fn extract_title(html: &str) -> Option<String> {
    let selector = Selector::parse("title").ok()?;
    let document = Html::parse_document(html);
    let title = document
        .select(&selector)
        .next()?
        .text()
        .collect::<String>();
    let title = title.split_whitespace().collect::<Vec<_>>().join(" ");
    (!title.is_empty()).then_some(title)
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_redirect() {
        return FetchError::new(FailureKind::RedirectLimitExceeded, err.to_string());
    }
    FetchError::new(FailureKind::Network, err.to_string())
}
